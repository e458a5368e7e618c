use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{AriaError, Result};

/// Server configuration. The data-access layer only needs to know where its database
/// lives; the log filter is consumed by the process entry point.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn parse(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        Config::parse_str(&contents, path)
    }

    pub fn parse_str(contents: &str, path: &Path) -> Result<Config> {
        toml::from_str(contents).map_err(|e| AriaError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
