use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use tracing::debug;

use crate::config::Config;
use crate::errors::{AriaError, Result};

// The REGEXP shim is called once per candidate row; cache compiled patterns so a
// search over a large library does not recompile its pattern thousands of times.
static REGEX_CACHE: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn cached_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    let mut cache = REGEX_CACHE.lock().unwrap();
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    cache.insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// Open the library database, apply the session pragmas and make sure the schema and
/// the SQLite compatibility functions are in place.
pub fn connect(config: &Config) -> Result<Connection> {
    let conn = connect_path(&config.database_path)?;
    Ok(conn)
}

pub(crate) fn connect_path(path: &Path) -> Result<Connection> {
    debug!("opening database at {}", path.display());
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", "15000")?;
    register_sqlite_compat(&conn)?;
    initialize_database(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, for tests and scratch work.
pub fn connect_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    register_sqlite_compat(&conn)?;
    initialize_database(&conn)?;
    Ok(conn)
}

pub fn initialize_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!("schema.sql"))?;
    Ok(())
}

/// SQLite lacks REGEXP and SOUNDEX out of the box; register both as scalar functions
/// so compiled rule conditions run unmodified against the embedded store.
fn register_sqlite_compat(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("regexp", 2, flags, |ctx| {
        let pattern: String = ctx.get(0)?;
        let value: Option<String> = ctx.get(1)?;
        let re = cached_regex(&pattern)
            .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
        Ok(value.map(|v| re.is_match(&v)).unwrap_or(false))
    })
    .map_err(|_| AriaError::DialectUnavailable {
        dialect: "sqlite".to_string(),
        feature: "regexp".to_string(),
    })?;

    conn.create_scalar_function("soundex", 1, flags, |ctx| {
        let value: Option<String> = ctx.get(0)?;
        Ok(value.map(|v| soundex(&v)))
    })
    .map_err(|_| AriaError::DialectUnavailable {
        dialect: "sqlite".to_string(),
        feature: "soundex".to_string(),
    })?;

    Ok(())
}

/// American Soundex, matching the MySQL/PostgreSQL built-ins closely enough for the
/// `sounds`/`notsounds` operators: first letter kept, the rest folded to digit classes
/// with adjacent duplicates collapsed, padded to four characters.
fn soundex(input: &str) -> String {
    fn class(c: char) -> Option<u8> {
        match c.to_ascii_uppercase() {
            'B' | 'F' | 'P' | 'V' => Some(1),
            'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some(2),
            'D' | 'T' => Some(3),
            'L' => Some(4),
            'M' | 'N' => Some(5),
            'R' => Some(6),
            _ => None,
        }
    }

    let mut chars = input.chars().filter(|c| c.is_ascii_alphabetic());
    let first = match chars.next() {
        Some(c) => c.to_ascii_uppercase(),
        None => return String::new(),
    };

    let mut code = String::with_capacity(4);
    code.push(first);
    let mut last = class(first);
    for c in chars {
        // H and W are transparent; the classes on either side still collapse.
        if matches!(c.to_ascii_uppercase(), 'H' | 'W') {
            continue;
        }
        let cls = class(c);
        if let Some(d) = cls {
            if last != Some(d) {
                code.push(char::from(b'0' + d));
                if code.len() == 4 {
                    break;
                }
            }
        }
        last = cls;
    }
    while code.len() < 4 {
        code.push('0');
    }
    code
}
