/// SQL dialect differences are isolated here so the rule tables stay dialect-agnostic.
/// The compiler is handed one `Dialect` at construction time; nothing else in the crate
/// branches on the backing store.
///
/// Only the SQLite dialect is executable in-process (through rusqlite); MySQL and
/// PostgreSQL exist so compiled fragments can be inspected and reused by deployments
/// that run the same schema on a different store.

pub trait Dialect: Sync {
    fn name(&self) -> &'static str;

    /// String concatenation of the given SQL expressions.
    fn concat(&self, parts: &[&str]) -> String;

    /// Grouped string aggregation of one expression (used by the multi-genre rules).
    fn group_concat(&self, expr: &str) -> String;

    /// NULL-coalescing of an expression to a fallback.
    fn coalesce(&self, expr: &str, fallback: &str) -> String;

    /// Regular-expression match operator. On SQLite this requires the `regexp`
    /// compatibility function registered by `db::connect`.
    fn regex_match(&self) -> &'static str;
    fn regex_not_match(&self) -> &'static str;

    /// Name of the soundex function. On SQLite this requires the `soundex`
    /// compatibility function; on PostgreSQL it requires the fuzzystrmatch extension.
    fn soundex(&self) -> &'static str;
}

pub struct Sqlite;
pub struct MySql;
pub struct Postgres;

pub static SQLITE: Sqlite = Sqlite;
pub static MYSQL: MySql = MySql;
pub static POSTGRES: Postgres = Postgres;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn concat(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }

    fn group_concat(&self, expr: &str) -> String {
        format!("GROUP_CONCAT({expr})")
    }

    fn coalesce(&self, expr: &str, fallback: &str) -> String {
        format!("IFNULL({expr}, {fallback})")
    }

    fn regex_match(&self) -> &'static str {
        "REGEXP"
    }

    fn regex_not_match(&self) -> &'static str {
        "NOT REGEXP"
    }

    fn soundex(&self) -> &'static str {
        "SOUNDEX"
    }
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn concat(&self, parts: &[&str]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }

    fn group_concat(&self, expr: &str) -> String {
        format!("GROUP_CONCAT({expr})")
    }

    fn coalesce(&self, expr: &str, fallback: &str) -> String {
        format!("IFNULL({expr}, {fallback})")
    }

    fn regex_match(&self) -> &'static str {
        "REGEXP"
    }

    fn regex_not_match(&self) -> &'static str {
        "NOT REGEXP"
    }

    fn soundex(&self) -> &'static str {
        "SOUNDEX"
    }
}

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn concat(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }

    fn group_concat(&self, expr: &str) -> String {
        format!("string_agg({expr}, ',')")
    }

    fn coalesce(&self, expr: &str, fallback: &str) -> String {
        format!("COALESCE({expr}, {fallback})")
    }

    fn regex_match(&self) -> &'static str {
        "~"
    }

    fn regex_not_match(&self) -> &'static str {
        "!~"
    }

    fn soundex(&self) -> &'static str {
        "SOUNDEX"
    }
}
