//! The advanced-search rule compiler's building blocks.
//!
//! A search arrives as a flat list of (rule, operator, input) triples joined by one
//! conjunction. Each rule is compiled to a `SqlCondition`: a WHERE/HAVING fragment
//! paired with the values it binds, so fragments compose without any placeholder
//! counting. The operator strings are interpreted here, once, into a `RuleOperator`;
//! the per-kind rule tables then only decide which column or subquery the operator
//! applies to.

use rusqlite::types::Value;

use crate::dialect::Dialect;
use crate::errors::{AriaError, Result};

/// One rule of an advanced search, as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRule {
    pub rule: String,
    pub operator: String,
    pub input: String,
}

impl SearchRule {
    pub fn new(rule: &str, operator: &str, input: &str) -> SearchRule {
        SearchRule {
            rule: rule.to_string(),
            operator: operator.to_string(),
            input: input.to_string(),
        }
    }
}

/// A SQL fragment together with the values bound to its placeholders, in order.
#[derive(Debug)]
pub struct SqlCondition {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlCondition {
    pub fn new(sql: String) -> SqlCondition {
        SqlCondition { sql, params: Vec::new() }
    }

    pub fn with(sql: String, params: Vec<Value>) -> SqlCondition {
        SqlCondition { sql, params }
    }
}

/// String-to-function conversion wrapped around both sides of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conv {
    None,
    Lower,
    Soundex,
}

/// An interpreted search operator: the SQL operator text, the conversion applied to
/// both operands, and the value to bind (unary operators bind nothing).
#[derive(Debug)]
pub struct RuleOperator {
    pub sql_op: String,
    conv: Conv,
    soundex_fn: &'static str,
    param: Option<Value>,
    /// Set only for the `limit` operator; the row count spliced into recent_* rules.
    pub limit: Option<i64>,
    /// Polarity of the `true`/`false` operators, for rules that cannot express the
    /// check as a plain NULL test.
    truth: Option<bool>,
    user_id: String,
}

impl RuleOperator {
    /// Interpret one operator string against its input. `rule` is only used for error
    /// reporting; `user_id` is bound by the `limit` operator whose subqueries need the
    /// scope predicate themselves.
    pub fn interpret(
        rule: &str,
        operator: &str,
        input: &str,
        user_id: &str,
        dialect: &dyn Dialect,
    ) -> Result<RuleOperator> {
        let op = |sql_op: &str, conv: Conv, param: Option<Value>| RuleOperator {
            sql_op: sql_op.to_string(),
            conv,
            soundex_fn: dialect.soundex(),
            param,
            limit: None,
            truth: None,
            user_id: user_id.to_string(),
        };
        let text = |s: &str| Some(Value::from(s.to_string()));

        Ok(match operator {
            "contain" => op("LIKE", Conv::Lower, text(&format!("%{input}%"))),
            "notcontain" => op("NOT LIKE", Conv::Lower, text(&format!("%{input}%"))),
            "start" => op("LIKE", Conv::Lower, text(&format!("{input}%"))),
            "end" => op("LIKE", Conv::Lower, text(&format!("%{input}"))),
            "is" => op("=", Conv::Lower, text(input)),
            "isnot" => op("!=", Conv::Lower, text(input)),
            "sounds" => op("=", Conv::Soundex, text(input)),
            "notsounds" => op("!=", Conv::Soundex, text(input)),
            "regexp" => op(dialect.regex_match(), Conv::None, text(input)),
            "notregexp" => op(dialect.regex_not_match(), Conv::None, text(input)),
            ">=" | "<=" | "=" | "!=" | ">" | "<" => {
                op(operator, Conv::None, Some(numeric_or_text(input)))
            }
            "before" => op("<", Conv::None, text(input)),
            "after" => op(">", Conv::None, text(input)),
            "true" => RuleOperator { truth: Some(true), ..op("IS NOT NULL", Conv::None, None) },
            "false" => RuleOperator { truth: Some(false), ..op("IS NULL", Conv::None, None) },
            // `equal`/`ne` become a bare/negated EXISTS prefix; the rule supplies the
            // subquery and binds the input itself.
            "equal" => op("", Conv::None, text(input)),
            "ne" => op("NOT", Conv::None, text(input)),
            "limit" => {
                let n: i64 = input
                    .parse()
                    .map_err(|_| AriaError::unsupported_operator(rule, operator))?;
                RuleOperator {
                    sql_op: n.to_string(),
                    conv: Conv::None,
                    soundex_fn: dialect.soundex(),
                    param: Some(Value::from(user_id.to_string())),
                    limit: Some(n),
                    truth: None,
                    user_id: user_id.to_string(),
                }
            }
            _ => return Err(AriaError::unsupported_operator(rule, operator)),
        })
    }

    /// Render `<expr> <op> ?` with the conversion applied to both sides. Unary
    /// operators render without a placeholder.
    pub fn cmp(&self, expr: &str) -> String {
        match (&self.param, self.conv) {
            (None, _) => format!("{expr} {}", self.sql_op),
            (Some(_), Conv::None) => format!("{expr} {} ?", self.sql_op),
            (Some(_), Conv::Lower) => format!("LOWER({expr}) {} LOWER(?)", self.sql_op),
            (Some(_), Conv::Soundex) => {
                let f = self.soundex_fn;
                format!("{f}({expr}) {} {f}(?)", self.sql_op)
            }
        }
    }

    /// The value bound by `cmp`, if any.
    pub fn param(&self) -> Option<Value> {
        self.param.clone()
    }

    /// The searching user, for rules whose subqueries need the scope predicate.
    pub fn user_param(&self) -> Value {
        Value::from(self.user_id.clone())
    }

    /// Polarity of a `true`/`false` operator; None for all other operators.
    pub fn truth(&self) -> Option<bool> {
        self.truth
    }

    /// Compile a plain column comparison, the common case in the rule tables.
    pub fn column(&self, expr: &str) -> SqlCondition {
        let sql = self.cmp(expr);
        let params = self.param.iter().cloned().collect();
        SqlCondition::with(sql, params)
    }

    /// Pair a hand-built fragment containing one `cmp` placeholder with this
    /// operator's bound value.
    pub fn with_param(&self, sql: String) -> SqlCondition {
        SqlCondition::with(sql, self.param.iter().cloned().collect())
    }

    /// The `limit` operator's row count, or an error for rules that require it.
    pub fn limit_count(&self, rule: &str) -> Result<i64> {
        self.limit.ok_or_else(|| AriaError::unsupported_rule(rule))
    }
}

/// Bind numeric-looking input as an integer so comparisons against integer columns
/// compare numerically rather than lexically.
fn numeric_or_text(input: &str) -> Value {
    match input.trim().parse::<i64>() {
        Ok(n) => Value::Integer(n),
        Err(_) => Value::from(input.to_string()),
    }
}
