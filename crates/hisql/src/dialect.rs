//! Database dialects.
//!
//! Everything that differs between the supported engines sits behind [`SqlDialect`]:
//! paging, the arguments that go with the paged query, outgoing argument conversion
//! and date literals. A client picks its dialect once, from [`DbVersion`].

use crate::value::Value;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fmt;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Supported database engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbVersion {
    #[default]
    MySql,
    Oracle,
}

impl DbVersion {
    /// The dialect implementation for this engine.
    pub fn dialect(self) -> &'static dyn SqlDialect {
        match self {
            Self::MySql => &MySqlDialect,
            Self::Oracle => &OracleDialect,
        }
    }
}

impl fmt::Display for DbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dialect().name())
    }
}

/// Engine-specific SQL rendering.
pub trait SqlDialect: fmt::Debug + Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &'static str;

    /// Rewrite a query so that it returns one page. The result has two extra `?`
    /// slots at the end, filled by [`SqlDialect::page_args`].
    fn paginate(&self, base_sql: &str) -> String;

    /// Arguments for the two slots added by [`SqlDialect::paginate`], for a page
    /// starting at the 1-based `start_row` holding `count` rows.
    fn page_args(&self, start_row: u32, count: u32) -> [Value; 2];

    /// Adjust an argument before it is bound.
    fn convert_arg(&self, value: Value) -> Value;

    /// Render a timestamp as an embeddable SQL literal.
    fn date_literal(&self, ts: &NaiveDateTime) -> String;

    /// Quote a string as an SQL literal.
    fn quote_str(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        for ch in s.chars() {
            if ch == '\'' {
                out.push('\'');
            }
            out.push(ch);
        }
        out.push('\'');
        out
    }
}

/// MySQL-like engines: `LIMIT offset, count` paging.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn paginate(&self, base_sql: &str) -> String {
        format!("{base_sql} LIMIT ?, ?")
    }

    fn page_args(&self, start_row: u32, count: u32) -> [Value; 2] {
        let offset = i64::from(start_row) - 1;
        [Value::BigInt(offset), Value::BigInt(i64::from(count))]
    }

    fn convert_arg(&self, value: Value) -> Value {
        value
    }

    fn date_literal(&self, ts: &NaiveDateTime) -> String {
        format!("'{}'", ts.format(DATE_TIME_FORMAT))
    }

    // MySQL treats backslash as an escape character inside string literals.
    fn quote_str(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        for ch in s.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                '\0' => out.push_str("\\0"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
        out
    }
}

/// Oracle-like engines: `ROWNUM` paging and `to_date` literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl SqlDialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn paginate(&self, base_sql: &str) -> String {
        format!("SELECT * FROM (SELECT A.*, ROWNUM RN FROM ({base_sql}) A WHERE ROWNUM<?) WHERE RN>=?")
    }

    fn page_args(&self, start_row: u32, count: u32) -> [Value; 2] {
        let upper = i64::from(start_row) + i64::from(count);
        [Value::BigInt(upper), Value::BigInt(i64::from(start_row))]
    }

    fn convert_arg(&self, value: Value) -> Value {
        match value {
            Value::Date(d) => Value::Timestamp(d.and_time(chrono::NaiveTime::MIN)),
            Value::Bool(b) => Value::Int(i32::from(b)),
            other => other,
        }
    }

    fn date_literal(&self, ts: &NaiveDateTime) -> String {
        format!(
            "to_date('{}','yyyy-mm-dd hh24:mi:ss')",
            ts.format(DATE_TIME_FORMAT)
        )
    }
}
