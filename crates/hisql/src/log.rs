//! SQL logging through `tracing`.
//!
//! Events are emitted under the `hisql.sql` target. Verbose statement logging can be
//! switched on and off while the client is in use; failures are always reported.

use crate::value::Value;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};

/// Render bound arguments as `[a,b,c]`: strings and dates single-quoted, booleans as
/// `1`/`0`, null as `null`, numbers bare.
pub fn render_params(params: &[Value]) -> String {
    let mut out = String::with_capacity(2 + params.len() * 4);
    out.push('[');
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{p}");
    }
    out.push(']');
    out
}

fn truncate_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[derive(Debug, Default)]
pub struct SqlLogger {
    enabled: AtomicBool,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    max_sql_length: Option<usize>,
}

impl SqlLogger {
    pub fn new(enabled: bool, max_sql_length: Option<usize>) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            max_sql_length,
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// Statement about to run. Only emitted while verbose logging is on.
    pub fn statement(&self, dialect: &str, operation: &str, sql: &str, params: &[Value]) {
        if !self.is_enabled() {
            return;
        }
        tracing::debug!(
            target: "hisql.sql",
            dialect,
            operation,
            param_count = params.len(),
            sql = %self.truncate_sql(sql),
            params = %render_params(params),
        );
    }

    /// Statement that failed to run.
    pub fn failure(&self, operation: &str, sql: &str, error: &dyn std::error::Error) {
        tracing::warn!(
            target: "hisql.sql",
            operation,
            sql = %self.truncate_sql(sql),
            error = %error,
            "SQL execution failed"
        );
    }
}
