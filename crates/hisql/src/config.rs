//! Client configuration.

use crate::dialect::DbVersion;
use crate::entity::IdentifierCase;
use serde::Deserialize;

/// Configuration for [`SqlClient`](crate::SqlClient).
///
/// Every field has a default, so a host can deserialize a partial table from its own
/// config file:
///
/// ```ignore
/// let config: ClientConfig = toml::from_str(r#"
///     db_version = "oracle"
///     log_sql = true
/// "#)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Target engine, fixed for the lifetime of the client.
    pub db_version: DbVersion,
    /// Initial state of verbose SQL logging.
    pub log_sql: bool,
    /// Case policy for resolved table, key and column names.
    pub identifier_case: IdentifierCase,
    /// Generated statement cache configuration.
    pub statement_cache: StatementCacheConfig,
    /// Truncate logged SQL to this many bytes. `None` logs it in full.
    pub max_logged_sql_length: Option<usize>,
}

/// Generated statement cache configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatementCacheConfig {
    /// Maximum number of cached statements. `None` means unbounded.
    pub capacity: Option<usize>,
}

impl ClientConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target engine.
    pub fn db_version(mut self, version: DbVersion) -> Self {
        self.db_version = version;
        self
    }

    /// Enable or disable verbose SQL logging.
    pub fn log_sql(mut self, enabled: bool) -> Self {
        self.log_sql = enabled;
        self
    }

    pub fn identifier_case(mut self, case: IdentifierCase) -> Self {
        self.identifier_case = case;
        self
    }

    /// Bound the statement cache.
    pub fn statement_cache_capacity(mut self, capacity: usize) -> Self {
        self.statement_cache.capacity = Some(capacity);
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_setters() {
        let config = ClientConfig::new()
            .db_version(DbVersion::Oracle)
            .log_sql(true)
            .identifier_case(IdentifierCase::Lower)
            .statement_cache_capacity(64)
            .max_logged_sql_length(120);
        assert_eq!(config.db_version, DbVersion::Oracle);
        assert!(config.log_sql);
        assert_eq!(config.identifier_case, IdentifierCase::Lower);
        assert_eq!(config.statement_cache.capacity, Some(64));
        assert_eq!(config.max_logged_sql_length, Some(120));
    }

    #[test]
    fn deserializes_partial_config() {
        let config: ClientConfig = serde_json::from_str(
            r#"{ "db_version": "oracle", "statement_cache": { "capacity": 16 } }"#,
        )
        .unwrap();
        assert_eq!(config.db_version, DbVersion::Oracle);
        assert!(!config.log_sql);
        assert_eq!(config.identifier_case, IdentifierCase::Preserve);
        assert_eq!(config.statement_cache.capacity, Some(16));
        assert_eq!(config.max_logged_sql_length, None);
    }

    #[test]
    fn empty_config_is_default() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
    }
}
