//! Error types for hisql

use std::fmt;
use thiserror::Error;

/// Boxed error produced by an external connection source or driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for hisql operations
pub type OrmResult<T> = Result<T, OrmError>;

/// What is wrong with an entity declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// The descriptor has no table declaration at all.
    MissingTable,
    /// No key name is declared, or it is empty.
    MissingKey,
    /// The declared key does not name a field of the entity.
    UnknownKeyField,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingTable => "missing table declaration",
            Self::MissingKey => "missing key declaration",
            Self::UnknownKeyField => "key does not name a declared field",
        };
        f.write_str(s)
    }
}

/// Error types for mapping and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Invalid or incomplete entity declaration
    #[error("Configuration error for {entity}: {kind}")]
    Configuration {
        entity: &'static str,
        kind: ConfigErrorKind,
    },

    /// Table name declared but blank
    #[error("Empty table name declared for {entity}")]
    EmptyTableName { entity: &'static str },

    /// Key value required but absent
    #[error("Key value cannot be empty for {entity} ({operation})")]
    EmptyKeyValue {
        entity: &'static str,
        operation: &'static str,
    },

    /// Key list required but empty
    #[error("Key values cannot be empty for {entity} ({operation})")]
    EmptyKeySet {
        entity: &'static str,
        operation: &'static str,
    },

    /// No field of the entity takes part in persistence
    #[error("No persistent field found in {entity}")]
    NoPersistentFields { entity: &'static str },

    /// Field subset is empty once the key is excluded
    #[error("No updatable field given for {entity}")]
    NoUpdatableFields { entity: &'static str },

    /// A field name that the entity does not declare as persistent
    #[error("Unknown field '{field}' for {entity}")]
    UnknownField { entity: &'static str, field: String },

    /// Caller-supplied column name that is not a safe SQL identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Raw value cannot be converted to the requested type
    #[error("Cannot coerce value of type {value_type} into {target}")]
    UnsupportedCoercion {
        target: &'static str,
        value_type: &'static str,
    },

    /// A column value that could not be stored into an entity field
    #[error("Cannot map column into {entity}.{field} in {operation}: {source}")]
    FieldMapping {
        entity: &'static str,
        field: &'static str,
        operation: &'static str,
        #[source]
        source: Box<OrmError>,
    },

    /// Failure from the connection source or statement execution
    #[error("SQL execution failed in {operation}{}: {source}", entity_suffix(.entity))]
    SqlExecution {
        operation: &'static str,
        entity: Option<&'static str>,
        #[source]
        source: BoxError,
    },
}

fn entity_suffix(entity: &Option<&'static str>) -> String {
    match entity {
        Some(name) => format!(" for {name}"),
        None => String::new(),
    }
}

impl OrmError {
    /// Create a coercion error for a target type and the offending value type
    pub fn coercion(target: &'static str, value_type: &'static str) -> Self {
        Self::UnsupportedCoercion { target, value_type }
    }

    /// Wrap a driver or connection failure
    pub fn execution(
        operation: &'static str,
        entity: Option<&'static str>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::SqlExecution {
            operation,
            entity,
            source: source.into(),
        }
    }

    /// Wrap a failure to store a column value into an entity field.
    ///
    /// The operation is `from_row` until the client names the call it came from.
    pub fn field_mapping(entity: &'static str, field: &'static str, source: OrmError) -> Self {
        Self::FieldMapping {
            entity,
            field,
            operation: "from_row",
            source: Box::new(source),
        }
    }

    /// Attach entity and operation context to an execution error that lacks it.
    ///
    /// Field mapping errors take the operation; other kinds are returned unchanged.
    pub(crate) fn in_context(self, operation: &'static str, entity: &'static str) -> Self {
        match self {
            Self::SqlExecution {
                entity: None,
                source,
                ..
            } => Self::SqlExecution {
                operation,
                entity: Some(entity),
                source,
            },
            other => other.in_operation(operation),
        }
    }

    /// Name the client operation a field mapping error happened in.
    pub(crate) fn in_operation(self, operation: &'static str) -> Self {
        match self {
            Self::FieldMapping {
                entity,
                field,
                source,
                ..
            } => Self::FieldMapping {
                entity,
                field,
                operation,
                source,
            },
            other => other,
        }
    }

    /// Check if this is an entity declaration error
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::EmptyTableName { .. }
        )
    }

    /// Check if this error came from the connection source or driver
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::SqlExecution { .. })
    }
}
