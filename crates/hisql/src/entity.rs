//! Entity declarations and metadata resolution.
//!
//! An entity type describes itself with a `'static` [`EntityDescriptor`], either
//! written by hand or generated by `#[derive(Entity)]`. [`MetadataResolver`] turns a
//! descriptor into the table, key and column names the SQL builder needs.

use crate::coerce::FromValue;
use crate::error::{ConfigErrorKind, OrmError, OrmResult};
use crate::value::Value;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Declaration of one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Rust field name.
    pub name: &'static str,
    /// Column name override; `None` or empty means the field name.
    pub column: Option<&'static str>,
    /// Whether the field takes part in generated SQL.
    pub persistent: bool,
    /// Informational only.
    pub nullable: bool,
}

impl FieldDef {
    /// A persistent, nullable field mapped to a column of the same name.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            persistent: true,
            nullable: true,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    /// Exclude the field from all generated SQL.
    pub const fn transient(mut self) -> Self {
        self.persistent = false;
        self
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Declared column name before any case policy, `None` for transient fields.
    pub fn declared_column(&self) -> Option<&'static str> {
        if !self.persistent {
            return None;
        }
        match self.column {
            Some(c) if !c.trim().is_empty() => Some(c.trim()),
            _ => Some(self.name),
        }
    }
}

/// Static description of an entity type.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    /// Rust type name, used in error messages.
    pub type_name: &'static str,
    pub table: Option<&'static str>,
    pub key: Option<&'static str>,
    pub fields: &'static [FieldDef],
}

/// A persistable type.
///
/// `Default` provides the starting point for row materialization: columns that come
/// back null leave the default field value in place.
pub trait Entity: Default + 'static {
    fn descriptor() -> &'static EntityDescriptor;

    /// Current key value, `None` when absent.
    fn key_value(&self) -> Option<i64>;

    fn set_key_value(&mut self, key: i64) -> OrmResult<()>;

    /// Read a field by its Rust name.
    fn field_value(&self, field: &str) -> Option<Value>;

    /// Assign a field by its Rust name from a non-null driver value.
    fn set_field_value(&mut self, field: &str, value: Value) -> OrmResult<()>;
}

/// Assign a coerced value into a field slot. Used by hand-written and derived
/// [`Entity::set_field_value`] implementations.
pub fn assign<T: FromValue>(slot: &mut T, value: Value) -> OrmResult<()> {
    *slot = T::from_value(value)?;
    Ok(())
}

/// Case policy applied to resolved column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierCase {
    /// Keep names exactly as declared.
    #[default]
    Preserve,
    Lower,
    Upper,
}

impl IdentifierCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Preserve => name.to_string(),
            Self::Lower => name.to_lowercase(),
            Self::Upper => name.to_uppercase(),
        }
    }
}

/// One persistent field and its column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub field: &'static str,
    pub column: String,
    pub nullable: bool,
}

/// Resolved metadata of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    pub entity: &'static str,
    pub table: String,
    /// Key column name.
    pub key: String,
    /// Rust name of the key field.
    pub key_field: &'static str,
    /// Persistent fields in declaration order, key included.
    pub columns: Vec<ColumnMapping>,
}

impl EntityMeta {
    /// Persistent columns other than the key, in declaration order.
    pub fn value_columns(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.columns.iter().filter(move |c| c.field != self.key_field)
    }

    /// Look up a persistent field by Rust name or column name, case-insensitively.
    pub fn find(&self, name: &str) -> Option<&ColumnMapping> {
        self.columns.iter().find(|c| {
            c.field.eq_ignore_ascii_case(name) || c.column.eq_ignore_ascii_case(name)
        })
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name) || self.key_field.eq_ignore_ascii_case(name)
    }
}

/// Resolves descriptors into [`EntityMeta`].
#[derive(Debug, Default)]
pub struct MetadataResolver {
    case: IdentifierCase,
    resolutions: AtomicU64,
}

impl MetadataResolver {
    pub fn new(case: IdentifierCase) -> Self {
        Self {
            case,
            resolutions: AtomicU64::new(0),
        }
    }

    /// Number of descriptor walks performed so far.
    pub fn resolutions(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn case(&self) -> IdentifierCase {
        self.case
    }

    /// Resolve the table name.
    pub fn table_name(&self, desc: &EntityDescriptor) -> OrmResult<String> {
        let table = desc.table.ok_or(OrmError::Configuration {
            entity: desc.type_name,
            kind: ConfigErrorKind::MissingTable,
        })?;
        let table = table.trim();
        if table.is_empty() {
            return Err(OrmError::EmptyTableName {
                entity: desc.type_name,
            });
        }
        Ok(self.case.apply(table))
    }

    /// Resolve the key column name.
    pub fn key_name(&self, desc: &EntityDescriptor) -> OrmResult<String> {
        let (_, key) = self.key_field(desc)?;
        Ok(key)
    }

    /// Column for a field, `None` when the field does not take part in SQL.
    pub fn column_name(&self, field: &FieldDef) -> Option<String> {
        field.declared_column().map(|c| self.case.apply(c))
    }

    fn key_field(&self, desc: &EntityDescriptor) -> OrmResult<(&'static str, String)> {
        let missing = || OrmError::Configuration {
            entity: desc.type_name,
            kind: ConfigErrorKind::MissingKey,
        };
        let key = desc.key.map(str::trim).ok_or_else(missing)?;
        if key.is_empty() {
            return Err(missing());
        }
        // The key may name the field or its column; either way the SQL uses the column.
        desc.fields
            .iter()
            .find_map(|f| {
                let column = f.declared_column()?;
                (f.name.eq_ignore_ascii_case(key) || column.eq_ignore_ascii_case(key))
                    .then(|| (f.name, self.case.apply(column)))
            })
            .ok_or(OrmError::Configuration {
                entity: desc.type_name,
                kind: ConfigErrorKind::UnknownKeyField,
            })
    }

    /// Walk a descriptor once and resolve everything the builder needs.
    pub fn resolve(&self, desc: &EntityDescriptor) -> OrmResult<EntityMeta> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(target: "hisql.meta", entity = desc.type_name, "resolving entity metadata");

        let table = self.table_name(desc)?;
        let (key_field, key) = self.key_field(desc)?;
        let columns = desc
            .fields
            .iter()
            .filter_map(|f| {
                self.column_name(f).map(|column| ColumnMapping {
                    field: f.name,
                    column,
                    nullable: f.nullable,
                })
            })
            .collect();

        Ok(EntityMeta {
            entity: desc.type_name,
            table,
            key,
            key_field,
            columns,
        })
    }
}
