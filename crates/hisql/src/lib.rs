//! # hisql
//!
//! A small entity-to-SQL mapping layer for MySQL-like and Oracle-like databases.
//!
//! ## Features
//!
//! - **Declared, not reflected**: entities describe their table, key and columns with a
//!   static descriptor, usually generated by `#[derive(Entity)]`
//! - **Generated CRUD**: get/insert/update/delete by key, predicate queries, paging
//! - **Cached statements**: fixed-shape SQL is built once per entity type
//! - **Dialects**: paging, argument conversion and date literals per engine
//! - **Bring your own pool**: connections come from a [`ConnectionSource`]
//!
//! ## Example
//!
//! ```ignore
//! use hisql::prelude::*;
//!
//! #[derive(Debug, Default, Entity)]
//! #[orm(table = "person", key = "id")]
//! struct Person {
//!     id: Option<i64>,
//!     name: String,
//!     #[orm(column = "birthDate")]
//!     birth_date: Option<chrono::NaiveDate>,
//! }
//!
//! let client = SqlClient::new(pool, ClientConfig::new().db_version(DbVersion::MySql));
//!
//! let mut ann = Person { name: "Ann".into(), ..Default::default() };
//! client.insert(&mut ann)?;
//!
//! let found: Option<Person> = client.get(ann.id.unwrap_or_default())?;
//! let page: Vec<Person> = client.get_by_paged(&[("name", "Ann".into())], 1, 10)?;
//! ```

extern crate self as hisql;

pub mod builder;
pub mod cache;
pub mod client;
pub mod coerce;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod ident;
pub mod log;
pub mod prelude;
pub mod registry;
pub mod row;
pub mod value;

pub use builder::{SqlBuilder, Statement, question_marks};
pub use cache::{CacheStats, GeneratedStatement, StatementCache, StatementKey, StatementOp};
pub use client::SqlClient;
pub use coerce::{FromValue, NumericKind, ToValue};
pub use config::{ClientConfig, StatementCacheConfig};
pub use connection::{Connection, ConnectionSource, PooledConnection};
pub use dialect::{DbVersion, MySqlDialect, OracleDialect, SqlDialect};
pub use entity::{
    ColumnMapping, Entity, EntityDescriptor, EntityMeta, FieldDef, IdentifierCase,
    MetadataResolver,
};
pub use error::{BoxError, ConfigErrorKind, OrmError, OrmResult};
pub use registry::EntityRegistration;
pub use row::{FromRow, Row};
pub use value::Value;

#[cfg(feature = "derive")]
pub use hisql_derive::Entity;

// Re-export inventory for use by derive macros
pub use inventory;
