//! Convenient imports for typical `hisql` usage.
//!
//! ```ignore
//! use hisql::prelude::*;
//! ```

pub use crate::{
    ClientConfig, Connection, ConnectionSource, DbVersion, Entity, FromRow, OrmError, OrmResult,
    Row, SqlClient, Value,
};
