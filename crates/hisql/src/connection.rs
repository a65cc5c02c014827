//! Connection source interfaces.
//!
//! The physical pool and driver live outside this crate. A host plugs them in by
//! implementing [`ConnectionSource`] and [`Connection`]; the client only acquires a
//! connection, runs one statement on it and hands it back.

use crate::error::BoxError;
use crate::row::Row;
use crate::value::Value;

/// A driver connection able to run one statement at a time.
pub trait Connection {
    /// Run a query and return all of its rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, BoxError>;

    /// Run a statement and return the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, BoxError>;

    /// Key generated by the last insert on this connection, if the driver reports one.
    fn last_insert_id(&mut self) -> Option<i64> {
        None
    }
}

/// Hands out connections and takes them back.
pub trait ConnectionSource {
    type Connection: Connection;

    fn acquire(&self) -> Result<Self::Connection, BoxError>;

    fn release(&self, conn: Self::Connection);
}

/// A connection borrowed from a [`ConnectionSource`], released when dropped.
pub struct PooledConnection<'a, S: ConnectionSource> {
    source: &'a S,
    conn: Option<S::Connection>,
}

impl<'a, S: ConnectionSource> PooledConnection<'a, S> {
    pub fn acquire(source: &'a S) -> Result<Self, BoxError> {
        let conn = source.acquire()?;
        Ok(Self {
            source,
            conn: Some(conn),
        })
    }

    fn conn(&mut self) -> Result<&mut S::Connection, BoxError> {
        self.conn
            .as_mut()
            .ok_or_else(|| BoxError::from("connection already released"))
    }

    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, BoxError> {
        self.conn()?.query(sql, params)
    }

    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, BoxError> {
        self.conn()?.execute(sql, params)
    }

    pub fn last_insert_id(&mut self) -> Option<i64> {
        self.conn.as_mut().and_then(Connection::last_insert_id)
    }
}

impl<S: ConnectionSource> Drop for PooledConnection<'_, S> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.source.release(conn);
        }
    }
}
