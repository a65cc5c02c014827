//! In-memory connection source for integration tests.
//!
//! `MockSource` keeps a few tables in memory and understands exactly the SQL shapes the
//! client generates, plus both dialects' paging wrappers. It records every statement
//! and counts acquire/release calls so tests can check connection discipline.

#![allow(dead_code)]

use hisql::{BoxError, Connection, ConnectionSource, Row, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub sql: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Default)]
struct Table {
    key: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    next_id: i64,
}

impl Table {
    fn col(&self, name: &str) -> Result<usize, BoxError> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("unknown column {name}").into())
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Table>,
    statements: Vec<Recorded>,
    acquired: usize,
    released: usize,
    fail_acquire: bool,
    fail_on: Option<String>,
    upper_case_columns: bool,
    report_generated_keys: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockSource {
    state: Arc<Mutex<State>>,
}

impl MockSource {
    pub fn new() -> Self {
        let source = Self::default();
        source.lock().report_generated_keys = true;
        source
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn create_table(&self, name: &str, key: &str, columns: &[&str]) {
        self.lock().tables.insert(
            name.to_lowercase(),
            Table {
                key: key.to_string(),
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
                next_id: 1,
            },
        );
    }

    /// Insert a fixture row directly, bypassing statement recording.
    pub fn seed(&self, table: &str, values: Vec<Value>) {
        let mut state = self.lock();
        let table = state.tables.get_mut(table).unwrap();
        let key = table.col(&table.key.clone()).unwrap();
        if let Value::BigInt(id) = values[key] {
            table.next_id = table.next_id.max(id + 1);
        }
        table.rows.push(values);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables[table].rows.len()
    }

    pub fn statements(&self) -> Vec<Recorded> {
        self.lock().statements.clone()
    }

    pub fn last_statement(&self) -> Option<Recorded> {
        self.lock().statements.last().cloned()
    }

    pub fn acquired(&self) -> usize {
        self.lock().acquired
    }

    pub fn released(&self) -> usize {
        self.lock().released
    }

    pub fn fail_acquire(&self, fail: bool) {
        self.lock().fail_acquire = fail;
    }

    /// Fail any statement containing `needle`.
    pub fn fail_on(&self, needle: &str) {
        self.lock().fail_on = Some(needle.to_string());
    }

    /// Return result column names upper-cased, as Oracle does.
    pub fn upper_case_columns(&self, upper: bool) {
        self.lock().upper_case_columns = upper;
    }

    pub fn report_generated_keys(&self, report: bool) {
        self.lock().report_generated_keys = report;
    }
}

pub struct MockConnection {
    state: Arc<Mutex<State>>,
    last_id: Option<i64>,
}

impl ConnectionSource for MockSource {
    type Connection = MockConnection;

    fn acquire(&self) -> Result<MockConnection, BoxError> {
        let mut state = self.lock();
        if state.fail_acquire {
            return Err("pool exhausted".into());
        }
        state.acquired += 1;
        Ok(MockConnection {
            state: Arc::clone(&self.state),
            last_id: None,
        })
    }

    fn release(&self, _conn: MockConnection) {
        self.lock().released += 1;
    }
}

impl Connection for MockConnection {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, BoxError> {
        let mut state = self.state.lock().unwrap();
        state.record(sql, params)?;
        state.select(sql, params)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, BoxError> {
        let mut state = self.state.lock().unwrap();
        state.record(sql, params)?;
        let (affected, id) = state.write(sql, params)?;
        if id.is_some() && state.report_generated_keys {
            self.last_id = id;
        }
        Ok(affected)
    }

    fn last_insert_id(&mut self) -> Option<i64> {
        self.last_id
    }
}

const ORACLE_HEAD: &str = "SELECT * FROM (SELECT A.*, ROWNUM RN FROM (";
const ORACLE_TAIL: &str = ") A WHERE ROWNUM<?) WHERE RN>=?";
const MYSQL_TAIL: &str = " LIMIT ?, ?";

fn int(v: &Value) -> Result<i64, BoxError> {
    match v {
        Value::TinyInt(n) => Ok(i64::from(*n)),
        Value::SmallInt(n) => Ok(i64::from(*n)),
        Value::Int(n) => Ok(i64::from(*n)),
        Value::BigInt(n) => Ok(*n),
        other => Err(format!("expected integer argument, got {other:?}").into()),
    }
}

/// Loose SQL equality: numbers compare by value, everything else by rendering.
fn same(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match (int(a), int(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => a.to_string() == b.to_string(),
    }
}

enum Cond {
    Eq(usize),
    In(usize, usize),
}

impl State {
    fn record(&mut self, sql: &str, params: &[Value]) -> Result<(), BoxError> {
        self.statements.push(Recorded {
            sql: sql.to_string(),
            args: params.to_vec(),
        });
        match &self.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => Err("simulated driver failure".into()),
            _ => Ok(()),
        }
    }

    fn table(&self, name: &str) -> Result<&Table, BoxError> {
        self.tables
            .get(&name.trim().to_lowercase())
            .ok_or_else(|| format!("no such table {name}").into())
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table, BoxError> {
        self.tables
            .get_mut(&name.trim().to_lowercase())
            .ok_or_else(|| format!("no such table {name}").into())
    }

    fn select(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, BoxError> {
        // Oracle paging: rows with ROWNUM in [start, upper).
        if let Some(inner) = sql
            .strip_prefix(ORACLE_HEAD)
            .and_then(|s| s.strip_suffix(ORACLE_TAIL))
        {
            let (base, page) = params.split_at(params.len() - 2);
            let (upper, start) = (int(&page[0])?, int(&page[1])?);
            let rows = self.select(inner, base)?;
            return Ok(rows
                .into_iter()
                .zip(1i64..)
                .filter(|(_, rn)| *rn < upper && *rn >= start)
                .map(|(row, rn)| {
                    let mut columns = row.columns().to_vec();
                    let mut values = row.values().to_vec();
                    columns.push(self.column_name("RN"));
                    values.push(Value::BigInt(rn));
                    Row::new(columns, values)
                })
                .collect());
        }
        // MySQL paging: LIMIT offset, count.
        if let Some(inner) = sql.strip_suffix(MYSQL_TAIL) {
            let (base, page) = params.split_at(params.len() - 2);
            let (offset, count) = (int(&page[0])?, int(&page[1])?);
            let rows = self.select(inner, base)?;
            return Ok(rows
                .into_iter()
                .skip(offset.max(0) as usize)
                .take(count.max(0) as usize)
                .collect());
        }

        let (count_only, rest) = if let Some(rest) = sql.strip_prefix("SELECT COUNT(*) FROM ") {
            (true, rest)
        } else if let Some(rest) = sql.strip_prefix("SELECT * FROM ") {
            (false, rest)
        } else {
            return Err(format!("unsupported query: {sql}").into());
        };
        let (table_name, where_clause) = match rest.split_once(" WHERE ") {
            Some((t, w)) => (t, Some(w)),
            None => (rest, None),
        };
        let table = self.table(table_name)?;
        let matched = self.matching(table, where_clause, params)?;

        if count_only {
            return Ok(vec![Row::new(
                vec![self.column_name("COUNT(*)")],
                vec![Value::BigInt(matched.len() as i64)],
            )]);
        }
        Ok(matched
            .into_iter()
            .map(|i| {
                Row::new(
                    table.columns.iter().map(|c| self.column_name(c)).collect(),
                    table.rows[i].clone(),
                )
            })
            .collect())
    }

    fn column_name(&self, name: &str) -> String {
        if self.upper_case_columns {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }

    /// Indexes of rows matching a `c=? AND c IN (?,?)` clause.
    fn matching(
        &self,
        table: &Table,
        where_clause: Option<&str>,
        params: &[Value],
    ) -> Result<Vec<usize>, BoxError> {
        let Some(clause) = where_clause else {
            return Ok((0..table.rows.len()).collect());
        };
        let mut conds = Vec::new();
        let mut next = 0;
        for part in clause.split(" AND ") {
            if let Some(col) = part.strip_suffix("=?") {
                conds.push((table.col(col)?, Cond::Eq(next)));
                next += 1;
            } else if let Some((col, list)) = part.split_once(" IN (") {
                let n = list.trim_end_matches(')').split(',').count();
                conds.push((table.col(col)?, Cond::In(next, n)));
                next += n;
            } else {
                return Err(format!("unsupported predicate: {part}").into());
            }
        }
        if next != params.len() {
            return Err(format!("expected {next} arguments, got {}", params.len()).into());
        }
        Ok((0..table.rows.len())
            .filter(|&i| {
                conds.iter().all(|(col, cond)| {
                    let v = &table.rows[i][*col];
                    match *cond {
                        Cond::Eq(p) => same(v, &params[p]),
                        Cond::In(p, n) => params[p..p + n].iter().any(|a| same(v, a)),
                    }
                })
            })
            .collect())
    }

    fn write(&mut self, sql: &str, params: &[Value]) -> Result<(u64, Option<i64>), BoxError> {
        if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            let (table_name, rest) = rest
                .split_once(" (")
                .ok_or("malformed insert")?;
            let (cols, _) = rest.split_once(") VALUES (").ok_or("malformed insert")?;
            let cols: Vec<&str> = cols.split(',').collect();
            if cols.len() != params.len() {
                return Err("insert argument count mismatch".into());
            }
            let table = self.table_mut(table_name)?;
            let mut row = vec![Value::Null; table.columns.len()];
            for (col, value) in cols.iter().zip(params) {
                row[table.col(col)?] = value.clone();
            }
            let key = table.col(&table.key.clone())?;
            let id = if row[key].is_null() {
                let id = table.next_id;
                row[key] = Value::BigInt(id);
                id
            } else {
                int(&row[key])?
            };
            table.next_id = table.next_id.max(id + 1);
            table.rows.push(row);
            return Ok((1, Some(id)));
        }
        if let Some(rest) = sql.strip_prefix("UPDATE ") {
            let (table_name, rest) = rest.split_once(" SET ").ok_or("malformed update")?;
            let (sets, where_clause) = rest.split_once(" WHERE ").ok_or("update without where")?;
            let sets: Vec<&str> = sets.split(',').map(|s| s.trim_end_matches("=?")).collect();
            let (set_args, where_args) = params.split_at(sets.len());
            let table = self.table(table_name)?;
            let targets = self.matching(table, Some(where_clause), where_args)?;
            let cols = sets
                .iter()
                .map(|c| table.col(c))
                .collect::<Result<Vec<_>, _>>()?;
            let table = self.table_mut(table_name)?;
            for &i in &targets {
                for (col, value) in cols.iter().zip(set_args) {
                    table.rows[i][*col] = value.clone();
                }
            }
            return Ok((targets.len() as u64, None));
        }
        if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            let (table_name, where_clause) =
                rest.split_once(" WHERE ").ok_or("delete without where")?;
            let table = self.table(table_name)?;
            let targets = self.matching(table, Some(where_clause), params)?;
            let table = self.table_mut(table_name)?;
            let mut i = 0;
            table.rows.retain(|_| {
                let keep = !targets.contains(&i);
                i += 1;
                keep
            });
            return Ok((targets.len() as u64, None));
        }
        Err(format!("unsupported statement: {sql}").into())
    }
}
