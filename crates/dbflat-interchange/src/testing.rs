//! In-memory collaborators that record every call

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dbflat_core::{
    ColumnInfo, ColumnMeta, CursorSummary, DbflatError, QueryExecutor, Result, Row, RowCallback,
    SchemaIntrospection, TableRef, Transaction, TransactionalSink, Value,
};

/// Serves a fixed result set to every query
pub struct FakeExecutor {
    rows: Vec<Vec<Value>>,
    fail_after: Option<usize>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows,
            fail_after: None,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the cursor once `rows` rows were delivered
    pub fn failing_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }

    pub fn queries(&self) -> Arc<Mutex<Vec<String>>> {
        self.queries.clone()
    }
}

impl QueryExecutor for FakeExecutor {
    fn driver_name(&self) -> &str {
        "fake"
    }

    fn query_each(
        &self,
        sql: &str,
        _params: &[Value],
        on_row: &mut RowCallback<'_>,
    ) -> Result<CursorSummary> {
        self.queries.lock().unwrap().push(sql.to_string());

        let width = self.rows.first().map(Vec::len).unwrap_or(0);
        let names: Arc<[String]> = (0..width).map(|i| format!("c{}", i)).collect();
        let columns = names
            .iter()
            .enumerate()
            .map(|(ordinal, name)| ColumnMeta {
                name: name.clone(),
                data_type: "TEXT".into(),
                ordinal,
            })
            .collect();

        let mut rows_read = 0;
        for values in &self.rows {
            if self.fail_after == Some(rows_read as usize) {
                return Err(DbflatError::Query("cursor lost".into()));
            }
            on_row(&Row::new(names.clone(), values.clone()))?;
            rows_read += 1;
        }

        Ok(CursorSummary { columns, rows_read })
    }

    fn execute(&self, sql: &str, _params: &[Value]) -> Result<u64> {
        self.queries.lock().unwrap().push(sql.to_string());
        Ok(0)
    }
}

/// A call observed by [`FakeDatabase`]
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Begin,
    Execute(String),
    Batch {
        sql: String,
        rows: Vec<Vec<Value>>,
        /// Rows visible in the table just before this batch ran
        visible_before: usize,
    },
    Commit,
    Rollback,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<String>>,
    contents: HashMap<String, Vec<Vec<Value>>>,
    journal: Vec<Op>,
    fail_on_batch: Option<usize>,
    batches_seen: usize,
}

/// Tables, transactions and a call journal kept in memory.
///
/// Batches always insert into the single table named by the insert
/// statement; `DELETE FROM` empties it.
#[derive(Clone, Default)]
pub struct FakeDatabase {
    state: Arc<Mutex<State>>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.tables.insert(
                name.to_string(),
                columns.iter().map(|c| c.to_string()).collect(),
            );
            state.contents.insert(name.to_string(), rows);
        }
        self
    }

    /// Make the `n`th batch (1-based) fail
    pub fn failing_on_batch(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_on_batch = Some(n);
        self
    }

    pub fn journal(&self) -> Vec<Op> {
        self.state.lock().unwrap().journal.clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Vec<Value>> {
        self.state
            .lock()
            .unwrap()
            .contents
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn batches(&self) -> Vec<Vec<Vec<Value>>> {
        self.journal()
            .into_iter()
            .filter_map(|op| match op {
                Op::Batch { rows, .. } => Some(rows),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Op) -> usize {
        self.journal().iter().filter(|op| *op == wanted).count()
    }
}

impl SchemaIntrospection for FakeDatabase {
    fn get_columns(&self, table: &TableRef) -> Result<Vec<ColumnInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tables
            .get(&table.name)
            .map(|cols| {
                cols.iter()
                    .enumerate()
                    .map(|(i, c)| ColumnInfo::new(c.clone(), i))
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl TransactionalSink for FakeDatabase {
    fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        let working = {
            let mut state = self.state.lock().unwrap();
            state.journal.push(Op::Begin);
            state.contents.clone()
        };
        Ok(Box::new(FakeTransaction {
            db: self.clone(),
            working,
        }))
    }
}

struct FakeTransaction {
    db: FakeDatabase,
    working: HashMap<String, Vec<Vec<Value>>>,
}

impl FakeTransaction {
    fn table_of(sql: &str) -> String {
        sql.split('"').nth(1).unwrap_or_default().to_string()
    }
}

impl Transaction for FakeTransaction {
    fn execute(&mut self, sql: &str, _params: &[Value]) -> Result<u64> {
        self.db
            .state
            .lock()
            .unwrap()
            .journal
            .push(Op::Execute(sql.to_string()));
        if sql.starts_with("DELETE FROM") {
            let rows = self.working.entry(Self::table_of(sql)).or_default();
            let deleted = rows.len() as u64;
            rows.clear();
            return Ok(deleted);
        }
        Ok(0)
    }

    fn execute_batch(&mut self, sql: &str, batch: &[Vec<Value>]) -> Result<u64> {
        let table = Self::table_of(sql);
        let mut state = self.db.state.lock().unwrap();
        state.batches_seen += 1;
        if state.fail_on_batch == Some(state.batches_seen) {
            return Err(DbflatError::Query("constraint violated".into()));
        }
        let rows = self.working.entry(table).or_default();
        state.journal.push(Op::Batch {
            sql: sql.to_string(),
            rows: batch.to_vec(),
            visible_before: rows.len(),
        });
        rows.extend(batch.iter().cloned());
        Ok(batch.len() as u64)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let FakeTransaction { db, working } = *self;
        let mut state = db.state.lock().unwrap();
        state.journal.push(Op::Commit);
        state.contents = working;
        Ok(())
    }

    fn rollback(self: Box<Self>) -> Result<()> {
        self.db.state.lock().unwrap().journal.push(Op::Rollback);
        Ok(())
    }
}
