//! SQLite connection implementation

use dbflat_core::{
    ColumnInfo, ColumnMeta, CursorSummary, DbflatError, QueryExecutor, Result, Row,
    RowCallback, SchemaIntrospection, TableRef, Transaction, TransactionalSink, Value,
};
use parking_lot::Mutex;
use rusqlite::types::{ToSql, ToSqlOutput};
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};
use std::sync::Arc;
use std::time::Duration;

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: Arc<Mutex<RusqliteConnection>>,
}

impl SqliteConnection {
    /// Open a SQLite database
    pub fn open(path: &str) -> Result<Self> {
        tracing::debug!(path = %path, "opening SQLite database");
        let expanded_path = Self::expand_path(path)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                DbflatError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if let Some(parent) = file_path.parent()
                    && !parent.exists()
                {
                    return Err(DbflatError::Connection(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    )));
                }
            }

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                DbflatError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        conn.pragma_update(None, "foreign_keys", "ON").map_err(|e| {
            DbflatError::Connection(format!("Failed to enable foreign keys: {}", e))
        })?;

        tracing::debug!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Expand path to handle ~ (home directory) and relative paths
    fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            match std::env::var_os("HOME") {
                Some(home) => std::path::PathBuf::from(home)
                    .join(rest)
                    .to_string_lossy()
                    .to_string(),
                None => {
                    return Err(DbflatError::Configuration(
                        "Unable to determine HOME directory".into(),
                    ));
                }
            }
        } else if path.starts_with('~') {
            return Err(DbflatError::Configuration(
                "User-specific home directories (~user) are not supported".into(),
            ));
        } else {
            path.to_string()
        };

        let path_buf = std::path::PathBuf::from(&expanded);
        let result = if path_buf.is_relative() {
            std::env::current_dir()?
                .join(path_buf)
                .to_string_lossy()
                .to_string()
        } else {
            expanded
        };

        Ok(result)
    }

    /// How long a statement waits on a locked database before failing
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn
            .lock()
            .busy_timeout(timeout)
            .map_err(|e| DbflatError::Connection(format!("Failed to set busy timeout: {}", e)))
    }

    /// Execute a script of one or more statements without parameters
    pub fn execute_script(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing SQL script");
        self.conn
            .lock()
            .execute_batch(sql)
            .map_err(|e| DbflatError::Query(format!("Failed to execute batch: {}", e)))
    }

    /// Run a query and collect every row.
    ///
    /// Meant for small results; use [`QueryExecutor::query_each`] to stream.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        self.query_each(sql, params, &mut |row| {
            rows.push(row.clone());
            Ok(())
        })?;
        Ok(rows)
    }
}

impl QueryExecutor for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, params, on_row), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    fn query_each(
        &self,
        sql: &str,
        params: &[Value],
        on_row: &mut RowCallback<'_>,
    ) -> Result<CursorSummary> {
        let start_time = std::time::Instant::now();
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DbflatError::Query(format!("Failed to prepare query: {}", e)))?;

        let columns: Vec<ColumnMeta> = stmt
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| ColumnMeta {
                name: col.name().to_string(),
                data_type: col.decl_type().unwrap_or("DYNAMIC").to_string(),
                ordinal: idx,
            })
            .collect();
        let column_names: Arc<[String]> = columns.iter().map(|c| c.name.clone()).collect();
        let column_count = columns.len();

        let mut query_rows = stmt
            .query(params_from_iter(params.iter().map(SqlParam)))
            .map_err(|e| DbflatError::Query(format!("Failed to execute query: {}", e)))?;

        // One buffer reused for every row; the callback only borrows it.
        let mut current = Row::new(column_names, Vec::with_capacity(column_count));
        let mut rows_read = 0u64;
        while let Some(row) = query_rows
            .next()
            .map_err(|e| DbflatError::Query(format!("Failed to fetch row: {}", e)))?
        {
            current.values.clear();
            for i in 0..column_count {
                current.values.push(rusqlite_to_value(row, i)?);
            }
            on_row(&current)?;
            rows_read += 1;
        }

        tracing::debug!(
            row_count = rows_read,
            execution_time_ms = start_time.elapsed().as_millis() as u64,
            "query streamed successfully"
        );
        Ok(CursorSummary { columns, rows_read })
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let conn = self.conn.lock();
        let rows_affected = conn
            .execute(sql, params_from_iter(params.iter().map(SqlParam)))
            .map_err(|e| DbflatError::Query(format!("Failed to execute statement: {}", e)))?;

        tracing::debug!(affected_rows = rows_affected, "statement executed");
        Ok(rows_affected as u64)
    }
}

impl SchemaIntrospection for SqliteConnection {
    #[tracing::instrument(skip(self, table), fields(table = %table))]
    fn get_columns(&self, table: &TableRef) -> Result<Vec<ColumnInfo>> {
        let schema = table.schema.as_deref().unwrap_or("main");
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT cid, name, type, \"notnull\", pk FROM pragma_table_info(?1, ?2) ORDER BY cid",
            )
            .map_err(|e| DbflatError::Schema(format!("Failed to prepare column lookup: {}", e)))?;

        let columns = stmt
            .query_map([table.name.as_str(), schema], |row| {
                Ok(ColumnInfo {
                    ordinal: row.get::<_, i64>(0)? as usize,
                    name: row.get(1)?,
                    data_type: row.get(2)?,
                    nullable: row.get::<_, i64>(3)? == 0,
                    is_primary_key: row.get::<_, i64>(4)? > 0,
                })
            })
            .and_then(|mapped| mapped.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| DbflatError::Schema(format!("Failed to read columns: {}", e)))?;

        tracing::debug!(column_count = columns.len(), "columns listed");
        Ok(columns)
    }
}

impl TransactionalSink for SqliteConnection {
    fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        tracing::debug!("beginning SQLite transaction");
        // DEFERRED takes the write lock only when the first write happens.
        self.conn
            .lock()
            .execute_batch("BEGIN DEFERRED")
            .map_err(|e| DbflatError::Query(format!("Failed to begin transaction: {}", e)))?;
        tracing::debug!("SQLite transaction started");
        Ok(Box::new(SqliteTransaction {
            conn: Arc::clone(&self.conn),
            committed: false,
            rolled_back: false,
        }))
    }
}

/// SQLite transaction that rolls back when dropped unfinished
pub struct SqliteTransaction {
    conn: Arc<Mutex<RusqliteConnection>>,
    committed: bool,
    rolled_back: bool,
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.committed && !self.rolled_back {
            tracing::warn!(
                "SQLite transaction dropped without commit or rollback, issuing automatic rollback"
            );
            if let Err(e) = self.conn.lock().execute_batch("ROLLBACK") {
                tracing::error!(error = %e, "automatic rollback on drop failed");
            }
        }
    }
}

impl Transaction for SqliteTransaction {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        tracing::debug!(sql_preview = %sql.chars().take(100).collect::<String>(), "executing statement in SQLite transaction");
        let conn = self.conn.lock();
        let rows_affected = conn
            .execute(sql, params_from_iter(params.iter().map(SqlParam)))
            .map_err(|e| DbflatError::Query(format!("Failed to execute statement: {}", e)))?;
        Ok(rows_affected as u64)
    }

    fn execute_batch(&mut self, sql: &str, batch: &[Vec<Value>]) -> Result<u64> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| DbflatError::Query(format!("Failed to prepare statement: {}", e)))?;

        let mut affected = 0u64;
        for (idx, params) in batch.iter().enumerate() {
            affected += stmt
                .execute(params_from_iter(params.iter().map(SqlParam)))
                .map_err(|e| {
                    DbflatError::Query(format!(
                        "Failed to execute statement for batch row {}: {}",
                        idx + 1,
                        e
                    ))
                })? as u64;
        }

        tracing::debug!(batch_rows = batch.len(), affected_rows = affected, "batch executed");
        Ok(affected)
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("committing SQLite transaction");

        if self.rolled_back {
            return Err(DbflatError::Query("Transaction already rolled back".into()));
        }
        if self.committed {
            return Err(DbflatError::Query("Transaction already committed".into()));
        }

        self.conn
            .lock()
            .execute_batch("COMMIT")
            .map_err(|e| DbflatError::Query(format!("Failed to commit transaction: {}", e)))?;

        self.committed = true;
        tracing::debug!("SQLite transaction committed successfully");
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("rolling back SQLite transaction");

        if self.committed {
            return Err(DbflatError::Query("Transaction already committed".into()));
        }
        if self.rolled_back {
            return Ok(());
        }

        self.conn
            .lock()
            .execute_batch("ROLLBACK")
            .map_err(|e| DbflatError::Query(format!("Failed to rollback transaction: {}", e)))?;

        self.rolled_back = true;
        tracing::debug!("SQLite transaction rolled back successfully");
        Ok(())
    }
}

/// Borrowed bind parameter, so batches are bound without copying strings.
struct SqlParam<'a>(&'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::Int64(i) => ToSqlOutput::from(*i),
            Value::Float64(f) => ToSqlOutput::from(*f),
            Value::String(s) => ToSqlOutput::from(s.as_str()),
            Value::Bytes(b) => ToSqlOutput::from(b.as_slice()),
        })
    }
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| DbflatError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).into_owned()),
        // BLOB columns frequently hold text; keep it as text when it decodes.
        ValueRef::Blob(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::Bytes(b.to_vec()),
        },
    };

    Ok(value)
}
