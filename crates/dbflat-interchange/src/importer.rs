//! Transactional bulk import of a delimited file into an existing table
//!
//! The target table's columns are read from the database, in physical
//! order, before anything else happens. Records are mapped to those columns
//! positionally: missing trailing fields become NULL and extra fields are
//! ignored. Every insert, plus the optional clearing of existing rows, runs
//! inside one transaction that is committed only after the last batch.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use dbflat_core::{
    CancellationToken, DbflatError, SchemaIntrospection, TableRef, Transaction,
    TransactionalSink, Value, quote_identifier,
};

use crate::{DelimiterConfig, ErrorCategory, RecordReader, decode_fields};

/// Errors during import
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Table '{0}' not found or has no columns")]
    TableNotFound(String),

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("Failed to open input file '{}': {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Record {record} is not valid UTF-8")]
    Encoding { record: u64 },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Import cancelled")]
    Cancelled,
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::InvalidTable(_) => ErrorCategory::Configuration,
            ImportError::TableNotFound(_) | ImportError::Schema(_) => ErrorCategory::Schema,
            ImportError::OpenInput { .. } | ImportError::Io(_) | ImportError::Encoding { .. } => {
                ErrorCategory::Io
            }
            ImportError::Query(_) => ErrorCategory::Execution,
            ImportError::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

impl From<DbflatError> for ImportError {
    fn from(err: DbflatError) -> Self {
        match err {
            DbflatError::Io(e) => ImportError::Io(e),
            DbflatError::Cancelled => ImportError::Cancelled,
            DbflatError::Schema(msg) => ImportError::Schema(msg),
            other => ImportError::Query(other.to_string()),
        }
    }
}

/// Progress notifications emitted while importing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    /// Existing rows were deleted ahead of the first insert
    TableCleared { table: String, rows_deleted: u64 },
    /// One batch of inserts was executed
    BatchExecuted { batch_rows: usize, rows_imported: u64 },
    /// The transaction was committed
    Committed { table: String, rows_imported: u64 },
}

impl fmt::Display for ImportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportEvent::TableCleared {
                table,
                rows_deleted,
            } => write!(f, "Deleted {} existing rows from {}", rows_deleted, table),
            ImportEvent::BatchExecuted {
                batch_rows,
                rows_imported,
            } => write!(
                f,
                "Inserted batch of {} rows ({} total)",
                batch_rows, rows_imported
            ),
            ImportEvent::Committed {
                table,
                rows_imported,
            } => write!(f, "Imported {} rows into {}", rows_imported, table),
        }
    }
}

/// Progress callback for import operations
pub type ImportProgressCallback = Box<dyn Fn(ImportEvent) + Send + Sync>;

/// Import settings
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub delimiters: DelimiterConfig,
    /// Delete every existing row of the target table first
    pub drop_existing: bool,
    /// Rows per insert batch
    pub batch_size: usize,
    /// Input buffer size in bytes
    pub buffer_capacity: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiters: DelimiterConfig::default(),
            drop_existing: false,
            batch_size: 1_000,
            buffer_capacity: 64 * 1024,
        }
    }
}

/// Outcome of a committed import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub table: String,
    pub columns: Vec<String>,
    pub rows_imported: u64,
    pub batches_executed: u64,
    /// Rows removed by `drop_existing`, if it was set
    pub rows_deleted: Option<u64>,
}

/// Parameterized insert naming every column in order.
///
/// Identifiers are quoted; values are always bound as parameters.
pub fn build_insert_sql(table: &TableRef, columns: &[String]) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.quoted(),
        column_list,
        placeholders
    )
}

/// Loads delimited records into a table
pub struct Importer {
    introspector: Arc<dyn SchemaIntrospection>,
    sink: Arc<dyn TransactionalSink>,
    options: ImportOptions,
    progress_callback: Option<ImportProgressCallback>,
    cancellation: CancellationToken,
}

/// Counters gathered inside the transaction
#[derive(Debug, Default)]
struct LoadStats {
    rows_imported: u64,
    batches_executed: u64,
    rows_deleted: Option<u64>,
}

impl Importer {
    /// Create a new importer
    pub fn new(
        introspector: Arc<dyn SchemaIntrospection>,
        sink: Arc<dyn TransactionalSink>,
        options: ImportOptions,
    ) -> Self {
        Self {
            introspector,
            sink,
            options,
            progress_callback: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Set progress callback
    pub fn with_progress_callback(mut self, callback: ImportProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Stop between records once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    fn report_progress(&self, event: ImportEvent) {
        tracing::debug!(event = %event, "import progress");
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }

    /// Import the file at `path` into `table`
    pub fn import_file(&self, path: &Path, table: &str) -> Result<ImportSummary, ImportError> {
        let file = File::open(path).map_err(|source| ImportError::OpenInput {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::with_capacity(self.options.buffer_capacity, file);
        self.import_reader(reader, table)
    }

    /// Import every record readable from `reader` into `table`.
    ///
    /// Nothing is read from `reader` unless the table exists and has at
    /// least one column. On any failure after the transaction began it is
    /// rolled back, leaving the table as it was.
    #[tracing::instrument(skip(self, reader), fields(drop_existing = self.options.drop_existing))]
    pub fn import_reader<R: BufRead>(
        &self,
        reader: R,
        table: &str,
    ) -> Result<ImportSummary, ImportError> {
        let table_ref =
            TableRef::parse(table).map_err(|e| ImportError::InvalidTable(e.to_string()))?;

        let columns = self.introspector.column_names(&table_ref)?;
        if columns.is_empty() {
            tracing::error!("Table '{}' not found or has no columns.", table_ref);
            return Err(ImportError::TableNotFound(table_ref.to_string()));
        }
        tracing::debug!(columns = columns.len(), "resolved target columns");

        let insert_sql = build_insert_sql(&table_ref, &columns);
        let mut tx = self.sink.begin_transaction()?;

        match self.load(&mut *tx, &table_ref, columns.len(), &insert_sql, reader) {
            Ok(stats) => {
                tx.commit()?;
                tracing::debug!(
                    rows = stats.rows_imported,
                    batches = stats.batches_executed,
                    "import committed"
                );
                self.report_progress(ImportEvent::Committed {
                    table: table_ref.to_string(),
                    rows_imported: stats.rows_imported,
                });
                Ok(ImportSummary {
                    table: table_ref.to_string(),
                    columns,
                    rows_imported: stats.rows_imported,
                    batches_executed: stats.batches_executed,
                    rows_deleted: stats.rows_deleted,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "import failed, rolling back");
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    fn load<R: BufRead>(
        &self,
        tx: &mut dyn Transaction,
        table: &TableRef,
        column_count: usize,
        insert_sql: &str,
        reader: R,
    ) -> Result<LoadStats, ImportError> {
        let mut stats = LoadStats::default();

        if self.options.drop_existing {
            let deleted = tx.execute(&format!("DELETE FROM {}", table.quoted()), &[])?;
            stats.rows_deleted = Some(deleted);
            self.report_progress(ImportEvent::TableCleared {
                table: table.to_string(),
                rows_deleted: deleted,
            });
        }

        let delimiters = &self.options.delimiters;
        let batch_size = self.options.batch_size.max(1);
        let mut records = RecordReader::new(reader, delimiters);
        let mut record = Vec::new();
        let mut batch: Vec<Vec<Value>> = Vec::with_capacity(batch_size);

        while records.next_record(&mut record)? {
            if self.cancellation.is_cancelled() {
                return Err(ImportError::Cancelled);
            }

            let text = std::str::from_utf8(&record).map_err(|_| ImportError::Encoding {
                record: records.records_read(),
            })?;
            let mut fields = decode_fields(text, delimiters);
            let params = (0..column_count)
                .map(|_| Value::from_text(fields.next().flatten()))
                .collect();
            batch.push(params);

            if batch.len() >= batch_size {
                self.execute_batch(tx, insert_sql, &mut batch, &mut stats)?;
            }
        }

        if !batch.is_empty() {
            self.execute_batch(tx, insert_sql, &mut batch, &mut stats)?;
        }

        Ok(stats)
    }

    fn execute_batch(
        &self,
        tx: &mut dyn Transaction,
        insert_sql: &str,
        batch: &mut Vec<Vec<Value>>,
        stats: &mut LoadStats,
    ) -> Result<(), ImportError> {
        tx.execute_batch(insert_sql, batch)?;
        stats.rows_imported += batch.len() as u64;
        stats.batches_executed += 1;
        self.report_progress(ImportEvent::BatchExecuted {
            batch_rows: batch.len(),
            rows_imported: stats.rows_imported,
        });
        batch.clear();
        Ok(())
    }
}
