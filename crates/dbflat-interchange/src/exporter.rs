//! Streaming export of a named query to a delimited file

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use dbflat_core::{CancellationToken, DbflatError, QueryExecutor};

use crate::{DelimiterConfig, ErrorCategory, ExportVariant, Verbosity, encode_row_into};

/// Errors during export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unknown export variant '{name}', expected one of: {expected}")]
    UnknownVariant { name: String, expected: String },

    #[error("Failed to create output file '{}': {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Export cancelled")]
    Cancelled,
}

impl ExportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExportError::UnknownVariant { .. } => ErrorCategory::Configuration,
            ExportError::CreateOutput { .. } | ExportError::Io(_) => ErrorCategory::Io,
            ExportError::Query(_) => ErrorCategory::Execution,
            ExportError::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

impl From<DbflatError> for ExportError {
    fn from(err: DbflatError) -> Self {
        match err {
            DbflatError::Io(e) => ExportError::Io(e),
            DbflatError::Cancelled => ExportError::Cancelled,
            other => ExportError::Query(other.to_string()),
        }
    }
}

/// Where exported rows go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    File(PathBuf),
    Stdout,
}

impl ExportTarget {
    /// A file when a non-empty path is given, standard output otherwise
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if !path.as_os_str().is_empty() => ExportTarget::File(path),
            _ => ExportTarget::Stdout,
        }
    }

}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportTarget::File(path) => write!(f, "{}", path.display()),
            ExportTarget::Stdout => f.write_str("<stdout>"),
        }
    }
}

/// Progress notifications emitted while exporting to a file
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    /// Rows so far, after the output was flushed
    Progress { rows_written: u64 },
    /// Export finished and the output was flushed
    Completed {
        rows_written: u64,
        destination: PathBuf,
    },
}

impl fmt::Display for ExportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportEvent::Progress { rows_written } => {
                write!(f, "{} rows written", group_thousands(*rows_written))
            }
            ExportEvent::Completed {
                rows_written,
                destination,
            } => write!(
                f,
                "Wrote {} lines to {}",
                rows_written,
                destination.display()
            ),
        }
    }
}

/// `12345` as `12,345`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Progress callback for export operations
pub type ExportProgressCallback = Box<dyn Fn(ExportEvent) + Send + Sync>;

/// Export settings
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Row cap for variants that honor one
    pub row_limit: Option<u64>,
    pub delimiters: DelimiterConfig,
    pub verbosity: Verbosity,
    /// Rows between progress reports
    pub progress_interval: u64,
    /// Output buffer size in bytes
    pub buffer_capacity: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            row_limit: None,
            delimiters: DelimiterConfig::default(),
            verbosity: Verbosity::Normal,
            progress_interval: 5_000,
            buffer_capacity: 64 * 1024,
        }
    }
}

/// Outcome of a finished export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub variant: ExportVariant,
    pub rows_written: u64,
    pub column_count: usize,
}

/// Streams query results into a delimited file
pub struct Exporter {
    executor: Arc<dyn QueryExecutor>,
    options: ExportOptions,
    progress_callback: Option<ExportProgressCallback>,
    cancellation: CancellationToken,
}

impl Exporter {
    /// Create a new exporter
    pub fn new(executor: Arc<dyn QueryExecutor>, options: ExportOptions) -> Self {
        Self {
            executor,
            options,
            progress_callback: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Set progress callback
    pub fn with_progress_callback(mut self, callback: ExportProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Stop between rows once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    fn report_progress(&self, event: ExportEvent) {
        tracing::debug!(event = %event, "export progress");
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }

    /// Export the variant named `variant_name`.
    ///
    /// The name is resolved before the target is touched, so an unknown
    /// variant never creates or truncates a file.
    pub fn export(
        &self,
        variant_name: &str,
        target: &ExportTarget,
    ) -> Result<ExportSummary, ExportError> {
        let variant: ExportVariant = variant_name.parse()?;
        self.export_variant(variant, target)
    }

    #[tracing::instrument(skip(self, target), fields(target = %target))]
    pub fn export_variant(
        &self,
        variant: ExportVariant,
        target: &ExportTarget,
    ) -> Result<ExportSummary, ExportError> {
        let sql = variant.query(self.options.row_limit);
        tracing::debug!(sql_preview = %sql, row_limit = ?self.options.row_limit, "starting export");

        let (rows_written, column_count) = match target {
            ExportTarget::File(path) => {
                let file = File::create(path).map_err(|source| ExportError::CreateOutput {
                    path: path.clone(),
                    source,
                })?;
                let writer = BufWriter::with_capacity(self.options.buffer_capacity, file);
                self.write_query(&sql, writer, Some(path))?
            }
            ExportTarget::Stdout => {
                let stdout = io::stdout();
                let writer = BufWriter::with_capacity(self.options.buffer_capacity, stdout.lock());
                self.write_query(&sql, writer, None)?
            }
        };

        Ok(ExportSummary {
            variant,
            rows_written,
            column_count,
        })
    }

    /// Run `sql` and write every row to `writer`.
    ///
    /// `destination` is the output file, if any; progress and completion
    /// events are only emitted for files. Returns rows written and the
    /// result's column count.
    pub fn write_query<W: Write>(
        &self,
        sql: &str,
        mut writer: W,
        destination: Option<&Path>,
    ) -> Result<(u64, usize), ExportError> {
        if sql.trim().is_empty() {
            tracing::debug!("variant has no query, output left empty");
            writer.flush()?;
            self.report_completed(0, destination);
            return Ok((0, 0));
        }

        let report_every = match destination {
            Some(_) if self.options.verbosity >= Verbosity::Normal => {
                self.options.progress_interval
            }
            _ => 0,
        };
        let delimiters = &self.options.delimiters;
        let mut line = String::with_capacity(256);
        let mut rows_written: u64 = 0;

        let streamed = self.executor.query_each(sql, &[], &mut |row| {
            if self.cancellation.is_cancelled() {
                return Err(DbflatError::Cancelled);
            }

            line.clear();
            encode_row_into(&mut line, &row.values, delimiters);
            writer.write_all(line.as_bytes())?;
            rows_written += 1;

            if report_every > 0 && rows_written % report_every == 0 {
                writer.flush()?;
                self.report_progress(ExportEvent::Progress { rows_written });
            }
            Ok(())
        });

        // Whatever was written reaches the destination even when the cursor failed
        let flushed = writer.flush();
        let summary = streamed.map_err(|e| {
            tracing::error!(error = %e, rows_written, "export failed");
            ExportError::from(e)
        })?;
        flushed?;

        self.report_completed(rows_written, destination);
        Ok((rows_written, summary.column_count()))
    }

    fn report_completed(&self, rows_written: u64, destination: Option<&Path>) {
        let Some(path) = destination else {
            return;
        };
        if self.options.verbosity >= Verbosity::Quiet {
            self.report_progress(ExportEvent::Completed {
                rows_written,
                destination: path.to_path_buf(),
            });
        }
    }
}
