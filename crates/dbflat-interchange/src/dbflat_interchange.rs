//! dbflat flat-file interchange
//!
//! Moves rows between a database and delimited text files in a single
//! synchronous pass.
//!
//! # Architecture
//!
//! ```text
//! QueryExecutor → Exporter → encode_row → BufWriter → file / stdout
//!
//! file → RecordReader → decode_fields → Importer → Transaction (batches of 1000)
//!                                          ↑
//!                                SchemaIntrospection
//! ```
//!
//! Both directions share [`DelimiterConfig`], so a file written by the
//! exporter reads back through the importer under the same configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! let conn = Arc::new(SqliteDriver::new().connect(&config)?);
//!
//! let exporter = Exporter::new(conn.clone(), ExportOptions::default());
//! exporter.export("Configuration", &ExportTarget::File("config.txt".into()))?;
//!
//! let importer = Importer::new(conn.clone(), conn, ImportOptions::default());
//! importer.import_file(Path::new("config.txt"), "config_copy")?;
//! ```

mod exporter;
mod format;
mod importer;
mod record_reader;
mod status;
mod variant;
mod verbosity;

#[cfg(test)]
mod testing;

pub use exporter::{
    ExportError, ExportEvent, ExportOptions, ExportProgressCallback, ExportSummary, ExportTarget,
    Exporter,
};
pub use format::*;
pub use importer::{
    ImportError, ImportEvent, ImportOptions, ImportProgressCallback, ImportSummary, Importer,
    build_insert_sql,
};
pub use record_reader::RecordReader;
pub use status::ErrorCategory;
pub use variant::ExportVariant;
pub use verbosity::Verbosity;
