//! dbflat Core - shared types and collaborator traits
//!
//! This crate defines the narrow interfaces the export/import engine depends
//! on, so the engine never talks to a concrete database driver:
//!
//! - `QueryExecutor` - runs a query and streams its rows forward-only
//! - `SchemaIntrospection` - ordered column lookup for a table
//! - `TransactionalSink` / `Transaction` - batched writes with commit/rollback
//! - `CancellationToken` - cooperative cancellation shared with the caller
//! - Common types like `Value`, `Row`, `ColumnMeta`, `TableRef`

mod cancel;
mod connection;
mod driver;
mod error;
mod identifier;
mod schema;
mod types;

pub use cancel::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use identifier::*;
pub use schema::*;
pub use types::*;
