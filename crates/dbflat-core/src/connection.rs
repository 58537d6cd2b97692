//! Collaborator traits: query execution and transactional writes

use crate::{CursorSummary, Result, Row, Value};

/// Callback invoked once per cursor row, in result order.
///
/// Returning an error stops the cursor and the error is handed back to the
/// caller of [`QueryExecutor::query_each`] unchanged.
pub type RowCallback<'a> = dyn FnMut(&Row) -> Result<()> + 'a;

/// Runs queries and streams their results forward-only.
pub trait QueryExecutor: Send + Sync {
    /// Get the driver name (e.g., "sqlite")
    fn driver_name(&self) -> &str;

    /// Execute a query and feed every row to `on_row` without buffering the
    /// result set.
    ///
    /// Every row handed to the callback carries exactly as many values as
    /// the result has columns. The callback must not call back into the same
    /// connection.
    fn query_each(
        &self,
        sql: &str,
        params: &[Value],
        on_row: &mut RowCallback<'_>,
    ) -> Result<CursorSummary>;

    /// Execute a statement that modifies data, returning rows affected
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;
}

/// Source of transactions for batched writes.
pub trait TransactionalSink: Send + Sync {
    /// Begin a transaction
    fn begin_transaction(&self) -> Result<Box<dyn Transaction>>;
}

/// A database transaction.
///
/// Dropping a transaction that was neither committed nor rolled back rolls
/// it back.
pub trait Transaction: Send {
    /// Execute a single statement within the transaction
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute one statement once per parameter set, in order, returning the
    /// total number of rows affected
    fn execute_batch(&mut self, sql: &str, batch: &[Vec<Value>]) -> Result<u64>;

    /// Commit the transaction
    fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    fn rollback(self: Box<Self>) -> Result<()>;
}
