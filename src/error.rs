//! Error taxonomy for the replication core.
//!
//! Every variant here is cycle-scoped at worst: a connection or extraction
//! failure aborts only the current cycle, and a load failure affects only
//! the one row it happened on. None of them is allowed to take the
//! process down.

use thiserror::Error;

/// Failure to open a connection to either store.
///
/// Never retried within a cycle; the scheduler retries at the next
/// interval.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("mysql connection failed: {0}")]
    Mysql(#[from] mysql_async::Error),

    #[error("postgresql connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Store unreachable for a reason carried as text. Used by the
    /// in-memory stores in `testing`.
    #[error("{0}")]
    Unavailable(String),
}

/// The extraction query failed after the source connection succeeded.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("source query failed: {0}")]
    Query(#[from] mysql_async::Error),

    /// A returned row could not be converted into a sale record.
    #[error("malformed source row: {0}")]
    Row(String),
}

/// Insert/commit failure for a single record at the destination.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("insert failed: {0}")]
    Insert(#[from] tokio_postgres::Error),

    /// Destination rejected the row for a reason carried as text. Used by
    /// the in-memory stores in `testing`.
    #[error("{0}")]
    Rejected(String),
}
