//! Ventas-sync library
//!
//! A service that replicates newly-created EESS sales tickets from a MySQL
//! source into a PostgreSQL destination on a fixed cadence.
//!
//! # Design Overview
//!
//! Replication runs as an endless loop of independent sync cycles:
//! 1. Each cycle opens fresh connections to both stores, extracts every
//!    sale whose `fecha` falls inside the trailing 24-hour window, and
//!    inserts each one into the destination with one commit per row.
//! 2. Per-row outcomes (success or error with detail) are appended to an
//!    in-memory ledger, readable through the HTTP interface while the
//!    loop keeps running.
//! 3. A shared activity gate pauses and resumes the loop without stopping
//!    the process; the HTTP toggle endpoint flips it.
//!
//! A single bad row never blocks its siblings, and a failed cycle is a
//! no-op retried at the next interval. There is no watermark between
//! cycles: the destination's uniqueness constraint on `nrocentral` is
//! what keeps re-extracted rows from landing twice.
//!
//! # HTTP Usage
//!
//! ```bash
//! # Pause or resume replication
//! curl -X POST http://localhost:5000/toggle-api
//!
//! # Check whether replication is active
//! curl http://localhost:5000/status
//!
//! # List per-record outcomes
//! curl http://localhost:5000/registros
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod mysql;
pub mod postgresql;
pub mod record;
pub mod server;
pub mod state;
pub mod sync;
pub mod testing;

pub use error::{ConnectError, ExtractError, LoadError};
pub use ledger::{OutcomeStatus, ResultLedger, SyncOutcome};
pub use record::SaleRecord;
pub use state::ActivityGate;
pub use sync::{
    run_cycle, SaleSink, SaleSource, Scheduler, SchedulerOpts, SinkConnector, SourceConnector,
};
