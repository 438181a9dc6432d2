//! Replication loop for ventas-sync
//!
//! This module owns the two moving parts of the service: [`run_cycle`],
//! which performs one extract-and-load pass over the trailing window, and
//! [`Scheduler`], which runs cycles forever at a fixed interval while the
//! shared [`ActivityGate`] allows it.
//!
//! # Design Overview
//!
//! Cycles are independent by construction:
//! 1. Connections are opened at the start of a cycle and released on every
//!    exit path, so a failed cycle leaves nothing behind.
//! 2. Each extracted row is inserted and committed on its own; a rejected
//!    row is recorded in the [`ResultLedger`] and never stops the rows
//!    after it.
//! 3. Cycle-level failures (connection, extraction) make the cycle a
//!    logged no-op; the scheduler simply tries again at the next interval.
//!
//! Exactly one cycle runs at a time. The pause flag and the shutdown
//! token are both checked once per loop iteration, so either takes effect
//! at the next check point and a cycle in progress always runs to
//! completion.

use crate::error::{ConnectError, ExtractError, LoadError};
use crate::ledger::{ResultLedger, SyncOutcome};
use crate::record::SaleRecord;
use crate::state::ActivityGate;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Source-store connection held for a single cycle.
#[async_trait]
pub trait SaleSource: Send {
    /// Fetch every sale with `fecha` after `window_start`, fully
    /// materialized, in source order. An empty result is not an error.
    async fn extract_since(
        &mut self,
        window_start: NaiveDateTime,
    ) -> Result<Vec<SaleRecord>, ExtractError>;

    /// Release the underlying connection.
    async fn close(self: Box<Self>);
}

/// Destination-store connection held for a single cycle.
#[async_trait]
pub trait SaleSink: Send {
    /// Insert one sale and commit it, independently of any other row.
    async fn load(&mut self, record: &SaleRecord) -> Result<(), LoadError>;

    /// Release the underlying connection.
    async fn close(self: Box<Self>);
}

/// Opens a source connection for one cycle. No internal retry: a failed
/// open surfaces as a typed error and the scheduler retries at the next
/// interval.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SaleSource>, ConnectError>;
}

/// Opens a destination connection for one cycle.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn SaleSink>, ConnectError>;
}

/// Run one full extract-and-load pass.
///
/// Never returns an error and never panics: connection or extraction
/// failures abort the cycle as a logged no-op with whatever was opened
/// closed again, and per-row load failures are recorded in the ledger
/// while the remaining rows continue.
pub async fn run_cycle(
    source_connector: &dyn SourceConnector,
    sink_connector: &dyn SinkConnector,
    ledger: &ResultLedger,
    window: chrono::Duration,
) {
    let mut source = match source_connector.connect().await {
        Ok(source) => source,
        Err(e) => {
            warn!("Could not establish the source connection, skipping this cycle: {e}");
            return;
        }
    };

    let sink = match sink_connector.connect().await {
        Ok(sink) => sink,
        Err(e) => {
            warn!("Could not establish the destination connection, skipping this cycle: {e}");
            source.close().await;
            return;
        }
    };

    let window_start = chrono::Utc::now().naive_utc() - window;
    debug!("Extracting sales with fecha > {window_start}");

    let records = match source.extract_since(window_start).await {
        Ok(records) => records,
        Err(e) => {
            error!("Extraction from the source failed: {e}");
            source.close().await;
            sink.close().await;
            return;
        }
    };

    if records.is_empty() {
        info!("No new sales found in the trailing window");
    } else {
        info!("Found {} sales to replicate", records.len());
    }

    let loaded = load_all(sink, &records, ledger).await;

    source.close().await;

    info!(
        "Cycle complete: {loaded} replicated, {} failed",
        records.len() - loaded
    );
}

/// Load every record in extraction order, appending one outcome each.
/// Returns the number of successful loads after closing the sink.
async fn load_all(
    mut sink: Box<dyn SaleSink>,
    records: &[SaleRecord],
    ledger: &ResultLedger,
) -> usize {
    let mut loaded = 0;
    for record in records {
        debug!("Inserting sale nrocentral={}", record.nrocentral);
        match sink.load(record).await {
            Ok(()) => {
                ledger.append(SyncOutcome::success(record.nrocentral));
                loaded += 1;
            }
            Err(e) => {
                warn!("Insert failed for nrocentral={}: {e}", record.nrocentral);
                ledger.append(SyncOutcome::error(record.nrocentral, e.to_string()));
            }
        }
    }

    sink.close().await;
    loaded
}

/// Cadence and window settings for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerOpts {
    /// Delay between cycles while the gate is active.
    pub sync_interval: Duration,
    /// Delay before re-checking the gate while paused.
    pub pause_interval: Duration,
    /// Trailing extraction window handed to each cycle.
    pub window: chrono::Duration,
}

impl Default for SchedulerOpts {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(60),
            pause_interval: Duration::from_secs(60),
            window: chrono::Duration::hours(24),
        }
    }
}

/// Interval loop driving sync cycles for the life of the process.
pub struct Scheduler {
    source: Arc<dyn SourceConnector>,
    sink: Arc<dyn SinkConnector>,
    ledger: Arc<ResultLedger>,
    gate: Arc<ActivityGate>,
    opts: SchedulerOpts,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn SourceConnector>,
        sink: Arc<dyn SinkConnector>,
        ledger: Arc<ResultLedger>,
        gate: Arc<ActivityGate>,
        opts: SchedulerOpts,
    ) -> Self {
        Self {
            source,
            sink,
            ledger,
            gate,
            opts,
        }
    }

    /// Run until `cancel` fires. While paused, no connection is ever
    /// opened; while active, the next cycle cannot start before the
    /// previous one has returned.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            "Replication scheduler started (interval {:?}, window {}h)",
            self.opts.sync_interval,
            self.opts.window.num_hours()
        );

        loop {
            if cancel.is_cancelled() {
                info!("Shutdown requested, stopping the replication scheduler");
                return;
            }

            if !self.gate.is_active() {
                info!("Replication paused, waiting before re-checking");
                wait(self.opts.pause_interval, &cancel).await;
                continue;
            }

            run_cycle(
                self.source.as_ref(),
                self.sink.as_ref(),
                &self.ledger,
                self.opts.window,
            )
            .await;

            wait(self.opts.sync_interval, &cancel).await;
        }
    }
}

/// Sleep for `interval`, returning early if `cancel` fires first. The
/// cancellation itself is acted on at the top of the loop.
async fn wait(interval: Duration, cancel: &CancellationToken) {
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(interval) => {}
    }
}
