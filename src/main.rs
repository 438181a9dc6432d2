//! Service binary for ventas-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # Run against local stores with the default 60s cadence
//! ventas-sync \
//!   --mysql-host mysql.internal --mysql-user repl --mysql-db alianza \
//!   --postgres-host pg.internal --postgres-port 5432 --postgres-db eess
//!
//! # Faster cadence and a bounded outcome ledger
//! ventas-sync --sync-interval 30s --ledger-capacity 10000
//!
//! # All options also read from the environment
//! MYSQL_HOST=mysql.internal POSTGRESQL_HOST=pg.internal ventas-sync
//! ```
//!
//! The process runs two tasks: the replication scheduler and the HTTP
//! interface on `--bind-addr` (default `0.0.0.0:5000`). Ctrl-C stops
//! both; a sync cycle in progress finishes first.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use ventas_sync::config::{MysqlOpts, PostgresOpts, ServerOpts, SyncOpts};
use ventas_sync::ledger::ResultLedger;
use ventas_sync::mysql::MysqlConnector;
use ventas_sync::postgresql::PgConnector;
use ventas_sync::server::{self, AppState};
use ventas_sync::state::ActivityGate;
use ventas_sync::sync::{Scheduler, SchedulerOpts};

#[derive(Parser)]
#[command(name = "ventas-sync")]
#[command(about = "Replicates new EESS sales tickets from MySQL to PostgreSQL")]
struct Cli {
    /// MySQL source store options
    #[command(flatten)]
    mysql: MysqlOpts,

    /// PostgreSQL destination store options
    #[command(flatten)]
    postgres: PostgresOpts,

    /// Replication cadence options
    #[command(flatten)]
    sync: SyncOpts,

    /// HTTP interface options
    #[command(flatten)]
    server: ServerOpts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let opts = SchedulerOpts {
        sync_interval: cli.sync.sync_interval().context("invalid --sync-interval")?,
        pause_interval: cli
            .sync
            .pause_interval()
            .context("invalid --pause-interval")?,
        window: cli.sync.window().context("invalid --window")?,
    };

    let gate = Arc::new(ActivityGate::new());
    let ledger = Arc::new(match cli.sync.ledger_capacity {
        Some(capacity) => ResultLedger::with_capacity(capacity),
        None => ResultLedger::unbounded(),
    });

    let scheduler = Scheduler::new(
        Arc::new(MysqlConnector::new(cli.mysql)),
        Arc::new(PgConnector::new(cli.postgres)),
        Arc::clone(&ledger),
        Arc::clone(&gate),
        opts,
    );

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                cancel.cancel();
            }
        });
    }

    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    let state = AppState { gate, ledger };
    let served = server::serve(&cli.server.bind_addr, state, cancel.clone()).await;

    // Whether the server drained normally or failed to bind, stop the
    // scheduler and let an in-flight cycle finish before exiting.
    cancel.cancel();
    scheduler_task
        .await
        .context("replication scheduler task panicked")?;

    served
}
