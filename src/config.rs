//! Runtime configuration for the replication service.
//!
//! All option groups are clap derive structs with environment fallbacks,
//! flattened into the binary's CLI.

use anyhow::Context;
use clap::Parser;
use std::time::Duration;

/// MySQL source store options
#[derive(Parser, Clone, Debug)]
pub struct MysqlOpts {
    /// MySQL host
    #[arg(long, default_value = "localhost", env = "MYSQL_HOST")]
    pub mysql_host: String,

    /// MySQL user
    #[arg(long, default_value = "root", env = "MYSQL_USER")]
    pub mysql_user: String,

    /// MySQL password
    #[arg(long, default_value = "", env = "MYSQL_PASSWORD")]
    pub mysql_password: String,

    /// MySQL database holding the source sales table
    #[arg(long, default_value = "alianza", env = "MYSQL_DB")]
    pub mysql_db: String,
}

/// PostgreSQL destination store options
#[derive(Parser, Clone, Debug)]
pub struct PostgresOpts {
    /// PostgreSQL host
    #[arg(long, default_value = "localhost", env = "POSTGRESQL_HOST")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[arg(long, default_value = "5432", env = "POSTGRESQL_PORT")]
    pub postgres_port: u16,

    /// PostgreSQL user
    #[arg(long, default_value = "postgres", env = "POSTGRESQL_USER")]
    pub postgres_user: String,

    /// PostgreSQL password
    #[arg(long, default_value = "", env = "POSTGRESQL_PASSWORD")]
    pub postgres_password: String,

    /// PostgreSQL database holding the destination sales table
    #[arg(long, default_value = "eess", env = "POSTGRESQL_DB")]
    pub postgres_db: String,
}

/// Replication cadence and retention options
#[derive(Parser, Clone, Debug)]
pub struct SyncOpts {
    /// Interval between sync cycles while active.
    /// Format: seconds or with units like "60s", "5m", "1h"
    #[arg(long, default_value = "60s", env = "SYNC_INTERVAL")]
    pub sync_interval: String,

    /// Re-check interval while replication is paused
    #[arg(long, default_value = "60s", env = "PAUSE_INTERVAL")]
    pub pause_interval: String,

    /// Trailing window used to select new sales each cycle
    #[arg(long, default_value = "24h", env = "SYNC_WINDOW")]
    pub window: String,

    /// Maximum number of retained outcome entries (unbounded when unset)
    #[arg(long, env = "LEDGER_CAPACITY")]
    pub ledger_capacity: Option<usize>,
}

impl SyncOpts {
    pub fn sync_interval(&self) -> anyhow::Result<Duration> {
        parse_duration(&self.sync_interval)
    }

    pub fn pause_interval(&self) -> anyhow::Result<Duration> {
        parse_duration(&self.pause_interval)
    }

    pub fn window(&self) -> anyhow::Result<chrono::Duration> {
        Ok(chrono::Duration::seconds(parse_duration_to_secs(
            &self.window,
        )?))
    }
}

/// HTTP interface options
#[derive(Parser, Clone, Debug)]
pub struct ServerOpts {
    /// Address for the status/toggle HTTP interface
    #[arg(long, default_value = "0.0.0.0:5000", env = "BIND_ADDR")]
    pub bind_addr: String,
}

/// Parse a duration string like "1h", "30m", "300s", "300" into seconds.
/// Supports:
/// - Plain numbers (interpreted as seconds): "300"
/// - Seconds suffix: "300s"
/// - Minutes suffix: "30m"
/// - Hours suffix: "1h"
pub fn parse_duration_to_secs(s: &str) -> anyhow::Result<i64> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    if let Some(num_str) = s.strip_suffix('h') {
        let hours: i64 = num_str
            .parse()
            .with_context(|| format!("Invalid hours value: {num_str}"))?;
        return Ok(hours * 3600);
    }
    if let Some(num_str) = s.strip_suffix('m') {
        let minutes: i64 = num_str
            .parse()
            .with_context(|| format!("Invalid minutes value: {num_str}"))?;
        return Ok(minutes * 60);
    }
    if let Some(num_str) = s.strip_suffix('s') {
        let secs: i64 = num_str
            .parse()
            .with_context(|| format!("Invalid seconds value: {num_str}"))?;
        return Ok(secs);
    }

    // No suffix - treat as seconds
    s.parse::<i64>()
        .with_context(|| format!("Invalid duration value: {s}"))
}

fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let secs = parse_duration_to_secs(s)?;
    let secs = u64::try_from(secs).with_context(|| format!("Duration must not be negative: {s}"))?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds_and_suffixes() {
        assert_eq!(parse_duration_to_secs("300").unwrap(), 300);
        assert_eq!(parse_duration_to_secs("60s").unwrap(), 60);
        assert_eq!(parse_duration_to_secs("5m").unwrap(), 300);
        assert_eq!(parse_duration_to_secs("24h").unwrap(), 86400);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration_to_secs("").is_err());
        assert!(parse_duration_to_secs("soon").is_err());
        assert!(parse_duration_to_secs("1d").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn default_cadence_matches_observed_constants() {
        let opts = SyncOpts {
            sync_interval: "60s".to_string(),
            pause_interval: "60s".to_string(),
            window: "24h".to_string(),
            ledger_capacity: None,
        };

        assert_eq!(opts.sync_interval().unwrap(), Duration::from_secs(60));
        assert_eq!(opts.pause_interval().unwrap(), Duration::from_secs(60));
        assert_eq!(opts.window().unwrap(), chrono::Duration::hours(24));
    }
}
