//! In-memory stores for exercising the replication loop without live
//! databases.
//!
//! The fakes count connection opens, extractions, loads, and closes so
//! tests can assert on the lifecycle the cycle controller and scheduler
//! drive, not just on ledger contents.

use crate::error::{ConnectError, ExtractError, LoadError};
use crate::record::SaleRecord;
use crate::sync::{SaleSink, SaleSource, SinkConnector, SourceConnector};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Build a sale with the given central ticket number and plausible
/// defaults for everything else.
pub fn sample_sale(nrocentral: i64) -> SaleRecord {
    SaleRecord {
        nrocentral,
        nroticket: format!("T-{nrocentral:06}"),
        fecha: chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap(),
        idempresa: 7,
        ruc: "20100047218".to_string(),
        razon_social: "Transportes Alianza S.A.".to_string(),
        eess: "EESS-01".to_string(),
        terminal_cac: "CAC-3".to_string(),
        nrotarjeta: Some("5412-7534".to_string()),
        identif_disp: Some("DISP-11".to_string()),
        total_sin_impuestos: Decimal::new(8475, 2),
        ventas: Decimal::new(10000, 2),
        total_con_impuestos: Decimal::new(10000, 2),
        docchofer: Some("41225876".to_string()),
        cantidad: Decimal::new(655, 2),
        codproducto: "G90".to_string(),
        producto: "GASOHOL 90".to_string(),
        precios: Decimal::new(1526, 2),
    }
}

/// Scripted source yielding a fixed set of sales on every cycle.
pub struct FakeSourceConnector {
    records: Arc<Mutex<Vec<SaleRecord>>>,
    fail_connect: bool,
    fail_extract: bool,
    /// Connection attempts, including ones scripted to fail.
    pub connects: Arc<AtomicUsize>,
    pub extracts: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl FakeSourceConnector {
    pub fn with_records(records: Vec<SaleRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            fail_connect: false,
            fail_extract: false,
            connects: Arc::new(AtomicUsize::new(0)),
            extracts: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Source whose connection open always fails.
    pub fn failing() -> Self {
        let mut source = Self::with_records(Vec::new());
        source.fail_connect = true;
        source
    }

    /// Source that connects but fails every extraction query.
    pub fn extract_failing() -> Self {
        let mut source = Self::with_records(Vec::new());
        source.fail_extract = true;
        source
    }
}

#[async_trait]
impl SourceConnector for FakeSourceConnector {
    async fn connect(&self) -> Result<Box<dyn SaleSource>, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(ConnectError::Unavailable(
                "source store unreachable".to_string(),
            ));
        }
        Ok(Box::new(FakeSource {
            records: self.records.lock().clone(),
            fail_extract: self.fail_extract,
            extracts: Arc::clone(&self.extracts),
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct FakeSource {
    records: Vec<SaleRecord>,
    fail_extract: bool,
    extracts: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl SaleSource for FakeSource {
    async fn extract_since(
        &mut self,
        _window_start: NaiveDateTime,
    ) -> Result<Vec<SaleRecord>, ExtractError> {
        self.extracts.fetch_add(1, Ordering::SeqCst);
        if self.fail_extract {
            return Err(ExtractError::Row("scripted extraction failure".to_string()));
        }
        Ok(self.records.clone())
    }

    async fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scripted sink that rejects configured keys and records every insert.
pub struct FakeSinkConnector {
    reject: Vec<i64>,
    delay: Option<Duration>,
    fail_connect: bool,
    /// Keys of successfully inserted sales, in insert order.
    pub inserted: Arc<Mutex<Vec<i64>>>,
    /// Connection attempts, including ones scripted to fail.
    pub connects: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
    /// Highest number of concurrently executing loads ever observed.
    /// Stays at one as long as cycles never overlap.
    pub max_in_flight: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
}

impl FakeSinkConnector {
    pub fn new() -> Self {
        Self {
            reject: Vec::new(),
            delay: None,
            fail_connect: false,
            inserted: Arc::new(Mutex::new(Vec::new())),
            connects: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reject inserts for the given central ticket numbers, as a
    /// uniqueness violation would.
    pub fn with_rejects(mut self, reject: Vec<i64>) -> Self {
        self.reject = reject;
        self
    }

    /// Make every insert take at least `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sink whose connection open always fails.
    pub fn failing() -> Self {
        let mut sink = Self::new();
        sink.fail_connect = true;
        sink
    }
}

impl Default for FakeSinkConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SinkConnector for FakeSinkConnector {
    async fn connect(&self) -> Result<Box<dyn SaleSink>, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect {
            return Err(ConnectError::Unavailable(
                "destination store unreachable".to_string(),
            ));
        }
        Ok(Box::new(FakeSink {
            reject: self.reject.clone(),
            delay: self.delay,
            inserted: Arc::clone(&self.inserted),
            closes: Arc::clone(&self.closes),
            max_in_flight: Arc::clone(&self.max_in_flight),
            in_flight: Arc::clone(&self.in_flight),
        }))
    }
}

struct FakeSink {
    reject: Vec<i64>,
    delay: Option<Duration>,
    inserted: Arc<Mutex<Vec<i64>>>,
    closes: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl SaleSink for FakeSink {
    async fn load(&mut self, record: &SaleRecord) -> Result<(), LoadError> {
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.reject.contains(&record.nrocentral) {
            Err(LoadError::Rejected(format!(
                "duplicate key value violates unique constraint \"ventas_eess_pkey\" \
                 (nrocentral)=({})",
                record.nrocentral
            )))
        } else {
            self.inserted.lock().push(record.nrocentral);
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
