//! PostgreSQL destination: connection provider and the per-row loader.

use crate::config::PostgresOpts;
use crate::error::{ConnectError, LoadError};
use crate::record::SaleRecord;
use crate::sync::{SaleSink, SinkConnector};
use async_trait::async_trait;
use tokio_postgres::{Client, NoTls};
use tracing::{error, warn};

/// Column list mirrors the source extraction order.
const INSERT_SQL: &str = "INSERT INTO ventas_eess (\
     nrocentral, nroticket, fecha, idempresa, ruc, razonSocial, EESS, terminal_cac, \
     nrotarjeta, identif_disp, total_sin_impuestos, ventas, total_con_impuestos, \
     docchofer, cantidad, codproducto, producto, PRECIOS\
     ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)";

/// Opens one PostgreSQL connection per cycle to the configured
/// destination store.
pub struct PgConnector {
    opts: PostgresOpts,
}

impl PgConnector {
    pub fn new(opts: PostgresOpts) -> Self {
        Self { opts }
    }
}

#[async_trait]
impl SinkConnector for PgConnector {
    async fn connect(&self) -> Result<Box<dyn SaleSink>, ConnectError> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.opts.postgres_host)
            .port(self.opts.postgres_port)
            .user(&self.opts.postgres_user)
            .password(&self.opts.postgres_password)
            .dbname(&self.opts.postgres_db);

        let (client, connection) = match config.connect(NoTls).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("Error connecting to PostgreSQL: {e}");
                return Err(ConnectError::Postgres(e));
            }
        };

        // The connection future must be polled for the client to make
        // progress; it finishes once the client is dropped.
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("PostgreSQL connection error: {e}");
            }
        });

        Ok(Box::new(PgSaleSink { client, driver }))
    }
}

/// Live destination connection loading sales for one cycle.
struct PgSaleSink {
    client: Client,
    driver: tokio::task::JoinHandle<()>,
}

#[async_trait]
impl SaleSink for PgSaleSink {
    async fn load(&mut self, record: &SaleRecord) -> Result<(), LoadError> {
        // One transaction and one commit per row: a rejected sale never
        // rolls back or blocks its siblings.
        let tx = self.client.transaction().await?;
        tx.execute(
            INSERT_SQL,
            &[
                &record.nrocentral,
                &record.nroticket,
                &record.fecha,
                &record.idempresa,
                &record.ruc,
                &record.razon_social,
                &record.eess,
                &record.terminal_cac,
                &record.nrotarjeta,
                &record.identif_disp,
                &record.total_sin_impuestos,
                &record.ventas,
                &record.total_con_impuestos,
                &record.docchofer,
                &record.cantidad,
                &record.codproducto,
                &record.producto,
                &record.precios,
            ],
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn close(self: Box<Self>) {
        drop(self.client);
        let _ = self.driver.await;
    }
}
