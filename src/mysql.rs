//! MySQL source: connection provider and the trailing-window extractor.

use crate::config::MysqlOpts;
use crate::error::{ConnectError, ExtractError};
use crate::record::SaleRecord;
use crate::sync::{SaleSource, SourceConnector};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use mysql_async::prelude::*;
use mysql_async::{Conn, Pool, Row, Value};
use rust_decimal::Decimal;
use tracing::{error, warn};

/// Columns selected from the source table, in `SaleRecord` field order.
const EXTRACT_SQL: &str = "SELECT nrocentral, nroticket, fecha, idempresa, ruc, razonSocial, EESS, terminal_cac, \
     nrotarjeta, identif_disp, total_sin_impuestos, ventas, total_con_impuestos, \
     docchofer, cantidad, codproducto, producto, PRECIOS \
     FROM VENTAS_ALIANZA \
     WHERE fecha > ?";

/// Opens one MySQL connection per cycle from the configured source store.
pub struct MysqlConnector {
    opts: MysqlOpts,
}

impl MysqlConnector {
    pub fn new(opts: MysqlOpts) -> Self {
        Self { opts }
    }
}

#[async_trait]
impl SourceConnector for MysqlConnector {
    async fn connect(&self) -> Result<Box<dyn SaleSource>, ConnectError> {
        let pool = Pool::new(
            mysql_async::OptsBuilder::default()
                .ip_or_hostname(self.opts.mysql_host.clone())
                .user(Some(self.opts.mysql_user.clone()))
                .pass(Some(self.opts.mysql_password.clone()))
                .db_name(Some(self.opts.mysql_db.clone())),
        );

        let conn = match pool.get_conn().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Error connecting to MySQL: {e}");
                if let Err(e) = pool.disconnect().await {
                    warn!("Error discarding the MySQL pool: {e}");
                }
                return Err(ConnectError::Mysql(e));
            }
        };

        Ok(Box::new(MysqlSaleSource {
            pool,
            conn: Some(conn),
        }))
    }
}

/// Live source connection extracting sales for one cycle.
struct MysqlSaleSource {
    pool: Pool,
    conn: Option<Conn>,
}

#[async_trait]
impl SaleSource for MysqlSaleSource {
    async fn extract_since(
        &mut self,
        window_start: NaiveDateTime,
    ) -> Result<Vec<SaleRecord>, ExtractError> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| ExtractError::Row("source connection already closed".to_string()))?;

        let fecha = window_start.format("%Y-%m-%d %H:%M:%S").to_string();
        let rows: Vec<Row> = conn.exec(EXTRACT_SQL, (fecha,)).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(sale_from_row(&row)?);
        }
        Ok(records)
    }

    async fn close(mut self: Box<Self>) {
        drop(self.conn.take());
        if let Err(e) = self.pool.disconnect().await {
            warn!("Error closing the MySQL connection: {e}");
        }
    }
}

/// Convert one extracted row into a [`SaleRecord`].
///
/// Conversion is positional against [`EXTRACT_SQL`] and handles both the
/// binary- and text-protocol representations MySQL uses for datetimes and
/// decimals.
fn sale_from_row(row: &Row) -> Result<SaleRecord, ExtractError> {
    Ok(SaleRecord {
        nrocentral: int_field(row, 0, "nrocentral")?,
        nroticket: text_field(row, 1, "nroticket")?,
        fecha: datetime_field(row, 2, "fecha")?,
        idempresa: int_field(row, 3, "idempresa")?,
        ruc: text_field(row, 4, "ruc")?,
        razon_social: text_field(row, 5, "razonSocial")?,
        eess: text_field(row, 6, "EESS")?,
        terminal_cac: text_field(row, 7, "terminal_cac")?,
        nrotarjeta: opt_text_field(row, 8, "nrotarjeta")?,
        identif_disp: opt_text_field(row, 9, "identif_disp")?,
        total_sin_impuestos: decimal_field(row, 10, "total_sin_impuestos")?,
        ventas: decimal_field(row, 11, "ventas")?,
        total_con_impuestos: decimal_field(row, 12, "total_con_impuestos")?,
        docchofer: opt_text_field(row, 13, "docchofer")?,
        cantidad: decimal_field(row, 14, "cantidad")?,
        codproducto: text_field(row, 15, "codproducto")?,
        producto: text_field(row, 16, "producto")?,
        precios: decimal_field(row, 17, "PRECIOS")?,
    })
}

fn raw<'a>(row: &'a Row, index: usize, name: &str) -> Result<&'a Value, ExtractError> {
    row.as_ref(index)
        .ok_or_else(|| ExtractError::Row(format!("missing column {name} at index {index}")))
}

fn int_field(row: &Row, index: usize, name: &str) -> Result<i64, ExtractError> {
    int_value(raw(row, index, name)?, name)
}

fn text_field(row: &Row, index: usize, name: &str) -> Result<String, ExtractError> {
    text_value(raw(row, index, name)?, name)
}

fn opt_text_field(row: &Row, index: usize, name: &str) -> Result<Option<String>, ExtractError> {
    let value = raw(row, index, name)?;
    match value {
        Value::NULL => Ok(None),
        _ => text_value(value, name).map(Some),
    }
}

fn decimal_field(row: &Row, index: usize, name: &str) -> Result<Decimal, ExtractError> {
    decimal_value(raw(row, index, name)?, name)
}

fn datetime_field(row: &Row, index: usize, name: &str) -> Result<NaiveDateTime, ExtractError> {
    datetime_value(raw(row, index, name)?, name)
}

fn int_value(value: &Value, name: &str) -> Result<i64, ExtractError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::UInt(u) => {
            i64::try_from(*u).map_err(|_| ExtractError::Row(format!("{name} out of i64 range")))
        }
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes)
            .parse::<i64>()
            .map_err(|e| ExtractError::Row(format!("{name} is not an integer: {e}"))),
        other => Err(unexpected(name, other)),
    }
}

fn text_value(value: &Value, name: &str) -> Result<String, ExtractError> {
    match value {
        Value::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        other => Err(unexpected(name, other)),
    }
}

fn decimal_value(value: &Value, name: &str) -> Result<Decimal, ExtractError> {
    match value {
        // DECIMAL columns arrive as ASCII bytes
        Value::Bytes(bytes) => Decimal::from_str_exact(String::from_utf8_lossy(bytes).trim())
            .map_err(|e| ExtractError::Row(format!("{name} is not a decimal: {e}"))),
        Value::Int(i) => Ok(Decimal::from(*i)),
        Value::UInt(u) => Ok(Decimal::from(*u)),
        Value::Double(d) => Decimal::from_f64_retain(*d)
            .ok_or_else(|| ExtractError::Row(format!("{name} is not representable: {d}"))),
        Value::Float(f) => Decimal::from_f64_retain(f64::from(*f))
            .ok_or_else(|| ExtractError::Row(format!("{name} is not representable: {f}"))),
        other => Err(unexpected(name, other)),
    }
}

fn datetime_value(value: &Value, name: &str) -> Result<NaiveDateTime, ExtractError> {
    match value {
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let date = NaiveDate::from_ymd_opt(i32::from(*year), u32::from(*month), u32::from(*day))
                .ok_or_else(|| ExtractError::Row(format!("{name} has an invalid date")))?;
            date.and_hms_micro_opt(
                u32::from(*hour),
                u32::from(*minute),
                u32::from(*second),
                *micros,
            )
            .ok_or_else(|| ExtractError::Row(format!("{name} has an invalid time")))
        }
        Value::Bytes(bytes) => {
            let s = String::from_utf8_lossy(bytes);
            NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f"))
                .map_err(|e| ExtractError::Row(format!("{name} is not a datetime: {e}")))
        }
        other => Err(unexpected(name, other)),
    }
}

fn unexpected(name: &str, value: &Value) -> ExtractError {
    ExtractError::Row(format!("{name} has unexpected type: {value:?}"))
}
