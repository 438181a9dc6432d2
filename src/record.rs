//! The sale ticket record moved between the two stores.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// One sales ticket as stored in the source `VENTAS_ALIANZA` table.
///
/// `nrocentral` is the identity key, unique in both stores. Records are
/// immutable once extracted; the sync only transports them. Money and
/// quantity columns are kept as [`Decimal`] end to end so nothing is
/// rounded between extraction and insert.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub nrocentral: i64,
    pub nroticket: String,
    pub fecha: NaiveDateTime,
    pub idempresa: i64,
    pub ruc: String,
    pub razon_social: String,
    pub eess: String,
    pub terminal_cac: String,
    pub nrotarjeta: Option<String>,
    pub identif_disp: Option<String>,
    pub total_sin_impuestos: Decimal,
    pub ventas: Decimal,
    pub total_con_impuestos: Decimal,
    pub docchofer: Option<String>,
    pub cantidad: Decimal,
    pub codproducto: String,
    pub producto: String,
    pub precios: Decimal,
}
