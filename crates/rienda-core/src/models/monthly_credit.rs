//! Monthly credit ledger record
//!
//! Pension subscriptions are open-ended, so their usage cannot live on the
//! subscription row; this per-(subscription, month, year) counter is the
//! ledger the reservation engine charges against. Rows are created lazily
//! on first access.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyCreditRecord {
    pub id: Uuid,
    pub suscripcion_id: Uuid,
    pub mes: u32,
    pub anio: i32,
    pub clases_usadas: i32,
}

/// Credit balance for one subscription-month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyBalance {
    pub clases_incluidas: i32,
    pub clases_usadas: i32,
    pub clases_disponibles: i32,
}

impl MonthlyBalance {
    pub fn new(incluidas: i32, usadas: i32) -> Self {
        Self {
            clases_incluidas: incluidas,
            clases_usadas: usadas,
            clases_disponibles: incluidas - usadas,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.clases_disponibles <= 0
    }
}
