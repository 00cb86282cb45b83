//! Subscription model
//!
//! Escuelita subscriptions are bounded to one calendar month and track
//! usage in `clases_usadas`; pension subscriptions are open-ended
//! (`fecha_fin` NULL) and track usage in the monthly credit ledger instead.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub fecha_inicio: NaiveDate,
    /// NULL means indefinite (pension tiers)
    pub fecha_fin: Option<NaiveDate>,
    pub clases_incluidas: i32,
    /// Global usage counter; meaningful for escuelita only
    pub clases_usadas: i32,
    pub activa: bool,
}

impl Subscription {
    pub fn is_indefinite(&self) -> bool {
        self.fecha_fin.is_none()
    }

    /// Whether the subscription covers `today`
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.activa
            && self.fecha_inicio <= today
            && self.fecha_fin.map_or(true, |fin| fin >= today)
    }

    /// Whether the subscription window overlaps the given month at all
    pub fn overlaps_month(&self, month_start: NaiveDate, month_end: NaiveDate) -> bool {
        self.fecha_inicio <= month_end && self.fecha_fin.map_or(true, |fin| fin >= month_start)
    }

    /// Remaining classes on the global counter (escuelita accounting)
    pub fn clases_disponibles(&self) -> i32 {
        self.clases_incluidas - self.clases_usadas
    }
}
