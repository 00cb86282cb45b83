//! Plan model
//!
//! A plan fixes the monthly class allotment and price for one rider tier.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Rider tier a plan belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Escuelita,
    PensionCompleta,
    MediaPension,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::Escuelita => write!(f, "escuelita"),
            PlanType::PensionCompleta => write!(f, "pension_completa"),
            PlanType::MediaPension => write!(f, "media_pension"),
        }
    }
}

impl PlanType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "escuelita" => Some(PlanType::Escuelita),
            "pension_completa" => Some(PlanType::PensionCompleta),
            "media_pension" => Some(PlanType::MediaPension),
            _ => None,
        }
    }

    /// Full and half pension share the same payroll bucket
    pub fn is_pension(&self) -> bool {
        matches!(self, PlanType::PensionCompleta | PlanType::MediaPension)
    }
}

/// Subscription plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub nombre: String,
    pub tipo: PlanType,
    /// Classes included per month
    pub clases_mes: i32,
    /// Monthly price
    pub precio: Decimal,
    pub activo: bool,
}

impl Plan {
    /// Weekly lesson slots this plan entitles to, assuming four weeks per
    /// month. Used by the recurring-schedule generator's allotment check.
    pub fn clases_por_semana(&self) -> i32 {
        self.clases_mes / 4
    }
}
