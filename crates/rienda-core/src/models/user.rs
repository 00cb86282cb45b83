//! User model and role policy
//!
//! The role is a closed enum; every role-conditioned rule in the booking
//! pipeline dispatches through the policy methods below instead of
//! comparing strings at each call site.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::PlanType;

/// User role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Pay-per-month-allotment rider with a month-bounded subscription
    Escuelita,
    /// Full-pension rider, open-ended subscription, owns a horse
    PensionCompleta,
    /// Half-pension rider, open-ended subscription, co-owns a horse
    MediaPension,
    Profesor,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Escuelita => write!(f, "escuelita"),
            UserRole::PensionCompleta => write!(f, "pension_completa"),
            UserRole::MediaPension => write!(f, "media_pension"),
            UserRole::Profesor => write!(f, "profesor"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl UserRole {
    /// Parse from the store's role column
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "escuelita" => Some(UserRole::Escuelita),
            "pension_completa" => Some(UserRole::PensionCompleta),
            "media_pension" => Some(UserRole::MediaPension),
            "profesor" => Some(UserRole::Profesor),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    /// Roles that consume lessons through a subscription
    pub fn is_rider(&self) -> bool {
        matches!(
            self,
            UserRole::Escuelita | UserRole::PensionCompleta | UserRole::MediaPension
        )
    }

    /// Pension tiers track usage in the per-month ledger; escuelita uses the
    /// subscription's global counter.
    pub fn uses_monthly_ledger(&self) -> bool {
        matches!(self, UserRole::PensionCompleta | UserRole::MediaPension)
    }

    /// Pension tiers may not book on past dates. Escuelita is exempt, which
    /// is a long-standing asymmetry of the academy rules, kept as-is.
    pub fn blocks_past_dates(&self) -> bool {
        self.uses_monthly_ledger()
    }

    /// Pension tiers are limited to one scheduled lesson per day
    pub fn single_lesson_per_day(&self) -> bool {
        self.uses_monthly_ledger()
    }

    /// Pension tiers are gated by the monthly payment window
    pub fn payment_gated(&self) -> bool {
        self.uses_monthly_ledger()
    }

    /// Half-pension riders share a horse and must not clash with its co-owner
    pub fn shares_horse(&self) -> bool {
        matches!(self, UserRole::MediaPension)
    }

    /// A rider may only subscribe to the plan type matching their role
    pub fn matches_plan(&self, plan: PlanType) -> bool {
        matches!(
            (self, plan),
            (UserRole::Escuelita, PlanType::Escuelita)
                | (UserRole::PensionCompleta, PlanType::PensionCompleta)
                | (UserRole::MediaPension, PlanType::MediaPension)
        )
    }
}

/// Academy user (rider, teacher, or admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub rol: UserRole,
    /// Soft-disable flag; users referenced by lessons are never deleted
    pub activo: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}
