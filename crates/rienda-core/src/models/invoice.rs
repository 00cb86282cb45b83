//! Invoice and payment-proof models
//!
//! One invoice per (user, month, year). The store carries a few legacy
//! labels for the settled state ("pagado", "aprobado", "confirmado"); the
//! enum folds them all into `Pagada` when parsing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pendiente,
    Pagada,
    Vencida,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Pendiente => write!(f, "pendiente"),
            InvoiceStatus::Pagada => write!(f, "pagada"),
            InvoiceStatus::Vencida => write!(f, "vencida"),
        }
    }
}

impl InvoiceStatus {
    /// Parse from the store, folding legacy settled labels into `Pagada`
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(InvoiceStatus::Pendiente),
            "pagada" | "pagado" | "aprobado" | "confirmado" => Some(InvoiceStatus::Pagada),
            "vencida" => Some(InvoiceStatus::Vencida),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub user_id: Uuid,
    pub suscripcion_id: Uuid,
    pub mes: u32,
    pub anio: i32,
    pub monto: Decimal,
    pub estado: InvoiceStatus,
    pub fecha_vencimiento: NaiveDate,
    pub fecha_pago: Option<NaiveDate>,
    pub pagada: bool,
}

impl Invoice {
    /// Status as the rider sees it: unpaid past the due date reads overdue
    pub fn estado_calculado(&self, today: NaiveDate) -> InvoiceStatus {
        if self.pagada {
            InvoiceStatus::Pagada
        } else if self.fecha_vencimiento < today {
            InvoiceStatus::Vencida
        } else {
            InvoiceStatus::Pendiente
        }
    }
}

/// Insert payload for a new invoice row
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub user_id: Uuid,
    pub suscripcion_id: Uuid,
    pub mes: u32,
    pub anio: i32,
    pub monto: Decimal,
    pub fecha_vencimiento: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    Pendiente,
    Aprobado,
    Rechazado,
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofStatus::Pendiente => write!(f, "pendiente"),
            ProofStatus::Aprobado => write!(f, "aprobado"),
            ProofStatus::Rechazado => write!(f, "rechazado"),
        }
    }
}

impl ProofStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(ProofStatus::Pendiente),
            "aprobado" => Some(ProofStatus::Aprobado),
            "rechazado" => Some(ProofStatus::Rechazado),
            _ => None,
        }
    }
}

/// Uploaded payment evidence tied to one invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProof {
    pub id: Uuid,
    pub factura_id: Uuid,
    pub user_id: Uuid,
    pub monto: Decimal,
    /// Object-storage location of the uploaded file (signing handled upstream)
    pub archivo_url: String,
    pub estado: ProofStatus,
    pub observaciones: Option<String>,
}

/// Insert payload for a new payment proof
#[derive(Debug, Clone)]
pub struct NewPaymentProof {
    pub factura_id: Uuid,
    pub user_id: Uuid,
    pub monto: Decimal,
    pub archivo_url: String,
}
