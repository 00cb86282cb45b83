//! Horse model
//!
//! School horses are pooled for escuelita lessons; private horses belong to
//! one pension rider or are co-owned by two half-pension riders.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorseType {
    Escuela,
    Privado,
}

impl fmt::Display for HorseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HorseType::Escuela => write!(f, "escuela"),
            HorseType::Privado => write!(f, "privado"),
        }
    }
}

impl HorseType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "escuela" => Some(HorseType::Escuela),
            "privado" => Some(HorseType::Privado),
            _ => None,
        }
    }
}

/// Operational state; only active horses take lessons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorseStatus {
    Activo,
    Descanso,
    Lesionado,
}

impl fmt::Display for HorseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HorseStatus::Activo => write!(f, "activo"),
            HorseStatus::Descanso => write!(f, "descanso"),
            HorseStatus::Lesionado => write!(f, "lesionado"),
        }
    }
}

impl HorseStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "activo" => Some(HorseStatus::Activo),
            "descanso" => Some(HorseStatus::Descanso),
            "lesionado" => Some(HorseStatus::Lesionado),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horse {
    pub id: Uuid,
    pub nombre: String,
    pub tipo: HorseType,
    pub estado: HorseStatus,
    /// Maximum scheduled lessons per calendar day
    pub limite_clases_dia: i32,
    pub activo: bool,
    pub dueno_id: Option<Uuid>,
    pub dueno_id2: Option<Uuid>,
}

impl Horse {
    pub fn is_available(&self) -> bool {
        self.activo && self.estado == HorseStatus::Activo
    }

    /// The other owner of a shared horse, if `user_id` is one of the two
    pub fn co_owner_of(&self, user_id: Uuid) -> Option<Uuid> {
        match (self.dueno_id, self.dueno_id2) {
            (Some(a), Some(b)) if a == user_id => Some(b),
            (Some(a), Some(b)) if b == user_id => Some(a),
            _ => None,
        }
    }

    /// Ownership invariant: private horses need at least one owner, school
    /// horses none.
    pub fn validate(&self) -> Result<(), String> {
        match self.tipo {
            HorseType::Privado if self.dueno_id.is_none() && self.dueno_id2.is_none() => {
                Err("Private horses must have at least one owner".to_string())
            }
            HorseType::Escuela if self.dueno_id.is_some() || self.dueno_id2.is_some() => {
                Err("School horses cannot have owners".to_string())
            }
            _ if self.limite_clases_dia <= 0 => {
                Err("Daily class cap must be greater than zero".to_string())
            }
            _ => Ok(()),
        }
    }
}
