//! Teacher model
//!
//! 1:1 with a `profesor`-role user; carries the payroll percentages applied
//! to the two revenue buckets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Uuid,
    pub user_id: Uuid,
    pub especialidad: Option<String>,
    /// Share (0-100) of escuelita-derived subscription revenue
    pub porcentaje_escuelita: Decimal,
    /// Share (0-100) of pension-derived subscription revenue
    pub porcentaje_pension: Decimal,
    pub activo: bool,
}

impl Teacher {
    pub fn validate(&self) -> Result<(), String> {
        let hundred = Decimal::from(100);
        if self.porcentaje_escuelita < Decimal::ZERO || self.porcentaje_escuelita > hundred {
            return Err("Escuelita percentage must be between 0 and 100".to_string());
        }
        if self.porcentaje_pension < Decimal::ZERO || self.porcentaje_pension > hundred {
            return Err("Pension percentage must be between 0 and 100".to_string());
        }
        Ok(())
    }
}
