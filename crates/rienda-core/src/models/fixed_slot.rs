//! Fixed weekly schedule slot
//!
//! A rider's recurring weekly commitment: weekday + start time + assigned
//! teacher, optionally pinned to a horse. Superseded slots are deactivated,
//! never deleted, when the rider's subscription changes.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedScheduleSlot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profesor_id: Uuid,
    /// None means "any active school horse" at generation time
    pub caballo_id: Option<Uuid>,
    /// 0=Sunday .. 6=Saturday
    pub dia_semana: u8,
    pub hora: NaiveTime,
    pub activo: bool,
}

impl FixedScheduleSlot {
    /// Lessons generated from a slot run one hour
    pub fn hora_fin(&self) -> NaiveTime {
        self.hora + Duration::hours(1)
    }
}
