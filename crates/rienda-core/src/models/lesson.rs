//! Lesson model
//!
//! A lesson is one rider+teacher+horse time slot. Lessons are never
//! physically deleted; cancellations and reschedules are state transitions,
//! and a reschedule chains the replacement to the original lesson.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Programada,
    Completada,
    Cancelada,
    Reagendada,
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonStatus::Programada => write!(f, "programada"),
            LessonStatus::Completada => write!(f, "completada"),
            LessonStatus::Cancelada => write!(f, "cancelada"),
            LessonStatus::Reagendada => write!(f, "reagendada"),
        }
    }
}

impl LessonStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "programada" => Some(LessonStatus::Programada),
            "completada" => Some(LessonStatus::Completada),
            "cancelada" => Some(LessonStatus::Cancelada),
            "reagendada" => Some(LessonStatus::Reagendada),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub user_id: Uuid,
    pub profesor_id: Uuid,
    pub caballo_id: Uuid,
    pub fecha: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub hora_fin: NaiveTime,
    pub estado: LessonStatus,
    /// Booked beyond the plan allotment; does not consume a credit
    pub es_extra: bool,
    pub es_reagendada: bool,
    /// Points at the lesson this one replaced
    pub clase_original_id: Option<Uuid>,
    pub notas: Option<String>,
}

/// Insert payload for a new lesson row
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub user_id: Uuid,
    pub profesor_id: Uuid,
    pub caballo_id: Uuid,
    pub fecha: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub hora_fin: NaiveTime,
    pub es_extra: bool,
    pub es_reagendada: bool,
    pub clase_original_id: Option<Uuid>,
    pub notas: Option<String>,
}

/// Half-open interval overlap: [a_start, a_end) intersects [b_start, b_end).
///
/// Back-to-back slots (a_end == b_start) do not overlap.
pub fn intervals_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    !(a_end <= b_start || a_start >= b_end)
}
