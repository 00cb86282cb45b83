//! Recurring schedule generator
//!
//! Expands an escuelita rider's fixed weekly slots into concrete lessons
//! for one target month. Slot-count mismatches against the plan's weekly
//! allotment are a hard failure with nothing created; a per-date teacher or
//! horse conflict only skips that date and is recorded in the report.
//!
//! Generation deliberately does not touch usage counters: a generated
//! lesson counts as used only once its date has passed, which the daily
//! reconciler accounts for. Incrementing here would double-count against
//! the billing cycle.

use chrono::NaiveDate;
use rienda_core::{
    dates::weekday_dates_in_month,
    models::{FixedScheduleSlot, NewLesson},
    traits::{
        FixedSlotRepository, HorseRepository, LessonRepository, SubscriptionRepository,
        UserRepository,
    },
    AppError, AppResult, Outcome, RejectionReason,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::constants::WEEKS_PER_MONTH;

/// Outcome of one generation run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub classes_created: u32,
    pub skipped: Vec<String>,
}

impl GenerationReport {
    /// At least one lesson created, or nothing was attempted
    pub fn success(&self) -> bool {
        self.classes_created > 0 || self.skipped.is_empty()
    }
}

pub struct RecurringScheduleGenerator {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    slots: Arc<dyn FixedSlotRepository>,
    horses: Arc<dyn HorseRepository>,
    lessons: Arc<dyn LessonRepository>,
}

impl RecurringScheduleGenerator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        slots: Arc<dyn FixedSlotRepository>,
        horses: Arc<dyn HorseRepository>,
        lessons: Arc<dyn LessonRepository>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            slots,
            horses,
            lessons,
        }
    }

    /// Generate the month's lessons for one escuelita rider.
    #[instrument(skip(self))]
    pub async fn generate_month(
        &self,
        user_id: Uuid,
        anio: i32,
        mes: u32,
    ) -> AppResult<Outcome<GenerationReport>> {
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(Outcome::rejected(
                RejectionReason::UserNotFound,
                "Usuario no encontrado",
            ));
        };
        if !user.activo {
            return Ok(Outcome::rejected(
                RejectionReason::UserBlocked,
                "Usuario bloqueado. Contacta al administrador.",
            ));
        }

        let slots = self.slots.list_active_for_user(user_id).await?;
        if slots.is_empty() {
            return Ok(Outcome::rejected(
                RejectionReason::NoFixedSchedule,
                "El alumno no tiene horarios fijos activos.",
            ));
        }

        let Some(subscription) = self.subscriptions.find_active_by_user(user_id).await? else {
            return Ok(Outcome::rejected(
                RejectionReason::NoActivePlan,
                "El alumno no tiene una suscripción activa.",
            ));
        };

        // The weekly slot count must match the plan's allotment spread over
        // four weeks; a mismatch generates nothing.
        let expected_slots = (subscription.clases_incluidas / WEEKS_PER_MONTH) as usize;
        if slots.len() != expected_slots {
            return Ok(Outcome::rejected(
                RejectionReason::SlotCountMismatch,
                format!(
                    "El plan incluye {} clases por semana pero hay {} horarios fijos activos.",
                    expected_slots,
                    slots.len()
                ),
            ));
        }

        // Slots without a pinned horse draw from the school pool
        let school_horse = if slots.iter().any(|s| s.caballo_id.is_none()) {
            match self.horses.first_active_school_horse().await? {
                Some(horse) => Some(horse.id),
                None => {
                    return Ok(Outcome::rejected(
                        RejectionReason::NoSchoolHorse,
                        "No hay caballos de escuela activos disponibles.",
                    ));
                }
            }
        } else {
            None
        };

        let mut occurrences = self.enumerate_occurrences(&slots, anio, mes);
        occurrences.sort_by_key(|(date, slot_idx)| (*date, slots[*slot_idx].hora));
        occurrences.truncate(subscription.clases_incluidas.max(0) as usize);

        let mut report = GenerationReport {
            classes_created: 0,
            skipped: Vec::new(),
        };

        for (fecha, slot_idx) in occurrences {
            let slot = &slots[slot_idx];
            let caballo_id = slot
                .caballo_id
                .or(school_horse)
                .expect("school horse resolved above");

            if self
                .lessons
                .teacher_has_overlap(slot.profesor_id, fecha, slot.hora, slot.hora_fin())
                .await?
            {
                report
                    .skipped
                    .push(format!("{} {}: profesor ocupado", fecha, slot.hora));
                continue;
            }

            if self
                .lessons
                .horse_has_overlap(caballo_id, fecha, slot.hora, slot.hora_fin())
                .await?
            {
                report
                    .skipped
                    .push(format!("{} {}: caballo ocupado", fecha, slot.hora));
                continue;
            }

            let result = self
                .lessons
                .create(&NewLesson {
                    user_id,
                    profesor_id: slot.profesor_id,
                    caballo_id,
                    fecha,
                    hora_inicio: slot.hora,
                    hora_fin: slot.hora_fin(),
                    es_extra: false,
                    es_reagendada: false,
                    clase_original_id: None,
                    notas: None,
                })
                .await;

            match result {
                Ok(lesson) => {
                    debug!("Generated lesson {} on {}", lesson.id, fecha);
                    report.classes_created += 1;
                }
                // A lost insert race is one skipped date, not a failed run
                Err(AppError::Database(e)) => {
                    warn!("Skipping {} {}: {}", fecha, slot.hora, e);
                    report.skipped.push(format!("{} {}: {}", fecha, slot.hora, e));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Generated {} lessons for user {} in {}/{} ({} skipped)",
            report.classes_created,
            user_id,
            mes,
            anio,
            report.skipped.len()
        );
        Ok(Outcome::Confirmed(report))
    }

    /// Every (date, slot) occurrence of the slots in the month
    fn enumerate_occurrences(
        &self,
        slots: &[FixedScheduleSlot],
        anio: i32,
        mes: u32,
    ) -> Vec<(NaiveDate, usize)> {
        let mut occurrences = Vec::new();
        for (idx, slot) in slots.iter().enumerate() {
            for date in weekday_dates_in_month(anio, mes, slot.dia_semana) {
                occurrences.push((date, idx));
            }
        }
        occurrences
    }
}
