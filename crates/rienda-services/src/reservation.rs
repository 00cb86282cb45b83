//! Reservation engine
//!
//! Validates and commits lesson bookings, reschedules and cancellations.
//! One validation pipeline, executed strictly in order; the first failing
//! check short-circuits into a tagged [`Rejection`]. Order matters: later
//! checks assume earlier ones hold, and the rider-facing message must name
//! the most specific applicable problem.
//!
//! Pipeline (booking and reschedule share it):
//! 1. user exists and is active
//! 2. no past dates for pension tiers (escuelita exempt)
//! 3. active subscription covering today
//! 4. credit availability (skipped for extra bookings)
//! 5. monthly payment gate (pension tiers)
//! 6. teacher free in the slot
//! 7. no overlapping co-owner lesson on a shared horse, then the horse
//!    free in the slot (the co-owner case is the more specific conflict,
//!    so it is tested first)
//! 8. horse operational and under its daily cap
//! 9. one lesson per day for pension tiers
//!
//! The availability checks and the insert are separate round trips, so two
//! concurrent bookings can both pass validation; the partial unique indexes
//! on `clases` are the store-level backstop for that race.

use chrono::{Datelike, NaiveDate, NaiveTime};
use rienda_core::{
    dates::{month_of, next_month},
    models::{Lesson, LessonStatus, NewLesson, Subscription, User},
    traits::{
        HorseRepository, InvoiceRepository, LessonRepository, SubscriptionRepository,
        UserRepository,
    },
    AppError, AppResult, Clock, Outcome, Rejection, RejectionReason,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::constants::{GRACE_PERIOD_DAY, MIN_LEAD_HOURS};
use crate::credit_ledger::CreditLedgerService;

/// A booking attempt for one lesson slot
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: Uuid,
    pub profesor_id: Uuid,
    pub caballo_id: Uuid,
    pub fecha: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub hora_fin: NaiveTime,
    pub notas: Option<String>,
}

/// Entities resolved while the pipeline ran; the commit phase reuses them
/// instead of re-reading the store.
struct ValidationContext {
    user: User,
    subscription: Subscription,
}

pub struct ReservationEngine {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    horses: Arc<dyn HorseRepository>,
    lessons: Arc<dyn LessonRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    ledger: Arc<CreditLedgerService>,
    clock: Arc<dyn Clock>,
}

impl ReservationEngine {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        horses: Arc<dyn HorseRepository>,
        lessons: Arc<dyn LessonRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        ledger: Arc<CreditLedgerService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            horses,
            lessons,
            invoices,
            ledger,
            clock,
        }
    }

    /// Book a lesson within the rider's allotment.
    ///
    /// Exhausted credits reject with `NoCreditsAvailable` for every tier;
    /// booking beyond the allotment only happens through [`Self::book_extra`],
    /// so the validation and commit phases always agree on `es_extra`.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, fecha = %request.fecha))]
    pub async fn book(&self, request: BookingRequest) -> AppResult<Outcome<Lesson>> {
        let ctx = match self.validate(&request, true).await? {
            Ok(ctx) => ctx,
            Err(rejection) => {
                debug!("Booking rejected: {}", rejection.message);
                return Ok(Outcome::Rejected(rejection));
            }
        };

        let lesson = self
            .lessons
            .create(&NewLesson {
                user_id: request.user_id,
                profesor_id: request.profesor_id,
                caballo_id: request.caballo_id,
                fecha: request.fecha,
                hora_inicio: request.hora_inicio,
                hora_fin: request.hora_fin,
                es_extra: false,
                es_reagendada: false,
                clase_original_id: None,
                notas: request.notas.clone(),
            })
            .await?;

        self.consume_credit(&ctx, request.fecha).await?;

        info!(
            "Lesson {} booked for user {} on {} {}",
            lesson.id, request.user_id, request.fecha, request.hora_inicio
        );
        Ok(Outcome::Confirmed(lesson))
    }

    /// Book a lesson beyond the rider's allotment.
    ///
    /// Skips the credit check, marks the lesson `es_extra` and consumes no
    /// credit; every other pipeline step still applies.
    #[instrument(skip(self, request), fields(user_id = %request.user_id, fecha = %request.fecha))]
    pub async fn book_extra(&self, request: BookingRequest) -> AppResult<Outcome<Lesson>> {
        if let Err(rejection) = self.validate(&request, false).await? {
            debug!("Extra booking rejected: {}", rejection.message);
            return Ok(Outcome::Rejected(rejection));
        }

        let lesson = self
            .lessons
            .create(&NewLesson {
                user_id: request.user_id,
                profesor_id: request.profesor_id,
                caballo_id: request.caballo_id,
                fecha: request.fecha,
                hora_inicio: request.hora_inicio,
                hora_fin: request.hora_fin,
                es_extra: true,
                es_reagendada: false,
                clase_original_id: None,
                notas: request.notas.clone(),
            })
            .await?;

        info!(
            "Extra lesson {} booked for user {} on {}",
            lesson.id, request.user_id, request.fecha
        );
        Ok(Outcome::Confirmed(lesson))
    }

    /// Move a scheduled lesson to a new slot.
    ///
    /// Needs 24h of lead time before the NEW start; keeps the original
    /// teacher and horse; re-runs the pipeline against the new slot. The
    /// original lesson transitions to `Reagendada` and the replacement
    /// points back at it. A month change moves one ledger credit from the
    /// old month to the new one for non-extra pension lessons.
    #[instrument(skip(self))]
    pub async fn reschedule(
        &self,
        lesson_id: Uuid,
        nueva_fecha: NaiveDate,
        nueva_hora_inicio: NaiveTime,
        nueva_hora_fin: NaiveTime,
        user_id: Uuid,
    ) -> AppResult<Outcome<Lesson>> {
        let original = self
            .lessons
            .find_by_id_for_user(lesson_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found", lesson_id)))?;

        if let Some(rejection) =
            self.check_lead_time(nueva_fecha, nueva_hora_inicio, "reagendar")
        {
            return Ok(Outcome::Rejected(rejection));
        }

        let request = BookingRequest {
            user_id,
            profesor_id: original.profesor_id,
            caballo_id: original.caballo_id,
            fecha: nueva_fecha,
            hora_inicio: nueva_hora_inicio,
            hora_fin: nueva_hora_fin,
            notas: original.notas.clone(),
        };

        // An extra lesson consumed no credit, so moving it checks none
        let ctx = match self.validate(&request, !original.es_extra).await? {
            Ok(ctx) => ctx,
            Err(rejection) => {
                debug!("Reschedule rejected: {}", rejection.message);
                return Ok(Outcome::Rejected(rejection));
            }
        };

        if !original.es_extra && ctx.user.rol.uses_monthly_ledger() {
            let (anio_original, mes_original) = month_of(original.fecha);
            let (anio_nueva, mes_nueva) = month_of(nueva_fecha);
            if (anio_original, mes_original) != (anio_nueva, mes_nueva) {
                self.ledger
                    .decrement(ctx.subscription.id, mes_original, anio_original)
                    .await?;
                self.ledger
                    .increment(ctx.subscription.id, mes_nueva, anio_nueva)
                    .await?;
            }
        }

        self.lessons
            .set_estado(lesson_id, LessonStatus::Reagendada)
            .await?;

        let replacement = self
            .lessons
            .create(&NewLesson {
                user_id,
                profesor_id: original.profesor_id,
                caballo_id: original.caballo_id,
                fecha: nueva_fecha,
                hora_inicio: nueva_hora_inicio,
                hora_fin: nueva_hora_fin,
                es_extra: original.es_extra,
                es_reagendada: true,
                clase_original_id: Some(lesson_id),
                notas: original.notas,
            })
            .await?;

        info!(
            "Lesson {} rescheduled to {} as lesson {}",
            lesson_id, nueva_fecha, replacement.id
        );
        Ok(Outcome::Confirmed(replacement))
    }

    /// Cancel a scheduled lesson with 24h of lead time.
    ///
    /// Non-extra lessons return their credit: to the subscription's global
    /// counter for escuelita riders, to the lesson month's ledger for
    /// pension tiers.
    #[instrument(skip(self))]
    pub async fn cancel(&self, lesson_id: Uuid, user_id: Uuid) -> AppResult<Outcome<()>> {
        let lesson = self
            .lessons
            .find_by_id_for_user(lesson_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lesson {} not found", lesson_id)))?;

        if lesson.estado != LessonStatus::Programada {
            return Err(AppError::Validation(format!(
                "Lesson {} is not scheduled (estado: {})",
                lesson_id, lesson.estado
            )));
        }

        if let Some(rejection) = self.check_lead_time(lesson.fecha, lesson.hora_inicio, "cancelar")
        {
            return Ok(Outcome::Rejected(rejection));
        }

        self.lessons
            .set_estado(lesson_id, LessonStatus::Cancelada)
            .await?;

        if !lesson.es_extra {
            self.restore_credit(user_id, lesson.fecha).await?;
        }

        info!("Lesson {} cancelled by user {}", lesson_id, user_id);
        Ok(Outcome::Confirmed(()))
    }

    fn check_lead_time(
        &self,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        accion: &str,
    ) -> Option<Rejection> {
        let start = fecha.and_time(hora_inicio).and_utc();
        let lead = start - self.clock.now();
        if lead.num_hours() < MIN_LEAD_HOURS {
            Some(Rejection::new(
                RejectionReason::LeadTimeTooShort,
                format!(
                    "Debes {} con al menos {} horas de anticipación",
                    accion, MIN_LEAD_HOURS
                ),
            ))
        } else {
            None
        }
    }

    async fn consume_credit(&self, ctx: &ValidationContext, fecha: NaiveDate) -> AppResult<()> {
        if ctx.user.rol.uses_monthly_ledger() {
            let (anio, mes) = month_of(fecha);
            self.ledger.increment(ctx.subscription.id, mes, anio).await
        } else {
            self.subscriptions
                .increment_classes_used(ctx.subscription.id)
                .await
        }
    }

    async fn restore_credit(&self, user_id: Uuid, fecha: NaiveDate) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let Some(subscription) = self.subscriptions.find_active_by_user(user_id).await? else {
            // Subscription ended after booking; nothing to return the credit to
            return Ok(());
        };

        if user.rol.uses_monthly_ledger() {
            let (anio, mes) = month_of(fecha);
            self.ledger.decrement(subscription.id, mes, anio).await
        } else {
            self.subscriptions
                .decrement_classes_used(subscription.id)
                .await
        }
    }

    /// The shared validation pipeline. Returns the resolved entities on
    /// success, or the first applicable rejection.
    async fn validate(
        &self,
        request: &BookingRequest,
        check_credits: bool,
    ) -> AppResult<Result<ValidationContext, Rejection>> {
        let today = self.clock.today();

        // 1. User exists and is active
        let Some(user) = self.users.find_by_id(request.user_id).await? else {
            return Ok(Err(Rejection::new(
                RejectionReason::UserNotFound,
                "Usuario no encontrado",
            )));
        };
        if !user.activo {
            return Ok(Err(Rejection::new(
                RejectionReason::UserBlocked,
                "Usuario bloqueado. Contacta al administrador.",
            )));
        }

        // 2. Pension tiers may not book past dates (escuelita exempt)
        if user.rol.blocks_past_dates() && request.fecha < today {
            return Ok(Err(Rejection::new(
                RejectionReason::PastDate,
                "No puedes reservar clases en fechas pasadas.",
            )));
        }

        // 3. Active subscription covering today
        let Some(subscription) = self
            .subscriptions
            .find_current_by_user(request.user_id, today)
            .await?
        else {
            return Ok(Err(Rejection::new(
                RejectionReason::NoActivePlan,
                "No tienes un plan activo. Renueva tu suscripción.",
            )));
        };

        // 4. Credit availability
        if check_credits {
            if user.rol.uses_monthly_ledger() {
                let (anio, mes) = month_of(request.fecha);
                let balance = self.ledger.available(subscription.id, mes, anio).await?;
                if balance.exhausted() {
                    return Ok(Err(Rejection::new(
                        RejectionReason::NoCreditsAvailable,
                        format!(
                            "No tienes clases disponibles para {}/{}. Has usado {} de {} clases.",
                            mes, anio, balance.clases_usadas, balance.clases_incluidas
                        ),
                    )));
                }
            } else if subscription.clases_disponibles() <= 0 {
                return Ok(Err(Rejection::new(
                    RejectionReason::NoCreditsAvailable,
                    "No tienes clases disponibles en tu plan.",
                )));
            }
        }

        // 5. Monthly payment gate
        if user.rol.payment_gated() {
            if let Some(rejection) = self
                .check_monthly_access(request.user_id, request.fecha, today)
                .await?
            {
                return Ok(Err(rejection));
            }
        }

        // 6. Teacher free in the slot
        if self
            .lessons
            .teacher_has_overlap(
                request.profesor_id,
                request.fecha,
                request.hora_inicio,
                request.hora_fin,
            )
            .await?
        {
            return Ok(Err(Rejection::new(
                RejectionReason::TeacherUnavailable,
                "El profesor no está disponible en ese horario.",
            )));
        }

        // 7. Horse free in the slot. On a shared horse the co-owner's
        // overlapping lesson is the more specific conflict, so it is
        // reported ahead of the generic availability rejection.
        let Some(horse) = self.horses.find_by_id(request.caballo_id).await? else {
            return Ok(Err(Rejection::new(
                RejectionReason::HorseNotFound,
                "Caballo no encontrado",
            )));
        };
        if user.rol.shares_horse() {
            if let Some(co_owner) = horse.co_owner_of(request.user_id) {
                if self
                    .lessons
                    .co_owner_has_overlap(
                        request.caballo_id,
                        co_owner,
                        request.fecha,
                        request.hora_inicio,
                        request.hora_fin,
                    )
                    .await?
                {
                    return Ok(Err(Rejection::new(
                        RejectionReason::CoOwnerConflict,
                        "No puedes reservar en ese horario. Tu co-propietario del caballo \
                         ya tiene una clase programada en ese horario.",
                    )));
                }
            }
        }
        if self
            .lessons
            .horse_has_overlap(
                request.caballo_id,
                request.fecha,
                request.hora_inicio,
                request.hora_fin,
            )
            .await?
        {
            return Ok(Err(Rejection::new(
                RejectionReason::HorseUnavailable,
                "El caballo no está disponible en ese horario.",
            )));
        }

        // 8. Horse operational state and daily cap
        if !horse.is_available() {
            return Ok(Err(Rejection::new(
                RejectionReason::HorseNotActive,
                format!("El caballo está en estado: {}", horse.estado),
            )));
        }
        let scheduled = self
            .lessons
            .count_scheduled_for_horse_on(request.caballo_id, request.fecha)
            .await?;
        if scheduled >= i64::from(horse.limite_clases_dia) {
            return Ok(Err(Rejection::new(
                RejectionReason::DailyCapReached,
                format!(
                    "El caballo ha alcanzado su límite diario de {} clases.",
                    horse.limite_clases_dia
                ),
            )));
        }

        // 9. One lesson per day for pension tiers, regardless of time overlap
        if user.rol.single_lesson_per_day()
            && self
                .lessons
                .user_has_scheduled_on(request.user_id, request.fecha)
                .await?
        {
            return Ok(Err(Rejection::new(
                RejectionReason::SelfConflict,
                "Ya tienes una clase programada para ese día.",
            )));
        }

        Ok(Ok(ValidationContext { user, subscription }))
    }

    /// Payment-gated booking window for pension tiers.
    ///
    /// Bookable months are the current one and the next one only. The
    /// current month is open unconditionally through calendar day 10; from
    /// day 11 its invoice must be settled. Next month additionally requires
    /// the current month settled (or still in grace), and a lesson dated
    /// after day 10 of next month requires next month settled too.
    async fn check_monthly_access(
        &self,
        user_id: Uuid,
        fecha: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<Option<Rejection>> {
        let (anio_clase, mes_clase) = month_of(fecha);
        let (anio_hoy, mes_hoy) = month_of(today);
        let (anio_sig, mes_sig) = next_month(anio_hoy, mes_hoy);

        let clase_key = anio_clase * 100 + mes_clase as i32;
        let actual_key = anio_hoy * 100 + mes_hoy as i32;
        let siguiente_key = anio_sig * 100 + mes_sig as i32;

        if clase_key < actual_key {
            return Ok(Some(Rejection::new(
                RejectionReason::OutsideBookingWindow,
                format!(
                    "No se pueden hacer reservas en meses pasados ({}/{}).",
                    mes_clase, anio_clase
                ),
            )));
        }

        if clase_key > siguiente_key {
            return Ok(Some(Rejection::new(
                RejectionReason::OutsideBookingWindow,
                format!(
                    "Solo puedes reservar para el mes actual ({}/{}) o el siguiente ({}/{}).",
                    mes_hoy, anio_hoy, mes_sig, anio_sig
                ),
            )));
        }

        let in_grace = today.day() <= GRACE_PERIOD_DAY;

        if clase_key == actual_key {
            if in_grace {
                return Ok(None);
            }
            if !self
                .invoices
                .has_settled_for_month(user_id, mes_hoy, anio_hoy)
                .await?
            {
                return Ok(Some(Rejection::new(
                    RejectionReason::PaymentPending {
                        mes: mes_hoy,
                        anio: anio_hoy,
                    },
                    format!(
                        "Tu pago de {}/{} está pendiente. Por favor regulariza tu \
                         situación para continuar reservando.",
                        mes_hoy, anio_hoy
                    ),
                )));
            }
            return Ok(None);
        }

        // Booking into next month
        let current_settled = in_grace
            || self
                .invoices
                .has_settled_for_month(user_id, mes_hoy, anio_hoy)
                .await?;
        if !current_settled {
            return Ok(Some(Rejection::new(
                RejectionReason::PaymentPending {
                    mes: mes_hoy,
                    anio: anio_hoy,
                },
                format!(
                    "Debes tener el mes {}/{} al día antes de reservar en {}/{}.",
                    mes_hoy, anio_hoy, mes_sig, anio_sig
                ),
            )));
        }

        if fecha.day() <= GRACE_PERIOD_DAY {
            return Ok(None);
        }

        if !self
            .invoices
            .has_settled_for_month(user_id, mes_sig, anio_sig)
            .await?
        {
            return Ok(Some(Rejection::new(
                RejectionReason::PaymentPending {
                    mes: mes_sig,
                    anio: anio_sig,
                },
                format!(
                    "Tu pago de {}/{} está pendiente. Por favor regulariza tu \
                     situación para continuar reservando.",
                    mes_sig, anio_sig
                ),
            )));
        }

        Ok(None)
    }
}
