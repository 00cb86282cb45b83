//! Repository traits
//!
//! The services see the relational store only through these abstractions;
//! `rienda-db` provides the PostgreSQL implementations and the test suites
//! provide in-memory fakes. Every call is one round trip: there are no
//! multi-statement transactions here, so multi-step operations in the
//! services are sequences of independent calls (see the concurrency notes
//! in DESIGN.md).

use crate::error::AppResult;
use crate::models::{
    FixedScheduleSlot, Horse, Invoice, Lesson, LessonStatus, MonthlyCreditRecord, NewInvoice,
    NewLesson, NewPaymentProof, PaymentProof, Plan, ProofStatus, Subscription, Teacher, User,
    UserRole,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Active users holding any of the given roles
    async fn list_active_by_roles(&self, roles: &[UserRole]) -> AppResult<Vec<User>>;
}

#[async_trait]
pub trait HorseRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Horse>>;

    /// First active school horse, the pool the generator draws from
    async fn first_active_school_horse(&self) -> AppResult<Option<Horse>>;
}

#[async_trait]
pub trait TeacherRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Teacher>>;

    async fn list_active(&self) -> AppResult<Vec<Teacher>>;
}

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>>;

    /// The user's active subscription, regardless of date window
    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>>;

    /// The user's active subscription whose [fecha_inicio, fecha_fin]
    /// window covers `today`
    async fn find_current_by_user(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<Option<Subscription>>;

    async fn create(&self, subscription: &Subscription) -> AppResult<Subscription>;

    /// Deactivate every active subscription of the user; returns how many
    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Overwrite the global usage counter (reconciliation)
    async fn set_classes_used(&self, id: Uuid, clases_usadas: i32) -> AppResult<()>;

    /// Atomic `clases_usadas + 1`
    async fn increment_classes_used(&self, id: Uuid) -> AppResult<()>;

    /// Atomic `max(clases_usadas - 1, 0)`
    async fn decrement_classes_used(&self, id: Uuid) -> AppResult<()>;

    /// Active subscriptions of active escuelita riders
    async fn list_active_escuelita(&self) -> AppResult<Vec<Subscription>>;

    /// Active subscriptions belonging to any of the given users
    async fn list_active_by_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Subscription>>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn create(&self, lesson: &NewLesson) -> AppResult<Lesson>;

    /// The lesson, only if it belongs to `user_id`
    async fn find_by_id_for_user(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Lesson>>;

    /// Any scheduled lesson of the teacher on `fecha` overlapping [inicio, fin)
    async fn teacher_has_overlap(
        &self,
        profesor_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool>;

    /// Any scheduled lesson of the horse on `fecha` overlapping [inicio, fin)
    async fn horse_has_overlap(
        &self,
        caballo_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool>;

    /// Scheduled lessons of the horse on `fecha` (daily cap check)
    async fn count_scheduled_for_horse_on(
        &self,
        caballo_id: Uuid,
        fecha: NaiveDate,
    ) -> AppResult<i64>;

    /// Whether the rider already has any scheduled lesson on `fecha`
    async fn user_has_scheduled_on(&self, user_id: Uuid, fecha: NaiveDate) -> AppResult<bool>;

    /// Any scheduled lesson of `co_owner_id` on the same horse and date
    /// overlapping [inicio, fin)
    async fn co_owner_has_overlap(
        &self,
        caballo_id: Uuid,
        co_owner_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool>;

    async fn set_estado(&self, id: Uuid, estado: LessonStatus) -> AppResult<()>;

    /// Scheduled lessons of the rider dated strictly before `before`
    /// (usage reconciliation)
    async fn count_scheduled_before(&self, user_id: Uuid, before: NaiveDate) -> AppResult<i64>;

    /// Scheduled lessons taught by the teacher within [desde, hasta]
    async fn list_scheduled_for_teacher_between(
        &self,
        profesor_id: Uuid,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> AppResult<Vec<Lesson>>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>>;

    async fn create(&self, invoice: &NewInvoice) -> AppResult<Invoice>;

    /// Whether any invoice exists for (user, month, year)
    async fn exists_for_month(&self, user_id: Uuid, mes: u32, anio: i32) -> AppResult<bool>;

    /// Whether a settled invoice exists for (user, month, year)
    async fn has_settled_for_month(&self, user_id: Uuid, mes: u32, anio: i32) -> AppResult<bool>;

    async fn mark_paid(&self, id: Uuid, fecha_pago: NaiveDate) -> AppResult<Invoice>;

    /// Unpaid invoices, newest month first
    async fn list_pending_for_user(&self, user_id: Uuid) -> AppResult<Vec<Invoice>>;

    /// Invoices dated on or after `desde`, newest month first
    async fn list_for_user_since(&self, user_id: Uuid, desde: NaiveDate)
        -> AppResult<Vec<Invoice>>;
}

#[async_trait]
pub trait MonthlyCreditRepository: Send + Sync {
    async fn find(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<Option<MonthlyCreditRecord>>;

    /// Return the existing row or insert a zero-usage one. Idempotent; the
    /// ledger's unique index absorbs the insert race.
    async fn get_or_create(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<MonthlyCreditRecord>;

    /// Atomic `clases_usadas + 1` on the month row (created if missing)
    async fn increment(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> AppResult<()>;

    /// Atomic `max(clases_usadas - 1, 0)`; a missing row is a no-op
    async fn decrement(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> AppResult<()>;
}

#[async_trait]
pub trait FixedSlotRepository: Send + Sync {
    async fn list_active_for_user(&self, user_id: Uuid) -> AppResult<Vec<FixedScheduleSlot>>;
}

#[async_trait]
pub trait PaymentProofRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<PaymentProof>>;

    async fn create(&self, proof: &NewPaymentProof) -> AppResult<PaymentProof>;

    async fn set_estado(
        &self,
        id: Uuid,
        estado: ProofStatus,
        observaciones: Option<&str>,
    ) -> AppResult<()>;
}
