//! Credit ledger service
//!
//! Per-subscription, per-calendar-month usage accounting for open-ended
//! (pension) subscriptions, whose global `clases_usadas` counter is not
//! month-scoped. Ledger rows are created lazily; the included allotment
//! always comes from the subscription's plan, never from the row itself.

use rienda_core::{
    models::{MonthlyBalance, MonthlyCreditRecord},
    traits::{MonthlyCreditRepository, PlanRepository, SubscriptionRepository},
    AppError, AppResult,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

pub struct CreditLedgerService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanRepository>,
    credits: Arc<dyn MonthlyCreditRepository>,
}

impl CreditLedgerService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanRepository>,
        credits: Arc<dyn MonthlyCreditRepository>,
    ) -> Self {
        Self {
            subscriptions,
            plans,
            credits,
        }
    }

    /// Return the ledger row for the month, creating a zero-usage one if
    /// absent. Idempotent.
    #[instrument(skip(self))]
    pub async fn get_or_create(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<MonthlyCreditRecord> {
        self.credits.get_or_create(suscripcion_id, mes, anio).await
    }

    /// Ensure the ledger row for the month exists (billing calls this when
    /// opening a new invoice period)
    #[instrument(skip(self))]
    pub async fn initialize_month(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<()> {
        let record = self.credits.get_or_create(suscripcion_id, mes, anio).await?;
        debug!(
            "Ledger month {}/{} ready for subscription {} (used: {})",
            mes, anio, suscripcion_id, record.clases_usadas
        );
        Ok(())
    }

    /// Credit balance for the subscription-month: included from the plan,
    /// used from the ledger
    #[instrument(skip(self))]
    pub async fn available(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<MonthlyBalance> {
        let subscription = self
            .subscriptions
            .find_by_id(suscripcion_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Subscription {} not found", suscripcion_id))
            })?;

        let plan = self
            .plans
            .find_by_id(subscription.plan_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Plan {} not found", subscription.plan_id))
            })?;

        let record = self.credits.get_or_create(suscripcion_id, mes, anio).await?;

        Ok(MonthlyBalance::new(plan.clases_mes, record.clases_usadas))
    }

    #[instrument(skip(self))]
    pub async fn increment(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> AppResult<()> {
        debug!(
            "Incrementing ledger usage for subscription {} in {}/{}",
            suscripcion_id, mes, anio
        );
        self.credits.increment(suscripcion_id, mes, anio).await
    }

    /// Return one credit to the month; floors at zero, a missing row is a
    /// no-op
    #[instrument(skip(self))]
    pub async fn decrement(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> AppResult<()> {
        debug!(
            "Decrementing ledger usage for subscription {} in {}/{}",
            suscripcion_id, mes, anio
        );
        self.credits.decrement(suscripcion_id, mes, anio).await
    }
}
