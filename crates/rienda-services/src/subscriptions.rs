//! Subscription lifecycle
//!
//! A rider holds at most one active subscription: creating a new one
//! deactivates every prior active subscription first. Escuelita
//! subscriptions are bounded to the starting month; pension tiers are
//! open-ended and picked up by the monthly billing batch.

use chrono::{Datelike, NaiveDate};
use rienda_core::{
    dates::last_day_of_month,
    models::{Plan, Subscription},
    traits::{PlanRepository, SubscriptionRepository, UserRepository},
    AppError, AppResult, Clock, Outcome, RejectionReason,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A rider's active subscription with its plan and remaining allotment
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSummary {
    pub subscription: Subscription,
    pub plan: Plan,
    pub clases_disponibles: i32,
}

pub struct SubscriptionService {
    users: Arc<dyn UserRepository>,
    plans: Arc<dyn PlanRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    clock: Arc<dyn Clock>,
}

impl SubscriptionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        plans: Arc<dyn PlanRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            plans,
            subscriptions,
            clock,
        }
    }

    /// Subscribe a rider to a plan, superseding any prior subscription.
    #[instrument(skip(self))]
    pub async fn create_subscription(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        fecha_inicio: Option<NaiveDate>,
    ) -> AppResult<Outcome<Subscription>> {
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

        let plan = self
            .plans
            .find_by_id(plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", plan_id)))?;

        if !plan.activo {
            return Err(AppError::Validation(format!(
                "Plan {} is not active",
                plan_id
            )));
        }

        if !user.rol.matches_plan(plan.tipo) {
            return Ok(Outcome::rejected(
                RejectionReason::PlanMismatch,
                "El plan no corresponde a tu tipo de membresía.",
            ));
        }

        let fecha_inicio = fecha_inicio.unwrap_or_else(|| self.clock.today());

        // Escuelita subscriptions end with their starting month; pension
        // tiers run until replaced.
        let fecha_fin = if user.rol.uses_monthly_ledger() {
            None
        } else {
            Some(last_day_of_month(fecha_inicio.year(), fecha_inicio.month()))
        };

        let superseded = self.subscriptions.deactivate_all_for_user(user_id).await?;
        if superseded > 0 {
            info!(
                "Deactivated {} prior subscription(s) for user {}",
                superseded, user_id
            );
        }

        let subscription = self
            .subscriptions
            .create(&Subscription {
                // Placeholder; the store assigns the real id on insert
                id: Uuid::new_v4(),
                user_id,
                plan_id,
                fecha_inicio,
                fecha_fin,
                clases_incluidas: plan.clases_mes,
                clases_usadas: 0,
                activa: true,
            })
            .await?;

        info!(
            "Subscription {} created for user {} on plan {}",
            subscription.id, user_id, plan.nombre
        );
        Ok(Outcome::Confirmed(subscription))
    }

    /// The rider's active subscription with plan and remaining global
    /// allotment, if any
    #[instrument(skip(self))]
    pub async fn active_subscription(
        &self,
        user_id: Uuid,
    ) -> AppResult<Option<SubscriptionSummary>> {
        let Some(subscription) = self.subscriptions.find_active_by_user(user_id).await? else {
            return Ok(None);
        };

        let plan = self
            .plans
            .find_by_id(subscription.plan_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Plan {} not found", subscription.plan_id))
            })?;

        let clases_disponibles = subscription.clases_disponibles();
        Ok(Some(SubscriptionSummary {
            subscription,
            plan,
            clases_disponibles,
        }))
    }
}
