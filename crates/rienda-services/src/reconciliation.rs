//! Class usage reconciliation
//!
//! Daily batch that recomputes each active escuelita subscription's
//! `clases_usadas` as the count of the rider's scheduled lessons dated
//! strictly before today. This is the authoritative counter for generated
//! lessons, which the schedule generator deliberately does not charge at
//! creation time: a lesson is "used" only once its date has passed.

use rienda_core::{
    traits::{LessonRepository, SubscriptionRepository},
    AppResult, Clock,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// One applied counter correction
#[derive(Debug, Clone, Serialize)]
pub struct UsageCorrection {
    pub suscripcion_id: Uuid,
    pub previous: i32,
    pub actual: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub subscriptions_checked: u32,
    pub corrections: Vec<UsageCorrection>,
    pub errors: Vec<String>,
}

pub struct ClassUsageReconciler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    lessons: Arc<dyn LessonRepository>,
    clock: Arc<dyn Clock>,
}

impl ClassUsageReconciler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        lessons: Arc<dyn LessonRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            subscriptions,
            lessons,
            clock,
        }
    }

    /// Recount and overwrite stale usage counters. Per-subscription
    /// failures are collected, never abort the run.
    #[instrument(skip(self))]
    pub async fn run(&self) -> AppResult<ReconciliationReport> {
        let today = self.clock.today();
        let subscriptions = self.subscriptions.list_active_escuelita().await?;

        let mut report = ReconciliationReport {
            subscriptions_checked: subscriptions.len() as u32,
            corrections: Vec::new(),
            errors: Vec::new(),
        };

        for subscription in subscriptions {
            let counted = match self
                .lessons
                .count_scheduled_before(subscription.user_id, today)
                .await
            {
                Ok(n) => n as i32,
                Err(e) => {
                    error!("Failed to count lessons for {}: {}", subscription.id, e);
                    report
                        .errors
                        .push(format!("suscripción {}: {}", subscription.id, e));
                    continue;
                }
            };

            if counted == subscription.clases_usadas {
                continue;
            }

            debug!(
                "Correcting subscription {}: {} -> {}",
                subscription.id, subscription.clases_usadas, counted
            );
            if let Err(e) = self
                .subscriptions
                .set_classes_used(subscription.id, counted)
                .await
            {
                error!("Failed to update subscription {}: {}", subscription.id, e);
                report
                    .errors
                    .push(format!("suscripción {}: {}", subscription.id, e));
                continue;
            }

            report.corrections.push(UsageCorrection {
                suscripcion_id: subscription.id,
                previous: subscription.clases_usadas,
                actual: counted,
            });
        }

        info!(
            "Usage reconciliation: {} checked, {} corrected, {} errors",
            report.subscriptions_checked,
            report.corrections.len(),
            report.errors.len()
        );
        Ok(report)
    }
}
