//! Teacher payroll calculation
//!
//! A teacher's monthly pay is a percentage of the revenue of the distinct
//! subscriptions they touched during the month: the scheduled lessons they
//! taught name the riders, each rider's active subscription contributes its
//! plan price ONCE regardless of lesson count, and the two plan-type
//! buckets (escuelita vs the pension tiers combined) carry separate
//! percentages.

use rienda_core::{
    dates::{first_day_of_month, last_day_of_month},
    models::PlanType,
    traits::{LessonRepository, PlanRepository, SubscriptionRepository, TeacherRepository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// One teacher's pay statement for one month
#[derive(Debug, Clone, Serialize)]
pub struct PayrollStatement {
    pub profesor_id: Uuid,
    pub mes: u32,
    pub anio: i32,
    pub lessons_taught: u32,
    /// Summed plan prices of distinct escuelita subscriptions
    pub escuelita_base: Decimal,
    /// Summed plan prices of distinct pension subscriptions (both tiers)
    pub pension_base: Decimal,
    pub escuelita_pay: Decimal,
    pub pension_pay: Decimal,
    pub total_pay: Decimal,
}

/// Payroll batch over every active teacher
#[derive(Debug, Clone, Serialize)]
pub struct PayrollRunReport {
    pub statements: Vec<PayrollStatement>,
    pub errors: Vec<String>,
}

pub struct TeacherPayrollCalculator {
    teachers: Arc<dyn TeacherRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanRepository>,
    lessons: Arc<dyn LessonRepository>,
}

impl TeacherPayrollCalculator {
    pub fn new(
        teachers: Arc<dyn TeacherRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanRepository>,
        lessons: Arc<dyn LessonRepository>,
    ) -> Self {
        Self {
            teachers,
            subscriptions,
            plans,
            lessons,
        }
    }

    #[instrument(skip(self))]
    pub async fn monthly_pay(
        &self,
        profesor_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<PayrollStatement> {
        let teacher = self
            .teachers
            .find_by_id(profesor_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Teacher {} not found", profesor_id)))?;

        let month_start = first_day_of_month(anio, mes);
        let month_end = last_day_of_month(anio, mes);

        let lessons = self
            .lessons
            .list_scheduled_for_teacher_between(profesor_id, month_start, month_end)
            .await?;

        let riders: BTreeSet<Uuid> = lessons.iter().map(|l| l.user_id).collect();
        let rider_ids: Vec<Uuid> = riders.into_iter().collect();

        let subscriptions = self.subscriptions.list_active_by_users(&rider_ids).await?;

        let mut escuelita_base = Decimal::ZERO;
        let mut pension_base = Decimal::ZERO;
        let mut counted: BTreeSet<Uuid> = BTreeSet::new();

        for subscription in &subscriptions {
            if !subscription.overlaps_month(month_start, month_end) {
                continue;
            }
            // One contribution per distinct subscription, not per lesson
            if !counted.insert(subscription.id) {
                continue;
            }

            let plan = self
                .plans
                .find_by_id(subscription.plan_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Plan {} not found", subscription.plan_id))
                })?;

            match plan.tipo {
                PlanType::Escuelita => escuelita_base += plan.precio,
                PlanType::PensionCompleta | PlanType::MediaPension => {
                    pension_base += plan.precio
                }
            }
        }

        let cien = Decimal::from(100);
        let escuelita_pay = escuelita_base * teacher.porcentaje_escuelita / cien;
        let pension_pay = pension_base * teacher.porcentaje_pension / cien;

        let statement = PayrollStatement {
            profesor_id,
            mes,
            anio,
            lessons_taught: lessons.len() as u32,
            escuelita_base,
            pension_base,
            escuelita_pay,
            pension_pay,
            total_pay: escuelita_pay + pension_pay,
        };

        debug!(
            "Payroll {}/{} for teacher {}: {} total",
            mes, anio, profesor_id, statement.total_pay
        );
        Ok(statement)
    }

    /// Statements for every active teacher; per-teacher failures are
    /// collected, never abort the run.
    #[instrument(skip(self))]
    pub async fn monthly_pay_all(&self, mes: u32, anio: i32) -> AppResult<PayrollRunReport> {
        let teachers = self.teachers.list_active().await?;

        let mut report = PayrollRunReport {
            statements: Vec::new(),
            errors: Vec::new(),
        };

        for teacher in teachers {
            match self.monthly_pay(teacher.id, mes, anio).await {
                Ok(statement) => report.statements.push(statement),
                Err(e) => {
                    error!("Payroll failed for teacher {}: {}", teacher.id, e);
                    report.errors.push(format!("profesor {}: {}", teacher.id, e));
                }
            }
        }

        info!(
            "Payroll run {}/{}: {} statements, {} errors",
            mes,
            anio,
            report.statements.len(),
            report.errors.len()
        );
        Ok(report)
    }
}
