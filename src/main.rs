//! Rienda batch jobs runner
//!
//! One-shot entrypoint for the academy's scheduled jobs: the monthly
//! invoice batch, the recurring schedule generation, the daily class-usage
//! reconciliation and the payroll statements. Meant to be invoked from
//! cron with the job name as the first argument.

use anyhow::{bail, Context};
use chrono::{Datelike, Utc};
use rienda_core::{
    config::AppConfig, models::UserRole, traits::UserRepository, Clock, Outcome, SystemClock,
};
use rienda_db::{
    create_pool, run_migrations, PgFixedSlotRepository, PgHorseRepository, PgInvoiceRepository,
    PgLessonRepository, PgMonthlyCreditRepository, PgPaymentProofRepository, PgPlanRepository,
    PgSubscriptionRepository, PgTeacherRepository, PgUserRepository,
};
use rienda_services::{
    BillingService, ClassUsageReconciler, CreditLedgerService, RecurringScheduleGenerator,
    TeacherPayrollCalculator,
};
use std::env;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rienda_jobs={},rienda_services={},rienda_db={},sqlx=warn",
            log_level, log_level, log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// The month a run targets: explicit `MES`/`ANIO` args when given. Payroll
/// defaults to the previous calendar month, generation to the next one.
fn month_args(args: &[String]) -> anyhow::Result<Option<(u32, i32)>> {
    if args.len() < 2 {
        return Ok(None);
    }
    let mes: u32 = args[0].parse().context("MES must be 1-12")?;
    let anio: i32 = args[1].parse().context("ANIO must be a year")?;
    if !(1..=12).contains(&mes) {
        bail!("MES must be 1-12, got {}", mes);
    }
    Ok(Some((mes, anio)))
}

fn previous_month() -> (u32, i32) {
    let today = Utc::now().date_naive();
    if today.month() == 1 {
        (12, today.year() - 1)
    } else {
        (today.month() - 1, today.year())
    }
}

fn next_month() -> (u32, i32) {
    let today = Utc::now().date_naive();
    if today.month() == 12 {
        (1, today.year() + 1)
    } else {
        (today.month() + 1, today.year())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let job = args.first().map(String::as_str).unwrap_or("help");

    if job == "help" {
        eprintln!("usage: rienda-jobs <billing | generate [MES ANIO] | reconcile | payroll [MES ANIO]>");
        return Ok(());
    }

    info!("Starting rienda-jobs v{}: {}", env!("CARGO_PKG_VERSION"), job);

    let config = AppConfig::load().context("failed to load configuration")?;
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;

    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let horses = Arc::new(PgHorseRepository::new(pool.clone()));
    let teachers = Arc::new(PgTeacherRepository::new(pool.clone()));
    let plans = Arc::new(PgPlanRepository::new(pool.clone()));
    let subscriptions = Arc::new(PgSubscriptionRepository::new(pool.clone()));
    let lessons = Arc::new(PgLessonRepository::new(pool.clone()));
    let invoices = Arc::new(PgInvoiceRepository::new(pool.clone()));
    let credits = Arc::new(PgMonthlyCreditRepository::new(pool.clone()));
    let proofs = Arc::new(PgPaymentProofRepository::new(pool.clone()));
    let slots = Arc::new(PgFixedSlotRepository::new(pool.clone()));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let ledger = Arc::new(CreditLedgerService::new(
        subscriptions.clone(),
        plans.clone(),
        credits.clone(),
    ));

    match job {
        "billing" => {
            let billing = BillingService::new(
                users.clone(),
                subscriptions.clone(),
                plans.clone(),
                invoices.clone(),
                proofs.clone(),
                ledger.clone(),
                clock.clone(),
            );
            let report = billing.generate_monthly_invoices().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.success() {
                bail!("billing run finished with errors");
            }
        }
        "generate" => {
            let (mes, anio) = month_args(&args[1..])?.unwrap_or_else(next_month);
            let generator = RecurringScheduleGenerator::new(
                users.clone(),
                subscriptions.clone(),
                slots.clone(),
                horses.clone(),
                lessons.clone(),
            );
            let riders = users.list_active_by_roles(&[UserRole::Escuelita]).await?;
            info!(
                "Generating {}/{} schedules for {} escuelita riders",
                mes,
                anio,
                riders.len()
            );
            for rider in riders {
                match generator.generate_month(rider.id, anio, mes).await? {
                    Outcome::Confirmed(report) => {
                        println!("{}: {}", rider.id, serde_json::to_string(&report)?);
                    }
                    Outcome::Rejected(rejection) => {
                        warn!("Skipping rider {}: {}", rider.id, rejection.message);
                    }
                }
            }
        }
        "reconcile" => {
            let reconciler = ClassUsageReconciler::new(
                subscriptions.clone(),
                lessons.clone(),
                clock.clone(),
            );
            let report = reconciler.run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.errors.is_empty() {
                bail!("reconciliation finished with errors");
            }
        }
        "payroll" => {
            let (mes, anio) = month_args(&args[1..])?.unwrap_or_else(previous_month);
            let payroll = TeacherPayrollCalculator::new(
                teachers.clone(),
                subscriptions.clone(),
                plans.clone(),
                lessons.clone(),
            );
            let report = payroll.monthly_pay_all(mes, anio).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.errors.is_empty() {
                bail!("payroll run finished with errors");
            }
        }
        other => bail!(
            "unknown job '{}', expected billing | generate | reconcile | payroll",
            other
        ),
    }

    info!("Job {} finished", job);
    Ok(())
}
