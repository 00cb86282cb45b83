//! Business logic services for the Rienda academy backend
//!
//! This crate contains the scheduling, credit accounting and billing
//! services that sit between the (external) HTTP layer and the store.
//!
//! # Architecture
//!
//! Services are designed to be composable and testable:
//! - Each service holds `Arc<dyn Trait>` repository handles
//! - Services are wrapped in Arc for safe sharing across async tasks
//! - All operations are instrumented with tracing
//! - Validation refusals are returned as `Outcome::Rejected` values;
//!   `AppError` is reserved for unexpected failures
//!
//! # Services
//!
//! - `CreditLedgerService` - per-subscription monthly usage counters
//! - `ReservationEngine` - booking, reschedule and cancellation pipeline
//! - `RecurringScheduleGenerator` - monthly expansion of fixed weekly slots
//! - `BillingService` - monthly invoice batch, signup invoices, payment proofs
//! - `ClassUsageReconciler` - daily escuelita usage recount
//! - `TeacherPayrollCalculator` - per-teacher monthly pay statements
//! - `SubscriptionService` - subscription lifecycle (single-active rule)

pub mod billing;
pub mod credit_ledger;
pub mod payroll;
pub mod reconciliation;
pub mod reservation;
pub mod schedule_generator;
pub mod subscriptions;

pub use billing::{BillingReport, BillingService};
pub use credit_ledger::CreditLedgerService;
pub use payroll::{PayrollRunReport, PayrollStatement, TeacherPayrollCalculator};
pub use reconciliation::{ClassUsageReconciler, ReconciliationReport, UsageCorrection};
pub use reservation::{BookingRequest, ReservationEngine};
pub use schedule_generator::{GenerationReport, RecurringScheduleGenerator};
pub use subscriptions::{SubscriptionService, SubscriptionSummary};

/// Business rule constants
pub mod constants {
    /// Last calendar day of the monthly grace period: pension-tier riders
    /// may book the current month unconditionally through this day.
    pub const GRACE_PERIOD_DAY: u32 = 10;

    /// Invoices fall due on the N-th business day of their month
    pub const DUE_BUSINESS_DAY: u32 = 10;

    /// Minimum lead time for reschedules and cancellations, in hours
    pub const MIN_LEAD_HOURS: i64 = 24;

    /// Weekly allotment divisor: a plan's monthly classes spread over
    /// four weeks
    pub const WEEKS_PER_MONTH: i32 = 4;
}
