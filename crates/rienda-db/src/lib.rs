//! PostgreSQL persistence layer
//!
//! Connection pooling, migrations and the repository implementations
//! behind the traits in `rienda-core`.

pub mod pool;
pub mod repositories;

pub use pool::{create_pool, run_migrations};
pub use repositories::{
    PgFixedSlotRepository, PgHorseRepository, PgInvoiceRepository, PgLessonRepository,
    PgMonthlyCreditRepository, PgPaymentProofRepository, PgPlanRepository,
    PgSubscriptionRepository, PgTeacherRepository, PgUserRepository,
};
