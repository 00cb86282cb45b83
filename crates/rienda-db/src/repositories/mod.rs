//! PostgreSQL repository implementations

mod fixed_slot_repo;
mod horse_repo;
mod invoice_repo;
mod lesson_repo;
mod monthly_credit_repo;
mod plan_repo;
mod proof_repo;
mod subscription_repo;
mod teacher_repo;
mod user_repo;

pub use fixed_slot_repo::PgFixedSlotRepository;
pub use horse_repo::PgHorseRepository;
pub use invoice_repo::PgInvoiceRepository;
pub use lesson_repo::PgLessonRepository;
pub use monthly_credit_repo::PgMonthlyCreditRepository;
pub use plan_repo::PgPlanRepository;
pub use proof_repo::PgPaymentProofRepository;
pub use subscription_repo::PgSubscriptionRepository;
pub use teacher_repo::PgTeacherRepository;
pub use user_repo::PgUserRepository;
