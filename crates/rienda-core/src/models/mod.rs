//! Domain models for the Rienda backend

pub mod fixed_slot;
pub mod horse;
pub mod invoice;
pub mod lesson;
pub mod monthly_credit;
pub mod plan;
pub mod subscription;
pub mod teacher;
pub mod user;

pub use fixed_slot::FixedScheduleSlot;
pub use horse::{Horse, HorseStatus, HorseType};
pub use invoice::{Invoice, InvoiceStatus, NewInvoice, NewPaymentProof, PaymentProof, ProofStatus};
pub use lesson::{intervals_overlap, Lesson, LessonStatus, NewLesson};
pub use monthly_credit::{MonthlyBalance, MonthlyCreditRecord};
pub use plan::{Plan, PlanType};
pub use subscription::Subscription;
pub use teacher::Teacher;
pub use user::{User, UserRole};
