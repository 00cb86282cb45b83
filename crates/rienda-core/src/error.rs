//! Unified error handling for the Rienda backend
//!
//! Two failure families live here and must not be confused:
//!
//! - [`AppError`] — unexpected failures (store errors, configuration,
//!   missing referenced entities). These propagate with `?` and are logged.
//! - [`Rejection`] — expected, user-facing validation outcomes of the
//!   booking pipeline. These are values, never errors: a rejected booking
//!   is a successful function call that returned [`Outcome::Rejected`].

use serde::Serialize;
use thiserror::Error;

/// Main application error type
///
/// All unexpected errors in the backend are converted to this type. The
/// (external) HTTP layer maps `NotFound` to 404 and everything else to 500.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Result alias used across all crates
pub type AppResult<T> = Result<T, AppError>;

/// Why a booking, reschedule, cancellation, or generation request was
/// refused. Closed set; the HTTP layer maps these to 400/403.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    UserNotFound,
    UserBlocked,
    PastDate,
    NoActivePlan,
    NoCreditsAvailable,
    /// Carries the month whose invoice must be settled first.
    PaymentPending { mes: u32, anio: i32 },
    /// Lesson date falls outside the current-or-next-month window.
    OutsideBookingWindow,
    TeacherUnavailable,
    HorseNotFound,
    HorseUnavailable,
    HorseNotActive,
    DailyCapReached,
    SelfConflict,
    CoOwnerConflict,
    /// Reschedules and cancellations need 24h of lead time.
    LeadTimeTooShort,
    NoFixedSchedule,
    SlotCountMismatch,
    NoSchoolHorse,
    PlanMismatch,
}

impl RejectionReason {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::UserNotFound => "user_not_found",
            RejectionReason::UserBlocked => "user_blocked",
            RejectionReason::PastDate => "past_date",
            RejectionReason::NoActivePlan => "no_active_plan",
            RejectionReason::NoCreditsAvailable => "no_credits_available",
            RejectionReason::PaymentPending { .. } => "payment_pending",
            RejectionReason::OutsideBookingWindow => "outside_booking_window",
            RejectionReason::TeacherUnavailable => "teacher_unavailable",
            RejectionReason::HorseNotFound => "horse_not_found",
            RejectionReason::HorseUnavailable => "horse_unavailable",
            RejectionReason::HorseNotActive => "horse_not_active",
            RejectionReason::DailyCapReached => "daily_cap_reached",
            RejectionReason::SelfConflict => "self_conflict",
            RejectionReason::CoOwnerConflict => "co_owner_conflict",
            RejectionReason::LeadTimeTooShort => "lead_time_too_short",
            RejectionReason::NoFixedSchedule => "no_fixed_schedule",
            RejectionReason::SlotCountMismatch => "slot_count_mismatch",
            RejectionReason::NoSchoolHorse => "no_school_horse",
            RejectionReason::PlanMismatch => "plan_mismatch",
        }
    }
}

/// A structured validation rejection with a rider-facing message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    #[serde(flatten)]
    pub reason: RejectionReason,
    pub message: String,
}

impl Rejection {
    pub fn new(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Result of a business operation that can be refused without being an error
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Confirmed(T),
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn rejected(reason: RejectionReason, message: impl Into<String>) -> Self {
        Outcome::Rejected(Rejection::new(reason, message))
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Confirmed(_) => None,
            Outcome::Rejected(r) => Some(r),
        }
    }

    /// Unwrap the confirmed value, panicking on a rejection. Test helper.
    pub fn into_confirmed(self) -> T {
        match self {
            Outcome::Confirmed(v) => v,
            Outcome::Rejected(r) => panic!("expected confirmed outcome, got rejection: {:?}", r),
        }
    }
}
