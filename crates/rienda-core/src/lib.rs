//! Core domain types for the Rienda equestrian academy backend
//!
//! This crate holds everything the business services and the storage layer
//! share: the domain models, the closed role/status enums and their policy
//! methods, calendar math, the clock abstraction, the unified error and
//! rejection types, configuration, and the repository traits.

pub mod clock;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::{AppError, AppResult, Outcome, Rejection, RejectionReason};
