//! # FormGuard Common
//!
//! Shared types, errors, and constants used across FormGuard components.
//!
//! ## Modules
//! - `types` - Form data model (FormState, CaptchaChallenge, InteractionLog, etc.)
//! - `error` - Guard error taxonomy
//! - `constants` - Default thresholds and storage keys

pub mod constants;
pub mod error;
pub mod types;

pub use error::{FieldErrors, GuardError, SecurityViolation};
pub use types::*;
