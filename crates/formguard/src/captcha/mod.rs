//! Arithmetic CAPTCHA: a fixed pool of questions drawn at random, and the
//! answer check used by the field validators.

mod generator;
mod verifier;

pub use generator::CaptchaGenerator;
pub use verifier::CaptchaVerifier;
