//! CAPTCHA answer verification.

use formguard_common::CaptchaChallenge;

/// CAPTCHA verifier
pub struct CaptchaVerifier;

impl CaptchaVerifier {
    /// Check a typed answer against the challenge.
    ///
    /// Surrounding whitespace is ignored; anything that does not parse as an
    /// integer is rejected.
    pub fn verify(challenge: &CaptchaChallenge, answer: &str) -> Result<(), &'static str> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err("Please answer the security question");
        }
        let value: i64 = answer.parse().map_err(|_| "Answer must be a number")?;
        if value != challenge.expected_answer {
            return Err("Incorrect answer, please try again");
        }
        Ok(())
    }
}
