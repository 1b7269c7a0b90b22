//! The FormGuard engine.
//!
//! Decides whether a contact-form submission may be forwarded to the mail
//! relay. Anti-abuse checks run first and short-circuit; field validation
//! then runs in full so every invalid field is reported at once. Only a
//! submission that passes both is sanitized and returned.

mod sanitize;
mod validators;

use sanitize::sanitize_form;
use validators::{validate_fields, validate_payload};

use chrono::{DateTime, Duration, Utc};
use formguard_common::{
    CaptchaChallenge, FormState, GuardError, InteractionLog, SanitizedPayload, SecurityViolation,
    SubmissionHistory,
};

use crate::config::{BehaviorConfig, RateLimitConfig, TimingConfig};

/// Everything the guard looks at for one submission
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext<'a> {
    pub form: &'a FormState,
    pub challenge: &'a CaptchaChallenge,
    pub interactions: &'a InteractionLog,
    pub history: &'a SubmissionHistory,
    /// When the form session started
    pub started_at: DateTime<Utc>,
}

/// Contact-form gatekeeper
#[derive(Debug, Clone, Default)]
pub struct FormGuard {
    timing: TimingConfig,
    rate_limit: RateLimitConfig,
    behavior: BehaviorConfig,
}

impl FormGuard {
    pub fn new(timing: TimingConfig, rate_limit: RateLimitConfig, behavior: BehaviorConfig) -> Self {
        Self {
            timing,
            rate_limit,
            behavior,
        }
    }

    /// Window over which attempts are counted
    pub fn rate_window(&self) -> Duration {
        Duration::seconds(self.rate_limit.window_secs)
    }

    /// Evaluate a submission at time `now`.
    ///
    /// Returns the sanitized payload only if every check passes.
    pub fn evaluate(
        &self,
        ctx: &SubmissionContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<SanitizedPayload, GuardError> {
        if let Err(violation) = self.check_security(ctx, now) {
            tracing::warn!(
                violation = %violation,
                elapsed_secs = (now - ctx.started_at).num_seconds(),
                attempts = ctx.history.attempt_count,
                "Submission rejected by security check"
            );
            return Err(GuardError::Security(violation));
        }

        let errors = validate_fields(ctx.form, ctx.challenge);
        if !errors.is_empty() {
            tracing::debug!(fields = %errors, "Submission rejected by field validation");
            return Err(GuardError::Field(errors));
        }

        let payload = sanitize_form(ctx.form);
        let errors = validate_payload(&payload);
        if !errors.is_empty() {
            tracing::debug!(fields = %errors, "Submission rejected after sanitization");
            return Err(GuardError::Field(errors));
        }

        Ok(payload)
    }

    fn check_security(
        &self,
        ctx: &SubmissionContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<(), SecurityViolation> {
        Self::check_honeypot(ctx.form)?;
        self.check_rate_limit(ctx.history, now)?;
        self.check_timing(ctx.started_at, now)?;
        self.check_behavior(ctx.interactions)
    }

    pub fn check_honeypot(form: &FormState) -> Result<(), SecurityViolation> {
        if form.honeypot.is_empty() {
            Ok(())
        } else {
            Err(SecurityViolation::Honeypot)
        }
    }

    pub fn check_rate_limit(
        &self,
        history: &SubmissionHistory,
        now: DateTime<Utc>,
    ) -> Result<(), SecurityViolation> {
        if history.attempts_in_window(now, self.rate_window()) >= self.rate_limit.max_attempts {
            return Err(SecurityViolation::TooManyAttempts);
        }
        if let Some(since) = history.since_last(now) {
            if since < Duration::seconds(self.rate_limit.min_spacing_secs) {
                return Err(SecurityViolation::TooFrequent);
            }
        }
        Ok(())
    }

    pub fn check_timing(
        &self,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), SecurityViolation> {
        let elapsed = now - started_at;
        if elapsed < Duration::seconds(self.timing.min_fill_secs) {
            return Err(SecurityViolation::TooFast);
        }
        if elapsed > Duration::seconds(self.timing.max_session_secs) {
            return Err(SecurityViolation::SessionExpired);
        }
        Ok(())
    }

    pub fn check_behavior(&self, log: &InteractionLog) -> Result<(), SecurityViolation> {
        let enough = log.keystrokes >= self.behavior.min_keystrokes
            && log.mouse_moves >= self.behavior.min_mouse_moves
            && log.field_focus_count >= self.behavior.min_field_focus;
        if enough {
            Ok(())
        } else {
            Err(SecurityViolation::Behavior)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formguard_common::FormField;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn ana_form() -> FormState {
        FormState {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            message: "Hola, quiero más información.".into(),
            honeypot: String::new(),
            captcha_answer: "7".into(),
        }
    }

    fn active_log() -> InteractionLog {
        InteractionLog {
            keystrokes: 15,
            mouse_moves: 8,
            field_focus_count: 4,
            ..Default::default()
        }
    }

    struct Fixture {
        form: FormState,
        challenge: CaptchaChallenge,
        log: InteractionLog,
        history: SubmissionHistory,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                form: ana_form(),
                challenge: CaptchaChallenge::new("What is 3 + 4?", 7),
                log: active_log(),
                history: SubmissionHistory::default(),
            }
        }

        fn evaluate_after(&self, elapsed_secs: i64) -> Result<SanitizedPayload, GuardError> {
            let ctx = SubmissionContext {
                form: &self.form,
                challenge: &self.challenge,
                interactions: &self.log,
                history: &self.history,
                started_at: at(0),
            };
            FormGuard::default().evaluate(&ctx, at(elapsed_secs))
        }
    }

    fn violation(result: Result<SanitizedPayload, GuardError>) -> SecurityViolation {
        match result {
            Err(GuardError::Security(v)) => v,
            other => panic!("expected security error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        let payload = Fixture::new().evaluate_after(10).unwrap();
        assert_eq!(payload.name, "Ana");
        assert_eq!(payload.email, "ana@example.com");
        assert_eq!(payload.message, "Hola, quiero más información.");
    }

    #[test]
    fn test_too_fast() {
        let v = violation(Fixture::new().evaluate_after(2));
        assert_eq!(v, SecurityViolation::TooFast);
        assert_eq!(v.describe(), "submitted too fast");
    }

    #[test]
    fn test_stale_session() {
        assert!(Fixture::new().evaluate_after(1800).is_ok());
        assert_eq!(
            violation(Fixture::new().evaluate_after(1801)),
            SecurityViolation::SessionExpired
        );
    }

    #[test]
    fn test_honeypot_rejects_otherwise_valid_form() {
        let mut fixture = Fixture::new();
        fixture.form.honeypot = "http://spam.example".into();
        assert_eq!(violation(fixture.evaluate_after(10)), SecurityViolation::Honeypot);
    }

    #[test]
    fn test_rate_limit_with_correct_captcha() {
        let mut fixture = Fixture::new();
        fixture.history = SubmissionHistory {
            attempt_count: 3,
            last_submit: Some(at(-120)),
        };
        assert_eq!(
            violation(fixture.evaluate_after(10)),
            SecurityViolation::TooManyAttempts
        );
    }

    #[test]
    fn test_rate_limit_window_expires() {
        let mut fixture = Fixture::new();
        fixture.history = SubmissionHistory {
            attempt_count: 3,
            last_submit: Some(at(-700)),
        };
        assert!(fixture.evaluate_after(10).is_ok());
    }

    #[test]
    fn test_attempts_too_close_together() {
        let mut fixture = Fixture::new();
        fixture.history = SubmissionHistory {
            attempt_count: 1,
            last_submit: Some(at(-10)),
        };
        assert_eq!(violation(fixture.evaluate_after(10)), SecurityViolation::TooFrequent);
    }

    #[test]
    fn test_behavior_thresholds() {
        for log in [
            InteractionLog { keystrokes: 9, ..active_log() },
            InteractionLog { mouse_moves: 4, ..active_log() },
            InteractionLog { field_focus_count: 2, ..active_log() },
        ] {
            let mut fixture = Fixture::new();
            fixture.log = log;
            assert_eq!(violation(fixture.evaluate_after(10)), SecurityViolation::Behavior);
        }
    }

    #[test]
    fn test_field_errors_reported_together() {
        let mut fixture = Fixture::new();
        fixture.form.message = "<script>alert(1)</script>".into();
        fixture.form.captcha_answer = "8".into();
        match fixture.evaluate_after(10) {
            Err(GuardError::Field(errors)) => {
                assert!(errors.contains(FormField::Message));
                assert!(errors.contains(FormField::Captcha));
                assert!(!errors.contains(FormField::Name));
            }
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn test_markup_only_message_is_rejected() {
        let mut fixture = Fixture::new();
        fixture.form.message = "<p></p><p></p>".into();
        match fixture.evaluate_after(10) {
            Err(GuardError::Field(errors)) => {
                assert_eq!(errors.get(FormField::Message), Some("Message is required"));
            }
            other => panic!("expected field errors, got {other:?}"),
        }

        fixture.form.message = "<b>Hola</b> <i>ok</i>".into();
        match fixture.evaluate_after(10) {
            Err(GuardError::Field(errors)) => assert_eq!(
                errors.get(FormField::Message),
                Some("Message must be at least 10 characters")
            ),
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn test_security_checked_before_fields() {
        let mut fixture = Fixture::new();
        fixture.form.email = "<bad>".into();
        fixture.form.honeypot = "x".into();
        assert_eq!(violation(fixture.evaluate_after(10)), SecurityViolation::Honeypot);
    }
}
