//! Field validators for the contact form.
//!
//! Each validator returns the user-facing message for the first rule the
//! input breaks.

use std::collections::HashMap;
use std::sync::LazyLock;

use formguard_common::constants::{
    EMAIL_MAX_CHARS, MAX_MESSAGE_URLS, MAX_WORD_REPEATS, MESSAGE_MAX_CHARS, MESSAGE_MIN_CHARS,
    NAME_MAX_CHARS, NAME_MIN_CHARS, REPEATED_WORD_MIN_LEN,
};
use formguard_common::{CaptchaChallenge, FieldErrors, FormField, FormState, SanitizedPayload};
use regex::Regex;

use crate::captcha::CaptchaVerifier;

pub type FieldResult = Result<(), &'static str>;

static SCRIPT_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)javascript|vbscript|data:|\bscript\b|\bon[a-z]+\s*=").expect("valid regex")
});

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(?:\.[^\s@.]+)+$").expect("valid regex"));

static URL_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("valid regex"));

/// Markup and script patterns never allowed in a message body
static MESSAGE_BLOCKLIST: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<\s*/?\s*(?:script|iframe|object|embed|form|input)\b",
        r"(?i)\b(?:javascript|vbscript)\s*:",
        r"(?i)\bdata:\s*[a-z]+/",
        r"(?i)\bon[a-z]+\s*=",
        r"(?i)\b(?:eval|alert|confirm|prompt)\s*\(",
        r"(?i)\b(?:document|window)\.[a-z_]",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

fn has_markup(value: &str) -> bool {
    value.contains('<') || value.contains('>') || SCRIPT_LIKE.is_match(value)
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '\u{2019}')
}

pub fn validate_name(name: &str) -> FieldResult {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required");
    }
    if has_markup(name) {
        return Err("Name contains disallowed content");
    }
    let len = name.chars().count();
    if len < NAME_MIN_CHARS {
        return Err("Name must be at least 2 characters");
    }
    if len > NAME_MAX_CHARS {
        return Err("Name must be at most 100 characters");
    }
    if !name.chars().all(is_name_char) {
        return Err("Name may only contain letters, spaces, hyphens and apostrophes");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> FieldResult {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required");
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err("Email must be at most 100 characters");
    }
    if has_markup(email) {
        return Err("Email contains disallowed content");
    }
    if !EMAIL_SHAPE.is_match(email) {
        return Err("Please enter a valid email address");
    }
    Ok(())
}

pub fn validate_message(message: &str) -> FieldResult {
    let message = message.trim();
    if message.is_empty() {
        return Err("Message is required");
    }
    let len = message.chars().count();
    if len < MESSAGE_MIN_CHARS {
        return Err("Message must be at least 10 characters");
    }
    if len > MESSAGE_MAX_CHARS {
        return Err("Message must be at most 1000 characters");
    }
    if MESSAGE_BLOCKLIST.iter().any(|re| re.is_match(message)) {
        return Err("Message contains disallowed content");
    }
    if URL_LIKE.find_iter(message).count() > MAX_MESSAGE_URLS {
        return Err("Message contains too many links");
    }
    if has_excessive_repetition(message) {
        return Err("Message contains too much repeated text");
    }
    Ok(())
}

/// True when any word of 3+ characters appears more than the allowed
/// number of times (case-insensitive)
fn has_excessive_repetition(message: &str) -> bool {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in message
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= REPEATED_WORD_MIN_LEN)
    {
        let count = counts.entry(word.to_lowercase()).or_default();
        *count += 1;
        if *count > MAX_WORD_REPEATS {
            return true;
        }
    }
    false
}

/// Run every field validator and collect all failures
pub fn validate_fields(form: &FormState, challenge: &CaptchaChallenge) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let checks = [
        (FormField::Name, validate_name(&form.name)),
        (FormField::Email, validate_email(&form.email)),
        (FormField::Message, validate_message(&form.message)),
        (
            FormField::Captcha,
            CaptchaVerifier::verify(challenge, &form.captcha_answer),
        ),
    ];
    for (field, result) in checks {
        if let Err(message) = result {
            errors.add(field, message);
        }
    }
    errors
}

/// Re-check cleaned content. Sanitization only removes text, so markup-only
/// input can fall below the minimum lengths after it passed on the raw form.
pub fn validate_payload(payload: &SanitizedPayload) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let checks = [
        (FormField::Name, validate_name(&payload.name)),
        (FormField::Email, validate_email(&payload.email)),
        (FormField::Message, validate_message(&payload.message)),
    ];
    for (field, result) in checks {
        if let Err(message) = result {
            errors.add(field, message);
        }
    }
    errors
}
