//! Input sanitization applied to accepted submissions.

use std::sync::LazyLock;

use formguard_common::{FormState, SanitizedPayload};
use regex::Regex;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static SCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:javascript|vbscript|data):").expect("valid regex"));

fn sanitize_once(input: &str) -> String {
    let stripped = HTML_TAG.replace_all(input, "");
    let stripped = SCRIPT_SCHEME.replace_all(&stripped, "");
    stripped.trim().to_string()
}

/// Strip HTML tags and script URI schemes, then trim.
///
/// Repeats until nothing changes, so `sanitize(sanitize(s)) == sanitize(s)`
/// even for inputs like `<<b>script>` where one pass uncovers another tag.
pub fn sanitize(input: &str) -> String {
    let mut current = sanitize_once(input);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Sanitize the user-visible fields of a form independently
pub fn sanitize_form(form: &FormState) -> SanitizedPayload {
    SanitizedPayload {
        name: sanitize(&form.name),
        email: sanitize(&form.email),
        message: sanitize(&form.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_and_schemes() {
        assert_eq!(sanitize("  <b>Hello</b> world  "), "Hello world");
        assert_eq!(sanitize("JavaScript:alert(1)"), "alert(1)");
        assert_eq!(sanitize("data:text/html,hi"), "text/html,hi");
        assert_eq!(sanitize("vbscript:run"), "run");
        assert_eq!(sanitize("plain text"), "plain text");
    }

    #[test]
    fn test_nested_constructs_are_fully_removed() {
        assert_eq!(sanitize("javajavascript:script:x"), "x");
        assert_eq!(sanitize("<<b>script>boom"), "script>boom");
    }

    #[test]
    fn test_idempotent() {
        for input in [
            "  <b>Hello</b> world  ",
            "<<b>script>alert(1)</script>",
            "javajavascript:script: <i>x</i> ",
            "Hola, quiero más información.",
            " <  > data:data:: ",
            "",
        ] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_sanitize_form_leaves_honeypot_and_captcha_out() {
        let form = FormState {
            name: " Ana ".into(),
            email: "ana@example.com ".into(),
            message: "<p>Hola, quiero más información.</p>".into(),
            honeypot: String::new(),
            captcha_answer: "7".into(),
        };
        assert_eq!(
            sanitize_form(&form),
            SanitizedPayload {
                name: "Ana".into(),
                email: "ana@example.com".into(),
                message: "Hola, quiero más información.".into(),
            }
        );
    }
}
