//! Shared constants for FormGuard components.

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8890";

/// Default EmailJS REST endpoint
pub const DEFAULT_RELAY_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Name length bounds (in characters)
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;

/// Maximum email length (in characters)
pub const EMAIL_MAX_CHARS: usize = 100;

/// Message length bounds (in characters)
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 1000;

/// Maximum URL-like substrings allowed in a message
pub const MAX_MESSAGE_URLS: usize = 3;

/// Words longer than this are counted for repetition
pub const REPEATED_WORD_MIN_LEN: usize = 3;

/// Maximum occurrences of a single word in a message
pub const MAX_WORD_REPEATS: usize = 10;

/// Minimum time between session start and submit (seconds)
pub const MIN_FILL_SECS: i64 = 5;

/// Maximum session age before it is considered stale (30 minutes)
pub const MAX_SESSION_SECS: i64 = 1800;

/// Attempts allowed inside the rate-limit window
pub const MAX_ATTEMPTS_PER_WINDOW: u32 = 3;

/// Rate-limit window (10 minutes)
pub const RATE_WINDOW_SECS: i64 = 600;

/// Minimum spacing between two attempts (seconds)
pub const MIN_ATTEMPT_SPACING_SECS: i64 = 30;

/// Behavioral thresholds
pub const MIN_KEYSTROKES: u32 = 10;
pub const MIN_MOUSE_MOVES: u32 = 5;
pub const MIN_FIELD_FOCUS: u32 = 3;

/// Persistent store keys
pub mod store_keys {
    /// Key prefix: formguard:{client_hash}:
    pub const PREFIX: &str = "formguard:";

    /// Attempt counter suffix
    pub const ATTEMPT_COUNT: &str = "attempt_count";

    /// Last submit timestamp suffix (unix seconds)
    pub const LAST_SUBMIT: &str = "last_submit";
}

/// HTTP header names
pub mod headers {
    /// Stable client identifier used for submission history
    pub const X_CLIENT_ID: &str = "X-Client-Id";
}
