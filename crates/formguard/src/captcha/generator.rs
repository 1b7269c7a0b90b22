//! CAPTCHA challenge selection.

use formguard_common::CaptchaChallenge;
use rand::Rng;

/// Built-in question pool: (left operand, operator, right operand)
const DEFAULT_POOL: &[(i64, char, i64)] = &[
    (3, '+', 4),
    (5, '+', 2),
    (8, '-', 3),
    (6, '+', 6),
    (9, '-', 4),
    (2, '*', 3),
    (7, '+', 1),
    (10, '-', 7),
    (4, '*', 2),
    (1, '+', 8),
];

/// CAPTCHA generator service
#[derive(Debug, Clone)]
pub struct CaptchaGenerator {
    pool: Vec<CaptchaChallenge>,
}

impl CaptchaGenerator {
    fn new(pool: Vec<CaptchaChallenge>) -> Self {
        Self { pool }
    }

    /// Draw a challenge uniformly at random from the pool
    pub fn generate(&self) -> CaptchaChallenge {
        let idx = rand::rng().random_range(0..self.pool.len());
        let challenge = self.pool[idx].clone();

        tracing::debug!(question = %challenge.question, "Drew CAPTCHA challenge");

        challenge
    }
}

impl Default for CaptchaGenerator {
    fn default() -> Self {
        let pool = DEFAULT_POOL
            .iter()
            .map(|&(a, op, b)| {
                let answer = match op {
                    '+' => a + b,
                    '-' => a - b,
                    _ => a * b,
                };
                let symbol = if op == '*' { '×' } else { op };
                CaptchaChallenge::new(format!("What is {a} {symbol} {b}?"), answer)
            })
            .collect();
        Self::new(pool)
    }
}
