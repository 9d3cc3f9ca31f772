//! One-time code generation.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Produces opaque, collision-unlikely codes.
pub trait CodeSource: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform random decimal codes of a fixed length.
#[derive(Debug, Clone)]
pub struct NumericCodeSource {
    length: usize,
}

impl NumericCodeSource {
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }
}

impl Default for NumericCodeSource {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CodeSource for NumericCodeSource {
    fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect()
    }
}

/// A freshly issued code. The plaintext leaves the process only through
/// the notifier; storage only ever sees its hash.
#[derive(Debug, Clone)]
pub struct OneTimeCode {
    pub code: String,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn codes_have_requested_length_and_digits_only() {
        let source = NumericCodeSource::new(8);
        let code = source.generate();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn zero_length_is_clamped() {
        assert_eq!(NumericCodeSource::new(0).generate().len(), 1);
    }

    #[test]
    fn expiry_is_exclusive() {
        let now = Utc::now();
        let code = OneTimeCode {
            code: "123456".into(),
            code_hash: String::new(),
            expires_at: now,
        };
        assert!(!code.is_expired_at(now));
        assert!(code.is_expired_at(now + Duration::milliseconds(1)));
    }
}
