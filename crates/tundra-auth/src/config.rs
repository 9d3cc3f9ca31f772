//! Credential gate configuration.

/// Configuration for the credential gate.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Optional pepper prepended to secrets before Argon2id hashing and
    /// verification.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement.
    pub min_password_length: usize,
    /// Number of digits in a one-time code (default: 6).
    pub one_time_code_length: usize,
    /// One-time code lifetime in seconds (default: 600 = 10 minutes).
    pub one_time_code_lifetime_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pepper: None,
            min_password_length: 8,
            one_time_code_length: 6,
            one_time_code_lifetime_secs: 600,
        }
    }
}
