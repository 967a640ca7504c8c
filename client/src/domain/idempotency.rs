//! Client-generated idempotency keys for mutating calls.

use std::fmt;

use uuid::Uuid;

/// Header carrying the key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// UUID v4 identifying one logical write.
///
/// A single key is generated per resource-method call and sent on every
/// attempt of that call, across retries and channel escalation, so the
/// server can collapse duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Generate a fresh key.
    pub fn random() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}
