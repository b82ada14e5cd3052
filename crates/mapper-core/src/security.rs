//! Credential hygiene
//!
//! Tokens handed to the secret store live in a `SecureString`: zeroed on drop
//! and never printed by `Debug` or `Display`.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string that is automatically zeroed on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Borrow the plaintext. Only hand this to the component that needs it.
    pub fn expose(&self) -> &str {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString([REDACTED {} bytes])", self.len())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string_expose() {
        let token = SecureString::new("eyJhbGciOi");
        assert_eq!(token.expose(), "eyJhbGciOi");
        assert_eq!(token.len(), 10);
        assert!(!token.is_empty());
    }

    #[test]
    fn test_secure_string_debug() {
        let token = SecureString::from("sa-jwt-value".to_string());
        let debug_str = format!("{:?}", token);

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("sa-jwt-value"));
    }

    #[test]
    fn test_secure_string_display() {
        let token = SecureString::from("sa-jwt-value");
        assert_eq!(token.to_string(), "[REDACTED]");
    }
}
