//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for the two hash kinds the index is keyed by.
//! Both are 64-character lowercase hex strings (SHA-256 digests), validated
//! at construction time so the rest of the system never has to re-check.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Expected length of a hex-encoded SHA-256 digest
pub const HASH_HEX_LEN: usize = 64;

fn validate_hex(value: &str) -> Result<(), DomainError> {
    if value.len() != HASH_HEX_LEN {
        return Err(DomainError::InvalidHash(format!(
            "expected {} characters, got {}",
            HASH_HEX_LEN,
            value.len()
        )));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    {
        return Err(DomainError::InvalidHash(format!(
            "expected lowercase hex: {value}"
        )));
    }
    Ok(())
}

// ============================================================================
// PathHash
// ============================================================================

/// Stable identifier hash of an absolute path
///
/// Content-independent: every version of the same path shares one
/// `PathHash`. Doubles as the remote object name for that path's uploads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathHash(String);

impl PathHash {
    /// Create a `PathHash` from a hex string, validating the format
    pub fn new(value: String) -> Result<Self, DomainError> {
        validate_hex(&value)?;
        Ok(Self(value))
    }

    /// The hex string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PathHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ContentHash
// ============================================================================

/// Hash of a file's byte contents at the moment a version was recorded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Create a `ContentHash` from a hex string, validating the format
    pub fn new(value: String) -> Result<Self, DomainError> {
        validate_hex(&value)?;
        Ok(Self(value))
    }

    /// The hex string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_path_hash_valid() {
        let hash = PathHash::new(VALID.to_string()).unwrap();
        assert_eq!(hash.as_str(), VALID);
        assert_eq!(hash.to_string(), VALID);
    }

    #[test]
    fn test_path_hash_rejects_short() {
        assert!(matches!(
            PathHash::new("abc123".to_string()),
            Err(DomainError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_path_hash_rejects_uppercase() {
        let upper = VALID.to_uppercase();
        assert!(PathHash::new(upper).is_err());
    }

    #[test]
    fn test_path_hash_rejects_non_hex() {
        let bad = "z".repeat(HASH_HEX_LEN);
        assert!(PathHash::new(bad).is_err());
    }

    #[test]
    fn test_content_hash_valid() {
        let hash = ContentHash::new(VALID.to_string()).unwrap();
        assert_eq!(hash.as_str(), VALID);
    }

    #[test]
    fn test_hashes_are_distinct_types() {
        // PathHash and ContentHash never compare across types; this just
        // pins down that both accept the same wire format.
        let p = PathHash::new(VALID.to_string()).unwrap();
        let c = ContentHash::new(VALID.to_string()).unwrap();
        assert_eq!(p.as_str(), c.as_str());
    }
}
