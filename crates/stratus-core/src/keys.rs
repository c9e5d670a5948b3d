//! Backup object-name derivation
//!
//! The index store is itself mirrored to the remote under a name derived
//! from the daemon master key, never from file content, so every daemon
//! instance holding the same key converges on the same backup slot:
//!
//! 1. Derive a 64-byte subkey from the master key (HKDF-SHA-512 with a
//!    fixed context label).
//! 2. Base64-encode the subkey and keep the first half of the encoding.
//! 3. Run argon2id over that half. The salt is derived from the subkey
//!    rather than drawn from an RNG: the whole derivation must be a pure
//!    function of the master key.
//! 4. Strip the PHC string through the third `$` delimiter and
//!    base64-encode the remainder (URL-safe, so the name is a single
//!    object-key path segment).

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hkdf::Hkdf;
use sha2::Sha512;

use crate::domain::DomainError;

/// Fixed context label for the subkey derivation
const BACKUP_KDF_CONTEXT: &[u8] = b"stratus-index-backup";

/// Length of the derived subkey in bytes
const SUBKEY_LEN: usize = 64;

/// Decode the hex-encoded master key from configuration.
pub fn master_key_from_hex(hex: &str) -> Result<Vec<u8>, DomainError> {
    if hex.is_empty() {
        return Err(DomainError::InvalidMasterKey(
            "master key is empty; set secret.master_key".to_string(),
        ));
    }
    if hex.len() % 2 != 0 {
        return Err(DomainError::InvalidMasterKey(
            "hex string has odd length".to_string(),
        ));
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let pair = &hex[i..i + 2];
        let byte = u8::from_str_radix(pair, 16)
            .map_err(|e| DomainError::InvalidMasterKey(format!("invalid hex '{pair}': {e}")))?;
        bytes.push(byte);
    }
    Ok(bytes)
}

/// Derive the remote object name the index store is backed up under.
///
/// Deterministic: the same master key always yields the same name, across
/// restarts and across daemon instances.
pub fn derive_backup_object_name(master_key: &[u8]) -> Result<String, DomainError> {
    // Step 1: fixed-context subkey
    let hk = Hkdf::<Sha512>::new(None, master_key);
    let mut subkey = [0u8; SUBKEY_LEN];
    hk.expand(BACKUP_KDF_CONTEXT, &mut subkey)
        .map_err(|e| DomainError::KeyDerivation(format!("hkdf expand: {e}")))?;

    // Step 2: first half of the base64 encoding
    let encoded = STANDARD.encode(subkey);
    let half = &encoded[..encoded.len() / 2];

    // Step 3: memory-hard hash with a subkey-derived salt
    let salt = SaltString::encode_b64(&subkey[..16])
        .map_err(|e| DomainError::KeyDerivation(format!("salt encoding: {e}")))?;
    let phc = Argon2::default()
        .hash_password(half.as_bytes(), &salt)
        .map_err(|e| DomainError::KeyDerivation(format!("argon2: {e}")))?
        .to_string();

    // Step 4: drop "$argon2id$v=19" (everything through the third '$'),
    // keep the parameter/salt/hash tail
    let third_dollar = phc
        .match_indices('$')
        .nth(2)
        .map(|(i, _)| i)
        .ok_or_else(|| DomainError::KeyDerivation(format!("unexpected PHC format: {phc}")))?;
    let tail = &phc[third_dollar + 1..];

    Ok(URL_SAFE_NO_PAD.encode(tail))
}
