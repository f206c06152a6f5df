//! Sealing primitives for the generic protection path.
//!
//! Wraps AES-256-CBC with strong types. The key is derived by SHA-256
//! hashing the password, deliberately not a slow KDF, matching the
//! documented contract of the self-decrypting container (the container
//! must be able to re-derive the same key client side).

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{CoreError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// A 256-bit AES key derived from a password.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AesKey(pub [u8; 32]);

impl AesKey {
    /// Derive the key as SHA-256(password).
    pub fn derive(password: &str) -> Self {
        let digest = Sha256::digest(password.as_bytes());
        Self(digest.into())
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep key material out of debug logs.
        write!(f, "AesKey(****)")
    }
}

/// A 128-bit CBC initialization vector.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Iv(pub [u8; 16]);

impl Iv {
    /// Generate a random IV.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for Iv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iv(****)")
    }
}

/// Encrypt plaintext with AES-256-CBC and PKCS#7 padding.
pub fn encrypt(plaintext: &[u8], key: &AesKey, iv: &Iv) -> Vec<u8> {
    Aes256CbcEnc::new(key.as_bytes().into(), iv.as_bytes().into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt AES-256-CBC ciphertext.
///
/// Fails when the padding is invalid, which is the usual outcome of a
/// wrong password.
pub fn decrypt(ciphertext: &[u8], key: &AesKey, iv: &Iv) -> Result<Vec<u8>> {
    Aes256CbcDec::new(key.as_bytes().into(), iv.as_bytes().into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CoreError::DecryptFailed)
}

/// Seal bytes under a password: base64(IV || AES-256-CBC ciphertext).
pub fn seal(plaintext: &[u8], password: &str) -> String {
    let key = AesKey::derive(password);
    let iv = Iv::generate();

    let ciphertext = encrypt(plaintext, &key, &iv);

    let mut framed = Vec::with_capacity(16 + ciphertext.len());
    framed.extend_from_slice(iv.as_bytes());
    framed.extend_from_slice(&ciphertext);

    BASE64.encode(framed)
}

/// Open a sealed payload with a password.
pub fn open(payload: &str, password: &str) -> Result<Vec<u8>> {
    let framed = BASE64.decode(payload)?;
    if framed.len() < 16 {
        return Err(CoreError::Truncated(framed.len()));
    }

    let (iv_bytes, ciphertext) = framed.split_at(16);
    let mut iv = [0u8; 16];
    iv.copy_from_slice(iv_bytes);

    let key = AesKey::derive(password);
    decrypt(ciphertext, &key, &Iv::from_bytes(iv))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_derivation_is_deterministic() {
        let a = AesKey::derive("hunter2");
        let b = AesKey::derive("hunter2");
        assert_eq!(a, b);

        let c = AesKey::derive("hunter3");
        assert_ne!(a, c);
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let plaintext = b"the quick brown fox";
        let sealed = seal(plaintext, "correct horse");
        let opened = open(&sealed, "correct horse").unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_wrong_password_never_recovers_plaintext() {
        let plaintext = b"sensitive bytes";
        let sealed = seal(plaintext, "right");

        // Either a padding error or garbage, never the original.
        match open(&sealed, "wrong") {
            Err(CoreError::DecryptFailed) => {}
            Ok(bytes) => assert_ne!(bytes, plaintext),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let sealed = seal(b"", "pw");
        assert_eq!(open(&sealed, "pw").unwrap(), b"");
    }

    #[test]
    fn test_iv_is_fresh_per_seal() {
        let a = seal(b"same bytes", "pw");
        let b = seal(b"same bytes", "pw");
        assert_ne!(a, b);
    }

    #[test]
    fn test_open_rejects_truncated_payload() {
        let short = BASE64.encode([0u8; 8]);
        assert!(matches!(open(&short, "pw"), Err(CoreError::Truncated(8))));
    }

    #[test]
    fn test_open_rejects_invalid_base64() {
        assert!(matches!(
            open("not base64!!!", "pw"),
            Err(CoreError::Encoding(_))
        ));
    }
}
