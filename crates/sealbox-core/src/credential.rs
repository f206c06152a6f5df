//! Per-file credentials.
//!
//! Every uploaded file gets a generated password that the recipient must
//! supply before the content is released. The credential is stored
//! cleartext on the server: it is the file's access token, shared with
//! recipients out of band, not a login secret to be hashed.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()-_=+";

/// Generated password length.
pub const CREDENTIAL_LEN: usize = 10;

/// A per-file password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential(String);

impl Credential {
    /// Generate a random credential.
    ///
    /// The result is 10 characters and contains at least one lowercase
    /// letter, one uppercase letter, one digit, and one symbol. The
    /// remaining characters are drawn uniformly from the full alphabet,
    /// then the whole string is shuffled so the class guarantees don't
    /// leak into character position.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;

        let mut chars: Vec<u8> = vec![
            LOWER[rng.gen_range(0..LOWER.len())],
            UPPER[rng.gen_range(0..UPPER.len())],
            DIGITS[rng.gen_range(0..DIGITS.len())],
            SYMBOLS[rng.gen_range(0..SYMBOLS.len())],
        ];

        let full: Vec<u8> = [LOWER, UPPER, DIGITS, SYMBOLS].concat();
        while chars.len() < CREDENTIAL_LEN {
            chars.push(full[rng.gen_range(0..full.len())]);
        }

        chars.shuffle(&mut rng);

        // The alphabet is ASCII, so this cannot fail.
        Self(String::from_utf8(chars).expect("credential alphabet is ASCII"))
    }

    /// Wrap an existing password string (e.g. loaded from storage).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Exact-equality check against a supplied password.
    pub fn matches(&self, supplied: &str) -> bool {
        self.0 == supplied
    }

    /// Expose the cleartext password.
    ///
    /// Needed at upload time (returned to the uploader exactly once) and
    /// by the generic container, which embeds it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keep passwords out of debug logs.
        write!(f, "Credential(****)")
    }
}
