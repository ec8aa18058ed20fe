//! Cryptographic helpers
//!
//! Registry keys are hashes of refresh tokens, so a leaked table never
//! yields a redeemable credential. Secret comparisons run in constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a token for storage.
///
/// SHA-256, hex encoded. The original token cannot be recovered from the hash.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time string comparison.
///
/// Length is not treated as secret: strings of different lengths return
/// `false` without inspecting content.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
