//! SHA-256 password digests.
//!
//! Accounts never store plaintext passwords. At creation the password is
//! digested and only the digest is persisted; verification digests the
//! presented password and compares against the stored value.

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 digest of arbitrary data.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Turns a plaintext password into the digest stored on the account.
pub trait PasswordDigest: Send + Sync {
    fn digest(&self, password: &str) -> String;

    /// Whether `password` matches a previously stored digest.
    fn matches(&self, password: &str, stored: &str) -> bool {
        self.digest(password) == stored
    }
}

/// Production digest: SHA-256, hex encoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Digest;

impl PasswordDigest for Sha256Digest {
    fn digest(&self, password: &str) -> String {
        sha256_hex(password.as_bytes())
    }
}
