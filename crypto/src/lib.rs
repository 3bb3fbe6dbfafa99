//! Cryptographic collaborators for the teller ledger.
//!
//! - **SHA-256** for password digests (stored as lowercase hex, never the
//!   plaintext)
//! - A pluggable [`PayloadCodec`] seam for transforming record payloads on
//!   their way into and out of a store
//!
//! Both collaborators are traits so stores can be constructed with
//! substitutes in tests.

pub mod codec;
pub mod password;

pub use codec::{CodecError, PayloadCodec, PlainCodec};
pub use password::{sha256_hex, PasswordDigest, Sha256Digest};
