//! Pluggable payload codec.
//!
//! Stores run transaction descriptions through a [`PayloadCodec`] on the way
//! into and out of storage. The production codec is a UTF-8 passthrough; the
//! seam exists so a deployment can layer an at-rest transform (compression,
//! encryption) under the store without touching ledger logic.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Transforms description payloads between their in-memory and stored forms.
///
/// `decode(encode(s))` must equal `s` for every string `s`.
pub trait PayloadCodec: Send + Sync {
    fn encode(&self, plain: &str) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, stored: &[u8]) -> Result<String, CodecError>;
}

/// Identity codec: descriptions are stored as their UTF-8 bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainCodec;

impl PayloadCodec for PlainCodec {
    fn encode(&self, plain: &str) -> Result<Vec<u8>, CodecError> {
        Ok(plain.as_bytes().to_vec())
    }

    fn decode(&self, stored: &[u8]) -> Result<String, CodecError> {
        String::from_utf8(stored.to_vec()).map_err(|e| CodecError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_codec_roundtrips_utf8() {
        let codec = PlainCodec;
        let stored = codec.encode("Transfer to 1002").unwrap();
        assert_eq!(stored, b"Transfer to 1002");
        assert_eq!(codec.decode(&stored).unwrap(), "Transfer to 1002");
    }

    #[test]
    fn plain_codec_handles_empty_payload() {
        let codec = PlainCodec;
        assert_eq!(codec.encode("").unwrap(), Vec::<u8>::new());
        assert_eq!(codec.decode(b"").unwrap(), "");
    }

    #[test]
    fn plain_codec_rejects_invalid_utf8() {
        let codec = PlainCodec;
        let err = codec.decode(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn codec_roundtrip_through_trait_object() {
        let codec: Box<dyn PayloadCodec> = Box::new(PlainCodec);
        let stored = codec.encode("café ☕").unwrap();
        assert_eq!(codec.decode(&stored).unwrap(), "café ☕");
    }
}
