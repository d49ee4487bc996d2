//! Correlation keys.
//!
//! A key is the FNV-1a 32-bit hash of a message kind's identity bytes,
//! rendered as 8 lowercase hex digits. The universe of identities is small
//! and closed, so collision resistance beyond that set is not a concern.

use std::fmt;

use serde::Serialize;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Opaque key pairing a request with the reply of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash identity bytes into a correlation key. Total and deterministic.
pub fn fingerprint(identity: &[u8]) -> CorrelationKey {
    let hash = identity.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    CorrelationKey(hex::encode(hash.to_be_bytes()))
}
