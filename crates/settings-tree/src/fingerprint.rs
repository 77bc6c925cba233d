//! Document fingerprints
//!
//! Provides [`Fingerprint`], a Blake3 digest of a tree's canonical text
//! rendering. Two trees with equal fingerprints render identically.

use std::fmt::{self, Display, Formatter};

/// A 32-byte Blake3 digest of a rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Compute the fingerprint of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// Hex in human-readable formats, raw bytes otherwise
impl serde::Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_compute_deterministic() {
        let a = Fingerprint::compute(b"<config />");
        let b = Fingerprint::compute(b"<config />");
        assert_eq!(a, b);
        assert_ne!(a, Fingerprint::compute(b"<config>1</config>"));
    }

    #[test]
    fn fingerprint_display_is_full_hex() {
        let fp = Fingerprint::compute(b"settings");
        let text = fp.to_string();
        assert_eq!(text.len(), 64);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_short_is_prefix() {
        let fp = Fingerprint::compute(b"settings");
        assert_eq!(fp.short().len(), 16);
        assert!(fp.to_string().starts_with(&fp.short()));
    }

    #[test]
    fn fingerprint_serializes_as_hex_string() {
        let fp = Fingerprint::compute(b"settings");
        let json = serde_json::to_value(fp).unwrap();
        assert_eq!(json, serde_json::Value::String(fp.to_string()));
    }
}
