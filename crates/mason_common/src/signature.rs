//! Content signatures for the up-to-date decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, order-sensitive content fingerprint for one node.
///
/// A signature is derived from a node's own signature-form text followed by
/// the signatures of its dependencies in declared order. The concatenation is
/// not commutative: two nodes with the same raw content but differently
/// ordered dependencies produce different signatures.
///
/// Signatures are compared for exact equality only; no timestamps or
/// filesystem state participate.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    /// Creates a signature from already-assembled signature-form text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the signature text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the signature text in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the signature text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:?})", self.0)
    }
}

impl From<&str> for Signature {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl From<String> for Signature {
    fn from(text: String) -> Self {
        Self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_roundtrips() {
        let sig = Signature::from_text("worldhello");
        assert_eq!(sig.as_str(), "worldhello");
        assert_eq!(sig.len(), 10);
        assert!(!sig.is_empty());
    }

    #[test]
    fn equality_is_exact() {
        assert_eq!(Signature::from_text("hello"), Signature::from_text("hello"));
        assert_ne!(Signature::from_text("hello"), Signature::from_text("HELLO"));
    }

    #[test]
    fn concatenation_order_matters() {
        let ab = Signature::from_text(format!("{}{}", "a", "b"));
        let ba = Signature::from_text(format!("{}{}", "b", "a"));
        assert_ne!(ab, ba);
    }

    #[test]
    fn display_is_plain_text() {
        let sig = Signature::from_text("hello");
        assert_eq!(format!("{sig}"), "hello");
    }

    #[test]
    fn debug_is_quoted() {
        let sig = Signature::from_text("hello");
        assert_eq!(format!("{sig:?}"), "Signature(\"hello\")");
    }

    #[test]
    fn serde_roundtrip_is_transparent() {
        let sig = Signature::from_text("worldhello");
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, "\"worldhello\"");
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, back);
    }
}
