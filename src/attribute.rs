//! Attribute value type (§3.2).
//!
//! A byte sequence with an optional syntax tag. UTF-8 strings are
//! represented by their byte encoding so binary and textual attributes
//! share one representation; equality is always byte-exact. Normalized
//! (matching-rule) equality is out of scope for this crate and is left
//! to an external matching-rule engine.

use std::fmt;

/// A single attribute value: raw bytes plus an optional syntax OID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeValue {
    bytes: Vec<u8>,
    syntax: Option<String>,
}

impl AttributeValue {
    /// Creates a value from raw bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            syntax: None,
        }
    }

    /// Creates a value from a UTF-8 string.
    pub fn from_str(s: impl AsRef<str>) -> Self {
        Self::from_bytes(s.as_ref().as_bytes().to_vec())
    }

    /// Attaches a syntax OID to this value.
    pub fn with_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    /// The raw byte encoding of this value.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The syntax OID, if known.
    pub fn syntax(&self) -> Option<&str> {
        self.syntax.as_deref()
    }

    /// Best-effort UTF-8 view of this value; binary attributes will
    /// return `None`.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "{}", s),
            None => write!(f, "{}", hex(&self.bytes)),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::from_str(s)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(b: Vec<u8>) -> Self {
        Self::from_bytes(b)
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_byte_exact() {
        assert_eq!(
            AttributeValue::from_str("caf\u{e9}"),
            AttributeValue::from_bytes("caf\u{e9}".as_bytes().to_vec())
        );
        assert_ne!(AttributeValue::from_str("a"), AttributeValue::from_str("A"));
    }

    #[test]
    fn binary_values_have_no_str_view() {
        let v = AttributeValue::from_bytes(vec![0xff, 0x00, 0x80]);
        assert_eq!(v.as_str(), None);
    }

    #[test]
    fn display_falls_back_to_hex_for_binary() {
        let v = AttributeValue::from_bytes(vec![0xde, 0xad]);
        assert_eq!(v.to_string(), "DEAD");
    }
}
