//! Distinguished Name (DN) value type.
//!
//! A DN is an ordered sequence of RDNs, most-specific first (LDAP
//! canonical order). It is immutable once constructed; this module owns
//! parsing, RFC 4514 escaping, and the navigation primitives (`parent`,
//! `is_under`) the rename-dispatch and compose-name algorithms need.

use crate::errors::{CoreError, Result};
use std::fmt;

/// A single RDN component, e.g. `uid=test`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RdnComponent {
    /// Attribute type (e.g. "uid", "cn", "ou").
    pub attr_type: String,
    /// Attribute value, unescaped.
    pub attr_value: String,
}

impl RdnComponent {
    /// Creates a new RDN component.
    pub fn new(attr_type: impl Into<String>, attr_value: impl Into<String>) -> Self {
        Self {
            attr_type: attr_type.into(),
            attr_value: attr_value.into(),
        }
    }

    /// Parses an RDN component from string (e.g. "uid=test").
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.splitn(2, '=').collect();
        if parts.len() != 2 || parts[0].trim().is_empty() {
            return Err(CoreError::InvalidRdn(s.to_string()));
        }
        Ok(Self {
            attr_type: parts[0].trim().to_string(),
            attr_value: unescape_dn_value(parts[1].trim()),
        })
    }

    /// Case-insensitive comparison on both attribute type and value,
    /// used by the rename-dispatch algorithm (§4.2.3) to decide whether
    /// an RDN changed.
    pub fn eq_ignore_case(&self, other: &RdnComponent) -> bool {
        self.attr_type.eq_ignore_ascii_case(&other.attr_type)
            && self.attr_value.eq_ignore_ascii_case(&other.attr_value)
    }
}

impl fmt::Display for RdnComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.attr_type, escape_dn_value(&self.attr_value))
    }
}

/// A full Distinguished Name: RDN components from most-specific (the
/// RDN) to least-specific (the root).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DistinguishedName {
    /// RDN components, most-specific first.
    pub components: Vec<RdnComponent>,
}

impl DistinguishedName {
    /// Creates an empty DN (the root DSE).
    pub fn empty() -> Self {
        Self { components: vec![] }
    }

    /// Creates a DN from already-parsed components.
    pub fn from_components(components: Vec<RdnComponent>) -> Self {
        Self { components }
    }

    /// Parses a DN from its string form.
    pub fn parse(dn: &str) -> Result<Self> {
        if dn.trim().is_empty() {
            return Ok(Self::empty());
        }

        let parts = split_dn(dn);
        let components: Result<Vec<RdnComponent>> =
            parts.iter().map(|p| RdnComponent::parse(p)).collect();

        Ok(Self {
            components: components.map_err(|_| CoreError::InvalidDn(dn.to_string()))?,
        })
    }

    /// Returns the RDN (most-specific component).
    pub fn rdn(&self) -> Option<&RdnComponent> {
        self.components.first()
    }

    /// Returns the parent DN, or `None` for a single-component or
    /// empty DN.
    pub fn parent(&self) -> Option<Self> {
        if self.components.len() <= 1 {
            None
        } else {
            Some(Self {
                components: self.components[1..].to_vec(),
            })
        }
    }

    /// Returns true if `self` is equal to or a descendant of `base`.
    pub fn is_under(&self, base: &DistinguishedName) -> bool {
        if base.components.len() > self.components.len() {
            return false;
        }
        let offset = self.components.len() - base.components.len();
        self.components[offset..]
            .iter()
            .zip(&base.components)
            .all(|(a, b)| a.eq_ignore_case(b))
    }

    /// Number of RDN components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True for the root DSE (zero components).
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Canonical form: attribute type names lowercased, values
    /// untouched. Used for case-insensitive structural comparisons.
    pub fn to_canonical(&self) -> Self {
        Self {
            components: self
                .components
                .iter()
                .map(|c| RdnComponent {
                    attr_type: c.attr_type.to_lowercase(),
                    attr_value: c.attr_value.clone(),
                })
                .collect(),
        }
    }

    /// Composes a target name from this fully-qualified name and a
    /// configured prefix (§4.2.4): walk from head toward tail, dropping
    /// components until the head of the remainder matches the head of
    /// `prefix` (case-insensitive); return the dropped-off remainder.
    /// Fails with `PrefixNotAnAncestor` if `prefix` never matches.
    pub fn compose_relative_to(&self, prefix: &DistinguishedName) -> Result<DistinguishedName> {
        if prefix.is_empty() {
            return Ok(self.clone());
        }
        if !self.is_under(prefix) {
            return Err(CoreError::PrefixNotAnAncestor(format!(
                "{} is not an ancestor of {}",
                prefix, self
            )));
        }
        let keep = self.components.len() - prefix.components.len();
        Ok(DistinguishedName {
            components: self.components[..keep].to_vec(),
        })
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl TryFrom<&str> for DistinguishedName {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Builder for constructing a DN from parts without hand-joining
/// strings.
#[derive(Debug, Default)]
pub struct DnBuilder {
    components: Vec<RdnComponent>,
}

impl DnBuilder {
    /// Creates a new DN builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component to the DN.
    pub fn add(mut self, attr_type: impl Into<String>, attr_value: impl Into<String>) -> Self {
        self.components
            .push(RdnComponent::new(attr_type, attr_value));
        self
    }

    /// Appends a parsed base DN.
    pub fn base(mut self, base: &str) -> Self {
        if let Ok(dn) = DistinguishedName::parse(base) {
            self.components.extend(dn.components);
        }
        self
    }

    /// Builds the DN.
    pub fn build(self) -> DistinguishedName {
        DistinguishedName::from_components(self.components)
    }
}

/// Escapes special characters in a DN value per RFC 4514.
pub fn escape_dn_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len() * 2);

    for (i, c) in value.chars().enumerate() {
        match c {
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' | '=' => {
                result.push('\\');
                result.push(c);
            }
            ' ' if i == 0 || i == value.len() - 1 => {
                result.push('\\');
                result.push(c);
            }
            '#' if i == 0 => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Unescapes a DN value produced by `escape_dn_value` or received over
/// the wire.
pub fn unescape_dn_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            None => {
                result.push('\\');
                break;
            }
            Some(n1) if n1.is_ascii_hexdigit() => match chars.next() {
                Some(n2) if n2.is_ascii_hexdigit() => {
                    if let Ok(byte) = u8::from_str_radix(&format!("{}{}", n1, n2), 16) {
                        result.push(byte as char);
                    } else {
                        result.push(n1);
                        result.push(n2);
                    }
                }
                Some(n2) => {
                    result.push(n1);
                    result.push(n2);
                }
                None => result.push(n1),
            },
            Some(n1) => result.push(n1),
        }
    }

    result
}

/// Splits a DN string into its RDN components, honoring escaped commas.
fn split_dn(dn: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in dn.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == ',' {
            if !current.is_empty() {
                result.push(current.trim().to_string());
            }
            current = String::new();
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() {
        result.push(current.trim().to_string());
    }

    result
}
