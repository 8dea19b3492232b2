//! Rendering a [`Filter`] back to text: the canonical RFC 4515 wire form
//! (§4.1.4) and the RFC 4512 §2.5.2 refinement form (§4.1.5).

use super::Filter;
use crate::attribute::AttributeValue;
use crate::errors::{CoreError, Result};

/// Renders `node` to its canonical RFC 4515 string form.
///
/// When a node carries a `count` annotation, its rendering is followed
/// by `[N] ` (decimal, trailing space) — a diagnostic convention used
/// by EXPLAIN-like tooling. Nodes without a `count` annotation render
/// with no suffix at all, so a tree with no annotations anywhere
/// round-trips to plain RFC 4515 text with nothing further to strip.
pub fn render(node: &Filter) -> String {
    let core = render_core(node);
    match node.annotations().count {
        Some(n) => format!("{}[{}] ", core, n),
        None => core,
    }
}

fn render_core(node: &Filter) -> String {
    match node {
        Filter::Equality { attribute, value, .. } => {
            format!("({}={})", attribute, escape_filter_value(value))
        }
        Filter::Greater { attribute, value, .. } => {
            format!("({}>={})", attribute, escape_filter_value(value))
        }
        Filter::Less { attribute, value, .. } => {
            format!("({}<={})", attribute, escape_filter_value(value))
        }
        Filter::Approx { attribute, value, .. } => {
            format!("({}~={})", attribute, escape_filter_value(value))
        }
        Filter::Presence { attribute, .. } => format!("({}=*)", attribute),
        Filter::Substring {
            attribute,
            components,
            ..
        } => {
            let mut s = format!("({}=", attribute);
            if let Some(initial) = &components.initial {
                s.push_str(&escape_filter_value(initial));
            }
            s.push('*');
            for any in &components.anys {
                s.push_str(&escape_filter_value(any));
                s.push('*');
            }
            if let Some(r#final) = &components.r#final {
                s.push_str(&escape_filter_value(r#final));
            }
            s.push(')');
            s
        }
        Filter::Extensible {
            attribute,
            value,
            matching_rule_id,
            dn_attributes,
            ..
        } => {
            let mut s = String::from("(");
            if let Some(attr) = attribute {
                s.push_str(attr);
            }
            if *dn_attributes {
                s.push_str(":dn");
            }
            if let Some(rule) = matching_rule_id {
                s.push(':');
                s.push_str(rule);
            }
            s.push_str(":=");
            s.push_str(&escape_filter_value(value));
            s.push(')');
            s
        }
        Filter::And { children, .. } => render_branch('&', children),
        Filter::Or { children, .. } => render_branch('|', children),
        Filter::Not { child, .. } => format!("(!{})", render(child)),
    }
}

fn render_branch(op: char, children: &[Filter]) -> String {
    let mut s = String::new();
    s.push('(');
    s.push(op);
    for child in children {
        s.push_str(&render(child));
    }
    s.push(')');
    s
}

/// Escapes an attribute value for use inside an RFC 4515 filter string.
/// Each byte of the value is considered individually: the literal
/// characters `(`, `)`, `*`, `\`, and NUL, plus any non-printable byte,
/// are escaped as `\HH` (two uppercase hex digits); everything else
/// (printable ASCII) passes through unchanged.
pub fn escape_filter_value(value: &AttributeValue) -> String {
    let bytes = value.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' | b')' | b'*' | b'\\' | 0x00 => push_escaped(&mut out, b),
            0x20..=0x7e => out.push(b as char),
            _ => push_escaped(&mut out, b),
        }
    }
    out
}

fn push_escaped(out: &mut String, byte: u8) {
    out.push('\\');
    out.push_str(&format!("{:02X}", byte));
}

/// Renders `node` as an RFC 4512 §2.5.2 subtree-specification
/// refinement. Only `And`, `Or`, `Not`, and `Equality` on an
/// (case-insensitive) `objectClass` attribute are refinable; any other
/// node fails with [`CoreError::NotRefinable`].
pub fn render_refinement(node: &Filter) -> Result<String> {
    match node {
        Filter::Equality { attribute, value, .. } if attribute.eq_ignore_ascii_case("objectClass") => {
            Ok(format!("item: {}", value))
        }
        Filter::And { children, .. } => {
            let inner = children
                .iter()
                .map(render_refinement)
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            Ok(format!("and: {{ {} }}", inner))
        }
        Filter::Or { children, .. } => {
            let inner = children
                .iter()
                .map(render_refinement)
                .collect::<Result<Vec<_>>>()?
                .join(", ");
            Ok(format!("or: {{ {} }}", inner))
        }
        Filter::Not { child, .. } => Ok(format!("not: {}", render_refinement(child)?)),
        other => Err(CoreError::NotRefinable(format!(
            "{} is not a refinable node",
            other.kind_name()
        ))),
    }
}
