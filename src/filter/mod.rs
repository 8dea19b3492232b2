//! The LDAPv3 search-filter expression tree (RFC 4515/4512 §2.5.2).
//!
//! A [`Filter`] is a value-like tree: branch nodes exclusively own their
//! children, there is no sharing and no cycles, and a tree is immutable
//! once built (rewrites produce new trees, see the crate-level docs on
//! the optimizer seam). Every node additionally carries an
//! [`Annotations`] side-table that participates in neither equality nor
//! hashing (§4.1.3) — it exists purely for optimizer/diagnostic
//! metadata such as selectivity counts.

pub mod render;
pub mod visitor;

use crate::attribute::AttributeValue;
use crate::errors::{CoreError, Result};
use std::collections::HashMap;

pub use visitor::FilterVisitor;

/// An opaque annotation value. Mirrors the donor's "boxed scalar"
/// convention for ad hoc metadata maps, but as a closed enum rather
/// than `dyn Any` — the only extensible data a filter tree carries is
/// diagnostic, so a small closed set of scalar kinds is sufficient and
/// keeps annotations `Clone`/`PartialEq` for free.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// A string-valued annotation.
    Str(String),
    /// An integer-valued annotation.
    Int(i64),
    /// A boolean-valued annotation.
    Bool(bool),
}

/// Per-node metadata. The `"count"` key is reserved (§3.3) for
/// optimizer-supplied selectivity estimates and gets a dedicated field
/// per the redesign note in spec §9; anything else lands in `extra`.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    /// Optimizer-estimated selectivity: how many entries this subfilter
    /// is expected to match. Influences canonical rendering (§4.1.4).
    pub count: Option<u64>,
    /// Escape hatch for rare, non-`count` annotations.
    pub extra: HashMap<String, AnnotationValue>,
}

impl Annotations {
    /// An empty annotation set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns annotations with `count` set, builder-style.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Inserts an arbitrary key/value pair. Inserting under the
    /// reserved key `"count"` is routed to the dedicated field instead.
    pub fn insert(&mut self, key: impl Into<String>, value: AnnotationValue) {
        let key = key.into();
        if key == "count" {
            if let AnnotationValue::Int(n) = value {
                self.count = Some(n.max(0) as u64);
            }
        } else {
            self.extra.insert(key, value);
        }
    }
}

/// A single substring component ordering: `initial*any1*any2*...*final`,
/// with each component optional except that at least one must be
/// present (§3.3).
#[derive(Debug, Clone)]
pub struct SubstringComponents {
    /// The leading fixed fragment, if any.
    pub initial: Option<AttributeValue>,
    /// Ordered middle fragments.
    pub anys: Vec<AttributeValue>,
    /// The trailing fixed fragment, if any.
    pub r#final: Option<AttributeValue>,
}

/// A node in the filter expression tree (§3.3).
///
/// Branch nodes (`And`, `Or`, `Not`) exclusively own their children.
/// Every variant carries its own [`Annotations`]; equality and hashing
/// ignore annotations entirely (§4.1.3).
#[derive(Debug, Clone)]
pub enum Filter {
    /// `(attr=value)`
    Equality {
        attribute: String,
        value: AttributeValue,
        annotations: Annotations,
    },
    /// `(attr>=value)`
    Greater {
        attribute: String,
        value: AttributeValue,
        annotations: Annotations,
    },
    /// `(attr<=value)`
    Less {
        attribute: String,
        value: AttributeValue,
        annotations: Annotations,
    },
    /// `(attr~=value)`
    Approx {
        attribute: String,
        value: AttributeValue,
        annotations: Annotations,
    },
    /// `(attr=*)`
    Presence {
        attribute: String,
        annotations: Annotations,
    },
    /// `(attr=init*any1*any2*final)`
    Substring {
        attribute: String,
        components: SubstringComponents,
        annotations: Annotations,
    },
    /// `(attr:dn:matchingRuleOid:=value)`
    Extensible {
        attribute: Option<String>,
        value: AttributeValue,
        matching_rule_id: Option<String>,
        dn_attributes: bool,
        annotations: Annotations,
    },
    /// `(&child1child2...)`
    And {
        children: Vec<Filter>,
        annotations: Annotations,
    },
    /// `(|child1child2...)`
    Or {
        children: Vec<Filter>,
        annotations: Annotations,
    },
    /// `(!child)`
    Not {
        child: Box<Filter>,
        annotations: Annotations,
    },
}

impl Filter {
    /// `(attr=value)`. Fails if `attribute` is empty.
    pub fn equality(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Result<Self> {
        let attribute = non_empty(attribute)?;
        Ok(Filter::Equality {
            attribute,
            value: value.into(),
            annotations: Annotations::new(),
        })
    }

    /// `(attr>=value)`. Fails if `attribute` is empty.
    pub fn greater(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Result<Self> {
        let attribute = non_empty(attribute)?;
        Ok(Filter::Greater {
            attribute,
            value: value.into(),
            annotations: Annotations::new(),
        })
    }

    /// `(attr<=value)`. Fails if `attribute` is empty.
    pub fn less(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Result<Self> {
        let attribute = non_empty(attribute)?;
        Ok(Filter::Less {
            attribute,
            value: value.into(),
            annotations: Annotations::new(),
        })
    }

    /// `(attr~=value)`. Fails if `attribute` is empty.
    pub fn approx(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Result<Self> {
        let attribute = non_empty(attribute)?;
        Ok(Filter::Approx {
            attribute,
            value: value.into(),
            annotations: Annotations::new(),
        })
    }

    /// `(attr=*)`. Fails if `attribute` is empty.
    pub fn presence(attribute: impl Into<String>) -> Result<Self> {
        let attribute = non_empty(attribute)?;
        Ok(Filter::Presence {
            attribute,
            annotations: Annotations::new(),
        })
    }

    /// `(attr=init*any1*any2*final)`. Fails if `attribute` is empty or
    /// if none of initial/anys/final is present.
    pub fn substring(
        attribute: impl Into<String>,
        initial: Option<impl Into<AttributeValue>>,
        anys: Vec<impl Into<AttributeValue>>,
        r#final: Option<impl Into<AttributeValue>>,
    ) -> Result<Self> {
        let attribute = non_empty(attribute)?;
        let initial = initial.map(Into::into);
        let anys: Vec<AttributeValue> = anys.into_iter().map(Into::into).collect();
        let r#final = r#final.map(Into::into);

        if initial.is_none() && anys.is_empty() && r#final.is_none() {
            return Err(CoreError::InvalidFilter(format!(
                "substring filter on '{}' has no initial, any, or final component",
                attribute
            )));
        }

        Ok(Filter::Substring {
            attribute,
            components: SubstringComponents {
                initial,
                anys,
                r#final,
            },
            annotations: Annotations::new(),
        })
    }

    /// `(attr:dn:matchingRuleOid:=value)`. Fails unless at least one of
    /// `attribute` or `matching_rule_id` is present.
    pub fn extensible(
        attribute: Option<impl Into<String>>,
        value: impl Into<AttributeValue>,
        matching_rule_id: Option<impl Into<String>>,
        dn_attributes: bool,
    ) -> Result<Self> {
        let attribute = attribute.map(Into::into);
        let matching_rule_id = matching_rule_id.map(Into::into);

        if attribute.is_none() && matching_rule_id.is_none() {
            return Err(CoreError::InvalidFilter(
                "extensible match requires an attribute or a matching rule id".to_string(),
            ));
        }

        Ok(Filter::Extensible {
            attribute,
            value: value.into(),
            matching_rule_id,
            dn_attributes,
            annotations: Annotations::new(),
        })
    }

    /// `(&child1child2...)`. Fails if `children` is empty.
    pub fn and(children: Vec<Filter>) -> Result<Self> {
        if children.is_empty() {
            return Err(CoreError::InvalidFilter(
                "conjunction requires at least one child".to_string(),
            ));
        }
        Ok(Filter::And {
            children,
            annotations: Annotations::new(),
        })
    }

    /// `(|child1child2...)`. Fails if `children` is empty.
    pub fn or(children: Vec<Filter>) -> Result<Self> {
        if children.is_empty() {
            return Err(CoreError::InvalidFilter(
                "disjunction requires at least one child".to_string(),
            ));
        }
        Ok(Filter::Or {
            children,
            annotations: Annotations::new(),
        })
    }

    /// `(!child)`.
    pub fn not(child: Filter) -> Self {
        Filter::Not {
            child: Box::new(child),
            annotations: Annotations::new(),
        }
    }

    /// An `And` branch with no children yet, for parsers that build the
    /// node before its children are known. Must be filled via
    /// [`Filter::fill_children`] before any consumer observes it
    /// (§4.1.1).
    pub fn and_pending() -> Self {
        Filter::And {
            children: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    /// An `Or` branch with no children yet; see [`Filter::and_pending`].
    pub fn or_pending() -> Self {
        Filter::Or {
            children: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    /// Fills in the children of a pending `And`/`Or` branch built via
    /// [`Filter::and_pending`]/[`Filter::or_pending`]. Fails if the node
    /// is not an `And`/`Or`, or if `children` is empty.
    pub fn fill_children(&mut self, filled: Vec<Filter>) -> Result<()> {
        if filled.is_empty() {
            return Err(CoreError::InvalidFilter(
                "branch node requires at least one child".to_string(),
            ));
        }
        match self {
            Filter::And { children, .. } | Filter::Or { children, .. } => {
                *children = filled;
                Ok(())
            }
            other => Err(CoreError::InvalidFilter(format!(
                "cannot fill children on a {} node",
                other.kind_name()
            ))),
        }
    }

    /// A short name for this node's kind, used in error messages and
    /// diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Filter::Equality { .. } => "Equality",
            Filter::Greater { .. } => "Greater",
            Filter::Less { .. } => "Less",
            Filter::Approx { .. } => "Approx",
            Filter::Presence { .. } => "Presence",
            Filter::Substring { .. } => "Substring",
            Filter::Extensible { .. } => "Extensible",
            Filter::And { .. } => "And",
            Filter::Or { .. } => "Or",
            Filter::Not { .. } => "Not",
        }
    }

    /// Returns a reference to this node's children, for branch kinds
    /// only (`Not` reports its single child as a one-element slice
    /// would; instead exposed separately via [`Filter::not_child`]).
    pub fn children(&self) -> &[Filter] {
        match self {
            Filter::And { children, .. } | Filter::Or { children, .. } => children,
            _ => &[],
        }
    }

    /// The single child of a `Not` node, if this is one.
    pub fn not_child(&self) -> Option<&Filter> {
        match self {
            Filter::Not { child, .. } => Some(child),
            _ => None,
        }
    }

    /// Shared access to this node's annotations.
    pub fn annotations(&self) -> &Annotations {
        match self {
            Filter::Equality { annotations, .. }
            | Filter::Greater { annotations, .. }
            | Filter::Less { annotations, .. }
            | Filter::Approx { annotations, .. }
            | Filter::Presence { annotations, .. }
            | Filter::Substring { annotations, .. }
            | Filter::Extensible { annotations, .. }
            | Filter::And { annotations, .. }
            | Filter::Or { annotations, .. }
            | Filter::Not { annotations, .. } => annotations,
        }
    }

    /// Mutable access to this node's annotations, for optimizer
    /// rewrites performed before the tree is handed off to readers
    /// (§5).
    pub fn annotations_mut(&mut self) -> &mut Annotations {
        match self {
            Filter::Equality { annotations, .. }
            | Filter::Greater { annotations, .. }
            | Filter::Less { annotations, .. }
            | Filter::Approx { annotations, .. }
            | Filter::Presence { annotations, .. }
            | Filter::Substring { annotations, .. }
            | Filter::Extensible { annotations, .. }
            | Filter::And { annotations, .. }
            | Filter::Or { annotations, .. }
            | Filter::Not { annotations, .. } => annotations,
        }
    }
}

fn non_empty(attribute: impl Into<String>) -> Result<String> {
    let attribute = attribute.into();
    if attribute.is_empty() {
        return Err(CoreError::InvalidFilter(
            "attribute name must not be empty".to_string(),
        ));
    }
    Ok(attribute)
}

/// Structural equality per §4.1.3: kinds and essential fields match,
/// children compared pairwise in order, annotations ignored entirely.
impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        use Filter::*;
        match (self, other) {
            (
                Equality { attribute: a1, value: v1, .. },
                Equality { attribute: a2, value: v2, .. },
            ) => a1 == a2 && v1 == v2,
            (
                Greater { attribute: a1, value: v1, .. },
                Greater { attribute: a2, value: v2, .. },
            ) => a1 == a2 && v1 == v2,
            (Less { attribute: a1, value: v1, .. }, Less { attribute: a2, value: v2, .. }) => {
                a1 == a2 && v1 == v2
            }
            (
                Approx { attribute: a1, value: v1, .. },
                Approx { attribute: a2, value: v2, .. },
            ) => a1 == a2 && v1 == v2,
            (Presence { attribute: a1, .. }, Presence { attribute: a2, .. }) => a1 == a2,
            (
                Substring { attribute: a1, components: c1, .. },
                Substring { attribute: a2, components: c2, .. },
            ) => {
                a1 == a2
                    && c1.initial == c2.initial
                    && c1.anys == c2.anys
                    && c1.r#final == c2.r#final
            }
            (
                Extensible {
                    attribute: a1,
                    value: v1,
                    matching_rule_id: m1,
                    dn_attributes: d1,
                    ..
                },
                Extensible {
                    attribute: a2,
                    value: v2,
                    matching_rule_id: m2,
                    dn_attributes: d2,
                    ..
                },
            ) => a1 == a2 && v1 == v2 && m1 == m2 && d1 == d2,
            (And { children: c1, .. }, And { children: c2, .. }) => c1 == c2,
            (Or { children: c1, .. }, Or { children: c2, .. }) => c1 == c2,
            (Not { child: c1, .. }, Not { child: c2, .. }) => c1 == c2,
            _ => false,
        }
    }
}

impl Eq for Filter {}

impl std::hash::Hash for Filter {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Filter::*;
        match self {
            Equality { attribute, value, .. } => {
                0u8.hash(state);
                attribute.hash(state);
                value.hash(state);
            }
            Greater { attribute, value, .. } => {
                1u8.hash(state);
                attribute.hash(state);
                value.hash(state);
            }
            Less { attribute, value, .. } => {
                2u8.hash(state);
                attribute.hash(state);
                value.hash(state);
            }
            Approx { attribute, value, .. } => {
                3u8.hash(state);
                attribute.hash(state);
                value.hash(state);
            }
            Presence { attribute, .. } => {
                4u8.hash(state);
                attribute.hash(state);
            }
            Substring { attribute, components, .. } => {
                5u8.hash(state);
                attribute.hash(state);
                components.initial.hash(state);
                components.anys.hash(state);
                components.r#final.hash(state);
            }
            Extensible {
                attribute,
                value,
                matching_rule_id,
                dn_attributes,
                ..
            } => {
                6u8.hash(state);
                attribute.hash(state);
                value.hash(state);
                matching_rule_id.hash(state);
                dn_attributes.hash(state);
            }
            And { children, .. } => {
                7u8.hash(state);
                children.hash(state);
            }
            Or { children, .. } => {
                8u8.hash(state);
                children.hash(state);
            }
            Not { child, .. } => {
                9u8.hash(state);
                child.hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_requires_non_empty_attribute() {
        assert!(Filter::equality("", "x").is_err());
        assert!(Filter::equality("cn", "x").is_ok());
    }

    #[test]
    fn substring_requires_a_component() {
        let none: Option<&str> = None;
        assert!(Filter::substring("cn", none, Vec::<&str>::new(), none).is_err());
        assert!(Filter::substring("cn", Some("a"), vec!["b"], Some("c")).is_ok());
    }

    #[test]
    fn extensible_requires_attribute_or_matching_rule() {
        let none: Option<&str> = None;
        assert!(Filter::extensible(none, "foo", none, false).is_err());
        assert!(Filter::extensible(Some("cn"), "foo", none, false).is_ok());
        assert!(Filter::extensible(none, "foo", Some("2.5.13.2"), false).is_ok());
    }

    #[test]
    fn and_or_require_at_least_one_child() {
        assert!(Filter::and(Vec::new()).is_err());
        assert!(Filter::or(Vec::new()).is_err());
        assert!(Filter::and(vec![Filter::presence("mail").unwrap()]).is_ok());
    }

    #[test]
    fn pending_branch_must_be_filled_non_empty() {
        let mut pending = Filter::and_pending();
        assert!(pending.fill_children(Vec::new()).is_err());
        assert!(pending
            .fill_children(vec![Filter::presence("mail").unwrap()])
            .is_ok());
        assert_eq!(pending.children().len(), 1);
    }

    #[test]
    fn fill_children_rejects_non_branch_node() {
        let mut leaf = Filter::presence("mail").unwrap();
        assert!(leaf
            .fill_children(vec![Filter::presence("cn").unwrap()])
            .is_err());
    }

    #[test]
    fn equality_ignores_annotations() {
        let mut a = Filter::equality("cn", "alice").unwrap();
        let b = Filter::equality("cn", "alice").unwrap();
        a.annotations_mut().count = Some(42);
        assert_eq!(a, b);
    }

    #[test]
    fn hash_ignores_annotations() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut a = Filter::equality("cn", "alice").unwrap();
        let b = Filter::equality("cn", "alice").unwrap();
        a.annotations_mut().count = Some(7);

        let mut ha = DefaultHasher::new();
        a.hash(&mut ha);
        let mut hb = DefaultHasher::new();
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn equal_clone_has_equal_hash() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let n = Filter::and(vec![
            Filter::equality("cn", "alice").unwrap(),
            Filter::presence("mail").unwrap(),
        ])
        .unwrap();
        let cloned = n.clone();
        assert_eq!(n, cloned);

        let mut h1 = DefaultHasher::new();
        n.hash(&mut h1);
        let mut h2 = DefaultHasher::new();
        cloned.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn different_kinds_are_not_equal() {
        let eq = Filter::equality("cn", "x").unwrap();
        let pres = Filter::presence("cn").unwrap();
        assert_ne!(eq, pres);
    }
}
