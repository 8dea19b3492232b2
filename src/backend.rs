//! The storage seam (§3.4, §4.2.1 Search/Compare parameters).
//!
//! `BackendNexus` is the trait the interceptor chain ultimately bottoms
//! out on: once every interceptor has run, something has to actually
//! mutate or query the directory tree. This crate only defines the
//! seam — no implementation ships here, matching the donor's own split
//! between connection/session plumbing and the pool that hands out
//! connections to it.

use crate::attribute::AttributeValue;
use crate::dn::DistinguishedName;
use crate::errors::Result;
use crate::filter::Filter;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;

/// A directory entry: a DN plus its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub dn: DistinguishedName,
    pub attributes: HashMap<String, Vec<AttributeValue>>,
}

impl Entry {
    /// Creates an entry with no attributes.
    pub fn new(dn: DistinguishedName) -> Self {
        Self {
            dn,
            attributes: HashMap::new(),
        }
    }

    /// Adds a value to `attribute`, creating the slot if absent.
    pub fn with_attribute(mut self, attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes
            .entry(attribute.into())
            .or_default()
            .push(value.into());
        self
    }

    /// The first value of `attribute`, if present.
    pub fn get_first(&self, attribute: &str) -> Option<&AttributeValue> {
        self.attributes.get(attribute).and_then(|vs| vs.first())
    }

    /// True if this entry's `objectClass` values include `class`
    /// (case-insensitively).
    pub fn has_object_class(&self, class: &str) -> bool {
        self.attributes
            .get("objectClass")
            .map(|vs| {
                vs.iter()
                    .any(|v| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case(class)))
            })
            .unwrap_or(false)
    }
}

/// A single attribute modification (Modify operation, §3.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    Add { attribute: String, values: Vec<AttributeValue> },
    Delete { attribute: String, values: Vec<AttributeValue> },
    Replace { attribute: String, values: Vec<AttributeValue> },
}

/// Search scope (RFC 4511 plus the `subordinate` extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Base,
    OneLevel,
    Subtree,
    /// The entire subtree excluding the base entry itself.
    Subordinate,
}

/// How aliases are dereferenced during a Search (RFC 4511 §4.5.1.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerefAliases {
    Never,
    InSearching,
    FindingBaseObject,
    Always,
}

/// The backend seam the interceptor chain ultimately dispatches to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendNexus: Send + Sync {
    async fn add(&self, entry: Entry) -> Result<()>;

    async fn delete(&self, dn: &DistinguishedName) -> Result<()>;

    async fn modify(&self, dn: &DistinguishedName, modifications: Vec<Modification>) -> Result<()>;

    async fn rename(&self, dn: &DistinguishedName, new_rdn: &str, delete_old_rdn: bool) -> Result<()>;

    async fn move_entry(&self, dn: &DistinguishedName, new_superior: &DistinguishedName) -> Result<()>;

    async fn lookup(&self, dn: &DistinguishedName) -> Result<Option<Entry>>;

    async fn has_entry(&self, dn: &DistinguishedName) -> Result<bool>;

    async fn list(&self, base: &DistinguishedName) -> Result<Vec<Entry>>;

    /// Streams entries matching `filter` under `base` at `scope`.
    async fn search(
        &self,
        base: &DistinguishedName,
        scope: SearchScope,
        filter: &Filter,
    ) -> Result<BoxStream<'static, Result<Entry>>>;

    async fn compare(&self, dn: &DistinguishedName, attribute: &str, value: &AttributeValue) -> Result<bool>;
}
