//! # LDAP Core
//!
//! Core library for the directory server's filter-expression model and
//! operation-context/interceptor-chain pipeline.
//!
//! This crate provides:
//! - The LDAPv3 search-filter AST (RFC 4515) and its visitor protocol
//! - Canonical and subtree-refinement (RFC 4512 §2.5.2) rendering
//! - Distinguished Name parsing, escaping, and composition
//! - The typed operation-context hierarchy for Add/Delete/Modify/
//!   ModifyDN/Search/Compare/Bind/Abandon/Extended
//! - An async interceptor chain with collateral sub-operation support
//!
//! ## Example
//!
//! ```rust
//! use ldap_core::filter::Filter;
//! use ldap_core::filter::render::render;
//!
//! let tree = Filter::and(vec![
//!     Filter::equality("cn", "alice").unwrap(),
//!     Filter::presence("mail").unwrap(),
//! ])
//! .unwrap();
//! assert_eq!(render(&tree), "(&(cn=alice)(mail=*))");
//! ```

pub mod attribute;
pub mod backend;
pub mod chain;
pub mod config;
pub mod context;
pub mod dn;
pub mod errors;
pub mod filter;
pub mod session;

pub use errors::{CoreError, Result};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
