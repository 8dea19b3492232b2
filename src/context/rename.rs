//! ModifyDN three-way dispatch (§4.2.3).
//!
//! A single ModifyDN request carries an old DN, a new DN, and an
//! optional delete-old-rdn flag. Depending on whether the parent and
//! the RDN changed, it becomes one of three distinct operations: a
//! pure rename, a pure move, or a combined move-and-rename. Classifying
//! this up front lets the rest of the chain (ACL checks, referential
//! integrity fixups) reason about one case at a time instead of
//! re-deriving it.

use super::{ContextCommon, MoveAndRenameContext, MoveContext, OperationName, RenameContext};
use crate::dn::DistinguishedName;

/// The classification of a ModifyDN request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifyDnCase {
    /// Parent unchanged, RDN changed.
    Rename { new_rdn: crate::dn::RdnComponent },
    /// Parent changed, RDN unchanged.
    Move { new_superior: DistinguishedName },
    /// Both parent and RDN changed.
    MoveAndRename {
        new_superior: DistinguishedName,
        new_rdn: crate::dn::RdnComponent,
    },
}

fn dn_eq_ignore_case(a: &DistinguishedName, b: &DistinguishedName) -> bool {
    a.components.len() == b.components.len()
        && a.components
            .iter()
            .zip(&b.components)
            .all(|(x, y)| x.eq_ignore_case(y))
}

/// Classifies a ModifyDN request by comparing the old and new DN's
/// parent and RDN.
///
/// `old_dn` and `new_dn` must each have at least one component (an
/// RDN); callers are expected to have already rejected a ModifyDN on
/// the root DSE upstream.
pub fn classify(old_dn: &DistinguishedName, new_dn: &DistinguishedName) -> ModifyDnCase {
    let old_parent = old_dn.parent().unwrap_or_else(DistinguishedName::empty);
    let new_parent = new_dn.parent().unwrap_or_else(DistinguishedName::empty);
    let old_rdn = old_dn.rdn().cloned().unwrap_or_else(|| crate::dn::RdnComponent::new("", ""));
    let new_rdn = new_dn.rdn().cloned().unwrap_or_else(|| crate::dn::RdnComponent::new("", ""));

    let parent_changed = !dn_eq_ignore_case(&old_parent, &new_parent);
    let rdn_changed = !old_rdn.eq_ignore_case(&new_rdn);

    match (parent_changed, rdn_changed) {
        (false, _) => ModifyDnCase::Rename { new_rdn },
        (true, false) => ModifyDnCase::Move { new_superior: new_parent },
        (true, true) => ModifyDnCase::MoveAndRename {
            new_superior: new_parent,
            new_rdn,
        },
    }
}

/// Resolves the effective `delete-old-rdn` flag (§4.2.3): an explicit
/// request value wins; otherwise the session's `delete-old-rdn`
/// environment override is parsed case-insensitively
/// (`true`/`yes`/`1` vs. `false`/`no`/`0`); otherwise the default is
/// `true`.
pub fn resolve_delete_old_rdn(requested: Option<bool>, session_override: Option<&str>) -> bool {
    if let Some(v) = requested {
        return v;
    }
    match session_override {
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "false" | "no" | "0" => false,
            "true" | "yes" | "1" => true,
            _ => true,
        },
        None => true,
    }
}

/// An `AnyOperationContext`-shaped result of dispatching a ModifyDN.
pub enum DispatchedRename {
    Rename(RenameContext),
    Move(MoveContext),
    MoveAndRename(MoveAndRenameContext),
}

/// Classifies and builds the concrete context for a ModifyDN request.
pub fn dispatch(
    old_dn: &DistinguishedName,
    new_dn: &DistinguishedName,
    requested_delete_old_rdn: Option<bool>,
    session_override: Option<&str>,
    mut common: ContextCommon,
) -> DispatchedRename {
    let delete_old_rdn = resolve_delete_old_rdn(requested_delete_old_rdn, session_override);
    match classify(old_dn, new_dn) {
        ModifyDnCase::Rename { new_rdn } => {
            common.operation_name = OperationName::Rename;
            DispatchedRename::Rename(RenameContext {
                common,
                new_rdn,
                delete_old_rdn,
            })
        }
        ModifyDnCase::Move { new_superior } => {
            common.operation_name = OperationName::Move;
            DispatchedRename::Move(MoveContext { common, new_superior })
        }
        ModifyDnCase::MoveAndRename { new_superior, new_rdn } => {
            common.operation_name = OperationName::MoveAndRename;
            DispatchedRename::MoveAndRename(MoveAndRenameContext {
                common,
                new_superior,
                new_rdn,
                delete_old_rdn,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::NoopSession;
    use rstest::rstest;
    use std::sync::Arc;

    fn common() -> ContextCommon {
        let session: Arc<dyn crate::session::Session> = Arc::new(NoopSession::default());
        ContextCommon::new(Arc::downgrade(&session), DistinguishedName::empty(), OperationName::Rename, 1)
    }

    #[rstest]
    #[case::pure_rename("cn=a,ou=x,dc=y", "cn=b,ou=x,dc=y", ModifyDnCase::Rename { new_rdn: crate::dn::RdnComponent::new("cn", "b") })]
    #[case::pure_move("cn=a,ou=x,dc=y", "cn=a,ou=z,dc=y", ModifyDnCase::Move { new_superior: DistinguishedName::parse("ou=z,dc=y").unwrap() })]
    #[case::move_and_rename(
        "cn=a,ou=x,dc=y",
        "cn=b,ou=z,dc=y",
        ModifyDnCase::MoveAndRename {
            new_superior: DistinguishedName::parse("ou=z,dc=y").unwrap(),
            new_rdn: crate::dn::RdnComponent::new("cn", "b"),
        }
    )]
    #[case::parent_case_difference_is_not_a_change(
        "cn=a,OU=x,DC=y",
        "cn=b,ou=x,dc=y",
        ModifyDnCase::Rename { new_rdn: crate::dn::RdnComponent::new("cn", "b") }
    )]
    #[case::rdn_case_difference_is_not_a_change(
        "cn=Alice,ou=x,dc=y",
        "CN=alice,ou=z,dc=y",
        ModifyDnCase::Move { new_superior: DistinguishedName::parse("ou=z,dc=y").unwrap() }
    )]
    fn classification_matrix(#[case] old: &str, #[case] new: &str, #[case] expected: ModifyDnCase) {
        let old = DistinguishedName::parse(old).unwrap();
        let new = DistinguishedName::parse(new).unwrap();
        assert_eq!(classify(&old, &new), expected);
    }

    #[test]
    fn s6_move_and_rename() {
        use pretty_assertions::assert_eq;

        let old = DistinguishedName::parse("cn=a,ou=x,dc=y").unwrap();
        let new = DistinguishedName::parse("cn=b,ou=z,dc=y").unwrap();
        match dispatch(&old, &new, None, None, common()) {
            DispatchedRename::MoveAndRename(ctx) => {
                let actual = (ctx.new_superior.to_string(), ctx.new_rdn.to_string(), ctx.delete_old_rdn);
                let expected = ("ou=z,dc=y".to_string(), "cn=b".to_string(), true);
                assert_eq!(actual, expected);
            }
            _ => panic!("expected MoveAndRename"),
        }
    }

    #[test]
    fn delete_old_rdn_explicit_request_wins_over_session_override() {
        assert!(!resolve_delete_old_rdn(Some(false), Some("true")));
        assert!(resolve_delete_old_rdn(Some(true), Some("false")));
    }

    #[test]
    fn delete_old_rdn_session_override_parses_common_spellings() {
        assert!(!resolve_delete_old_rdn(None, Some("NO")));
        assert!(!resolve_delete_old_rdn(None, Some("0")));
        assert!(resolve_delete_old_rdn(None, Some("YES")));
        assert!(resolve_delete_old_rdn(None, None));
    }
}
