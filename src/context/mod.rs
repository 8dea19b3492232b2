//! The typed operation-context hierarchy (§3.4, §4.2.1).
//!
//! Rust has no class inheritance, so the "abstract base" of spec.md
//! §3.4 becomes a plain struct, [`ContextCommon`], embedded by
//! composition in every concrete context; shared behavior is exposed
//! through the [`OperationContext`] trait rather than virtual dispatch.
//! Every concrete context is a plain data carrier (§4.2.1): typed
//! fields, typed accessors, no hidden behavior.

pub mod rename;

use crate::attribute::AttributeValue;
use crate::backend::{DerefAliases, Entry, Modification, SearchScope};
use crate::dn::{DistinguishedName, RdnComponent};
use crate::filter::Filter;
use crate::session::Session;
use std::sync::Weak;

/// A single request/response control: an OID, a criticality flag, and
/// an opaque value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    /// The control's OID.
    pub oid: String,
    /// Whether the operation must fail if this control is not
    /// understood.
    pub criticality: bool,
    /// Opaque control-specific value.
    pub value: Option<Vec<u8>>,
}

impl Control {
    /// Creates a new control.
    pub fn new(oid: impl Into<String>, criticality: bool, value: Option<Vec<u8>>) -> Self {
        Self {
            oid: oid.into(),
            criticality,
            value,
        }
    }
}

/// The LDAP operation kind a context carries parameters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OperationName {
    Add,
    Delete,
    Modify,
    Rename,
    Move,
    MoveAndRename,
    Search,
    Compare,
    Bind,
    Unbind,
    Abandon,
    Extended,
}

/// Fields shared by every operation context (§3.4).
#[derive(Debug, Clone)]
pub struct ContextCommon {
    /// Weak back-reference to the originating session; weak because
    /// the context must not keep the session alive past its natural
    /// lifetime (§3.4: "weak back-reference").
    pub session: Weak<dyn Session>,
    /// Target DN; may be empty for root-DSE/Bind operations.
    pub dn: DistinguishedName,
    /// Controls attached to the request, in wire order.
    pub request_controls: Vec<Control>,
    /// Controls to be returned with the response, in emission order.
    pub response_controls: Vec<Control>,
    /// This context's operation kind.
    pub operation_name: OperationName,
    /// True when this context was spawned as a side effect of another
    /// operation (cascading delete, referential integrity fixup).
    pub collateral: bool,
    /// The LDAP message id this context corresponds to, used to
    /// correlate with an Abandon's cancellation checkpoint.
    pub message_id: u32,
}

impl ContextCommon {
    /// Creates common fields for a fresh, non-collateral context.
    pub fn new(session: Weak<dyn Session>, dn: DistinguishedName, operation_name: OperationName, message_id: u32) -> Self {
        Self {
            session,
            dn,
            request_controls: Vec::new(),
            response_controls: Vec::new(),
            operation_name,
            collateral: false,
            message_id,
        }
    }
}

/// Shared accessors implemented by every concrete context, standing in
/// for the "abstract base" of spec.md §3.4.
pub trait OperationContext {
    /// Shared fields, by reference.
    fn common(&self) -> &ContextCommon;
    /// Shared fields, mutably.
    fn common_mut(&mut self) -> &mut ContextCommon;

    /// The target DN.
    fn dn(&self) -> &DistinguishedName {
        &self.common().dn
    }

    /// This context's operation kind.
    fn operation_name(&self) -> OperationName {
        self.common().operation_name
    }

    /// True if this context is a collateral sub-operation.
    fn is_collateral(&self) -> bool {
        self.common().collateral
    }
}

macro_rules! plain_context {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $field:ident : $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            /// Fields shared with every other operation context.
            pub common: ContextCommon,
            $($(#[$fmeta])* pub $field: $ty,)*
        }

        impl OperationContext for $name {
            fn common(&self) -> &ContextCommon {
                &self.common
            }
            fn common_mut(&mut self) -> &mut ContextCommon {
                &mut self.common
            }
        }
    };
}

plain_context!(
    /// Parameters for an Add operation.
    AddContext {
        entry: Entry,
    }
);

plain_context!(
    /// Parameters for a Delete operation (none beyond the common DN).
    DeleteContext {}
);

plain_context!(
    /// Parameters for a Modify operation.
    ModifyContext {
        modifications: Vec<Modification>,
    }
);

plain_context!(
    /// Parameters for a pure rename (ModifyDN with unchanged parent).
    RenameContext {
        new_rdn: RdnComponent,
        delete_old_rdn: bool,
    }
);

plain_context!(
    /// Parameters for a pure move (ModifyDN with unchanged RDN).
    MoveContext {
        new_superior: DistinguishedName,
    }
);

plain_context!(
    /// Parameters for a combined move+rename ModifyDN.
    MoveAndRenameContext {
        new_superior: DistinguishedName,
        new_rdn: RdnComponent,
        delete_old_rdn: bool,
    }
);

plain_context!(
    /// Parameters for a Search operation.
    SearchContext {
        scope: SearchScope,
        filter: Filter,
        size_limit: Option<u32>,
        time_limit: Option<u32>,
        deref_aliases: DerefAliases,
        returning_attributes: Vec<String>,
        types_only: bool,
    }
);

plain_context!(
    /// Parameters for a Compare operation.
    CompareContext {
        attribute: String,
        assertion_value: AttributeValue,
    }
);

plain_context!(
    /// Parameters for a Bind operation.
    BindContext {
        credentials: Vec<u8>,
        sasl_mechanism: Option<String>,
    }
);

plain_context!(
    /// Parameters for an Unbind operation (no additional fields).
    UnbindContext {}
);

plain_context!(
    /// Parameters for an Abandon operation.
    AbandonContext {
        abandoned_message_id: u32,
    }
);

plain_context!(
    /// Parameters for an Extended operation.
    ExtendedContext {
        request_oid: String,
        request_value: Option<Vec<u8>>,
    }
);

/// A type-erased operation context, used by the interceptor chain
/// (§4.2.2), which must drive contexts of every operation kind through
/// one ordered list of interceptors.
#[derive(Debug, Clone)]
pub enum AnyOperationContext {
    Add(AddContext),
    Delete(DeleteContext),
    Modify(ModifyContext),
    Rename(RenameContext),
    Move(MoveContext),
    MoveAndRename(MoveAndRenameContext),
    Search(SearchContext),
    Compare(CompareContext),
    Bind(BindContext),
    Unbind(UnbindContext),
    Abandon(AbandonContext),
    Extended(ExtendedContext),
}

impl OperationContext for AnyOperationContext {
    fn common(&self) -> &ContextCommon {
        match self {
            AnyOperationContext::Add(c) => &c.common,
            AnyOperationContext::Delete(c) => &c.common,
            AnyOperationContext::Modify(c) => &c.common,
            AnyOperationContext::Rename(c) => &c.common,
            AnyOperationContext::Move(c) => &c.common,
            AnyOperationContext::MoveAndRename(c) => &c.common,
            AnyOperationContext::Search(c) => &c.common,
            AnyOperationContext::Compare(c) => &c.common,
            AnyOperationContext::Bind(c) => &c.common,
            AnyOperationContext::Unbind(c) => &c.common,
            AnyOperationContext::Abandon(c) => &c.common,
            AnyOperationContext::Extended(c) => &c.common,
        }
    }

    fn common_mut(&mut self) -> &mut ContextCommon {
        match self {
            AnyOperationContext::Add(c) => &mut c.common,
            AnyOperationContext::Delete(c) => &mut c.common,
            AnyOperationContext::Modify(c) => &mut c.common,
            AnyOperationContext::Rename(c) => &mut c.common,
            AnyOperationContext::Move(c) => &mut c.common,
            AnyOperationContext::MoveAndRename(c) => &mut c.common,
            AnyOperationContext::Search(c) => &mut c.common,
            AnyOperationContext::Compare(c) => &mut c.common,
            AnyOperationContext::Bind(c) => &mut c.common,
            AnyOperationContext::Unbind(c) => &mut c.common,
            AnyOperationContext::Abandon(c) => &mut c.common,
            AnyOperationContext::Extended(c) => &mut c.common,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::NoopSession;
    use std::sync::Arc;

    fn common(op: OperationName) -> ContextCommon {
        let session: Arc<dyn Session> = Arc::new(NoopSession::default());
        ContextCommon::new(Arc::downgrade(&session), DistinguishedName::empty(), op, 1)
    }

    #[test]
    fn any_operation_context_exposes_common_fields() {
        let ctx = AnyOperationContext::Delete(DeleteContext {
            common: common(OperationName::Delete),
        });
        assert_eq!(ctx.operation_name(), OperationName::Delete);
        assert!(!ctx.is_collateral());
    }

    #[test]
    fn collateral_flag_is_mutable_through_common_mut() {
        let mut ctx = AnyOperationContext::Delete(DeleteContext {
            common: common(OperationName::Delete),
        });
        ctx.common_mut().collateral = true;
        assert!(ctx.is_collateral());
    }
}
