//! The session seam (§3.4, §4.2.2 cancellation checkpoints).
//!
//! `Session` is deliberately thin: the interceptor chain only needs a
//! place to read attached controls, check a cancellation flag, and
//! look up session-scoped environment overrides (e.g. the
//! `delete-old-rdn` override consulted by [`crate::context::rename`]).
//! Everything else — authentication state, transport, wire framing —
//! lives outside this crate's scope.

use crate::context::Control;

/// A client session, as seen by the operation-context/interceptor
/// layer.
#[cfg_attr(test, mockall::automock)]
pub trait Session: Send + Sync {
    /// Controls negotiated for this session (as opposed to per-request
    /// controls, which live on the operation context).
    fn controls(&self) -> &[Control];

    /// True once an Abandon has flagged this session's in-flight
    /// operation for cancellation. Interceptors poll this at the
    /// checkpoints named in §4.2.2: before recursing into the next
    /// interceptor, and before emitting each search result entry.
    fn cancellation_requested(&self) -> bool;

    /// Flags the session's in-flight operation for cancellation.
    fn request_cancellation(&self);

    /// Looks up a session-scoped environment override by key (e.g.
    /// `"delete-old-rdn"`). Returns `None` if unset.
    fn env(&self, key: &str) -> Option<String>;
}
