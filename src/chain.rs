//! The interceptor chain (§4.2.2): a configuration-ordered pipeline of
//! middleware that every operation context passes through before (and
//! often instead of) reaching the backend.
//!
//! Grounded in the donor's async `LdapConnection` methods, which wrap
//! every call in a `tracing` span and propagate errors with `?`; here
//! the same shape is generalized into a chain of independent,
//! named stages instead of one fixed method body.

use crate::config::InterceptorChainConfig;
use crate::context::{AnyOperationContext, OperationContext, OperationName};
use crate::errors::{CoreError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

/// A single stage in the interceptor chain.
///
/// An interceptor may inspect or mutate the context, short-circuit by
/// returning without calling `next`, or call `next.run(ctx)` to
/// continue the chain. It may also spawn a collateral sub-operation
/// via `next.spawn_collateral`.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// A stable name used to place this interceptor in
    /// [`InterceptorChainConfig`]'s per-operation ordering.
    fn name(&self) -> &str;

    /// Runs this stage, optionally continuing the chain via `next`.
    async fn intercept(&self, ctx: &mut AnyOperationContext, next: Next<'_>) -> Result<()>;
}

/// The remainder of the chain, handed to each interceptor in turn.
pub struct Next<'a> {
    ordered: &'a [Arc<dyn Interceptor>],
    index: usize,
    chain: &'a Chain,
    depth: u32,
}

impl<'a> Next<'a> {
    /// Continues the chain: runs a cancellation checkpoint, then either
    /// invokes the next interceptor or, if this was the last one,
    /// returns `Ok(())`.
    pub async fn run(self, ctx: &mut AnyOperationContext) -> Result<()> {
        if let Some(session) = ctx.common().session.upgrade() {
            if session.cancellation_requested() {
                return Err(CoreError::CancellationRequested(ctx.common().message_id));
            }
        }

        let Some(interceptor) = self.ordered.get(self.index).cloned() else {
            return Ok(());
        };

        let next = Next {
            ordered: self.ordered,
            index: self.index + 1,
            chain: self.chain,
            depth: self.depth,
        };
        interceptor.intercept(ctx, next).await
    }

    /// Spawns a collateral sub-operation: marks `ctx` as collateral and
    /// dispatches it from the top of its own operation kind's chain, at
    /// `depth + 1`. Fails with [`CoreError::CollateralRecursionTooDeep`]
    /// once the configured bound is exceeded (§4.2.2, §8 invariant 7).
    pub async fn spawn_collateral(&self, mut ctx: AnyOperationContext) -> Result<()> {
        ctx.common_mut().collateral = true;
        self.chain.dispatch_at_depth(&mut ctx, self.depth + 1).await
    }

    /// The current collateral recursion depth (0 for a top-level
    /// operation).
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// The interceptor chain coordinator: a named registry of
/// interceptors plus the per-operation-kind order to run them in.
pub struct Chain {
    registry: HashMap<String, Arc<dyn Interceptor>>,
    config: InterceptorChainConfig,
}

impl Chain {
    /// Creates an empty chain bound to `config`.
    pub fn new(config: InterceptorChainConfig) -> Self {
        Self {
            registry: HashMap::new(),
            config,
        }
    }

    /// Registers an interceptor under its own name.
    pub fn register(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.registry.insert(interceptor.name().to_string(), interceptor);
    }

    fn ordered_for(&self, op: OperationName) -> Result<Vec<Arc<dyn Interceptor>>> {
        let names = self.config.order.get(&op).cloned().unwrap_or_default();
        names
            .iter()
            .map(|name| {
                self.registry.get(name).cloned().ok_or_else(|| {
                    CoreError::Configuration(format!("unknown interceptor '{}' in chain order", name))
                })
            })
            .collect()
    }

    /// Dispatches `ctx` through the chain configured for its operation
    /// kind, starting at depth 0.
    #[instrument(skip(self, ctx), fields(operation = ?ctx.operation_name(), collateral = ctx.is_collateral()))]
    pub async fn dispatch(&self, ctx: &mut AnyOperationContext) -> Result<()> {
        self.dispatch_at_depth(ctx, 0).await
    }

    async fn dispatch_at_depth(&self, ctx: &mut AnyOperationContext, depth: u32) -> Result<()> {
        if depth > self.config.max_collateral_depth {
            warn!(depth, max = self.config.max_collateral_depth, "collateral recursion bound exceeded");
            return Err(CoreError::CollateralRecursionTooDeep {
                max: self.config.max_collateral_depth,
                attempted: depth,
            });
        }
        let ordered = self.ordered_for(ctx.operation_name())?;
        let next = Next {
            ordered: &ordered,
            index: 0,
            chain: self,
            depth,
        };
        next.run(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextCommon, DeleteContext};
    use crate::dn::DistinguishedName;
    use crate::session::tests::NoopSession;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingInterceptor {
        name: String,
        counter: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Interceptor for CountingInterceptor {
        fn name(&self) -> &str {
            &self.name
        }

        async fn intercept(&self, ctx: &mut AnyOperationContext, next: Next<'_>) -> Result<()> {
            self.counter.fetch_add(1, Ordering::SeqCst);
            next.run(ctx).await
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl Interceptor for ShortCircuit {
        fn name(&self) -> &str {
            "short-circuit"
        }

        async fn intercept(&self, _ctx: &mut AnyOperationContext, _next: Next<'_>) -> Result<()> {
            Ok(())
        }
    }

    struct CollateralSpawner {
        spawned: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Interceptor for CollateralSpawner {
        fn name(&self) -> &str {
            "spawner"
        }

        async fn intercept(&self, ctx: &mut AnyOperationContext, next: Next<'_>) -> Result<()> {
            let child = ctx.clone();
            self.spawned.fetch_add(1, Ordering::SeqCst);
            next.spawn_collateral(child).await?;
            next.run(ctx).await
        }
    }

    fn delete_ctx() -> AnyOperationContext {
        let session: Arc<dyn crate::session::Session> = Arc::new(NoopSession::default());
        AnyOperationContext::Delete(DeleteContext {
            common: ContextCommon::new(
                Arc::downgrade(&session),
                DistinguishedName::empty(),
                OperationName::Delete,
                1,
            ),
        })
    }

    #[tokio::test]
    async fn dispatch_runs_interceptors_in_configured_order() {
        let mut config = InterceptorChainConfig::default();
        config
            .order
            .insert(OperationName::Delete, vec!["a".into(), "b".into()]);

        let mut chain = Chain::new(config);
        let counter = Arc::new(AtomicU32::new(0));
        chain.register(Arc::new(CountingInterceptor {
            name: "a".into(),
            counter: counter.clone(),
        }));
        chain.register(Arc::new(CountingInterceptor {
            name: "b".into(),
            counter: counter.clone(),
        }));

        let mut ctx = delete_ctx();
        chain.dispatch(&mut ctx).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn short_circuit_prevents_later_interceptors_from_running() {
        let mut config = InterceptorChainConfig::default();
        config
            .order
            .insert(OperationName::Delete, vec!["short-circuit".into(), "a".into()]);

        let mut chain = Chain::new(config);
        let counter = Arc::new(AtomicU32::new(0));
        chain.register(Arc::new(ShortCircuit));
        chain.register(Arc::new(CountingInterceptor {
            name: "a".into(),
            counter: counter.clone(),
        }));

        let mut ctx = delete_ctx();
        chain.dispatch(&mut ctx).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_interceptor_name_in_config_is_a_configuration_error() {
        let mut config = InterceptorChainConfig::default();
        config.order.insert(OperationName::Delete, vec!["ghost".into()]);
        let chain = Chain::new(config);

        let mut ctx = delete_ctx();
        assert!(matches!(chain.dispatch(&mut ctx).await, Err(CoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn collateral_recursion_past_bound_is_rejected() {
        let mut config = InterceptorChainConfig::default();
        config.max_collateral_depth = 1;
        config
            .order
            .insert(OperationName::Delete, vec!["spawner".into()]);

        let mut chain = Chain::new(config);
        let spawned = Arc::new(AtomicU32::new(0));
        chain.register(Arc::new(CollateralSpawner { spawned: spawned.clone() }));

        let mut ctx = delete_ctx();
        let err = chain.dispatch(&mut ctx).await.unwrap_err();
        assert!(matches!(err, CoreError::CollateralRecursionTooDeep { .. }));
    }

    #[tokio::test]
    async fn cancellation_flag_short_circuits_before_next_interceptor() {
        let mut config = InterceptorChainConfig::default();
        config
            .order
            .insert(OperationName::Delete, vec!["a".into()]);
        let mut chain = Chain::new(config);
        let counter = Arc::new(AtomicU32::new(0));
        chain.register(Arc::new(CountingInterceptor {
            name: "a".into(),
            counter: counter.clone(),
        }));

        let session = Arc::new(NoopSession::default());
        session.request_cancellation();
        let session_trait: Arc<dyn crate::session::Session> = session;
        let mut ctx = AnyOperationContext::Delete(DeleteContext {
            common: ContextCommon::new(
                Arc::downgrade(&session_trait),
                DistinguishedName::empty(),
                OperationName::Delete,
                1,
            ),
        });

        let err = chain.dispatch(&mut ctx).await.unwrap_err();
        assert!(matches!(err, CoreError::CancellationRequested(1)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
