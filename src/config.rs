//! Interceptor chain configuration, loaded the way the donor loads
//! `LdapConfig`: via the `config` crate layered over environment
//! variables, with an explicit `validate()` pass before use.

use crate::context::OperationName;
use crate::errors::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default bound on collateral sub-operation recursion depth (§4.2.2,
/// §8 invariant 7).
pub const DEFAULT_MAX_COLLATERAL_DEPTH: u32 = 10;

/// Per-operation-kind interceptor ordering, plus the collateral
/// recursion bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptorChainConfig {
    /// Interceptor names, in invocation order, keyed by operation kind.
    #[serde(default)]
    pub order: HashMap<OperationName, Vec<String>>,
    /// Maximum collateral recursion depth before a dispatch fails with
    /// [`CoreError::CollateralRecursionTooDeep`].
    #[serde(default = "default_max_collateral_depth")]
    pub max_collateral_depth: u32,
}

fn default_max_collateral_depth() -> u32 {
    DEFAULT_MAX_COLLATERAL_DEPTH
}

impl Default for InterceptorChainConfig {
    fn default() -> Self {
        Self {
            order: HashMap::new(),
            max_collateral_depth: DEFAULT_MAX_COLLATERAL_DEPTH,
        }
    }
}

impl InterceptorChainConfig {
    /// Loads configuration from the process environment, using the
    /// `LDAP_CORE_` prefix (e.g. `LDAP_CORE_MAX_COLLATERAL_DEPTH`).
    /// Missing variables fall back to defaults; malformed ones surface
    /// as [`CoreError::Configuration`].
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .set_default("max_collateral_depth", DEFAULT_MAX_COLLATERAL_DEPTH as i64)
            .map_err(|e| CoreError::Configuration(e.to_string()))?
            .add_source(config::Environment::with_prefix("LDAP_CORE").separator("__"))
            .build()
            .map_err(|e| CoreError::Configuration(e.to_string()))?;

        let max_collateral_depth: u32 = settings
            .get("max_collateral_depth")
            .map_err(|e| CoreError::Configuration(e.to_string()))?;

        let cfg = Self {
            order: HashMap::new(),
            max_collateral_depth,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the configuration: every operation kind listed in
    /// `order` must name a non-empty chain, and the depth bound must
    /// be positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_collateral_depth == 0 {
            return Err(CoreError::Configuration(
                "max_collateral_depth must be at least 1".into(),
            ));
        }
        for (op, names) in &self.order {
            if names.is_empty() {
                return Err(CoreError::Configuration(format!(
                    "interceptor order for {:?} must not be empty",
                    op
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_the_standard_depth_bound() {
        let cfg = InterceptorChainConfig::default();
        assert_eq!(cfg.max_collateral_depth, DEFAULT_MAX_COLLATERAL_DEPTH);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_depth_bound_fails_validation() {
        let mut cfg = InterceptorChainConfig::default();
        cfg.max_collateral_depth = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_order_list_for_a_configured_operation_fails_validation() {
        let mut cfg = InterceptorChainConfig::default();
        cfg.order.insert(OperationName::Add, vec![]);
        assert!(cfg.validate().is_err());
    }
}
