//! Runtime configuration.
//!
//! Each thread's runtime starts with [`RuntimeConfig::default`]. A different
//! configuration can be installed with
//! [`Runtime::configure`](crate::reactive::Runtime::configure), typically
//! once at startup:
//!
//! ```rust,ignore
//! let config = RuntimeConfig::from_json(r#"{ "max_reruns_per_flush": 20 }"#)?;
//! Runtime::configure(config);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default limit on how often one effect may run within a single flush.
pub const DEFAULT_MAX_RERUNS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How many times one effect may run during a single flush before the
    /// flush fails with a cyclic update error.
    pub max_reruns_per_flush: usize,

    /// Whether `Effect::new` runs the callback immediately to collect its
    /// first set of dependencies.
    pub run_on_register: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_reruns_per_flush: DEFAULT_MAX_RERUNS,
            run_on_register: true,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;

    #[test]
    fn missing_fields_use_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "max_reruns_per_flush": 5 }"#).unwrap();
        assert_eq!(config.max_reruns_per_flush, 5);
        assert!(config.run_on_register);

        assert_eq!(RuntimeConfig::from_json("{}").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = RuntimeConfig::from_json("{ max_reruns_per_flush: }").unwrap_err();
        assert!(matches!(err, ReactiveError::Json(_)));
    }
}
