//! Container configuration
//!
//! Settings come from `SOLANUM_*` environment variables, optionally loaded
//! from `.env` files, and can be overridden with a builder:
//!
//! ```rust,no_run
//! use solanum::config::{load_dotenv, ContainerConfig};
//! use solanum::{Container, Lifecycle};
//!
//! load_dotenv(std::path::Path::new("."));
//!
//! let config = ContainerConfig::builder()
//!     .default_lifecycle(Lifecycle::Transient)
//!     .build();
//! let container = Container::with_config(config);
//! ```

pub mod env;

pub use env::{env, env_optional, load_dotenv};

use crate::container::Lifecycle;

/// Env key for the lifecycle used when a provider sets none
pub const DEFAULT_LIFECYCLE_ENV: &str = "SOLANUM_DEFAULT_LIFECYCLE";
/// Env key for the maximum nesting of resolutions
pub const MAX_DEPTH_ENV: &str = "SOLANUM_MAX_RESOLVE_DEPTH";

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Container settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Lifecycle for providers that do not choose one
    pub default_lifecycle: Lifecycle,
    /// Nested resolutions allowed on one thread before failing
    pub max_depth: usize,
}

impl ContainerConfig {
    /// Build config from environment variables
    pub fn from_env() -> Self {
        Self::from_env_keys(DEFAULT_LIFECYCLE_ENV, MAX_DEPTH_ENV)
    }

    fn from_env_keys(lifecycle_key: &str, max_depth_key: &str) -> Self {
        Self {
            default_lifecycle: env(lifecycle_key, Lifecycle::default()),
            max_depth: env(max_depth_key, DEFAULT_MAX_DEPTH).max(1),
        }
    }

    /// Create a builder starting from the defaults
    pub fn builder() -> ContainerConfigBuilder {
        ContainerConfigBuilder::default()
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            default_lifecycle: Lifecycle::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Builder for ContainerConfig
#[derive(Debug, Default)]
pub struct ContainerConfigBuilder {
    default_lifecycle: Option<Lifecycle>,
    max_depth: Option<usize>,
}

impl ContainerConfigBuilder {
    pub fn default_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.default_lifecycle = Some(lifecycle);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn build(self) -> ContainerConfig {
        let default = ContainerConfig::default();
        ContainerConfig {
            default_lifecycle: self.default_lifecycle.unwrap_or(default.default_lifecycle),
            max_depth: self.max_depth.unwrap_or(default.max_depth).max(1),
        }
    }
}
