//! Service container for dependency injection
//!
//! This module provides the registry and resolution engine:
//! - Singletons: the first successfully built instance is shared
//! - Transients: a new instance per resolution
//! - Capability bindings: resolve a provider through the trait it implements
//! - Type-only dependencies: factory parameters are looked up by type
//! - Test fakes: swap a registration for the lifetime of a guard
//!
//! # Example
//!
//! ```rust,ignore
//! use solanum::{Container, Provider};
//! use std::sync::Arc;
//!
//! let container = Container::new();
//! container.register("config", Provider::value(Config::load()));
//! container.register(
//!     "client",
//!     Provider::factory(|config: Arc<Config>| HttpClient::new(&config))
//!         .bind::<dyn Client>(|c| c),
//! );
//!
//! // Resolve by key, or by the capability alone
//! let client: Arc<dyn Client> = container.resolve_as::<dyn Client>("client")?;
//! let same: Arc<dyn Client> = container.make::<dyn Client>()?;
//! ```

mod dependency;
mod entry;
mod factory;
mod instance;
pub mod provider;
mod registry;
mod resolve;
pub mod testing;
mod token;

pub use dependency::{dependency, DependencyDescriptor};
pub use entry::{HookState, Lifecycle, ProviderKind};
pub use factory::{Factory, Inject};
pub use instance::Instance;
pub use provider::{Injectable, Provider, ProviderRegistration};
pub use token::TypeToken;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ContainerConfig;
use registry::Registry;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// The service container
///
/// Holds one provider per key plus the capability and produced-type indices.
/// All methods take `&self`; share a container across threads with
/// `Arc<Container>`.
pub struct Container {
    id: u64,
    config: ContainerConfig,
    registry: RwLock<Registry>,
}

impl Container {
    /// Create an empty container with default configuration
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Create an empty container with the given configuration
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            config,
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Create an empty container configured from `SOLANUM_*` environment
    /// variables
    pub fn from_env() -> Self {
        Self::with_config(ContainerConfig::from_env())
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a provider under `key`
    ///
    /// Registering an existing key replaces it. Nothing is validated here:
    /// missing or ambiguous dependencies surface when the key is resolved.
    ///
    /// # Example
    /// ```rust,ignore
    /// container.register("counter", Provider::factory(|| Counter::new()).transient());
    /// ```
    pub fn register<T: Send + Sync + 'static>(&self, key: impl Into<String>, provider: Provider<T>) {
        let key: Arc<str> = Arc::from(key.into());
        let entry = provider.into_entry(Arc::clone(&key), self.config.default_lifecycle);
        debug!(
            key = %key,
            lifecycle = %entry.lifecycle,
            produces = %entry.shape.produced,
            dependencies = entry.dependencies.len(),
            "registering provider"
        );

        if self.write().insert(Arc::new(entry)).is_some() {
            debug!(key = %key, "replaced existing provider");
        }
    }

    /// Register a singleton factory
    pub fn singleton<T, F, Args>(&self, key: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Factory<Args, Output = T>,
    {
        self.register(key, Provider::factory(factory).singleton());
    }

    /// Register a transient factory
    pub fn transient<T, F, Args>(&self, key: impl Into<String>, factory: F)
    where
        T: Send + Sync + 'static,
        F: Factory<Args, Output = T>,
    {
        self.register(key, Provider::factory(factory).transient());
    }

    /// Register an already-built value
    pub fn instance<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.register(key, Provider::value(value));
    }

    /// Register an [`Injectable`] type under its own key
    pub fn register_injectable<T: Injectable>(&self) {
        self.register(T::KEY, T::provider());
    }

    /// Apply every registration collected from `#[injectable]` types
    ///
    /// Returns the number of registrations applied.
    pub fn register_discovered(&self) -> usize {
        let mut count = 0;
        for registration in provider::discovered() {
            debug!(key = registration.key, "registering discovered provider");
            (registration.register)(self);
            count += 1;
        }
        info!(count, "registered discovered providers");
        count
    }

    /// Check if a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.read().contains(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.read().keys()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Describe the registration under `key`
    pub fn describe(&self, key: &str) -> Option<ProviderInfo> {
        let entry = self.read().get(key)?;
        Some(ProviderInfo {
            key: entry.key.to_string(),
            kind: entry.kind,
            lifecycle: entry.lifecycle,
            produces: entry.shape.produced.name(),
            capability: entry
                .shape
                .capability
                .as_ref()
                .map(|capability| capability.token.name()),
            dependencies: entry
                .dependencies
                .iter()
                .map(|dependency| DependencyInfo {
                    key: (!dependency.is_by_type()).then(|| dependency.key().to_string()),
                    expected: dependency.expected().map(|token| token.name()),
                })
                .collect(),
            constructed: entry.cached().is_some(),
            hook: entry.hook_state(),
        })
    }

    /// Describe every registration, sorted by key
    pub fn snapshot(&self) -> Vec<ProviderInfo> {
        self.keys()
            .iter()
            .filter_map(|key| self.describe(key))
            .collect()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("keys", &self.keys())
            .finish()
    }
}

/// Read-only description of one registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub key: String,
    pub kind: ProviderKind,
    pub lifecycle: Lifecycle,
    /// Name of the produced type
    pub produces: &'static str,
    /// Name of the bound capability
    pub capability: Option<&'static str>,
    pub dependencies: Vec<DependencyInfo>,
    /// Whether a singleton instance has been cached
    pub constructed: bool,
    /// Hook progress, `None` when no hook is attached
    pub hook: Option<HookState>,
}

/// One dependency in a [`ProviderInfo`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyInfo {
    /// `None` for type-only dependencies
    pub key: Option<String>,
    pub expected: Option<&'static str>,
}
