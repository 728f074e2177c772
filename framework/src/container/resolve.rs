//! Resolution engine
//!
//! Lookups take the registry's read lock just long enough to clone the
//! entry out. Dependencies, factories and hooks all run with no lock held, so
//! a factory may itself resolve other keys from the same container.
//!
//! Singletons are "first store wins": two threads resolving a cold singleton
//! at the same time may both run the factory, but only one instance is kept
//! and both callers get that one.

use std::cell::RefCell;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::dependency::DependencyDescriptor;
use super::entry::{Lifecycle, ProviderEntry};
use super::instance::Instance;
use super::token::TypeToken;
use super::Container;
use crate::error::{Error, Result};

// Keys currently under construction on this thread, tagged with the owning
// container so two containers can share key names.
thread_local! {
    static RESOLVING: RefCell<Vec<(u64, Arc<str>)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a key as under construction until dropped
struct ResolveGuard;

impl ResolveGuard {
    fn enter(container: u64, key: &Arc<str>, max_depth: usize) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            let frames: Vec<&Arc<str>> = stack
                .iter()
                .filter(|(id, _)| *id == container)
                .map(|(_, k)| k)
                .collect();

            if let Some(start) = frames.iter().position(|k| ***k == **key) {
                let mut path: Vec<String> = frames[start..].iter().map(|k| k.to_string()).collect();
                path.push(key.to_string());
                return Err(Error::Cycle { path });
            }
            if frames.len() >= max_depth {
                return Err(Error::DepthExceeded {
                    key: key.to_string(),
                    max_depth,
                });
            }

            stack.push((container, Arc::clone(key)));
            Ok(ResolveGuard)
        })
    }
}

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl Container {
    /// Resolve the instance registered under `key`
    ///
    /// Singletons are built on first use and cached; transients are built on
    /// every call. Dependencies are resolved recursively first.
    ///
    /// # Example
    /// ```rust,ignore
    /// let instance = container.resolve("counter")?;
    /// let counter: Arc<Counter> = instance.cast()?;
    /// ```
    pub fn resolve(&self, key: &str) -> Result<Instance> {
        let entry = self.entry(key)?;
        if let Some(instance) = entry.cached() {
            trace!(key, "singleton cache hit");
            return Ok(instance.clone());
        }

        let instance = {
            let _guard = ResolveGuard::enter(self.id, &entry.key, self.config.max_depth)?;
            let built = self.construct(&entry)?;
            match entry.lifecycle {
                Lifecycle::Singleton => entry.store(built),
                Lifecycle::Transient => built,
            }
        };

        entry.dispatch_hook(&instance);
        Ok(instance)
    }

    /// Resolve `key` and check the instance satisfies `expected`
    ///
    /// `expected` may be the produced type or the capability the provider
    /// was bound to. `None` skips the check.
    pub fn resolve_by_type(&self, key: &str, expected: Option<TypeToken>) -> Result<Instance> {
        let instance = self.resolve(key)?;
        match expected {
            Some(expected) if !instance.satisfies(expected) => Err(Error::type_mismatch(
                key,
                expected,
                instance.type_token(),
            )),
            _ => Ok(instance),
        }
    }

    /// Resolve `key` as `Arc<T>`
    ///
    /// # Example
    /// ```rust,ignore
    /// let greeter: Arc<dyn Greeter> = container.resolve_as::<dyn Greeter>("greeter")?;
    /// ```
    pub fn resolve_as<T: ?Sized + Send + Sync + 'static>(&self, key: &str) -> Result<Arc<T>> {
        self.resolve(key)?.cast::<T>()
    }

    /// Resolve whichever provider satisfies `token`
    ///
    /// The capability index is consulted first, then the produced-type index.
    pub fn resolve_type(&self, token: TypeToken) -> Result<Instance> {
        let key = self.read().key_for(token)?;
        trace!(%token, key = %key, "resolved type to key");
        self.resolve(&key)
    }

    /// Resolve `Arc<T>` by type alone
    ///
    /// # Example
    /// ```rust,ignore
    /// let cache: Arc<dyn Cache> = container.make::<dyn Cache>()?;
    /// ```
    pub fn make<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.resolve_type(TypeToken::of::<T>())?.cast::<T>()
    }

    fn entry(&self, key: &str) -> Result<Arc<ProviderEntry>> {
        self.read().get(key).ok_or_else(|| Error::not_found(key))
    }

    fn construct(&self, entry: &ProviderEntry) -> Result<Instance> {
        if entry.dependencies.len() != entry.arity {
            return Err(Error::Arity {
                key: entry.key.to_string(),
                expected: entry.arity,
                declared: entry.dependencies.len(),
            });
        }

        let mut args = Vec::with_capacity(entry.arity);
        for dependency in &entry.dependencies {
            let instance = self.resolve_dependency(dependency).map_err(|source| {
                warn!(
                    key = %entry.key,
                    dependency = %dependency.label(),
                    error = %source,
                    "dependency resolution failed"
                );
                Error::dependency(&*entry.key, dependency.label(), source)
            })?;
            args.push(instance);
        }

        debug!(key = %entry.key, lifecycle = %entry.lifecycle, "constructing instance");
        let value = (entry.constructor)(&*entry.key, &args)?;
        Ok(Instance::new(
            Arc::clone(&entry.key),
            value,
            Arc::clone(&entry.shape),
        ))
    }

    fn resolve_dependency(&self, dependency: &DependencyDescriptor) -> Result<Instance> {
        if !dependency.is_by_type() {
            return self.resolve_by_type(dependency.key(), dependency.expected());
        }
        match dependency.expected() {
            Some(token) => self.resolve_type(token),
            None => Err(Error::not_found(dependency.key())),
        }
    }
}
