//! Provider entries
//!
//! One [`ProviderEntry`] exists per registered key. Everything but the
//! construction state is fixed at registration; the state itself is two
//! compare-and-set cells: the cached singleton instance and the hook flag.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::debug;

use super::dependency::DependencyDescriptor;
use super::instance::{Instance, Shape, Value};
use crate::error::Result;

/// Erased constructor: receives the key being built and the resolved arguments
pub(crate) type Constructor = Arc<dyn Fn(&str, &[Instance]) -> Result<Value> + Send + Sync>;

/// Erased post-construction hook
pub(crate) type Hook = Arc<dyn Fn(&Value) + Send + Sync>;

/// How long a constructed instance lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// The first successfully constructed instance is cached and reused
    #[default]
    Singleton,
    /// Every resolution runs the factory again
    Transient,
}

impl Lifecycle {
    pub fn is_singleton(&self) -> bool {
        matches!(self, Self::Singleton)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Transient => write!(f, "transient"),
        }
    }
}

impl FromStr for Lifecycle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Self::Singleton),
            "transient" => Ok(Self::Transient),
            other => Err(format!("unknown lifecycle '{}'", other)),
        }
    }
}

/// Which shape of provider an entry was registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// A function called with resolved dependencies
    Factory,
    /// A value built before registration
    Value,
}

/// Progress of an entry's post-construction hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookState {
    /// No instance has been built yet
    NotRun,
    /// The first resolver is running the hook
    Running,
    /// The hook has finished; it never runs again
    Done,
}

const HOOK_NOT_RUN: u8 = 0;
const HOOK_RUNNING: u8 = 1;
const HOOK_DONE: u8 = 2;

/// Registration record for one key
pub struct ProviderEntry {
    pub(crate) key: Arc<str>,
    pub(crate) kind: ProviderKind,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) constructor: Constructor,
    pub(crate) shape: Arc<Shape>,
    pub(crate) dependencies: Vec<DependencyDescriptor>,
    /// Number of parameters the constructor takes
    pub(crate) arity: usize,
    hook: Option<Hook>,
    cached: OnceLock<Instance>,
    hook_state: AtomicU8,
}

impl ProviderEntry {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        key: Arc<str>,
        kind: ProviderKind,
        lifecycle: Lifecycle,
        constructor: Constructor,
        shape: Shape,
        dependencies: Vec<DependencyDescriptor>,
        arity: usize,
        hook: Option<Hook>,
    ) -> Self {
        Self {
            key,
            kind,
            lifecycle,
            constructor,
            shape: Arc::new(shape),
            dependencies,
            arity,
            hook,
            cached: OnceLock::new(),
            hook_state: AtomicU8::new(HOOK_NOT_RUN),
        }
    }

    /// The cached singleton instance, once one has been stored
    pub(crate) fn cached(&self) -> Option<&Instance> {
        self.cached.get()
    }

    /// Store a freshly built singleton instance
    ///
    /// The first store wins. The returned instance is always the canonical
    /// stored one, which differs from `built` when another thread finished
    /// first.
    pub(crate) fn store(&self, built: Instance) -> Instance {
        let canonical = self.cached.get_or_init(|| built.clone());
        if !canonical.ptr_eq(&built) {
            debug!(key = %self.key, "discarding duplicate singleton construction");
        }
        canonical.clone()
    }

    /// Run the hook if this caller wins the NotRun -> Running transition
    pub(crate) fn dispatch_hook(&self, instance: &Instance) {
        let Some(hook) = &self.hook else {
            return;
        };
        if self
            .hook_state
            .compare_exchange(HOOK_NOT_RUN, HOOK_RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        debug!(key = %self.key, "running init hook");
        hook(instance.value());
        self.hook_state.store(HOOK_DONE, Ordering::Release);
    }

    pub(crate) fn hook_state(&self) -> Option<HookState> {
        self.hook.as_ref()?;
        Some(match self.hook_state.load(Ordering::Acquire) {
            HOOK_NOT_RUN => HookState::NotRun,
            HOOK_RUNNING => HookState::Running,
            _ => HookState::Done,
        })
    }
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("lifecycle", &self.lifecycle)
            .field("produces", &self.shape.produced)
            .field("dependencies", &self.dependencies)
            .field("constructed", &self.cached.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn entry(hook: Option<Hook>) -> ProviderEntry {
        let constructor: Constructor =
            Arc::new(|_key: &str, _args: &[Instance]| Ok(Arc::new(1u32) as Value));
        ProviderEntry::new(
            Arc::from("number"),
            ProviderKind::Factory,
            Lifecycle::Singleton,
            constructor,
            Shape::of::<u32>(None),
            Vec::new(),
            0,
            hook,
        )
    }

    fn build(entry: &ProviderEntry) -> Instance {
        let value = (entry.constructor)(&*entry.key, &[]).unwrap();
        Instance::new(entry.key.clone(), value, entry.shape.clone())
    }

    #[test]
    fn test_lifecycle_parsing() {
        assert_eq!("singleton".parse::<Lifecycle>(), Ok(Lifecycle::Singleton));
        assert_eq!(" Transient ".parse::<Lifecycle>(), Ok(Lifecycle::Transient));
        assert!("scoped".parse::<Lifecycle>().is_err());
        assert_eq!(Lifecycle::default(), Lifecycle::Singleton);
        assert_eq!(Lifecycle::Transient.to_string(), "transient");
    }

    #[test]
    fn test_first_store_wins() {
        let entry = entry(None);
        let first = build(&entry);
        let second = build(&entry);

        let stored = entry.store(first.clone());
        let raced = entry.store(second);

        assert!(stored.ptr_eq(&first));
        assert!(raced.ptr_eq(&first));
        assert!(entry.cached().unwrap().ptr_eq(&first));
    }

    #[test]
    fn test_hook_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hook: Hook = Arc::new(move |_value: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let entry = entry(Some(hook));
        assert_eq!(entry.hook_state(), Some(HookState::NotRun));

        let instance = build(&entry);
        entry.dispatch_hook(&instance);
        entry.dispatch_hook(&instance);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(entry.hook_state(), Some(HookState::Done));
    }

    #[test]
    fn test_no_hook_state_without_hook() {
        assert_eq!(entry(None).hook_state(), None);
    }
}
