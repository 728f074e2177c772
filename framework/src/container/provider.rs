//! Providers and auto-registration
//!
//! A [`Provider`] is the recipe registered under a key. It is built from one
//! of two shapes and then configured with chained options, applied in call
//! order (the last lifecycle setting wins):
//!
//! ```rust,ignore
//! use solanum::{dependency, Container, Provider};
//!
//! container.register(
//!     "mailer",
//!     Provider::factory(|config: Arc<MailConfig>| SmtpMailer::new(&config))
//!         .transient()
//!         .bind::<dyn Mailer>(|m| m)
//!         .depends_on(dependency::<MailConfig>("mail_config"))
//!         .on_init(|mailer: &SmtpMailer| mailer.warm_up()),
//! );
//! ```
//!
//! Types marked with `#[injectable]` are collected with `inventory` and can be
//! registered in bulk with [`Container::register_discovered`].

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::dependency::DependencyDescriptor;
use super::entry::{Constructor, Hook, Lifecycle, ProviderEntry, ProviderKind};
use super::factory::Factory;
use super::instance::{Capability, Instance, Shape, Value};
use super::token::TypeToken;
use super::Container;
use crate::error::{BoxError, Error};

/// A registration recipe producing values of type `T`
pub struct Provider<T> {
    kind: ProviderKind,
    constructor: Constructor,
    parameters: Vec<TypeToken>,
    explicit: Vec<DependencyDescriptor>,
    lifecycle: Option<Lifecycle>,
    hook: Option<Hook>,
    capability: Option<Capability>,
    _produces: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Provider<T> {
    fn from_parts(kind: ProviderKind, constructor: Constructor, parameters: Vec<TypeToken>) -> Self {
        Self {
            kind,
            constructor,
            parameters,
            explicit: Vec::new(),
            lifecycle: None,
            hook: None,
            capability: None,
            _produces: PhantomData,
        }
    }

    /// Provider backed by an infallible function
    ///
    /// Every parameter must be an `Arc<X>`; `X` is looked up by type unless an
    /// explicit dependency is declared for that position.
    ///
    /// # Example
    /// ```rust,ignore
    /// Provider::factory(|db: Arc<Database>| UserRepository::new(db))
    /// ```
    pub fn factory<F, Args>(factory: F) -> Self
    where
        F: Factory<Args, Output = T>,
    {
        let constructor: Constructor = Arc::new(move |key: &str, args: &[Instance]| {
            let value = Factory::call(&factory, key, args)?;
            Ok(Arc::new(value) as Value)
        });
        Self::from_parts(ProviderKind::Factory, constructor, F::parameters())
    }

    /// Provider backed by a function returning `Result<T, E>`
    ///
    /// An `Err` becomes a construction failure for the key; singletons only
    /// cache successful results, so a later resolve retries.
    ///
    /// # Example
    /// ```rust,ignore
    /// Provider::try_factory(|config: Arc<DbConfig>| Database::connect(&config.url))
    /// ```
    pub fn try_factory<F, Args, E>(factory: F) -> Self
    where
        F: Factory<Args, Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let constructor: Constructor = Arc::new(move |key: &str, args: &[Instance]| {
            match Factory::call(&factory, key, args)? {
                Ok(value) => Ok(Arc::new(value) as Value),
                Err(e) => Err(Error::construction(key, e)),
            }
        });
        Self::from_parts(ProviderKind::Factory, constructor, F::parameters())
    }

    /// Provider that always hands back the same value
    ///
    /// The lifecycle setting has no observable effect on value providers, and
    /// declared dependencies are ignored.
    pub fn value(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Like [`Provider::value`] for a value that is already behind an `Arc`
    pub fn shared(value: Arc<T>) -> Self {
        let value: Value = value;
        let constructor: Constructor =
            Arc::new(move |_key: &str, _args: &[Instance]| Ok(Arc::clone(&value)));
        Self::from_parts(ProviderKind::Value, constructor, Vec::new())
    }

    pub fn singleton(self) -> Self {
        self.lifecycle(Lifecycle::Singleton)
    }

    pub fn transient(self) -> Self {
        self.lifecycle(Lifecycle::Transient)
    }

    /// Set the lifecycle explicitly
    ///
    /// Without any lifecycle option the container's configured default is
    /// used.
    pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Attach a hook that runs once, after the first successful construction
    pub fn on_init<H>(mut self, hook: H) -> Self
    where
        H: Fn(&T) + Send + Sync + 'static,
    {
        let hook: Hook = Arc::new(move |value: &Value| {
            if let Some(instance) = value.downcast_ref::<T>() {
                hook(instance);
            }
        });
        self.hook = Some(hook);
        self
    }

    /// Bind this provider under the capability `C`
    ///
    /// The upcast is usually the identity closure, which the compiler turns
    /// into an unsizing coercion:
    ///
    /// ```rust,ignore
    /// Provider::value(English).bind::<dyn Greeter>(|e| e)
    /// ```
    pub fn bind<C>(mut self, upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.capability = Some(Capability::new::<T, C>(upcast));
        self
    }

    /// Declare the dependency for the next parameter position
    pub fn depends_on(mut self, dependency: DependencyDescriptor) -> Self {
        self.explicit.push(dependency);
        self
    }

    /// Replace every explicit dependency at once
    pub fn with_dependencies(
        mut self,
        dependencies: impl IntoIterator<Item = DependencyDescriptor>,
    ) -> Self {
        self.explicit = dependencies.into_iter().collect();
        self
    }

    /// Build the entry stored in the registry
    ///
    /// Explicit descriptors win position by position; positions past the end
    /// of the explicit list are inferred from the parameter types. Surplus
    /// explicit descriptors of a factory are kept so the arity check reports
    /// them; value providers drop them.
    pub(crate) fn into_entry(mut self, key: Arc<str>, default_lifecycle: Lifecycle) -> ProviderEntry {
        if self.kind == ProviderKind::Value && !self.explicit.is_empty() {
            debug!(
                key = %key,
                ignored = self.explicit.len(),
                "value provider ignores declared dependencies"
            );
            self.explicit.clear();
        }

        let arity = self.parameters.len();
        let mut dependencies: Vec<DependencyDescriptor> = self
            .parameters
            .iter()
            .enumerate()
            .map(|(position, token)| {
                self.explicit
                    .get(position)
                    .cloned()
                    .unwrap_or_else(|| DependencyDescriptor::by_type(*token))
            })
            .collect();
        dependencies.extend(self.explicit.iter().skip(arity).cloned());

        ProviderEntry::new(
            key,
            self.kind,
            self.lifecycle.unwrap_or(default_lifecycle),
            self.constructor,
            Shape::of::<T>(self.capability),
            dependencies,
            arity,
            self.hook,
        )
    }
}

/// Types that know how to build their own provider
///
/// Implemented by `#[injectable]`; can also be implemented by hand.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Key the type registers under
    const KEY: &'static str;

    fn provider() -> Provider<Self>;
}

/// Entry for inventory-collected registrations
///
/// Submitted by the `#[injectable]` macro; applied to a container by
/// [`Container::register_discovered`].
pub struct ProviderRegistration {
    /// Key the registration installs, for logging
    pub key: &'static str,
    /// Function performing the registration
    pub register: fn(&Container),
}

inventory::collect!(ProviderRegistration);

/// Every registration collected at link time
pub fn discovered() -> impl Iterator<Item = &'static ProviderRegistration> {
    inventory::iter::<ProviderRegistration>.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::dependency::dependency;

    struct Config;

    struct Repository;

    #[test]
    fn test_inferred_dependencies() {
        let entry = Provider::factory(|_: Arc<Config>, _: Arc<u32>| Repository)
            .into_entry(Arc::from("repo"), Lifecycle::Singleton);

        assert_eq!(
            entry.dependencies,
            vec![
                DependencyDescriptor::by_type(TypeToken::of::<Config>()),
                DependencyDescriptor::by_type(TypeToken::of::<u32>()),
            ]
        );
        assert_eq!(entry.arity, 2);
        assert_eq!(entry.kind, ProviderKind::Factory);
    }

    #[test]
    fn test_explicit_dependencies_win_by_position() {
        let entry = Provider::factory(|_: Arc<Config>, _: Arc<u32>| Repository)
            .depends_on(dependency::<Config>("primary_config"))
            .into_entry(Arc::from("repo"), Lifecycle::Singleton);

        assert_eq!(entry.dependencies[0], dependency::<Config>("primary_config"));
        assert_eq!(
            entry.dependencies[1],
            DependencyDescriptor::by_type(TypeToken::of::<u32>())
        );
    }

    #[test]
    fn test_surplus_dependencies_are_kept() {
        let entry = Provider::factory(|| Repository)
            .depends_on(dependency::<Config>("config"))
            .into_entry(Arc::from("repo"), Lifecycle::Singleton);

        assert_eq!(entry.arity, 0);
        assert_eq!(entry.dependencies.len(), 1);
        assert_eq!(entry.kind, ProviderKind::Factory);
    }

    #[test]
    fn test_value_provider_ignores_dependencies() {
        let entry = Provider::value(Repository)
            .depends_on(dependency::<Config>("config"))
            .into_entry(Arc::from("repo"), Lifecycle::Singleton);

        assert_eq!(entry.arity, 0);
        assert!(entry.dependencies.is_empty());
        assert_eq!(entry.kind, ProviderKind::Value);
    }

    #[test]
    fn test_last_lifecycle_option_wins() {
        let entry = Provider::value(Repository)
            .transient()
            .singleton()
            .transient()
            .into_entry(Arc::from("repo"), Lifecycle::Singleton);
        assert_eq!(entry.lifecycle, Lifecycle::Transient);

        let entry = Provider::value(Repository).into_entry(Arc::from("repo"), Lifecycle::Transient);
        assert_eq!(entry.lifecycle, Lifecycle::Transient);
    }

    #[test]
    fn test_with_dependencies_replaces_list() {
        let entry = Provider::factory(|_: Arc<Config>| Repository)
            .depends_on(dependency::<Config>("a"))
            .with_dependencies([dependency::<Config>("b")])
            .into_entry(Arc::from("repo"), Lifecycle::Singleton);

        assert_eq!(entry.dependencies, vec![dependency::<Config>("b")]);
    }
}
