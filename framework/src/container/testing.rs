//! Test fakes for the container
//!
//! Swap a registration for the duration of a test and get the previous one back
//! when the guard drops.
//!
//! # Example
//!
//! ```rust,ignore
//! #[test]
//! fn test_with_fake_mailer() {
//!     let container = app_container();
//!     let _guard = container.fake("mailer", Provider::value(FakeMailer::default()));
//!
//!     // container.resolve("mailer") now returns the fake
//! }
//! // the real mailer registration is back here
//! ```

use std::sync::Arc;

use tracing::debug;

use super::provider::Provider;
use super::registry::Registration;
use super::Container;

/// Restores the faked key when dropped
#[must_use = "the fake is removed as soon as the guard is dropped"]
pub struct FakeGuard<'a> {
    container: &'a Container,
    key: String,
    previous: Option<Registration>,
}

impl Container {
    /// Register `provider` under `key` until the returned guard drops
    ///
    /// The previous registration, including its cached singleton and its
    /// place in the capability order, is put back afterwards. If the key was
    /// not registered it is removed again.
    pub fn fake<T: Send + Sync + 'static>(
        &self,
        key: impl Into<String>,
        provider: Provider<T>,
    ) -> FakeGuard<'_> {
        let key = key.into();
        let entry = provider.into_entry(Arc::from(key.as_str()), self.config.default_lifecycle);
        let previous = self.write().insert(Arc::new(entry));
        debug!(key = %key, replaced = previous.is_some(), "installed fake provider");

        FakeGuard {
            container: self,
            key,
            previous,
        }
    }
}

impl Drop for FakeGuard<'_> {
    fn drop(&mut self) {
        let mut registry = self.container.write();
        match self.previous.take() {
            Some(previous) => {
                registry.restore(previous);
            }
            None => {
                registry.remove(&self.key);
            }
        }
        debug!(key = %self.key, "removed fake provider");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Mailer: Send + Sync {
        fn send(&self) -> &'static str;
    }

    struct Smtp;
    impl Mailer for Smtp {
        fn send(&self) -> &'static str {
            "smtp"
        }
    }

    struct FakeMailer;
    impl Mailer for FakeMailer {
        fn send(&self) -> &'static str {
            "fake"
        }
    }

    #[test]
    fn test_fake_replaces_and_restores() {
        let container = Container::new();
        container.register(
            "mailer",
            Provider::value(Smtp).bind::<dyn Mailer>(|m| m as Arc<dyn Mailer>),
        );
        let real = container.resolve("mailer").unwrap();

        {
            let _guard = container.fake(
                "mailer",
                Provider::value(FakeMailer).bind::<dyn Mailer>(|m| m as Arc<dyn Mailer>),
            );
            assert_eq!(container.make::<dyn Mailer>().unwrap().send(), "fake");
        }

        assert_eq!(container.make::<dyn Mailer>().unwrap().send(), "smtp");
        assert!(container.resolve("mailer").unwrap().ptr_eq(&real));
    }

    #[test]
    fn test_fake_under_new_key_restores_capability() {
        let container = Container::new();
        container.register(
            "smtp",
            Provider::value(Smtp).bind::<dyn Mailer>(|m| m as Arc<dyn Mailer>),
        );

        {
            let _guard = container.fake(
                "fake_mailer",
                Provider::value(FakeMailer).bind::<dyn Mailer>(|m| m as Arc<dyn Mailer>),
            );
            assert_eq!(container.make::<dyn Mailer>().unwrap().send(), "fake");
        }

        assert!(!container.contains("fake_mailer"));
        assert_eq!(container.make::<dyn Mailer>().unwrap().send(), "smtp");
    }

    #[test]
    fn test_fake_of_unknown_key_is_removed() {
        let container = Container::new();
        {
            let _guard = container.fake("clock", Provider::value(0u64));
            assert!(container.contains("clock"));
        }
        assert!(!container.contains("clock"));
    }
}
