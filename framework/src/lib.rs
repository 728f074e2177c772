//! Solanum: a typed service container
//!
//! Register providers under string keys, then resolve them by key, by
//! concrete type, or by a capability trait they are bound to. Factory
//! parameters are injected by type, singletons are built once even under
//! concurrent first use, and cycles are reported instead of overflowing the
//! stack.
//!
//! ```rust
//! use std::sync::Arc;
//! use solanum::{Container, Provider};
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English {
//!     name: Arc<String>,
//! }
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         format!("Hello, {}", self.name)
//!     }
//! }
//!
//! let container = Container::new();
//! container.register("name", Provider::value("Ada".to_string()));
//! container.register(
//!     "greeter",
//!     Provider::factory(|name: Arc<String>| English { name })
//!         .bind::<dyn Greeter>(|english| english as Arc<dyn Greeter>),
//! );
//!
//! let greeter = container.make::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "Hello, Ada");
//! ```

extern crate self as solanum;

pub mod config;
pub mod container;
pub mod error;

pub use config::ContainerConfig;
pub use container::testing::FakeGuard;
pub use container::{
    dependency, Container, DependencyDescriptor, DependencyInfo, Factory, HookState, Inject,
    Injectable, Instance, Lifecycle, Provider, ProviderInfo, ProviderKind, ProviderRegistration,
    TypeToken,
};
pub use error::{BoxError, Error, ErrorKind, Result};

// Re-export for macro usage
pub use solanum_macros::injectable;

#[doc(hidden)]
pub use inventory;
