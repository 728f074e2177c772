//! Container-wide error types
//!
//! Every failure of the container is returned as an [`Error`]; nothing in the
//! resolution path panics. [`Error::kind`] classifies an error into one of the
//! broad [`ErrorKind`] categories so callers can decide how to react without
//! matching on every variant.

use thiserror::Error;

use crate::container::TypeToken;

/// Boxed error returned by fallible user factories
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad failure categories
///
/// # Example
///
/// ```rust,ignore
/// match container.resolve("mailer") {
///     Err(e) if e.kind() == ErrorKind::NotFound => fallback(),
///     other => other?,
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Key absent, or a type-only lookup found no provider
    NotFound,
    /// A type-only lookup matched more than one key
    Ambiguous,
    /// The resolved instance does not satisfy the requested type
    TypeMismatch,
    /// The factory reported an error, or its wiring is inconsistent
    ConstructionFailure,
    /// The dependency graph loops back on itself or is too deep
    Cycle,
}

/// Container error type
///
/// Each variant carries the offending key and, where relevant, the expected
/// and actual types.
///
/// # Example
///
/// ```rust,ignore
/// use solanum::{Container, Error};
///
/// let container = Container::new();
/// match container.resolve("missing") {
///     Err(Error::NotFound { key }) => assert_eq!(key, "missing"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// No provider registered under the key
    #[error("no provider registered for key '{key}'")]
    NotFound {
        /// The key that was requested
        key: String,
    },

    /// A type-only lookup found no provider
    #[error("no provider registered for type '{expected}'")]
    NoProviderForType {
        /// The requested type
        expected: &'static str,
    },

    /// A type-only lookup found more than one provider
    #[error("type '{expected}' is provided by several keys: {}", .keys.join(", "))]
    Ambiguous {
        /// The requested type
        expected: &'static str,
        /// Every key producing that type, in registration order
        keys: Vec<String>,
    },

    /// The resolved instance does not satisfy the requested type
    #[error("provider '{key}' produces '{actual}', which does not satisfy '{expected}'")]
    TypeMismatch {
        /// The key that was resolved
        key: String,
        /// The requested type or capability
        expected: &'static str,
        /// The type the provider actually produces
        actual: &'static str,
    },

    /// The factory itself reported an error
    #[error("provider '{key}' failed to construct: {source}")]
    Construction {
        /// The key whose factory failed
        key: String,
        /// The factory's error
        #[source]
        source: BoxError,
    },

    /// The factory's parameters do not line up with its declared dependencies
    #[error("provider '{key}' takes {expected} argument(s) but {declared} dependencies are declared")]
    Arity {
        /// The key being constructed
        key: String,
        /// Number of factory parameters
        expected: usize,
        /// Number of dependency descriptors
        declared: usize,
    },

    /// A dependency of the key could not be resolved
    #[error("failed to resolve dependency '{dependency}' of '{key}': {source}")]
    Dependency {
        /// The key being constructed
        key: String,
        /// The dependency key, or its type name for type-only dependencies
        dependency: String,
        /// Why the dependency failed
        #[source]
        source: Box<Error>,
    },

    /// Resolution re-entered a key that is already being constructed
    #[error("dependency cycle detected: {}", .path.join(" -> "))]
    Cycle {
        /// The resolution path, ending with the repeated key
        path: Vec<String>,
    },

    /// Resolution nested deeper than the configured maximum
    #[error("resolving '{key}' exceeded the maximum depth of {max_depth}")]
    DepthExceeded {
        /// The key that would have exceeded the limit
        key: String,
        /// The configured limit
        max_depth: usize,
    },
}

impl Error {
    /// Create a NotFound error for a key
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a NoProviderForType error
    pub fn no_provider_for(expected: TypeToken) -> Self {
        Self::NoProviderForType {
            expected: expected.name(),
        }
    }

    /// Create an Ambiguous error
    pub fn ambiguous(expected: TypeToken, keys: Vec<String>) -> Self {
        Self::Ambiguous {
            expected: expected.name(),
            keys,
        }
    }

    /// Create a TypeMismatch error
    pub fn type_mismatch(key: impl Into<String>, expected: TypeToken, actual: TypeToken) -> Self {
        Self::TypeMismatch {
            key: key.into(),
            expected: expected.name(),
            actual: actual.name(),
        }
    }

    /// Create a Construction error from a factory failure
    pub fn construction(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Construction {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Wrap the failure of one dependency of `key`
    pub fn dependency(key: impl Into<String>, dependency: impl Into<String>, source: Error) -> Self {
        Self::Dependency {
            key: key.into(),
            dependency: dependency.into(),
            source: Box::new(source),
        }
    }

    /// Classify this error
    ///
    /// Dependency failures report the kind of their root cause, so a wrapper
    /// whose type-only dependency is ambiguous is itself `Ambiguous`. The same
    /// holds for a construction failure caused by a nested `resolve` inside a
    /// factory.
    pub fn kind(&self) -> ErrorKind {
        if let Some(nested) = self.nested() {
            return nested.kind();
        }
        match self {
            Self::NotFound { .. } | Self::NoProviderForType { .. } => ErrorKind::NotFound,
            Self::Ambiguous { .. } => ErrorKind::Ambiguous,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Construction { .. } | Self::Arity { .. } => ErrorKind::ConstructionFailure,
            Self::Dependency { source, .. } => source.kind(),
            Self::Cycle { .. } | Self::DepthExceeded { .. } => ErrorKind::Cycle,
        }
    }

    /// The innermost error, skipping `Dependency` wrappers and construction
    /// failures that carry a container error
    pub fn root_cause(&self) -> &Error {
        match self.nested() {
            Some(nested) => nested.root_cause(),
            None => self,
        }
    }

    fn nested(&self) -> Option<&Error> {
        match self {
            Self::Dependency { source, .. } => Some(&**source),
            Self::Construction { source, .. } => source.downcast_ref::<Error>(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::not_found("a").kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::no_provider_for(TypeToken::of::<u8>()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::ambiguous(TypeToken::of::<u8>(), vec!["a".into(), "b".into()]).kind(),
            ErrorKind::Ambiguous
        );
        assert_eq!(
            Error::construction("a", "boom").kind(),
            ErrorKind::ConstructionFailure
        );
        assert_eq!(
            Error::Cycle {
                path: vec!["a".into(), "a".into()]
            }
            .kind(),
            ErrorKind::Cycle
        );
    }

    #[test]
    fn test_dependency_wrapper_reports_root_kind() {
        let inner = Error::ambiguous(TypeToken::of::<u8>(), vec!["a".into(), "b".into()]);
        let outer = Error::dependency("wrapper", "u8", inner);
        let outermost = Error::dependency("app", "wrapper", outer);

        assert_eq!(outermost.kind(), ErrorKind::Ambiguous);
        assert!(matches!(outermost.root_cause(), Error::Ambiguous { .. }));
    }

    #[test]
    fn test_construction_from_nested_resolve_reports_inner_kind() {
        let cycle = Error::Cycle {
            path: vec!["loop".into(), "loop".into()],
        };
        let err = Error::construction("loop", cycle);

        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert!(matches!(err.root_cause(), Error::Cycle { .. }));

        let plain = Error::construction("db", "connection refused");
        assert_eq!(plain.kind(), ErrorKind::ConstructionFailure);
        assert!(matches!(plain.root_cause(), Error::Construction { .. }));
    }

    #[test]
    fn test_messages() {
        let err = Error::ambiguous(TypeToken::of::<u8>(), vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "type 'u8' is provided by several keys: a, b");

        let err = Error::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle detected: a -> b -> a");

        let err = Error::type_mismatch("bad", TypeToken::of::<u8>(), TypeToken::of::<String>());
        assert_eq!(
            err.to_string(),
            "provider 'bad' produces 'alloc::string::String', which does not satisfy 'u8'"
        );
    }
}
