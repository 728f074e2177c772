//! Dependency descriptors
//!
//! A descriptor names one parameter a factory needs: either a key (resolved
//! directly) or, with an empty key, just the expected type (resolved through
//! the capability and produced-type indices).

use super::token::TypeToken;

/// A `(key, expected type)` pair describing one factory parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDescriptor {
    key: String,
    expected: Option<TypeToken>,
}

impl DependencyDescriptor {
    /// Create a descriptor from its parts
    ///
    /// An empty `key` means "resolve by type only".
    pub fn new(key: impl Into<String>, expected: Option<TypeToken>) -> Self {
        Self {
            key: key.into(),
            expected,
        }
    }

    /// Descriptor that resolves purely by type
    pub fn by_type(expected: TypeToken) -> Self {
        Self::new(String::new(), Some(expected))
    }

    /// Descriptor that resolves by key without any type check
    pub fn by_key(key: impl Into<String>) -> Self {
        Self::new(key, None)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn expected(&self) -> Option<TypeToken> {
        self.expected
    }

    /// True when the key is empty and resolution goes through the type indices
    pub fn is_by_type(&self) -> bool {
        self.key.is_empty()
    }

    /// The key, or the expected type's name for type-only descriptors
    pub fn label(&self) -> String {
        match (self.is_by_type(), self.expected) {
            (false, _) => self.key.clone(),
            (true, Some(token)) => token.name().to_string(),
            (true, None) => "<untyped>".to_string(),
        }
    }
}

/// Describe a dependency on `key` whose instance must satisfy `T`
///
/// `T` is the service type itself (a concrete type or a `dyn Trait`
/// capability), not the `Arc` handle the factory receives.
///
/// # Example
/// ```rust,ignore
/// container.register(
///     "users",
///     Provider::factory(|db: Arc<dyn Database>| UserService::new(db))
///         .depends_on(dependency::<dyn Database>("primary_db")),
/// );
/// ```
pub fn dependency<T: ?Sized + 'static>(key: impl Into<String>) -> DependencyDescriptor {
    DependencyDescriptor::new(key, Some(TypeToken::of::<T>()))
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Store {}

    #[test]
    fn test_dependency_captures_type() {
        let dep = dependency::<dyn Store>("primary");

        assert_eq!(dep.key(), "primary");
        assert_eq!(dep.expected(), Some(TypeToken::of::<dyn Store>()));
        assert!(!dep.is_by_type());
        assert_eq!(dep.label(), "primary");
    }

    #[test]
    fn test_empty_key_is_by_type() {
        let dep = dependency::<u32>("");

        assert!(dep.is_by_type());
        assert_eq!(dep, DependencyDescriptor::by_type(TypeToken::of::<u32>()));
        assert_eq!(dep.label(), "u32");
    }

    #[test]
    fn test_untyped_descriptor() {
        let dep = DependencyDescriptor::by_key("config");

        assert_eq!(dep.expected(), None);
        assert_eq!(DependencyDescriptor::new("", None).label(), "<untyped>");
    }
}
