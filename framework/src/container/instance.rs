//! Resolved instances
//!
//! The container stores every instance type-erased as
//! `Arc<dyn Any + Send + Sync>`. An [`Instance`] pairs that value with the
//! [`Shape`] of the entry that produced it, which knows how to view the value
//! as its concrete type or as the capability it was bound to.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::token::TypeToken;
use crate::error::{Error, Result};

/// Type-erased instance value
pub(crate) type Value = Arc<dyn Any + Send + Sync>;

/// Converts an erased value into a boxed `Arc<X>` for one target type `X`
pub(crate) type View = Arc<dyn Fn(Value) -> Option<Box<dyn Any + Send>> + Send + Sync>;

/// A capability binding: the `dyn Trait` token plus the upcast into it
#[derive(Clone)]
pub(crate) struct Capability {
    pub(crate) token: TypeToken,
    view: View,
}

impl Capability {
    pub(crate) fn new<T, C>(upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        T: Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
    {
        let view: View = Arc::new(move |value: Value| {
            value
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(upcast(concrete)) as Box<dyn Any + Send>)
        });
        Self {
            token: TypeToken::of::<C>(),
            view,
        }
    }
}

/// Type information shared by every instance an entry produces
pub(crate) struct Shape {
    pub(crate) produced: TypeToken,
    produced_view: View,
    pub(crate) capability: Option<Capability>,
}

impl Shape {
    pub(crate) fn of<T: Send + Sync + 'static>(capability: Option<Capability>) -> Self {
        let produced_view: View = Arc::new(|value: Value| {
            value
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(concrete) as Box<dyn Any + Send>)
        });
        Self {
            produced: TypeToken::of::<T>(),
            produced_view,
            capability,
        }
    }

    fn view(&self, token: TypeToken) -> Option<&View> {
        if token == self.produced {
            return Some(&self.produced_view);
        }
        self.capability
            .as_ref()
            .filter(|capability| capability.token == token)
            .map(|capability| &capability.view)
    }

    pub(crate) fn satisfies(&self, token: TypeToken) -> bool {
        self.view(token).is_some()
    }
}

/// A resolved instance
///
/// Cloning an `Instance` is cheap and keeps pointing at the same value, so a
/// singleton's instances all compare equal with [`Instance::ptr_eq`].
///
/// # Example
/// ```rust,ignore
/// let instance = container.resolve("greeter")?;
/// let greeter: Arc<dyn Greeter> = instance.cast()?;
/// ```
#[derive(Clone)]
pub struct Instance {
    key: Arc<str>,
    value: Value,
    shape: Arc<Shape>,
}

impl Instance {
    pub(crate) fn new(key: Arc<str>, value: Value, shape: Arc<Shape>) -> Self {
        Self { key, value, shape }
    }

    /// The key this instance was resolved from
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Token of the concrete type the provider produced
    pub fn type_token(&self) -> TypeToken {
        self.shape.produced
    }

    /// Name of the concrete type the provider produced
    pub fn type_name(&self) -> &'static str {
        self.shape.produced.name()
    }

    /// The capability this instance's provider was bound to, if any
    pub fn capability(&self) -> Option<TypeToken> {
        self.shape.capability.as_ref().map(|capability| capability.token)
    }

    /// Whether the instance can be viewed as the type behind `token`
    ///
    /// True for the produced type and for the bound capability.
    pub fn satisfies(&self, token: TypeToken) -> bool {
        self.shape.satisfies(token)
    }

    /// Shorthand for `satisfies(TypeToken::of::<T>())`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.satisfies(TypeToken::of::<T>())
    }

    /// View the instance as `Arc<T>`, where `T` is the produced type or the
    /// bound capability
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let view = self.shape.view(TypeToken::of::<T>())?;
        view(Arc::clone(&self.value))?
            .downcast::<Arc<T>>()
            .ok()
            .map(|boxed| *boxed)
    }

    /// Like [`Instance::get`], reporting a TypeMismatch instead of `None`
    pub fn cast<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get::<T>().ok_or_else(|| {
            Error::type_mismatch(self.key(), TypeToken::of::<T>(), self.type_token())
        })
    }

    /// Borrow the concrete value
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether both instances share the same underlying value
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    pub(crate) fn value(&self) -> &Value {
        &self.value
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("key", &self.key)
            .field("type", &self.type_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    trait Farewell: Send + Sync + std::fmt::Debug {}

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    fn english(capability: Option<Capability>) -> Instance {
        Instance::new(
            Arc::from("greeter"),
            Arc::new(English),
            Arc::new(Shape::of::<English>(capability)),
        )
    }

    #[test]
    fn test_concrete_view() {
        let instance = english(None);

        assert!(instance.is::<English>());
        assert!(instance.get::<English>().is_some());
        assert!(instance.downcast_ref::<English>().is_some());
        assert_eq!(instance.key(), "greeter");
    }

    #[test]
    fn test_capability_view() {
        let capability = Capability::new::<English, dyn Greeter>(|e| e as Arc<dyn Greeter>);
        let instance = english(Some(capability));

        assert!(instance.is::<dyn Greeter>());
        assert_eq!(instance.capability(), Some(TypeToken::of::<dyn Greeter>()));
        let greeter = instance.cast::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_unbound_capability_is_mismatch() {
        let instance = english(None);

        assert!(!instance.is::<dyn Farewell>());
        let err = instance.cast::<dyn Farewell>().unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_clones_share_value() {
        let a = english(None);
        let b = a.clone();
        let c = english(None);

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
