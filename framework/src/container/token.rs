//! Type tokens
//!
//! A [`TypeToken`] identifies a Rust type at runtime. Tokens are produced from
//! generics (`TypeToken::of::<T>()`) so concrete types and `dyn Trait`
//! capabilities share one key space in the container's indices.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identifier for a concrete type or a trait object type
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Token for `T`, which may be unsized (`dyn Trait`, `str`, ...)
    ///
    /// # Example
    /// ```rust,ignore
    /// let concrete = TypeToken::of::<Database>();
    /// let capability = TypeToken::of::<dyn Cache>();
    /// ```
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human readable type name, used in errors and logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether this token denotes `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

// Equality and hashing only look at the TypeId; names are informational.
impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
