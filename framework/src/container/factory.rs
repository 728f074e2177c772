//! Function providers
//!
//! [`Factory`] is implemented for every `Fn` of up to eight parameters whose
//! parameters implement [`Inject`]. The parameter types double as the
//! inferred dependency list: each one becomes a type-only descriptor.

use std::sync::Arc;

use super::instance::Instance;
use super::token::TypeToken;
use crate::error::{Error, Result};

/// A value a factory can receive as a parameter
pub trait Inject: Sized + Send + Sync + 'static {
    /// The type the container has to look up for this parameter
    fn token() -> TypeToken;

    /// Extract the parameter from a resolved instance
    fn from_instance(instance: &Instance) -> Result<Self>;
}

impl<T: ?Sized + Send + Sync + 'static> Inject for Arc<T> {
    fn token() -> TypeToken {
        TypeToken::of::<T>()
    }

    fn from_instance(instance: &Instance) -> Result<Self> {
        instance.cast::<T>()
    }
}

/// A constructor function taking injected parameters
///
/// `Args` is the tuple of parameter types; it only exists so the impls for
/// different arities do not overlap.
pub trait Factory<Args>: Send + Sync + 'static {
    type Output;

    /// Parameter types, in order
    fn parameters() -> Vec<TypeToken>;

    /// Call the function with already-resolved arguments
    ///
    /// `key` is the provider being built and only labels errors.
    fn call(&self, key: &str, args: &[Instance]) -> Result<Self::Output>;
}

macro_rules! impl_factory {
    ($($param:ident),*) => {
        impl<Func, Out, $($param,)*> Factory<($($param,)*)> for Func
        where
            Func: Fn($($param),*) -> Out + Send + Sync + 'static,
            $($param: Inject,)*
        {
            type Output = Out;

            fn parameters() -> Vec<TypeToken> {
                vec![$(<$param as Inject>::token()),*]
            }

            #[allow(non_snake_case)]
            fn call(&self, key: &str, args: &[Instance]) -> Result<Out> {
                let [$($param),*] = args else {
                    return Err(Error::Arity {
                        key: key.to_string(),
                        expected: Self::parameters().len(),
                        declared: args.len(),
                    });
                };
                $(let $param = <$param as Inject>::from_instance($param)?;)*
                Ok((self)($($param),*))
            }
        }
    };
}

impl_factory!();
impl_factory!(A1);
impl_factory!(A1, A2);
impl_factory!(A1, A2, A3);
impl_factory!(A1, A2, A3, A4);
impl_factory!(A1, A2, A3, A4, A5);
impl_factory!(A1, A2, A3, A4, A5, A6);
impl_factory!(A1, A2, A3, A4, A5, A6, A7);
impl_factory!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::instance::Shape;

    struct Config {
        name: &'static str,
    }

    struct Service {
        name: &'static str,
        retries: u32,
    }

    fn instance<T: Send + Sync + 'static>(key: &str, value: T) -> Instance {
        Instance::new(Arc::from(key), Arc::new(value), Arc::new(Shape::of::<T>(None)))
    }

    fn parameters_of<F: Factory<Args>, Args>(_: &F) -> Vec<TypeToken> {
        F::parameters()
    }

    #[test]
    fn test_parameters_are_inferred_from_signature() {
        let f = |_: Arc<Config>, _: Arc<u32>| ();

        assert_eq!(
            parameters_of(&f),
            vec![TypeToken::of::<Config>(), TypeToken::of::<u32>()]
        );
        assert!(parameters_of(&|| 1u8).is_empty());
    }

    #[test]
    fn test_call_passes_arguments_in_order() {
        let f = |config: Arc<Config>, retries: Arc<u32>| Service {
            name: config.name,
            retries: *retries,
        };
        let args = [instance("config", Config { name: "db" }), instance("retries", 3u32)];

        let service = Factory::call(&f, "service", &args).unwrap();
        assert_eq!(service.name, "db");
        assert_eq!(service.retries, 3);
    }

    #[test]
    fn test_call_rejects_wrong_argument_type() {
        let f = |retries: Arc<u32>| *retries;
        let args = [instance("retries", "three")];

        let err = Factory::call(&f, "service", &args).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { ref key, .. } if key == "retries"));
    }

    #[test]
    fn test_call_rejects_wrong_arity() {
        let f = |retries: Arc<u32>| *retries;

        let err = Factory::call(&f, "service", &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Arity { ref key, expected: 1, declared: 0 } if key == "service"
        ));
    }
}
