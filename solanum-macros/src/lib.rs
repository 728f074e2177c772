//! Procedural macros for Solanum
//!
//! - `#[injectable]`: implement `Injectable` for a struct and submit it for
//!   auto-registration

use proc_macro::TokenStream;

mod injectable;

/// Make a struct injectable and auto-register it
///
/// Fields marked `#[inject]` must be `Arc<T>` and are resolved by type;
/// `#[inject(key = "...")]` resolves that field from a specific key. Every
/// other field is filled with `Default::default()`.
///
/// Arguments:
/// - `key = "..."`: registration key, defaults to the snake_case type name
/// - `transient`: build a new instance per resolution
///
/// # Example
///
/// ```rust,ignore
/// use solanum::injectable;
/// use std::sync::Arc;
///
/// #[injectable(key = "users", transient)]
/// pub struct UserService {
///     #[inject]
///     repository: Arc<UserRepository>,
///     #[inject(key = "primary_db")]
///     db: Arc<Database>,
///     requests: AtomicU64,
/// }
///
/// container.register_discovered();
/// let users = container.resolve_as::<UserService>("users")?;
/// ```
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, input: TokenStream) -> TokenStream {
    injectable::injectable_impl(attr, input)
}
