//! Attribute macros for the beanwire runtime.
//!
//! Two attributes cover the registration surface:
//!
//! - [`macro@capability`] marks a trait as a resolvable capability and
//!   records its super-capability edges for the hierarchy fallback.
//! - [`macro@injectable`] registers an implementation type under one or more
//!   capabilities and generates its injection impl from `#[inject]` fields.
//!
//! Both expand against the `beanwire` facade crate; use them through it.

use proc_macro::TokenStream;

mod capability;
mod injectable;

/// Mark a trait as a resolvable capability.
///
/// The trait must declare `Send + Sync` supertraits so resolved instances
/// can be shared across threads. Non-marker supertraits become
/// super-capability edges: a request for the broader trait can be satisfied
/// by an implementation registered under this one.
///
/// ```ignore
/// #[capability]
/// pub trait GreeterService: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// ```
#[proc_macro_attribute]
pub fn capability(attr: TokenStream, item: TokenStream) -> TokenStream {
    capability::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Register an implementation type and generate its injection impl.
///
/// The type must be a named-field struct implementing `Default`; fields
/// carrying `#[inject]` are resolved from the context after construction.
/// Supported shapes are `Option<Arc<dyn Capability>>` and
/// `Arc<dyn Capability>` (single best implementation; the `Option` form
/// defaults to `None` and is what `#[derive(Default)]` needs) and
/// `Vec<Arc<dyn Capability>>` (every implementation).
///
/// ```ignore
/// #[injectable(capability = GreeterService, singleton, priority = 1)]
/// #[derive(Default)]
/// pub struct EnglishGreeter {
///     #[inject]
///     clock: Option<Arc<dyn Clock>>,
/// }
/// ```
///
/// Accepted arguments: `capability = Path`, `capabilities(A, B)`,
/// `singleton`, `prototype`, `priority = N`, `marker = "name"` and `wired`.
/// Without a capability the attribute only generates the injection impl, for
/// types wired in place via `Context::inject_beans`. Scope markers are
/// emitted only when asked for; an unmarked registration resolves as
/// prototype. `wired` declares that construction already satisfies the
/// type's injection points and is rejected alongside `#[inject]` fields.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    injectable::expand(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
