//! Injection-point traits.
//!
//! [`Injectable`] is the per-type wiring contract: the weaver generates an
//! impl that resolves and assigns every `#[inject]` field, and plain types
//! can implement it by hand (or lean on the no-op default) to become
//! [`Context::inject_beans`](crate::Context::inject_beans) targets.
//!
//! [`InjectTarget`] is the type-erased view the resolution context uses
//! between zero-argument construction and singleton promotion: it lets the
//! context drive field injection on a freshly constructed value without
//! knowing its concrete type, then seal it into a shared handle.

use std::any::Any;

use crate::context::Context;
use crate::error::Result;

/// A type whose injection points can be satisfied from a resolution context.
pub trait Injectable {
    /// Resolve and assign every injection point of `self` in place.
    ///
    /// Repeated calls re-resolve: singleton-scoped fields receive the same
    /// cached instance again, prototype-scoped fields receive fresh ones.
    /// The default impl is a no-op for types without injection points.
    fn inject(&mut self, context: &Context) -> Result<()> {
        let _ = context;
        Ok(())
    }
}

/// Object-safe bridge over [`Injectable`] for freshly constructed beans.
///
/// Implemented blanket-wise for every `Injectable` type that can live in a
/// shared handle; registration entries produce `Box<dyn InjectTarget>` from
/// their zero-argument construction path.
pub trait InjectTarget: Any + Send + Sync {
    /// Type-erased [`Injectable::inject`].
    fn inject_dyn(&mut self, context: &Context) -> Result<()>;

    /// Recover the concrete value for sealing into a [`BeanHandle`](crate::BeanHandle).
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> InjectTarget for T
where
    T: Injectable + Send + Sync + 'static,
{
    fn inject_dyn(&mut self, context: &Context) -> Result<()> {
        Injectable::inject(self, context)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A constructed-but-not-yet-sealed bean, as produced by
/// [`BeanEntry::construct`](crate::BeanEntry).
pub type RawBean = Box<dyn InjectTarget>;
