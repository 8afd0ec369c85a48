//! Type-erased resolved instances.
//!
//! A [`BeanHandle`] is what the singleton cache stores and what registration
//! entries produce: one shared allocation, reachable both as the capability
//! trait object it was resolved for and as its concrete implementation type.
//! Both views are kept as `Arc<dyn Any>` wrapping the sized `Arc<T>`, so a
//! lookup by either `TypeId` can downcast without knowing the other side.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

/// A resolved instance together with its capability and concrete views.
///
/// Cloning a handle clones the views, never the instance: all clones point
/// at the same underlying allocation.
#[derive(Clone)]
pub struct BeanHandle {
    implementation: TypeId,
    implementation_name: &'static str,
    // Arc<dyn Any> wrapping Arc<dyn Capability>
    capability: Arc<dyn Any + Send + Sync>,
    // Arc<dyn Any> wrapping Arc<Implementation>
    concrete: Arc<dyn Any + Send + Sync>,
}

impl BeanHandle {
    /// Build a handle from the two views of one instance.
    ///
    /// `capability` and `concrete` must share the same allocation; the
    /// registration macros and manual-entry closures guarantee this by
    /// cloning one `Arc` into both parameters.
    pub fn from_parts<C, T>(capability: Arc<C>, concrete: Arc<T>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        Self {
            implementation: TypeId::of::<T>(),
            implementation_name: type_name::<T>(),
            capability: Arc::new(capability),
            concrete: Arc::new(concrete),
        }
    }

    /// Re-view the same instance under a different capability.
    ///
    /// Used by the hierarchy fallback (upcasting a narrow capability view to
    /// one of its super-capabilities) and by entries re-using an instance
    /// that was first resolved through a sibling capability.
    pub fn with_capability<C>(&self, capability: Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        Self {
            implementation: self.implementation,
            implementation_name: self.implementation_name,
            capability: Arc::new(capability),
            concrete: Arc::clone(&self.concrete),
        }
    }

    /// Extract the instance as `Arc<T>`, trying the capability view first
    /// and the concrete view second.
    pub fn view<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.capability
            .downcast_ref::<Arc<T>>()
            .cloned()
            .or_else(|| self.concrete.downcast_ref::<Arc<T>>().cloned())
    }

    /// `TypeId` of the concrete implementation behind this handle.
    pub fn implementation(&self) -> TypeId {
        self.implementation
    }

    /// Type name of the concrete implementation behind this handle.
    pub fn implementation_name(&self) -> &'static str {
        self.implementation_name
    }
}

impl fmt::Debug for BeanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanHandle")
            .field("implementation", &self.implementation_name)
            .finish()
    }
}
