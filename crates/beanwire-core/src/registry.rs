//! Registration manifest
//!
//! Auto-registration infrastructure for implementation types, using `linkme`
//! distributed slices. Implementations submit one [`BeanEntry`] per
//! capability they satisfy and are discovered at resolution time; capability
//! traits may additionally submit a [`CapabilityInfo`] describing their
//! super-capabilities, which powers the interface-hierarchy fallback.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     Registration Flow                          │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                │
//! │  1. Impl submits:    #[linkme::distributed_slice(BEANS)]       │
//! │                      static ENTRY: BeanEntry = ...             │
//! │                            ↓                                   │
//! │  2. Context queries: BEANS.iter()  (+ per-boundary runtime     │
//! │                      table, see Context::register_entry)       │
//! │                            ↓                                   │
//! │  3. Selection:       priority sort → construct → inject →      │
//! │                      singleton promotion                       │
//! │                                                                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Manual registration
//!
//! The `#[injectable]` attribute generates entries, but hand-written ones
//! are a first-class path:
//!
//! ```ignore
//! #[linkme::distributed_slice(BEANS)]
//! static GREETER: BeanEntry = BeanEntry {
//!     capability: || TypeId::of::<dyn GreeterService>(),
//!     capability_name: "GreeterService",
//!     implementation: || TypeId::of::<EnglishGreeter>(),
//!     implementation_name: "EnglishGreeter",
//!     priority: 1,
//!     markers: &[Marker::Singleton],
//!     construct: || Ok(Box::new(EnglishGreeter::default())),
//!     seal: seal_bean!(dyn GreeterService, EnglishGreeter),
//!     recast: recast_bean!(dyn GreeterService, EnglishGreeter),
//! };
//! ```

use std::any::TypeId;

use crate::error::Result;
use crate::handle::BeanHandle;
use crate::injectable::RawBean;
use crate::marker::Marker;

/// Lowest precedence; the priority assigned to entries without an explicit
/// ordering marker.
pub const DEFAULT_PRIORITY: u16 = u16::MAX;

/// One (capability, implementation) pair of the registration manifest.
///
/// All fields are plain data or function pointers so entries can live in
/// `static`s inside the distributed slice and be copied into per-boundary
/// runtime tables.
#[derive(Clone, Copy)]
pub struct BeanEntry {
    /// Identity of the capability this entry is registered under.
    pub capability: fn() -> TypeId,
    /// Capability name for diagnostics.
    pub capability_name: &'static str,
    /// Identity of the concrete implementation type.
    pub implementation: fn() -> TypeId,
    /// Implementation name for diagnostics.
    pub implementation_name: &'static str,
    /// Selection precedence; lower wins. Defaults to [`DEFAULT_PRIORITY`].
    pub priority: u16,
    /// Markers attached at definition time; read-only at resolution time.
    pub markers: &'static [Marker],
    /// Zero-argument construction path. Parameterized construction is not
    /// supported; failures are wrapped as construction errors.
    pub construct: fn() -> Result<RawBean>,
    /// Seal a constructed (and, unless wired, injected) value into a handle
    /// exposing this entry's capability view.
    pub seal: fn(RawBean) -> Result<BeanHandle>,
    /// Rebuild this entry's capability view from an already-cached handle of
    /// the same implementation (resolved first through a sibling capability).
    pub recast: fn(&BeanHandle) -> Option<BeanHandle>,
}

impl BeanEntry {
    /// Whether the entry's construction path already satisfies its own
    /// injection points.
    pub fn is_wired(&self) -> bool {
        self.markers.contains(&Marker::Wired)
    }
}

impl std::fmt::Debug for BeanEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanEntry")
            .field("capability", &self.capability_name)
            .field("implementation", &self.implementation_name)
            .field("priority", &self.priority)
            .field("markers", &self.markers)
            .finish()
    }
}

/// A super-capability edge of the capability hierarchy, with the upcast shim
/// that re-views a narrow handle under the broader capability.
pub struct SuperCapability {
    /// Identity of the super-capability.
    pub id: fn() -> TypeId,
    /// Super-capability name for diagnostics.
    pub name: &'static str,
    /// Upcast a handle carrying the narrow capability view to the broad one.
    /// Returns `None` if the handle does not carry the narrow view.
    pub upcast: fn(&BeanHandle) -> Option<BeanHandle>,
}

/// Hierarchy metadata for one capability trait, submitted by `#[capability]`.
pub struct CapabilityInfo {
    /// Identity of the capability.
    pub id: fn() -> TypeId,
    /// Capability name for diagnostics.
    pub name: &'static str,
    /// Direct super-capabilities (std marker traits excluded).
    pub extends: &'static [SuperCapability],
}

/// Process-wide registration manifest: one entry per capability-type-to-
/// implementation-type pair, populated at link time.
#[linkme::distributed_slice]
pub static BEANS: [BeanEntry] = [..];

/// Process-wide capability hierarchy, populated at link time.
#[linkme::distributed_slice]
pub static CAPABILITIES: [CapabilityInfo] = [..];

/// Recover the concrete value from a constructed raw bean.
///
/// Fails with a construction error when a hand-written entry pairs a `seal`
/// shim with a `construct` path producing a different type.
pub fn downcast_raw<T: Send + Sync + 'static>(raw: RawBean) -> Result<T> {
    raw.into_any().downcast::<T>().map(|value| *value).map_err(|_| {
        crate::error::Error::construction(
            std::any::type_name::<T>(),
            "constructed value does not match the registered implementation type",
        )
    })
}

/// Expands to a [`BeanEntry::seal`] shim for one (capability, implementation)
/// pair. The `Arc` coercion from the concrete type to the capability trait
/// object has to be spelled where both types are known, which is why this is
/// a macro and not a generic function.
#[macro_export]
macro_rules! seal_bean {
    ($capability:ty, $implementation:ty) => {
        |raw: $crate::RawBean| -> $crate::Result<$crate::BeanHandle> {
            let concrete =
                ::std::sync::Arc::new($crate::downcast_raw::<$implementation>(raw)?);
            let capability: ::std::sync::Arc<$capability> = concrete.clone();
            Ok($crate::BeanHandle::from_parts(capability, concrete))
        }
    };
}

/// Expands to a [`BeanEntry::recast`] shim for one (capability,
/// implementation) pair.
#[macro_export]
macro_rules! recast_bean {
    ($capability:ty, $implementation:ty) => {
        |handle: &$crate::BeanHandle| -> ::std::option::Option<$crate::BeanHandle> {
            let concrete = handle.view::<$implementation>()?;
            let capability: ::std::sync::Arc<$capability> = concrete.clone();
            ::std::option::Option::Some(handle.with_capability(capability))
        }
    };
}
