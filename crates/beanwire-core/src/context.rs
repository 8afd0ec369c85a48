//! Dependency Resolution Context
//!
//! One [`Context`] exists per isolation [`Boundary`], created lazily on
//! first access and never torn down. The context owns the per-boundary
//! singleton cache and the scope classifier sets, and implements the
//! selection algorithm over the registration manifest:
//!
//! ```text
//! get_bean::<dyn Capability>()
//!        │
//!        ▼
//! ┌─────────────────────────┐   hit
//! │      singleton cache    ├────────► Arc<dyn Capability>
//! └───────────┬─────────────┘
//!             │ miss
//!             ▼
//! ┌─────────────────────────┐
//! │ manifest candidates     │  ambiguity → warn, not fatal
//! │ sort by priority (asc)  │
//! │ filter / first          │
//! └───────────┬─────────────┘
//!             │ none → hierarchy fallback → NotFound
//!             ▼
//! construct → inject (unless wired) → seal → promote singletons
//! ```
//!
//! Resolution is synchronous and in-memory. Concurrent first-resolution of
//! the same capability may construct twice; the last cache write wins and
//! every later lookup observes one instance. Cyclic injection graphs fail
//! fast with [`Error::Cycle`] instead of recursing.

use std::any::{TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::handle::BeanHandle;
use crate::injectable::Injectable;
use crate::marker::{Marker, Scope};
use crate::registry::{BEANS, BeanEntry, CAPABILITIES};

/// Identity of an isolation boundary.
///
/// Boundaries partition resolution state: each one owns its own context,
/// singleton cache and runtime registration table (the compile-time manifest
/// is shared, since it is a property of the binary). The Java-era analog of
/// this key was the defining classloader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary(pub &'static str);

impl Boundary {
    /// The default boundary used by [`Context::instance`].
    pub const ROOT: Boundary = Boundary("root");
}

impl Default for Boundary {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Process-wide boundary → context registry. Create-if-absent is the one
/// operation serialized behind the write lock; first caller wins.
static CONTEXTS: Lazy<RwLock<HashMap<Boundary, Arc<Context>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

thread_local! {
    /// Implementations currently being constructed on this thread, used to
    /// detect cyclic injection graphs. Keyed by boundary so that nested
    /// resolution across boundaries does not alias.
    static RESOLVING: RefCell<Vec<(Boundary, TypeId, &'static str)>> =
        const { RefCell::new(Vec::new()) };
}

/// Scope guard for one in-progress construction frame.
struct CycleGuard;

impl CycleGuard {
    fn enter(boundary: Boundary, implementation: TypeId, name: &'static str) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack
                .iter()
                .any(|(b, id, _)| *b == boundary && *id == implementation)
            {
                let mut chain: Vec<&str> = stack
                    .iter()
                    .filter(|(b, _, _)| *b == boundary)
                    .map(|(_, _, frame)| *frame)
                    .collect();
                chain.push(name);
                return Err(Error::Cycle {
                    chain: chain.join(" -> "),
                });
            }
            stack.push((boundary, implementation, name));
            Ok(CycleGuard)
        })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The per-boundary resolution runtime.
pub struct Context {
    boundary: Boundary,
    /// Markers that qualify a type as singleton-scoped. Extensible, additive.
    singleton_markers: RwLock<Vec<Marker>>,
    /// Markers recognized as explicit prototype declarations. Tracked for
    /// classification; prototype is already the default scope.
    prototype_markers: RwLock<Vec<Marker>>,
    /// Singleton instances, keyed by both the requested capability type and
    /// the concrete implementation type.
    singleton_cache: DashMap<TypeId, BeanHandle>,
    /// Boundary-local additions to the compile-time manifest.
    runtime_entries: RwLock<Vec<BeanEntry>>,
}

impl Context {
    fn new(boundary: Boundary) -> Self {
        Self {
            boundary,
            singleton_markers: RwLock::new(vec![Marker::Singleton, Marker::Service]),
            prototype_markers: RwLock::new(vec![Marker::Prototype, Marker::Bean]),
            singleton_cache: DashMap::new(),
            runtime_entries: RwLock::new(Vec::new()),
        }
    }

    /// The context of the default boundary.
    pub fn instance() -> Arc<Context> {
        Self::instance_of(Boundary::ROOT)
    }

    /// The context of the given boundary, constructing it on first access.
    pub fn instance_of(boundary: Boundary) -> Arc<Context> {
        if let Some(context) = CONTEXTS
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&boundary)
        {
            return Arc::clone(context);
        }

        let mut contexts = CONTEXTS.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(contexts.entry(boundary).or_insert_with(|| {
            info!("Constructing resolution context for boundary '{}'", boundary);
            Arc::new(Context::new(boundary))
        }))
    }

    /// The boundary this context belongs to.
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Resolve the single best implementation of `T`.
    ///
    /// `T` may be a capability trait object (`dyn Greeter`) or a concrete
    /// implementation type; the latter is answered through the hierarchy
    /// fallback. Fails with [`Error::NotFound`] once the full algorithm,
    /// fallback included, is exhausted.
    pub fn get_bean<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let (handle, _) = self.resolve(TypeId::of::<T>(), type_name::<T>(), None)?;
        handle
            .view::<T>()
            .ok_or_else(|| Error::not_found(type_name::<T>()))
    }

    /// Resolve the single best implementation of `T` under a bean name.
    ///
    /// The name is accepted but not used to narrow the candidate set; any
    /// candidate passes. This looseness is kept from the source system and
    /// documented rather than fixed.
    pub fn get_bean_named<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        debug!(
            "Resolving '{}' by name '{}' (names do not filter candidates)",
            type_name::<T>(),
            name
        );
        self.get_bean::<T>()
    }

    /// Resolve every distinct implementation registered for capability `T`,
    /// deduplicated by implementation type. Order is not significant.
    ///
    /// Singleton-scoped elements are the same instances `get_bean` of their
    /// concrete type returns; prototype-scoped elements are fresh per call.
    /// An unregistered capability yields an empty vec.
    pub fn get_beans<T>(&self) -> Result<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeId::of::<T>();
        let mut seen: Vec<TypeId> = Vec::new();
        let mut beans = Vec::new();
        for entry in self.candidates_for(key) {
            let implementation = (entry.implementation)();
            if seen.contains(&implementation) {
                continue;
            }
            seen.push(implementation);
            let (handle, _) = self.resolve(key, entry.capability_name, Some(implementation))?;
            let bean = handle
                .view::<T>()
                .ok_or_else(|| Error::not_found(type_name::<T>()))?;
            beans.push(bean);
        }
        Ok(beans)
    }

    /// Satisfy every injection point of `target` in place.
    ///
    /// Repeated calls re-resolve each point: callers relying on idempotence
    /// must use singleton scope for the injected capabilities.
    pub fn inject_beans<T>(&self, target: &mut T) -> Result<()>
    where
        T: Injectable + ?Sized,
    {
        target.inject(self)
    }

    /// Add an entry to this boundary's runtime registration table.
    ///
    /// Runtime entries supplement the compile-time manifest and are only
    /// visible to this boundary.
    pub fn register_entry(&self, entry: BeanEntry) {
        debug!(
            "Registering {} -> {} in boundary '{}'",
            entry.capability_name, entry.implementation_name, self.boundary
        );
        self.runtime_entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Extend the set of markers that qualify a type as singleton-scoped.
    /// Additive only; built-ins cannot be removed.
    pub fn register_singleton_markers<I>(&self, markers: I)
    where
        I: IntoIterator<Item = Marker>,
    {
        self.singleton_markers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(markers);
    }

    /// Extend the set of markers recognized as explicit prototype
    /// declarations. Additive only.
    pub fn register_prototype_markers<I>(&self, markers: I)
    where
        I: IntoIterator<Item = Marker>,
    {
        self.prototype_markers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(markers);
    }

    /// Classify a marker set: singleton iff any marker is in the singleton
    /// set, prototype otherwise (with or without an explicit marker).
    pub fn scope_of(&self, markers: &[Marker]) -> Scope {
        if self.is_singleton(markers) {
            Scope::Singleton
        } else {
            Scope::Prototype
        }
    }

    /// Whether the marker set carries an explicit prototype declaration.
    /// Informational: prototype is the default scope either way.
    pub fn is_explicit_prototype(&self, markers: &[Marker]) -> bool {
        let prototype = self
            .prototype_markers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        markers.iter().any(|marker| prototype.contains(marker))
    }

    /// Names of the implementations registered for capability `T` in this
    /// boundary, in manifest order.
    pub fn implementations_of<T>(&self) -> Vec<&'static str>
    where
        T: ?Sized + 'static,
    {
        self.candidates_for(TypeId::of::<T>())
            .iter()
            .map(|entry| entry.implementation_name)
            .collect()
    }

    fn is_singleton(&self, markers: &[Marker]) -> bool {
        let singleton = self
            .singleton_markers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        markers.iter().any(|marker| singleton.contains(marker))
    }

    /// Every entry visible to this boundary: the compile-time manifest plus
    /// the runtime table.
    fn entries(&self) -> Vec<BeanEntry> {
        BEANS
            .iter()
            .copied()
            .chain(
                self.runtime_entries
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .iter()
                    .copied(),
            )
            .collect()
    }

    fn candidates_for(&self, key: TypeId) -> Vec<BeanEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| (entry.capability)() == key)
            .collect()
    }

    /// The selection algorithm. `want` demands a specific concrete type
    /// (used by the hierarchy fallback and by collection resolution); the
    /// returned flag says whether the handle is singleton-scoped.
    fn resolve(
        &self,
        key: TypeId,
        label: &str,
        want: Option<TypeId>,
    ) -> Result<(BeanHandle, bool)> {
        if let Some(handle) = self
            .singleton_cache
            .get(&key)
            .map(|cached| cached.value().clone())
        {
            if want.is_none_or(|w| handle.implementation() == w) {
                debug!("Cache hit for '{}' in boundary '{}'", label, self.boundary);
                return Ok((handle, true));
            }
        }

        let mut candidates = self.candidates_for(key);
        self.warn_ambiguities(label, &candidates);
        candidates.sort_by_key(|entry| entry.priority);

        let winner = candidates
            .iter()
            .find(|entry| want.is_none_or(|w| (entry.implementation)() == w))
            .copied();

        match winner {
            Some(entry) => {
                let handle = self.materialize(&entry)?;
                let singleton = self.is_singleton(entry.markers);
                if singleton {
                    // Both keys point at the same handle, so lookups by the
                    // capability and by the concrete type agree. Filtered
                    // resolutions never repoint the capability binding.
                    self.singleton_cache
                        .insert((entry.implementation)(), handle.clone());
                    if want.is_none() {
                        self.singleton_cache.insert(key, handle.clone());
                    }
                }
                debug!(
                    "Resolved '{}' to {} ({:?})",
                    label,
                    entry.implementation_name,
                    self.scope_of(entry.markers)
                );
                Ok((handle, singleton))
            }
            None => self.resolve_fallback(key, label, want),
        }
    }

    /// Construct, inject and seal the winning entry's instance.
    fn materialize(&self, entry: &BeanEntry) -> Result<BeanHandle> {
        let implementation = (entry.implementation)();
        let _guard = CycleGuard::enter(self.boundary, implementation, entry.implementation_name)?;

        // An instance first resolved through a sibling capability is reused,
        // not rebuilt: one singleton per implementation per boundary.
        if let Some(existing) = self
            .singleton_cache
            .get(&implementation)
            .map(|cached| cached.value().clone())
        {
            if let Some(handle) = (entry.recast)(&existing) {
                return Ok(handle);
            }
        }

        let mut raw = (entry.construct)()?;
        if !entry.is_wired() {
            raw.inject_dyn(self)?;
        }
        (entry.seal)(raw)
    }

    /// Interface-hierarchy fallback, tried once direct candidates are
    /// exhausted.
    fn resolve_fallback(
        &self,
        key: TypeId,
        label: &str,
        want: Option<TypeId>,
    ) -> Result<(BeanHandle, bool)> {
        // The requested type may itself be a registered implementation:
        // resolve each capability it is registered under, demanding that
        // exact concrete type.
        if want.is_none_or(|w| w == key) {
            let through: Vec<BeanEntry> = self
                .entries()
                .into_iter()
                .filter(|entry| (entry.implementation)() == key)
                .collect();
            for entry in through {
                match self.resolve((entry.capability)(), entry.capability_name, Some(key)) {
                    Ok(resolved) => return Ok(resolved),
                    Err(Error::NotFound { .. }) => continue,
                    Err(other) => return Err(other),
                }
            }
        }

        // A capability extending the requested one can satisfy it: resolve
        // the narrow capability and upcast the result.
        for info in CAPABILITIES.iter() {
            for super_capability in info.extends {
                if (super_capability.id)() != key {
                    continue;
                }
                match self.resolve((info.id)(), info.name, want) {
                    Ok((narrow, singleton)) => {
                        if let Some(handle) = (super_capability.upcast)(&narrow) {
                            if singleton && want.is_none() {
                                self.singleton_cache.insert(key, handle.clone());
                            }
                            return Ok((handle, singleton));
                        }
                    }
                    Err(Error::NotFound { .. }) => continue,
                    Err(other) => return Err(other),
                }
            }
        }

        Err(Error::not_found(label))
    }

    /// Duplicate priorities are an ambiguity warning, never an error; the
    /// winner among equals is manifest order, stable per context because of
    /// the cache.
    fn warn_ambiguities(&self, label: &str, candidates: &[BeanEntry]) {
        let mut by_priority: HashMap<u16, Vec<&'static str>> = HashMap::new();
        for entry in candidates {
            by_priority
                .entry(entry.priority)
                .or_default()
                .push(entry.implementation_name);
        }
        for (priority, implementations) in by_priority {
            if implementations.len() > 1 {
                warn!(
                    "{} implementations of '{}' share priority {}: {}",
                    implementations.len(),
                    label,
                    priority,
                    implementations.join(", ")
                );
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("boundary", &self.boundary)
            .field("cached_singletons", &self.singleton_cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DEFAULT_PRIORITY;
    use crate::{recast_bean, seal_bean};

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    #[derive(Default)]
    struct Casual;

    impl Greeter for Casual {
        fn greet(&self) -> &'static str {
            "hi"
        }
    }

    impl Injectable for Casual {}

    #[derive(Default)]
    struct Formal;

    impl Greeter for Formal {
        fn greet(&self) -> &'static str {
            "good day"
        }
    }

    impl Injectable for Formal {}

    fn entry<T>(priority: u16, markers: &'static [Marker]) -> BeanEntry
    where
        T: Greeter + Injectable + Default + Send + Sync + 'static,
    {
        BeanEntry {
            capability: || TypeId::of::<dyn Greeter>(),
            capability_name: "Greeter",
            implementation: || TypeId::of::<T>(),
            implementation_name: type_name::<T>(),
            priority,
            markers,
            construct: || Ok(Box::new(T::default())),
            seal: seal_bean!(dyn Greeter, T),
            recast: recast_bean!(dyn Greeter, T),
        }
    }

    #[test]
    fn lower_priority_ordinal_wins() {
        let context = Context::instance_of(Boundary("ctx_priority"));
        context.register_entry(entry::<Formal>(DEFAULT_PRIORITY, &[]));
        context.register_entry(entry::<Casual>(1, &[]));

        let bean = context.get_bean::<dyn Greeter>().unwrap();
        assert_eq!(bean.greet(), "hi");
    }

    #[test]
    fn missing_capability_is_a_hard_failure() {
        let context = Context::instance_of(Boundary("ctx_not_found"));
        let Err(err) = context.get_bean::<dyn Greeter>() else {
            panic!("expected resolution to fail");
        };
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn singleton_reachable_under_both_keys() {
        let context = Context::instance_of(Boundary("ctx_dual_key"));
        context.register_entry(entry::<Casual>(1, &[Marker::Singleton]));

        let by_capability = context.get_bean::<dyn Greeter>().unwrap();
        let by_concrete = context.get_bean::<Casual>().unwrap();
        assert_eq!(
            Arc::as_ptr(&by_capability) as *const (),
            Arc::as_ptr(&by_concrete) as *const (),
        );
    }

    #[test]
    fn prototype_is_fresh_per_request() {
        let context = Context::instance_of(Boundary("ctx_prototype"));
        context.register_entry(entry::<Casual>(1, &[Marker::Prototype]));

        let first = context.get_bean::<dyn Greeter>().unwrap();
        let second = context.get_bean::<dyn Greeter>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn custom_marker_can_become_singleton() {
        let context = Context::instance_of(Boundary("ctx_custom_marker"));
        context.register_entry(entry::<Casual>(1, &[Marker::Custom("component")]));

        let first = context.get_bean::<dyn Greeter>().unwrap();
        let second = context.get_bean::<dyn Greeter>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        context.register_singleton_markers([Marker::Custom("component")]);
        let third = context.get_bean::<dyn Greeter>().unwrap();
        let fourth = context.get_bean::<dyn Greeter>().unwrap();
        assert!(Arc::ptr_eq(&third, &fourth));
    }

    #[test]
    fn boundaries_do_not_share_caches() {
        let left = Context::instance_of(Boundary("ctx_iso_left"));
        let right = Context::instance_of(Boundary("ctx_iso_right"));
        left.register_entry(entry::<Casual>(1, &[Marker::Singleton]));
        right.register_entry(entry::<Casual>(1, &[Marker::Singleton]));

        let in_left = left.get_bean::<dyn Greeter>().unwrap();
        let in_right = right.get_bean::<dyn Greeter>().unwrap();
        assert!(!Arc::ptr_eq(&in_left, &in_right));
    }

    #[test]
    fn explicit_prototype_markers_are_tracked() {
        let context = Context::instance_of(Boundary("ctx_proto_markers"));
        assert!(context.is_explicit_prototype(&[Marker::Bean]));
        assert!(!context.is_explicit_prototype(&[Marker::Custom("component")]));
        context.register_prototype_markers([Marker::Custom("component")]);
        assert!(context.is_explicit_prototype(&[Marker::Custom("component")]));
        assert_eq!(context.scope_of(&[Marker::Bean]), Scope::Prototype);
        assert_eq!(context.scope_of(&[Marker::Service]), Scope::Singleton);
    }

    #[test]
    fn implementations_are_listed_in_manifest_order() {
        let context = Context::instance_of(Boundary("ctx_listing"));
        context.register_entry(entry::<Formal>(5, &[]));
        context.register_entry(entry::<Casual>(1, &[]));

        let names = context.implementations_of::<dyn Greeter>();
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Formal"));
        assert!(names[1].ends_with("Casual"));
    }
}
