//! Marker vocabulary attached to implementation types at registration time.
//!
//! Markers are pure data: the resolution context reads them to classify the
//! scope of an implementation and to decide whether its injection points
//! still need to be satisfied after construction. The built-in vocabulary
//! mirrors the two default marker pairs (`Singleton`/`Service` and
//! `Prototype`/`Bean`) plus the already-wired flag; `Custom` markers can be
//! registered as equivalent to either built-in pair at runtime via
//! [`Context::register_singleton_markers`](crate::Context::register_singleton_markers).

/// A metadata marker carried by a registered implementation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// One instance per resolution context, cached under both the requested
    /// capability and the concrete implementation type.
    Singleton,
    /// Alias for [`Marker::Singleton`]; seeded into the singleton set.
    Service,
    /// A fresh instance per resolution request, never cached.
    Prototype,
    /// Alias for [`Marker::Prototype`]; seeded into the prototype set.
    Bean,
    /// The implementation's construction path already satisfies its own
    /// injection points; the context must not inject it again.
    Wired,
    /// A caller-defined marker. Meaningless until registered with one of the
    /// scope classifier sets.
    Custom(&'static str),
}

/// Scope of an implementation type as classified by a resolution context.
///
/// An implementation without any recognized scope marker is treated as
/// prototype-scoped; declaring an explicit prototype marker is allowed and
/// tracked but changes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Cached per boundary for the lifetime of the context.
    Singleton,
    /// Constructed anew on every resolution.
    Prototype,
}
