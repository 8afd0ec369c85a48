//! # beanwire-core
//!
//! Runtime for the beanwire dependency-resolution context: capability-keyed
//! lookup of implementation types with priority selection, singleton and
//! prototype scoping, field injection and per-boundary isolation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        beanwire-core                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  registry  ── linkme manifest: BeanEntry / CapabilityInfo    │
//! │      │                                                       │
//! │      ▼                                                       │
//! │  context   ── per-boundary selection, caching, injection     │
//! │      │                                                       │
//! │      ▼                                                       │
//! │  handle    ── type-erased Arc views (capability + concrete)  │
//! │                                                              │
//! │  marker    ── scope classification inputs                    │
//! │  injectable── the injection seam implement/derive targets    │
//! │  error     ── resolution failure taxonomy                    │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let context = Context::instance();
//! let greeter = context.get_bean::<dyn GreeterService>()?;
//! greeter.greet();
//! ```
//!
//! Most users depend on the `beanwire` facade crate, which re-exports this
//! runtime together with the `#[capability]` and `#[injectable]` attributes.

pub mod context;
pub mod error;
pub mod handle;
pub mod injectable;
pub mod marker;
pub mod registry;

pub use context::{Boundary, Context};
pub use error::{Error, Result};
pub use handle::BeanHandle;
pub use injectable::{InjectTarget, Injectable, RawBean};
pub use marker::{Marker, Scope};
pub use registry::{
    BEANS, BeanEntry, CAPABILITIES, CapabilityInfo, DEFAULT_PRIORITY, SuperCapability,
    downcast_raw,
};

// Re-exported for generated registration code; users never import these
// directly.
pub use linkme;
pub use tracing;
