//! # beanwire
//!
//! Capability-keyed dependency resolution: implementation types register
//! themselves under the traits they satisfy, and a per-boundary [`Context`]
//! resolves the best one on demand, caching singletons and wiring
//! `#[inject]` fields along the way.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use beanwire::{Context, capability, injectable};
//!
//! #[capability]
//! pub trait GreeterService: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[injectable(capability = GreeterService, singleton, priority = 1)]
//! #[derive(Default)]
//! pub struct EnglishGreeter;
//!
//! impl GreeterService for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "hello".into()
//!     }
//! }
//!
//! let greeter = Context::instance().get_bean::<dyn GreeterService>()?;
//! assert_eq!(greeter.greet(), "hello");
//! # Ok::<(), beanwire::Error>(())
//! ```
//!
//! The runtime lives in `beanwire-core` and the attributes in
//! `beanwire-macros`; this crate is the surface both expand against.

pub use beanwire_core::{
    BEANS, BeanEntry, BeanHandle, Boundary, CAPABILITIES, CapabilityInfo, Context,
    DEFAULT_PRIORITY, Error, InjectTarget, Injectable, Marker, RawBean, Result, Scope,
    SuperCapability, downcast_raw,
};

pub use beanwire_macros::{capability, injectable};

// Consumed by macro-generated registration code.
pub use beanwire_core::{linkme, recast_bean, seal_bean, tracing};
