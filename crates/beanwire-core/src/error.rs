//! Error handling types

use thiserror::Error;

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the resolution context.
///
/// Every resolution failure propagates synchronously to the caller of
/// `get_bean`/`get_beans`/`inject_beans`; none are swallowed. Duplicate
/// priorities are not an error: they are logged as an ambiguity warning and
/// resolution proceeds.
#[derive(Error, Debug)]
pub enum Error {
    /// No implementation could be resolved for the requested capability,
    /// even after walking the capability hierarchy.
    #[error("no implementation found for capability '{capability}'")]
    NotFound {
        /// The capability (or concrete type) that was requested
        capability: String,
    },

    /// The selected implementation's zero-argument construction path failed.
    #[error("construction of '{implementation}' failed: {source}")]
    Construction {
        /// The implementation type that failed to construct
        implementation: String,
        /// The underlying cause
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Two implementations inject each other, directly or transitively.
    /// Detected per resolution pass; the chain names the types involved.
    #[error("injection cycle detected: {chain}")]
    Cycle {
        /// The resolution chain that closed the cycle, e.g. `A -> B -> A`
        chain: String,
    },
}

impl Error {
    /// Build a [`Error::NotFound`] for the given capability name.
    pub fn not_found(capability: impl Into<String>) -> Self {
        Self::NotFound {
            capability: capability.into(),
        }
    }

    /// Build a [`Error::Construction`] wrapping the root cause.
    pub fn construction(
        implementation: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Construction {
            implementation: implementation.into(),
            source: source.into(),
        }
    }
}
