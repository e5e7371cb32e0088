//! Error types for resource overlays and snapshots.

use std::path::PathBuf;

use crate::Capability;

/// Resource error type with contextual variants.
///
/// Every variant carries the path of the node involved, rendered with
/// [`Node::path`](crate::Node::path). Uses `#[non_exhaustive]` for forward
/// compatibility.
///
/// # Examples
///
/// ```rust
/// use resource_snapshot::ResourceError;
/// use std::path::PathBuf;
///
/// let err = ResourceError::Frozen {
///     path: PathBuf::from("/a/x"),
///     operation: "open_write",
/// };
/// assert_eq!(err.to_string(), "open_write: resource is snapshotted: /a/x");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Neither an overlay nor the base node implements the capability.
    #[error("{capability} not supported: {path}")]
    Unsupported {
        /// The node that lacks the capability.
        path: PathBuf,
        /// The missing capability.
        capability: Capability,
    },

    /// A mutation was attempted on a snapshotted node.
    #[error("{operation}: resource is snapshotted: {path}")]
    Frozen {
        /// The frozen node.
        path: PathBuf,
        /// The blocked operation.
        operation: &'static str,
    },

    /// The operation is not valid for the node's current state.
    #[error("invalid state: {path} ({reason})")]
    InvalidState {
        /// The node in the wrong state.
        path: PathBuf,
        /// Why the operation is not possible.
        reason: &'static str,
    },

    /// A named child does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The missing location.
        path: PathBuf,
    },

    /// A named child exists when it shouldn't.
    #[error("{operation}: already exists: {path}")]
    AlreadyExists {
        /// The existing location.
        path: PathBuf,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Content exceeded the configured snapshot buffer limit.
    #[error("content too large: {path} (exceeds {limit} bytes)")]
    ContentTooLarge {
        /// The node being buffered.
        path: PathBuf,
        /// The configured limit in bytes.
        limit: u64,
    },

    /// I/O error with context.
    #[error("{operation} failed for {path}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The node involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ResourceError {
    /// Wraps an I/O error with the operation and node that produced it.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResourceError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this is a [`ResourceError::Frozen`].
    pub fn is_frozen(&self) -> bool {
        matches!(self, ResourceError::Frozen { .. })
    }
}
