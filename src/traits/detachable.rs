//! Detachable capability.

use crate::{Node, ResourceError};

/// A node that can produce a disconnected copy of itself.
///
/// The copy has no parent and does not observe later changes to the original.
pub trait Detachable: Send + Sync {
    /// Produce the disconnected copy.
    fn detach(&self) -> Result<Node, ResourceError>;
}
