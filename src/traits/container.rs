//! Container capabilities.

use crate::{Node, ResourceError};

/// A node that enumerates children and looks them up by name.
///
/// Child names are unique among siblings.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn Container`.
pub trait Container: Send + Sync {
    /// List the current children.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Io`] if the listing cannot be read
    fn children(&self) -> Result<Vec<Node>, ResourceError>;

    /// Look up a child by name.
    ///
    /// Returns `Ok(None)` if no child has that name.
    fn get_child(&self, name: &str) -> Result<Option<Node>, ResourceError>;
}

/// A container that creates and deletes children.
///
/// Enumeration stays on [`Container`]; a node is a fully mutable container
/// when it supports both.
pub trait MutableContainer: Send + Sync {
    /// Create a child with the given name and content type.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::AlreadyExists`] if a child already has that name
    /// - [`ResourceError::Frozen`] if the container is snapshotted
    fn create(&self, name: &str, content_type: Option<&str>) -> Result<Node, ResourceError>;

    /// Delete the child with the given name, including its subtree.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NotFound`] if no child has that name
    /// - [`ResourceError::Frozen`] if the container is snapshotted
    fn delete(&self, name: &str) -> Result<(), ResourceError>;
}
