//! # Capability Traits
//!
//! The roles a node in a resource tree may play.
//!
//! ## Capability Set
//!
//! A node is polymorphic over whichever subset of roles it implements. Rather
//! than a fixed type hierarchy, every implementation exposes its roles through
//! the [`Capabilities`] accessors, each defaulting to `None`:
//!
//! | Capability | Trait | Operations |
//! |------------|-------|------------|
//! | Readable | [`Readable`] | `open_read` |
//! | Writable | [`Writable`] | `open_write` |
//! | Container | [`Container`] | `children`, `get_child` |
//! | Mutable container | [`MutableContainer`] | `create`, `delete` |
//! | Cache-bearing | [`CacheBearing`] | `reset_cache`, `is_caching`, `set_caching` |
//! | Detachable | [`Detachable`] | `detach` |
//!
//! Storage nodes implement [`Resource`]; runtime additions implement
//! [`Overlay`]. Both report their roles the same way, which is what lets
//! [`Node`](crate::Node) dispatch over overlays first and fall back to the base.
//!
//! ```rust
//! use resource_snapshot::{Capabilities, Node, Readable, Resource, ResourceError};
//! use std::io::Read;
//!
//! struct Greeting;
//!
//! impl Readable for Greeting {
//!     fn open_read(&self) -> Result<Box<dyn Read + Send>, ResourceError> {
//!         Ok(Box::new(&b"hello"[..]))
//!     }
//! }
//!
//! impl Capabilities for Greeting {
//!     fn as_readable(&self) -> Option<&dyn Readable> {
//!         Some(self)
//!     }
//! }
//!
//! impl Resource for Greeting {
//!     fn name(&self) -> &str {
//!         "greeting.txt"
//!     }
//!     fn content_type(&self) -> Option<&str> {
//!         Some("text/plain")
//!     }
//!     fn parent(&self) -> Option<Node> {
//!         None
//!     }
//! }
//!
//! let node = Node::new(Greeting);
//! assert_eq!(node.read_to_string().unwrap(), "hello");
//! ```
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Implementations use
//! interior mutability.

mod cache;
mod container;
mod detachable;
mod readable;
mod writable;

pub use cache::CacheBearing;
pub use container::{Container, MutableContainer};
pub use detachable::Detachable;
pub use readable::Readable;
pub use writable::Writable;

use crate::{Capability, Node, OverlayKind};

/// Accessors for the roles an implementation supports.
///
/// Each accessor returns `Some(self)` when the role is implemented. Only
/// override the ones you implement.
pub trait Capabilities: Send + Sync {
    /// Readable role, if implemented.
    fn as_readable(&self) -> Option<&dyn Readable> {
        None
    }

    /// Writable role, if implemented.
    fn as_writable(&self) -> Option<&dyn Writable> {
        None
    }

    /// Container role, if implemented.
    fn as_container(&self) -> Option<&dyn Container> {
        None
    }

    /// Mutable container role, if implemented.
    fn as_mutable(&self) -> Option<&dyn MutableContainer> {
        None
    }

    /// Cache-bearing role, if implemented.
    fn as_cache(&self) -> Option<&dyn CacheBearing> {
        None
    }

    /// Detachable role, if implemented.
    fn as_detachable(&self) -> Option<&dyn Detachable> {
        None
    }

    /// Returns `true` if the accessor for `capability` yields an implementation.
    fn provides(&self, capability: Capability) -> bool {
        match capability {
            Capability::Readable => self.as_readable().is_some(),
            Capability::Writable => self.as_writable().is_some(),
            Capability::Container => self.as_container().is_some(),
            Capability::MutableContainer => self.as_mutable().is_some(),
            Capability::CacheBearing => self.as_cache().is_some(),
            Capability::Detachable => self.as_detachable().is_some(),
        }
    }
}

/// The original behavior of a node: a storage backend entry, or another node
/// when joined (see [`Node::join`]).
///
/// `parent` is a lookup, never ownership. Backends hold parents through
/// [`WeakNode`](crate::WeakNode).
pub trait Resource: Capabilities {
    /// Name, unique among siblings.
    fn name(&self) -> &str;

    /// Content type, if known.
    fn content_type(&self) -> Option<&str>;

    /// The enclosing container, if any and still alive.
    fn parent(&self) -> Option<Node>;

    /// The node this resource wraps, for joined nodes.
    ///
    /// Storage backends leave this as `None`.
    fn as_node(&self) -> Option<&Node> {
        None
    }
}

/// A capability implementation attached to a node at runtime.
///
/// Overlays take dispatch priority over the node's base. Identity, name and
/// content type always come from the base.
pub trait Overlay: Capabilities {
    /// The kind used to find and remove this overlay.
    fn kind(&self) -> OverlayKind;

    /// A parent reported in place of the base's.
    ///
    /// `None` defers to the next overlay, then to the base.
    fn parent(&self) -> Option<Node> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;
    impl Capabilities for Bare {}

    #[test]
    fn default_accessors_provide_nothing() {
        for capability in Capability::ALL {
            assert!(!Bare.provides(capability));
        }
    }

    #[test]
    fn traits_are_object_safe() {
        fn _check(_: &dyn Capabilities, _: &dyn Resource, _: &dyn Overlay) {}
    }
}
