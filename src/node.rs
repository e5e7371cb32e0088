//! # Nodes and Overlay Registry
//!
//! A [`Node`] is the identity callers hold on to. It owns a base
//! [`Resource`] and an [`OverlayRegistry`]. Attaching an overlay changes how
//! the node behaves without changing which node it is, so every holder of a
//! clone observes the new behavior.
//!
//! ## Dispatch
//!
//! ```text
//! overlays (most recent first) ──▶ base ──▶ ResourceError::Unsupported
//! ```
//!
//! The first implementation that provides the requested capability answers.
//! Overlays are cloned out of the registry before they run, so overlay code
//! never executes under the registry lock.

use std::fmt;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::{
    CacheBearing, Capabilities, Capability, Container, Detachable, MutableContainer, Overlay,
    OverlayKind, Readable, Resource, ResourceError, Writable,
};

struct NodeInner {
    base: Arc<dyn Resource>,
    overlays: OverlayRegistry,
}

/// Identity-bearing handle to a location in a resource tree.
///
/// Cloning is cheap and yields the same identity; compare identities with
/// [`Node::ptr_eq`].
#[derive(Clone)]
pub struct Node(Arc<NodeInner>);

/// Non-owning reference to a [`Node`], used for parent back-references.
#[derive(Clone, Default)]
pub struct WeakNode(Weak<NodeInner>);

impl WeakNode {
    /// A reference that never upgrades.
    pub fn new() -> Self {
        Self(Weak::new())
    }

    /// The referenced node, if it is still alive.
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl fmt::Debug for WeakNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(node) => f.debug_tuple("WeakNode").field(&node.name()).finish(),
            None => f.write_str("WeakNode(<dropped>)"),
        }
    }
}

impl Node {
    /// Wrap a storage resource in a new identity with an empty registry.
    pub fn new<R: Resource + 'static>(resource: R) -> Self {
        Self::from_arc(Arc::new(resource))
    }

    /// Like [`Node::new`] for an already shared resource.
    pub fn from_arc(resource: Arc<dyn Resource>) -> Self {
        Node(Arc::new(NodeInner {
            base: resource,
            overlays: OverlayRegistry::default(),
        }))
    }

    /// Build a resource that needs a reference to its own node, typically so
    /// it can hand itself to children as their parent.
    pub fn new_cyclic<R, F>(build: F) -> Self
    where
        R: Resource + 'static,
        F: FnOnce(&WeakNode) -> R,
    {
        Node(Arc::new_cyclic(|weak| NodeInner {
            base: Arc::new(build(&WeakNode(weak.clone()))),
            overlays: OverlayRegistry::default(),
        }))
    }

    /// A new identity whose base is `node`.
    ///
    /// Overlays attached to the joined node shadow `node` without touching
    /// it; anything they don't provide falls through to `node`'s own dispatch.
    pub fn join(node: &Node) -> Node {
        Node::new(node.clone())
    }

    /// Non-owning reference to this node.
    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Arc::downgrade(&self.0))
    }

    /// Returns `true` if both handles refer to the same identity.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The registry of overlays attached to this node.
    pub fn registry(&self) -> &OverlayRegistry {
        &self.0.overlays
    }

    /// The node's original behavior.
    pub fn base(&self) -> &dyn Resource {
        self.0.base.as_ref()
    }

    /// The node this one was joined onto, if any.
    pub fn joined(&self) -> Option<&Node> {
        self.0.base.as_node()
    }

    /// The innermost storage node beneath any number of joins.
    pub fn origin(&self) -> Node {
        let mut current = self.clone();
        while let Some(inner) = current.joined().cloned() {
            current = inner;
        }
        current
    }

    /// Name, unique among siblings.
    pub fn name(&self) -> &str {
        self.0.base.name()
    }

    /// Content type, if known.
    pub fn content_type(&self) -> Option<&str> {
        self.0.base.content_type()
    }

    /// The enclosing container.
    ///
    /// An overlay that relocates the node answers first; otherwise the base.
    pub fn parent(&self) -> Option<Node> {
        self.0
            .overlays
            .list()
            .iter()
            .find_map(|overlay| overlay.parent())
            .or_else(|| self.0.base.parent())
    }

    /// Slash-separated location, built by walking parents up to the root.
    pub fn path(&self) -> PathBuf {
        let mut names = vec![self.name().to_owned()];
        let mut current = self.parent();
        while let Some(node) = current {
            names.push(node.name().to_owned());
            current = node.parent();
        }
        let mut path = PathBuf::from("/");
        for name in names.iter().rev().filter(|name| !name.is_empty()) {
            path.push(name);
        }
        path
    }

    /// Returns `true` if dispatch finds an implementation of `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        self.0
            .overlays
            .list()
            .iter()
            .any(|overlay| overlay.provides(capability))
            || self.0.base.provides(capability)
    }

    /// Run `call` against the first implementation that accepts it.
    ///
    /// `call` returns `None` to pass; overlays are tried most recent first,
    /// then the base. Returns [`ResourceError::Unsupported`] if nothing
    /// accepts.
    pub fn dispatch<T, F>(&self, capability: Capability, call: F) -> Result<T, ResourceError>
    where
        F: Fn(&dyn Capabilities) -> Option<Result<T, ResourceError>>,
    {
        self.first_provider(call).unwrap_or_else(|| {
            Err(ResourceError::Unsupported {
                path: self.path(),
                capability,
            })
        })
    }

    /// First non-`None` answer from the overlays, most recent first, then the
    /// base.
    fn first_provider<T>(&self, call: impl Fn(&dyn Capabilities) -> Option<T>) -> Option<T> {
        self.0
            .overlays
            .list()
            .iter()
            .find_map(|overlay| call(&**overlay))
            .or_else(|| call(self.0.base.as_ref()))
    }

    /// Open the content for reading.
    pub fn open_read(&self) -> Result<Box<dyn Read + Send>, ResourceError> {
        self.dispatch(Capability::Readable, |c| {
            c.as_readable().map(|r| r.open_read())
        })
    }

    /// Open the content for writing.
    pub fn open_write(&self) -> Result<Box<dyn Write + Send>, ResourceError> {
        self.dispatch(Capability::Writable, |c| {
            c.as_writable().map(|w| w.open_write())
        })
    }

    /// List the children.
    pub fn children(&self) -> Result<Vec<Node>, ResourceError> {
        self.dispatch(Capability::Container, |c| {
            c.as_container().map(|dir| dir.children())
        })
    }

    /// Look up a child by name.
    pub fn get_child(&self, name: &str) -> Result<Option<Node>, ResourceError> {
        self.dispatch(Capability::Container, |c| {
            c.as_container().map(|dir| dir.get_child(name))
        })
    }

    /// Create a child.
    pub fn create(&self, name: &str, content_type: Option<&str>) -> Result<Node, ResourceError> {
        self.dispatch(Capability::MutableContainer, |c| {
            c.as_mutable().map(|dir| dir.create(name, content_type))
        })
    }

    /// Delete a child.
    pub fn delete(&self, name: &str) -> Result<(), ResourceError> {
        self.dispatch(Capability::MutableContainer, |c| {
            c.as_mutable().map(|dir| dir.delete(name))
        })
    }

    /// Reset the node's cache.
    pub fn reset_cache(&self) -> Result<(), ResourceError> {
        self.dispatch(Capability::CacheBearing, |c| {
            c.as_cache().map(|cache| cache.reset_cache())
        })
    }

    /// Whether the node's cache is in use.
    pub fn is_caching(&self) -> Result<bool, ResourceError> {
        self.dispatch(Capability::CacheBearing, |c| {
            c.as_cache().map(|cache| Ok(cache.is_caching()))
        })
    }

    /// Enable or disable the node's cache.
    pub fn set_caching(&self, caching: bool) -> Result<(), ResourceError> {
        self.dispatch(Capability::CacheBearing, |c| {
            c.as_cache().map(|cache| {
                cache.set_caching(caching);
                Ok(())
            })
        })
    }

    /// Produce a disconnected copy.
    pub fn detach(&self) -> Result<Node, ResourceError> {
        self.dispatch(Capability::Detachable, |c| {
            c.as_detachable().map(|d| d.detach())
        })
    }

    /// Read the whole content.
    pub fn read_to_vec(&self) -> Result<Vec<u8>, ResourceError> {
        let mut reader = self.open_read()?;
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .map_err(|e| ResourceError::io("read", self.path(), e))?;
        Ok(content)
    }

    /// Read the whole content as UTF-8.
    pub fn read_to_string(&self) -> Result<String, ResourceError> {
        let bytes = self.read_to_vec()?;
        String::from_utf8(bytes).map_err(|e| {
            ResourceError::io(
                "read_to_string",
                self.path(),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    /// Replace the content with `data`.
    pub fn write_all(&self, data: &[u8]) -> Result<(), ResourceError> {
        let mut writer = self.open_write()?;
        writer
            .write_all(data)
            .and_then(|()| writer.flush())
            .map_err(|e| ResourceError::io("write", self.path(), e))
    }

    /// Names of the children, in enumeration order.
    pub fn child_names(&self) -> Result<Vec<String>, ResourceError> {
        Ok(self
            .children()?
            .iter()
            .map(|child| child.name().to_owned())
            .collect())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name())
            .field("content_type", &self.content_type())
            .field("overlays", &self.0.overlays.kinds())
            .finish()
    }
}

// A node can itself be the base of another node (see `Node::join`).
impl Capabilities for Node {
    fn as_readable(&self) -> Option<&dyn Readable> {
        self.supports(Capability::Readable)
            .then_some(self as &dyn Readable)
    }

    fn as_writable(&self) -> Option<&dyn Writable> {
        self.supports(Capability::Writable)
            .then_some(self as &dyn Writable)
    }

    fn as_container(&self) -> Option<&dyn Container> {
        self.supports(Capability::Container)
            .then_some(self as &dyn Container)
    }

    fn as_mutable(&self) -> Option<&dyn MutableContainer> {
        self.supports(Capability::MutableContainer)
            .then_some(self as &dyn MutableContainer)
    }

    fn as_cache(&self) -> Option<&dyn CacheBearing> {
        self.supports(Capability::CacheBearing)
            .then_some(self as &dyn CacheBearing)
    }

    fn as_detachable(&self) -> Option<&dyn Detachable> {
        self.supports(Capability::Detachable)
            .then_some(self as &dyn Detachable)
    }
}

impl Resource for Node {
    fn name(&self) -> &str {
        Node::name(self)
    }

    fn content_type(&self) -> Option<&str> {
        Node::content_type(self)
    }

    fn parent(&self) -> Option<Node> {
        Node::parent(self)
    }

    fn as_node(&self) -> Option<&Node> {
        Some(self)
    }
}

impl Readable for Node {
    fn open_read(&self) -> Result<Box<dyn Read + Send>, ResourceError> {
        Node::open_read(self)
    }
}

impl Writable for Node {
    fn open_write(&self) -> Result<Box<dyn Write + Send>, ResourceError> {
        Node::open_write(self)
    }
}

impl Container for Node {
    fn children(&self) -> Result<Vec<Node>, ResourceError> {
        Node::children(self)
    }

    fn get_child(&self, name: &str) -> Result<Option<Node>, ResourceError> {
        Node::get_child(self, name)
    }
}

impl MutableContainer for Node {
    fn create(&self, name: &str, content_type: Option<&str>) -> Result<Node, ResourceError> {
        Node::create(self, name, content_type)
    }

    fn delete(&self, name: &str) -> Result<(), ResourceError> {
        Node::delete(self, name)
    }
}

impl CacheBearing for Node {
    fn reset_cache(&self) -> Result<(), ResourceError> {
        Node::reset_cache(self)
    }

    fn is_caching(&self) -> bool {
        self.first_provider(|c| c.as_cache().map(|cache| cache.is_caching()))
            .unwrap_or(false)
    }

    fn set_caching(&self, caching: bool) {
        self.first_provider(|c| c.as_cache().map(|cache| cache.set_caching(caching)));
    }
}

impl Detachable for Node {
    fn detach(&self) -> Result<Node, ResourceError> {
        Node::detach(self)
    }
}

/// Ordered overlays attached to one node, most recent first.
///
/// Attaching never disturbs earlier overlays. Removal is by kind and removes
/// every matching entry.
#[derive(Default)]
pub struct OverlayRegistry {
    // Oldest first; iteration for dispatch is reversed.
    entries: RwLock<Vec<Arc<dyn Overlay>>>,
}

impl OverlayRegistry {
    /// Attach `overlay` ahead of every existing one.
    pub fn attach(&self, overlay: Arc<dyn Overlay>) {
        log::trace!("overlay: attach, kind={:?}", overlay.kind());
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(overlay);
    }

    /// Remove every overlay whose kind is in `kinds`. Returns how many were
    /// removed.
    pub fn detach(&self, kinds: &[OverlayKind]) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|overlay| !kinds.contains(&overlay.kind()));
        let removed = before - entries.len();
        if removed > 0 {
            log::trace!("overlay: detach, kinds={kinds:?}, removed={removed}");
        }
        removed
    }

    /// The attached overlays, most recent first.
    pub fn list(&self) -> Vec<Arc<dyn Overlay>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .cloned()
            .collect()
    }

    /// Kinds of the attached overlays, most recent first.
    pub fn kinds(&self) -> Vec<OverlayKind> {
        self.list().iter().map(|overlay| overlay.kind()).collect()
    }

    /// Returns `true` if an overlay of `kind` is attached.
    pub fn contains(&self, kind: OverlayKind) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|overlay| overlay.kind() == kind)
    }

    /// Number of attached overlays.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for OverlayRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}
