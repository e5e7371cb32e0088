//! # Prepared Decorator
//!
//! A read-through cached view of a resource tree.
//!
//! [`prepare`] joins a new identity onto a node and attaches overlays that
//! memoize the child listing. Children come back prepared too, with the
//! prepared container as their parent, so the whole subtree is served from
//! caches once visited.
//!
//! ```text
//! prepare(node) ──▶ Node::join(node)
//!                     ├─ PreparedContainer  (containers: cached children, create/delete mirrored)
//!                     ├─ PreparedResource   (leaves: parent relocation only)
//!                     └─ PreparedDetach     (detachable: detached copy is prepared again)
//! ```
//!
//! Everything else (reads, writes, names) falls through to the wrapped node.
//!
//! ## Consistency
//!
//! The cached mapping is either uncomputed or a complete listing. `create`
//! and `delete` issued through the prepared node are mirrored into it;
//! changes made directly on the wrapped node are not visible until
//! [`Node::reset_cache`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    CacheBearing, Capabilities, Capability, Container, Detachable, MutableContainer, Node,
    Overlay, OverlayKind, ResourceError, WeakNode,
};

/// Wrap `node` in a prepared view.
///
/// The returned node is a new identity; `node` itself is left untouched.
///
/// # Example
///
/// ```rust
/// use resource_snapshot::{prepare, MemoryResource};
///
/// let root = MemoryResource::root();
/// root.create("a.txt", None).unwrap();
///
/// let view = prepare(&root);
/// let first = view.get_child("a.txt").unwrap().unwrap();
/// let again = view.get_child("a.txt").unwrap().unwrap();
/// assert!(first.ptr_eq(&again));
/// assert!(first.parent().unwrap().ptr_eq(&view));
/// ```
pub fn prepare(node: &Node) -> Node {
    prepare_within(node, None)
}

fn prepare_within(node: &Node, parent: Option<WeakNode>) -> Node {
    let prepared = Node::join(node);
    let registry = prepared.registry();
    if node.supports(Capability::Container) {
        registry.attach(Arc::new(PreparedContainer {
            inner: node.clone(),
            parent,
            this: prepared.downgrade(),
            mutable: node.supports(Capability::MutableContainer),
            caching: AtomicBool::new(true),
            children: RwLock::new(None),
        }));
    } else {
        registry.attach(Arc::new(PreparedResource { parent }));
    }
    if node.supports(Capability::Detachable) {
        registry.attach(Arc::new(PreparedDetach {
            inner: node.clone(),
        }));
    }
    prepared
}

fn upgrade(parent: &Option<WeakNode>) -> Option<Node> {
    parent.as_ref().and_then(WeakNode::upgrade)
}

/// Relocates a prepared leaf under its prepared parent.
struct PreparedResource {
    parent: Option<WeakNode>,
}

impl Capabilities for PreparedResource {}

impl Overlay for PreparedResource {
    fn kind(&self) -> OverlayKind {
        OverlayKind::PreparedResource
    }

    fn parent(&self) -> Option<Node> {
        upgrade(&self.parent)
    }
}

type ChildMap = BTreeMap<String, Node>;

/// Cached child listing of a prepared container.
struct PreparedContainer {
    inner: Node,
    parent: Option<WeakNode>,
    // The prepared node this overlay is attached to.
    this: WeakNode,
    mutable: bool,
    caching: AtomicBool,
    children: RwLock<Option<ChildMap>>,
}

impl PreparedContainer {
    fn wrap(&self, child: &Node) -> Node {
        prepare_within(child, Some(self.this.clone()))
    }

    fn enumerate(&self) -> Result<ChildMap, ResourceError> {
        let children = self.inner.children()?;
        log::debug!(
            "prepared: list, path={}, children={}",
            self.inner.path().display(),
            children.len()
        );
        Ok(children
            .iter()
            .map(|child| (child.name().to_owned(), self.wrap(child)))
            .collect())
    }

    fn is_caching(&self) -> bool {
        self.caching.load(Ordering::Acquire)
    }

    /// Run `f` on the cached mapping, computing it first if needed.
    fn with_children<T>(&self, f: impl FnOnce(&mut ChildMap) -> T) -> Result<T, ResourceError> {
        let mut guard = self
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Re-check: another caller may have filled it while we waited.
        let map = match guard.take() {
            Some(map) => map,
            None => self.enumerate()?,
        };
        Ok(f(guard.insert(map)))
    }

    fn read_cached<T>(&self, f: impl FnOnce(&ChildMap) -> T) -> Option<T> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

impl Capabilities for PreparedContainer {
    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }

    fn as_mutable(&self) -> Option<&dyn MutableContainer> {
        self.mutable.then_some(self as &dyn MutableContainer)
    }

    fn as_cache(&self) -> Option<&dyn CacheBearing> {
        Some(self)
    }
}

impl Overlay for PreparedContainer {
    fn kind(&self) -> OverlayKind {
        OverlayKind::PreparedContainer
    }

    fn parent(&self) -> Option<Node> {
        upgrade(&self.parent)
    }
}

impl Container for PreparedContainer {
    fn children(&self) -> Result<Vec<Node>, ResourceError> {
        if !self.is_caching() {
            return Ok(self.enumerate()?.into_values().collect());
        }
        let cached = self.read_cached(|map| map.values().cloned().collect::<Vec<_>>());
        if let Some(children) = cached {
            return Ok(children);
        }
        self.with_children(|map| map.values().cloned().collect::<Vec<_>>())
    }

    fn get_child(&self, name: &str) -> Result<Option<Node>, ResourceError> {
        if !self.is_caching() {
            return Ok(self.inner.get_child(name)?.map(|child| self.wrap(&child)));
        }
        let cached = self.read_cached(|map| map.get(name).cloned());
        if let Some(child) = cached {
            return Ok(child);
        }
        self.with_children(|map| map.get(name).cloned())
    }
}

impl MutableContainer for PreparedContainer {
    fn create(&self, name: &str, content_type: Option<&str>) -> Result<Node, ResourceError> {
        let created = self.wrap(&self.inner.create(name, content_type)?);
        if self.is_caching() {
            self.with_children(|map| map.insert(name.to_owned(), created.clone()))?;
        }
        Ok(created)
    }

    fn delete(&self, name: &str) -> Result<(), ResourceError> {
        self.inner.delete(name)?;
        if self.is_caching() {
            self.with_children(|map| map.remove(name))?;
        }
        Ok(())
    }
}

impl CacheBearing for PreparedContainer {
    fn reset_cache(&self) -> Result<(), ResourceError> {
        let mut guard = self
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if self.inner.supports(Capability::CacheBearing) {
            self.inner.reset_cache()?;
        }
        log::debug!("prepared: reset, path={}", self.inner.path().display());
        *guard = None;
        Ok(())
    }

    fn is_caching(&self) -> bool {
        PreparedContainer::is_caching(self)
    }

    fn set_caching(&self, caching: bool) {
        self.caching.store(caching, Ordering::Release);
        if !caching {
            *self
                .children
                .write()
                .unwrap_or_else(PoisonError::into_inner) = None;
        }
    }
}

/// Detaches the wrapped node and prepares the copy.
struct PreparedDetach {
    inner: Node,
}

impl Capabilities for PreparedDetach {
    fn as_detachable(&self) -> Option<&dyn Detachable> {
        Some(self)
    }
}

impl Overlay for PreparedDetach {
    fn kind(&self) -> OverlayKind {
        OverlayKind::PreparedDetach
    }
}

impl Detachable for PreparedDetach {
    fn detach(&self) -> Result<Node, ResourceError> {
        Ok(prepare(&self.inner.detach()?))
    }
}
