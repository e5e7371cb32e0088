//! # Snapshot Engine
//!
//! Freeze a node (optionally its subtree) in place, then either release the
//! freeze or roll the live tree back to what was captured.
//!
//! ## Lifecycle
//!
//! ```text
//! Live ──snapshot()──▶ Snapshotted ──release()──▶ Live
//!                           │
//!                           └──restore()──▶ origin's parent rewritten from the snapshot
//! ```
//!
//! ## Overlay Set
//!
//! | Node supports | Overlay attached | Effect while snapshotted |
//! |---------------|------------------|--------------------------|
//! | container | `FrozenContainer` | children fixed to the captured list |
//! | readable | `BufferedReadable` | reads serve the captured bytes |
//! | writable | `WriteBlocker` | `open_write` fails with [`ResourceError::Frozen`] |
//! | mutable container | `MutationBlocker` | `create`/`delete` fail with [`ResourceError::Frozen`] |
//! | cache-bearing | `CacheBlocker` | resets ignored, caching always reported on |
//!
//! `snapshot`, `release` and `restore` are administrative operations: callers
//! must not run them concurrently on the same node. Reading a snapshotted
//! node is safe from any number of threads.
//!
//! ## Example
//!
//! ```rust
//! use resource_snapshot::{is_snapshotted, prepare, release, snapshot, MemoryResource};
//!
//! let root = MemoryResource::root();
//! let file = root.create("config", None).unwrap();
//! file.write_all(b"v1").unwrap();
//!
//! let view = prepare(&file);
//! snapshot(&view, true).unwrap();
//! assert!(is_snapshotted(&view));
//!
//! file.write_all(b"v2").unwrap();
//! assert_eq!(view.read_to_vec().unwrap(), b"v1");
//! assert!(view.write_all(b"v3").unwrap_err().is_frozen());
//!
//! release(&view, true).unwrap();
//! assert_eq!(view.read_to_vec().unwrap(), b"v2");
//! ```

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    CacheBearing, Capabilities, Capability, Container, MutableContainer, Node, Overlay,
    OverlayKind, Readable, ResourceError, SnapshotConfig, Writable,
};

/// Freeze `node`, and its whole subtree when `recursive`.
///
/// Shorthand for [`snapshot_with`] with default limits.
///
/// # Errors
///
/// See [`snapshot_with`].
pub fn snapshot(node: &Node, recursive: bool) -> Result<(), ResourceError> {
    snapshot_with(
        node,
        &SnapshotConfig {
            recursive,
            ..SnapshotConfig::default()
        },
    )
}

/// Freeze `node` according to `config`.
///
/// Children are captured before content. With `config.recursive`, every
/// child is frozen before being recorded, so the captured list holds frozen
/// nodes.
///
/// # Errors
///
/// - [`ResourceError::InvalidState`] if `node` is already snapshotted
/// - [`ResourceError::Io`] if listing or buffering fails
/// - [`ResourceError::ContentTooLarge`] if content exceeds
///   `config.max_content_size`
///
/// A failure leaves whatever was attached before it in place; the buffered
/// overlay is only attached once the whole content was read.
pub fn snapshot_with(node: &Node, config: &SnapshotConfig) -> Result<(), ResourceError> {
    let path = node.path();
    if is_snapshotted(node) {
        return Err(ResourceError::InvalidState {
            path,
            reason: "already snapshotted",
        });
    }
    log::debug!(
        "snapshot: freeze, path={}, recursive={}",
        path.display(),
        config.recursive
    );

    if node.supports(Capability::Container) {
        let children = node.children()?;
        if config.recursive {
            for child in &children {
                snapshot_with(child, config)?;
            }
        }
        node.registry()
            .attach(Arc::new(FrozenContainer { children }));
    }

    if node.supports(Capability::Readable) {
        let content = buffer(node, &path, config.max_content_size)?;
        node.registry()
            .attach(Arc::new(BufferedReadable { content }));
    }

    if node.supports(Capability::Writable) {
        node.registry().attach(Arc::new(WriteBlocker { path: path.clone() }));
    }

    if node.supports(Capability::MutableContainer) {
        node.registry().attach(Arc::new(MutationBlocker { path }));
    }

    if node.supports(Capability::CacheBearing) {
        node.registry().attach(Arc::new(CacheBlocker));
    }
    Ok(())
}

fn buffer(node: &Node, path: &Path, limit: Option<u64>) -> Result<Arc<[u8]>, ResourceError> {
    let mut reader = node.open_read()?;
    let mut content = Vec::new();
    let read = match limit {
        Some(limit) => reader
            .by_ref()
            .take(limit.saturating_add(1))
            .read_to_end(&mut content),
        None => reader.read_to_end(&mut content),
    };
    // Close before inspecting the outcome.
    drop(reader);
    read.map_err(|e| ResourceError::io("snapshot", path, e))?;

    match limit {
        Some(limit) if content.len() as u64 > limit => Err(ResourceError::ContentTooLarge {
            path: path.to_path_buf(),
            limit,
        }),
        _ => Ok(content.into()),
    }
}

/// Strip every snapshot overlay from `node`, and from its live subtree when
/// `recursive`, then reset the node's cache.
///
/// Recursion follows the live listing after the freeze is lifted. Calling
/// this on a node that is not snapshotted only performs the cache reset.
///
/// # Errors
///
/// Listing failures and cache-reset failures are returned as-is.
pub fn release(node: &Node, recursive: bool) -> Result<(), ResourceError> {
    let removed = node.registry().detach(&OverlayKind::SNAPSHOT);
    log::debug!(
        "snapshot: release, path={}, removed={}",
        node.path().display(),
        removed
    );

    if recursive && node.supports(Capability::Container) {
        for child in node.children()? {
            release(&child, recursive)?;
        }
    }

    if node.supports(Capability::CacheBearing) {
        node.reset_cache()?;
    }
    Ok(())
}

/// Overwrite the live location of `node` with its snapshot.
///
/// The live location is the parent of [`Node::origin`]: the innermost storage
/// node beneath any prepared views. Whatever currently lives there under the
/// same name is deleted first, then the snapshot is copied in with
/// [`copy`](crate::copy). Returns the restored live node.
///
/// When `node` sits under a prepared view of that location, the delete and
/// copy go through the view so its cached listing mirrors the change, and
/// the returned node is prepared. Any other cache-bearing parent is reset.
///
/// `node` keeps its overlays; call [`release`] afterwards to lift them.
///
/// # Errors
///
/// - [`ResourceError::InvalidState`] if `node` is not snapshotted or its
///   origin has no parent
/// - any failure from deleting the live node or copying the snapshot; nodes
///   already copied are not rolled back
pub fn restore(node: &Node) -> Result<Node, ResourceError> {
    if !is_snapshotted(node) {
        return Err(ResourceError::InvalidState {
            path: node.path(),
            reason: "not snapshotted",
        });
    }
    let origin = node.origin();
    let storage_parent = origin.parent().ok_or_else(|| ResourceError::InvalidState {
        path: origin.path(),
        reason: "no parent to restore into",
    })?;
    let view = node.parent().filter(|view| !view.ptr_eq(&storage_parent));
    let through_view = view
        .as_ref()
        .is_some_and(|view| view.origin().ptr_eq(&storage_parent.origin()));
    let parent = match &view {
        Some(view) if through_view => view.clone(),
        _ => storage_parent,
    };

    let name = origin.name();
    let deleted = match parent.get_child(name)? {
        Some(_) => match parent.delete(name) {
            Ok(()) => true,
            // A stale cached entry for a node already gone from storage.
            Err(ResourceError::NotFound { .. }) => false,
            Err(e) => return Err(e),
        },
        None => false,
    };
    if !deleted {
        log::warn!(
            "snapshot: restore found no live node, path={}",
            origin.path().display()
        );
    }

    let restored = crate::copy(node, &parent)?;
    let stale_view = view.filter(|_| !through_view);
    if let Some(view) = stale_view.filter(|view| view.supports(Capability::CacheBearing)) {
        view.reset_cache()?;
    }
    log::debug!(
        "snapshot: restore, path={}, through_view={}",
        restored.path().display(),
        through_view
    );
    Ok(restored)
}

/// Returns `true` if any snapshot overlay is attached to `node` itself.
pub fn is_snapshotted(node: &Node) -> bool {
    OverlayKind::SNAPSHOT
        .iter()
        .any(|kind| node.registry().contains(*kind))
}

/// Children captured at snapshot time.
struct FrozenContainer {
    children: Vec<Node>,
}

impl Capabilities for FrozenContainer {
    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }
}

impl Overlay for FrozenContainer {
    fn kind(&self) -> OverlayKind {
        OverlayKind::FrozenContainer
    }
}

impl Container for FrozenContainer {
    fn children(&self) -> Result<Vec<Node>, ResourceError> {
        Ok(self.children.clone())
    }

    fn get_child(&self, name: &str) -> Result<Option<Node>, ResourceError> {
        Ok(self.children.iter().find(|child| child.name() == name).cloned())
    }
}

/// Content captured at snapshot time.
struct BufferedReadable {
    content: Arc<[u8]>,
}

impl Capabilities for BufferedReadable {
    fn as_readable(&self) -> Option<&dyn Readable> {
        Some(self)
    }
}

impl Overlay for BufferedReadable {
    fn kind(&self) -> OverlayKind {
        OverlayKind::BufferedReadable
    }
}

impl Readable for BufferedReadable {
    fn open_read(&self) -> Result<Box<dyn Read + Send>, ResourceError> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.content))))
    }
}

struct WriteBlocker {
    path: PathBuf,
}

impl Capabilities for WriteBlocker {
    fn as_writable(&self) -> Option<&dyn Writable> {
        Some(self)
    }
}

impl Overlay for WriteBlocker {
    fn kind(&self) -> OverlayKind {
        OverlayKind::WriteBlocker
    }
}

impl Writable for WriteBlocker {
    fn open_write(&self) -> Result<Box<dyn Write + Send>, ResourceError> {
        Err(ResourceError::Frozen {
            path: self.path.clone(),
            operation: "open_write",
        })
    }
}

struct MutationBlocker {
    path: PathBuf,
}

impl Capabilities for MutationBlocker {
    fn as_mutable(&self) -> Option<&dyn MutableContainer> {
        Some(self)
    }
}

impl Overlay for MutationBlocker {
    fn kind(&self) -> OverlayKind {
        OverlayKind::MutationBlocker
    }
}

impl MutableContainer for MutationBlocker {
    fn create(&self, name: &str, _content_type: Option<&str>) -> Result<Node, ResourceError> {
        Err(ResourceError::Frozen {
            path: self.path.join(name),
            operation: "create",
        })
    }

    fn delete(&self, name: &str) -> Result<(), ResourceError> {
        Err(ResourceError::Frozen {
            path: self.path.join(name),
            operation: "delete",
        })
    }
}

/// Keeps caches from being reset or switched off under a snapshot.
struct CacheBlocker;

impl Capabilities for CacheBlocker {
    fn as_cache(&self) -> Option<&dyn CacheBearing> {
        Some(self)
    }
}

impl Overlay for CacheBlocker {
    fn kind(&self) -> OverlayKind {
        OverlayKind::CacheBlocker
    }
}

impl CacheBearing for CacheBlocker {
    fn reset_cache(&self) -> Result<(), ResourceError> {
        Ok(())
    }

    fn is_caching(&self) -> bool {
        true
    }

    fn set_caching(&self, _caching: bool) {}
}
