//! # Layer Trait
//!
//! Tower-style composition of node views.
//!
//! ## Overview
//!
//! A [`Layer`] holds configuration and applies it to a node, producing the
//! decorated node:
//!
//! ```text
//! Node ──▶ Layer::layer() ──▶ Decorated Node
//! ```
//!
//! | Layer | Produces |
//! |-------|----------|
//! | [`PreparedLayer`] | a prepared view, see [`prepare`] |
//! | [`SnapshotLayer`] | the same node, frozen by [`snapshot_with`] |
//!
//! ## Fluent Composition
//!
//! ```rust
//! use resource_snapshot::{
//!     is_snapshotted, LayerExt, MemoryResource, PreparedLayer, SnapshotConfig, SnapshotLayer,
//! };
//!
//! let storage = MemoryResource::root();
//! storage.create("data.bin", None).unwrap();
//!
//! let frozen = storage
//!     .clone()
//!     .layer(PreparedLayer::new())
//!     .layer(SnapshotLayer::new(SnapshotConfig::default()))
//!     .unwrap();
//!
//! assert!(is_snapshotted(&frozen));
//! assert!(!is_snapshotted(&storage));
//! ```

use crate::{Capabilities, Node, ResourceError, SnapshotConfig, prepare, snapshot_with};

/// A layer that decorates a node.
///
/// # Type Parameters
///
/// - `N`: the node type being decorated
///
/// # Design Notes
///
/// - `layer(self, node)` consumes both the layer and the node
/// - `Output` may be fallible, see [`SnapshotLayer`]
pub trait Layer<N> {
    /// The result of applying this layer.
    type Output;

    /// Decorate `node` with this layer's behavior.
    fn layer(self, node: N) -> Self::Output;
}

/// Extension trait for fluent layer composition.
///
/// Provides `.layer()` on [`Node`].
pub trait LayerExt: Sized {
    /// Apply a layer to this node.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Output {
        layer.layer(self)
    }
}

impl LayerExt for Node {}

/// Wraps a node in a prepared (caching) view.
#[derive(Debug, Clone)]
pub struct PreparedLayer {
    caching: bool,
}

impl PreparedLayer {
    /// A layer with caching enabled.
    pub fn new() -> Self {
        Self { caching: true }
    }

    /// Start the prepared view with caching on or off.
    pub fn caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }
}

impl Default for PreparedLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer<Node> for PreparedLayer {
    type Output = Node;

    fn layer(self, node: Node) -> Node {
        let prepared = prepare(&node);
        if !self.caching {
            if let Some(cache) = prepared.as_cache() {
                cache.set_caching(false);
            }
        }
        prepared
    }
}

/// Freezes a node in place and hands it back.
#[derive(Debug, Clone, Default)]
pub struct SnapshotLayer {
    config: SnapshotConfig,
}

impl SnapshotLayer {
    /// A layer freezing with `config`.
    pub fn new(config: SnapshotConfig) -> Self {
        Self { config }
    }
}

impl Layer<Node> for SnapshotLayer {
    type Output = Result<Node, ResourceError>;

    fn layer(self, node: Node) -> Self::Output {
        snapshot_with(&node, &self.config)?;
        Ok(node)
    }
}
