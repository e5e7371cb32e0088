//! # resource-snapshot
//!
//! Freeze-and-rollback for **hierarchical resource trees**.
//!
//! Take an in-memory, immutable snapshot of a live subtree, keep using the live
//! tree (or hand it to experimental code), then either release the snapshot or
//! restore it, overwriting whatever the live tree became.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use resource_snapshot::{prepare, restore, snapshot, MemoryResource, DIRECTORY_CONTENT_TYPE};
//!
//! let root = MemoryResource::root();
//! let a = root.create("a", Some(DIRECTORY_CONTENT_TYPE)).unwrap();
//! a.create("x", None).unwrap().write_all(b"1").unwrap();
//!
//! // Freeze a prepared view of /a.
//! let view = prepare(&a);
//! snapshot(&view, true).unwrap();
//!
//! // The live tree moves on...
//! a.delete("x").unwrap();
//! a.create("z", None).unwrap();
//!
//! // ...the snapshot does not.
//! assert_eq!(view.child_names().unwrap(), vec!["x"]);
//!
//! // Roll the live tree back.
//! let live = restore(&view).unwrap();
//! assert_eq!(live.child_names().unwrap(), vec!["x"]);
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Node`] | Identity-bearing handle; dispatches over overlays, then its base |
//! | [`OverlayRegistry`] | Per-node ordered overlays: attach, detach by kind, list |
//! | [`Resource`] | Original behavior of a node (storage backends implement this) |
//! | [`Overlay`] | Capability implementation attached at runtime |
//! | [`ResourceError`] | Error type with path context |
//! | [`SnapshotConfig`] | Recursion and buffering limits for snapshots |
//! | [`MemoryResource`] | Reference in-memory storage backend |
//!
//! ## Operations
//!
//! | Function | Effect |
//! |----------|--------|
//! | [`prepare`] | Cached view whose child listing is computed once |
//! | [`snapshot`] / [`snapshot_with`] | Freeze a node (and subtree) in place |
//! | [`release`] | Lift the freeze and reset caches |
//! | [`restore`] | Overwrite the live location with the snapshot |
//! | [`is_snapshotted`] | Whether a node currently carries snapshot overlays |
//! | [`copy`] | Recursive tree copy |
//!
//! ---
//!
//! ## Capabilities
//!
//! A node is polymorphic over the roles it supports: readable, writable,
//! container, mutable container, cache-bearing, detachable. See the
//! [`Capabilities`] trait and [`Capability`] enum.
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. Prepared containers
//! serialize their cache per instance. `snapshot`, `release` and `restore` are
//! single-writer operations: sequence them per node.
//!
//! ## Logging
//!
//! Events go through the [`log`](https://docs.rs/log) facade at `debug` and
//! `trace` level. Install any logger to see them.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`SnapshotConfig`] and [`Capability`], plus `SnapshotConfig::from_json` |

// Private modules
mod config;
mod copy;
mod error;
mod layer;
mod memory;
mod node;
mod prepared;
mod snapshot;
mod traits;
mod types;

// Public re-exports - error types
pub use error::ResourceError;

// Public re-exports - core types
pub use config::SnapshotConfig;
pub use node::{Node, OverlayRegistry, WeakNode};
pub use types::{Capability, DIRECTORY_CONTENT_TYPE, OverlayKind};

// Public re-exports - capability traits
pub use traits::{
    CacheBearing, Capabilities, Container, Detachable, MutableContainer, Overlay, Readable,
    Resource, Writable,
};

// Public re-exports - operations
pub use copy::copy;
pub use prepared::prepare;
pub use snapshot::{is_snapshotted, release, restore, snapshot, snapshot_with};

// Public re-exports - infrastructure
pub use layer::{Layer, LayerExt, PreparedLayer, SnapshotLayer};
pub use memory::MemoryResource;
