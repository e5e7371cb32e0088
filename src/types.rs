//! Core types for the resource overlay model.

use std::fmt;

/// Content type reported by (and used to create) container nodes.
pub const DIRECTORY_CONTENT_TYPE: &str = "application/directory";

/// A behavioral role a node may support.
///
/// A node is polymorphic over whichever subset of these its overlays and its
/// base implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Capability {
    /// Yields a byte-input stream.
    Readable,
    /// Yields a byte-output stream.
    Writable,
    /// Enumerates children and looks them up by name.
    Container,
    /// Creates and deletes children.
    MutableContainer,
    /// Carries an internal cache that can be reset, enabled or disabled.
    CacheBearing,
    /// Produces a disconnected copy of itself.
    Detachable,
}

impl Capability {
    /// All capabilities, in declaration order.
    pub const ALL: [Capability; 6] = [
        Capability::Readable,
        Capability::Writable,
        Capability::Container,
        Capability::MutableContainer,
        Capability::CacheBearing,
        Capability::Detachable,
    ];

    /// Lowercase name used in error messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Readable => "readable",
            Capability::Writable => "writable",
            Capability::Container => "container",
            Capability::MutableContainer => "mutable container",
            Capability::CacheBearing => "cache",
            Capability::Detachable => "detachable",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the kind of an attached overlay.
///
/// Overlays are removed from a registry by kind, see
/// [`OverlayRegistry::detach`](crate::OverlayRegistry::detach).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Parent relocation for a prepared leaf.
    PreparedResource,
    /// Cached child listing of a prepared container.
    PreparedContainer,
    /// Detach that re-prepares the detached copy.
    PreparedDetach,
    /// Child list captured at snapshot time.
    FrozenContainer,
    /// Content buffered at snapshot time.
    BufferedReadable,
    /// Rejects write streams while snapshotted.
    WriteBlocker,
    /// Rejects create and delete while snapshotted.
    MutationBlocker,
    /// Ignores cache resets while snapshotted.
    CacheBlocker,
    /// Any overlay defined outside this crate.
    Custom(&'static str),
}

impl OverlayKind {
    /// The overlay kinds attached by a snapshot.
    pub const SNAPSHOT: [OverlayKind; 5] = [
        OverlayKind::FrozenContainer,
        OverlayKind::BufferedReadable,
        OverlayKind::WriteBlocker,
        OverlayKind::MutationBlocker,
        OverlayKind::CacheBlocker,
    ];

    /// Returns `true` for kinds attached by a snapshot.
    pub fn is_snapshot(self) -> bool {
        Self::SNAPSHOT.contains(&self)
    }
}
