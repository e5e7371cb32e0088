//! Snapshot configuration.

/// Options for [`snapshot_with`](crate::snapshot_with).
///
/// # Example
///
/// ```rust
/// use resource_snapshot::SnapshotConfig;
///
/// let config = SnapshotConfig::default().max_content_size(64 * 1024);
/// assert!(config.recursive);
/// assert_eq!(config.max_content_size, Some(65536));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SnapshotConfig {
    /// Freeze the whole subtree rather than only the node itself.
    pub recursive: bool,
    /// Largest content, in bytes, buffered per readable node. `None` buffers
    /// without limit.
    pub max_content_size: Option<u64>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            max_content_size: None,
        }
    }
}

impl SnapshotConfig {
    /// Set [`recursive`](Self::recursive).
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set [`max_content_size`](Self::max_content_size).
    pub fn max_content_size(mut self, limit: u64) -> Self {
        self.max_content_size = Some(limit);
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the input is not a valid configuration.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
