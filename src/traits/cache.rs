//! Cache-bearing capability.

use crate::ResourceError;

/// A node carrying an internal cache.
pub trait CacheBearing: Send + Sync {
    /// Discard cached state so the next access recomputes it.
    fn reset_cache(&self) -> Result<(), ResourceError>;

    /// Whether the cache is currently in use.
    fn is_caching(&self) -> bool;

    /// Enable or disable the cache.
    fn set_caching(&self, caching: bool);
}
