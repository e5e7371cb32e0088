//! Readable capability.

use std::io::Read;

use crate::ResourceError;

/// A node that yields a byte-input stream.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Methods take `&self`; backends use
/// interior mutability for any state the stream needs.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn Readable`.
pub trait Readable: Send + Sync {
    /// Open the node's content for reading.
    ///
    /// The returned reader releases whatever it holds when dropped.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Io`] if the backend cannot open the content
    fn open_read(&self) -> Result<Box<dyn Read + Send>, ResourceError>;
}
