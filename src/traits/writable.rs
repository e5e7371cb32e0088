//! Writable capability.

use std::io::Write;

use crate::ResourceError;

/// A node that yields a byte-output stream.
///
/// Writing replaces the node's content. Backends decide when written bytes
/// become visible; callers should `flush` before dropping the writer when
/// they need to observe failures.
pub trait Writable: Send + Sync {
    /// Open the node's content for writing.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::Frozen`] if the node is snapshotted
    /// - [`ResourceError::Io`] if the backend cannot open the content
    fn open_write(&self) -> Result<Box<dyn Write + Send>, ResourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_is_object_safe() {
        fn _check(_: &dyn Writable) {}
    }
}
