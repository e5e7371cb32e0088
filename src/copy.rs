//! Recursive tree copy.

use std::io::Write;

use crate::{Capability, DIRECTORY_CONTENT_TYPE, Node, ResourceError};

/// Copy `source` (and its subtree) into the `destination` container.
///
/// Creates a child named after `source` with its content type, streams
/// readable content into it and copies container children recursively. A
/// container without a content type is created as [`DIRECTORY_CONTENT_TYPE`].
/// Returns the created node.
///
/// # Errors
///
/// Whatever the source or destination reports, including
/// [`ResourceError::Unsupported`] when the created node cannot take the
/// content. Nodes copied before a failure are left in place.
///
/// # Example
///
/// ```rust
/// use resource_snapshot::{copy, MemoryResource, DIRECTORY_CONTENT_TYPE};
///
/// let root = MemoryResource::root();
/// let src = root.create("src", Some(DIRECTORY_CONTENT_TYPE)).unwrap();
/// src.create("a.txt", None).unwrap().write_all(b"a").unwrap();
/// let dst = root.create("dst", Some(DIRECTORY_CONTENT_TYPE)).unwrap();
///
/// copy(&src, &dst).unwrap();
///
/// let copied = dst.get_child("src").unwrap().unwrap();
/// assert_eq!(copied.get_child("a.txt").unwrap().unwrap().read_to_vec().unwrap(), b"a");
/// ```
pub fn copy(source: &Node, destination: &Node) -> Result<Node, ResourceError> {
    let is_container = source.supports(Capability::Container);
    let content_type = source
        .content_type()
        .or(is_container.then_some(DIRECTORY_CONTENT_TYPE));
    log::trace!(
        "copy: create, name={}, destination={}",
        source.name(),
        destination.path().display()
    );
    let target = destination.create(source.name(), content_type)?;

    if source.supports(Capability::Readable) {
        let mut reader = source.open_read()?;
        let mut writer = target.open_write()?;
        std::io::copy(&mut reader, &mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| ResourceError::io("copy", target.path(), e))?;
    }

    if is_container {
        for child in source.children()? {
            copy(&child, &target)?;
        }
    }
    Ok(target)
}
