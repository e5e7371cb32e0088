//! # In-Memory Backend
//!
//! A reference storage backend holding directories and files in memory.
//!
//! | Entry | Capabilities |
//! |-------|--------------|
//! | Directory | container, mutable container, detachable |
//! | File | readable, writable, detachable |
//!
//! Directories are created with [`DIRECTORY_CONTENT_TYPE`]; any other content
//! type creates a file.
//!
//! ```rust
//! use resource_snapshot::MemoryResource;
//!
//! let root = MemoryResource::root();
//! let notes = root.create("notes.txt", Some("text/plain")).unwrap();
//! notes.write_all(b"hello").unwrap();
//!
//! let found = root.get_child("notes.txt").unwrap().unwrap();
//! assert_eq!(found.read_to_string().unwrap(), "hello");
//! assert_eq!(found.path().to_str(), Some("/notes.txt"));
//! ```

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    Capabilities, Capability, Container, DIRECTORY_CONTENT_TYPE, Detachable, MutableContainer,
    Node, Readable, Resource, ResourceError, WeakNode, Writable,
};

enum Entry {
    File(Arc<RwLock<Vec<u8>>>),
    Directory(RwLock<BTreeMap<String, Node>>),
}

/// A directory or file stored in memory.
///
/// Construct nodes through [`MemoryResource::root`],
/// [`MemoryResource::directory`] or [`MemoryResource::file`] and grow the tree
/// with [`Node::create`].
pub struct MemoryResource {
    name: String,
    content_type: Option<String>,
    parent: WeakNode,
    this: WeakNode,
    entry: Entry,
}

impl MemoryResource {
    /// An empty, unnamed root directory.
    pub fn root() -> Node {
        Self::directory("")
    }

    /// An empty directory with no parent.
    pub fn directory(name: &str) -> Node {
        Self::build(name, Some(DIRECTORY_CONTENT_TYPE), WeakNode::new(), None)
    }

    /// A file with no parent.
    pub fn file(name: &str, content_type: Option<&str>, content: &[u8]) -> Node {
        Self::build(name, content_type, WeakNode::new(), Some(content.to_vec()))
    }

    fn build(
        name: &str,
        content_type: Option<&str>,
        parent: WeakNode,
        content: Option<Vec<u8>>,
    ) -> Node {
        let entry = match content {
            Some(bytes) => Entry::File(Arc::new(RwLock::new(bytes))),
            None if content_type == Some(DIRECTORY_CONTENT_TYPE) => {
                Entry::Directory(RwLock::new(BTreeMap::new()))
            }
            None => Entry::File(Arc::default()),
        };
        Node::new_cyclic(|this| MemoryResource {
            name: name.to_owned(),
            content_type: content_type.map(str::to_owned),
            parent,
            this: this.clone(),
            entry,
        })
    }

    fn path(&self) -> PathBuf {
        self.this
            .upgrade()
            .map(|node| node.path())
            .unwrap_or_else(|| PathBuf::from("/").join(&self.name))
    }

    fn detached_copy(&self) -> Result<Node, ResourceError> {
        match &self.entry {
            Entry::File(content) => {
                let bytes = content.read().unwrap_or_else(PoisonError::into_inner).clone();
                Ok(Self::build(
                    &self.name,
                    self.content_type.as_deref(),
                    WeakNode::new(),
                    Some(bytes),
                ))
            }
            Entry::Directory(children) => {
                let copy = Self::build(
                    &self.name,
                    self.content_type.as_deref(),
                    WeakNode::new(),
                    None,
                );
                let children: Vec<Node> = children
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .cloned()
                    .collect();
                for child in &children {
                    crate::copy(child, &copy)?;
                }
                Ok(copy)
            }
        }
    }
}

impl Capabilities for MemoryResource {
    fn as_readable(&self) -> Option<&dyn Readable> {
        matches!(self.entry, Entry::File(_)).then_some(self as &dyn Readable)
    }

    fn as_writable(&self) -> Option<&dyn Writable> {
        matches!(self.entry, Entry::File(_)).then_some(self as &dyn Writable)
    }

    fn as_container(&self) -> Option<&dyn Container> {
        matches!(self.entry, Entry::Directory(_)).then_some(self as &dyn Container)
    }

    fn as_mutable(&self) -> Option<&dyn MutableContainer> {
        matches!(self.entry, Entry::Directory(_)).then_some(self as &dyn MutableContainer)
    }

    fn as_detachable(&self) -> Option<&dyn Detachable> {
        Some(self)
    }
}

impl Resource for MemoryResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn parent(&self) -> Option<Node> {
        self.parent.upgrade()
    }
}

impl Readable for MemoryResource {
    fn open_read(&self) -> Result<Box<dyn Read + Send>, ResourceError> {
        match &self.entry {
            Entry::File(content) => {
                let bytes = content.read().unwrap_or_else(PoisonError::into_inner).clone();
                Ok(Box::new(Cursor::new(bytes)))
            }
            Entry::Directory(_) => Err(ResourceError::Unsupported {
                path: self.path(),
                capability: Capability::Readable,
            }),
        }
    }
}

impl Writable for MemoryResource {
    fn open_write(&self) -> Result<Box<dyn Write + Send>, ResourceError> {
        match &self.entry {
            Entry::File(content) => Ok(Box::new(MemoryWriter {
                target: Arc::clone(content),
                buffer: Vec::new(),
                dirty: true,
            })),
            Entry::Directory(_) => Err(ResourceError::Unsupported {
                path: self.path(),
                capability: Capability::Writable,
            }),
        }
    }
}

impl Container for MemoryResource {
    fn children(&self) -> Result<Vec<Node>, ResourceError> {
        match &self.entry {
            Entry::Directory(children) => Ok(children
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .cloned()
                .collect()),
            Entry::File(_) => Err(ResourceError::Unsupported {
                path: self.path(),
                capability: Capability::Container,
            }),
        }
    }

    fn get_child(&self, name: &str) -> Result<Option<Node>, ResourceError> {
        match &self.entry {
            Entry::Directory(children) => Ok(children
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name)
                .cloned()),
            Entry::File(_) => Err(ResourceError::Unsupported {
                path: self.path(),
                capability: Capability::Container,
            }),
        }
    }
}

impl MutableContainer for MemoryResource {
    fn create(&self, name: &str, content_type: Option<&str>) -> Result<Node, ResourceError> {
        let Entry::Directory(children) = &self.entry else {
            return Err(ResourceError::Unsupported {
                path: self.path(),
                capability: Capability::MutableContainer,
            });
        };
        let mut children = children.write().unwrap_or_else(PoisonError::into_inner);
        if children.contains_key(name) {
            return Err(ResourceError::AlreadyExists {
                path: self.path().join(name),
                operation: "create",
            });
        }
        let child = Self::build(name, content_type, self.this.clone(), None);
        children.insert(name.to_owned(), child.clone());
        Ok(child)
    }

    fn delete(&self, name: &str) -> Result<(), ResourceError> {
        let Entry::Directory(children) = &self.entry else {
            return Err(ResourceError::Unsupported {
                path: self.path(),
                capability: Capability::MutableContainer,
            });
        };
        children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ResourceError::NotFound {
                path: self.path().join(name),
            })
    }
}

impl Detachable for MemoryResource {
    fn detach(&self) -> Result<Node, ResourceError> {
        self.detached_copy()
    }
}

/// Buffers writes and replaces the file content on flush and on drop.
struct MemoryWriter {
    target: Arc<RwLock<Vec<u8>>>,
    buffer: Vec<u8>,
    dirty: bool,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.dirty = true;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.dirty {
            *self.target.write().unwrap_or_else(PoisonError::into_inner) = self.buffer.clone();
            self.dirty = false;
        }
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
