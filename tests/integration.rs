//! Integration tests for prepared views and the snapshot lifecycle.
//!
//! These tests verify that:
//! 1. Prepared containers enumerate their storage at most once per cache generation
//! 2. Snapshots freeze content and structure against live changes
//! 3. Release lifts the freeze and flushes stale caches
//! 4. Restore rolls the live tree back to the captured state

use resource_snapshot::*;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Probe backend: a container that counts listings and cache resets
// =============================================================================

#[derive(Default)]
struct Counters {
    listings: AtomicUsize,
    resets: AtomicUsize,
    fail_reset: AtomicBool,
}

struct Probe {
    inner: Node,
    counters: Arc<Counters>,
}

impl Probe {
    fn wrap(inner: Node) -> (Node, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let node = Node::new(Probe {
            inner,
            counters: Arc::clone(&counters),
        });
        (node, counters)
    }
}

impl Capabilities for Probe {
    fn as_container(&self) -> Option<&dyn Container> {
        Some(self)
    }
    fn as_mutable(&self) -> Option<&dyn MutableContainer> {
        Some(self)
    }
    fn as_cache(&self) -> Option<&dyn CacheBearing> {
        Some(self)
    }
}

impl Resource for Probe {
    fn name(&self) -> &str {
        self.inner.name()
    }
    fn content_type(&self) -> Option<&str> {
        self.inner.content_type()
    }
    fn parent(&self) -> Option<Node> {
        self.inner.parent()
    }
}

impl Container for Probe {
    fn children(&self) -> Result<Vec<Node>, ResourceError> {
        self.counters.listings.fetch_add(1, Ordering::SeqCst);
        self.inner.children()
    }
    fn get_child(&self, name: &str) -> Result<Option<Node>, ResourceError> {
        self.inner.get_child(name)
    }
}

impl MutableContainer for Probe {
    fn create(&self, name: &str, content_type: Option<&str>) -> Result<Node, ResourceError> {
        self.inner.create(name, content_type)
    }
    fn delete(&self, name: &str) -> Result<(), ResourceError> {
        self.inner.delete(name)
    }
}

impl CacheBearing for Probe {
    fn reset_cache(&self) -> Result<(), ResourceError> {
        self.counters.resets.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_reset.load(Ordering::SeqCst) {
            return Err(ResourceError::io(
                "reset_cache",
                PathBuf::from("/probe"),
                std::io::Error::other("backend unavailable"),
            ));
        }
        Ok(())
    }
    fn is_caching(&self) -> bool {
        true
    }
    fn set_caching(&self, _caching: bool) {}
}

// =============================================================================
// Flaky backend: a readable whose stream fails mid-read
// =============================================================================

struct Flaky {
    closed: Arc<AtomicBool>,
}

struct FlakyReader {
    closed: Arc<AtomicBool>,
    served: bool,
}

impl Read for FlakyReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.served {
            return Err(std::io::Error::other("disk gone"));
        }
        self.served = true;
        buf[0] = b'p';
        Ok(1)
    }
}

impl Drop for FlakyReader {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Capabilities for Flaky {
    fn as_readable(&self) -> Option<&dyn Readable> {
        Some(self)
    }
}

impl Resource for Flaky {
    fn name(&self) -> &str {
        "flaky"
    }
    fn content_type(&self) -> Option<&str> {
        None
    }
    fn parent(&self) -> Option<Node> {
        None
    }
}

impl Readable for Flaky {
    fn open_read(&self) -> Result<Box<dyn Read + Send>, ResourceError> {
        Ok(Box::new(FlakyReader {
            closed: Arc::clone(&self.closed),
            served: false,
        }))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// `/a` holding `x` = "1" and `y` = "2".
fn scenario_tree() -> (Node, Node) {
    let root = MemoryResource::root();
    let a = root.create("a", Some(DIRECTORY_CONTENT_TYPE)).unwrap();
    a.create("x", Some("text/plain"))
        .unwrap()
        .write_all(b"1")
        .unwrap();
    a.create("y", Some("text/plain"))
        .unwrap()
        .write_all(b"2")
        .unwrap();
    (root, a)
}

fn child(node: &Node, name: &str) -> Node {
    node.get_child(name)
        .unwrap()
        .unwrap_or_else(|| panic!("missing child {name}"))
}

fn probe_with_files(names: &[&str]) -> (Node, Node, Arc<Counters>) {
    let dir = MemoryResource::directory("probe");
    for name in names {
        dir.create(name, None).unwrap();
    }
    let (probe, counters) = Probe::wrap(dir.clone());
    (dir, probe, counters)
}

// =============================================================================
// Prepared views
// =============================================================================

#[test]
fn prepared_listing_enumerates_storage_once() {
    init_logging();
    let (_dir, probe, counters) = probe_with_files(&["a", "b"]);
    let view = prepare(&probe);

    let first = view.children().unwrap();
    let second = view.children().unwrap();

    assert_eq!(counters.listings.load(Ordering::SeqCst), 1);
    assert_eq!(first.len(), 2);
    for (a, b) in first.iter().zip(&second) {
        assert!(a.ptr_eq(b));
    }
}

#[test]
fn prepared_create_and_delete_skip_enumeration() {
    init_logging();
    let (_dir, probe, counters) = probe_with_files(&["a"]);
    let view = prepare(&probe);
    view.children().unwrap();

    let created = view.create("n", None).unwrap();
    assert!(child(&view, "n").ptr_eq(&created));

    view.delete("n").unwrap();
    assert!(view.get_child("n").unwrap().is_none());

    assert_eq!(counters.listings.load(Ordering::SeqCst), 1);
}

#[test]
fn prepared_reset_forwards_and_recomputes() {
    init_logging();
    let (dir, probe, counters) = probe_with_files(&["a"]);
    let view = prepare(&probe);
    view.children().unwrap();

    dir.create("b", None).unwrap();
    view.reset_cache().unwrap();

    assert_eq!(counters.resets.load(Ordering::SeqCst), 1);
    assert_eq!(view.child_names().unwrap(), vec!["a", "b"]);
    assert_eq!(counters.listings.load(Ordering::SeqCst), 2);
}

#[test]
fn prepared_listing_is_computed_once_under_contention() {
    init_logging();
    let (_dir, probe, counters) = probe_with_files(&["a", "b", "c"]);
    let view = prepare(&probe);

    let listings: Vec<Vec<Node>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| view.children().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(counters.listings.load(Ordering::SeqCst), 1);
    for listing in &listings[1..] {
        for (a, b) in listing.iter().zip(&listings[0]) {
            assert!(a.ptr_eq(b));
        }
    }
}

// =============================================================================
// Snapshot lifecycle
// =============================================================================

#[test]
fn is_snapshotted_follows_lifecycle() {
    init_logging();
    let (_root, a) = scenario_tree();

    assert!(!is_snapshotted(&a));
    snapshot(&a, true).unwrap();
    assert!(is_snapshotted(&a));
    release(&a, true).unwrap();
    assert!(!is_snapshotted(&a));
}

#[test]
fn recursive_snapshot_blocks_every_mutation() {
    init_logging();
    let (_root, a) = scenario_tree();
    let sub = a.create("sub", Some(DIRECTORY_CONTENT_TYPE)).unwrap();
    sub.create("leaf", None).unwrap();
    snapshot(&a, true).unwrap();

    assert!(a.create("z", None).unwrap_err().is_frozen());
    assert!(a.delete("x").unwrap_err().is_frozen());
    assert!(child(&a, "x").write_all(b"no").unwrap_err().is_frozen());
    assert!(matches!(child(&a, "y").open_write(), Err(e) if e.is_frozen()));

    let sub = child(&a, "sub");
    assert!(is_snapshotted(&sub));
    let err = sub.create("new", None).unwrap_err();
    assert!(err.is_frozen());
    assert_eq!(err.to_string(), "create: resource is snapshotted: /a/sub/new");
    assert!(sub.delete("leaf").unwrap_err().is_frozen());
    assert_eq!(sub.child_names().unwrap(), vec!["leaf"]);
}

#[test]
fn non_recursive_snapshot_leaves_children_live() {
    init_logging();
    let (_root, a) = scenario_tree();
    snapshot(&a, false).unwrap();

    assert!(a.create("z", None).unwrap_err().is_frozen());
    let x = child(&a, "x");
    x.write_all(b"changed").unwrap();
    assert_eq!(x.read_to_vec().unwrap(), b"changed");
}

#[test]
fn snapshot_reads_ignore_live_changes() {
    init_logging();
    let (_root, a) = scenario_tree();
    let view = prepare(&a);
    snapshot(&view, true).unwrap();

    child(&a, "x").write_all(b"live").unwrap();

    assert_eq!(child(&view, "x").read_to_vec().unwrap(), b"1");
    assert_eq!(child(&a, "x").read_to_vec().unwrap(), b"live");
}

#[test]
fn snapshot_content_is_shared_across_readers() {
    init_logging();
    let file = MemoryResource::file("shared", None, b"frozen bytes");
    snapshot(&file, false).unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| assert_eq!(file.read_to_vec().unwrap(), b"frozen bytes"));
        }
    });
}

#[test]
fn failed_read_closes_stream_and_attaches_no_buffer() {
    init_logging();
    let closed = Arc::new(AtomicBool::new(false));
    let node = Node::new(Flaky {
        closed: Arc::clone(&closed),
    });

    let err = snapshot(&node, false).unwrap_err();

    assert!(matches!(err, ResourceError::Io { operation: "snapshot", .. }));
    assert!(closed.load(Ordering::SeqCst));
    assert!(!node.registry().contains(OverlayKind::BufferedReadable));
}

#[test]
fn snapshot_suppresses_cache_resets() {
    init_logging();
    let (_dir, probe, counters) = probe_with_files(&["a"]);
    snapshot(&probe, false).unwrap();

    probe.reset_cache().unwrap();
    probe.set_caching(false).unwrap();

    assert_eq!(counters.resets.load(Ordering::SeqCst), 0);
    assert!(probe.is_caching().unwrap());
}

#[test]
fn release_twice_still_resets_cache() {
    init_logging();
    let (_dir, probe, counters) = probe_with_files(&["a"]);
    snapshot(&probe, true).unwrap();

    release(&probe, true).unwrap();
    release(&probe, true).unwrap();

    assert!(!is_snapshotted(&probe));
    assert_eq!(counters.resets.load(Ordering::SeqCst), 2);
}

#[test]
fn release_surfaces_cache_reset_failure() {
    init_logging();
    let (_dir, probe, counters) = probe_with_files(&["a"]);
    snapshot(&probe, false).unwrap();
    counters.fail_reset.store(true, Ordering::SeqCst);

    let err = release(&probe, false).unwrap_err();

    assert!(matches!(err, ResourceError::Io { .. }));
    assert!(!is_snapshotted(&probe));
}

#[test]
fn release_flushes_stale_prepared_listing() {
    init_logging();
    let (_root, a) = scenario_tree();
    let view = prepare(&a);
    snapshot(&view, true).unwrap();

    a.create("z", None).unwrap();
    assert_eq!(view.child_names().unwrap(), vec!["x", "y"]);

    release(&view, true).unwrap();

    assert_eq!(view.child_names().unwrap(), vec!["x", "y", "z"]);
    for node in view.children().unwrap() {
        assert!(!is_snapshotted(&node));
    }
}

// =============================================================================
// Restore
// =============================================================================

#[test]
fn restore_round_trips_readable_content() {
    init_logging();
    let root = MemoryResource::root();
    let file = root.create("doc.txt", Some("text/plain")).unwrap();
    file.write_all(b"B").unwrap();

    let view = prepare(&file);
    snapshot(&view, true).unwrap();
    file.write_all(b"B'").unwrap();

    restore(&view).unwrap();

    let live = child(&root, "doc.txt");
    assert_eq!(live.read_to_vec().unwrap(), b"B");
    assert_eq!(live.content_type(), Some("text/plain"));
}

#[test]
fn scenario_snapshot_mutate_restore() {
    init_logging();
    let (root, a) = scenario_tree();
    let view = prepare(&a);
    snapshot(&view, true).unwrap();

    a.delete("x").unwrap();
    child(&a, "y").write_all(b"3").unwrap();
    a.create("z", None).unwrap();

    assert_eq!(view.child_names().unwrap(), vec!["x", "y"]);
    assert_eq!(child(&view, "x").read_to_vec().unwrap(), b"1");
    assert_eq!(child(&view, "y").read_to_vec().unwrap(), b"2");

    restore(&view).unwrap();

    let live = child(&root, "a");
    assert_eq!(live.child_names().unwrap(), vec!["x", "y"]);
    assert_eq!(child(&live, "x").read_to_vec().unwrap(), b"1");
    assert_eq!(child(&live, "y").read_to_vec().unwrap(), b"2");
    assert!(live.get_child("z").unwrap().is_none());
}

#[test]
fn restore_recreates_deleted_location() {
    init_logging();
    let (root, a) = scenario_tree();
    let view = prepare(&a);
    snapshot(&view, true).unwrap();

    root.delete("a").unwrap();
    restore(&view).unwrap();

    assert_eq!(child(&root, "a").child_names().unwrap(), vec!["x", "y"]);
}

#[test]
fn restore_refreshes_prepared_ancestor_listing() {
    init_logging();
    let (root, a) = scenario_tree();
    let view_root = prepare(&root);
    let view_a = child(&view_root, "a");
    snapshot(&view_a, true).unwrap();

    a.delete("x").unwrap();
    a.create("z", None).unwrap();

    let restored = restore(&view_a).unwrap();
    release(&view_a, true).unwrap();

    assert!(child(&view_root, "a").ptr_eq(&restored));
    assert_eq!(child(&root, "a").child_names().unwrap(), vec!["x", "y"]);
    assert_eq!(
        child(&view_root, "a").child_names().unwrap(),
        vec!["x", "y"]
    );
    assert_eq!(
        child(&child(&view_root, "a"), "x").read_to_vec().unwrap(),
        b"1"
    );
}

#[test]
fn restore_through_prepared_ancestor_after_storage_delete() {
    init_logging();
    let (root, _a) = scenario_tree();
    let view_root = prepare(&root);
    let view_a = child(&view_root, "a");
    snapshot(&view_a, true).unwrap();

    // Removed behind the view's back; its listing still holds "a".
    root.delete("a").unwrap();

    restore(&view_a).unwrap();

    assert_eq!(child(&root, "a").child_names().unwrap(), vec!["x", "y"]);
    assert_eq!(
        child(&view_root, "a").child_names().unwrap(),
        vec!["x", "y"]
    );
}

#[test]
fn restore_then_release_returns_view_to_live() {
    init_logging();
    let (root, a) = scenario_tree();
    let view = prepare(&a);
    snapshot(&view, true).unwrap();
    restore(&view).unwrap();

    release(&view, true).unwrap();

    assert!(!is_snapshotted(&view));
    assert!(child(&root, "a").get_child("x").unwrap().is_some());
}

#[test]
fn restore_only_applies_to_the_snapshotted_node() {
    init_logging();
    let (_root, a) = scenario_tree();
    snapshot(&a, true).unwrap();
    let view = prepare(&a);

    let err = restore(&view).unwrap_err();

    assert!(matches!(err, ResourceError::InvalidState { .. }));
}
