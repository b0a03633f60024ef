/// End-to-end pipeline integration tests.
///
/// These exercise the real walker → builder → layout chain against a real
/// temporary filesystem: thread spawning, path normalization, record
/// collection, aggregation, and rectangle assignment, with zero mocking.
use dirscope_core::builder::TreeBuilder;
use dirscope_core::layout::{layout, Rect};
use dirscope_core::model::ZeroSizePolicy;
use dirscope_core::source::{start_scan, ScanHandle, ScanOutcome, ScanProgress};
use dirscope_core::source::PROGRESS_CHANNEL_CAPACITY;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Create a reproducible directory tree for pipeline tests:
///
/// ```text
/// root/
///   alpha/
///     a.txt   (100 bytes)
///     b.rs    (200 bytes)
///   beta/
///     c.png   (300 bytes)
///   d.zip     (400 bytes)
/// ```
///
/// Total file bytes: 1 000.
fn build_test_tree(root: &Path) {
    let alpha = root.join("alpha");
    let beta = root.join("beta");
    fs::create_dir_all(&alpha).unwrap();
    fs::create_dir_all(&beta).unwrap();

    write_bytes(&alpha.join("a.txt"), 100);
    write_bytes(&alpha.join("b.rs"), 200);
    write_bytes(&beta.join("c.png"), 300);
    write_bytes(&root.join("d.zip"), 400);
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// Drain progress until the walker reports a terminal message, then join.
///
/// Waits up to 30 seconds — more than enough for any tmpdir walk on any CI
/// machine but short enough that a genuinely stuck test does not block the
/// suite indefinitely.
fn drain_and_join(handle: ScanHandle) -> ScanOutcome {
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        assert!(
            Instant::now() < deadline,
            "walker did not complete within 30 seconds"
        );
        match handle.progress_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(ScanProgress::Complete { .. }) | Ok(ScanProgress::Cancelled) => break,
            Ok(_) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    handle.join()
}

/// `PROGRESS_CHANNEL_CAPACITY` must be positive so `send()` can never block
/// immediately. Compile-time invariant.
const _: () = assert!(PROGRESS_CHANNEL_CAPACITY > 0);

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn scan_and_build_discovers_all_files() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let outcome = drain_and_join(start_scan(tmp.path().to_path_buf()));
    assert!(!outcome.cancelled);
    assert_eq!(outcome.error_count, 0);
    // 2 directories + 4 files.
    assert_eq!(outcome.records.len(), 6);

    let tree = TreeBuilder::new("root").build(outcome.records).unwrap();
    assert_eq!(tree.node(tree.root).aggregate_size, 1_000);

    let alpha = tree.locate("alpha").expect("alpha directory");
    assert!(tree.node(alpha).is_dir());
    assert_eq!(tree.node(alpha).aggregate_size, 300);
    assert_eq!(
        tree.node(tree.locate("beta/c.png").unwrap()).aggregate_size,
        300
    );
    assert_eq!(tree.node(tree.locate("d.zip").unwrap()).own_size, 400);
}

#[test]
fn scan_empty_directory_yields_bare_root() {
    let tmp = TempDir::new().expect("failed to create temp dir");

    let outcome = drain_and_join(start_scan(tmp.path().to_path_buf()));
    assert!(outcome.records.is_empty());

    let tree = TreeBuilder::new("root").build(outcome.records).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.node(tree.root).aggregate_size, 0);
}

#[test]
fn full_pipeline_produces_a_tiling_layout() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let outcome = drain_and_join(start_scan(tmp.path().to_path_buf()));
    let tree = TreeBuilder::new("root").build(outcome.records).unwrap();
    let view = tree.filtered(0, ZeroSizePolicy::Omit);

    let bounds = Rect::new(0.0, 0.0, 800.0, 600.0);
    let map = layout(&view, view.root, bounds).unwrap();

    // Every node in the view is covered.
    assert_eq!(map.len(), view.len());

    // Top-level areas are proportional to 400 / 300 / 300 of 1000.
    let total = bounds.area();
    let d = map.get(view.locate("d.zip").unwrap()).unwrap();
    let alpha = map.get(view.locate("alpha").unwrap()).unwrap();
    let beta = map.get(view.locate("beta").unwrap()).unwrap();
    assert!((d.area() - total * 0.4).abs() < 1e-6 * total);
    assert!((alpha.area() - total * 0.3).abs() < 1e-6 * total);
    assert!((beta.area() - total * 0.3).abs() < 1e-6 * total);

    // The three children tile the whole bounds.
    assert!((d.area() + alpha.area() + beta.area() - total).abs() < 1e-6 * total);
}

#[test]
fn cancellation_reports_a_terminal_message() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let handle = start_scan(tmp.path().to_path_buf());
    // The walk may already be done by the time the flag is read, so either
    // terminal message is acceptable.
    handle.cancel();
    assert!(handle.is_cancelled());

    let deadline = Instant::now() + Duration::from_secs(30);
    let mut terminal = false;
    while Instant::now() < deadline {
        match handle.progress_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(ScanProgress::Complete { .. }) | Ok(ScanProgress::Cancelled) => {
                terminal = true;
                break;
            }
            Ok(_) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    assert!(terminal, "walker must send Complete or Cancelled within 30 s");
    let _ = handle.join();
}

#[test]
fn rescans_are_deterministic() {
    let tmp = TempDir::new().expect("failed to create temp dir");
    build_test_tree(tmp.path());

    let first = drain_and_join(start_scan(tmp.path().to_path_buf()));
    let second = drain_and_join(start_scan(tmp.path().to_path_buf()));

    let tree_a = TreeBuilder::new("root").build(first.records).unwrap();
    let tree_b = TreeBuilder::new("root").build(second.records).unwrap();

    // The walk order may differ between runs; the built trees must not.
    let bounds = Rect::new(0.0, 0.0, 640.0, 480.0);
    let map_a = layout(&tree_a, tree_a.root, bounds).unwrap();
    let map_b = layout(&tree_b, tree_b.root, bounds).unwrap();

    assert_eq!(tree_a.len(), tree_b.len());
    for (ra, rb) in map_a.iter().zip(map_b.iter()) {
        assert_eq!(tree_a.node(ra.node).name, tree_b.node(rb.node).name);
        assert_eq!(ra.rect, rb.rect);
        assert_eq!(ra.depth, rb.depth);
    }
}
