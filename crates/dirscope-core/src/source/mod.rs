/// Record source — turns a filesystem root into flat enumeration records.
///
/// The walker runs on a background thread and reports progress over a
/// bounded channel while it collects [`Record`]s; the finished record list
/// comes back through [`ScanHandle::join`]. Per-entry failures (permission
/// denied, vanished files) are non-fatal: they are reported as
/// [`ScanProgress::Error`] events and counted, and the walk continues.
pub mod walker;

use crate::builder::Record;
use crossbeam_channel::Receiver;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Maximum number of progress messages that may queue up in the channel.
///
/// The consumer drains this between other work; a bounded channel means a
/// slow consumer stalls the walker briefly instead of growing the heap
/// without limit.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Progress updates sent from the walker thread.
#[derive(Debug)]
pub enum ScanProgress {
    /// Periodic update with running totals.
    Update {
        files_found: u64,
        dirs_found: u64,
        total_size: u64,
        current_path: String,
    },
    /// A non-fatal error (e.g. permission denied on one entry).
    Error { path: String, message: String },
    /// Walking completed; the record list is available via
    /// [`ScanHandle::join`].
    Complete {
        duration: Duration,
        error_count: u64,
    },
    /// The walk was cancelled; `join` returns the records collected so far.
    Cancelled,
}

/// Everything a finished (or cancelled) walk produced.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Flat records, paths `/`-separated and relative to the scan root.
    pub records: Vec<Record>,
    /// Number of entries that could not be read.
    pub error_count: u64,
    pub duration: Duration,
    pub cancelled: bool,
}

/// Handle to a running or completed scan.
pub struct ScanHandle {
    /// Receiver for progress updates from the walker thread.
    pub progress_rx: Receiver<ScanProgress>,
    cancel_flag: Arc<AtomicBool>,
    thread: thread::JoinHandle<ScanOutcome>,
}

impl ScanHandle {
    /// Request the walk to stop as soon as possible.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    /// Wait for the walker thread and take its outcome.
    pub fn join(self) -> ScanOutcome {
        self.thread.join().expect("walker thread panicked")
    }
}

/// Start walking `root_path` on a background thread.
pub fn start_scan(root_path: PathBuf) -> ScanHandle {
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();

    let thread = thread::Builder::new()
        .name("dirscope-walker".into())
        .spawn(move || {
            info!("starting scan of {}", root_path.display());
            walker::collect_records(&root_path, &progress_tx, &cancel_clone)
        })
        .expect("failed to spawn walker thread");

    ScanHandle {
        progress_rx,
        cancel_flag,
        thread,
    }
}
