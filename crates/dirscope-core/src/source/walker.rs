/// Parallel directory walker using `jwalk`.
///
/// Walks the tree with jwalk's rayon-backed traversal and converts every
/// entry into a [`Record`] with a `/`-separated path relative to the scan
/// root — exactly the convention `builder` documents. File sizes come from
/// `symlink_metadata` so symlinks are never followed; a link counts as a
/// zero-cost leaf rather than pulling in a foreign subtree.
use crate::builder::Record;
use crate::source::{ScanOutcome, ScanProgress};
use crossbeam_channel::Sender;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::debug;

/// How often (in entries) to check the cancellation flag.
const CANCEL_CHECK_INTERVAL: u64 = 1_000;

/// How often (in entries) to emit a progress update.
const PROGRESS_INTERVAL: u64 = 5_000;

/// Walk `root_path`, collecting records and streaming progress.
///
/// Sends a terminal `Complete` or `Cancelled` message before returning.
pub fn collect_records(
    root_path: &Path,
    progress_tx: &Sender<ScanProgress>,
    cancel_flag: &AtomicBool,
) -> ScanOutcome {
    let start = Instant::now();
    let mut records: Vec<Record> = Vec::with_capacity(16_384);
    let mut files_found: u64 = 0;
    let mut dirs_found: u64 = 0;
    let mut total_size: u64 = 0;
    let mut error_count: u64 = 0;
    let mut entry_counter: u64 = 0;

    let walk = jwalk::WalkDir::new(root_path)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()));

    for entry_result in walk {
        entry_counter += 1;
        if entry_counter.is_multiple_of(CANCEL_CHECK_INTERVAL)
            && cancel_flag.load(Ordering::Relaxed)
        {
            let _ = progress_tx.send(ScanProgress::Cancelled);
            return ScanOutcome {
                records,
                error_count,
                duration: start.elapsed(),
                cancelled: true,
            };
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                error_count += 1;
                let path = err
                    .path()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let _ = progress_tx.send(ScanProgress::Error {
                    path,
                    message: format!("{err}"),
                });
                continue;
            }
        };

        let path = entry.path();
        if path == root_path {
            // The root itself is never a record.
            continue;
        }
        let Some(relative) = relative_path(root_path, &path) else {
            continue;
        };

        if entry.file_type().is_dir() {
            records.push(Record::directory(relative));
            dirs_found += 1;
        } else {
            // Stat explicitly — jwalk's DirEntry does not carry the size.
            let size = match std::fs::symlink_metadata(&path) {
                Ok(meta) if meta.file_type().is_file() => meta.len(),
                Ok(_) => 0, // symlink or special file: counts as empty
                Err(err) => {
                    error_count += 1;
                    let _ = progress_tx.send(ScanProgress::Error {
                        path: path.to_string_lossy().into_owned(),
                        message: format!("{err}"),
                    });
                    continue;
                }
            };
            total_size += size;
            files_found += 1;
            records.push(Record::file(relative, size));
        }

        if entry_counter.is_multiple_of(PROGRESS_INTERVAL) {
            let _ = progress_tx.send(ScanProgress::Update {
                files_found,
                dirs_found,
                total_size,
                current_path: path.to_string_lossy().into_owned(),
            });
        }
    }

    let duration = start.elapsed();
    debug!(
        files = files_found,
        dirs = dirs_found,
        errors = error_count,
        ?duration,
        "walk complete"
    );

    let _ = progress_tx.send(ScanProgress::Complete {
        duration,
        error_count,
    });

    ScanOutcome {
        records,
        error_count,
        duration,
        cancelled: false,
    }
}

/// Root-relative, `/`-separated rendering of `path`.
///
/// Non-UTF-8 components are replaced lossily; a path not under the root
/// (should not happen during a walk) yields `None`.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let stripped = path.strip_prefix(root).ok()?;
    let mut out = String::new();
    for component in stripped.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_path_joins_with_forward_slashes() {
        let root = PathBuf::from("/scan/root");
        let path = root.join("a").join("b.txt");
        assert_eq!(relative_path(&root, &path), Some("a/b.txt".to_string()));
    }

    #[test]
    fn root_itself_has_no_relative_path() {
        let root = PathBuf::from("/scan/root");
        assert_eq!(relative_path(&root, &root), None);
    }

    #[test]
    fn foreign_path_is_rejected() {
        let root = PathBuf::from("/scan/root");
        assert_eq!(relative_path(&root, Path::new("/elsewhere/x")), None);
    }
}
