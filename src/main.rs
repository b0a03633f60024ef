//! dirscope — disk usage treemap reporter.
//!
//! Thin binary entry point. All logic lives in the `dirscope-core` crate;
//! this file owns argument parsing, logging init, and report formatting.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dirscope_core::analysis::{self, FileCategory};
use dirscope_core::builder::TreeBuilder;
use dirscope_core::export;
use dirscope_core::layout::{layout, Rect, TreemapLayout};
use dirscope_core::model::size::{format_count, format_size};
use dirscope_core::model::{DirTree, NodeIndex, ZeroSizePolicy};
use dirscope_core::source::{start_scan, ScanProgress};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dirscope",
    version,
    about = "Disk usage treemap reporter — scans a directory, aggregates sizes, and computes a squarified treemap"
)]
struct Args {
    /// Directory to scan.
    path: PathBuf,

    /// Minimum aggregate size (bytes) for an entry to stay in the display
    /// view; 0 disables filtering. Overrides --resolution.
    #[arg(long)]
    min_size: Option<u64>,

    /// Display resolution: entries smaller than total/RESOLUTION are not
    /// shown individually (their bytes still count toward parent totals).
    #[arg(long, default_value_t = 10_000)]
    resolution: u64,

    /// Keep zero-size entries in the display view.
    #[arg(long)]
    keep_zero: bool,

    /// Lay out a subdirectory (slash-separated, relative to the root)
    /// instead of the whole tree.
    #[arg(long)]
    focus: Option<String>,

    /// Maximum depth of the printed tree listing.
    #[arg(long, default_value_t = 2)]
    depth: usize,

    /// Number of largest files to list.
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Layout bounds width (abstract units; pixels for most renderers).
    #[arg(long, default_value_t = 1600.0)]
    width: f64,

    /// Layout bounds height.
    #[arg(long, default_value_t = 900.0)]
    height: f64,

    /// Write the display tree plus layout rectangles as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write the largest-files report as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let root_name = args
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.path.display().to_string());

    // ── Scan ───────────────────────────────────────────────────────
    let handle = start_scan(args.path.clone());
    loop {
        match handle.progress_rx.recv() {
            Ok(ScanProgress::Update {
                files_found,
                dirs_found,
                total_size,
                ..
            }) => {
                eprint!(
                    "\rscanning… {} files, {} dirs, {}   ",
                    format_count(files_found),
                    format_count(dirs_found),
                    format_size(total_size)
                );
            }
            Ok(ScanProgress::Error { path, message }) => {
                tracing::warn!("cannot read {path}: {message}");
            }
            Ok(ScanProgress::Complete { .. }) | Ok(ScanProgress::Cancelled) => break,
            Err(_) => break,
        }
    }
    eprint!("\r");
    let outcome = handle.join();
    tracing::info!(
        records = outcome.records.len(),
        errors = outcome.error_count,
        "scan finished in {:.2?}",
        outcome.duration
    );

    // ── Build, filter, layout ──────────────────────────────────────
    let tree = TreeBuilder::new(&root_name)
        .with_categorizer(analysis::categorizer())
        .build(outcome.records)
        .context("building directory tree")?;

    let total = tree.node(tree.root).aggregate_size;
    let min_size = args.min_size.unwrap_or(if args.resolution == 0 {
        0
    } else {
        total / args.resolution
    });
    let zero_policy = if args.keep_zero {
        ZeroSizePolicy::Keep
    } else {
        ZeroSizePolicy::Omit
    };
    let view = tree.filtered(min_size, zero_policy);

    let focus = match &args.focus {
        Some(path) => view
            .locate(path)
            .ok_or_else(|| anyhow!("--focus path {path:?} is not in the display view"))?,
        None => view.root,
    };

    let bounds = Rect::new(0.0, 0.0, args.width, args.height);
    let map = layout(&view, focus, bounds).context("computing treemap layout")?;

    // ── Report ─────────────────────────────────────────────────────
    print_report(&tree, &view, focus, &map, &args);

    if let Some(path) = &args.json {
        let file = File::create(path)
            .with_context(|| format!("creating JSON export {}", path.display()))?;
        export::write_json(BufWriter::new(file), &view, Some(&map))
            .context("writing JSON export")?;
        tracing::info!("wrote JSON export to {}", path.display());
    }
    if let Some(path) = &args.csv {
        let file = File::create(path)
            .with_context(|| format!("creating CSV export {}", path.display()))?;
        // The report uses the unfiltered tree: the largest files are facts
        // about the disk, not about the display view.
        export::write_largest_csv(BufWriter::new(file), &analysis::largest_files(&tree, args.top))
            .context("writing CSV export")?;
        tracing::info!("wrote CSV export to {}", path.display());
    }

    Ok(())
}

fn print_report(tree: &DirTree, view: &DirTree, focus: NodeIndex, map: &TreemapLayout, args: &Args) {
    let total = tree.node(tree.root).aggregate_size;
    println!(
        "{}  —  {} total, {} entries shown of {}",
        args.path.display(),
        format_size(total),
        format_count(map.len() as u64),
        format_count(tree.len() as u64),
    );
    println!();

    print_subtree(view, focus, args.depth, 0);

    let stats = analysis::category_stats(tree);
    if !stats.is_empty() {
        println!();
        println!("By category:");
        for stat in &stats {
            println!(
                "  {:<12} {:>10}  ({} files)",
                stat.category.label(),
                format_size(stat.total_size),
                format_count(stat.file_count)
            );
        }
    }

    let top = analysis::largest_files(tree, args.top);
    if !top.is_empty() {
        println!();
        println!("Largest files:");
        for entry in &top {
            let label = FileCategory::from_token(tree.node(entry.index).category)
                .map(FileCategory::label)
                .unwrap_or("-");
            println!("  {:>10}  {:<12} {}", format_size(entry.size), label, entry.path);
        }
    }
}

fn print_subtree(view: &DirTree, node: NodeIndex, depth_left: usize, indent: usize) {
    let n = view.node(node);
    println!(
        "{:indent$}{}{}  {:>10}  {:>5.1}%",
        "",
        n.name,
        if n.is_dir() { "/" } else { "" },
        format_size(n.aggregate_size),
        n.percent_of_parent,
        indent = indent * 2
    );
    if depth_left == 0 {
        return;
    }
    for child in view.children(node) {
        print_subtree(view, child, depth_left - 1, indent + 1);
    }
}
