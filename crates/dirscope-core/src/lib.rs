/// dirscope core — record ingestion, tree building, and treemap layout.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (CLI today,
/// GUI or TUI later).
///
/// # Modules
///
/// - [`model`] — Arena-allocated directory tree and supporting types.
/// - [`builder`] — Record-to-tree construction with bottom-up aggregation.
/// - [`layout`] — Squarified treemap layout over a (filtered) tree.
/// - [`analysis`] — Post-build queries (categories, largest files).
/// - [`source`] — Background filesystem walker producing records.
/// - [`export`] — JSON/CSV serialization of results.
pub mod analysis;
pub mod builder;
pub mod export;
pub mod layout;
pub mod model;
pub mod source;
