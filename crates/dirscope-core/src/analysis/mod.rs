/// Analysis modules — post-build queries over the tree.

pub mod categories;
pub mod top_files;

pub use categories::{categorize_extension, categorizer, category_stats, CategoryStats, FileCategory};
pub use top_files::{largest_files, LargestFile};
