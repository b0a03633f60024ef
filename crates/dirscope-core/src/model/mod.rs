/// Data model — arena-allocated directory tree and supporting types.
pub mod node;
pub mod size;
pub mod tree;

pub use node::{Category, Node, NodeIndex, NodeKind};
pub use tree::{DirTree, ZeroSizePolicy};
