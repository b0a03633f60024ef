/// A single node in the arena-allocated directory tree.
///
/// Nodes are stored in a flat `Vec<Node>` for cache-friendly traversal.
/// Parent-child relationships use indices rather than pointers, which also
/// keeps the back-reference non-owning — ownership flows strictly from
/// parent to children through the sibling links.
use compact_str::CompactString;

/// Lightweight index into the arena `Vec<Node>`.
///
/// Uses `u32` to keep nodes small — supports up to ~4 billion nodes,
/// which is more than enough for any real filesystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// Create a new `NodeIndex` from a `usize`, panicking in debug builds
    /// if it exceeds `u32::MAX`.
    #[inline]
    pub fn new(index: usize) -> Self {
        debug_assert!(index <= u32::MAX as usize, "NodeIndex overflow");
        Self(index as u32)
    }

    /// Return the index as a `usize` for Vec indexing.
    #[inline]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Whether a node represents a file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
}

/// Opaque classification token.
///
/// The tree and the layout store and pass this through without interpreting
/// it; only a categorization collaborator (see `analysis::categories`) gives
/// tokens meaning. Token 0 is reserved for "unclassified".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Category(pub u16);

impl Category {
    /// The token carried by nodes no collaborator has classified.
    pub const UNCLASSIFIED: Category = Category(0);

    /// Raw token value, e.g. for export. Consumers map it back themselves.
    #[inline]
    pub fn raw(self) -> u16 {
        self.0
    }
}

/// A single file or directory in the tree.
///
/// Children are linked via `first_child` / `next_sibling` so that no
/// separate `Vec<NodeIndex>` allocation is needed per node. After the build
/// finishes, the sibling order is the fixed deterministic display order
/// (descending aggregate size, name tiebreak).
#[derive(Debug, Clone)]
pub struct Node {
    /// File or directory name only (NOT the full path).
    /// Full paths are reconstructed on demand by walking up via `parent`.
    pub name: CompactString,

    /// File or directory.
    pub kind: NodeKind,

    /// Bytes owned directly. For directories this is almost always 0;
    /// it only ever comes from an explicit directory record.
    pub own_size: u64,

    /// Bytes including all descendants, computed in a single bottom-up pass
    /// after all records are inserted. For a file this equals `own_size`;
    /// for a directory with children it is the sum of the children's
    /// aggregates; a childless directory falls back to `own_size`.
    pub aggregate_size: u64,

    /// Opaque classification token, assigned at build time by the caller's
    /// categorizer hook and never interpreted here.
    pub category: Category,

    /// Index of the parent node. `None` only for the root.
    pub parent: Option<NodeIndex>,

    /// First child (directories only). Children form a singly-linked list
    /// via [`next_sibling`](Node::next_sibling).
    pub first_child: Option<NodeIndex>,

    /// Next sibling under the same parent.
    pub next_sibling: Option<NodeIndex>,

    /// Pre-computed percentage of the parent's aggregate (0.0–100.0),
    /// filled in by the aggregation pass so reporting doesn't repeat the
    /// division.
    pub percent_of_parent: f32,
}

impl Node {
    /// Create a new file node with the given name and size.
    pub fn file(
        name: CompactString,
        size: u64,
        parent: Option<NodeIndex>,
        category: Category,
    ) -> Self {
        Self {
            name,
            kind: NodeKind::File,
            own_size: size,
            aggregate_size: size,
            category,
            parent,
            first_child: None,
            next_sibling: None,
            percent_of_parent: 0.0,
        }
    }

    /// Create a new directory node.
    pub fn directory(name: CompactString, parent: Option<NodeIndex>, category: Category) -> Self {
        Self {
            name,
            kind: NodeKind::Directory,
            own_size: 0,
            aggregate_size: 0,
            category,
            parent,
            first_child: None,
            next_sibling: None,
            percent_of_parent: 0.0,
        }
    }

    /// `true` if this node represents a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}
