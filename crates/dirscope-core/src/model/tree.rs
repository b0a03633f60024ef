/// Arena-backed directory tree with O(n) bottom-up size aggregation.
///
/// All nodes live in a single `Vec<Node>`. Relationships between nodes use
/// `NodeIndex` (a thin `u32` wrapper) rather than heap pointers, giving
/// cache-friendly traversal and a naturally non-owning parent link.
use super::node::{Category, Node, NodeIndex};
use compact_str::CompactString;

/// What to do with zero-size nodes when producing a filtered view.
///
/// A tree-view consumer usually wants empty files and directories listed
/// (`Keep`); a treemap consumer has nothing to draw for them (`Omit`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZeroSizePolicy {
    /// Retain zero-size nodes; the layout assigns them degenerate rectangles.
    #[default]
    Keep,
    /// Drop zero-size nodes from the filtered view entirely.
    Omit,
}

/// The complete directory tree produced by a build.
///
/// Once [`crate::builder::TreeBuilder::build`] returns, the tree is
/// read-only: layout, analysis, and export only ever take `&DirTree`.
#[derive(Debug, Clone)]
pub struct DirTree {
    /// Arena: every node in a flat vector. The node at `root` has no parent;
    /// every other node is reachable from it.
    pub nodes: Vec<Node>,

    /// Index of the root node (always present, even for an empty record set).
    pub root: NodeIndex,
}

impl DirTree {
    /// Create a tree containing only a root directory node.
    pub fn new(root_name: CompactString) -> Self {
        Self::with_capacity(root_name, 0)
    }

    /// Create a tree with pre-allocated arena capacity.
    ///
    /// `estimated_nodes` should be a rough upper bound; the arena grows if
    /// needed, but pre-allocation avoids repeated re-allocation during a
    /// large build.
    pub fn with_capacity(root_name: CompactString, estimated_nodes: usize) -> Self {
        let mut nodes = Vec::with_capacity(estimated_nodes.max(1));
        nodes.push(Node::directory(root_name, None, Category::UNCLASSIFIED));
        Self {
            nodes,
            root: NodeIndex(0),
        }
    }

    /// Allocate a new node in the arena and return its index.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let idx = NodeIndex::new(self.nodes.len());
        self.nodes.push(node);
        idx
    }

    /// Attach `child` as a child of `parent`, prepending to the sibling list.
    ///
    /// O(1) — new children are inserted at the head of the linked list. The
    /// deterministic display order is established later by
    /// [`sort_children`](DirTree::sort_children).
    pub fn attach_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        let old_first = self.nodes[parent.idx()].first_child;
        self.nodes[child.idx()].next_sibling = old_first;
        self.nodes[child.idx()].parent = Some(parent);
        self.nodes[parent.idx()].first_child = Some(child);
    }

    /// Get the node at the given index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.idx()]
    }

    /// Total number of nodes in the tree (always >= 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds nothing but the root node.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Direct children of a node, in sibling-link order.
    ///
    /// After [`sort_children`](DirTree::sort_children) this is the fixed
    /// deterministic order the layout consumes.
    pub fn children(&self, parent: NodeIndex) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        let mut child = self.nodes[parent.idx()].first_child;
        while let Some(idx) = child {
            children.push(idx);
            child = self.nodes[idx.idx()].next_sibling;
        }
        children
    }

    /// Compute aggregate sizes and percentages in a single bottom-up pass.
    ///
    /// Because the builder always allocates a parent before any of its
    /// children, iterating the arena in *reverse* guarantees that every
    /// child is processed before its parent. This gives O(n) aggregation
    /// with no recursion and no stack.
    ///
    /// A file's aggregate equals its own size; a directory with children
    /// sums the children's aggregates; a childless directory keeps its own
    /// size (usually 0).
    pub fn aggregate(&mut self) {
        // Reset directory aggregates so repeated calls don't accumulate.
        for node in self.nodes.iter_mut() {
            if node.is_dir() {
                node.aggregate_size = 0;
            }
        }

        // Reverse pass: children before parents.
        for i in (0..self.nodes.len()).rev() {
            let node = &self.nodes[i];
            let aggregate = if node.is_dir() {
                if node.first_child.is_none() {
                    node.own_size
                } else {
                    node.aggregate_size
                }
            } else {
                node.own_size
            };
            self.nodes[i].aggregate_size = aggregate;
            if let Some(parent) = self.nodes[i].parent {
                self.nodes[parent.idx()].aggregate_size += aggregate;
            }
        }

        // Percentage of parent for every node; the root uses itself as
        // denominator so it reads as 100%.
        for i in 0..self.nodes.len() {
            let denominator = self.nodes[i]
                .parent
                .map(|p| self.nodes[p.idx()].aggregate_size)
                .unwrap_or(self.nodes[i].aggregate_size);
            self.nodes[i].percent_of_parent = if denominator > 0 {
                (self.nodes[i].aggregate_size as f64 / denominator as f64 * 100.0) as f32
            } else {
                0.0
            };
        }
    }

    /// Rewrite every sibling list into the fixed deterministic order:
    /// descending aggregate size, ties broken by ascending name.
    ///
    /// Layout order affects visual stability, so this order must be
    /// reproducible across builds of the same record set.
    pub fn sort_children(&mut self) {
        for i in 0..self.nodes.len() {
            if self.nodes[i].first_child.is_none() {
                continue;
            }
            let parent = NodeIndex::new(i);
            let mut children = self.children(parent);
            children.sort_unstable_by(|a, b| {
                let a_node = &self.nodes[a.idx()];
                let b_node = &self.nodes[b.idx()];
                b_node
                    .aggregate_size
                    .cmp(&a_node.aggregate_size)
                    .then_with(|| a_node.name.cmp(&b_node.name))
            });

            // Relink the sibling list in the sorted order.
            self.nodes[i].first_child = children.first().copied();
            for pair in children.windows(2) {
                self.nodes[pair[0].idx()].next_sibling = Some(pair[1]);
            }
            if let Some(&last) = children.last() {
                self.nodes[last.idx()].next_sibling = None;
            }
        }
    }

    /// Reconstruct the full `/`-separated path for a node by walking up to
    /// the root. The root's own name is the first segment.
    pub fn full_path(&self, index: NodeIndex) -> String {
        let mut segments = Vec::new();
        let mut current = Some(index);
        while let Some(idx) = current {
            segments.push(self.nodes[idx.idx()].name.as_str());
            current = self.nodes[idx.idx()].parent;
        }
        segments.reverse();
        segments.join("/")
    }

    /// Find the node for a `/`-separated path relative to the root.
    ///
    /// An empty path resolves to the root itself.
    pub fn locate(&self, path: &str) -> Option<NodeIndex> {
        let mut current = self.root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .children(current)
                .into_iter()
                .find(|&c| self.nodes[c.idx()].name == segment)?;
        }
        Some(current)
    }

    /// Produce a pruned display copy of this tree.
    ///
    /// Any non-root node whose `aggregate_size` is below `min_size` is
    /// removed from its parent's children; `zero_size` additionally decides
    /// whether zero-size nodes survive a `min_size` of 0. Aggregate sizes
    /// and percentages are carried over from this (unfiltered) tree, never
    /// recomputed — a directory's displayed total still reflects true usage
    /// even when some of its small children are not individually shown.
    ///
    /// `filtered(0, ZeroSizePolicy::Keep)` returns a tree isomorphic to
    /// `self`.
    pub fn filtered(&self, min_size: u64, zero_size: ZeroSizePolicy) -> DirTree {
        let mut out = DirTree::with_capacity(self.nodes[self.root.idx()].name.clone(), 0);
        // The root copy keeps its pre-filter totals too.
        out.nodes[0] = Node {
            first_child: None,
            next_sibling: None,
            parent: None,
            ..self.nodes[self.root.idx()].clone()
        };
        self.copy_pruned(self.root, out.root, min_size, zero_size, &mut out);
        out
    }

    fn keep_in_view(&self, index: NodeIndex, min_size: u64, zero_size: ZeroSizePolicy) -> bool {
        let aggregate = self.nodes[index.idx()].aggregate_size;
        if aggregate == 0 && zero_size == ZeroSizePolicy::Omit {
            return false;
        }
        aggregate >= min_size
    }

    fn copy_pruned(
        &self,
        src: NodeIndex,
        dst: NodeIndex,
        min_size: u64,
        zero_size: ZeroSizePolicy,
        out: &mut DirTree,
    ) {
        let mut previous: Option<NodeIndex> = None;
        for child in self.children(src) {
            if !self.keep_in_view(child, min_size, zero_size) {
                continue;
            }
            let copy = Node {
                first_child: None,
                next_sibling: None,
                parent: Some(dst),
                ..self.nodes[child.idx()].clone()
            };
            let copy_idx = out.add_node(copy);
            // Append (not prepend) so the deterministic order survives.
            match previous {
                Some(prev) => out.nodes[prev.idx()].next_sibling = Some(copy_idx),
                None => out.nodes[dst.idx()].first_child = Some(copy_idx),
            }
            previous = Some(copy_idx);
            self.copy_pruned(child, copy_idx, min_size, zero_size, out);
        }
    }
}
