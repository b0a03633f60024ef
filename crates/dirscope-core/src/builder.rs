/// Tree construction from flat enumeration records.
///
/// A [`Record`] is one `(path, size, is_dir)` tuple as produced by a record
/// source (see [`crate::source`]). Records arrive in no particular order;
/// the builder walks each path's segments, creating intermediate directory
/// nodes on demand, then runs a single bottom-up aggregation pass and sorts
/// every sibling list into the fixed deterministic display order.
///
/// The build is all-or-nothing: the first bad record fails the call and no
/// partial tree is returned.
use crate::model::{Category, DirTree, Node, NodeIndex, NodeKind};
use compact_str::CompactString;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

/// A single flat filesystem entry, the unit of input to tree construction.
///
/// `path` is `/`-separated and relative to the scan root, with no leading
/// separator (the record producer normalizes this). The root itself is
/// never a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
}

impl Record {
    /// Convenience constructor for a file record.
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            is_dir: false,
        }
    }

    /// Convenience constructor for a directory record.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: 0,
            is_dir: true,
        }
    }
}

/// Why a build call failed. Build-time errors are fatal to the call;
/// the caller fixes the input rather than retrying.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A record's path cannot be placed under the root.
    #[error("malformed record #{index} (path {path:?}): {reason}")]
    MalformedRecord {
        /// Position of the offending record in the input sequence.
        index: usize,
        path: String,
        reason: &'static str,
    },

    /// A second terminal record arrived for an already-recorded path.
    #[error("duplicate entry for path {path:?}")]
    DuplicateEntry { path: String },
}

/// Hook that assigns an opaque [`Category`] token to each created node.
///
/// The builder stores the token without interpreting it; see
/// `analysis::categories` for the stock extension-based implementation.
pub type Categorizer = Box<dyn Fn(&str, NodeKind) -> Category + Send + Sync>;

/// Builds a [`DirTree`] from a record sequence.
pub struct TreeBuilder {
    root_name: CompactString,
    categorizer: Option<Categorizer>,
}

impl TreeBuilder {
    /// Create a builder whose tree root carries `root_name` as its label.
    pub fn new(root_name: impl AsRef<str>) -> Self {
        Self {
            root_name: CompactString::new(root_name.as_ref()),
            categorizer: None,
        }
    }

    /// Attach a categorizer hook invoked once per created node.
    ///
    /// Without a hook every node carries [`Category::UNCLASSIFIED`].
    pub fn with_categorizer(
        mut self,
        categorizer: impl Fn(&str, NodeKind) -> Category + Send + Sync + 'static,
    ) -> Self {
        self.categorizer = Some(Box::new(categorizer));
        self
    }

    fn categorize(&self, name: &str, kind: NodeKind) -> Category {
        match &self.categorizer {
            Some(hook) => hook(name, kind),
            None => Category::UNCLASSIFIED,
        }
    }

    /// Consume records and build the aggregated, sorted tree.
    ///
    /// An empty record sequence yields a root with no children and zero
    /// aggregate size — not an error.
    pub fn build(self, records: impl IntoIterator<Item = Record>) -> Result<DirTree, BuildError> {
        let mut tree = DirTree::with_capacity(self.root_name.clone(), 1024);

        // Relative path -> arena index, so re-encountering a prefix is an
        // O(1) lookup instead of a sibling-list walk.
        let mut path_map: HashMap<String, NodeIndex> = HashMap::with_capacity(1024);

        // Nodes that were claimed by a terminal record (as opposed to being
        // created implicitly as some deeper record's ancestor).
        let mut explicit: HashSet<NodeIndex> = HashSet::new();

        let mut record_count = 0usize;
        for (index, record) in records.into_iter().enumerate() {
            record_count += 1;
            let path = record.path.as_str();

            if path.is_empty() {
                return Err(BuildError::MalformedRecord {
                    index,
                    path: record.path,
                    reason: "empty path",
                });
            }
            if path.starts_with('/') {
                return Err(BuildError::MalformedRecord {
                    index,
                    path: record.path,
                    reason: "absolute path is outside the root",
                });
            }

            let segments: Vec<&str> = path.split('/').collect();
            if let Some(reason) = segments.iter().find_map(|s| match *s {
                "" => Some("empty path segment"),
                "." | ".." => Some("path escapes the root"),
                _ => None,
            }) {
                return Err(BuildError::MalformedRecord {
                    index,
                    path: record.path,
                    reason,
                });
            }

            // Walk intermediate segments, creating directories on demand.
            let mut parent = tree.root;
            let mut prefix = String::with_capacity(path.len());
            for &segment in &segments[..segments.len() - 1] {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(segment);

                parent = match path_map.get(prefix.as_str()) {
                    Some(&existing) => {
                        if !tree.node(existing).is_dir() {
                            return Err(BuildError::MalformedRecord {
                                index,
                                path: record.path,
                                reason: "path descends through a file",
                            });
                        }
                        existing
                    }
                    None => {
                        let category = self.categorize(segment, NodeKind::Directory);
                        let node =
                            Node::directory(CompactString::new(segment), Some(parent), category);
                        let idx = tree.add_node(node);
                        tree.attach_child(parent, idx);
                        path_map.insert(prefix.clone(), idx);
                        idx
                    }
                };
            }

            // Terminal segment.
            let name = segments[segments.len() - 1];
            match path_map.get(path) {
                Some(&existing) => {
                    if explicit.contains(&existing) {
                        return Err(BuildError::DuplicateEntry { path: record.path });
                    }
                    // Only directories are ever created implicitly, so a
                    // file terminal here contradicts an earlier record's
                    // ancestor chain.
                    if !record.is_dir {
                        return Err(BuildError::MalformedRecord {
                            index,
                            path: record.path,
                            reason: "file record conflicts with an existing directory",
                        });
                    }
                    tree.nodes[existing.idx()].own_size = record.size;
                    explicit.insert(existing);
                }
                None => {
                    let kind = if record.is_dir {
                        NodeKind::Directory
                    } else {
                        NodeKind::File
                    };
                    let category = self.categorize(name, kind);
                    let mut node = match kind {
                        NodeKind::File => Node::file(
                            CompactString::new(name),
                            record.size,
                            Some(parent),
                            category,
                        ),
                        NodeKind::Directory => {
                            Node::directory(CompactString::new(name), Some(parent), category)
                        }
                    };
                    node.own_size = record.size;
                    let idx = tree.add_node(node);
                    tree.attach_child(parent, idx);
                    path_map.insert(record.path, idx);
                    explicit.insert(idx);
                }
            }
        }

        tree.aggregate();
        tree.sort_children();

        debug!(
            records = record_count,
            nodes = tree.len(),
            total = tree.node(tree.root).aggregate_size,
            "tree built"
        );
        Ok(tree)
    }
}

/// Build a tree with the default (no-op) categorizer.
pub fn build_tree(
    root_name: impl AsRef<str>,
    records: impl IntoIterator<Item = Record>,
) -> Result<DirTree, BuildError> {
    TreeBuilder::new(root_name).build(records)
}
