/// Top-N largest files analysis.
use crate::model::{DirTree, NodeIndex};

/// A single entry in the "largest files" results.
#[derive(Debug, Clone)]
pub struct LargestFile {
    /// Index into the tree arena.
    pub index: NodeIndex,
    /// Full path (reconstructed).
    pub path: String,
    /// File size in bytes.
    pub size: u64,
}

/// The N largest individual files in the tree, descending by size.
///
/// Uses `select_nth_unstable_by` (O(n) average) to bring the top-N
/// candidates to the front, then sorts only that slice — much cheaper than
/// a full sort when the tree holds millions of files.
pub fn largest_files(tree: &DirTree, n: usize) -> Vec<LargestFile> {
    if n == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<NodeIndex> = (0..tree.len())
        .map(NodeIndex::new)
        .filter(|&i| !tree.node(i).is_dir())
        .collect();

    let by_size_desc = |a: &NodeIndex, b: &NodeIndex| {
        tree.node(*b)
            .own_size
            .cmp(&tree.node(*a).own_size)
            .then_with(|| tree.node(*a).name.cmp(&tree.node(*b).name))
    };

    if candidates.len() > n {
        candidates.select_nth_unstable_by(n - 1, by_size_desc);
        candidates.truncate(n);
    }
    candidates.sort_unstable_by(by_size_desc);

    candidates
        .into_iter()
        .map(|index| LargestFile {
            index,
            path: tree.full_path(index),
            size: tree.node(index).own_size,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_tree, Record};

    #[test]
    fn returns_top_n_descending() {
        let tree = build_tree(
            "root",
            vec![
                Record::file("small.txt", 10),
                Record::file("sub/huge.bin", 5_000),
                Record::file("mid.dat", 700),
                Record::file("sub/large.bin", 900),
            ],
        )
        .unwrap();

        let top = largest_files(&tree, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].path, "root/sub/huge.bin");
        assert_eq!(top[0].size, 5_000);
        assert_eq!(top[1].path, "root/sub/large.bin");
    }

    #[test]
    fn fewer_files_than_requested() {
        let tree = build_tree("root", vec![Record::file("only.txt", 1)]).unwrap();
        let top = largest_files(&tree, 10);
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn zero_n_is_empty() {
        let tree = build_tree("root", vec![Record::file("a.txt", 1)]).unwrap();
        assert!(largest_files(&tree, 0).is_empty());
    }

    #[test]
    fn directories_are_not_files() {
        let tree = build_tree("root", vec![Record::directory("sub")]).unwrap();
        assert!(largest_files(&tree, 5).is_empty());
    }
}
