/// Export collaborators — serialize build/layout results for consumers
/// outside this process.
///
/// The JSON shape is a nested document (name, sizes, category token,
/// optional rectangle, children) suitable for web/desktop renderers; the
/// CSV export is the flat largest-files report. Category tokens are
/// exported as raw integers — consumers apply their own color tables, so
/// the token stays opaque end to end.
use crate::analysis::LargestFile;
use crate::layout::{Rect, TreemapLayout};
use crate::model::{DirTree, NodeIndex, NodeKind};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct JsonNode {
    name: String,
    kind: &'static str,
    size: u64,
    own_size: u64,
    category: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    rect: Option<Rect>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<JsonNode>,
}

fn json_node(tree: &DirTree, index: NodeIndex, layout: Option<&TreemapLayout>) -> JsonNode {
    let node = tree.node(index);
    JsonNode {
        name: node.name.to_string(),
        kind: match node.kind {
            NodeKind::File => "file",
            NodeKind::Directory => "directory",
        },
        size: node.aggregate_size,
        own_size: node.own_size,
        category: node.category.raw(),
        rect: layout.and_then(|l| l.get(index)),
        children: tree
            .children(index)
            .into_iter()
            .map(|child| json_node(tree, child, layout))
            .collect(),
    }
}

/// Write the tree (rooted at its root) as a nested JSON document.
///
/// When a layout is given, each covered node carries its rectangle.
pub fn write_json<W: Write>(
    writer: W,
    tree: &DirTree,
    layout: Option<&TreemapLayout>,
) -> Result<(), serde_json::Error> {
    let document = json_node(tree, tree.root, layout);
    serde_json::to_writer_pretty(writer, &document)
}

/// Write the largest-files report as CSV (`path,size`).
pub fn write_largest_csv<W: Write>(writer: W, entries: &[LargestFile]) -> csv::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["path", "size"])?;
    for entry in entries {
        out.write_record([entry.path.as_str(), &entry.size.to_string()])?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::largest_files;
    use crate::builder::{build_tree, Record};
    use crate::layout::layout;

    #[test]
    fn json_document_shape() {
        let tree = build_tree(
            "root",
            vec![Record::file("a/x.txt", 100), Record::file("b.txt", 50)],
        )
        .unwrap();
        let map = layout(&tree, tree.root, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();

        let mut buf = Vec::new();
        write_json(&mut buf, &tree, Some(&map)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["name"], "root");
        assert_eq!(value["size"], 150);
        assert_eq!(value["kind"], "directory");
        let children = value["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        // Deterministic order: a (100) before b.txt (50).
        assert_eq!(children[0]["name"], "a");
        assert!(children[0]["rect"]["width"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn json_without_layout_has_no_rects() {
        let tree = build_tree("root", vec![Record::file("a.txt", 1)]).unwrap();
        let mut buf = Vec::new();
        write_json(&mut buf, &tree, None).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert!(value["children"][0].get("rect").is_none());
    }

    #[test]
    fn csv_report() {
        let tree = build_tree(
            "root",
            vec![Record::file("big.bin", 900), Record::file("small.bin", 10)],
        )
        .unwrap();
        let top = largest_files(&tree, 10);

        let mut buf = Vec::new();
        write_largest_csv(&mut buf, &top).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("path,size"));
        assert_eq!(lines.next(), Some("root/big.bin,900"));
        assert_eq!(lines.next(), Some("root/small.bin,10"));
    }
}
