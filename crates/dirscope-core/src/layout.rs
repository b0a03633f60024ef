/// Squarified treemap layout (Bruls, Huizing, van Wijk).
///
/// Consumes a (possibly filtered) [`DirTree`] and a bounds rectangle and
/// assigns every node in the subtree a rectangle whose area is proportional
/// to its share of its parent's total. Rows of siblings are peeled onto the
/// shorter side of the remaining rectangle, growing greedily while the
/// row's worst aspect ratio keeps improving — the defining property of the
/// squarified layout versus naive slice-and-dice.
///
/// The layout is a pure function of `(tree, root, bounds)`: no hidden
/// state, no randomness. Sibling rectangles tile their parent exactly;
/// floating-point residue is absorbed into the last rectangle of each strip
/// and the last strip of each rectangle. Disjoint subtrees are laid out in
/// parallel with rayon near the top of the tree; results are concatenated
/// in child order, so parallelism never changes the output.
use crate::model::{DirTree, NodeIndex};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Fan out with rayon only this close to the root; below that the subtrees
/// are small enough that task overhead dominates.
const PARALLEL_DEPTH: u16 = 2;

/// An axis-aligned region of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// A zero-area rectangle. Zero-size nodes receive one of these; it is
    /// part of the mapping but never drawn.
    #[inline]
    pub fn degenerate_at(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// One node's rectangle, with its nesting depth relative to the layout root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRect {
    pub node: NodeIndex,
    pub rect: Rect,
    /// 0 for the layout root, parent depth + 1 below. Renderers paint in
    /// ascending depth so nested rectangles land on top.
    pub depth: u16,
}

/// Why a layout call failed. Layout-time errors are fatal to the call.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The bounds rectangle cannot be subdivided.
    #[error("invalid bounds: {width}x{height} at ({x}, {y})")]
    InvalidBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    /// A directory's children claim more bytes than the directory itself —
    /// the tree was corrupted after the build.
    #[error("inconsistent sizes under {path:?}: children total {children} exceeds parent {parent}")]
    InvalidSize {
        path: String,
        parent: u64,
        children: u64,
    },
}

/// The rectangle assignment produced by one layout pass.
///
/// Covers exactly the nodes present in the subtree passed to [`layout`];
/// produced fresh on every pass and never retained across passes.
#[derive(Debug)]
pub struct TreemapLayout {
    rects: Vec<LayoutRect>,
    by_node: HashMap<NodeIndex, usize>,
}

impl TreemapLayout {
    /// The rectangle assigned to `node`, if it is part of this layout.
    pub fn get(&self, node: NodeIndex) -> Option<Rect> {
        self.by_node.get(&node).map(|&i| self.rects[i].rect)
    }

    /// All rectangles, in deterministic traversal order (parents before
    /// their children, siblings in display order).
    pub fn rects(&self) -> &[LayoutRect] {
        &self.rects
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutRect> {
        self.rects.iter()
    }
}

/// Compute the rectangle assignment for the subtree rooted at `root`.
///
/// `bounds` must have positive, finite extent and a non-negative origin.
/// Every node in the subtree receives a rectangle; nodes with zero
/// aggregate size receive degenerate rectangles.
pub fn layout(
    tree: &DirTree,
    root: NodeIndex,
    bounds: Rect,
) -> Result<TreemapLayout, LayoutError> {
    let valid = bounds.width > 0.0
        && bounds.height > 0.0
        && bounds.x >= 0.0
        && bounds.y >= 0.0
        && bounds.x.is_finite()
        && bounds.y.is_finite()
        && bounds.width.is_finite()
        && bounds.height.is_finite();
    if !valid {
        return Err(LayoutError::InvalidBounds {
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
        });
    }

    check_sizes(tree, root)?;

    let rects = layout_subtree(tree, root, bounds, 0);
    let by_node = rects
        .iter()
        .enumerate()
        .map(|(i, lr)| (lr.node, i))
        .collect();
    Ok(TreemapLayout { rects, by_node })
}

/// Defensive size check over the whole subtree before any subdivision.
///
/// Sizes are unsigned, so the only representable corruption is a directory
/// whose children sum past its own aggregate (or past `u64::MAX`). The
/// builder never produces such a tree; a caller mutating node sizes can.
fn check_sizes(tree: &DirTree, root: NodeIndex) -> Result<(), LayoutError> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let children = tree.children(node);
        if children.is_empty() {
            continue;
        }
        let mut sum: u64 = 0;
        for &child in &children {
            sum = sum.checked_add(tree.node(child).aggregate_size).ok_or_else(|| {
                LayoutError::InvalidSize {
                    path: tree.full_path(node),
                    parent: tree.node(node).aggregate_size,
                    children: u64::MAX,
                }
            })?;
        }
        let parent = tree.node(node).aggregate_size;
        if sum > parent {
            return Err(LayoutError::InvalidSize {
                path: tree.full_path(node),
                parent,
                children: sum,
            });
        }
        stack.extend(children);
    }
    Ok(())
}

fn layout_subtree(tree: &DirTree, node: NodeIndex, rect: Rect, depth: u16) -> Vec<LayoutRect> {
    let mut out = vec![LayoutRect { node, rect, depth }];

    let children = tree.children(node);
    if children.is_empty() {
        return out;
    }
    if tree.node(node).aggregate_size == 0 {
        // Terminal for subdivision purposes, but the mapping must still
        // cover retained zero-size descendants.
        for child in children {
            emit_degenerate(tree, child, rect.x, rect.y, depth + 1, &mut out);
        }
        return out;
    }

    let assignments = squarify_level(tree, &children, rect);

    if depth < PARALLEL_DEPTH {
        let sub: Vec<Vec<LayoutRect>> = assignments
            .par_iter()
            .map(|&(child, child_rect)| layout_subtree(tree, child, child_rect, depth + 1))
            .collect();
        for mut rects in sub {
            out.append(&mut rects);
        }
    } else {
        for (child, child_rect) in assignments {
            out.extend(layout_subtree(tree, child, child_rect, depth + 1));
        }
    }
    out
}

/// Assign degenerate rectangles to an entire zero-size subtree.
fn emit_degenerate(
    tree: &DirTree,
    node: NodeIndex,
    x: f64,
    y: f64,
    depth: u16,
    out: &mut Vec<LayoutRect>,
) {
    out.push(LayoutRect {
        node,
        rect: Rect::degenerate_at(x, y),
        depth,
    });
    for child in tree.children(node) {
        emit_degenerate(tree, child, x, y, depth + 1, out);
    }
}

/// Subdivide `rect` among `children` (fixed display order), one rectangle
/// each, in the same order. Zero-size children receive degenerate
/// rectangles at the exhausted corner of the strip loop.
fn squarify_level(
    tree: &DirTree,
    children: &[NodeIndex],
    rect: Rect,
) -> Vec<(NodeIndex, Rect)> {
    let visible: Vec<NodeIndex> = children
        .iter()
        .copied()
        .filter(|&c| tree.node(c).aggregate_size > 0)
        .collect();

    let visible_sum: u64 = visible.iter().map(|&c| tree.node(c).aggregate_size).sum();
    if visible.is_empty() || visible_sum == 0 {
        return children
            .iter()
            .map(|&c| (c, Rect::degenerate_at(rect.x, rect.y)))
            .collect();
    }

    // Normalize sizes to areas summing exactly to the rectangle's area, so
    // a filtered level still tiles its parent completely.
    let scale = rect.area() / visible_sum as f64;
    let areas: Vec<f64> = visible
        .iter()
        .map(|&c| tree.node(c).aggregate_size as f64 * scale)
        .collect();

    let (strip_rects, remaining) = squarify(&areas, rect);

    // Re-interleave zero-size children in the original order.
    let mut assigned = Vec::with_capacity(children.len());
    let mut next_visible = 0;
    for &child in children {
        if tree.node(child).aggregate_size > 0 {
            assigned.push((child, strip_rects[next_visible]));
            next_visible += 1;
        } else {
            assigned.push((child, Rect::degenerate_at(remaining.x, remaining.y)));
        }
    }
    assigned
}

/// The squarified row loop. `areas` are positive and sum to `bounds.area()`
/// (up to fp rounding); the result has one rectangle per area, in order.
/// Returns the rectangles and the exhausted remaining region.
fn squarify(areas: &[f64], bounds: Rect) -> (Vec<Rect>, Rect) {
    let mut out = Vec::with_capacity(areas.len());
    let mut remaining = bounds;
    let mut idx = 0;

    while idx < areas.len() {
        if remaining.width <= 0.0 || remaining.height <= 0.0 {
            // The remainder has collapsed to nothing (rounding on extreme
            // size skews); the leftover areas are below representable size.
            for _ in idx..areas.len() {
                out.push(Rect::degenerate_at(remaining.x, remaining.y));
            }
            break;
        }

        let side = remaining.width.min(remaining.height);

        // Grow the candidate row while the worst aspect ratio improves.
        let start = idx;
        let mut row_sum = areas[idx];
        let mut row_min = areas[idx];
        let mut row_max = areas[idx];
        let mut worst = worst_ratio(row_min, row_max, row_sum, side);
        idx += 1;
        while idx < areas.len() {
            let area = areas[idx];
            let next = worst_ratio(row_min.min(area), row_max.max(area), row_sum + area, side);
            if next <= worst {
                row_sum += area;
                row_min = row_min.min(area);
                row_max = row_max.max(area);
                worst = next;
                idx += 1;
            } else {
                break;
            }
        }

        let is_last_row = idx == areas.len();
        lay_row(
            &areas[start..idx],
            row_sum,
            is_last_row,
            &mut remaining,
            &mut out,
        );
    }

    (out, remaining)
}

/// Worst (highest) aspect ratio a row would have, in closed form over the
/// row's min/max/total areas and the fixed strip side.
fn worst_ratio(row_min: f64, row_max: f64, row_sum: f64, side: f64) -> f64 {
    if row_sum <= 0.0 || side <= 0.0 || row_min <= 0.0 {
        return f64::MAX;
    }
    let side_sq = side * side;
    let sum_sq = row_sum * row_sum;
    ((side_sq * row_max) / sum_sq).max(sum_sq / (side_sq * row_min))
}

/// Emit one closed row as a strip along the shorter side of `remaining`,
/// subdividing it proportionally, then shrink `remaining` by the strip's
/// thickness.
fn lay_row(row: &[f64], row_sum: f64, is_last_row: bool, remaining: &mut Rect, out: &mut Vec<Rect>) {
    // The strip runs along the shorter side.
    let horizontal = remaining.width <= remaining.height;
    let short = if horizontal {
        remaining.width
    } else {
        remaining.height
    };
    let long = if horizontal {
        remaining.height
    } else {
        remaining.width
    };

    // The final row absorbs the full remaining thickness so the level
    // tiles exactly despite rounding.
    let thickness = if is_last_row {
        long
    } else {
        (row_sum / short).min(long)
    };

    let mut offset = 0.0;
    for (i, &area) in row.iter().enumerate() {
        let length = if i == row.len() - 1 {
            // Last member absorbs the strip's fp residue.
            (short - offset).max(0.0)
        } else {
            area / thickness.max(f64::MIN_POSITIVE)
        };
        let rect = if horizontal {
            Rect::new(remaining.x + offset, remaining.y, length, thickness)
        } else {
            Rect::new(remaining.x, remaining.y + offset, thickness, length)
        };
        out.push(rect);
        offset += length;
    }

    if horizontal {
        remaining.y += thickness;
        remaining.height = (remaining.height - thickness).max(0.0);
    } else {
        remaining.x += thickness;
        remaining.width = (remaining.width - thickness).max(0.0);
    }
}
