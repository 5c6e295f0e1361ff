use super::{NodeId, TaxonomyTree};

/// Horizontal distance between successive depths.
pub const LEVEL_SPACING: f32 = 180.0;

/// Minimum vertical distance between sibling subtree contours, in tidy rows.
const SIBLING_SEPARATION: f32 = 1.0;

/// Positions for the currently visible node set.
///
/// `positions` is indexed by `NodeId` over the whole arena; only the entries
/// listed in `visible` are meaningful for a given pass. The vertical axis is
/// the tidy row scaled to the height extent, the horizontal axis is
/// `depth * LEVEL_SPACING`.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    pub visible: Vec<NodeId>,
    pub positions: Vec<(f32, f32)>,
    pub edges: Vec<(NodeId, NodeId)>,
    pub height: f32,
    pub width: f32,
}

impl TreeLayout {
    /// Lay out the visible set of `tree` into a `(height, width)` extent.
    ///
    /// Repeated calls without a structural change reproduce the same
    /// positions: the walk order is the tree's child order and nothing else
    /// feeds the computation.
    pub fn compute(tree: &TaxonomyTree, extent: (f32, f32)) -> Self {
        let (height, width) = extent;
        let mut layout = Self {
            visible: Vec::new(),
            positions: vec![(0.0, 0.0); tree.len()],
            edges: Vec::new(),
            height,
            width,
        };

        if tree.is_empty() {
            return layout;
        }

        let root = tree.root();
        let mut rows = vec![0.0f32; tree.len()];
        let mut offsets = vec![0.0f32; tree.len()];
        first_walk(tree, root, &mut offsets);
        second_walk(tree, root, 0.0, &offsets, &mut rows);

        layout.visible = tree.visible_nodes().collect();

        let mut min_row = f32::INFINITY;
        let mut max_row = f32::NEG_INFINITY;
        for &id in &layout.visible {
            min_row = min_row.min(rows[id]);
            max_row = max_row.max(rows[id]);
        }
        let span = max_row - min_row;

        for &id in &layout.visible {
            let node = tree.node(id);
            let x = node.depth as f32 * LEVEL_SPACING;
            let y = if span > f32::EPSILON {
                (rows[id] - min_row) / span * height
            } else {
                height / 2.0
            };
            layout.positions[id] = (x, y);

            for &child in &node.children {
                layout.edges.push((id, child));
            }
        }

        layout
    }

    pub fn position(&self, id: NodeId) -> (f32, f32) {
        self.positions[id]
    }
}

/// Vertical extent of a subtree, one `(min, max)` row pair per depth level,
/// relative to the subtree root's row.
struct Contour {
    left: Vec<f32>,
    right: Vec<f32>,
}

/// Bottom-up walk: places every node's visible children relative to the node
/// (recorded in `offsets`) so sibling subtrees never overlap and the parent
/// sits midway between its first and last child.
fn first_walk(tree: &TaxonomyTree, id: NodeId, offsets: &mut [f32]) -> Contour {
    let children = &tree.node(id).children;
    if children.is_empty() {
        return Contour {
            left: vec![0.0],
            right: vec![0.0],
        };
    }

    let mut merged = Contour {
        left: Vec::new(),
        right: Vec::new(),
    };
    let mut child_rows = Vec::with_capacity(children.len());

    for (index, &child) in children.iter().enumerate() {
        let contour = first_walk(tree, child, offsets);

        let row = if index == 0 {
            0.0
        } else {
            // Push the child just far enough down that its left contour
            // clears the right contour merged so far.
            let overlap_depths = merged.right.len().min(contour.left.len());
            let mut shift = f32::NEG_INFINITY;
            for depth in 0..overlap_depths {
                shift = shift.max(merged.right[depth] + SIBLING_SEPARATION - contour.left[depth]);
            }
            shift
        };

        for depth in 0..contour.left.len() {
            let left = contour.left[depth] + row;
            let right = contour.right[depth] + row;
            if depth < merged.left.len() {
                // The left contour keeps the earliest (topmost) child;
                // the right contour always advances to the latest.
                merged.right[depth] = right;
            } else {
                merged.left.push(left);
                merged.right.push(right);
            }
        }

        child_rows.push(row);
    }

    let first = child_rows[0];
    let last = child_rows[child_rows.len() - 1];
    let mid = (first + last) / 2.0;

    for (&child, &row) in children.iter().zip(&child_rows) {
        offsets[child] = row - mid;
    }

    let mut left = vec![0.0];
    let mut right = vec![0.0];
    left.extend(merged.left.iter().map(|row| row - mid));
    right.extend(merged.right.iter().map(|row| row - mid));
    Contour { left, right }
}

/// Top-down walk: accumulate the relative offsets into absolute rows.
fn second_walk(tree: &TaxonomyTree, id: NodeId, row: f32, offsets: &[f32], rows: &mut [f32]) {
    rows[id] = row;
    for &child in &tree.node(id).children {
        second_walk(tree, child, row + offsets[child], offsets, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TaxonomyRecord;

    fn tree_from_json(json: &str) -> TaxonomyTree {
        let record: TaxonomyRecord = serde_json::from_str(json).unwrap();
        TaxonomyTree::build(record)
    }

    fn fully_expanded(json: &str) -> TaxonomyTree {
        let mut tree = tree_from_json(json);
        let collapsed: Vec<_> = tree
            .nodes()
            .iter()
            .filter(|n| n.is_collapsed())
            .map(|n| n.id)
            .collect();
        for id in collapsed {
            tree.toggle(id);
        }
        tree
    }

    const WIDE: &str = r#"{
        "name": "Root",
        "children": [
            {"name": "A", "children": [{"name": "A1"}, {"name": "A2"}]},
            {"name": "B", "children": [{"name": "B1"}]},
            {"name": "C"}
        ]
    }"#;

    fn by_name(tree: &TaxonomyTree, name: &str) -> NodeId {
        tree.nodes()
            .iter()
            .find(|n| n.data.name == name)
            .unwrap()
            .id
    }

    #[test]
    fn horizontal_position_is_depth_times_spacing() {
        let tree = fully_expanded(WIDE);
        let layout = TreeLayout::compute(&tree, (560.0, 720.0));

        for &id in &layout.visible {
            let (x, _) = layout.position(id);
            assert_eq!(x, tree.node(id).depth as f32 * LEVEL_SPACING);
        }
    }

    #[test]
    fn siblings_keep_document_order_top_to_bottom() {
        let tree = fully_expanded(WIDE);
        let layout = TreeLayout::compute(&tree, (560.0, 720.0));

        let a = layout.position(by_name(&tree, "A")).1;
        let b = layout.position(by_name(&tree, "B")).1;
        let c = layout.position(by_name(&tree, "C")).1;
        assert!(a < b && b < c);

        let a1 = layout.position(by_name(&tree, "A1")).1;
        let a2 = layout.position(by_name(&tree, "A2")).1;
        assert!(a1 < a2);
    }

    #[test]
    fn parent_is_centered_over_its_children() {
        let tree = fully_expanded(WIDE);
        let layout = TreeLayout::compute(&tree, (560.0, 720.0));

        let a = layout.position(by_name(&tree, "A")).1;
        let a1 = layout.position(by_name(&tree, "A1")).1;
        let a2 = layout.position(by_name(&tree, "A2")).1;
        assert!((a - (a1 + a2) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn rows_fill_the_height_extent() {
        let tree = fully_expanded(WIDE);
        let height = 560.0;
        let layout = TreeLayout::compute(&tree, (height, 720.0));

        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for &id in &layout.visible {
            let (_, y) = layout.position(id);
            assert!(y >= -1e-3 && y <= height + 1e-3);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        assert!(min_y.abs() < 1e-3);
        assert!((max_y - height).abs() < 1e-3);
    }

    #[test]
    fn single_visible_path_is_vertically_centered() {
        let tree = tree_from_json(r#"{"name": "Root", "children": [{"name": "Only"}]}"#);
        let height = 560.0;
        let layout = TreeLayout::compute(&tree, (height, 720.0));

        for &id in &layout.visible {
            assert!((layout.position(id).1 - height / 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn sibling_subtrees_do_not_overlap() {
        let tree = fully_expanded(
            r#"{
                "name": "Root",
                "children": [
                    {"name": "Deep", "children": [
                        {"name": "D1", "children": [{"name": "D1a"}, {"name": "D1b"}]},
                        {"name": "D2", "children": [{"name": "D2a"}, {"name": "D2b"}]}
                    ]},
                    {"name": "Shallow"}
                ]
            }"#,
        );
        let layout = TreeLayout::compute(&tree, (560.0, 720.0));

        // Every pair of visible nodes at the same depth keeps a gap.
        let visible = &layout.visible;
        for (i, &a) in visible.iter().enumerate() {
            for &b in &visible[i + 1..] {
                if tree.node(a).depth == tree.node(b).depth {
                    assert!(
                        (layout.position(a).1 - layout.position(b).1).abs() > 1e-3,
                        "nodes {a} and {b} collide"
                    );
                }
            }
        }
    }

    #[test]
    fn edges_cover_exactly_the_visible_parent_child_pairs() {
        let tree = tree_from_json(WIDE);
        let layout = TreeLayout::compute(&tree, (560.0, 720.0));

        // Collapsed at mount: only the root's three children are visible.
        assert_eq!(layout.visible.len(), 4);
        assert_eq!(layout.edges.len(), 3);
        for &(parent, child) in &layout.edges {
            assert_eq!(parent, tree.root());
            assert!(layout.visible.contains(&child));
        }
    }

    #[test]
    fn layout_is_idempotent() {
        let tree = fully_expanded(WIDE);
        let first = TreeLayout::compute(&tree, (560.0, 720.0));
        let second = TreeLayout::compute(&tree, (560.0, 720.0));

        assert_eq!(first.visible, second.visible);
        assert_eq!(first.edges, second.edges);
        for &id in &first.visible {
            assert_eq!(first.position(id), second.position(id));
        }
    }

    #[test]
    fn collapsed_subtrees_contribute_nothing() {
        let tree = tree_from_json(WIDE);
        let layout = TreeLayout::compute(&tree, (560.0, 720.0));

        let a1 = by_name(&tree, "A1");
        assert!(!layout.visible.contains(&a1));
        assert!(layout.edges.iter().all(|&(_, child)| child != a1));
    }
}
