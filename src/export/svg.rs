use std::path::Path;

use anyhow::{Context, Result};
use svg::node::element::{Circle, Group, Path as SvgPath, Rectangle, Text};
use svg::Document;

use crate::tree::color::StylePass;
use crate::tree::layout::TreeLayout;
use crate::tree::painter::{TreePainter, CANVAS_MARGINS};
use crate::tree::TaxonomyTree;

/// Export the current visible diagram to SVG at the requested pixel size.
///
/// The snapshot reflects the tree's collapse state at call time: the layout
/// is recomputed for the export extent, so the picture matches what the
/// interactive canvas shows, independent of the window size.
pub fn export_diagram(
    tree: &TaxonomyTree,
    styles: &StylePass,
    painter: &TreePainter,
    path: &Path,
    width: f32,
    height: f32,
) -> Result<()> {
    let inner_width = (width - CANVAS_MARGINS.left - CANVAS_MARGINS.right).max(1.0);
    let inner_height = (height - CANVAS_MARGINS.top - CANVAS_MARGINS.bottom).max(1.0);
    let layout = TreeLayout::compute(tree, (inner_height, inner_width));

    let to_svg = |pos: (f32, f32)| (pos.0 + CANVAS_MARGINS.left, pos.1 + CANVAS_MARGINS.top);

    let mut document = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0, 0, width as i32, height as i32));

    let background = Rectangle::new()
        .set("width", "100%")
        .set("height", "100%")
        .set("fill", "white");
    document = document.add(background);

    let mut diagram = Group::new()
        .set("id", "taxonomy")
        .set("font-family", "sans-serif")
        .set("font-size", painter.label_font_size);

    // Edges first so circles draw over them.
    for &(parent, child) in &layout.edges {
        let (sx, sy) = to_svg(layout.position(parent));
        let (tx, ty) = to_svg(layout.position(child));
        let mid_x = (sx + tx) / 2.0;
        let data = format!("M {sx} {sy} C {mid_x} {sy}, {mid_x} {ty}, {tx} {ty}");

        let edge = SvgPath::new()
            .set("d", data)
            .set("fill", "none")
            .set("stroke", "#cccccc")
            .set("stroke-width", painter.edge_stroke.width);
        diagram = diagram.add(edge);
    }

    for &id in &layout.visible {
        let node = tree.node(id);
        let style = styles.style(id);
        let (x, y) = to_svg(layout.position(id));

        let circle = Circle::new()
            .set("cx", x)
            .set("cy", y)
            .set("r", painter.node_radius)
            .set("fill", style.fill.to_hex())
            .set("stroke", style.stroke.to_hex())
            .set("stroke-width", painter.node_stroke_width);
        diagram = diagram.add(circle);

        let leftward = !node.is_leaf();
        let (label_x, anchor) = if leftward {
            (x - painter.label_offset, "end")
        } else {
            (x + painter.label_offset, "start")
        };
        let label = Text::new("")
            .set("x", label_x)
            .set("y", y)
            .set("dy", "0.35em")
            .set("text-anchor", anchor)
            .add(svg::node::Text::new(node.data.name.clone()));
        diagram = diagram.add(label);
    }

    document = document.add(diagram);
    svg::save(path, &document)
        .with_context(|| format!("failed to save SVG to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TaxonomyRecord;

    #[test]
    fn export_emits_one_circle_per_visible_node_and_one_path_per_edge() {
        let json = r#"{
            "name": "Root",
            "children": [
                {"name": "Protagonist", "role": "protagonist",
                 "children": [{"name": "Hero"}]},
                {"name": "Antagonist", "role": "antagonist"}
            ]
        }"#;
        let record: TaxonomyRecord = serde_json::from_str(json).unwrap();
        let tree = TaxonomyTree::build(record);
        let styles = StylePass::compute(&tree);
        let painter = TreePainter::default();

        let path = std::env::temp_dir().join("roletree_export_test.svg");
        export_diagram(&tree, &styles, &painter, &path, 960.0, 600.0).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        // Visible at mount: Root + two depth-1 roles; Hero stays stashed.
        assert_eq!(contents.matches("<circle").count(), 3);
        assert_eq!(contents.matches("<path").count(), 2);
        assert!(contents.contains("#1f77b4"));
        assert!(contents.contains("#d62728"));
        assert!(!contents.contains("Hero"));
    }
}
