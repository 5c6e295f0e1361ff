use eframe::egui::{self, epaint::CubicBezierShape, Align2, Color32, FontId, Pos2, Rect, Stroke};

use super::color::NodeStyle;

/// Fixed margins around the diagram, matching the original 960x600 canvas
/// split: wide side margins leave room for labels at the outer depths.
#[derive(Debug, Clone, Copy)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

pub const CANVAS_MARGINS: Margins = Margins {
    top: 20.0,
    right: 120.0,
    bottom: 20.0,
    left: 120.0,
};

/// Visual constants and drawing primitives for the taxonomy canvas.
#[derive(Debug, Clone)]
pub struct TreePainter {
    pub node_radius: f32,
    pub node_stroke_width: f32,
    pub edge_stroke: Stroke,
    pub label_color: Color32,
    pub label_font_size: f32,
    /// Horizontal gap between a node circle and its label.
    pub label_offset: f32,
    /// Extra pointer slop around a node circle for hit testing.
    pub hit_slop: f32,
}

impl Default for TreePainter {
    fn default() -> Self {
        Self {
            node_radius: 10.0,
            node_stroke_width: 2.0,
            edge_stroke: Stroke::new(2.0, Color32::from_rgb(0xcc, 0xcc, 0xcc)),
            label_color: Color32::from_gray(40),
            label_font_size: 14.0,
            label_offset: 13.0,
            hit_slop: 4.0,
        }
    }
}

impl TreePainter {
    /// The drawable area inside the fixed margins.
    pub fn inner_rect(&self, canvas: Rect) -> Rect {
        Rect::from_min_max(
            egui::pos2(
                canvas.left() + CANVAS_MARGINS.left,
                canvas.top() + CANVAS_MARGINS.top,
            ),
            egui::pos2(
                canvas.right() - CANVAS_MARGINS.right,
                canvas.bottom() - CANVAS_MARGINS.bottom,
            ),
        )
    }

    /// Layout space to screen space. Layout coordinates are already in
    /// pixels (depth spacing horizontally, height-extent rows vertically),
    /// so the transform is a pure translation to the inner origin.
    pub fn to_screen(&self, inner: Rect) -> impl Fn((f32, f32)) -> Pos2 {
        let origin = inner.min;
        move |(x, y)| egui::pos2(origin.x + x, origin.y + y)
    }

    /// One edge as a cubic curve: control points at the horizontal midpoint,
    /// horizontal tangents at both endpoints.
    pub fn edge_shape(&self, source: Pos2, target: Pos2, opacity: f32) -> CubicBezierShape {
        let mid_x = (source.x + target.x) / 2.0;
        let mut stroke = self.edge_stroke;
        stroke.color = stroke.color.gamma_multiply(opacity);
        CubicBezierShape::from_points_stroke(
            [
                source,
                egui::pos2(mid_x, source.y),
                egui::pos2(mid_x, target.y),
                target,
            ],
            false,
            Color32::TRANSPARENT,
            stroke,
        )
    }

    pub fn draw_edge(&self, painter: &egui::Painter, source: Pos2, target: Pos2, opacity: f32) {
        painter.add(self.edge_shape(source, target, opacity));
    }

    /// Draw a node circle plus its label. `growth` scales the circle and
    /// fades the label while a node enters or exits.
    pub fn draw_node(
        &self,
        painter: &egui::Painter,
        pos: Pos2,
        style: &NodeStyle,
        name: &str,
        label_leftward: bool,
        growth: f32,
    ) {
        let radius = (self.node_radius * growth).max(0.0);
        painter.circle(
            pos,
            radius,
            style.fill.color32(),
            Stroke::new(self.node_stroke_width, style.stroke.color32()),
        );

        if growth <= f32::EPSILON {
            return;
        }
        let (anchor, label_pos) = if label_leftward {
            (
                Align2::RIGHT_CENTER,
                egui::pos2(pos.x - self.label_offset, pos.y),
            )
        } else {
            (
                Align2::LEFT_CENTER,
                egui::pos2(pos.x + self.label_offset, pos.y),
            )
        };
        painter.text(
            label_pos,
            anchor,
            name,
            FontId::proportional(self.label_font_size),
            self.label_color.gamma_multiply(growth),
        );
    }

    /// Closest drawn node under the pointer, if any is within the circle
    /// plus slop. `hits` are the screen positions recorded while drawing.
    pub fn node_at(
        &self,
        hits: &[(crate::tree::NodeId, Pos2)],
        pointer: Pos2,
    ) -> Option<crate::tree::NodeId> {
        let radius = self.node_radius + self.hit_slop;
        hits.iter()
            .filter_map(|&(id, pos)| {
                let distance = (pointer - pos).length();
                (distance <= radius).then_some((id, distance))
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_rect_subtracts_fixed_margins() {
        let painter = TreePainter::default();
        let canvas = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(960.0, 600.0));
        let inner = painter.inner_rect(canvas);

        assert_eq!(inner.left(), 120.0);
        assert_eq!(inner.top(), 20.0);
        assert_eq!(inner.width(), 720.0);
        assert_eq!(inner.height(), 560.0);
    }

    #[test]
    fn to_screen_translates_into_inner_origin() {
        let painter = TreePainter::default();
        let canvas = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(960.0, 600.0));
        let inner = painter.inner_rect(canvas);
        let to_screen = painter.to_screen(inner);

        assert_eq!(to_screen((0.0, 0.0)), egui::pos2(120.0, 20.0));
        assert_eq!(to_screen((180.0, 280.0)), egui::pos2(300.0, 300.0));
    }

    #[test]
    fn edge_control_points_sit_at_the_horizontal_midpoint() {
        let painter = TreePainter::default();
        let shape = painter.edge_shape(egui::pos2(0.0, 10.0), egui::pos2(100.0, 90.0), 1.0);

        assert_eq!(shape.points[1], egui::pos2(50.0, 10.0));
        assert_eq!(shape.points[2], egui::pos2(50.0, 90.0));
    }

    #[test]
    fn node_at_picks_the_closest_hit_within_range() {
        let painter = TreePainter::default();
        let hits = vec![
            (0, egui::pos2(100.0, 100.0)),
            (1, egui::pos2(108.0, 100.0)),
        ];
        assert_eq!(painter.node_at(&hits, egui::pos2(106.0, 100.0)), Some(1));
        assert_eq!(painter.node_at(&hits, egui::pos2(101.0, 100.0)), Some(0));
        assert_eq!(painter.node_at(&hits, egui::pos2(300.0, 300.0)), None);
    }
}
