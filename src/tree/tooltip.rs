use eframe::egui::{Pos2, Rect, Vec2};
use log::warn;

use super::color::{Rgb, StylePass};
use super::{NodeId, TaxonomyTree};

/// Offset from the pointer for cursor-relative placement.
pub const CURSOR_OFFSET: Vec2 = Vec2::new(15.0, -28.0);

/// Gap kept between a widget-anchored tooltip and the canvas's right edge.
pub const ANCHOR_INNER_MARGIN: f32 = 16.0;

/// How a tooltip is positioned; selected by the node's depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipMode {
    /// Follows the pointer with a fixed offset; no measurement required.
    CursorRelative,
    /// Measured first, then aligned inside the widget's canvas rect.
    WidgetAnchored,
}

/// A run of example text, either plain or highlighted with the role color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
}

impl Segment {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlighted: false,
        }
    }

    fn highlighted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlighted: true,
        }
    }
}

/// Split `text` at a `[start, end)` pair of character offsets, marking the
/// middle run. Anything but a two-element span returns the text unchanged;
/// offsets are clamped so malformed spans never fault.
pub fn highlight_span(text: &str, span: Option<&[usize]>) -> Vec<Segment> {
    let Some(span) = span else {
        return vec![Segment::plain(text)];
    };
    if span.len() != 2 {
        return vec![Segment::plain(text)];
    }

    let char_count = text.chars().count();
    let start = span[0].min(char_count);
    let end = span[1].clamp(start, char_count);

    let byte_at = |char_index: usize| {
        text.char_indices()
            .nth(char_index)
            .map(|(byte, _)| byte)
            .unwrap_or(text.len())
    };
    let start_byte = byte_at(start);
    let end_byte = byte_at(end);

    let mut segments = Vec::with_capacity(3);
    if start_byte > 0 {
        segments.push(Segment::plain(&text[..start_byte]));
    }
    segments.push(Segment::highlighted(&text[start_byte..end_byte]));
    if end_byte < text.len() {
        segments.push(Segment::plain(&text[end_byte..]));
    }
    segments
}

/// Tooltip content for one node, assembled before any rendering so the
/// renderer can measure it and place it afterwards.
#[derive(Debug, Clone)]
pub struct TooltipContent {
    pub node: NodeId,
    pub mode: TooltipMode,
    pub title: String,
    pub definition: Option<String>,
    pub conceptual: Option<String>,
    pub example: Option<Vec<Segment>>,
    /// Background for highlighted example runs.
    pub highlight: Rgb,
}

impl TooltipContent {
    /// Depth 1 gets the short form (name and raw definition, shown on
    /// hover); deeper nodes get the full block layout shown on click.
    pub fn for_node(tree: &TaxonomyTree, styles: &StylePass, id: NodeId) -> Self {
        let node = tree.node(id);
        let data = &node.data;

        if node.depth <= 1 {
            return Self {
                node: id,
                mode: TooltipMode::CursorRelative,
                title: data.name.clone(),
                definition: if node.depth == 1 {
                    data.definition.clone()
                } else {
                    None
                },
                conceptual: None,
                example: None,
                highlight: styles.style(id).highlight_background(),
            };
        }

        Self {
            node: id,
            mode: TooltipMode::WidgetAnchored,
            title: data.name.clone(),
            definition: data.definition.clone(),
            conceptual: data.conceptual.clone(),
            example: data
                .example
                .as_ref()
                .map(|text| highlight_span(text, data.highlight_span.as_deref())),
            highlight: styles.style(id).highlight_background(),
        }
    }
}

/// A concrete placement strategy after fallbacks have been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Cursor { pointer: Pos2 },
    Anchored { widget: Rect },
}

/// Pick the placement for a tooltip. Widget-anchored placement needs the
/// canvas rect; without one it degrades to cursor-relative rather than
/// failing the interaction.
pub fn resolve_placement(mode: TooltipMode, widget: Option<Rect>, pointer: Pos2) -> Placement {
    match mode {
        TooltipMode::CursorRelative => Placement::Cursor { pointer },
        TooltipMode::WidgetAnchored => match widget {
            Some(rect) => Placement::Anchored { widget: rect },
            None => {
                warn!("no canvas rect for anchored tooltip; using cursor placement");
                Placement::Cursor { pointer }
            }
        },
    }
}

/// Final top-left corner for a tooltip of the measured `size`.
///
/// Cursor placement ignores the size entirely; anchored placement is the
/// second phase of measure-then-place and right-aligns the measured box
/// inside the widget, vertically centered.
pub fn place(size: Vec2, placement: Placement) -> Pos2 {
    match placement {
        Placement::Cursor { pointer } => pointer + CURSOR_OFFSET,
        Placement::Anchored { widget } => Pos2::new(
            widget.right() - ANCHOR_INNER_MARGIN - size.x,
            widget.center().y - size.y / 2.0,
        ),
    }
}
