use eframe::egui::Color32;

use super::{NodeId, Role, TaxonomyTree};

/// 24-bit RGB color with exact channel arithmetic, independent of any
/// rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const PROTAGONIST_BLUE: Rgb = Rgb::new(0x1f, 0x77, 0xb4);
pub const ANTAGONIST_RED: Rgb = Rgb::new(0xd6, 0x27, 0x28);
pub const INNOCENT_GREEN: Rgb = Rgb::new(0x2c, 0xa0, 0x2c);
pub const NEUTRAL_GRAY: Rgb = Rgb::new(0x99, 0x99, 0x99);
pub const ROOT_FILL: Rgb = Rgb::new(0xff, 0xff, 0xff);
pub const HIGHLIGHT_FALLBACK: Rgb = Rgb::new(0xff, 0xff, 0xcc);

/// Lightening applied to the fill of every node below depth 1.
pub const CHILD_LIGHTEN_PERCENT: f32 = 50.0;

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(input: &str) -> Option<Self> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() != 6 {
            return None;
        }
        Some(Self {
            r: u8::from_str_radix(&hex[0..2], 16).ok()?,
            g: u8::from_str_radix(&hex[2..4], 16).ok()?,
            b: u8::from_str_radix(&hex[4..6], 16).ok()?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Add `round(2.55 * percent)` to every channel, clamped to [0, 255].
    /// `percent = 0` is the identity transform.
    pub fn lighten(self, percent: f32) -> Self {
        let amt = (2.55 * percent).round() as i32;
        let clamp = |channel: u8| (channel as i32 + amt).clamp(0, 255) as u8;
        Self {
            r: clamp(self.r),
            g: clamp(self.g),
            b: clamp(self.b),
        }
    }

    pub fn color32(self) -> Color32 {
        Color32::from_rgb(self.r, self.g, self.b)
    }
}

/// Base color for a role; `None` (absent or unrecognized) maps to neutral.
pub fn role_color(role: Option<Role>) -> Rgb {
    match role {
        Some(Role::Protagonist) => PROTAGONIST_BLUE,
        Some(Role::Antagonist) => ANTAGONIST_RED,
        Some(Role::Innocent) => INNOCENT_GREEN,
        None => NEUTRAL_GRAY,
    }
}

/// Resolved display colors for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeStyle {
    pub fill: Rgb,
    pub stroke: Rgb,
    /// Effective role after ancestor resolution; drives tooltip highlighting.
    pub effective_role: Option<Role>,
}

impl NodeStyle {
    /// Background for the highlighted example span: the effective role's base
    /// color, or a pale yellow when no role resolves.
    pub fn highlight_background(&self) -> Rgb {
        match self.effective_role {
            Some(role) => role_color(Some(role)),
            None => HIGHLIGHT_FALLBACK,
        }
    }
}

/// Memoized per-node styles for the whole arena.
///
/// Roles and colors depend only on the document, which is immutable for the
/// process lifetime, so a single traversal at mount time replaces the
/// original's per-render ancestor walks.
#[derive(Debug, Clone)]
pub struct StylePass {
    styles: Vec<NodeStyle>,
}

impl StylePass {
    pub fn compute(tree: &TaxonomyTree) -> Self {
        let mut styles = vec![
            NodeStyle {
                fill: ROOT_FILL,
                stroke: NEUTRAL_GRAY,
                effective_role: None,
            };
            tree.len()
        ];
        if !tree.is_empty() {
            Self::visit(tree, tree.root(), None, None, &mut styles);
        }
        Self { styles }
    }

    fn visit(
        tree: &TaxonomyTree,
        id: NodeId,
        inherited_role: Option<Role>,
        depth1_base: Option<Rgb>,
        styles: &mut [NodeStyle],
    ) {
        let node = tree.node(id);
        let effective_role = node.data.role.or(inherited_role);

        let (style, branch_base) = match node.depth {
            0 => (
                NodeStyle {
                    fill: ROOT_FILL,
                    stroke: NEUTRAL_GRAY,
                    effective_role,
                },
                None,
            ),
            1 => {
                // Depth 1 colors come from the node's own role, not the
                // resolved one.
                let base = role_color(node.data.role);
                (
                    NodeStyle {
                        fill: base,
                        stroke: base,
                        effective_role,
                    },
                    Some(base),
                )
            }
            _ => {
                let base = depth1_base.unwrap_or(NEUTRAL_GRAY);
                (
                    NodeStyle {
                        fill: base.lighten(CHILD_LIGHTEN_PERCENT),
                        stroke: base,
                        effective_role,
                    },
                    Some(base),
                )
            }
        };
        styles[id] = style;

        // Hidden children are styled too: exiting nodes keep their colors
        // while they animate out.
        for &child in node.children.iter().chain(&node.hidden_children) {
            Self::visit(tree, child, effective_role, branch_base, styles);
        }
    }

    pub fn style(&self, id: NodeId) -> &NodeStyle {
        &self.styles[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TaxonomyRecord;

    #[test]
    fn lighten_zero_is_identity() {
        for hex in ["#1f77b4", "#d62728", "#2ca02c", "#000000", "#ffffff"] {
            let color = Rgb::from_hex(hex).unwrap();
            assert_eq!(color.lighten(0.0), color);
        }
    }

    #[test]
    fn lighten_matches_channel_arithmetic() {
        // amt = round(2.55 * 50) = 128:
        // R = 0x1f + 128 = 0x9f, G = 0x77 + 128 = 0xf7, B = 0xb4 + 128 clamps.
        let lightened = PROTAGONIST_BLUE.lighten(50.0);
        assert_eq!(lightened.to_hex(), "#9ff7ff");
    }

    #[test]
    fn lighten_clamps_channels() {
        let white = Rgb::from_hex("#ffffff").unwrap();
        assert_eq!(white.lighten(100.0), white);

        let black = Rgb::from_hex("#000000").unwrap();
        assert_eq!(black.lighten(-100.0), black);
    }

    #[test]
    fn hex_round_trip() {
        for hex in ["#1f77b4", "#9ff7ff", "#999999"] {
            assert_eq!(Rgb::from_hex(hex).unwrap().to_hex(), hex);
        }
        assert!(Rgb::from_hex("#12345").is_none());
        assert!(Rgb::from_hex("nonsense").is_none());
    }

    fn scenario_tree() -> TaxonomyTree {
        let json = r#"{
            "name": "Root",
            "children": [
                {"name": "Protagonist", "role": "protagonist",
                 "children": [{"name": "Hero"}]},
                {"name": "Unassigned",
                 "children": [{"name": "Orphan"}]}
            ]
        }"#;
        let record: TaxonomyRecord = serde_json::from_str(json).unwrap();
        TaxonomyTree::build(record)
    }

    #[test]
    fn styles_follow_depth_rules() {
        let tree = scenario_tree();
        let styles = StylePass::compute(&tree);

        let by_name = |name: &str| {
            tree.nodes()
                .iter()
                .find(|n| n.data.name == name)
                .unwrap()
                .id
        };

        let root = styles.style(tree.root());
        assert_eq!(root.fill, ROOT_FILL);
        assert_eq!(root.stroke, NEUTRAL_GRAY);

        let protagonist = styles.style(by_name("Protagonist"));
        assert_eq!(protagonist.fill, PROTAGONIST_BLUE);
        assert_eq!(protagonist.stroke, PROTAGONIST_BLUE);

        // Hidden at mount, styled regardless.
        let hero = styles.style(by_name("Hero"));
        assert_eq!(hero.fill, PROTAGONIST_BLUE.lighten(50.0));
        assert_eq!(hero.fill.to_hex(), "#9ff7ff");
        assert_eq!(hero.stroke, PROTAGONIST_BLUE);
        assert_eq!(hero.effective_role, Some(Role::Protagonist));

        let unassigned = styles.style(by_name("Unassigned"));
        assert_eq!(unassigned.fill, NEUTRAL_GRAY);

        let orphan = styles.style(by_name("Orphan"));
        assert_eq!(orphan.fill, NEUTRAL_GRAY.lighten(50.0));
        assert_eq!(orphan.stroke, NEUTRAL_GRAY);
        assert_eq!(orphan.highlight_background(), HIGHLIGHT_FALLBACK);
    }
}
