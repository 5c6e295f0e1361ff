use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::{
    self, text::LayoutJob, Color32, FontId, Galley, Pos2, Rect, Sense, Stroke, StrokeKind,
    TextFormat, Vec2,
};
use log::{error, info};
use rfd::FileDialog;

use crate::app::AppConfig;
use crate::export;
use crate::io;
use crate::tree::color::StylePass;
use crate::tree::layout::TreeLayout;
use crate::tree::painter::TreePainter;
use crate::tree::reconcile::{self, ease_cubic_in_out, Phase, Reconciliation, ANIMATION_MS};
use crate::tree::tooltip::{self, TooltipContent, TooltipMode};
use crate::tree::{NodeId, TaxonomyTree};

/// Which interactions produce detail tooltips. One widget covers both of the
/// original's wiring variants; flip the flags to reproduce either.
#[derive(Debug, Clone, Copy)]
pub struct InteractionOptions {
    /// Pointer-enter on a depth-1 node shows a cursor-relative summary.
    pub hover_details_at_depth1: bool,
    /// Click on a node below depth 1 shows the anchored detail panel.
    pub click_details_below_depth1: bool,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            hover_details_at_depth1: true,
            click_details_below_depth1: true,
        }
    }
}

struct ActiveAnimation {
    plan: Reconciliation,
    started: f64,
}

struct ActiveTooltip {
    content: TooltipContent,
    /// Pointer position at request time, for cursor-relative placement.
    pointer: Pos2,
}

pub struct RoleTreeGui {
    config: AppConfig,
    document_path: Option<PathBuf>,
    tree: Option<TaxonomyTree>,
    styles: Option<StylePass>,
    layout: Option<TreeLayout>,
    tree_painter: TreePainter,
    options: InteractionOptions,
    animation: Option<ActiveAnimation>,
    tooltip: Option<ActiveTooltip>,
    hovered: Option<NodeId>,
    /// Screen positions of the circles drawn this frame, for hit testing.
    node_hits: Vec<(NodeId, Pos2)>,
    canvas_rect: Option<Rect>,
    status: String,
    last_error: Option<String>,
}

impl RoleTreeGui {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut gui = Self {
            config,
            document_path: None,
            tree: None,
            styles: None,
            layout: None,
            tree_painter: TreePainter::default(),
            options: InteractionOptions::default(),
            animation: None,
            tooltip: None,
            hovered: None,
            node_hits: Vec::new(),
            canvas_rect: None,
            status: String::from("Open a taxonomy document to begin."),
            last_error: None,
        };

        if let Some(path) = gui.config.document.clone() {
            if let Err(err) = gui.load_from_path(path.clone()) {
                error!("Failed to load {}: {err:#}", path.display());
                gui.last_error = Some(format!("{err:#}"));
            }
        }

        gui
    }

    fn load_from_path(&mut self, path: PathBuf) -> anyhow::Result<()> {
        let record = io::load_document(&path)?;
        let tree = TaxonomyTree::build(record);
        self.styles = Some(StylePass::compute(&tree));
        self.status = format!(
            "Loaded {} ({} concepts).",
            path.display(),
            tree.len()
        );
        info!("Loaded taxonomy document {}", path.display());
        self.tree = Some(tree);
        self.document_path = Some(path);
        self.layout = None;
        self.animation = None;
        self.tooltip = None;
        self.hovered = None;
        self.last_error = None;
        Ok(())
    }

    fn open_file_dialog(&mut self) {
        let picked = FileDialog::new()
            .add_filter("Taxonomy documents", &["json"])
            .pick_file();
        if let Some(path) = picked {
            if let Err(err) = self.load_from_path(path) {
                self.last_error = Some(format!("{err:#}"));
            }
        }
    }

    fn export_svg_dialog(&mut self) {
        let (Some(tree), Some(styles)) = (self.tree.as_ref(), self.styles.as_ref()) else {
            self.last_error = Some("Nothing to export yet.".to_string());
            return;
        };

        let picked = FileDialog::new()
            .add_filter("SVG image", &["svg"])
            .set_file_name("taxonomy.svg")
            .save_file();
        if let Some(path) = picked {
            match export::svg::export_diagram(
                tree,
                styles,
                &self.tree_painter,
                &path,
                self.config.width as f32,
                self.config.height as f32,
            ) {
                Ok(()) => self.status = format!("Exported diagram to {}", path.display()),
                Err(err) => self.last_error = Some(format!("{err:#}")),
            }
        }
    }

    /// Recompute the layout for the current visible set and start the
    /// transition animation anchored at `trigger`.
    fn relayout(&mut self, trigger: NodeId, inner: Rect, now: f64) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        let next = TreeLayout::compute(tree, (inner.height(), inner.width()));
        let plan = reconcile::reconcile(tree, self.layout.as_ref(), &next, trigger);
        self.layout = Some(next);
        self.animation = (!plan.is_empty()).then_some(ActiveAnimation { plan, started: now });
    }

    fn handle_node_click(&mut self, id: NodeId, pointer: Pos2, inner: Rect, now: f64) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        tree.toggle(id);
        self.relayout(id, inner, now);

        let (Some(tree), Some(styles)) = (self.tree.as_ref(), self.styles.as_ref()) else {
            return;
        };
        if self.options.click_details_below_depth1 && tree.node(id).depth > 1 {
            self.tooltip = Some(ActiveTooltip {
                content: TooltipContent::for_node(tree, styles, id),
                pointer,
            });
        }
    }

    fn handle_hover(&mut self, hit: Option<NodeId>, pointer: Pos2) {
        if hit == self.hovered {
            return;
        }

        // Pointer-leave on a hover-opened tooltip dismisses it.
        if let (Some(previous), Some(tip)) = (self.hovered, self.tooltip.as_ref()) {
            if tip.content.mode == TooltipMode::CursorRelative && tip.content.node == previous {
                self.tooltip = None;
            }
        }
        self.hovered = hit;

        let (Some(tree), Some(styles)) = (self.tree.as_ref(), self.styles.as_ref()) else {
            return;
        };
        if let Some(id) = hit {
            if self.options.hover_details_at_depth1 && tree.node(id).depth == 1 {
                self.tooltip = Some(ActiveTooltip {
                    content: TooltipContent::for_node(tree, styles, id),
                    pointer,
                });
            }
        }
    }

    fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), Sense::click());
        let canvas = response.rect;
        self.canvas_rect = Some(canvas);
        let inner = self.tree_painter.inner_rect(canvas);

        if self.tree.is_none() {
            painter.text(
                canvas.center(),
                egui::Align2::CENTER_CENTER,
                "No taxonomy loaded. Use File > Open...",
                FontId::proportional(15.0),
                ui.visuals().weak_text_color(),
            );
            return;
        }

        let now = ui.ctx().input(|i| i.time);

        if self.layout.is_none() {
            // First frame with a known canvas size: seed the mount animation
            // from the root's resting point at the vertical center.
            if let Some(tree) = self.tree.as_mut() {
                let root = tree.root();
                tree.node_mut(root).prev_pos = (0.0, inner.height() / 2.0);
            }
            let root = self.tree.as_ref().map(|t| t.root()).unwrap_or_default();
            self.relayout(root, inner, now);
        }

        self.node_hits.clear();
        let to_screen = self.tree_painter.to_screen(inner);

        // Resolve this frame's geometry up front: either the in-flight
        // transition plan interpolated at the eased clock, or the resting
        // layout.
        let mut frame_edges: Vec<(Pos2, Pos2)> = Vec::new();
        let mut frame_nodes: Vec<(NodeId, Pos2, f32, bool)> = Vec::new();

        match self.animation.take() {
            Some(animation) => {
                let elapsed_ms = ((now - animation.started) * 1000.0) as f32;
                let t = (elapsed_ms / ANIMATION_MS).clamp(0.0, 1.0);
                let eased = ease_cubic_in_out(t);

                for edge in &animation.plan.edges {
                    let (source, target) = edge.endpoints_at(eased);
                    frame_edges.push((to_screen(source), to_screen(target)));
                }
                for transition in &animation.plan.nodes {
                    frame_nodes.push((
                        transition.id,
                        to_screen(transition.position_at(eased)),
                        transition.growth_at(eased),
                        transition.phase != Phase::Exit,
                    ));
                }

                if t < 1.0 {
                    ui.ctx().request_repaint();
                    self.animation = Some(animation);
                }
            }
            None => {
                if let Some(layout) = self.layout.as_ref() {
                    for &(parent, child) in &layout.edges {
                        frame_edges.push((
                            to_screen(layout.position(parent)),
                            to_screen(layout.position(child)),
                        ));
                    }
                    for &id in &layout.visible {
                        frame_nodes.push((id, to_screen(layout.position(id)), 1.0, true));
                    }
                }
            }
        }

        // Edges go under the circles, as in the original markup order.
        for &(source, target) in &frame_edges {
            self.tree_painter.draw_edge(&painter, source, target, 1.0);
        }
        for &(id, pos, growth, hittable) in &frame_nodes {
            self.draw_one_node(&painter, id, pos, growth);
            if hittable {
                self.node_hits.push((id, pos));
            }
        }

        // Interactions: hover first, then clicks. A click on a node both
        // toggles it and keeps the tooltip alive; a click anywhere else is
        // the outside-click dismiss.
        if let Some(pointer) = response.hover_pos() {
            let hit = self.tree_painter.node_at(&self.node_hits, pointer);
            self.handle_hover(hit, pointer);
        } else {
            self.handle_hover(None, Pos2::ZERO);
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                match self.tree_painter.node_at(&self.node_hits, pointer) {
                    Some(id) => self.handle_node_click(id, pointer, inner, now),
                    None => self.tooltip = None,
                }
            }
        }

        self.draw_tooltip(ui);
    }

    fn draw_one_node(&self, painter: &egui::Painter, id: NodeId, pos: Pos2, growth: f32) {
        let (Some(tree), Some(styles)) = (self.tree.as_ref(), self.styles.as_ref()) else {
            return;
        };
        let node = tree.node(id);
        // Labels sit left of nodes that have children (shown or stashed),
        // right of true leaves.
        let label_leftward = !node.is_leaf();
        self.tree_painter.draw_node(
            painter,
            pos,
            styles.style(id),
            &node.data.name,
            label_leftward,
            growth,
        );
    }

    /// Render the open tooltip: lay the content out into galleys first (the
    /// measurement pass), then place the measured box and paint it.
    fn draw_tooltip(&self, ui: &egui::Ui) {
        let Some(tip) = self.tooltip.as_ref() else {
            return;
        };

        let wrap_width = 320.0;
        let galleys = self.tooltip_galleys(ui, &tip.content, wrap_width);
        if galleys.is_empty() {
            return;
        }

        let padding = Vec2::new(10.0, 8.0);
        let spacing = 6.0;
        let content_width = galleys
            .iter()
            .map(|galley| galley.size().x)
            .fold(0.0f32, f32::max);
        let content_height = galleys.iter().map(|galley| galley.size().y).sum::<f32>()
            + spacing * (galleys.len() - 1) as f32;
        let size = Vec2::new(content_width, content_height) + padding * 2.0;

        let placement =
            tooltip::resolve_placement(tip.content.mode, self.canvas_rect, tip.pointer);
        let top_left = tooltip::place(size, placement);
        let rect = Rect::from_min_size(top_left, size);

        let painter = ui.ctx().layer_painter(egui::LayerId::new(
            egui::Order::Tooltip,
            egui::Id::new("taxonomy_tooltip"),
        ));
        painter.rect_filled(rect, egui::CornerRadius::same(4), Color32::from_gray(250));
        painter.rect_stroke(
            rect,
            egui::CornerRadius::same(4),
            Stroke::new(1.0, Color32::from_gray(180)),
            StrokeKind::Outside,
        );

        let mut cursor = top_left + padding;
        for galley in galleys {
            let height = galley.size().y;
            painter.galley(cursor, galley, Color32::BLACK);
            cursor.y += height + spacing;
        }
    }

    /// The measurement half of measure-then-place: every block becomes a
    /// sized galley before any placement decision is made.
    fn tooltip_galleys(
        &self,
        ui: &egui::Ui,
        content: &TooltipContent,
        wrap_width: f32,
    ) -> Vec<Arc<Galley>> {
        let body = FontId::proportional(13.0);
        let heading = FontId::proportional(13.5);
        let title = FontId::proportional(15.0);
        let text_color = Color32::from_gray(30);

        let mut jobs: Vec<LayoutJob> = Vec::new();

        let mut title_job = LayoutJob::default();
        title_job.wrap.max_width = wrap_width;
        title_job.append(
            &content.title,
            0.0,
            TextFormat {
                font_id: title,
                color: Color32::BLACK,
                ..Default::default()
            },
        );
        jobs.push(title_job);

        if let Some(definition) = &content.definition {
            let mut job = LayoutJob::default();
            job.wrap.max_width = wrap_width;
            if content.mode == TooltipMode::WidgetAnchored {
                job.append(
                    "Definition: ",
                    0.0,
                    TextFormat {
                        font_id: heading.clone(),
                        color: Color32::BLACK,
                        ..Default::default()
                    },
                );
            }
            job.append(
                definition,
                0.0,
                TextFormat {
                    font_id: body.clone(),
                    color: text_color,
                    ..Default::default()
                },
            );
            jobs.push(job);
        }

        if let Some(conceptual) = &content.conceptual {
            let mut job = LayoutJob::default();
            job.wrap.max_width = wrap_width;
            job.append(
                "Conceptual Instances:\n",
                0.0,
                TextFormat {
                    font_id: heading.clone(),
                    color: Color32::BLACK,
                    ..Default::default()
                },
            );
            job.append(
                conceptual,
                0.0,
                TextFormat {
                    font_id: body.clone(),
                    color: text_color,
                    ..Default::default()
                },
            );
            jobs.push(job);
        }

        if let Some(segments) = &content.example {
            let mut job = LayoutJob::default();
            job.wrap.max_width = wrap_width;
            job.append(
                "Example:\n",
                0.0,
                TextFormat {
                    font_id: heading.clone(),
                    color: Color32::BLACK,
                    ..Default::default()
                },
            );
            for segment in segments {
                if segment.text.is_empty() {
                    continue;
                }
                let format = if segment.highlighted {
                    TextFormat {
                        font_id: body.clone(),
                        color: Color32::WHITE,
                        background: content.highlight.color32(),
                        italics: true,
                        ..Default::default()
                    }
                } else {
                    TextFormat {
                        font_id: body.clone(),
                        color: text_color,
                        italics: true,
                        ..Default::default()
                    }
                };
                job.append(&segment.text, 0.0, format);
            }
            jobs.push(job);
        }

        ui.fonts(|fonts| jobs.into_iter().map(|job| fonts.layout_job(job)).collect())
    }
}

impl eframe::App for RoleTreeGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open...").clicked() {
                        self.open_file_dialog();
                        ui.close();
                    }

                    let has_document = self.document_path.is_some();
                    if ui
                        .add_enabled(has_document, egui::Button::new("Reload"))
                        .clicked()
                    {
                        if let Some(path) = self.document_path.clone() {
                            if let Err(err) = self.load_from_path(path) {
                                self.last_error = Some(format!("{err:#}"));
                            }
                        }
                        ui.close();
                    }

                    if ui
                        .add_enabled(self.layout.is_some(), egui::Button::new("Export SVG..."))
                        .clicked()
                    {
                        self.export_svg_dialog();
                        ui.close();
                    }

                    ui.separator();

                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    ui.checkbox(
                        &mut self.options.hover_details_at_depth1,
                        "Hover details on main roles",
                    );
                    ui.checkbox(
                        &mut self.options.click_details_below_depth1,
                        "Click details on subcategories",
                    );
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                if let Some(err) = &self.last_error {
                    ui.colored_label(Color32::from_rgb(0xd6, 0x27, 0x28), err);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });
    }
}
