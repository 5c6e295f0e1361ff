use std::path::Path;

use anyhow::Result;

use crate::app::AppConfig;
use crate::export;
use crate::tree::color::StylePass;
use crate::tree::painter::TreePainter;
use crate::tree::{Role, TaxonomyRecord, TaxonomyTree};

pub fn render_preview(record: &TaxonomyRecord, config: &AppConfig) {
    let tree = TaxonomyTree::build(record.clone());

    let max_depth = tree.nodes().iter().map(|n| n.depth).max().unwrap_or(0);
    let count_role = |role: Role| {
        tree.nodes()
            .iter()
            .filter(|n| tree.resolve_role(n.id) == Some(role))
            .count()
    };

    println!(
        "Loaded taxonomy \"{}\" with {} concept(s), max depth {}.",
        record.name,
        tree.len(),
        max_depth
    );
    println!(
        "Roles: {} protagonist, {} antagonist, {} innocent.",
        count_role(Role::Protagonist),
        count_role(Role::Antagonist),
        count_role(Role::Innocent)
    );

    let visible: Vec<String> = tree
        .visible_nodes()
        .map(|id| tree.node(id).data.name.clone())
        .collect();
    println!(
        "Visible at mount ({}x{} px): {}",
        config.width,
        config.height,
        visible.join(", ")
    );
}

pub fn export(record: &TaxonomyRecord, config: &AppConfig, output: &Path) -> Result<()> {
    let tree = TaxonomyTree::build(record.clone());
    let styles = StylePass::compute(&tree);
    let painter = TreePainter::default();

    export::svg::export_diagram(
        &tree,
        &styles,
        &painter,
        output,
        config.width as f32,
        config.height as f32,
    )?;
    println!("Exported diagram to {}", output.display());
    Ok(())
}
