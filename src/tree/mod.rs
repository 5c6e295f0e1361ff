use std::mem;

use serde::Deserialize;

pub mod color;
pub mod layout;
pub mod painter;
pub mod reconcile;
pub mod tooltip;

pub type NodeId = usize;

/// Narrative role attached to a taxonomy concept. Roles are sparse in the
/// document; nodes without one inherit from the nearest ancestor that has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Protagonist,
    Antagonist,
    Innocent,
}

/// One concept in the input document, as parsed from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyRecord {
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub conceptual: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub highlight_span: Option<Vec<usize>>,
    #[serde(default)]
    pub children: Option<Vec<TaxonomyRecord>>,
}

impl TaxonomyRecord {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            definition: None,
            conceptual: None,
            example: None,
            highlight_span: None,
            children: None,
        }
    }
}

/// Per-node payload carried into the arena (the record minus its children).
#[derive(Debug, Clone)]
pub struct NodeData {
    pub name: String,
    pub role: Option<Role>,
    pub definition: Option<String>,
    pub conceptual: Option<String>,
    pub example: Option<String>,
    pub highlight_span: Option<Vec<usize>>,
}

/// Node within the taxonomy arena.
///
/// Exactly one of `children` / `hidden_children` holds the node's children at
/// any time. `toggle` swaps the two vectors in place, so expanding after a
/// collapse restores the identical ids in the identical order.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub id: NodeId,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub hidden_children: Vec<NodeId>,
    pub data: NodeData,
    /// Current layout position (layout-space units).
    pub pos: (f32, f32),
    /// Position at the end of the previous layout pass, used as the
    /// enter/exit anchor for the next reconciliation.
    pub prev_pos: (f32, f32),
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.hidden_children.is_empty()
    }

    pub fn is_collapsed(&self) -> bool {
        !self.hidden_children.is_empty()
    }
}

/// The taxonomy tree with expand/collapse state, stored as an arena indexed
/// by `NodeId`. Ids are assigned once at build time and never reassigned;
/// the reconciler uses them as diff keys across layout passes.
#[derive(Debug, Clone)]
pub struct TaxonomyTree {
    nodes: Vec<TreeNode>,
}

impl TaxonomyTree {
    /// Build the arena from a parsed document and apply the initial state:
    /// the root's direct children stay visible, everything deeper is stashed.
    pub fn build(record: TaxonomyRecord) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let root = tree.insert(record, None, 0);
        let first_level = tree.nodes[root].children.clone();
        for child in first_level {
            tree.collapse_recursive(child);
        }
        tree
    }

    fn insert(&mut self, record: TaxonomyRecord, parent: Option<NodeId>, depth: usize) -> NodeId {
        let id = self.nodes.len();
        let TaxonomyRecord {
            name,
            role,
            definition,
            conceptual,
            example,
            highlight_span,
            children,
        } = record;

        self.nodes.push(TreeNode {
            id,
            depth,
            parent,
            children: Vec::new(),
            hidden_children: Vec::new(),
            data: NodeData {
                name,
                role,
                definition,
                conceptual,
                example,
                highlight_span,
            },
            pos: (0.0, 0.0),
            prev_pos: (0.0, 0.0),
        });

        if let Some(child_records) = children {
            let mut child_ids = Vec::with_capacity(child_records.len());
            for child in child_records {
                child_ids.push(self.insert(child, Some(id), depth + 1));
            }
            self.nodes[id].children = child_ids;
        }

        id
    }

    fn collapse_recursive(&mut self, id: NodeId) {
        let children = mem::take(&mut self.nodes[id].children);
        for &child in &children {
            self.collapse_recursive(child);
        }
        self.nodes[id].hidden_children = children;
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Collapse a node with visible children, or expand one with hidden
    /// children. A leaf has neither and the call is a no-op.
    pub fn toggle(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        mem::swap(&mut node.children, &mut node.hidden_children);
    }

    /// Effective role: the node's own role if set, otherwise the nearest
    /// ancestor with an explicit role. `None` means the neutral fallback.
    pub fn resolve_role(&self, id: NodeId) -> Option<Role> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id];
            if let Some(role) = node.data.role {
                return Some(role);
            }
            current = node.parent;
        }
        None
    }

    /// Whether a node is reachable from the root without passing through a
    /// collapsed ancestor.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            if !self.nodes[parent].children.contains(&current) {
                return false;
            }
            current = parent;
        }
        true
    }

    /// Lazy pre-order traversal of the visible set. Each call starts a fresh
    /// traversal; collapsed subtrees contribute nothing.
    pub fn visible_nodes(&self) -> VisibleNodes<'_> {
        VisibleNodes {
            tree: self,
            stack: if self.nodes.is_empty() {
                Vec::new()
            } else {
                vec![self.root()]
            },
        }
    }
}

pub struct VisibleNodes<'a> {
    tree: &'a TaxonomyTree,
    stack: Vec<NodeId>,
}

impl Iterator for VisibleNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        // Push in reverse so the first child is visited first.
        for &child in self.tree.nodes[id].children.iter().rev() {
            self.stack.push(child);
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, role: Option<Role>, children: Vec<TaxonomyRecord>) -> TaxonomyRecord {
        TaxonomyRecord {
            role,
            children: if children.is_empty() {
                None
            } else {
                Some(children)
            },
            ..TaxonomyRecord::leaf(name)
        }
    }

    fn sample_tree() -> TaxonomyTree {
        TaxonomyTree::build(record(
            "Root",
            None,
            vec![
                record(
                    "Protagonist",
                    Some(Role::Protagonist),
                    vec![
                        record("Hero", None, vec![TaxonomyRecord::leaf("Reluctant Hero")]),
                        TaxonomyRecord::leaf("Mentor"),
                    ],
                ),
                record(
                    "Antagonist",
                    Some(Role::Antagonist),
                    vec![TaxonomyRecord::leaf("Villain")],
                ),
            ],
        ))
    }

    fn visible_names(tree: &TaxonomyTree) -> Vec<String> {
        tree.visible_nodes()
            .map(|id| tree.node(id).data.name.clone())
            .collect()
    }

    #[test]
    fn initial_state_shows_root_and_first_level_only() {
        let tree = sample_tree();
        assert_eq!(visible_names(&tree), ["Root", "Protagonist", "Antagonist"]);
    }

    #[test]
    fn toggle_expands_then_collapses() {
        let mut tree = sample_tree();
        let protagonist = tree.visible_nodes().nth(1).unwrap();

        tree.toggle(protagonist);
        assert_eq!(
            visible_names(&tree),
            ["Root", "Protagonist", "Hero", "Mentor", "Antagonist"]
        );

        tree.toggle(protagonist);
        assert_eq!(visible_names(&tree), ["Root", "Protagonist", "Antagonist"]);
    }

    #[test]
    fn double_toggle_restores_identical_structure() {
        let mut tree = sample_tree();
        let protagonist = tree.visible_nodes().nth(1).unwrap();
        tree.toggle(protagonist);

        let before: Vec<NodeId> = tree.visible_nodes().collect();
        tree.toggle(protagonist);
        tree.toggle(protagonist);
        let after: Vec<NodeId> = tree.visible_nodes().collect();

        assert_eq!(before, after);
    }

    #[test]
    fn toggle_on_leaf_is_noop() {
        let mut tree = sample_tree();
        let before: Vec<NodeId> = tree.visible_nodes().collect();
        let mentor = tree
            .nodes()
            .iter()
            .find(|n| n.data.name == "Mentor")
            .unwrap()
            .id;

        tree.toggle(mentor);
        let after: Vec<NodeId> = tree.visible_nodes().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn depth_follows_parent() {
        let tree = sample_tree();
        for node in tree.nodes() {
            match node.parent {
                Some(parent) => assert_eq!(node.depth, tree.node(parent).depth + 1),
                None => assert_eq!(node.depth, 0),
            }
        }
    }

    #[test]
    fn resolve_role_walks_ancestors() {
        let mut tree = sample_tree();
        let protagonist = tree.visible_nodes().nth(1).unwrap();
        tree.toggle(protagonist);

        let hero = tree
            .nodes()
            .iter()
            .find(|n| n.data.name == "Hero")
            .unwrap()
            .id;
        let reluctant = tree
            .nodes()
            .iter()
            .find(|n| n.data.name == "Reluctant Hero")
            .unwrap()
            .id;
        let root = tree.root();

        assert_eq!(tree.resolve_role(protagonist), Some(Role::Protagonist));
        assert_eq!(tree.resolve_role(hero), Some(Role::Protagonist));
        assert_eq!(tree.resolve_role(reluctant), Some(Role::Protagonist));
        assert_eq!(tree.resolve_role(root), None);
    }

    #[test]
    fn hidden_subtrees_never_leak_into_visible_set() {
        let mut tree = sample_tree();
        let protagonist = tree.visible_nodes().nth(1).unwrap();
        tree.toggle(protagonist);

        let hero = tree
            .nodes()
            .iter()
            .find(|n| n.data.name == "Hero")
            .unwrap()
            .id;
        // Expand Hero, then collapse Protagonist again: Hero keeps its own
        // expanded state but disappears from the visible set.
        tree.toggle(hero);
        tree.toggle(protagonist);

        let visible: Vec<NodeId> = tree.visible_nodes().collect();
        assert!(!visible.contains(&hero));
        for id in visible {
            assert!(tree.is_visible(id));
        }
        assert!(!tree.is_visible(hero));
    }

    #[test]
    fn mount_scenario_from_document() {
        let json = r#"{
            "name": "Root",
            "children": [
                {"name": "Protagonist", "role": "protagonist",
                 "children": [{"name": "Hero"}]}
            ]
        }"#;
        let record: TaxonomyRecord = serde_json::from_str(json).unwrap();
        let mut tree = TaxonomyTree::build(record);

        assert_eq!(visible_names(&tree), ["Root", "Protagonist"]);

        let protagonist = tree.visible_nodes().nth(1).unwrap();
        tree.toggle(protagonist);
        assert_eq!(visible_names(&tree), ["Root", "Protagonist", "Hero"]);

        let hero = tree.visible_nodes().nth(2).unwrap();
        assert_eq!(tree.resolve_role(hero), Some(Role::Protagonist));
    }
}
