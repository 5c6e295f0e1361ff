use std::collections::HashSet;

use super::layout::TreeLayout;
use super::{NodeId, TaxonomyTree};

/// Duration of one reconciliation animation, in milliseconds.
pub const ANIMATION_MS: f32 = 350.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Update,
    Exit,
}

/// Three-way classification of two id sets. Enter and update follow the new
/// set's order, exit follows the old set's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub enter: Vec<NodeId>,
    pub update: Vec<NodeId>,
    pub exit: Vec<NodeId>,
}

/// Pure diff keyed by stable node identity, independent of any renderer.
pub fn diff(old: &[NodeId], new: &[NodeId]) -> Diff {
    let old_set: HashSet<NodeId> = old.iter().copied().collect();
    let new_set: HashSet<NodeId> = new.iter().copied().collect();

    Diff {
        enter: new
            .iter()
            .copied()
            .filter(|id| !old_set.contains(id))
            .collect(),
        update: new
            .iter()
            .copied()
            .filter(|id| old_set.contains(id))
            .collect(),
        exit: old
            .iter()
            .copied()
            .filter(|id| !new_set.contains(id))
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub struct NodeTransition {
    pub id: NodeId,
    pub phase: Phase,
    pub from: (f32, f32),
    pub to: (f32, f32),
}

/// Edge transitions are keyed by the child id, mirroring the node diff.
#[derive(Debug, Clone)]
pub struct EdgeTransition {
    pub parent: NodeId,
    pub child: NodeId,
    pub phase: Phase,
    pub from: ((f32, f32), (f32, f32)),
    pub to: ((f32, f32), (f32, f32)),
}

/// The full transition plan for one layout change.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub nodes: Vec<NodeTransition>,
    pub edges: Vec<EdgeTransition>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

pub fn lerp(a: (f32, f32), b: (f32, f32), t: f32) -> (f32, f32) {
    (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
}

/// Symmetric cubic ease, the original transition curve.
pub fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 2.0 * t - 2.0;
        u * u * u / 2.0 + 1.0
    }
}

impl NodeTransition {
    pub fn position_at(&self, eased: f32) -> (f32, f32) {
        lerp(self.from, self.to, eased)
    }

    /// Scale applied to the node circle and label opacity: entering nodes
    /// grow in, exiting nodes shrink away.
    pub fn growth_at(&self, eased: f32) -> f32 {
        match self.phase {
            Phase::Enter => eased,
            Phase::Update => 1.0,
            Phase::Exit => 1.0 - eased,
        }
    }
}

impl EdgeTransition {
    pub fn endpoints_at(&self, eased: f32) -> ((f32, f32), (f32, f32)) {
        (
            lerp(self.from.0, self.to.0, eased),
            lerp(self.from.1, self.to.1, eased),
        )
    }
}

/// Build the transition plan for a layout change triggered at `trigger`
/// (the clicked node, or the root at mount).
///
/// Entering nodes and edges start collapsed onto the trigger's previous
/// position; exiting ones converge on its new position. Surviving nodes'
/// previous positions are reseeded synchronously, so a toggle arriving
/// mid-animation anchors against this layout's final positions and simply
/// replaces the in-flight plan.
pub fn reconcile(
    tree: &mut TaxonomyTree,
    old: Option<&TreeLayout>,
    new: &TreeLayout,
    trigger: NodeId,
) -> Reconciliation {
    let empty: Vec<NodeId> = Vec::new();
    let old_visible = old.map(|layout| layout.visible.as_slice()).unwrap_or(&empty);
    let node_diff = diff(old_visible, &new.visible);

    let anchor_prev = tree.node(trigger).prev_pos;
    let anchor_now = new.position(trigger);

    let mut nodes = Vec::with_capacity(new.visible.len() + node_diff.exit.len());
    for &id in &node_diff.enter {
        nodes.push(NodeTransition {
            id,
            phase: Phase::Enter,
            from: anchor_prev,
            to: new.position(id),
        });
    }
    for &id in &node_diff.update {
        nodes.push(NodeTransition {
            id,
            phase: Phase::Update,
            from: tree.node(id).prev_pos,
            to: new.position(id),
        });
    }
    for &id in &node_diff.exit {
        nodes.push(NodeTransition {
            id,
            phase: Phase::Exit,
            from: tree.node(id).prev_pos,
            to: anchor_now,
        });
    }

    let old_children: Vec<NodeId> = old
        .map(|layout| layout.edges.iter().map(|&(_, child)| child).collect())
        .unwrap_or_default();
    let new_children: Vec<NodeId> = new.edges.iter().map(|&(_, child)| child).collect();
    let edge_diff = diff(&old_children, &new_children);

    let old_parent_of = |child: NodeId| {
        old.and_then(|layout| {
            layout
                .edges
                .iter()
                .find(|&&(_, c)| c == child)
                .map(|&(parent, _)| parent)
        })
    };
    let new_parent_of = |child: NodeId| {
        new.edges
            .iter()
            .find(|&&(_, c)| c == child)
            .map(|&(parent, _)| parent)
    };

    let mut edges = Vec::with_capacity(new.edges.len() + edge_diff.exit.len());
    for &child in &edge_diff.enter {
        let Some(parent) = new_parent_of(child) else {
            continue;
        };
        edges.push(EdgeTransition {
            parent,
            child,
            phase: Phase::Enter,
            from: (anchor_prev, anchor_prev),
            to: (new.position(parent), new.position(child)),
        });
    }
    for &child in &edge_diff.update {
        let Some(parent) = new_parent_of(child) else {
            continue;
        };
        edges.push(EdgeTransition {
            parent,
            child,
            phase: Phase::Update,
            from: (tree.node(parent).prev_pos, tree.node(child).prev_pos),
            to: (new.position(parent), new.position(child)),
        });
    }
    for &child in &edge_diff.exit {
        let Some(parent) = old_parent_of(child) else {
            continue;
        };
        edges.push(EdgeTransition {
            parent,
            child,
            phase: Phase::Exit,
            from: (tree.node(parent).prev_pos, tree.node(child).prev_pos),
            to: (anchor_now, anchor_now),
        });
    }

    // Reseed previous positions for every node in the new layout; the next
    // cycle's enter/exit anchors come from here.
    for &id in &new.visible {
        let pos = new.position(id);
        let node = tree.node_mut(id);
        node.pos = pos;
        node.prev_pos = pos;
    }

    Reconciliation { nodes, edges }
}
