//! Shape analysis of a display tree and the spacing it calls for.

use serde::Serialize;
use std::collections::HashMap;

use crate::display::{DisplayNode, NodeKind};

pub const DEFAULT_NODE_GAP: f64 = 80.0;
pub const DEFAULT_LAYER_PADDING: f64 = 250.0;

/// Node-count tiers: (more than N nodes, node gap).
const NODE_COUNT_TIERS: &[(usize, f64)] = &[(200, 50.0), (100, 60.0)];
/// Depth beyond which layer padding is derived from depth.
const DEEP_TREE_DEPTH: usize = 5;
const DEEP_LAYER_PADDING: (f64, f64) = (220.0, 280.0);
const DEEP_LAYER_BUDGET: f64 = 400.0;
/// Level width beyond which node gap is derived from width.
const WIDE_LEVEL_NODES: usize = 20;
const WIDE_NODE_GAP: (f64, f64) = (40.0, 60.0);
const WIDE_LEVEL_BUDGET: f64 = 1000.0;
/// Leaf count beyond which node gap is capped.
const MANY_LEAVES: usize = 100;
const MANY_LEAVES_GAP_CAP: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeMetrics {
    pub node_count: usize,
    pub max_depth: usize,
    pub max_children: usize,
    pub leaf_count: usize,
    pub widest_level_nodes: usize,
    pub recommended_node_gap: f64,
    pub recommended_layer_padding: f64,
}

impl Default for TreeMetrics {
    fn default() -> Self {
        Self {
            node_count: 0,
            max_depth: 0,
            max_children: 0,
            leaf_count: 0,
            widest_level_nodes: 0,
            recommended_node_gap: DEFAULT_NODE_GAP,
            recommended_layer_padding: DEFAULT_LAYER_PADDING,
        }
    }
}

impl TreeMetrics {
    /// Analyze a tree in one pre-order pass. The "no data" sentinel counts
    /// as an empty tree.
    pub fn analyze(tree: &DisplayNode) -> Self {
        if tree.kind == NodeKind::Placeholder {
            return Self::default();
        }

        let mut metrics = Self::default();
        let mut level_counts: HashMap<usize, usize> = HashMap::new();

        tree.walk(&mut |node, depth| {
            metrics.node_count += 1;
            metrics.max_depth = metrics.max_depth.max(depth);

            let level = level_counts.entry(depth).or_insert(0);
            *level += 1;
            metrics.widest_level_nodes = metrics.widest_level_nodes.max(*level);

            if node.children.is_empty() {
                metrics.leaf_count += 1;
            } else {
                metrics.max_children = metrics.max_children.max(node.children.len());
            }
        });

        let (gap, padding) = recommend_spacing(&metrics);
        metrics.recommended_node_gap = gap;
        metrics.recommended_layer_padding = padding;

        log::debug!(
            "tree metrics: {} nodes, depth {}, fan-out {}, {} leaves, widest level {}",
            metrics.node_count,
            metrics.max_depth,
            metrics.max_children,
            metrics.leaf_count,
            metrics.widest_level_nodes
        );
        metrics
    }

    /// Large or wide trees are grouped by default.
    pub fn suggests_grouping(&self) -> bool {
        self.node_count > 50 || self.max_children > 12
    }

    pub fn symbol_size(&self) -> f64 {
        if self.node_count > 100 { 7.0 } else { 10.0 }
    }

    /// Container height in viewport-height units.
    pub fn container_height_vh(&self) -> u32 {
        if self.node_count > 200 {
            95
        } else if self.max_depth > 7 || self.max_children > 15 {
            92
        } else {
            90
        }
    }

    pub fn initial_curveness(&self) -> f64 {
        if self.node_count > 100 { 0.4 } else { 0.6 }
    }

    pub fn animate_layout(&self) -> bool {
        self.node_count <= 250
    }
}

/// Rules apply in order: node-count tier, depth, widest level, then the
/// leaf-count cap last.
fn recommend_spacing(m: &TreeMetrics) -> (f64, f64) {
    let mut gap = DEFAULT_NODE_GAP;
    let mut padding = DEFAULT_LAYER_PADDING;

    if let Some(&(_, tier_gap)) = NODE_COUNT_TIERS.iter().find(|(n, _)| m.node_count > *n) {
        gap = tier_gap;
    }

    if m.max_depth > DEEP_TREE_DEPTH {
        let (lo, hi) = DEEP_LAYER_PADDING;
        padding = (DEEP_LAYER_BUDGET / m.max_depth as f64).clamp(lo, hi);
    }

    if m.widest_level_nodes > WIDE_LEVEL_NODES {
        let (lo, hi) = WIDE_NODE_GAP;
        gap = (WIDE_LEVEL_BUDGET / m.widest_level_nodes as f64).clamp(lo, hi);
    }

    if m.leaf_count > MANY_LEAVES {
        gap = gap.min(MANY_LEAVES_GAP_CAP);
    }

    (gap, padding)
}
