use crate::display::{DisplayNode, LayoutOffset};

/// Leaf spacing at or below this leaves the tree untouched.
pub const BASE_LEAF_SPACING: f64 = 30.0;
const OFFSET_STEP: f64 = 0.2;
const BASE_CURVENESS: f64 = 0.3;
const CURVENESS_STEP: f64 = 0.01;

/// Fan out sibling leaves vertically. Under every node with more than one
/// leaf child, leaf `i` (counted among leaves only) is pushed up for even `i`
/// and down for odd `i`, and its incoming edge is curved.
pub fn annotate_leaf_spacing(tree: &mut DisplayNode, spacing: f64) {
    if spacing <= BASE_LEAF_SPACING {
        return;
    }
    annotate(tree, spacing);
}

fn annotate(node: &mut DisplayNode, spacing: f64) {
    let leaf_count = node.children.iter().filter(|c| c.is_leaf()).count();
    if leaf_count > 1 {
        let extra = spacing - BASE_LEAF_SPACING;
        let curveness = BASE_CURVENESS + extra * CURVENESS_STEP;
        for (i, leaf) in node.children.iter_mut().filter(|c| c.is_leaf()).enumerate() {
            let magnitude = extra * OFFSET_STEP * ((i / 2) as f64 + 1.0);
            let y = if i % 2 == 0 { -magnitude } else { magnitude };
            leaf.layout_offset = Some(LayoutOffset { x: 0.0, y });
            leaf.line_curveness = Some(curveness);
        }
    }
    for child in &mut node.children {
        annotate(child, spacing);
    }
}
