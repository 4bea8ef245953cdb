//! Backend record tree → display tree.

use crate::display::{DisplayNode, ItemStyle, NodeKind};
use crate::raw::RawNode;
use crate::resolve::{DEFAULT_COLOR, resolve_color, resolve_name};

/// Subtrees nested deeper than this are cut off.
pub const MAX_TREE_DEPTH: usize = 256;

pub const NO_DATA_LABEL: &str = "No data found";

/// Sentinel tree rendered when the backend returned no root.
pub fn no_data_tree() -> DisplayNode {
    DisplayNode {
        name: NO_DATA_LABEL.to_string(),
        kind: NodeKind::Placeholder,
        item_style: ItemStyle::filled(DEFAULT_COLOR),
        ..DisplayNode::default()
    }
}

/// Convert a record tree. A missing root yields the "no data" sentinel.
pub fn transform(raw: Option<&RawNode>) -> DisplayNode {
    match raw {
        Some(root) => {
            let mut truncated = 0;
            let tree = build(root, 0, &mut truncated);
            if truncated > 0 {
                log::warn!(
                    "relation tree deeper than {} levels; dropped {} subtrees",
                    MAX_TREE_DEPTH,
                    truncated
                );
            }
            tree
        }
        None => no_data_tree(),
    }
}

fn build(raw: &RawNode, depth: usize, truncated: &mut usize) -> DisplayNode {
    let children = if depth >= MAX_TREE_DEPTH {
        *truncated += raw.children.len();
        Vec::new()
    } else {
        raw.children
            .iter()
            .map(|c| build(c, depth + 1, truncated))
            .collect()
    };

    DisplayNode {
        name: resolve_name(raw),
        table_name: raw.table_name.clone(),
        id: raw.id.clone(),
        kind: NodeKind::Table,
        item_style: ItemStyle::filled(resolve_color(&raw.table_name)),
        children,
        ..DisplayNode::default()
    }
}
