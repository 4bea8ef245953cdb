//! Collapse runs of same-type siblings into synthetic group nodes.

use std::collections::{HashMap, HashSet};

use crate::display::{DisplayNode, Fill, GROUP_SUFFIX, ItemStyle, LabelStyle, NodeKind};
use crate::resolve::{group_color, lighten};

/// A type with more siblings than this is always grouped.
pub const GROUP_MIN_COUNT: usize = 3;
/// A type with exactly `GROUP_MIN_COUNT` siblings is grouped when its share
/// of the sibling list exceeds this.
pub const GROUP_MIN_SHARE: f64 = 0.6;
/// Groups with more members than this start collapsed.
pub const COLLAPSE_ABOVE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingOptions {
    pub enabled: bool,
    /// Force every group open regardless of size.
    pub expand_all: bool,
}

/// Group the tree. Disabled grouping returns an unchanged copy. The input is
/// never modified.
pub fn group(tree: &DisplayNode, options: GroupingOptions) -> DisplayNode {
    if !options.enabled {
        return tree.clone();
    }
    let mut path = Vec::new();
    group_node(tree, options.expand_all, &mut path)
}

/// Type-tags among `children` that qualify for grouping.
pub fn groupable_types(children: &[DisplayNode]) -> HashSet<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for child in children {
        if is_countable(child) {
            *counts.entry(child.table_name.as_str()).or_insert(0) += 1;
        }
    }

    let total = children.len() as f64;
    counts
        .into_iter()
        .filter(|&(_, count)| {
            count > GROUP_MIN_COUNT
                || (count >= GROUP_MIN_COUNT && count as f64 / total > GROUP_MIN_SHARE)
        })
        .map(|(table, _)| table)
        .collect()
}

fn is_countable(node: &DisplayNode) -> bool {
    !node.table_name.is_empty() && node.kind != NodeKind::Placeholder
}

fn group_node(node: &DisplayNode, expand_all: bool, path: &mut Vec<usize>) -> DisplayNode {
    let mut out = node.shallow();
    let groupable = groupable_types(&node.children);

    if groupable.is_empty() {
        out.children = node
            .children
            .iter()
            .enumerate()
            .map(|(i, child)| descend(child, i, expand_all, path))
            .collect();
        return out;
    }

    let mut member_counts: HashMap<&str, usize> = HashMap::new();
    for child in &node.children {
        if groupable.contains(child.table_name.as_str()) {
            *member_counts.entry(child.table_name.as_str()).or_insert(0) += 1;
        }
    }
    log::debug!(
        "grouping {} sibling types under node {:?}",
        groupable.len(),
        node.id
    );

    // Index of each type's group within `out.children`, set at first occurrence.
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for (i, child) in node.children.iter().enumerate() {
        let processed = descend(child, i, expand_all, path);
        let table = child.table_name.as_str();
        if !groupable.contains(table) {
            out.children.push(processed);
            continue;
        }

        let slot = *slots.entry(table).or_insert_with(|| {
            let count = member_counts.get(table).copied().unwrap_or(0);
            out.children.push(group_for(table, count, path, expand_all));
            out.children.len() - 1
        });
        out.children[slot].children.push(processed);
    }
    out
}

fn descend(child: &DisplayNode, index: usize, expand_all: bool, path: &mut Vec<usize>) -> DisplayNode {
    path.push(index);
    let processed = group_node(child, expand_all, path);
    path.pop();
    processed
}

/// Synthetic group node. The id is derived from the parent's position, so it
/// is unique within one pass and identical across passes over the same tree.
fn group_for(member_type: &str, count: usize, parent_path: &[usize], expand_all: bool) -> DisplayNode {
    let color = group_color(member_type);
    let position = if parent_path.is_empty() {
        "root".to_string()
    } else {
        parent_path
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("-")
    };

    DisplayNode {
        name: format!("{} ({})", member_type, count),
        table_name: format!("{}{}", member_type, GROUP_SUFFIX),
        id: format!("group_{}_{}", member_type, position),
        kind: NodeKind::Group {
            member_type: member_type.to_string(),
            member_count: count,
            collapsed: count > COLLAPSE_ABOVE && !expand_all,
        },
        item_style: ItemStyle {
            color: color.to_string(),
            border_color: Some(lighten(color, -20)),
            border_width: Some(2.0),
            ..ItemStyle::default()
        },
        label: Some(LabelStyle {
            color: Some("#fff".to_string()),
            bold: true,
            background: Some(Fill::Gradient {
                from: color.to_string(),
                to: lighten(color, 20),
            }),
            padding: Some([2.0, 4.0]),
            border_radius: Some(3.0),
            ..LabelStyle::default()
        }),
        ..DisplayNode::default()
    }
}
