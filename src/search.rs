//! Node search and target highlighting.

use serde::Serialize;

use crate::display::{DisplayNode, Fill, ItemStyle, LabelStyle};

const TARGET_COLOR: &str = "#ffcc00";
const TARGET_BORDER: &str = "#ff9900";
const TARGET_BORDER_WIDTH: f64 = 5.0;
const TARGET_SHADOW_BLUR: f64 = 20.0;
const TARGET_SYMBOL_SIZE: f64 = 25.0;
const TARGET_LABEL_BACKGROUND: &str = "rgba(255,153,0,0.6)";

const DIMMED_COLOR: &str = "#999999";
const DIMMED_BORDER_WIDTH: f64 = 1.2;
const DIMMED_OPACITY: f64 = 0.5;
const DIMMED_LABEL_COLOR: &str = "#aaaaaa";
const DIMMED_LABEL_OPACITY: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub id: String,
    pub name: String,
    pub table_name: String,
    /// Names from the root down to and including the match.
    pub path: Vec<String>,
    pub depth: usize,
    /// Child indices from the root, valid for the tree that was searched.
    pub index_path: Vec<usize>,
}

/// Case-insensitive substring search over names and type-tags. Results are
/// ordered by depth, ties in pre-order. A blank term matches nothing.
pub fn search(tree: &DisplayNode, term: &str) -> Vec<SearchMatch> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    let mut names = Vec::new();
    let mut indices = Vec::new();
    collect(tree, &needle, &mut names, &mut indices, &mut matches);

    // stable: equal depths keep pre-order
    matches.sort_by_key(|m| m.depth);
    matches
}

fn collect<'a>(
    node: &'a DisplayNode,
    needle: &str,
    names: &mut Vec<&'a str>,
    indices: &mut Vec<usize>,
    out: &mut Vec<SearchMatch>,
) {
    names.push(node.name.as_str());
    if node.name.to_lowercase().contains(needle) || node.table_name.to_lowercase().contains(needle) {
        out.push(SearchMatch {
            id: node.id.clone(),
            name: node.name.clone(),
            table_name: node.table_name.clone(),
            path: names.iter().map(|n| n.to_string()).collect(),
            depth: indices.len(),
            index_path: indices.clone(),
        });
    }
    for (i, child) in node.children.iter().enumerate() {
        indices.push(i);
        collect(child, needle, names, indices, out);
        indices.pop();
    }
    names.pop();
}

/// Copy of `tree` with the node whose id is `target_id` emphasized and every
/// other node dimmed. Structure is unchanged.
pub fn highlight(tree: &DisplayNode, target_id: &str) -> DisplayNode {
    let mut out = tree.shallow();
    if out.id == target_id {
        emphasize(&mut out);
    } else {
        dim(&mut out);
    }
    out.children = tree
        .children
        .iter()
        .map(|child| highlight(child, target_id))
        .collect();
    out
}

fn emphasize(node: &mut DisplayNode) {
    node.item_style = ItemStyle {
        color: TARGET_COLOR.to_string(),
        border_color: Some(TARGET_BORDER.to_string()),
        border_width: Some(TARGET_BORDER_WIDTH),
        opacity: None,
        shadow_blur: Some(TARGET_SHADOW_BLUR),
        shadow_color: Some(TARGET_COLOR.to_string()),
    };
    node.symbol_size = Some(TARGET_SYMBOL_SIZE);
    node.label = Some(LabelStyle {
        color: Some("#ffffff".to_string()),
        bold: true,
        font_size: Some(14.0),
        background: Some(Fill::Solid(TARGET_LABEL_BACKGROUND.to_string())),
        padding: Some([6.0, 10.0]),
        border_radius: Some(4.0),
        opacity: None,
    });
}

/// The item style is replaced outright, so group borders and shadows go too.
fn dim(node: &mut DisplayNode) {
    node.item_style = ItemStyle {
        color: DIMMED_COLOR.to_string(),
        border_width: Some(DIMMED_BORDER_WIDTH),
        opacity: Some(DIMMED_OPACITY),
        ..ItemStyle::default()
    };
    if let Some(label) = node.label.as_mut() {
        label.color = Some(DIMMED_LABEL_COLOR.to_string());
        label.opacity = Some(DIMMED_LABEL_OPACITY);
        label.background = None;
    }
}
