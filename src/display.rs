//! Display tree: the node structure handed to the rendering surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Suffix appended to a member type-tag to form a group node's `tableName`.
pub const GROUP_SUFFIX: &str = "_group";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    /// A node backed by a backend record.
    #[default]
    Table,
    /// Synthetic node collapsing same-type siblings. Never sent to the API.
    #[serde(rename_all = "camelCase")]
    Group {
        member_type: String,
        member_count: usize,
        collapsed: bool,
    },
    /// "No data" sentinel standing in for a missing root.
    Placeholder,
    /// A method in a call graph.
    Method(MethodInfo),
}

/// Position of a method relative to the method the graph is centered on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallRole {
    #[default]
    Center,
    Caller,
    Callee,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub role: CallRole,
    #[serde(default)]
    pub class_name: String,
    /// Call count, at least 1.
    #[serde(default)]
    pub value: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStyle {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
}

impl ItemStyle {
    pub fn filled(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            ..Self::default()
        }
    }
}

/// Label background: flat color or a left-to-right gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fill {
    Solid(String),
    Gradient { from: String, to: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Fill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutOffset {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNode {
    pub name: String,
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub item_style: ItemStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_offset: Option<LayoutOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_curveness: Option<f64>,
    #[serde(default)]
    pub children: Vec<DisplayNode>,
}

impl DisplayNode {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Copy of this node with no children.
    pub fn shallow(&self) -> Self {
        Self {
            name: self.name.clone(),
            table_name: self.table_name.clone(),
            id: self.id.clone(),
            kind: self.kind.clone(),
            item_style: self.item_style.clone(),
            label: self.label.clone(),
            symbol_size: self.symbol_size,
            layout_offset: self.layout_offset,
            line_curveness: self.line_curveness,
            children: Vec::new(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Type-tag with any group suffix removed.
    pub fn base_table_name(&self) -> &str {
        match &self.kind {
            NodeKind::Group { member_type, .. } => member_type,
            NodeKind::Table | NodeKind::Placeholder | NodeKind::Method(_) => &self.table_name,
        }
    }

    /// Pre-order search by id.
    pub fn find(&self, id: &str) -> Option<&DisplayNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Follow a child-index path from this node.
    pub fn at_path(&self, path: &[usize]) -> Option<&DisplayNode> {
        path.iter()
            .try_fold(self, |node, &idx| node.children.get(idx))
    }

    /// Visit every node in pre-order with its depth.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a DisplayNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a DisplayNode, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Clear the collapsed flag on every group in the subtree.
    pub fn expand_all(&mut self) {
        if let NodeKind::Group { collapsed, .. } = &mut self.kind {
            *collapsed = false;
        }
        for child in &mut self.children {
            child.expand_all();
        }
    }

    /// Open every group on the way down to the node with `id`. Returns whether
    /// the node was found; nothing changes when it was not.
    pub fn reveal(&mut self, id: &str) -> bool {
        if self.id == id {
            return true;
        }
        let found = self.children.iter_mut().any(|c| c.reveal(id));
        if found {
            if let NodeKind::Group { collapsed, .. } = &mut self.kind {
                *collapsed = false;
            }
        }
        found
    }
}
