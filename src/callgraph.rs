//! Method call graph → display tree.
//!
//! The graph is centered on one method. Its callers and callees become the
//! center's children, callers first, so the result runs through the same
//! grouping, search and highlight passes as a relation tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::display::{CallRole, DisplayNode, ItemStyle, MethodInfo, NodeKind};
use crate::raw::null_as_default;
use crate::resolve::DEFAULT_COLOR;
use crate::transform::MAX_TREE_DEPTH;

pub const CENTER_COLOR: &str = "#F28B82";
pub const CALLER_COLOR: &str = "#8AB4F8";
pub const CALLEE_COLOR: &str = "#81C995";

pub const METHOD_NOT_FOUND_LABEL: &str = "Method not found";

/// One method as returned by the call-graph endpoint. The center method
/// carries `calledBy` and `calls`; a callee may carry its own `children`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    #[serde(default, deserialize_with = "null_as_default")]
    pub method_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub class_name: String,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub called_by: Vec<MethodCall>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub calls: Vec<MethodCall>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<MethodCall>,
}

impl MethodCall {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            ..Self::default()
        }
    }

    /// Call count; zero and missing both count as one call.
    pub fn value(&self) -> u64 {
        self.count.filter(|&c| c > 0).unwrap_or(1)
    }
}

/// Sentinel tree rendered when the endpoint found no such method.
pub fn method_not_found_tree() -> DisplayNode {
    DisplayNode {
        name: METHOD_NOT_FOUND_LABEL.to_string(),
        kind: NodeKind::Placeholder,
        item_style: ItemStyle::filled(DEFAULT_COLOR),
        ..DisplayNode::default()
    }
}

/// Convert a call graph. Callers are kept one level deep; callees keep their
/// nested callees.
pub fn transform_call_graph(graph: Option<&MethodCall>) -> DisplayNode {
    let Some(center) = graph else {
        return method_not_found_tree();
    };

    let mut truncated = 0;
    let mut root = method_node(center, CallRole::Center, &[]);
    let callers = center.called_by.iter().map(|caller| (caller, CallRole::Caller));
    let callees = center.calls.iter().map(|callee| (callee, CallRole::Callee));
    root.children = callers
        .chain(callees)
        .enumerate()
        .map(|(i, (call, role))| {
            let mut node = method_node(call, role, &[i]);
            if role == CallRole::Callee {
                node.children = nested_callees(call, &mut vec![i], &mut truncated);
            }
            node
        })
        .collect();

    if truncated > 0 {
        log::warn!(
            "call graph deeper than {} levels; dropped {} subtrees",
            MAX_TREE_DEPTH,
            truncated
        );
    }
    root
}

fn nested_callees(call: &MethodCall, path: &mut Vec<usize>, truncated: &mut usize) -> Vec<DisplayNode> {
    if path.len() >= MAX_TREE_DEPTH {
        *truncated += call.children.len();
        return Vec::new();
    }
    call.children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            path.push(i);
            let mut node = method_node(child, CallRole::Callee, path);
            node.children = nested_callees(child, path, truncated);
            path.pop();
            node
        })
        .collect()
}

/// The same method can appear more than once in a graph, so the id carries
/// the node's position.
fn method_node(call: &MethodCall, role: CallRole, path: &[usize]) -> DisplayNode {
    let position = if path.is_empty() {
        "root".to_string()
    } else {
        path.iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("-")
    };
    let color = match role {
        CallRole::Center => CENTER_COLOR,
        CallRole::Caller => CALLER_COLOR,
        CallRole::Callee => CALLEE_COLOR,
    };

    DisplayNode {
        name: call.method_name.clone(),
        table_name: call.class_name.clone(),
        id: format!("{}#{}@{}", call.class_name, call.method_name, position),
        kind: NodeKind::Method(MethodInfo {
            role,
            class_name: call.class_name.clone(),
            value: call.value(),
            params: call.params.clone(),
            return_type: call.return_type.clone(),
            file_path: call.file_path.clone(),
        }),
        item_style: ItemStyle::filled(color),
        ..DisplayNode::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{GroupingOptions, group};
    use crate::search::search;
    use pretty_assertions::assert_eq;

    fn role(node: &DisplayNode) -> Option<CallRole> {
        match &node.kind {
            NodeKind::Method(info) => Some(info.role),
            _ => None,
        }
    }

    fn graph() -> MethodCall {
        let mut center = MethodCall::new("OrderService", "submit");
        center.count = Some(2);
        center.return_type = Some("Order".to_string());
        center.called_by = vec![MethodCall::new("OrderController", "post")];

        let mut save = MethodCall::new("OrderRepository", "save");
        save.count = Some(0);
        save.children = vec![MethodCall::new("JdbcTemplate", "update")];
        // Callers of a caller are not drawn.
        center.called_by[0].children = vec![MethodCall::new("Router", "dispatch")];
        center.calls = vec![save, MethodCall::new("AuditLog", "record")];
        center
    }

    #[test]
    fn test_center_callers_then_callees() {
        let tree = transform_call_graph(Some(&graph()));
        assert_eq!(tree.name, "submit");
        assert_eq!(tree.table_name, "OrderService");
        assert_eq!(tree.item_style.color, CENTER_COLOR);
        assert_eq!(role(&tree), Some(CallRole::Center));

        let names: Vec<&str> = tree.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["post", "save", "record"]);
        assert_eq!(tree.children[0].item_style.color, CALLER_COLOR);
        assert_eq!(tree.children[1].item_style.color, CALLEE_COLOR);
        assert!(tree.children[0].children.is_empty());

        let nested = &tree.children[1].children[0];
        assert_eq!(nested.name, "update");
        assert_eq!(role(nested), Some(CallRole::Callee));
        assert_eq!(nested.id, "JdbcTemplate#update@1-0");
    }

    #[test]
    fn test_values_default_to_one() {
        let tree = transform_call_graph(Some(&graph()));
        let value = |n: &DisplayNode| match &n.kind {
            NodeKind::Method(info) => info.value,
            other => panic!("expected a method, got {:?}", other),
        };
        assert_eq!(value(&tree), 2);
        assert_eq!(value(&tree.children[0]), 1);
        assert_eq!(value(&tree.children[1]), 1);
    }

    #[test]
    fn test_missing_graph_is_not_found() {
        let tree = transform_call_graph(None);
        assert_eq!(tree.name, METHOD_NOT_FOUND_LABEL);
        assert_eq!(tree.kind, NodeKind::Placeholder);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_lenient_payload() {
        let json = r#"{
            "methodName": "submit", "className": "OrderService",
            "calledBy": null, "calls": [{"methodName": "save", "className": "Repo", "count": 5}]
        }"#;
        let call: MethodCall = serde_json::from_str(json).unwrap();
        assert!(call.called_by.is_empty());
        assert_eq!(call.calls[0].value(), 5);
    }

    #[test]
    fn test_ids_unique_for_repeated_methods() {
        let mut center = MethodCall::new("A", "run");
        center.called_by = vec![MethodCall::new("A", "run")];
        center.calls = vec![MethodCall::new("A", "run")];
        let tree = transform_call_graph(Some(&center));

        let mut ids = Vec::new();
        tree.walk(&mut |n, _| ids.push(n.id.clone()));
        assert_eq!(ids, vec!["A#run@root", "A#run@0", "A#run@1"]);
    }

    #[test]
    fn test_grouping_and_search_apply() {
        let mut center = MethodCall::new("Service", "handle");
        center.calls = (0..5)
            .map(|i| MethodCall::new("Dao", format!("query{}", i)))
            .collect();
        let tree = transform_call_graph(Some(&center));

        let grouped = group(
            &tree,
            GroupingOptions {
                enabled: true,
                expand_all: false,
            },
        );
        assert_eq!(grouped.children.len(), 1);
        assert!(grouped.children[0].is_group());
        assert_eq!(grouped.children[0].name, "Dao (5)");

        let hits = search(&grouped, "QUERY3");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "Dao#query3@3");
        assert_eq!(hits[0].index_path, vec![0, 3]);
    }
}
