//! Node detail records and their cache.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::api::{DetailRequest, TableDetails};
use crate::display::{DisplayNode, NodeKind};
use crate::resolve::UNKNOWN_TABLE_LABEL;

/// Identity of a detail lookup. Two clicks with equal keys share one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetailKey {
    pub environment: String,
    pub database: String,
    pub table_name: String,
    pub id: String,
    pub tenant_id: String,
}

impl fmt::Display for DetailKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}_{}",
            self.environment, self.database, self.table_name, self.id, self.tenant_id
        )
    }
}

impl DetailKey {
    pub fn request(&self) -> DetailRequest {
        DetailRequest {
            environment: self.environment.clone(),
            db_name: self.database.clone(),
            table_name: self.table_name.clone(),
            id: self.id.clone(),
            tenant_id: self.tenant_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DetailSource {
    Cache,
    Network,
    /// Synthesized from a group node.
    Group,
    /// Node with no backing record.
    Navigation,
    /// Call-graph method; its own fields are the detail.
    Method,
    /// Fetch failed; only the node's own fields are shown.
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    pub table_name: String,
    pub data: Map<String, Value>,
    pub source: DetailSource,
}

impl NodeDetail {
    pub fn from_table(details: TableDetails, source: DetailSource) -> Self {
        Self {
            table_name: details.table_name,
            data: details.data,
            source,
        }
    }

    /// Summary of a group node. Returns `None` for any other node kind.
    pub fn group(node: &DisplayNode) -> Option<Self> {
        let NodeKind::Group { member_type, .. } = &node.kind else {
            return None;
        };
        let mut data = Map::new();
        data.insert("nodeType".into(), "group".into());
        data.insert("memberCount".into(), node.children.len().into());
        data.insert("name".into(), node.name.clone().into());
        Some(Self {
            table_name: member_type.clone(),
            data,
            source: DetailSource::Group,
        })
    }

    /// Fields of a call-graph method node. Returns `None` for any other node
    /// kind.
    pub fn method(node: &DisplayNode) -> Option<Self> {
        let NodeKind::Method(info) = &node.kind else {
            return None;
        };
        let mut data = Map::new();
        data.insert("methodName".into(), node.name.clone().into());
        data.insert("className".into(), info.class_name.clone().into());
        data.insert("value".into(), info.value.into());
        if let Some(params) = &info.params {
            data.insert("params".into(), params.clone());
        }
        if let Some(return_type) = &info.return_type {
            data.insert("returnType".into(), return_type.clone().into());
        }
        if let Some(file_path) = &info.file_path {
            data.insert("filePath".into(), file_path.clone().into());
        }
        Some(Self {
            table_name: info.class_name.clone(),
            data,
            source: DetailSource::Method,
        })
    }

    pub fn navigation(node: &DisplayNode) -> Self {
        let or_unknown = |s: &str, fallback: &str| {
            if s.is_empty() { fallback.to_string() } else { s.to_string() }
        };
        let mut data = Map::new();
        data.insert("id".into(), or_unknown(&node.id, "Unknown id").into());
        data.insert("name".into(), or_unknown(&node.name, "Unknown name").into());
        data.insert("nodeType".into(), "navigation".into());
        Self {
            table_name: or_unknown(&node.table_name, UNKNOWN_TABLE_LABEL),
            data,
            source: DetailSource::Navigation,
        }
    }

    pub fn fallback(node: &DisplayNode, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut data = Map::new();
        data.insert("id".into(), node.id.clone().into());
        data.insert("name".into(), node.name.clone().into());
        data.insert("error".into(), reason.clone().into());
        Self {
            table_name: node.table_name.clone(),
            data,
            source: DetailSource::Fallback { reason },
        }
    }
}

/// Detail records by key. Writes for the same key overwrite.
#[derive(Debug, Default)]
pub struct DetailCache {
    entries: HashMap<DetailKey, TableDetails>,
}

impl DetailCache {
    pub fn get(&self, key: &DetailKey) -> Option<&TableDetails> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: DetailKey, details: TableDetails) {
        self.entries.insert(key, details);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
