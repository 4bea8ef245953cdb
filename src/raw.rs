//! Backend record tree as returned by the relation-tree endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One record in the backend relation tree.
///
/// Entity-specific columns (`cBillNo`, `cName`, `itemTitle`, ...) may arrive
/// either inside `attributes` or flattened next to `tableName`; both places
/// are kept so name resolution can consult them in that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    #[serde(default, deserialize_with = "null_as_default")]
    pub table_name: String,
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<RawNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawNode {
    pub fn new(table_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    /// Parse a single record (with its subtree) from JSON.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Builder helper: set a top-level entity field.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Builder helper: set an entry in `attributes`.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Look up an entity field as text: `attributes` first, then top-level.
    /// Empty strings and non-scalar values count as missing.
    pub fn field(&self, key: &str) -> Option<String> {
        self.attributes
            .get(key)
            .and_then(value_text)
            .or_else(|| self.fields.get(key).and_then(value_text))
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend ids are strings, but numeric primary keys leak through unquoted.
fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
