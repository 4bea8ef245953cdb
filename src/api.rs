//! Relation-tree and call-graph API boundary: envelopes, success codes,
//! request payloads.
//!
//! The network calls themselves belong to the host. This module only decodes
//! what comes back and builds what goes out.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::callgraph::MethodCall;
use crate::raw::RawNode;

/// Call-graph recursion depth asked for when none is given.
pub const DEFAULT_CALL_DEPTH: u32 = 3;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed with HTTP {status}: {body}")]
    Transport { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{message} (code {code})")]
    Application { code: ResponseCode, message: String },
    #[error("response carried no data")]
    MissingData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Tree,
    TableDetails,
    TableUpdate,
    DatabaseList,
    BillNoList,
    MethodGraph,
    MethodSearch,
    MethodDetails,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Tree => "/db-relation/tree",
            Self::TableDetails => "/db-relation/table-details",
            Self::TableUpdate => "/db-relation/table-update",
            Self::DatabaseList => "/db-relation/database-list",
            Self::BillNoList => "/db-relation/billno-list",
            Self::MethodGraph => "/code-graph/method",
            Self::MethodSearch => "/code-graph/search",
            Self::MethodDetails => "/code-graph/method-details",
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Self::DatabaseList
            | Self::BillNoList
            | Self::MethodGraph
            | Self::MethodSearch
            | Self::MethodDetails => "GET",
            _ => "POST",
        }
    }

    /// The update endpoint reports success as integer `200`; every other
    /// endpoint uses the string `"0000"`.
    pub fn is_success(self, code: &ResponseCode) -> bool {
        match (self, code) {
            (Self::TableUpdate, ResponseCode::Number(n)) => *n == 200,
            (Self::TableUpdate, ResponseCode::Text(_)) => false,
            (_, ResponseCode::Text(s)) => s == "0000",
            (_, ResponseCode::Number(_)) => false,
        }
    }

    fn default_failure(self) -> &'static str {
        match self {
            Self::Tree => "failed to load relation tree",
            Self::TableDetails => "failed to load table details",
            Self::TableUpdate => "failed to update table",
            Self::DatabaseList => "failed to load database list",
            Self::BillNoList => "failed to load bill number list",
            Self::MethodGraph => "failed to load method call graph",
            Self::MethodSearch => "failed to search methods",
            Self::MethodDetails => "failed to load method details",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseCode {
    Text(String),
    Number(i64),
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: ResponseCode,
    #[serde(default)]
    message: Option<String>,
    #[serde(default = "Option::default")]
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreePayload {
    #[serde(default)]
    root_node: Option<RawNode>,
}

/// Detail record for one table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDetails {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Turn a non-2xx HTTP status into a transport error.
pub fn check_status(status: u16, body: &str) -> Result<(), ApiError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(ApiError::Transport {
            status,
            body: body.to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<Option<T>, ApiError> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    if !endpoint.is_success(&envelope.code) {
        let message = envelope
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| endpoint.default_failure().to_string());
        return Err(ApiError::Application {
            code: envelope.code,
            message,
        });
    }
    Ok(envelope.data)
}

/// Decode a tree response. A missing root is a valid empty result.
pub fn decode_tree_response(body: &str) -> Result<Option<RawNode>, ApiError> {
    let payload: Option<TreePayload> = decode(Endpoint::Tree, body)?;
    Ok(payload.and_then(|p| p.root_node))
}

pub fn decode_detail_response(body: &str) -> Result<TableDetails, ApiError> {
    decode(Endpoint::TableDetails, body)?.ok_or(ApiError::MissingData)
}

pub fn decode_update_response(body: &str) -> Result<(), ApiError> {
    decode::<Value>(Endpoint::TableUpdate, body).map(|_| ())
}

pub fn decode_list_response(endpoint: Endpoint, body: &str) -> Result<Vec<String>, ApiError> {
    Ok(decode::<Vec<String>>(endpoint, body)?.unwrap_or_default())
}

/// Decode a call-graph response. A missing graph means the method was not
/// found.
pub fn decode_method_graph_response(body: &str) -> Result<Option<MethodCall>, ApiError> {
    decode(Endpoint::MethodGraph, body)
}

/// Method search hits are passed through as the backend sends them.
pub fn decode_method_search_response(body: &str) -> Result<Vec<Value>, ApiError> {
    Ok(decode::<Vec<Value>>(Endpoint::MethodSearch, body)?.unwrap_or_default())
}

pub fn decode_method_details_response(body: &str) -> Result<Map<String, Value>, ApiError> {
    decode(Endpoint::MethodDetails, body)?.ok_or(ApiError::MissingData)
}

/// Query parameters of a call-graph request. The host URL-encodes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodGraphQuery {
    pub class_name: String,
    pub method_name: String,
    pub depth: u32,
}

impl MethodGraphQuery {
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            depth: DEFAULT_CALL_DEPTH,
        }
    }

    /// `Class#method`, the form the backend logs and indexes methods under.
    pub fn class_method(&self) -> String {
        format!("{}#{}", self.class_name, self.method_name)
    }
}

/// Body of a relation-tree query. Database credentials are attached by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRequest {
    pub environment: String,
    pub db_name: String,
    pub bill_no: String,
    #[serde(rename = "ytenant_id")]
    pub tenant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRequest {
    pub environment: String,
    pub db_name: String,
    pub table_name: String,
    pub id: String,
    #[serde(rename = "ytenant_id")]
    pub tenant_id: String,
}
