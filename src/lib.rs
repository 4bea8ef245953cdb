pub mod api;
pub mod callgraph;
pub mod chart;
pub mod detail;
pub mod display;
pub mod grouping;
pub mod handle;
pub mod layout;
pub mod measure;
pub mod metrics;
pub mod placeholder;
pub mod raw;
pub mod resolve;
pub mod search;
pub mod session;
pub mod transform;

use wasm_bindgen::prelude::*;

use callgraph::MethodCall;
use display::DisplayNode;
use grouping::GroupingOptions;
use layout::Controls;
use metrics::TreeMetrics;
use raw::RawNode;

pub use handle::ViewHandle;
pub use session::{ViewError, ViewSession};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_tree(tree: &str) -> Result<DisplayNode, String> {
    DisplayNode::from_json(tree).map_err(|e| e.to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

/// Backend record tree (JSON, or `null`) to display tree JSON
#[wasm_bindgen(js_name = "transformToDisplayTree")]
pub fn transform_to_display_tree(raw: &str) -> Result<String, String> {
    let root: Option<RawNode> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    to_json(&transform::transform(root.as_ref()))
}

/// Call-graph data (JSON, or `null`) to display tree JSON
#[wasm_bindgen(js_name = "transformCallGraph")]
pub fn transform_call_graph(graph: &str) -> Result<String, String> {
    let graph: Option<MethodCall> = serde_json::from_str(graph).map_err(|e| e.to_string())?;
    to_json(&callgraph::transform_call_graph(graph.as_ref()))
}

#[wasm_bindgen(js_name = "applyGrouping")]
pub fn apply_grouping(tree: &str, enabled: bool, expand_all: Option<bool>) -> Result<String, String> {
    let tree = parse_tree(tree)?;
    let options = GroupingOptions {
        enabled,
        expand_all: expand_all.unwrap_or(false),
    };
    to_json(&grouping::group(&tree, options))
}

#[wasm_bindgen(js_name = "search")]
pub fn search_nodes(tree: &str, term: &str) -> Result<String, String> {
    to_json(&search::search(&parse_tree(tree)?, term))
}

#[wasm_bindgen(js_name = "highlightNode")]
pub fn highlight_node(tree: &str, id: &str) -> Result<String, String> {
    to_json(&search::highlight(&parse_tree(tree)?, id))
}

#[wasm_bindgen(js_name = "computeMetrics")]
pub fn compute_metrics(tree: &str) -> Result<String, String> {
    to_json(&TreeMetrics::analyze(&parse_tree(tree)?))
}

/// Control panel values (partial JSON accepted) to layout parameters
#[wasm_bindgen(js_name = "mapControls")]
pub fn map_controls(controls: &str) -> Result<String, String> {
    let controls = Controls::from_json(controls).map_err(|e| e.to_string())?;
    to_json(&controls.params())
}
