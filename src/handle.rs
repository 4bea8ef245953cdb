//! JavaScript-facing wrapper around a `ViewSession`.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::api::{self, TableDetails};
use crate::layout::Controls;
use crate::session::{FetchTicket, QueryContext, QueryTicket, QueryOutcome, ViewError, ViewSession};

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

#[derive(Serialize)]
struct QueryStart {
    ticket: u32,
    request: api::TreeRequest,
}

/// One view instance. The host registers a surface callback that receives
/// each render frame as a JSON string.
#[wasm_bindgen]
#[derive(Default)]
pub struct ViewHandle {
    session: ViewSession,
    surface: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl ViewHandle {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ViewHandle {
        ViewHandle::default()
    }

    #[wasm_bindgen(js_name = "setSurface")]
    pub fn set_surface(&mut self, surface: js_sys::Function) {
        self.surface = Some(surface);
    }

    #[wasm_bindgen(js_name = "setContext")]
    pub fn set_context(
        &mut self,
        environment: &str,
        database: &str,
        bill_no: &str,
        tenant_id: Option<String>,
    ) {
        let context = QueryContext::new(environment, database, bill_no)
            .with_tenant(tenant_id.as_deref().unwrap_or_default());
        self.session.set_context(context);
    }

    /// Load a tree response body directly and render it.
    #[wasm_bindgen(js_name = "loadTree")]
    pub fn load_tree(&mut self, body: &str) -> Result<(), String> {
        let root = api::decode_tree_response(body).map_err(|e| e.to_string())?;
        self.session.load_raw(root.as_ref());
        self.render()
    }

    /// Load a call-graph response body and render it.
    #[wasm_bindgen(js_name = "loadCallGraph")]
    pub fn load_call_graph(&mut self, body: &str) -> Result<(), String> {
        let graph = api::decode_method_graph_response(body).map_err(|e| e.to_string())?;
        self.session.load_call_graph(graph.as_ref());
        self.render()
    }

    /// Start a tree query; returns `{ticket, request}` for the host to send.
    #[wasm_bindgen(js_name = "beginQuery")]
    pub fn begin_query(
        &mut self,
        environment: &str,
        database: &str,
        bill_no: &str,
        tenant_id: Option<String>,
    ) -> Result<String, String> {
        let context = QueryContext::new(environment, database, bill_no)
            .with_tenant(tenant_id.as_deref().unwrap_or_default());
        let (ticket, request) = self.session.begin_query(context);
        let ticket = u32::try_from(ticket.0).map_err(|e| e.to_string())?;
        to_json(&QueryStart { ticket, request })
    }

    /// Finish a tree query with the raw HTTP status and body. Status 0 stands
    /// for a request that never got a response.
    #[wasm_bindgen(js_name = "finishQuery")]
    pub fn finish_query(&mut self, ticket: u32, status: u16, body: &str) -> Result<String, String> {
        let result = api::check_status(status, body).and_then(|()| api::decode_tree_response(body));
        let outcome = self
            .session
            .finish_query(QueryTicket(u64::from(ticket)), result);
        if outcome != QueryOutcome::Stale {
            self.render()?;
        }
        to_json(&outcome)
    }

    pub fn search(&mut self, term: &str) -> Result<String, String> {
        let matches = to_json(&self.session.search(term))?;
        self.render()?;
        Ok(matches)
    }

    #[wasm_bindgen(js_name = "selectMatch")]
    pub fn select_match(&mut self, index: usize) -> Result<String, String> {
        let selected = to_json(&self.session.select_match(index))?;
        self.render()?;
        Ok(selected)
    }

    #[wasm_bindgen(js_name = "clearSearch")]
    pub fn clear_search(&mut self) -> Result<(), String> {
        self.session.clear_search();
        self.render()
    }

    /// Node click, or background click when `node_id` is absent.
    pub fn click(&mut self, node_id: Option<String>) -> Result<String, String> {
        to_json(&self.session.click(node_id.as_deref()))
    }

    /// Finish a detail fetch with the raw HTTP status and body. Returns the
    /// detail to show, or `null` when the click was superseded.
    #[wasm_bindgen(js_name = "completeDetail")]
    pub fn complete_detail(&mut self, ticket: u32, status: u16, body: &str) -> Result<String, String> {
        let result: Result<TableDetails, api::ApiError> =
            api::check_status(status, body).and_then(|()| api::decode_detail_response(body));
        let shown = self
            .session
            .complete_detail(FetchTicket(u64::from(ticket)), result)
            .map_err(|e| e.to_string())?;
        to_json(&shown)
    }

    #[wasm_bindgen(js_name = "clearDetailCache")]
    pub fn clear_detail_cache(&mut self) {
        self.session.clear_detail_cache();
    }

    #[wasm_bindgen(js_name = "setGrouping")]
    pub fn set_grouping(&mut self, enabled: bool) -> Result<(), String> {
        self.session.set_grouping(enabled);
        self.render()
    }

    /// Apply control panel values given as a (possibly partial) JSON object.
    #[wasm_bindgen(js_name = "applyControls")]
    pub fn apply_controls(&mut self, controls: &str) -> Result<(), String> {
        let controls = Controls::from_json(controls).map_err(|e| e.to_string())?;
        self.session.apply_controls(controls);
        self.render()
    }

    /// Series update for a zoom factor, to merge into the live chart.
    pub fn zoom(&self, factor: f64) -> Result<String, String> {
        to_json(&self.session.zoom(factor).series_update())
    }

    pub fn metrics(&self) -> Result<String, String> {
        to_json(self.session.metrics())
    }

    /// Current frame as JSON, without calling the surface.
    pub fn frame(&self) -> Result<String, String> {
        to_json(&self.session.frame())
    }

    /// Push the current frame to the surface.
    pub fn render(&self) -> Result<(), String> {
        self.render_frame().map_err(|e| e.to_string())
    }
}

impl ViewHandle {
    pub fn session(&self) -> &ViewSession {
        &self.session
    }

    fn render_frame(&self) -> Result<(), ViewError> {
        let Some(surface) = &self.surface else {
            return Err(ViewError::SurfaceUnavailable("no surface registered".to_string()));
        };
        let frame =
            serde_json::to_string(&self.session.frame()).map_err(ViewError::FrameEncoding)?;
        surface
            .call1(&JsValue::NULL, &JsValue::from_str(&frame))
            .map_err(|e| ViewError::SurfaceUnavailable(format!("{:?}", e)))?;
        Ok(())
    }
}
