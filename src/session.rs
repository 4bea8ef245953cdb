//! View state for one relation-tree view.
//!
//! `ViewSession` owns the canonical display tree and every piece of state the
//! user manipulates: control values, search matches, the highlight target, the
//! node-detail cache and the outstanding fetches. It performs no I/O. A fetch
//! is handed to the host as a ticket plus a request payload, and the host
//! reports the result back with the same ticket. Tickets are issued in
//! increasing order, so a result can always be told apart from a newer one.

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::api::{ApiError, DetailRequest, TableDetails, TreeRequest};
use crate::callgraph::{MethodCall, transform_call_graph};
use crate::chart::{RenderFrame, SpacingSource, ZoomStyle, render_frame};
use crate::detail::{DetailCache, DetailKey, NodeDetail, DetailSource};
use crate::display::{DisplayNode, NodeKind};
use crate::grouping::{GroupingOptions, group};
use crate::layout::{Controls, LayoutParams, annotate_leaf_spacing};
use crate::metrics::TreeMetrics;
use crate::placeholder::placeholder_tree;
use crate::raw::RawNode;
use crate::search::{SearchMatch, highlight, search};
use crate::transform::{no_data_tree, transform};

pub const DEFAULT_TENANT: &str = "0";

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("invalid tree: {0}")]
    InvalidTree(#[from] serde_json::Error),
    #[error("unknown fetch ticket {0}")]
    UnknownTicket(u64),
    #[error("rendering surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("could not encode render frame: {0}")]
    FrameEncoding(#[source] serde_json::Error),
}

/// Which bill is being viewed, and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub environment: String,
    pub database: String,
    pub bill_no: String,
    pub tenant_id: String,
}

impl Default for QueryContext {
    fn default() -> Self {
        Self {
            environment: String::new(),
            database: String::new(),
            bill_no: String::new(),
            tenant_id: DEFAULT_TENANT.to_string(),
        }
    }
}

impl QueryContext {
    pub fn new(
        environment: impl Into<String>,
        database: impl Into<String>,
        bill_no: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            database: database.into(),
            bill_no: bill_no.into(),
            tenant_id: DEFAULT_TENANT.to_string(),
        }
    }

    /// Blank tenants fall back to the default tenant.
    pub fn with_tenant(mut self, tenant_id: &str) -> Self {
        let tenant_id = tenant_id.trim();
        self.tenant_id = if tenant_id.is_empty() {
            DEFAULT_TENANT.to_string()
        } else {
            tenant_id.to_string()
        };
        self
    }

    pub fn tree_request(&self) -> TreeRequest {
        TreeRequest {
            environment: self.environment.clone(),
            db_name: self.database.clone(),
            bill_no: self.bill_no.clone(),
            tenant_id: self.tenant_id.clone(),
        }
    }

    pub fn detail_key(&self, node: &DisplayNode) -> DetailKey {
        DetailKey {
            environment: self.environment.clone(),
            database: self.database.clone(),
            table_name: node.table_name.clone(),
            id: node.id.clone(),
            tenant_id: self.tenant_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FetchTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QueryTicket(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum DetailPhase {
    Idle,
    Loading(DetailKey),
    Cached,
    Fetched,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClickOutcome {
    /// Detail available now.
    Show { detail: NodeDetail },
    /// The host must fetch `request` and report back with `ticket`.
    Fetch {
        ticket: FetchTicket,
        request: DetailRequest,
    },
    /// A fetch for the same record is already out under `ticket`; its
    /// result will be shown.
    Pending { ticket: FetchTicket },
    /// Unknown node.
    Ignored,
    /// Background click; the detail panel closes.
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum QueryOutcome {
    Applied,
    /// Superseded by a newer query; nothing changed.
    Stale,
    /// The query failed and a placeholder tree is shown instead.
    Fallback { reason: String },
}

#[derive(Debug)]
struct InFlight {
    key: DetailKey,
    node: DisplayNode,
}

#[derive(Debug)]
pub struct ViewSession {
    canonical: DisplayNode,
    metrics: TreeMetrics,
    controls: Controls,
    params: LayoutParams,
    spacing_source: SpacingSource,
    grouping_override: Option<bool>,
    highlight_target: Option<String>,
    matches: Vec<SearchMatch>,
    context: QueryContext,
    next_ticket: u64,
    pending_query: Option<(QueryTicket, QueryContext)>,
    cache: DetailCache,
    in_flight: HashMap<FetchTicket, InFlight>,
    /// Fetch tickets below this were issued against a replaced tree.
    retired_below: u64,
    latest_click: Option<FetchTicket>,
    phase: DetailPhase,
    shown: Option<NodeDetail>,
}

impl Default for ViewSession {
    fn default() -> Self {
        let canonical = no_data_tree();
        let controls = Controls::default();
        Self {
            metrics: TreeMetrics::analyze(&canonical),
            canonical,
            params: controls.params(),
            controls,
            spacing_source: SpacingSource::Metrics,
            grouping_override: None,
            highlight_target: None,
            matches: Vec::new(),
            context: QueryContext::default(),
            next_ticket: 1,
            pending_query: None,
            cache: DetailCache::default(),
            in_flight: HashMap::new(),
            retired_below: 0,
            latest_click: None,
            phase: DetailPhase::Idle,
            shown: None,
        }
    }
}

impl ViewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context(context: QueryContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    // --- canonical tree ---

    /// Replace the canonical tree. Search and highlight state belong to the
    /// previous tree and are cleared, as is any open detail. Detail fetches
    /// still out are forgotten; their results are dropped on arrival.
    pub fn set_canonical(&mut self, tree: DisplayNode) {
        self.metrics = TreeMetrics::analyze(&tree);
        self.canonical = tree;
        self.clear_search();
        self.dismiss();
        if !self.in_flight.is_empty() {
            log::debug!("forgetting {} detail fetches for the old tree", self.in_flight.len());
            self.in_flight.clear();
        }
        self.retired_below = self.next_ticket;
        log::debug!(
            "canonical tree replaced: {} nodes, grouping {}",
            self.metrics.node_count,
            self.grouping_enabled()
        );
    }

    pub fn load_raw(&mut self, raw: Option<&RawNode>) {
        self.set_canonical(transform(raw));
    }

    /// Show a method call graph. A missing graph shows "method not found".
    pub fn load_call_graph(&mut self, graph: Option<&MethodCall>) {
        self.set_canonical(transform_call_graph(graph));
    }

    /// Load a record tree from JSON. A `null` document loads the "no data"
    /// tree.
    pub fn load_json(&mut self, input: &str) -> Result<(), ViewError> {
        let raw: Option<RawNode> = serde_json::from_str(input)?;
        self.load_raw(raw.as_ref());
        Ok(())
    }

    pub fn canonical(&self) -> &DisplayNode {
        &self.canonical
    }

    pub fn metrics(&self) -> &TreeMetrics {
        &self.metrics
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    pub fn set_context(&mut self, context: QueryContext) {
        self.context = context;
    }

    // --- controls ---

    /// Grouping follows the tree's metrics unless set explicitly.
    pub fn grouping_enabled(&self) -> bool {
        self.grouping_override
            .unwrap_or_else(|| self.metrics.suggests_grouping())
    }

    pub fn set_grouping(&mut self, enabled: bool) {
        self.grouping_override = Some(enabled);
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Take new control panel values. From here on series spacing follows the
    /// controls rather than the tree metrics.
    pub fn apply_controls(&mut self, controls: Controls) {
        self.controls = controls.clamped();
        self.params = self.controls.params();
        if let Some(enabled) = self.controls.enable_grouping {
            self.grouping_override = Some(enabled);
        }
        self.spacing_source = SpacingSource::Controls;
    }

    // --- pipeline ---

    /// Grouping, expand-all and leaf spacing, without highlighting. Search
    /// and click lookups run against this view.
    fn base_view(&self) -> DisplayNode {
        let mut view = group(
            &self.canonical,
            GroupingOptions {
                enabled: self.grouping_enabled(),
                expand_all: self.params.expand_all,
            },
        );
        if self.params.expand_all {
            view.expand_all();
        }
        annotate_leaf_spacing(&mut view, self.params.leaf_spacing);
        view
    }

    /// The tree to render, always derived afresh from the canonical tree.
    /// Groups above a highlighted node are opened so the node is visible.
    pub fn apply_pipeline(&self) -> DisplayNode {
        let view = self.base_view();
        log::debug!(
            "pipeline applied (grouping {}, highlight {:?})",
            self.grouping_enabled(),
            self.highlight_target
        );
        match &self.highlight_target {
            Some(target) => {
                let mut lit = highlight(&view, target);
                lit.reveal(target);
                lit
            }
            None => view,
        }
    }

    pub fn frame(&self) -> RenderFrame {
        render_frame(
            &self.apply_pipeline(),
            &self.metrics,
            &self.params,
            self.spacing_source,
        )
    }

    pub fn zoom(&self, factor: f64) -> ZoomStyle {
        ZoomStyle::at(factor, self.params.font_size)
    }

    // --- search ---

    /// Search the current view and highlight the best match. A blank term
    /// clears the search.
    pub fn search(&mut self, term: &str) -> &[SearchMatch] {
        if term.trim().is_empty() {
            self.clear_search();
            return &self.matches;
        }
        self.matches = search(&self.base_view(), term);
        self.highlight_target = self.matches.first().map(|m| m.id.clone());
        log::debug!("search {:?}: {} matches", term, self.matches.len());
        &self.matches
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    /// Highlight the `index`-th match of the last search.
    pub fn select_match(&mut self, index: usize) -> Option<&SearchMatch> {
        let found = self.matches.get(index)?;
        self.highlight_target = Some(found.id.clone());
        Some(found)
    }

    pub fn highlight_target(&self) -> Option<&str> {
        self.highlight_target.as_deref()
    }

    pub fn clear_search(&mut self) {
        self.matches.clear();
        self.highlight_target = None;
    }

    // --- node detail ---

    /// Handle a click on the node with `node_id`, or on the background when
    /// `None`.
    pub fn click(&mut self, node_id: Option<&str>) -> ClickOutcome {
        let Some(node_id) = node_id else {
            self.dismiss();
            return ClickOutcome::Dismissed;
        };
        let view = self.base_view();
        let Some(node) = view.find(node_id) else {
            log::debug!("click on unknown node {:?}", node_id);
            return ClickOutcome::Ignored;
        };

        if let Some(detail) = NodeDetail::group(node).or_else(|| NodeDetail::method(node)) {
            return self.show(detail, DetailPhase::Idle);
        }
        if node.kind == NodeKind::Placeholder || node.table_name.is_empty() {
            return self.show(NodeDetail::navigation(node), DetailPhase::Idle);
        }

        let key = self.context.detail_key(node);
        if let Some(details) = self.cache.get(&key) {
            let detail = NodeDetail::from_table(details.clone(), DetailSource::Cache);
            return self.show(detail, DetailPhase::Cached);
        }
        let pending = self
            .in_flight
            .iter()
            .find(|(_, f)| f.key == key)
            .map(|(ticket, _)| *ticket);
        if let Some(ticket) = pending {
            self.latest_click = Some(ticket);
            self.phase = DetailPhase::Loading(key);
            return ClickOutcome::Pending { ticket };
        }

        let ticket = FetchTicket(self.issue_ticket());
        let request = key.request();
        self.in_flight.insert(
            ticket,
            InFlight {
                key: key.clone(),
                node: node.shallow(),
            },
        );
        self.latest_click = Some(ticket);
        self.phase = DetailPhase::Loading(key);
        ClickOutcome::Fetch { ticket, request }
    }

    /// Report the result of a detail fetch. Successful results are always
    /// cached; only the most recent click's result is shown. Returns the
    /// detail to display, if any.
    pub fn complete_detail(
        &mut self,
        ticket: FetchTicket,
        result: Result<TableDetails, ApiError>,
    ) -> Result<Option<NodeDetail>, ViewError> {
        let Some(flight) = self.in_flight.remove(&ticket) else {
            if ticket.0 < self.retired_below {
                log::info!("dropping detail for fetch {} from a replaced tree", ticket.0);
                return Ok(None);
            }
            return Err(ViewError::UnknownTicket(ticket.0));
        };
        let current = self.latest_click == Some(ticket);

        let (detail, phase) = match result {
            Ok(details) => {
                self.cache.insert(flight.key, details.clone());
                (
                    NodeDetail::from_table(details, DetailSource::Network),
                    DetailPhase::Fetched,
                )
            }
            Err(err) => {
                log::warn!("detail fetch for {} failed: {}", flight.node.id, err);
                (
                    NodeDetail::fallback(&flight.node, err.to_string()),
                    DetailPhase::Failed,
                )
            }
        };

        if !current {
            log::info!("dropping detail for superseded click {}", ticket.0);
            return Ok(None);
        }
        self.latest_click = None;
        self.phase = phase;
        self.shown = Some(detail.clone());
        Ok(Some(detail))
    }

    /// Close the detail panel. Fetches still out are cached on arrival but
    /// not shown.
    pub fn dismiss(&mut self) {
        self.shown = None;
        self.latest_click = None;
        self.phase = DetailPhase::Idle;
    }

    pub fn clear_detail_cache(&mut self) {
        self.cache.clear();
    }

    pub fn detail_phase(&self) -> &DetailPhase {
        &self.phase
    }

    pub fn shown_detail(&self) -> Option<&NodeDetail> {
        self.shown.as_ref()
    }

    pub fn cached_details(&self) -> usize {
        self.cache.len()
    }

    fn show(&mut self, detail: NodeDetail, phase: DetailPhase) -> ClickOutcome {
        self.latest_click = None;
        self.phase = phase;
        self.shown = Some(detail.clone());
        ClickOutcome::Show { detail }
    }

    // --- tree query ---

    /// Start a tree query. Any earlier query still out becomes stale.
    pub fn begin_query(&mut self, context: QueryContext) -> (QueryTicket, TreeRequest) {
        let ticket = QueryTicket(self.issue_ticket());
        let request = context.tree_request();
        self.pending_query = Some((ticket, context));
        (ticket, request)
    }

    pub fn finish_query(
        &mut self,
        ticket: QueryTicket,
        result: Result<Option<RawNode>, ApiError>,
    ) -> QueryOutcome {
        let context = match self.pending_query.take() {
            Some((pending, context)) if pending == ticket => context,
            other => {
                self.pending_query = other;
                log::info!("dropping response for stale query {}", ticket.0);
                return QueryOutcome::Stale;
            }
        };

        let bill_no = context.bill_no.clone();
        self.context = context;
        match result {
            Ok(raw) => {
                self.load_raw(raw.as_ref());
                QueryOutcome::Applied
            }
            Err(err) => {
                log::warn!("tree query for {:?} failed, showing placeholder: {}", bill_no, err);
                self.set_canonical(placeholder_tree(&bill_no));
                QueryOutcome::Fallback {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn issue_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResponseCode;
    use crate::transform::NO_DATA_LABEL;
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    fn item(id: &str) -> RawNode {
        RawNode::new("billitem_base", id).with_field("cName", format!("item{}", id))
    }

    /// Bill with one entity holding `items` fields, and a toolbar.
    fn bill(items: usize) -> RawNode {
        let mut entity = RawNode::new("billentity_base", "e1").with_field("cName", "Header");
        for i in 0..items {
            entity = entity.with_child(item(&format!("i{}", i)));
        }
        RawNode::new("bill_base", "b1")
            .with_field("cBillNo", "BN001")
            .with_field("cName", "Test")
            .with_child(entity)
            .with_child(RawNode::new("bill_toolbar", "t1").with_field("name", "Main toolbar"))
    }

    fn session_with(raw: &RawNode) -> ViewSession {
        let mut session = ViewSession::with_context(QueryContext::new("test", "meta", "BN001"));
        session.load_raw(Some(raw));
        session
    }

    fn details(table: &str, name: &str) -> TableDetails {
        let mut data = Map::new();
        data.insert("cName".into(), name.into());
        TableDetails {
            table_name: table.to_string(),
            data,
        }
    }

    fn fetch_ticket(outcome: ClickOutcome) -> FetchTicket {
        match outcome {
            ClickOutcome::Fetch { ticket, .. } => ticket,
            other => panic!("expected a fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_new_session_shows_no_data() {
        let session = ViewSession::new();
        let view = session.apply_pipeline();
        assert_eq!(view.name, NO_DATA_LABEL);
        assert_eq!(view.kind, NodeKind::Placeholder);
        assert_eq!(session.metrics().node_count, 0);
    }

    #[test]
    fn test_grouping_seeded_from_metrics() {
        let small = session_with(&bill(5));
        assert!(!small.grouping_enabled());
        assert_eq!(small.apply_pipeline().children[0].children.len(), 5);

        let large = session_with(&bill(60));
        assert!(large.grouping_enabled());
        let view = large.apply_pipeline();
        assert!(view.children[0].children[0].is_group());

        let mut forced = session_with(&bill(60));
        forced.set_grouping(false);
        assert!(!forced.apply_pipeline().children[0].children[0].is_group());
    }

    #[test]
    fn test_pipeline_derived_from_canonical() {
        let mut session = session_with(&bill(60));
        let canonical = session.canonical().clone();
        session.search("item1");

        let first = session.apply_pipeline();
        let second = session.apply_pipeline();
        assert_eq!(first, second);
        assert_eq!(session.canonical(), &canonical);
    }

    #[test]
    fn test_expand_all_controls_collapse() {
        let mut session = session_with(&bill(60));
        let collapsed = |view: &DisplayNode| match &view.children[0].children[0].kind {
            NodeKind::Group { collapsed, .. } => *collapsed,
            other => panic!("expected a group, got {:?}", other),
        };
        // The panel starts with expand-all on.
        assert!(!collapsed(&session.apply_pipeline()));

        session.apply_controls(Controls {
            expand_all: false,
            ..Controls::default()
        });
        assert!(collapsed(&session.apply_pipeline()));
        assert_eq!(session.params().initial_tree_depth, 2);
    }

    #[test]
    fn test_search_opens_groups_above_target() {
        let mut session = session_with(&bill(60));
        session.apply_controls(Controls {
            expand_all: false,
            ..Controls::default()
        });
        let paths: Vec<Vec<usize>> = session
            .search("itemi42")
            .iter()
            .map(|m| m.index_path.clone())
            .collect();
        assert_eq!(paths, vec![vec![0, 0, 42]]);

        let view = session.apply_pipeline();
        assert!(matches!(
            view.children[0].children[0].kind,
            NodeKind::Group { member_count: 60, collapsed: false, .. }
        ));
        let target = view.at_path(&[0, 0, 42]).unwrap();
        assert_eq!(target.id, "i42");
        assert_eq!(target.item_style.color, "#ffcc00");

        session.clear_search();
        assert!(matches!(
            session.apply_pipeline().children[0].children[0].kind,
            NodeKind::Group { collapsed: true, .. }
        ));
    }

    #[test]
    fn test_controls_leaf_spacing_and_grouping() {
        let mut session = session_with(&bill(5));
        session.apply_controls(Controls {
            leaf_spacing: 80.0,
            enable_grouping: Some(true),
            ..Controls::default()
        });
        assert!(session.grouping_enabled());

        let view = session.apply_pipeline();
        let group = &view.children[0].children[0];
        assert!(group.is_group());
        assert_eq!(group.children[0].layout_offset.map(|o| o.y), Some(-10.0));
    }

    #[test]
    fn test_search_highlights_first_match() {
        let mut session = session_with(&bill(3));
        let ids: Vec<String> = session.search("TOOLBAR").iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec!["t1"]);
        assert_eq!(session.highlight_target(), Some("t1"));

        let view = session.apply_pipeline();
        assert_eq!(view.find("t1").unwrap().item_style.color, "#ffcc00");
        assert_eq!(view.item_style.color, "#999999");
    }

    #[test]
    fn test_search_ranks_shallow_first_and_selects() {
        let mut session = session_with(&bill(3));
        // "b" hits the bill (depth 0), the toolbar (depth 1) and every item's table name.
        let depths: Vec<usize> = session.search("b").iter().map(|m| m.depth).collect();
        assert_eq!(depths.first(), Some(&0));
        assert!(depths.windows(2).all(|w| w[0] <= w[1]));

        let picked = session.select_match(1).map(|m| m.id.clone());
        assert_eq!(session.highlight_target(), picked.as_deref());
        assert!(session.select_match(99).is_none());
    }

    #[test]
    fn test_blank_search_restores_plain_view() {
        let mut session = session_with(&bill(3));
        let plain = session.apply_pipeline();
        session.search("item");
        assert_ne!(session.apply_pipeline(), plain);

        assert!(session.search("  ").is_empty());
        assert_eq!(session.highlight_target(), None);
        assert_eq!(session.apply_pipeline(), plain);
    }

    #[test]
    fn test_new_tree_clears_search() {
        let mut session = session_with(&bill(3));
        session.search("toolbar");
        session.load_raw(Some(&bill(4)));
        assert!(session.matches().is_empty());
        assert_eq!(session.highlight_target(), None);
    }

    #[test]
    fn test_no_match_clears_highlight() {
        let mut session = session_with(&bill(3));
        session.search("toolbar");
        assert!(session.search("zzz").is_empty());
        assert_eq!(session.highlight_target(), None);
    }

    #[test]
    fn test_click_fetch_then_cache_hit() {
        let mut session = session_with(&bill(3));

        let ticket = match session.click(Some("t1")) {
            ClickOutcome::Fetch { ticket, request } => {
                assert_eq!(request.table_name, "bill_toolbar");
                assert_eq!(request.tenant_id, DEFAULT_TENANT);
                ticket
            }
            other => panic!("expected a fetch, got {:?}", other),
        };
        assert!(matches!(session.detail_phase(), DetailPhase::Loading(_)));

        let shown = session
            .complete_detail(ticket, Ok(details("bill_toolbar", "Main toolbar")))
            .unwrap()
            .unwrap();
        assert_eq!(shown.source, DetailSource::Network);
        assert_eq!(session.detail_phase(), &DetailPhase::Fetched);

        // Second click is served from the cache without a fetch.
        match session.click(Some("t1")) {
            ClickOutcome::Show { detail } => {
                assert_eq!(detail.source, DetailSource::Cache);
                assert_eq!(detail.data["cName"], "Main toolbar");
            }
            other => panic!("expected cached detail, got {:?}", other),
        }
        assert_eq!(session.detail_phase(), &DetailPhase::Cached);
    }

    #[test]
    fn test_same_node_click_while_loading_joins_fetch() {
        let mut session = session_with(&bill(3));
        let ticket = fetch_ticket(session.click(Some("t1")));
        assert_eq!(session.click(Some("t1")), ClickOutcome::Pending { ticket });
    }

    #[test]
    fn test_reclick_after_other_node_shows_reclicked() {
        let mut session = session_with(&bill(3));
        let first = fetch_ticket(session.click(Some("i0")));
        let second = fetch_ticket(session.click(Some("i1")));
        assert_eq!(
            session.click(Some("i0")),
            ClickOutcome::Pending { ticket: first }
        );

        let late = session
            .complete_detail(second, Ok(details("billitem_base", "item i1")))
            .unwrap();
        assert_eq!(late, None);
        assert!(matches!(session.detail_phase(), DetailPhase::Loading(_)));

        let shown = session
            .complete_detail(first, Ok(details("billitem_base", "item i0")))
            .unwrap()
            .unwrap();
        assert_eq!(shown.data["cName"], "item i0");
        assert_eq!(
            session.shown_detail().map(|d| d.data["cName"].clone()),
            Some("item i0".into())
        );
        assert_eq!(session.cached_details(), 2);
    }

    #[test]
    fn test_reclick_after_dismiss_shows_result() {
        let mut session = session_with(&bill(3));
        let ticket = fetch_ticket(session.click(Some("i0")));
        assert_eq!(session.click(None), ClickOutcome::Dismissed);
        assert_eq!(session.detail_phase(), &DetailPhase::Idle);

        assert_eq!(session.click(Some("i0")), ClickOutcome::Pending { ticket });
        assert!(matches!(session.detail_phase(), DetailPhase::Loading(_)));

        let shown = session
            .complete_detail(ticket, Ok(details("billitem_base", "item i0")))
            .unwrap();
        assert!(shown.is_some());
        assert_eq!(session.detail_phase(), &DetailPhase::Fetched);
    }

    #[test]
    fn test_replaced_tree_forgets_fetches() {
        let mut session = session_with(&bill(3));
        let old = fetch_ticket(session.click(Some("t1")));

        // Same record in the new tree: a fresh fetch, not a join.
        session.load_raw(Some(&bill(3)));
        let new = fetch_ticket(session.click(Some("t1")));
        assert!(new > old);

        let late = session
            .complete_detail(old, Ok(details("bill_toolbar", "old")))
            .unwrap();
        assert_eq!(late, None);
        assert_eq!(session.cached_details(), 0);

        let shown = session
            .complete_detail(new, Ok(details("bill_toolbar", "new")))
            .unwrap()
            .unwrap();
        assert_eq!(shown.data["cName"], "new");
    }

    #[test]
    fn test_latest_click_wins() {
        let mut session = session_with(&bill(3));
        let slow = fetch_ticket(session.click(Some("i0")));
        let fast = fetch_ticket(session.click(Some("i1")));
        assert!(fast > slow);

        let shown = session
            .complete_detail(fast, Ok(details("billitem_base", "item i1")))
            .unwrap();
        assert!(shown.is_some());

        // The older response arrives late: cached, not displayed.
        let late = session
            .complete_detail(slow, Ok(details("billitem_base", "item i0")))
            .unwrap();
        assert_eq!(late, None);
        assert_eq!(
            session.shown_detail().map(|d| d.data["cName"].clone()),
            Some("item i1".into())
        );
        assert_eq!(session.cached_details(), 2);
    }

    #[test]
    fn test_failed_fetch_falls_back_to_node_fields() {
        let mut session = session_with(&bill(3));
        let ticket = fetch_ticket(session.click(Some("i2")));
        let err = ApiError::Application {
            code: ResponseCode::Text("5001".to_string()),
            message: "record locked".to_string(),
        };

        let shown = session.complete_detail(ticket, Err(err)).unwrap().unwrap();
        assert_eq!(shown.data["id"], "i2");
        assert_eq!(shown.data["name"], "itemi2");
        assert!(matches!(shown.source, DetailSource::Fallback { .. }));
        assert_eq!(session.detail_phase(), &DetailPhase::Failed);
        assert_eq!(session.cached_details(), 0);

        // A failure is not cached; the next click fetches again.
        assert!(matches!(session.click(Some("i2")), ClickOutcome::Fetch { .. }));
    }

    #[test]
    fn test_unknown_ticket() {
        let mut session = session_with(&bill(3));
        let result = session.complete_detail(FetchTicket(42), Ok(TableDetails::default()));
        assert!(matches!(result, Err(ViewError::UnknownTicket(42))));
    }

    #[test]
    fn test_clear_detail_cache() {
        let mut session = session_with(&bill(3));
        let ticket = fetch_ticket(session.click(Some("t1")));
        session
            .complete_detail(ticket, Ok(details("bill_toolbar", "x")))
            .unwrap();
        session.clear_detail_cache();
        assert!(matches!(session.click(Some("t1")), ClickOutcome::Fetch { .. }));
    }

    #[test]
    fn test_cache_keyed_by_context() {
        let mut session = session_with(&bill(3));
        let ticket = fetch_ticket(session.click(Some("t1")));
        session
            .complete_detail(ticket, Ok(details("bill_toolbar", "x")))
            .unwrap();

        session.set_context(QueryContext::new("test", "meta", "BN001").with_tenant("77"));
        assert!(matches!(session.click(Some("t1")), ClickOutcome::Fetch { .. }));
    }

    #[test]
    fn test_group_and_background_clicks() {
        let mut session = session_with(&bill(60));
        let group_id = session.apply_pipeline().children[0].children[0].id.clone();

        match session.click(Some(&group_id)) {
            ClickOutcome::Show { detail } => {
                assert_eq!(detail.table_name, "billitem_base");
                assert_eq!(detail.data["memberCount"], 60);
            }
            other => panic!("expected group detail, got {:?}", other),
        }
        assert!(session.shown_detail().is_some());

        assert_eq!(session.click(None), ClickOutcome::Dismissed);
        assert!(session.shown_detail().is_none());
        assert_eq!(session.click(Some("nope")), ClickOutcome::Ignored);
    }

    #[test]
    fn test_dismissed_fetch_not_shown() {
        let mut session = session_with(&bill(3));
        let ticket = fetch_ticket(session.click(Some("t1")));
        session.click(None);
        let late = session
            .complete_detail(ticket, Ok(details("bill_toolbar", "x")))
            .unwrap();
        assert_eq!(late, None);
        assert_eq!(session.cached_details(), 1);
    }

    #[test]
    fn test_call_graph_click_shows_method_fields() {
        let mut center = MethodCall::new("OrderService", "submit");
        center.called_by = vec![MethodCall::new("OrderController", "post")];
        let mut session = ViewSession::new();
        session.load_call_graph(Some(&center));
        assert_eq!(session.metrics().node_count, 2);

        match session.click(Some("OrderController#post@0")) {
            ClickOutcome::Show { detail } => {
                assert_eq!(detail.source, DetailSource::Method);
                assert_eq!(detail.data["className"], "OrderController");
            }
            other => panic!("expected method detail, got {:?}", other),
        }
        assert_eq!(session.cached_details(), 0);

        session.load_call_graph(None);
        assert_eq!(session.canonical().kind, NodeKind::Placeholder);
    }

    #[test]
    fn test_placeholder_click_is_navigation() {
        let mut session = ViewSession::new();
        // The "no data" node has no id; look it up by its empty id.
        match session.click(Some("")) {
            ClickOutcome::Show { detail } => assert_eq!(detail.source, DetailSource::Navigation),
            other => panic!("expected navigation detail, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_query_dropped() {
        let mut session = ViewSession::new();
        let (first, _) = session.begin_query(QueryContext::new("test", "meta", "BN001"));
        let (second, request) = session.begin_query(QueryContext::new("test", "meta", "BN002"));
        assert_eq!(request.bill_no, "BN002");

        assert_eq!(session.finish_query(first, Ok(Some(bill(3)))), QueryOutcome::Stale);
        assert_eq!(session.canonical().kind, NodeKind::Placeholder);

        assert_eq!(session.finish_query(second, Ok(Some(bill(4)))), QueryOutcome::Applied);
        assert_eq!(session.context().bill_no, "BN002");
        assert_eq!(session.metrics().node_count, 7);

        // A repeated delivery of the finished query is stale too.
        assert_eq!(session.finish_query(second, Ok(None)), QueryOutcome::Stale);
    }

    #[test]
    fn test_failed_query_shows_placeholder() {
        let mut session = ViewSession::new();
        let (ticket, _) = session.begin_query(QueryContext::new("test", "meta", "BN404"));
        let outcome = session.finish_query(
            ticket,
            Err(ApiError::Transport {
                status: 502,
                body: "bad gateway".to_string(),
            }),
        );
        assert!(matches!(outcome, QueryOutcome::Fallback { .. }));
        assert_eq!(session.canonical().name, "BN404 Bill basics");
    }

    #[test]
    fn test_empty_query_result() {
        let mut session = ViewSession::new();
        let (ticket, _) = session.begin_query(QueryContext::new("test", "meta", "BN001"));
        assert_eq!(session.finish_query(ticket, Ok(None)), QueryOutcome::Applied);
        assert_eq!(session.canonical().name, NO_DATA_LABEL);
    }

    #[test]
    fn test_load_json() {
        let mut session = ViewSession::new();
        session
            .load_json(r#"{"tableName":"bill_base","id":1,"cBillNo":"BN001","cName":"Test","children":[]}"#)
            .unwrap();
        assert_eq!(session.canonical().name, "BN001 Test");

        session.load_json("null").unwrap();
        assert_eq!(session.canonical().kind, NodeKind::Placeholder);

        assert!(matches!(session.load_json(r#""just text""#), Err(ViewError::InvalidTree(_))));
    }

    #[test]
    fn test_frame_and_zoom() {
        let session = session_with(&bill(3));
        let frame = session.frame();
        assert_eq!(frame.option["series"][0]["right"], "20%");
        assert_eq!(session.zoom(0.5).font_size, session.params().font_size * session.zoom(0.5).scale);
    }
}
