//! Render options for the host's tree chart.
//!
//! The host owns the charting library. This module only produces the JSON it
//! is fed: series data converted from the display tree, series-level layout
//! settings, and the partial update applied when the user zooms.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::display::{DisplayNode, Fill, LabelStyle, NodeKind};
use crate::layout::LayoutParams;
use crate::measure::TextMetrics;
use crate::metrics::TreeMetrics;

pub const FONT_FAMILY: &str = "Microsoft YaHei, Arial, sans-serif";
pub const BACKGROUND_COLOR: &str = "#303134";
const LABEL_COLOR: &str = "#e8eaed";
const LEAF_LABEL_COLOR: &str = "#d0d0d0";
const LINE_COLOR: &str = "#5f6368";
const LEAF_BORDER_COLOR: &str = "#8ab4f8";
const INITIAL_RIGHT_MARGIN: &str = "20%";
const BASE_SYMBOL_SIZE: f64 = 10.0;
const BASE_LABEL_DISTANCE: f64 = 10.0;

/// Where series spacing comes from: the tree's own metrics until the user
/// applies the control panel, the controls afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpacingSource {
    #[default]
    Metrics,
    Controls,
}

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub option: Value,
    /// CSS height of the chart container.
    pub container_height: String,
}

pub fn render_frame(
    tree: &DisplayNode,
    metrics: &TreeMetrics,
    params: &LayoutParams,
    source: SpacingSource,
) -> RenderFrame {
    RenderFrame {
        option: chart_option(tree, metrics, params, source),
        container_height: format!("{}vh", metrics.container_height_vh()),
    }
}

pub fn chart_option(
    tree: &DisplayNode,
    metrics: &TreeMetrics,
    params: &LayoutParams,
    source: SpacingSource,
) -> Value {
    let (right, curveness, force) = match source {
        SpacingSource::Metrics => (
            json!(INITIAL_RIGHT_MARGIN),
            metrics.initial_curveness(),
            json!({
                "repulsion": metrics.recommended_layer_padding * 0.5,
                "edgeLength": metrics.recommended_node_gap * 2.0,
                "gravity": 0.1,
                "layoutAnimation": metrics.animate_layout(),
            }),
        ),
        SpacingSource::Controls => (
            right_margin(tree, params),
            params.curveness,
            json!({
                "repulsion": params.repulsion,
                "edgeLength": params.edge_length,
                "gravity": 0.1,
                "layoutAnimation": true,
            }),
        ),
    };

    json!({
        "backgroundColor": BACKGROUND_COLOR,
        "tooltip": { "trigger": "item" },
        "series": [{
            "type": "tree",
            "data": [series_node(tree)],
            "top": "8%",
            "bottom": "8%",
            "left": "5%",
            "right": right,
            "layout": "orthogonal",
            "orient": "LR",
            "symbol": "emptyCircle",
            "symbolSize": metrics.symbol_size(),
            "initialTreeDepth": params.initial_tree_depth,
            "expandAndCollapse": params.expand_and_collapse,
            "roam": true,
            "scaleLimit": { "min": 0.3, "max": 5 },
            "emphasis": { "focus": "descendant" },
            "animationDuration": 550,
            "animationDurationUpdate": 750,
            "label": {
                "position": "right",
                "verticalAlign": "middle",
                "align": "left",
                "fontSize": params.font_size,
                "fontFamily": FONT_FAMILY,
                "color": LABEL_COLOR,
                "distance": params.label_distance,
            },
            "leaves": {
                "itemStyle": { "borderWidth": 1.2, "borderColor": LEAF_BORDER_COLOR },
                "label": {
                    "position": "right",
                    "verticalAlign": "middle",
                    "align": "left",
                    "fontSize": params.leaf_font_size,
                    "fontFamily": FONT_FAMILY,
                    "color": LEAF_LABEL_COLOR,
                    "distance": params.label_distance,
                },
            },
            "lineStyle": { "color": LINE_COLOR, "width": 1.2, "curveness": curveness },
            "itemStyle": { "borderWidth": 1.2 },
            "force": force,
        }],
    })
}

/// Percentage margin, or pixels when the viewport width is known so that the
/// widest label is never clipped.
fn right_margin(tree: &DisplayNode, params: &LayoutParams) -> Value {
    match params.viewport_width {
        Some(width) => {
            let widest =
                TextMetrics::default().widest_label(tree, params.font_size, params.leaf_font_size);
            json!(params.right_margin_px(width, widest))
        }
        None => json!(format!("{}%", params.right_margin_percent)),
    }
}

/// One node of series data. Group nodes carry `isGroup` and `collapsed`;
/// method nodes carry `className` and `value`.
pub fn series_node(node: &DisplayNode) -> Value {
    let mut out = Map::new();
    out.insert("name".into(), node.name.clone().into());
    out.insert("tableName".into(), node.table_name.clone().into());
    out.insert("id".into(), node.id.clone().into());
    out.insert(
        "itemStyle".into(),
        serde_json::to_value(&node.item_style).unwrap_or(Value::Null),
    );

    match &node.kind {
        NodeKind::Group { collapsed, .. } => {
            out.insert("isGroup".into(), true.into());
            out.insert("collapsed".into(), (*collapsed).into());
        }
        NodeKind::Method(info) => {
            out.insert("className".into(), info.class_name.clone().into());
            out.insert("value".into(), info.value.into());
        }
        NodeKind::Table | NodeKind::Placeholder => {}
    }
    if let Some(label) = &node.label {
        out.insert("label".into(), series_label(label));
    }
    if let Some(size) = node.symbol_size {
        out.insert("symbolSize".into(), size.into());
    }
    if let Some(offset) = node.layout_offset {
        out.insert("layoutOffset".into(), json!({ "x": offset.x, "y": offset.y }));
    }
    if let Some(curveness) = node.line_curveness {
        out.insert("lineStyle".into(), json!({ "curveness": curveness }));
    }

    out.insert(
        "children".into(),
        Value::Array(node.children.iter().map(series_node).collect()),
    );
    Value::Object(out)
}

fn series_label(label: &LabelStyle) -> Value {
    let mut out = Map::new();
    if let Some(color) = &label.color {
        out.insert("color".into(), color.clone().into());
    }
    out.insert(
        "fontWeight".into(),
        if label.bold { "bold" } else { "normal" }.into(),
    );
    if let Some(size) = label.font_size {
        out.insert("fontSize".into(), size.into());
    }
    match &label.background {
        Some(Fill::Solid(color)) => {
            out.insert("backgroundColor".into(), color.clone().into());
        }
        Some(Fill::Gradient { from, to }) => {
            out.insert(
                "backgroundColor".into(),
                json!({
                    "type": "linear",
                    "x": 0, "y": 0, "x2": 1, "y2": 0,
                    "colorStops": [
                        { "offset": 0, "color": from },
                        { "offset": 1, "color": to },
                    ],
                }),
            );
        }
        None => {}
    }
    if let Some([v, h]) = label.padding {
        out.insert("padding".into(), json!([v, h]));
    }
    if let Some(radius) = label.border_radius {
        out.insert("borderRadius".into(), radius.into());
    }
    if let Some(opacity) = label.opacity {
        out.insert("opacity".into(), opacity.into());
    }
    Value::Object(out)
}

/// Label and symbol restyling for a chart zoom factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomStyle {
    pub zoom: f64,
    pub scale: f64,
    pub symbol_size: f64,
    pub font_size: f64,
    pub leaf_font_size: f64,
    pub label_distance: f64,
    pub bold: bool,
    pub text_shadow: bool,
    pub bright: bool,
    pub label_background: bool,
}

impl ZoomStyle {
    pub fn at(zoom: f64, base_font_size: f64) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
        let scale = (zoom.powf(0.4) * 2.5).max(1.0);
        let leaf_base = base_font_size - 1.0;
        Self {
            zoom,
            scale,
            symbol_size: (BASE_SYMBOL_SIZE * scale.sqrt()).max(BASE_SYMBOL_SIZE),
            font_size: (base_font_size * scale).max(base_font_size),
            leaf_font_size: (leaf_base * scale).max(leaf_base),
            label_distance: (BASE_LABEL_DISTANCE * zoom.sqrt()).max(BASE_LABEL_DISTANCE),
            bold: zoom > 1.2,
            text_shadow: zoom > 1.2,
            bright: zoom > 1.5,
            label_background: zoom > 1.8,
        }
    }

    /// Partial series update merged into the current chart option.
    pub fn series_update(&self) -> Value {
        let weight = if self.bold { "bold" } else { "normal" };
        let shadow_color = if self.text_shadow { "rgba(0, 0, 0, 0.4)" } else { "transparent" };
        let shadow_blur = if self.text_shadow { 3.0 } else { 0.0 };
        let (background, padding) = if self.label_background {
            ("rgba(0, 0, 0, 0.2)", [2, 4, 2, 4])
        } else {
            ("transparent", [0, 0, 0, 0])
        };
        let line_width = if self.zoom > 1.5 {
            1.8
        } else if self.zoom > 1.2 {
            1.5
        } else {
            1.2
        };

        json!({
            "series": [{
                "symbolSize": self.symbol_size,
                "label": {
                    "fontSize": self.font_size,
                    "fontWeight": weight,
                    "fontFamily": FONT_FAMILY,
                    "distance": self.label_distance,
                    "textShadowColor": shadow_color,
                    "textShadowBlur": shadow_blur,
                    "color": if self.bright { "#ffffff" } else { LABEL_COLOR },
                    "backgroundColor": background,
                    "padding": padding,
                    "borderRadius": 3,
                },
                "leaves": {
                    "label": {
                        "fontSize": self.leaf_font_size,
                        "fontWeight": weight,
                        "fontFamily": FONT_FAMILY,
                        "distance": self.label_distance,
                        "textShadowColor": shadow_color,
                        "textShadowBlur": shadow_blur,
                        "color": if self.bright { "#f0f0f0" } else { LEAF_LABEL_COLOR },
                    },
                },
                "itemStyle": {
                    "borderWidth": if self.bright { 2.0 } else { 1.2 },
                    "shadowBlur": if self.bold { 6.0 } else { 0.0 },
                    "shadowColor": "rgba(30, 144, 255, 0.5)",
                },
                "lineStyle": {
                    "width": line_width,
                    "shadowBlur": if self.bright { 3.0 } else { 0.0 },
                    "shadowColor": "rgba(30, 144, 255, 0.3)",
                },
            }],
        })
    }
}
