use serde::{Deserialize, Serialize};

pub const SPACING_MIN: f64 = 0.0;
pub const SPACING_MAX: f64 = 500.0;
pub const FONT_MIN: f64 = 10.0;
pub const FONT_MAX: f64 = 20.0;

const RIGHT_MARGIN_PERCENT: (f64, f64) = (5.0, 40.0);

/// Raw values of the tree control panel. Missing fields take the panel's
/// initial values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Controls {
    pub node_spacing: f64,
    pub layer_spacing: f64,
    pub leaf_spacing: f64,
    pub font_size: f64,
    /// `None` leaves the choice to the tree's metrics.
    pub enable_grouping: Option<bool>,
    pub expand_all: bool,
    pub lock_collapse: bool,
    pub viewport_width: Option<f64>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            node_spacing: 60.0,
            layer_spacing: 180.0,
            leaf_spacing: 30.0,
            font_size: 13.0,
            enable_grouping: None,
            expand_all: true,
            lock_collapse: false,
            viewport_width: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutParams {
    pub right_margin_percent: f64,
    pub curveness: f64,
    pub repulsion: f64,
    pub edge_length: f64,
    pub label_distance: f64,
    pub font_size: f64,
    pub leaf_font_size: f64,
    /// -1 opens every level.
    pub initial_tree_depth: i32,
    pub expand_and_collapse: bool,
    pub leaf_spacing: f64,
    pub expand_all: bool,
    pub viewport_width: Option<f64>,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Controls::default().params()
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

impl Controls {
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Copy with every slider clamped to its range. Non-finite values reset
    /// to the default.
    pub fn clamped(&self) -> Self {
        let d = Self::default();
        Self {
            node_spacing: clamp_or(self.node_spacing, SPACING_MIN, SPACING_MAX, d.node_spacing),
            layer_spacing: clamp_or(self.layer_spacing, SPACING_MIN, SPACING_MAX, d.layer_spacing),
            leaf_spacing: clamp_or(self.leaf_spacing, SPACING_MIN, SPACING_MAX, d.leaf_spacing),
            font_size: clamp_or(self.font_size, FONT_MIN, FONT_MAX, d.font_size),
            viewport_width: self.viewport_width.filter(|w| w.is_finite() && *w > 0.0),
            ..self.clone()
        }
    }

    pub fn params(&self) -> LayoutParams {
        let c = self.clamped();
        let (lo, hi) = RIGHT_MARGIN_PERCENT;

        let curveness = if c.node_spacing < 50.0 {
            0.3
        } else if c.node_spacing > 80.0 {
            0.7
        } else {
            0.5
        };

        LayoutParams {
            right_margin_percent: (60.0 - c.node_spacing * 0.4).clamp(lo, hi),
            curveness,
            repulsion: c.layer_spacing * 0.5,
            edge_length: c.layer_spacing * 0.4,
            label_distance: (10.0 + (c.node_spacing - 60.0) * 0.1).max(0.0),
            font_size: c.font_size,
            leaf_font_size: c.font_size - 1.0,
            initial_tree_depth: if c.expand_all { -1 } else { 2 },
            expand_and_collapse: !c.lock_collapse,
            leaf_spacing: c.leaf_spacing,
            expand_all: c.expand_all,
            viewport_width: c.viewport_width,
        }
    }
}

impl LayoutParams {
    /// Right margin in pixels: the percentage of the viewport, widened so the
    /// longest label still fits.
    pub fn right_margin_px(&self, viewport_width: f64, widest_label: f64) -> f64 {
        (viewport_width * self.right_margin_percent / 100.0).max(widest_label + self.label_distance)
    }
}
