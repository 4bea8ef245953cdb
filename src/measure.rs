use unicode_width::UnicodeWidthStr;

use crate::display::DisplayNode;

/// Label width estimate for a proportional font: each unicode column is a
/// fixed fraction of the font size. Wide (CJK) glyphs take two columns.
pub struct TextMetrics {
    pub column_ratio: f64,
    pub label_padding: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            column_ratio: 0.6,
            label_padding: 0.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let columns = UnicodeWidthStr::width(text);
        columns as f64 * font_size * self.column_ratio + self.label_padding
    }

    /// Widest label in the tree. Leaves are measured at `leaf_font_size`.
    pub fn widest_label(&self, tree: &DisplayNode, font_size: f64, leaf_font_size: f64) -> f64 {
        let mut widest: f64 = 0.0;
        tree.walk(&mut |node, _| {
            let size = if node.is_leaf() { leaf_font_size } else { font_size };
            widest = widest.max(self.text_width(&node.name, size));
        });
        widest
    }
}
