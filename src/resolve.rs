//! Display labels and colors per type-tag.

use crate::raw::RawNode;

pub const DEFAULT_COLOR: &str = "#E8EAED";
pub const DEFAULT_GROUP_COLOR: &str = "#5470c6";
pub const UNKNOWN_TABLE_LABEL: &str = "Unknown table";

/// How a type-tag's label is assembled from entity fields.
#[derive(Debug, Clone, Copy)]
enum NameRule {
    /// Space-joined fields; falls back to the type-tag when all are missing.
    Joined(&'static [&'static str]),
    /// Single field with a fixed fallback label.
    Single(&'static str, &'static str),
}

struct TableStyle {
    table: &'static str,
    rule: NameRule,
    color: &'static str,
}

const TABLE_STYLES: &[TableStyle] = &[
    TableStyle {
        table: "bill_base",
        rule: NameRule::Joined(&["cBillNo", "cName"]),
        color: "#F28B82",
    },
    TableStyle {
        table: "billentity_base",
        rule: NameRule::Single("cName", "Entity"),
        color: "#FBBC04",
    },
    TableStyle {
        table: "billtemplate_base",
        rule: NameRule::Single("cName", "Template"),
        color: "#FAD166",
    },
    TableStyle {
        table: "billtplgroup_base",
        rule: NameRule::Joined(&["ccode", "cName"]),
        color: "#E8EAED",
    },
    TableStyle {
        table: "billitem_base",
        rule: NameRule::Joined(&["cName", "cShowCaption"]),
        color: "#A142F4",
    },
    TableStyle {
        table: "bill_toolbar",
        rule: NameRule::Single("name", "Toolbar"),
        color: "#8AB4F8",
    },
    TableStyle {
        table: "bill_toolbaritem",
        rule: NameRule::Single("name", "Toolbar item"),
        color: "#81C995",
    },
    TableStyle {
        table: "bill_command",
        rule: NameRule::Single("name", "Command"),
        color: "#F6AEA9",
    },
    TableStyle {
        table: "pb_meta_filters",
        rule: NameRule::Single("filterDesc", "Filter area"),
        color: "#C58AF9",
    },
    TableStyle {
        table: "pb_meta_filter_item",
        rule: NameRule::Single("itemTitle", "Filter item"),
        color: "#F8BD88",
    },
    TableStyle {
        table: "pb_filter_solution",
        rule: NameRule::Single("solutionName", "Filter solution"),
        color: "#AECBFA",
    },
    TableStyle {
        table: "pb_filter_solution_common",
        rule: NameRule::Single("itemTitle", "Common filter solution"),
        color: "#CEEAD6",
    },
];

const GROUP_COLORS: &[(&str, &str)] = &[
    ("bill_base", "#4682B4"),
    ("billentity_base", "#6A5ACD"),
    ("billtemplate_base", "#1E90FF"),
    ("billtplgroup_base", "#4169E1"),
    ("billitem_base", "#00CED1"),
    ("bill_toolbar", "#20B2AA"),
    ("pb_meta_filters", "#8FBC8F"),
    ("meta_component", "#FF7F50"),
    ("meta_elements", "#FF8C00"),
    ("billtpl_comp", "#9370DB"),
    ("metadata", "#3CB371"),
];

fn lookup(table_name: &str) -> Option<&'static TableStyle> {
    TABLE_STYLES.iter().find(|s| s.table == table_name)
}

fn table_fallback(table_name: &str) -> String {
    if table_name.is_empty() {
        UNKNOWN_TABLE_LABEL.to_string()
    } else {
        table_name.to_string()
    }
}

/// Human-readable label for a backend record. Never empty.
pub fn resolve_name(raw: &RawNode) -> String {
    let Some(style) = lookup(&raw.table_name) else {
        return table_fallback(&raw.table_name);
    };

    match style.rule {
        NameRule::Joined(keys) => {
            let parts: Vec<String> = keys.iter().filter_map(|k| raw.field(k)).collect();
            if parts.is_empty() {
                table_fallback(&raw.table_name)
            } else {
                parts.join(" ")
            }
        }
        NameRule::Single(key, fallback) => raw.field(key).unwrap_or_else(|| fallback.to_string()),
    }
}

pub fn resolve_color(table_name: &str) -> &'static str {
    lookup(table_name).map_or(DEFAULT_COLOR, |s| s.color)
}

/// Fill color for a group node collapsing members of `table_name`.
pub fn group_color(table_name: &str) -> &'static str {
    GROUP_COLORS
        .iter()
        .find(|(t, _)| *t == table_name)
        .map_or(DEFAULT_GROUP_COLOR, |(_, c)| *c)
}

/// Shift each RGB channel of a `#rrggbb` color by `amount`, clamped to 0..=255.
/// Colors that do not parse are returned unchanged.
pub fn lighten(color: &str, amount: i16) -> String {
    let Some(hex) = color.strip_prefix('#').filter(|h| h.len() == 6) else {
        return color.to_string();
    };
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| (v as i16 + amount).clamp(0, 255) as u8)
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => format!("#{:02x}{:02x}{:02x}", r, g, b),
        _ => color.to_string(),
    }
}
