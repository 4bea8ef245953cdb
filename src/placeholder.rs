//! Stand-in relation tree shown when the tree query fails.

use crate::display::DisplayNode;
use crate::raw::RawNode;
use crate::transform::transform;

/// Representative record tree for `bill_no`, one branch per known type-tag.
pub fn placeholder_raw(bill_no: &str) -> RawNode {
    let template = RawNode::new("billtemplate_base", "111")
        .with_field("cName", "Bill template")
        .with_child(
            RawNode::new("billtplgroup_base", "1111")
                .with_field("ccode", "btn-group")
                .with_field("cName", "Button group")
                .with_child(
                    RawNode::new("billitem_base", "11111")
                        .with_field("cName", "item1")
                        .with_field("cShowCaption", "Field 1"),
                )
                .with_child(
                    RawNode::new("billitem_base", "11112")
                        .with_field("cName", "item2")
                        .with_field("cShowCaption", "Field 2"),
                ),
        )
        .with_child(
            RawNode::new("bill_toolbar", "1112")
                .with_field("name", "Toolbar")
                .with_child(
                    RawNode::new("bill_toolbaritem", "11121")
                        .with_field("name", "Toolbar item 1")
                        .with_child(RawNode::new("bill_command", "111211").with_field("name", "Command 1")),
                ),
        );

    let filters = RawNode::new("pb_meta_filters", "12")
        .with_field("filterDesc", "Filter description")
        .with_child(RawNode::new("pb_meta_filter_item", "121").with_field("itemTitle", "Filter item 1"))
        .with_child(
            RawNode::new("pb_filter_solution", "122")
                .with_field("solutionName", "Filter solution 1")
                .with_child(
                    RawNode::new("pb_filter_solution_common", "1221")
                        .with_field("itemTitle", "Common filter solution 1"),
                ),
        );

    RawNode::new("bill_base", "1")
        .with_field("cBillNo", bill_no)
        .with_field("cName", "Bill basics")
        .with_child(
            RawNode::new("billentity_base", "11")
                .with_field("cName", "Bill entity")
                .with_child(template),
        )
        .with_child(filters)
}

pub fn placeholder_tree(bill_no: &str) -> DisplayNode {
    transform(Some(&placeholder_raw(bill_no)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::TreeMetrics;

    #[test]
    fn test_placeholder_shape() {
        let tree = placeholder_tree("BN042");
        assert_eq!(tree.name, "BN042 Bill basics");

        let m = TreeMetrics::analyze(&tree);
        assert_eq!(m.node_count, 13);
        assert_eq!(m.max_depth, 5);
        assert!(tree.find("1221").is_some());
    }

    #[test]
    fn test_blank_bill_no() {
        let tree = placeholder_tree("");
        assert_eq!(tree.name, "Bill basics");
    }
}
