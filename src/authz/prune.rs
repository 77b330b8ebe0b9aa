use std::collections::HashSet;

use crate::models::MenuNode;

/// Builds the visible subset of `nodes` for the granted menu names.
///
/// A node survives only if its own name is granted. Its subtree is never
/// visited otherwise, so a denied parent hides granted children. A granted
/// node that had children but loses all of them is dropped too; a granted
/// leaf (no children, or an empty list to begin with) is kept. Sibling order
/// is preserved and the input is left untouched.
pub fn prune(nodes: &[MenuNode], authorized: &HashSet<&str>) -> Vec<MenuNode> {
    nodes
        .iter()
        .filter_map(|node| prune_node(node, authorized))
        .collect()
}

fn prune_node(node: &MenuNode, authorized: &HashSet<&str>) -> Option<MenuNode> {
    if !authorized.contains(node.name.as_str()) {
        return None;
    }

    match &node.children {
        Some(children) if !children.is_empty() => {
            let visible = prune(children, authorized);
            if visible.is_empty() {
                return None;
            }
            Some(MenuNode {
                name: node.name.clone(),
                children: Some(visible),
                attributes: node.attributes.clone(),
            })
        }
        _ => Some(node.clone()),
    }
}
