use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Children keyed by name; the last node inserted under a name replaces the earlier one.
pub type Tree = BTreeMap<String, TreeNode>;

/// Node of the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub link: Option<String>,
    #[serde(default)]
    pub children: Tree,
}

impl TreeNode {
    pub fn new(name: impl Into<String>, link: Option<String>) -> Self {
        Self {
            name: name.into(),
            link,
            children: Tree::new(),
        }
    }

    /// This node plus all of its descendants.
    pub fn node_count(&self) -> usize {
        1 + count_nodes(&self.children)
    }
}

/// Total number of nodes across every nesting level.
pub fn count_nodes(tree: &Tree) -> usize {
    tree.values().map(TreeNode::node_count).sum()
}
