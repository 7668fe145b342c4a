pub mod builder;

pub use builder::{build_tree, TreeBuilder};
pub use drive_tree_domain::{count_nodes, CollisionPolicy, Tree, TreeNode};
