pub mod remote_entry;
pub mod file_tree;
pub mod collision;

pub use remote_entry::*;
pub use file_tree::*;
pub use collision::*;
