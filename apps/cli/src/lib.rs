pub mod cli;
pub mod commands;

pub use cli::{parse_invocation, Args, Invocation};
pub use commands::build::{export_tree, run};
pub use commands::output::write_tree;
