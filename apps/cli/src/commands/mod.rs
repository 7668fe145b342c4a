pub mod build;
pub mod output;
