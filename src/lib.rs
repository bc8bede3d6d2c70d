pub mod batch;
pub mod cli;
pub mod config;
pub mod render;
pub mod rule;
pub mod scan;
pub mod types;
pub mod util;
