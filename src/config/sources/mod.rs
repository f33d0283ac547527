//! Configuration sources, one module per layer.

pub mod environment;
pub mod global_file;
pub mod root_file;
