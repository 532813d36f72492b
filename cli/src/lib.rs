//! CLI utilities for voxid.
//!
//! Configuration, paths and output formatting shared by the `voxid`
//! command.

pub mod config;
pub mod output;
pub mod paths;

pub use config::{Config, load_config, save_config};
pub use output::{Output, OutputFormat};
pub use paths::Paths;
