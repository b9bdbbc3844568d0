//! Catalog Harvest CLI: config resolution and terminal output helpers.

pub mod config;
pub mod preview;

pub use config::{load_config, resolve_config_path, select_targets};
pub use preview::{render_outputs, render_preview};
