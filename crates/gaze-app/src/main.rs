//! Gaze Tracker - Main Entry Point
//!
//! Usage: `gaze-tracker [CONFIG]` (defaults to `gaze.toml`; the file is optional).

use std::path::PathBuf;

use gaze_app::{init_logging, run, Settings};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("gaze.toml"));

    let settings = Settings::load(&config_path)?;
    init_logging(&settings.logging)?;

    info!("=== Gaze Tracker v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Using settings from {} (if present)", config_path.display());

    let summary = run(&settings)?;
    info!("Run complete: {}", serde_json::to_string(&summary)?);

    Ok(())
}
