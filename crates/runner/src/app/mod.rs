mod bootstrap;
mod config;
mod error;
mod session;

use std::path::Path;

use tracing::info;

use error::RunnerError;

/// Compiles `manifest` into a resource archive at `out`.
pub(crate) fn run_pack(manifest: &Path, out: &Path) -> Result<(), RunnerError> {
    bootstrap::init_tracing();
    let resources = session::pack(manifest, out)?;
    println!("packed {resources} resources into {}", out.display());
    Ok(())
}

/// Plays the session described by the JSON config at `config_path`.
pub(crate) fn run_play(config_path: &Path) -> Result<(), RunnerError> {
    bootstrap::init_tracing();
    info!("=== Scene Runner Startup ===");
    let config = bootstrap::load_runner_config(config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let report = session::play(&config, base_dir)?;

    for line in &report.console_output {
        println!("{line}");
    }
    let scene = report
        .scene_number
        .map_or_else(|| "-".to_string(), |scene| scene.to_string());
    println!(
        "steps={} loaded={} scene={scene} mode={:?}",
        report.steps_run, report.loaded, report.mode
    );
    for path in &report.snapshots {
        println!("snapshot {}", path.display());
    }
    Ok(())
}
