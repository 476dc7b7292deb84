use std::fs;
use std::path::{Path, PathBuf};

use scene_engine::{
    compile_archive_file, read_archive, write_archive, ConsoleCommandProcessor, ConsoleState,
    Headless, RenderMode, SceneEngine, SceneProc, SceneQueueEntry, SceneSource, Surface,
};
use tracing::{info, warn};

use super::config::{resolve_relative, RunnerConfig, Step};
use super::error::RunnerError;

/// What a headless play session ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionReport {
    pub(crate) steps_run: usize,
    pub(crate) loaded: bool,
    pub(crate) scene_number: Option<u16>,
    pub(crate) mode: RenderMode,
    pub(crate) console_output: Vec<String>,
    pub(crate) snapshots: Vec<PathBuf>,
}

/// Compiles an XML manifest and writes the resulting archive.
pub(crate) fn pack(manifest: &Path, out: &Path) -> Result<usize, RunnerError> {
    let archive = compile_archive_file(manifest)?;
    write_archive(out, &archive)?;
    info!(
        manifest = %manifest.display(),
        out = %out.display(),
        resources = archive.len(),
        payload_sha256 = %archive.payload_hash_hex(),
        "archive_packed"
    );
    Ok(archive.len())
}

/// Runs `config` against headless collaborators. `base_dir` anchors relative
/// paths, normally the directory holding the config file.
pub(crate) fn play(config: &RunnerConfig, base_dir: &Path) -> Result<SessionReport, RunnerError> {
    let archive_path = resolve_relative(base_dir, &config.archive);
    let archive = read_archive(&archive_path)?;
    info!(
        path = %archive_path.display(),
        resources = archive.len(),
        "archive_opened"
    );

    let headless = Headless::new();
    let mut engine = SceneEngine::init(config.scene.clone(), headless.services(Box::new(archive)))?;
    let result = run_session(&mut engine, config, base_dir);
    let _services = engine.shutdown();
    info!("scene_engine_shutdown");
    result
}

struct Session {
    console: ConsoleState,
    processor: ConsoleCommandProcessor,
    report: SessionReport,
}

fn run_session(
    engine: &mut SceneEngine,
    config: &RunnerConfig,
    base_dir: &Path,
) -> Result<SessionReport, RunnerError> {
    if config.sequence.is_empty() {
        let first_scene = engine.first_scene();
        engine.queue_mut().enqueue(
            SceneQueueEntry::new(SceneSource::Scene(first_scene)).with_handler(SceneProc::Initial),
        );
    } else {
        for queued in &config.sequence {
            engine.queue_mut().enqueue(queued.to_entry());
        }
    }
    engine.start()?;

    let mut session = Session {
        console: ConsoleState::default(),
        processor: ConsoleCommandProcessor::new(),
        report: SessionReport {
            steps_run: 0,
            loaded: false,
            scene_number: None,
            mode: RenderMode::Unset,
            console_output: Vec::new(),
            snapshots: Vec::new(),
        },
    };

    for (index, step) in config.steps.iter().enumerate() {
        if let Err(error) = session.run_step(engine, step, base_dir) {
            warn!(step = index, error = %error, "runner_step_failed");
            return Err(error);
        }
        session.report.steps_run += 1;
    }

    if let Some(path) = &config.snapshot {
        let path = resolve_relative(base_dir, path);
        write_snapshot(engine, &path)?;
        session.report.snapshots.push(path);
    }

    let mut report = session.report;
    report.loaded = engine.is_loaded();
    report.scene_number = engine.scene_number();
    report.mode = engine.mode();
    info!(
        steps = report.steps_run,
        scene = ?report.scene_number,
        mode = ?report.mode,
        "runner_session_finished"
    );
    Ok(report)
}

impl Session {
    fn run_step(
        &mut self,
        engine: &mut SceneEngine,
        step: &Step,
        base_dir: &Path,
    ) -> Result<(), RunnerError> {
        match step {
            Step::Next => engine.next()?,
            Step::Skip => engine.skip()?,
            Step::End => engine.end()?,
            Step::Change { scene } => {
                engine.clear_queue();
                engine.change(*scene)?;
            }
            Step::Console { line } => {
                self.console.submit_line(line);
                self.processor.run_pending(&mut self.console, engine);
                self.flush_console_output();
            }
            Step::Snapshot { path } => {
                let path = resolve_relative(base_dir, path);
                write_snapshot(engine, &path)?;
                self.report.snapshots.push(path);
            }
        }
        Ok(())
    }

    fn flush_console_output(&mut self) {
        for line in self.console.output_lines() {
            info!(line, "console_output");
            self.report.console_output.push(line.to_string());
        }
        self.console.clear_output_lines();
    }
}

fn write_snapshot(engine: &mut SceneEngine, path: &Path) -> Result<(), RunnerError> {
    let display = engine.display();
    let mut surface = Surface::new(
        u32::from(display.logical_width),
        u32::from(display.scene_height),
    );
    engine.draw(&mut surface)?;
    let palette = engine.background_palette().cloned().unwrap_or_default();

    let snapshot_error = |message: String| RunnerError::Snapshot {
        path: path.to_path_buf(),
        message,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| snapshot_error(error.to_string()))?;
    }
    surface
        .save_png(path, &palette)
        .map_err(|error| snapshot_error(error.to_string()))?;
    info!(path = %path.display(), "scene_snapshot_written");
    Ok(())
}
