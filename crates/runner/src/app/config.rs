use std::path::{Path, PathBuf};

use scene_engine::{SceneConfig, SceneProc, SceneQueueEntry, SceneSource};
use serde::Deserialize;

/// Headless play session read from a JSON file.
///
/// Relative paths (`archive`, `snapshot`, snapshot steps) resolve against the
/// directory holding the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RunnerConfig {
    pub(crate) archive: PathBuf,
    pub(crate) scene: SceneConfig,
    /// Scenes queued before `start`. Empty means the configured first scene
    /// with the intro handler.
    #[serde(default)]
    pub(crate) sequence: Vec<QueuedScene>,
    #[serde(default)]
    pub(crate) steps: Vec<Step>,
    /// Written once all steps ran.
    #[serde(default)]
    pub(crate) snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct QueuedScene {
    pub(crate) source: QueuedSource,
    #[serde(default)]
    pub(crate) handler: HandlerKind,
    #[serde(default)]
    pub(crate) skip_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum QueuedSource {
    Scene(u16),
    Resource(u16),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum HandlerKind {
    #[default]
    Default,
    Initial,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum Step {
    Next,
    Skip,
    End,
    Change { scene: u16 },
    Console { line: String },
    Snapshot { path: PathBuf },
}

impl QueuedScene {
    pub(crate) fn to_entry(self) -> SceneQueueEntry {
        let source = match self.source {
            QueuedSource::Scene(index) => SceneSource::Scene(index),
            QueuedSource::Resource(resource) => SceneSource::Resource(resource),
        };
        let handler = match self.handler {
            HandlerKind::Default => SceneProc::Default,
            HandlerKind::Initial => SceneProc::Initial,
        };
        let entry = SceneQueueEntry::new(source).with_handler(handler);
        if self.skip_target {
            entry.as_skip_target()
        } else {
            entry
        }
    }
}

pub(crate) fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config: RunnerConfig = serde_json::from_str(
            r#"{ "archive": "scenes.rsca", "scene": { "scene_lut_resource": 1 } }"#,
        )
        .expect("parse");

        assert_eq!(config.archive, PathBuf::from("scenes.rsca"));
        assert_eq!(config.scene, SceneConfig::new(1));
        assert!(config.sequence.is_empty());
        assert!(config.steps.is_empty());
        assert!(config.snapshot.is_none());
    }

    #[test]
    fn sequence_and_steps_parse() {
        let config: RunnerConfig = serde_json::from_str(
            r#"{
                "archive": "scenes.rsca",
                "scene": { "scene_lut_resource": 1, "first_scene": 2 },
                "sequence": [
                    { "source": { "scene": 1 }, "handler": "initial" },
                    { "source": { "resource": 500 }, "skip_target": true }
                ],
                "steps": [
                    { "op": "next" },
                    { "op": "change", "scene": 3 },
                    { "op": "console", "line": "scene_info" },
                    { "op": "snapshot", "path": "out/a.png" }
                ]
            }"#,
        )
        .expect("parse");

        assert_eq!(config.scene.first_scene, 2);
        assert_eq!(
            config.sequence[0],
            QueuedScene {
                source: QueuedSource::Scene(1),
                handler: HandlerKind::Initial,
                skip_target: false,
            }
        );
        assert!(config.sequence[1].skip_target);
        assert_eq!(config.steps[1], Step::Change { scene: 3 });
        assert_eq!(
            config.steps[3],
            Step::Snapshot {
                path: PathBuf::from("out/a.png")
            }
        );
    }

    #[test]
    fn queued_scene_maps_to_queue_entry() {
        let entry = QueuedScene {
            source: QueuedSource::Resource(500),
            handler: HandlerKind::Default,
            skip_target: true,
        }
        .to_entry();

        assert!(matches!(entry.source, SceneSource::Resource(500)));
        assert!(matches!(entry.handler, SceneProc::Default));
        assert!(entry.skip_target);
    }

    #[test]
    fn relative_paths_join_the_config_dir() {
        let base = Path::new("/data/session");
        assert_eq!(
            resolve_relative(base, Path::new("scenes.rsca")),
            PathBuf::from("/data/session/scenes.rsca")
        );
        assert_eq!(
            resolve_relative(base, Path::new("/abs/x.png")),
            PathBuf::from("/abs/x.png")
        );
    }
}
