use std::fs;
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::RunnerConfig;
use super::error::RunnerError;

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn load_runner_config(path: &Path) -> Result<RunnerConfig, RunnerError> {
    let raw = fs::read_to_string(path).map_err(|source| RunnerError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_runner_config(&raw, path)?;
    info!(
        path = %path.display(),
        sequence = config.sequence.len(),
        steps = config.steps.len(),
        "runner_config_loaded"
    );
    Ok(config)
}

fn parse_runner_config(raw: &str, path: &Path) -> Result<RunnerConfig, RunnerError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, RunnerConfig>(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        let source = error.into_inner();
        RunnerError::ParseConfig {
            path: path.to_path_buf(),
            field,
            message: source.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn parse_error(raw: &str) -> (String, String) {
        match parse_runner_config(raw, Path::new("runner.json")) {
            Err(RunnerError::ParseConfig { field, message, .. }) => (field, message),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn nested_type_errors_report_their_path() {
        let (field, message) = parse_error(
            r#"{ "archive": "a.rsca", "scene": { "scene_lut_resource": 1, "display": { "logical_width": -3, "scene_height": 137 } } }"#,
        );
        assert_eq!(field, "scene.display.logical_width");
        assert!(message.contains("invalid value"), "{message}");
    }

    #[test]
    fn step_errors_report_the_step_index() {
        let (field, message) = parse_error(
            r#"{ "archive": "a.rsca", "scene": { "scene_lut_resource": 1 }, "steps": [ { "op": "next" }, { "op": "warp" } ] }"#,
        );
        assert!(field.starts_with("steps[1]"), "{field}");
        assert!(message.contains("warp"), "{message}");
    }

    #[test]
    fn unknown_top_level_fields_are_rejected() {
        let (_, message) = parse_error(
            r#"{ "archive": "a.rsca", "scene": { "scene_lut_resource": 1 }, "console": [] }"#,
        );
        assert!(message.contains("unknown field `console`"), "{message}");
    }

    #[test]
    fn parse_error_display_names_the_field() {
        let error = parse_runner_config(
            r#"{ "archive": "a.rsca", "scene": { "scene_lut_resource": "one" } }"#,
            Path::new("runner.json"),
        )
        .expect_err("should fail");
        let text = error.to_string();
        assert!(
            text.starts_with("invalid config runner.json at scene.scene_lut_resource:"),
            "{text}"
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let temp = TempDir::new().expect("temp");
        assert!(matches!(
            load_runner_config(&temp.path().join("absent.json")),
            Err(RunnerError::ReadConfig { .. })
        ));
    }

    #[test]
    fn config_file_loads() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("runner.json");
        fs::write(
            &path,
            r#"{ "archive": "a.rsca", "scene": { "scene_lut_resource": 4 }, "steps": [ { "op": "skip" } ] }"#,
        )
        .expect("write");

        let config = load_runner_config(&path).expect("load");
        assert_eq!(config.scene.scene_lut_resource, 4);
        assert_eq!(config.steps.len(), 1);
    }
}
