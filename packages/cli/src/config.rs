use playbox_capabilities::RegistryConfig;
use playbox_editor::{EditorError, Pipeline, PipelineOptions};
use playbox_evaluator::ExecutorOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "playbox.config.json";

/// Playbox configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Modules and aliases visible to executed examples
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Nested calls allowed before a `RangeError`
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
}

fn default_max_call_depth() -> usize {
    ExecutorOptions::default().max_call_depth
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            executor: ExecutorOptions {
                max_call_depth: self.max_call_depth,
                ..ExecutorOptions::default()
            },
            ..PipelineOptions::default()
        }
    }

    /// Build the registry once and wrap it in a pipeline
    pub fn pipeline(&self) -> Result<Pipeline, EditorError> {
        Pipeline::from_config(&self.registry, self.pipeline_options())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            max_call_depth: default_max_call_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "registry": {
                "modules": ["react", "reactflow"],
                "aliases": { "@xyflow/react": "reactflow" }
            },
            "maxCallDepth": 40
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.registry.modules, vec!["react", "reactflow"]);
        assert_eq!(config.registry.aliases["@xyflow/react"], "reactflow");
        assert_eq!(config.max_call_depth, 40);
        assert_eq!(config.pipeline_options().executor.max_call_depth, 40);

        let pipeline = config.pipeline().unwrap();
        assert!(pipeline.registry().contains("@xyflow/react"));
        assert!(!pipeline.registry().contains("dagre"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_call_depth, 100);
        assert_eq!(config.registry.modules, vec!["react", "reactflow", "dagre"]);
    }

    #[test]
    fn test_unknown_module_is_rejected() {
        let config: Config = serde_json::from_str(r#"{ "registry": { "modules": ["lodash"] } }"#).unwrap();
        assert!(config.pipeline().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("playbox_cli_config_missing");
        std::fs::create_dir_all(&dir).unwrap();
        let config = Config::load(&dir.display().to_string()).unwrap();
        assert_eq!(config.max_call_depth, 100);
    }
}
