use crate::modules::STANDARD_MODULES;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which standard modules are exposed, and under which extra names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryConfig {
    /// Standard module names to expose
    pub modules: Vec<String>,
    /// Extra import names mapped onto registered modules
    pub aliases: IndexMap<String, String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            modules: STANDARD_MODULES.iter().map(|name| name.to_string()).collect(),
            aliases: IndexMap::new(),
        }
    }
}

impl RegistryConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let config = RegistryConfig::from_json(r#"{ "aliases": { "@xyflow/react": "reactflow" } }"#).unwrap();
        assert_eq!(config.modules, vec!["react", "reactflow", "dagre"]);
        assert_eq!(config.aliases.get("@xyflow/react").map(String::as_str), Some("reactflow"));
    }
}
