/// Capability lookup
///
/// A fixed table from module name to host value, plus alias names. Built
/// once, never mutated; `resolve` is the only way executed text reaches the
/// host.
use crate::config::RegistryConfig;
use crate::error::{CapabilityError, CapabilityResult};
use crate::modules;
use indexmap::IndexMap;
use playbox_evaluator::{EvalError, EvalResult, ModuleResolver, Value};
use tracing::{debug, info};

/// Module whose value is passed to executed text as `React`
pub const RUNTIME_MODULE: &str = "react";

pub struct CapabilityRegistry {
    modules: IndexMap<String, Value>,
    /// alias -> registered module name
    aliases: IndexMap<String, String>,
}

impl CapabilityRegistry {
    /// Every standard module, no aliases
    pub fn standard() -> Self {
        let mut builder = RegistryBuilder::default();
        for name in modules::STANDARD_MODULES {
            if let Some(value) = modules::standard_module(name) {
                builder.modules.insert(name.to_string(), value);
            }
        }
        builder.build_unchecked()
    }

    /// Registry selected by `config`. Unknown module names and aliases that
    /// point nowhere are configuration errors.
    pub fn from_config(config: &RegistryConfig) -> CapabilityResult<Self> {
        let mut builder = RegistryBuilder::default();
        for name in &config.modules {
            let value = modules::standard_module(name)
                .ok_or_else(|| CapabilityError::UnknownModule { name: name.clone() })?;
            builder = builder.module(name.clone(), value)?;
        }
        for (alias, target) in &config.aliases {
            builder = builder.alias(alias.clone(), target.clone());
        }
        let registry = builder.build()?;
        info!(
            modules = registry.modules.len(),
            aliases = registry.aliases.len(),
            "capability registry ready"
        );
        Ok(registry)
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Value bound to `name`, following aliases
    pub fn resolve(&self, name: &str) -> CapabilityResult<Value> {
        let target = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        match self.modules.get(target) {
            Some(value) => {
                debug!(module = %name, target = %target, "resolved capability");
                Ok(value.clone())
            }
            None => Err(CapabilityError::ModuleNotFound { name: name.to_string() }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Registered module names (aliases excluded), in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// The UI runtime handed to executed text as `React`, `undefined` when
    /// the registry has none
    pub fn runtime(&self) -> Value {
        self.modules.get(RUNTIME_MODULE).cloned().unwrap_or(Value::Undefined)
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ModuleResolver for CapabilityRegistry {
    fn resolve(&self, name: &str) -> EvalResult<Value> {
        CapabilityRegistry::resolve(self, name).map_err(|_| EvalError::UnresolvedDependency {
            name: name.to_string(),
        })
    }
}

/// Assembles a registry; the only place modules can be added
#[derive(Default)]
pub struct RegistryBuilder {
    modules: IndexMap<String, Value>,
    aliases: IndexMap<String, String>,
}

impl RegistryBuilder {
    pub fn module(mut self, name: impl Into<String>, value: Value) -> CapabilityResult<Self> {
        let name = name.into();
        if self.modules.contains_key(&name) {
            return Err(CapabilityError::DuplicateModule { name });
        }
        modules::freeze(&value);
        self.modules.insert(name, value);
        Ok(self)
    }

    pub fn alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    pub fn build(self) -> CapabilityResult<CapabilityRegistry> {
        for (alias, target) in &self.aliases {
            if !self.modules.contains_key(target) {
                return Err(CapabilityError::DanglingAlias {
                    alias: alias.clone(),
                    target: target.clone(),
                });
            }
        }
        Ok(self.build_unchecked())
    }

    fn build_unchecked(self) -> CapabilityRegistry {
        for value in self.modules.values() {
            modules::freeze(value);
        }
        CapabilityRegistry {
            modules: self.modules,
            aliases: self.aliases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_has_closed_module_set() {
        let registry = CapabilityRegistry::standard();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["react", "reactflow", "dagre"]);
        assert!(registry.contains("react"));
        assert!(!registry.contains("lodash"));
    }

    #[test]
    fn test_unknown_module_is_reported_by_name() {
        let err = CapabilityRegistry::standard().resolve("nonexistent-module").unwrap_err();
        assert_eq!(err.to_string(), "Cannot find module: nonexistent-module");
    }

    #[test]
    fn test_aliases_resolve_to_the_same_value() {
        let config = RegistryConfig::default().with_alias("@xyflow/react", "reactflow");
        let registry = CapabilityRegistry::from_config(&config).unwrap();
        let direct = registry.resolve("reactflow").unwrap();
        let aliased = registry.resolve("@xyflow/react").unwrap();
        assert!(direct.ptr_eq(&aliased));
    }

    #[test]
    fn test_config_errors() {
        let config = RegistryConfig {
            modules: vec!["react".to_string(), "jquery".to_string()],
            ..RegistryConfig::default()
        };
        assert_eq!(
            CapabilityRegistry::from_config(&config).err(),
            Some(CapabilityError::UnknownModule {
                name: "jquery".to_string()
            })
        );

        let config = RegistryConfig {
            modules: vec!["react".to_string()],
            ..RegistryConfig::default()
        }
        .with_alias("flow", "reactflow");
        assert!(matches!(
            CapabilityRegistry::from_config(&config),
            Err(CapabilityError::DanglingAlias { .. })
        ));
    }

    #[test]
    fn test_runtime_is_the_react_module() {
        let registry = CapabilityRegistry::standard();
        assert!(registry.runtime().ptr_eq(&registry.resolve("react").unwrap()));

        let empty = CapabilityRegistry::builder().build().unwrap();
        assert!(empty.runtime().is_undefined());
    }
}
