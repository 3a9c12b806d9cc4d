use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CapabilityError {
    #[error("Cannot find module: {name}")]
    ModuleNotFound { name: String },

    #[error("Unknown capability module '{name}' in registry config")]
    UnknownModule { name: String },

    #[error("Alias '{alias}' points at '{target}', which is not in the registry")]
    DanglingAlias { alias: String, target: String },

    #[error("Module '{name}' is registered twice")]
    DuplicateModule { name: String },
}

pub type CapabilityResult<T> = Result<T, CapabilityError>;
