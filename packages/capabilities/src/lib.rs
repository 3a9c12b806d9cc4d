//! # Playbox Capabilities
//!
//! The closed set of host values executed text can reach through
//! `resolve(name)`: the UI runtime (`react`), the diagram widget
//! (`reactflow`) and the graph layout library (`dagre`). Any other name is
//! an unresolved dependency.
//!
//! A registry is assembled once, from [`RegistryConfig`] or a
//! [`RegistryBuilder`], and is read-only afterwards.

pub mod config;
pub mod error;
pub mod modules;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{CapabilityError, CapabilityResult};
pub use modules::STANDARD_MODULES;
pub use registry::{CapabilityRegistry, RegistryBuilder, RUNTIME_MODULE};
