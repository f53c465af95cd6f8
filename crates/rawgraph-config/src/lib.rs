//! Pipeline description files for rawgraph.
//!
//! A pipeline is declared in TOML: image metadata, module instances with
//! parameter overrides, and `kind:instance:connector` connections. This crate
//! loads and saves those files, validates them against the module registry
//! and builds a ready-to-compile [`rawgraph_core::Pipeline`].
//!
//! # Features
//!
//! - **Pipeline files**: [`PipelineConfig`] load/save/round-trip
//! - **Validation**: module kinds, parameter names, lengths and ranges, and
//!   connection endpoints, all checked before instantiation
//! - **Factory pipelines**: `raw-default` and `rgb-default`
//!
//! # Example
//!
//! ```rust
//! use rawgraph_config::get_factory_pipeline;
//! use rawgraph_modules::ModuleRegistry;
//!
//! let config = get_factory_pipeline("rgb-default")?;
//! let mut pipe = config.build(&ModuleRegistry::new())?;
//! let compiled = pipe.compile().map_err(rawgraph_config::ConfigError::from)?;
//! assert_eq!(compiled.nodes().len(), 4);
//! # Ok::<(), rawgraph_config::ConfigError>(())
//! ```

mod error;
mod pipeline_config;

/// Pipeline validation.
pub mod validation;

/// Factory pipelines bundled with the library.
pub mod factory_pipelines;

pub use error::ConfigError;
pub use factory_pipelines::{
    FACTORY_PIPELINE_NAMES, factory_pipeline_names, factory_pipelines, get_factory_pipeline,
    is_factory_pipeline,
};
pub use pipeline_config::{
    ConnectionConfig, Endpoint, ImageConfig, ModuleConfig, ParamValue, PipelineConfig,
};
pub use validation::{ValidationError, ValidationResult, validate_module, validate_pipeline};
