//! Pipeline validation.
//!
//! Checks a [`PipelineConfig`] against the module registry before any module
//! is instantiated: module kinds must exist, parameter overrides must name a
//! declared parameter with the right length and in-range values, and every
//! connection endpoint must name a declared module and one of its connectors.
//!
//! # Example
//!
//! ```rust
//! use rawgraph_config::{ModuleConfig, validate_module};
//! use rawgraph_modules::ModuleRegistry;
//!
//! let registry = ModuleRegistry::new();
//! let crop = ModuleConfig::new("crop", "main").with_param("crop", vec![0.1f32, 0.9, 0.0, 1.0]);
//! validate_module(&crop, &registry).expect("crop window is in range");
//! ```

use thiserror::Error;

use rawgraph_modules::ModuleRegistry;

use crate::pipeline_config::{Endpoint, ModuleConfig, PipelineConfig};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown module kind.
    #[error("unknown module kind: {0}")]
    UnknownModule(String),

    /// Unknown parameter name.
    #[error("unknown parameter '{param}' for module '{module}'")]
    UnknownParameter {
        /// `kind:instance` of the module.
        module: String,
        /// Name of the unrecognized parameter.
        param: String,
    },

    /// Parameter has the wrong number of floats.
    #[error("parameter '{param}' of '{module}' takes {expected} values, got {got}")]
    WrongLength {
        /// `kind:instance` of the module.
        module: String,
        /// Name of the parameter.
        param: String,
        /// Declared length.
        expected: usize,
        /// Length in the file.
        got: usize,
    },

    /// Parameter value out of range.
    #[error("parameter '{param}' of '{module}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// `kind:instance` of the module.
        module: String,
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Connection endpoint does not name a declared module connector.
    #[error("connection endpoint '{0}' does not name a declared module connector")]
    BadEndpoint(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn module_errors(module: &ModuleConfig, registry: &ModuleRegistry) -> Vec<ValidationError> {
    let Some(desc) = registry.get(&module.kind) else {
        return vec![ValidationError::UnknownModule(module.kind.clone())];
    };
    let mut errors = Vec::new();
    for (name, value) in &module.params {
        let Some(p) = desc.params.iter().find(|p| p.name == name) else {
            errors.push(ValidationError::UnknownParameter {
                module: module.label(),
                param: name.clone(),
            });
            continue;
        };
        let values = value.values();
        if values.len() != p.len() {
            errors.push(ValidationError::WrongLength {
                module: module.label(),
                param: name.clone(),
                expected: p.len(),
                got: values.len(),
            });
            continue;
        }
        if let Some(&bad) = values.iter().find(|&&v| !p.accepts(v)) {
            errors.push(ValidationError::OutOfRange {
                module: module.label(),
                param: name.clone(),
                value: bad,
                min: p.min,
                max: p.max,
            });
        }
    }
    errors
}

/// Validates one module declaration.
pub fn validate_module(module: &ModuleConfig, registry: &ModuleRegistry) -> ValidationResult<()> {
    collect(module_errors(module, registry))
}

/// Returns `true` if `endpoint` parses and names a connector of a declared
/// module.
fn endpoint_exists(config: &PipelineConfig, registry: &ModuleRegistry, endpoint: &str) -> bool {
    let Ok(ep) = endpoint.parse::<Endpoint>() else {
        return false;
    };
    config.module(&ep.kind, &ep.instance).is_some()
        && registry
            .get(&ep.kind)
            .is_some_and(|d| d.connectors.iter().any(|c| *c == ep.connector))
}

/// Validates a whole pipeline description, reporting every problem found.
pub fn validate_pipeline(config: &PipelineConfig, registry: &ModuleRegistry) -> ValidationResult<()> {
    let mut errors: Vec<ValidationError> = config
        .modules
        .iter()
        .flat_map(|m| module_errors(m, registry))
        .collect();
    for c in &config.connections {
        for endpoint in [&c.from, &c.to] {
            if !endpoint_exists(config, registry, endpoint) {
                errors.push(ValidationError::BadEndpoint(endpoint.clone()));
            }
        }
    }
    collect(errors)
}
