//! Pipeline file format and operations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use rawgraph_core::{DEFAULT_MAX_NODES, ImageParams, ModuleId, Pipeline, RAW_WHITE};
use rawgraph_modules::ModuleRegistry;

use crate::error::ConfigError;
use crate::validation::validate_pipeline;

/// Pipeline description: image metadata, modules and their wiring.
///
/// # TOML Format
///
/// ```toml
/// name = "raw default"
/// max_nodes = 256
///
/// [image]
/// width = 6000
/// height = 4000
/// filters = 0x94949494
///
/// [[modules]]
/// name = "main"
/// kind = "i-raw"
///
/// [[modules]]
/// name = "main"
/// kind = "crop"
/// [modules.params]
/// perspect = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]
///
/// [[connections]]
/// from = "i-raw:main:output"
/// to = "crop:main:input"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Node ceiling for the compile pass.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Image metadata.
    pub image: ImageConfig,

    /// Module instances, in declaration order.
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,

    /// Output-to-input connections.
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

fn default_max_nodes() -> usize {
    DEFAULT_MAX_NODES
}

/// Image metadata as written in a pipeline file. Missing fields take the
/// values of an already-demosaiced image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    /// Sensor width in pixels.
    pub width: u32,
    /// Sensor height in pixels.
    pub height: u32,
    /// Colour filter pattern; 0 for four-channel data.
    #[serde(default)]
    pub filters: u32,
    /// White balance multipliers.
    #[serde(default = "unit4")]
    pub whitebalance: [f32; 4],
    /// Black points.
    #[serde(default)]
    pub black: [f32; 4],
    /// White points.
    #[serde(default = "raw_white4")]
    pub white: [f32; 4],
    /// Signal-independent noise.
    #[serde(default)]
    pub noise_a: f32,
    /// Signal-dependent noise.
    #[serde(default)]
    pub noise_b: f32,
    /// Valid sensor area `[x0, y0, x1, y1]`; the whole sensor if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_aabb: Option<[u32; 4]>,
}

fn unit4() -> [f32; 4] {
    [1.0; 4]
}

fn raw_white4() -> [f32; 4] {
    [RAW_WHITE; 4]
}

impl ImageConfig {
    /// Metadata for the compile pass.
    pub fn to_image_params(&self) -> ImageParams {
        ImageParams {
            filters: self.filters,
            whitebalance: self.whitebalance,
            black: self.black,
            white: self.white,
            noise_a: self.noise_a,
            noise_b: self.noise_b,
            crop_aabb: self.crop_aabb.unwrap_or([0, 0, self.width, self.height]),
            ..ImageParams::rgb(self.width, self.height)
        }
    }
}

impl From<&ImageParams> for ImageConfig {
    fn from(img: &ImageParams) -> Self {
        Self {
            width: img.width,
            height: img.height,
            filters: img.filters,
            whitebalance: img.whitebalance,
            black: img.black,
            white: img.white,
            noise_a: img.noise_a,
            noise_b: img.noise_b,
            crop_aabb: Some(img.crop_aabb),
        }
    }
}

/// A parameter value: one float or a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    /// Single float.
    Scalar(f32),
    /// Several floats, e.g. corner coordinates.
    List(Vec<f32>),
}

impl ParamValue {
    /// The value as a flat slice.
    pub fn values(&self) -> &[f32] {
        match self {
            ParamValue::Scalar(v) => std::slice::from_ref(v),
            ParamValue::List(v) => v,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<Vec<f32>> for ParamValue {
    fn from(v: Vec<f32>) -> Self {
        ParamValue::List(v)
    }
}

impl From<&[f32]> for ParamValue {
    fn from(v: &[f32]) -> Self {
        if let [single] = v {
            ParamValue::Scalar(*single)
        } else {
            ParamValue::List(v.to_vec())
        }
    }
}

/// One module instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleConfig {
    /// Instance name, unique per kind.
    pub name: String,
    /// Module kind (`i-raw`, `dev`, `crop`, ...).
    pub kind: String,
    /// Parameter overrides; absent parameters keep their defaults.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, ParamValue>,
}

impl ModuleConfig {
    /// A module with default parameters.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    /// Sets a parameter override.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// `kind:instance` label used in messages and endpoints.
    pub fn label(&self) -> String {
        format!("{}:{}", self.kind, self.name)
    }
}

/// A connection between two module connectors, written as
/// `kind:instance:connector` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    /// Output endpoint.
    pub from: String,
    /// Input endpoint.
    pub to: String,
}

impl ConnectionConfig {
    /// A connection from `from` to `to`.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Parsed `kind:instance:connector` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Module kind.
    pub kind: String,
    /// Instance name.
    pub instance: String,
    /// Connector name.
    pub connector: String,
}

impl FromStr for Endpoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(kind), Some(instance), Some(connector), None)
                if !kind.is_empty() && !instance.is_empty() && !connector.is_empty() =>
            {
                Ok(Self {
                    kind: kind.to_string(),
                    instance: instance.to_string(),
                    connector: connector.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidEndpoint(s.to_string())),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.instance, self.connector)
    }
}

impl PipelineConfig {
    /// An empty pipeline for `image`.
    pub fn new(name: impl Into<String>, image: ImageConfig) -> Self {
        Self {
            name: name.into(),
            description: None,
            max_nodes: DEFAULT_MAX_NODES,
            image,
            modules: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a module.
    pub fn with_module(mut self, module: ModuleConfig) -> Self {
        self.modules.push(module);
        self
    }

    /// Adds a connection.
    pub fn with_connection(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.connections.push(ConnectionConfig::new(from, to));
        self
    }

    /// Load a pipeline from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a pipeline from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the pipeline to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the pipeline to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Module declared as `kind:instance`.
    pub fn module(&self, kind: &str, instance: &str) -> Option<&ModuleConfig> {
        self.modules
            .iter()
            .find(|m| m.kind == kind && m.name == instance)
    }

    /// Validates the description, then instantiates every module, applies
    /// parameter overrides and wires the connections.
    pub fn build(&self, registry: &ModuleRegistry) -> Result<Pipeline, ConfigError> {
        validate_pipeline(self, registry)?;

        let mut pipe =
            Pipeline::new(self.image.to_image_params()).with_max_nodes(self.max_nodes);
        let mut seen = HashSet::new();
        for m in &self.modules {
            if !seen.insert((m.kind.as_str(), m.name.as_str())) {
                return Err(ConfigError::DuplicateModule(m.label()));
            }
            let ops = registry
                .create(&m.kind)
                .ok_or_else(|| ConfigError::UnknownModule(m.kind.clone()))?;
            let id = pipe.add_module(ops, m.name.clone())?;
            for (name, value) in &m.params {
                pipe.set_param(id, name, value.values())?;
            }
        }

        for c in &self.connections {
            let (from, out) = resolve(&pipe, &c.from)?;
            let (to, input) = resolve(&pipe, &c.to)?;
            pipe.connect(from, out, to, input)?;
        }
        Ok(pipe)
    }
}

fn resolve(pipe: &Pipeline, endpoint: &str) -> Result<(ModuleId, usize), ConfigError> {
    let ep: Endpoint = endpoint.parse()?;
    let id = pipe
        .find(&ep.kind, &ep.instance)
        .ok_or_else(|| ConfigError::UnknownInstance(format!("{}:{}", ep.kind, ep.instance)))?;
    let connector = pipe
        .module(id)
        .and_then(|m| m.data().connector_index(&ep.connector))
        .ok_or_else(|| ConfigError::InvalidEndpoint(endpoint.to_string()))?;
    Ok((id, connector))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RGB: &str = r#"
name = "Test"

[image]
width = 1600
height = 1200

[[modules]]
name = "main"
kind = "i-raw"

[[modules]]
name = "main"
kind = "display"
[modules.params]
max_wd = 800

[[connections]]
from = "i-raw:main:output"
to = "display:main:input"
"#;

    #[test]
    fn minimal_toml_takes_defaults() {
        let config = PipelineConfig::from_toml(RGB).unwrap();
        assert_eq!(config.max_nodes, DEFAULT_MAX_NODES);
        assert!(config.description.is_none());
        assert_eq!(config.image.filters, 0);
        assert_eq!(config.image.whitebalance, [1.0; 4]);
        assert_eq!(config.modules.len(), 2);
        assert_eq!(
            config.modules[1].params.get("max_wd"),
            Some(&ParamValue::Scalar(800.0))
        );
        let img = config.image.to_image_params();
        assert_eq!(img.crop_aabb, [0, 0, 1600, 1200]);
    }

    #[test]
    fn hex_filters_and_lists() {
        let toml = r#"
name = "Raw"
[image]
width = 6000
height = 4000
filters = 0x94949494
crop_aabb = [8, 8, 5992, 3992]

[[modules]]
name = "main"
kind = "crop"
[modules.params]
perspect = [0, 0, 1, 0, 1, 1, 0, 1]
"#;
        let config = PipelineConfig::from_toml(toml).unwrap();
        assert_eq!(config.image.filters, 0x94949494);
        assert_eq!(config.image.crop_aabb, Some([8, 8, 5992, 3992]));
        let perspect = config.modules[0].params["perspect"].values();
        assert_eq!(perspect, &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn endpoint_parsing() {
        let ep: Endpoint = "dev:main:output".parse().unwrap();
        assert_eq!(ep.kind, "dev");
        assert_eq!(ep.instance, "main");
        assert_eq!(ep.connector, "output");
        assert_eq!(ep.to_string(), "dev:main:output");

        for bad in ["dev:main", "dev::output", "a:b:c:d", ""] {
            assert!(bad.parse::<Endpoint>().is_err(), "{bad}");
        }
    }

    #[test]
    fn build_wires_modules() {
        let config = PipelineConfig::from_toml(RGB).unwrap();
        let mut pipe = config.build(&ModuleRegistry::new()).unwrap();
        assert_eq!(pipe.module_count(), 2);
        let display = pipe.find("display", "main").unwrap();
        assert_eq!(pipe.param(display, "max_wd"), Some(&[800.0][..]));
        let compiled = pipe.compile().unwrap();
        assert_eq!(compiled.nodes().len(), 2);
    }

    #[test]
    fn build_rejects_duplicates() {
        let config = PipelineConfig::from_toml(RGB)
            .unwrap()
            .with_module(ModuleConfig::new("display", "main"));
        assert!(matches!(
            config.build(&ModuleRegistry::new()),
            Err(ConfigError::DuplicateModule(label)) if label == "display:main"
        ));
    }

    #[test]
    fn build_rejects_reversed_connection() {
        let mut config = PipelineConfig::from_toml(RGB).unwrap();
        config.connections[0] = ConnectionConfig::new("display:main:input", "i-raw:main:output");
        assert!(matches!(
            config.build(&ModuleRegistry::new()),
            Err(ConfigError::Pipeline(_))
        ));
    }

    #[test]
    fn image_params_round_trip() {
        let img = ImageParams {
            filters: 0x94949494,
            noise_a: 0.5,
            ..ImageParams::rgb(640, 480)
        };
        assert_eq!(ImageConfig::from(&img).to_image_params(), img);
    }

    #[test]
    fn param_value_from_slice() {
        assert_eq!(ParamValue::from(&[2.0f32][..]), ParamValue::Scalar(2.0));
        assert_eq!(
            ParamValue::from(&[1.0f32, 2.0][..]).values(),
            &[1.0, 2.0]
        );
    }
}
