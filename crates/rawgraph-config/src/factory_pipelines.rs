//! Factory pipelines bundled with the library.
//!
//! These are embedded at compile time and always available. They double as
//! starting points for hand-written pipeline files.

use crate::{ConfigError, PipelineConfig};

/// Names of the bundled pipelines.
pub static FACTORY_PIPELINE_NAMES: &[&str] = &["raw-default", "rgb-default"];

static FACTORY_PIPELINES_TOML: &[(&str, &str)] = &[
    ("raw-default", RAW_DEFAULT),
    ("rgb-default", RGB_DEFAULT),
];

/// Bayer sensor through development, demosaic, perspective, tone curve and
/// display.
const RAW_DEFAULT: &str = r#"
name = "raw default"
description = "Bayer raw: develop, demosaic, correct perspective, tone curve, display"
max_nodes = 256

[image]
width = 6000
height = 4000
filters = 0x94949494
whitebalance = [2.0, 1.0, 1.5, 1.0]
black = [512.0, 512.0, 512.0, 512.0]
white = [16383.0, 16383.0, 16383.0, 16383.0]
noise_a = 0.0
noise_b = 0.0
crop_aabb = [8, 8, 5992, 3992]

[[modules]]
name = "main"
kind = "i-raw"

[[modules]]
name = "main"
kind = "dev"

[[modules]]
name = "main"
kind = "demosaic"

[[modules]]
name = "main"
kind = "crop"
[modules.params]
perspect = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]
crop = [0.0, 1.0, 0.0, 1.0]

[[modules]]
name = "main"
kind = "filmcurv"
[modules.params]
x = [0.0, 0.25, 0.75, 1.0]
y = [0.0, 0.2, 0.8, 1.0]

[[modules]]
name = "main"
kind = "display"
[modules.params]
max_wd = 1920
max_ht = 1080

[[connections]]
from = "i-raw:main:output"
to = "dev:main:input"

[[connections]]
from = "dev:main:output"
to = "demosaic:main:input"

[[connections]]
from = "demosaic:main:output"
to = "crop:main:input"

[[connections]]
from = "crop:main:output"
to = "filmcurv:main:input"

[[connections]]
from = "filmcurv:main:output"
to = "display:main:input"
"#;

/// Demosaiced input straight into perspective, tone curve and display.
const RGB_DEFAULT: &str = r#"
name = "rgb default"
description = "Four-channel input: correct perspective, tone curve, display"

[image]
width = 4000
height = 3000

[[modules]]
name = "main"
kind = "i-raw"

[[modules]]
name = "main"
kind = "crop"

[[modules]]
name = "main"
kind = "filmcurv"

[[modules]]
name = "main"
kind = "display"

[[connections]]
from = "i-raw:main:output"
to = "crop:main:input"

[[connections]]
from = "crop:main:output"
to = "filmcurv:main:input"

[[connections]]
from = "filmcurv:main:output"
to = "display:main:input"
"#;

/// Names of the bundled pipelines.
pub fn factory_pipeline_names() -> &'static [&'static str] {
    FACTORY_PIPELINE_NAMES
}

/// Returns `true` if `name` is a bundled pipeline.
pub fn is_factory_pipeline(name: &str) -> bool {
    FACTORY_PIPELINE_NAMES.contains(&name)
}

/// Bundled pipeline by name.
pub fn get_factory_pipeline(name: &str) -> Result<PipelineConfig, ConfigError> {
    let (_, toml) = FACTORY_PIPELINES_TOML
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| ConfigError::PipelineNotFound(name.to_string()))?;
    PipelineConfig::from_toml(toml)
}

/// All bundled pipelines, parsed.
pub fn factory_pipelines() -> Result<Vec<PipelineConfig>, ConfigError> {
    FACTORY_PIPELINES_TOML
        .iter()
        .map(|(_, toml)| PipelineConfig::from_toml(toml))
        .collect()
}
