//! Module kinds and registry for rawgraph image pipelines.
//!
//! Every module kind implements [`rawgraph_core::ModuleOps`]. Kinds are
//! selected through the [`ModuleKind`] tag; the [`ModuleRegistry`] lists them
//! with their metadata and creates instances by name. There is no dynamic
//! loading.
//!
//! | kind | role |
//! |------|------|
//! | `i-raw` | sensor data source |
//! | `dev` | multi-scale development (pyramid + assembly, mosaic aware) |
//! | `demosaic` | one colour pixel per mosaic block |
//! | `crop` | perspective correction and crop window |
//! | `filmcurv` | monotone tone curve |
//! | `display` | viewport sink |
//!
//! # Example
//!
//! ```rust
//! use rawgraph_core::{ImageParams, Pipeline};
//! use rawgraph_modules::{ModuleKind, ModuleRegistry};
//!
//! let registry = ModuleRegistry::new();
//! let mut pipe = Pipeline::new(ImageParams::rgb(1200, 800));
//! let src = pipe.add_module(registry.create_kind(ModuleKind::Source), "main")?;
//! let out = pipe.add_module(registry.create_kind(ModuleKind::Display), "main")?;
//! pipe.connect(src, 0, out, 0)?;
//!
//! let compiled = pipe.compile()?;
//! assert_eq!(compiled.nodes().len(), 2);
//! # Ok::<(), rawgraph_core::PipelineError>(())
//! ```

pub mod crop;
pub mod demosaic;
pub mod dev;
pub mod display;
pub mod filmcurv;
pub mod source;

pub use crop::Crop;
pub use demosaic::{Demosaic, DemosaicPush};
pub use dev::{AssemblePush, Dev, DownPush, MosaicPush};
pub use display::Display;
pub use filmcurv::FilmCurve;
pub use source::RawSource;

use rawgraph_core::{ModuleOps, ParamDescriptor};

/// Tag selecting a module implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    /// Sensor data source.
    Source,
    /// Multi-scale development.
    Dev,
    /// Mosaic to colour.
    Demosaic,
    /// Perspective correction and crop.
    Crop,
    /// Tone curve.
    FilmCurve,
    /// Viewport sink.
    Display,
}

impl ModuleKind {
    /// Every kind, in registry order.
    pub const ALL: [ModuleKind; 6] = [
        ModuleKind::Source,
        ModuleKind::Dev,
        ModuleKind::Demosaic,
        ModuleKind::Crop,
        ModuleKind::FilmCurve,
        ModuleKind::Display,
    ];

    /// Name used in pipeline files.
    pub const fn name(self) -> &'static str {
        match self {
            ModuleKind::Source => "i-raw",
            ModuleKind::Dev => "dev",
            ModuleKind::Demosaic => "demosaic",
            ModuleKind::Crop => "crop",
            ModuleKind::FilmCurve => "filmcurv",
            ModuleKind::Display => "display",
        }
    }

    /// Kind for a pipeline-file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// A fresh callback table for this kind.
    pub fn create(self) -> Box<dyn ModuleOps> {
        match self {
            ModuleKind::Source => Box::new(RawSource),
            ModuleKind::Dev => Box::new(Dev),
            ModuleKind::Demosaic => Box::new(Demosaic),
            ModuleKind::Crop => Box::new(Crop),
            ModuleKind::FilmCurve => Box::new(FilmCurve),
            ModuleKind::Display => Box::new(Display),
        }
    }
}

impl core::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes a module kind in the registry.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// Kind tag.
    pub kind: ModuleKind,
    /// Name used in pipeline files.
    pub id: &'static str,
    /// Brief description.
    pub description: &'static str,
    /// User-editable parameters.
    pub params: &'static [ParamDescriptor],
    /// Floats in the committed block.
    pub committed_len: usize,
    /// Connector names, inputs and outputs in declaration order.
    pub connectors: &'static [&'static str],
}

/// Registry of all available module kinds.
pub struct ModuleRegistry {
    entries: Vec<ModuleDescriptor>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    /// Creates a registry with every built-in kind.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(ModuleKind::ALL.len()),
        };
        registry.register(
            ModuleKind::Source,
            "Raw sensor data; mosaic or four-channel",
            &["output"],
        );
        registry.register(
            ModuleKind::Dev,
            "Four-level pyramid denoise with mosaic-aware half/double stages",
            &["input", "output"],
        );
        registry.register(
            ModuleKind::Demosaic,
            "Block demosaic; one colour pixel per mosaic block",
            &["input", "output"],
        );
        registry.register(
            ModuleKind::Crop,
            "Perspective correction by homography, plus crop window",
            &["input", "output"],
        );
        registry.register(
            ModuleKind::FilmCurve,
            "Monotone cubic tone curve through four control points",
            &["input", "output"],
        );
        registry.register(
            ModuleKind::Display,
            "Viewport sink; requests a region fitting the display size",
            &["input"],
        );
        registry
    }

    fn register(
        &mut self,
        kind: ModuleKind,
        description: &'static str,
        connectors: &'static [&'static str],
    ) {
        let ops = kind.create();
        self.entries.push(ModuleDescriptor {
            kind,
            id: kind.name(),
            description,
            params: ops.params(),
            committed_len: ops.committed_param_len(),
            connectors,
        });
    }

    /// Descriptors of all registered kinds.
    pub fn all_modules(&self) -> &[ModuleDescriptor] {
        &self.entries
    }

    /// Descriptor by pipeline-file name.
    pub fn get(&self, id: &str) -> Option<&ModuleDescriptor> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Descriptor by kind.
    pub fn get_kind(&self, kind: ModuleKind) -> Option<&ModuleDescriptor> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Creates a module by pipeline-file name. Returns `None` for an unknown
    /// name.
    pub fn create(&self, id: &str) -> Option<Box<dyn ModuleOps>> {
        self.get(id).map(|e| e.kind.create())
    }

    /// Creates a module of `kind`.
    pub fn create_kind(&self, kind: ModuleKind) -> Box<dyn ModuleOps> {
        kind.create()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawgraph_core::ImageParams;

    #[test]
    fn names_round_trip() {
        for kind in ModuleKind::ALL {
            assert_eq!(ModuleKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.create().name(), kind.name());
        }
        assert_eq!(ModuleKind::from_name("llap"), None);
    }

    #[test]
    fn registry_lists_every_kind() {
        let registry = ModuleRegistry::new();
        assert_eq!(registry.len(), ModuleKind::ALL.len());
        assert!(!registry.is_empty());
        assert!(registry.create("nonexistent").is_none());
    }

    #[test]
    fn descriptors_match_implementations() {
        let registry = ModuleRegistry::new();
        let img = ImageParams::rgb(16, 16);
        for desc in registry.all_modules() {
            let ops = registry.create(desc.id).unwrap();
            let names: Vec<&str> = ops.connectors(&img).iter().map(|c| c.name).collect();
            assert_eq!(names, desc.connectors, "{}", desc.id);
        }
        assert_eq!(registry.get("crop").unwrap().committed_len, 13);
        assert_eq!(registry.get("filmcurv").unwrap().committed_len, 12);
        assert_eq!(registry.get_kind(ModuleKind::Display).unwrap().params.len(), 2);
    }
}
