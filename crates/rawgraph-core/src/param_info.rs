//! Parameter descriptors for module parameter blocks.
//!
//! A module's user-facing parameters are stored as one flat `f32` block.
//! Each [`ParamDescriptor`] names a contiguous run of that block; a parameter
//! may hold several floats (four corner points are one 8-float parameter).
//! Descriptors are declared in order, so a parameter's offset is the sum of
//! the lengths of the parameters before it.

/// Metadata for one named parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Stable name used in pipeline files.
    pub name: &'static str,
    /// Short description for listings.
    pub description: &'static str,
    /// Default values; the length fixes the parameter's size.
    pub default: &'static [f32],
    /// Smallest accepted value (applies to every element).
    pub min: f32,
    /// Largest accepted value (applies to every element).
    pub max: f32,
}

impl ParamDescriptor {
    /// An unbounded parameter.
    pub const fn new(name: &'static str, description: &'static str, default: &'static [f32]) -> Self {
        Self {
            name,
            description,
            default,
            min: f32::NEG_INFINITY,
            max: f32::INFINITY,
        }
    }

    /// Restricts every element to `[min, max]`.
    pub const fn with_range(self, min: f32, max: f32) -> Self {
        Self { min, max, ..self }
    }

    /// Number of floats in the parameter.
    pub const fn len(&self) -> usize {
        self.default.len()
    }

    /// Returns `true` for a zero-length parameter.
    pub const fn is_empty(&self) -> bool {
        self.default.is_empty()
    }

    /// Returns `true` if `value` is finite and within range.
    pub fn accepts(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Total float count of a descriptor list.
pub fn param_block_len(params: &[ParamDescriptor]) -> usize {
    params.iter().map(ParamDescriptor::len).sum()
}

/// Offset and length of parameter `name` within the flat block.
pub fn param_span(params: &[ParamDescriptor], name: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for p in params {
        if p.name == name {
            return Some((offset, p.len()));
        }
        offset += p.len();
    }
    None
}
