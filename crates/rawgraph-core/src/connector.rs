//! Typed pins on modules and nodes.
//!
//! The same [`Connector`] type is used at both levels; the type parameter is
//! the id of whatever a read connector's back-reference points at
//! ([`ModuleId`](crate::ModuleId) for module pins,
//! [`NodeId`](crate::NodeId) for node pins).

use core::fmt;

use crate::roi::Roi;

/// Whether a connector consumes or produces data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Input pin.
    Read,
    /// Output pin.
    Write,
}

/// Channel layout of the data on a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chan {
    /// Four-channel colour.
    Rgba,
    /// Single-channel raw colour filter mosaic.
    Rggb,
    /// Single-channel luminance.
    Y,
}

impl Chan {
    /// Short name used in dumps and pipeline files.
    pub const fn name(self) -> &'static str {
        match self {
            Chan::Rgba => "rgba",
            Chan::Rggb => "rggb",
            Chan::Y => "y",
        }
    }

    /// Number of values stored per pixel.
    pub const fn channels(self) -> u32 {
        match self {
            Chan::Rgba => 4,
            Chan::Rggb | Chan::Y => 1,
        }
    }

    /// Whether an input declared with this layout can read `upstream` data.
    ///
    /// Layouts must match, except that mosaic-aware inputs also take
    /// four-channel colour.
    pub const fn accepts(self, upstream: Chan) -> bool {
        matches!(
            (self, upstream),
            (Chan::Rgba, Chan::Rgba)
                | (Chan::Rggb, Chan::Rggb | Chan::Rgba)
                | (Chan::Y, Chan::Y)
        )
    }
}

/// Pixel storage precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Half float.
    F16,
    /// Single float.
    F32,
    /// Unsigned 16 bit.
    Ui16,
    /// Unsigned 8 bit.
    Ui8,
}

impl Format {
    /// Short name used in dumps and pipeline files.
    pub const fn name(self) -> &'static str {
        match self {
            Format::F16 => "f16",
            Format::F32 => "f32",
            Format::Ui16 => "ui16",
            Format::Ui8 => "ui8",
        }
    }

    /// Bytes per stored value.
    pub const fn bytes(self) -> u32 {
        match self {
            Format::F16 | Format::Ui16 => 2,
            Format::F32 => 4,
            Format::Ui8 => 1,
        }
    }
}

impl fmt::Display for Chan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Back-reference from a read connector to the write connector feeding it.
///
/// Records where data comes from; implies no ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link<I> {
    /// Producing module or node.
    pub id: I,
    /// Index of the producer's write connector.
    pub connector: usize,
}

/// A named, typed pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector<I> {
    /// Pin name, unique within its owner.
    pub name: &'static str,
    /// Read or write.
    pub direction: Direction,
    /// Channel layout.
    pub chan: Chan,
    /// Storage precision.
    pub format: Format,
    /// Region carried by this pin.
    pub roi: Roi,
    /// Input is sampled with interpolation rather than fetched per texel.
    pub smooth: bool,
    /// Producer feeding this pin (read connectors only). `None` until wired.
    pub connected: Option<Link<I>>,
}

impl<I> Connector<I> {
    /// An input pin.
    pub fn read(name: &'static str, chan: Chan, format: Format) -> Self {
        Self::new(name, Direction::Read, chan, format)
    }

    /// An output pin.
    pub fn write(name: &'static str, chan: Chan, format: Format) -> Self {
        Self::new(name, Direction::Write, chan, format)
    }

    fn new(name: &'static str, direction: Direction, chan: Chan, format: Format) -> Self {
        Self {
            name,
            direction,
            chan,
            format,
            roi: Roi::default(),
            smooth: false,
            connected: None,
        }
    }

    /// Sets the region carried by this pin.
    pub fn with_roi(mut self, roi: Roi) -> Self {
        self.roi = roi;
        self
    }

    /// Marks the pin as sampled with interpolation.
    pub fn smooth(mut self) -> Self {
        self.smooth = true;
        self
    }

    /// Returns `true` for read connectors.
    pub fn is_input(&self) -> bool {
        self.direction == Direction::Read
    }

    /// Returns `true` for write connectors.
    pub fn is_output(&self) -> bool {
        self.direction == Direction::Write
    }

    /// Buffer size in bytes for the requested region.
    pub fn buffer_size(&self) -> u64 {
        u64::from(self.roi.wd)
            * u64::from(self.roi.ht)
            * u64::from(self.chan.channels())
            * u64::from(self.format.bytes())
    }
}
