//! Per-image sensor metadata shared read-only by every module.

use crate::connector::Chan;

/// Filter-pattern value marking a 6x6 X-Trans sensor.
pub const FILTERS_XTRANS: u32 = 9;

/// Largest raw sensor value; black and white points are normalized by it.
pub const RAW_WHITE: f32 = 65535.0;

/// Sensor and development metadata for the image being processed.
///
/// Passed by shared reference into every module callback during a compile
/// pass. Modules never mutate it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageParams {
    /// Sensor width in pixels (uncropped).
    pub width: u32,
    /// Sensor height in pixels (uncropped).
    pub height: u32,
    /// Colour filter array pattern. `0` means no mosaic, `9` is X-Trans, any
    /// other value is a 2x2 Bayer layout.
    pub filters: u32,
    /// White balance multipliers.
    pub whitebalance: [f32; 4],
    /// Black point per channel, in raw sensor units.
    pub black: [f32; 4],
    /// White point per channel, in raw sensor units.
    pub white: [f32; 4],
    /// Noise model: signal-independent (gaussian) part.
    pub noise_a: f32,
    /// Noise model: signal-dependent (poissonian) part.
    pub noise_b: f32,
    /// Valid sensor area as `[x0, y0, x1, y1]`.
    pub crop_aabb: [u32; 4],
}

impl ImageParams {
    /// Metadata for an already-demosaiced image of the given size.
    pub fn rgb(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filters: 0,
            whitebalance: [1.0; 4],
            black: [0.0; 4],
            white: [RAW_WHITE; 4],
            noise_a: 0.0,
            noise_b: 0.0,
            crop_aabb: [0, 0, width, height],
        }
    }

    /// Returns `true` if the sensor delivers a colour filter mosaic.
    pub fn is_mosaic(&self) -> bool {
        self.filters != 0
    }

    /// Channel layout of the sensor data.
    pub fn sensor_chan(&self) -> Chan {
        if self.is_mosaic() { Chan::Rggb } else { Chan::Rgba }
    }

    /// Size of the valid sensor area.
    pub fn crop_size(&self) -> (u32, u32) {
        let b = &self.crop_aabb;
        (b[2].saturating_sub(b[0]), b[3].saturating_sub(b[1]))
    }

    /// Black points scaled to `[0, 1]`.
    pub fn black_normalized(&self) -> [f32; 4] {
        self.black.map(|v| v / RAW_WHITE)
    }

    /// White points scaled to `[0, 1]`.
    pub fn white_normalized(&self) -> [f32; 4] {
        self.white.map(|v| v / RAW_WHITE)
    }

    /// Repeat period of the mosaic for data with channel layout `chan`:
    /// 1 without a mosaic, 3 for X-Trans, 2 for Bayer.
    pub fn block_size(&self, chan: Chan) -> u32 {
        if chan != Chan::Rggb {
            1
        } else if self.filters == FILTERS_XTRANS {
            3
        } else {
            2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bayer() -> ImageParams {
        ImageParams {
            filters: 0x94949494,
            crop_aabb: [8, 10, 5992, 3990],
            ..ImageParams::rgb(6000, 4000)
        }
    }

    #[test]
    fn block_size_follows_layout_and_pattern() {
        let mut img = bayer();
        assert_eq!(img.block_size(Chan::Rgba), 1);
        assert_eq!(img.block_size(Chan::Rggb), 2);
        img.filters = FILTERS_XTRANS;
        assert_eq!(img.block_size(Chan::Rggb), 3);
        assert_eq!(img.block_size(Chan::Y), 1);
    }

    #[test]
    fn crop_size_is_aabb_extent() {
        assert_eq!(bayer().crop_size(), (5984, 3980));
    }

    #[test]
    fn sensor_chan() {
        assert_eq!(bayer().sensor_chan(), Chan::Rggb);
        assert_eq!(ImageParams::rgb(10, 10).sensor_chan(), Chan::Rgba);
    }

    #[test]
    fn normalized_points() {
        let mut img = bayer();
        img.black = [512.0; 4];
        assert_eq!(img.black_normalized()[0], 512.0 / 65535.0);
        assert_eq!(img.white_normalized()[3], 1.0);
    }
}
