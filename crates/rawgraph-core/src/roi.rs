//! Region of interest carried by every connector.
//!
//! A [`Roi`] describes which part of an image buffer a connector represents:
//! the full (unscaled) size of the buffer's source, the requested size, the
//! top-left offset of the request, and the scale relating the two.
//!
//! ROIs are plain values. They are recomputed on every compile pass: the
//! forward pass fills in full sizes ([`ModuleOps::roi_out`]), the backward pass
//! fills in requests ([`ModuleOps::roi_in`]).
//!
//! [`ModuleOps::roi_out`]: crate::ModuleOps::roi_out
//! [`ModuleOps::roi_in`]: crate::ModuleOps::roi_in

use thiserror::Error;

/// Largest deviation, in pixels, tolerated between `wd` and `full_wd * scale`.
///
/// Requested sizes are integers obtained by truncating `full * scale`, so the
/// product can be off by up to one pixel.
pub const SCALE_TOLERANCE_PX: f32 = 1.0;

/// Rectangular image region with its scale relative to the full buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Roi {
    /// Full (unscaled) width of the source buffer.
    pub full_wd: u32,
    /// Full (unscaled) height of the source buffer.
    pub full_ht: u32,
    /// Requested width.
    pub wd: u32,
    /// Requested height.
    pub ht: u32,
    /// Horizontal offset of the requested region.
    pub x: u32,
    /// Vertical offset of the requested region.
    pub y: u32,
    /// Requested size over full size. `1.0` is a full-resolution request.
    pub scale: f32,
}

/// Ways a [`Roi`] can be internally inconsistent.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum RoiError {
    /// Full or requested size is zero.
    #[error("empty region {wd}x{ht} (full {full_wd}x{full_ht})")]
    Empty {
        /// Requested width.
        wd: u32,
        /// Requested height.
        ht: u32,
        /// Full width.
        full_wd: u32,
        /// Full height.
        full_ht: u32,
    },

    /// Requested size is larger than the full size.
    #[error("request {wd}x{ht} exceeds full size {full_wd}x{full_ht}")]
    ExceedsFull {
        /// Requested width.
        wd: u32,
        /// Requested height.
        ht: u32,
        /// Full width.
        full_wd: u32,
        /// Full height.
        full_ht: u32,
    },

    /// The scale does not match requested over full size.
    #[error("scale {scale} does not match request {wd}x{ht} of {full_wd}x{full_ht}")]
    ScaleMismatch {
        /// Stored scale.
        scale: f32,
        /// Requested width.
        wd: u32,
        /// Requested height.
        ht: u32,
        /// Full width.
        full_wd: u32,
        /// Full height.
        full_ht: u32,
    },
}

impl Roi {
    /// A full-resolution region covering a `wd` x `ht` buffer.
    pub const fn full(wd: u32, ht: u32) -> Self {
        Self {
            full_wd: wd,
            full_ht: ht,
            wd,
            ht,
            x: 0,
            y: 0,
            scale: 1.0,
        }
    }

    /// Resets the request to the entire buffer at full resolution.
    pub fn request_full(&mut self) {
        self.wd = self.full_wd;
        self.ht = self.full_ht;
        self.x = 0;
        self.y = 0;
        self.scale = 1.0;
    }

    /// Replaces the full size. The request is reset to the new full extent;
    /// the backward pass renegotiates it.
    pub fn with_full_size(mut self, full_wd: u32, full_ht: u32) -> Self {
        self.full_wd = full_wd;
        self.full_ht = full_ht;
        self.request_full();
        self
    }

    /// Takes over a consumer's request (size, offset, scale), keeping this
    /// region's full size.
    pub fn request_from(&mut self, request: &Roi) {
        self.wd = request.wd.min(self.full_wd);
        self.ht = request.ht.min(self.full_ht);
        self.x = request.x;
        self.y = request.y;
        self.scale = request.scale;
    }

    /// Requests the largest region that fits `max_wd` x `max_ht` while keeping
    /// the aspect ratio. Never upscales.
    pub fn fit_within(&mut self, max_wd: u32, max_ht: u32) {
        if self.full_wd == 0 || self.full_ht == 0 {
            return;
        }
        let scale = (max_wd as f32 / self.full_wd as f32)
            .min(max_ht as f32 / self.full_ht as f32)
            .min(1.0);
        if scale >= 1.0 {
            self.request_full();
            return;
        }
        self.wd = ((self.full_wd as f32 * scale) as u32).max(1);
        self.ht = ((self.full_ht as f32 * scale) as u32).max(1);
        self.x = 0;
        self.y = 0;
        self.scale = scale;
    }

    /// Divides every size and offset by `block`, truncating.
    ///
    /// Used to go from mosaic resolution to one pixel per mosaic block. Odd
    /// crop boundaries lose their last partial block.
    pub fn divided(&self, block: u32) -> Self {
        debug_assert!(block > 0);
        Self {
            full_wd: self.full_wd / block,
            full_ht: self.full_ht / block,
            wd: self.wd / block,
            ht: self.ht / block,
            x: self.x / block,
            y: self.y / block,
            scale: self.scale,
        }
    }

    /// Returns `true` if the request covers the whole buffer at scale 1.
    pub fn is_full_request(&self) -> bool {
        self.wd == self.full_wd && self.ht == self.full_ht && self.scale == 1.0
    }

    /// Checks that the region is non-empty, the request fits the full size and
    /// the scale matches requested over full size.
    pub fn validate(&self) -> Result<(), RoiError> {
        if self.full_wd == 0 || self.full_ht == 0 || self.wd == 0 || self.ht == 0 {
            return Err(RoiError::Empty {
                wd: self.wd,
                ht: self.ht,
                full_wd: self.full_wd,
                full_ht: self.full_ht,
            });
        }
        if self.wd > self.full_wd || self.ht > self.full_ht {
            return Err(RoiError::ExceedsFull {
                wd: self.wd,
                ht: self.ht,
                full_wd: self.full_wd,
                full_ht: self.full_ht,
            });
        }
        let mismatch = || RoiError::ScaleMismatch {
            scale: self.scale,
            wd: self.wd,
            ht: self.ht,
            full_wd: self.full_wd,
            full_ht: self.full_ht,
        };
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(mismatch());
        }
        let dw = (self.wd as f32 - self.full_wd as f32 * self.scale).abs();
        let dh = (self.ht as f32 - self.full_ht as f32 * self.scale).abs();
        if dw > SCALE_TOLERANCE_PX || dh > SCALE_TOLERANCE_PX {
            return Err(mismatch());
        }
        Ok(())
    }

    /// Returns `true` if [`validate`](Self::validate) succeeds.
    pub fn is_consistent(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_region_is_consistent() {
        let roi = Roi::full(6000, 4000);
        assert!(roi.is_full_request());
        assert!(roi.is_consistent());
    }

    #[test]
    fn fit_within_keeps_aspect() {
        let mut roi = Roi::full(6000, 4000);
        roi.fit_within(1920, 1080);
        assert_eq!(roi.ht, 1080);
        assert_eq!(roi.wd, 1620);
        assert!((roi.scale - 0.27).abs() < 1e-6);
        assert!(roi.is_consistent());
    }

    #[test]
    fn fit_within_never_upscales() {
        let mut roi = Roi::full(640, 480);
        roi.fit_within(1920, 1080);
        assert!(roi.is_full_request());
    }

    #[test]
    fn divided_truncates() {
        let roi = Roi {
            full_wd: 5985,
            full_ht: 3985,
            wd: 1001,
            ht: 667,
            x: 3,
            y: 5,
            scale: 0.5,
        };
        let half = roi.divided(2);
        assert_eq!((half.full_wd, half.full_ht), (2992, 1992));
        assert_eq!((half.wd, half.ht), (500, 333));
        assert_eq!((half.x, half.y), (1, 2));
        assert_eq!(half.scale, 0.5);
        let third = roi.divided(3);
        assert_eq!((third.full_wd, third.full_ht), (1995, 1328));
    }

    #[test]
    fn with_full_size_resets_request() {
        let mut roi = Roi::full(6000, 4000);
        roi.fit_within(1000, 1000);
        let cropped = roi.with_full_size(5984, 3984);
        assert_eq!(cropped.wd, 5984);
        assert!(cropped.is_full_request());
    }

    #[test]
    fn request_from_clamps_to_full() {
        let mut roi = Roi::full(100, 50);
        roi.request_from(&Roi::full(200, 100));
        assert_eq!((roi.wd, roi.ht), (100, 50));
    }

    #[test]
    fn validate_rejects_empty() {
        let roi = Roi::full(0, 10);
        assert!(matches!(roi.validate(), Err(RoiError::Empty { .. })));
    }

    #[test]
    fn validate_rejects_oversized_request() {
        let mut roi = Roi::full(100, 100);
        roi.wd = 101;
        assert!(matches!(roi.validate(), Err(RoiError::ExceedsFull { .. })));
    }

    #[test]
    fn validate_rejects_bad_scale() {
        let mut roi = Roi::full(100, 100);
        roi.wd = 50;
        roi.ht = 50;
        assert!(matches!(roi.validate(), Err(RoiError::ScaleMismatch { .. })));
        roi.scale = 0.5;
        assert!(roi.validate().is_ok());
        roi.scale = f32::NAN;
        assert!(roi.validate().is_err());
    }
}
