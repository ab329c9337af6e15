//! The packed output surface exposed to field consumers.
//!
//! Backends own one [`HeightField`] and rewrite it in place every step;
//! renderers and the caustics estimator receive only shared references,
//! so the binding they cache stays valid across frames while the
//! integration buffers ping-pong underneath.

use bytemuck::{Pod, Zeroable};

use crate::error::{RainpondError, Result};

/// One 4-channel output record.
///
/// `normal_x`/`normal_y` are raw central-difference gradients, not a unit
/// vector; consumers construct the shading normal as
/// `normalize(normal_x, normal_y, 1)`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SurfaceSample {
    /// Signed vertical displacement.
    pub height: f32,
    /// Height change over the last completed step.
    pub velocity: f32,
    /// `(left.height - right.height) * 2`.
    pub normal_x: f32,
    /// `(up.height - down.height) * 2`.
    pub normal_y: f32,
}

/// A square, row-major grid of [`SurfaceSample`] records.
///
/// Allocated once for a fixed resolution and never resized.
pub struct HeightField {
    resolution: u32,
    samples: Vec<SurfaceSample>,
}

impl HeightField {
    /// Create a zeroed field. Fails only on zero resolution.
    pub fn new(resolution: u32) -> Result<Self> {
        if resolution == 0 {
            return Err(RainpondError::invalid_config(
                "field resolution must be at least 1",
            ));
        }
        let size = (resolution as usize) * (resolution as usize);
        Ok(Self {
            resolution,
            samples: vec![SurfaceSample::default(); size],
        })
    }

    /// Grid resolution (cells per side).
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the field has no cells. Always false for a constructed field.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Convert (x, y) coordinates to a linear index.
    #[inline(always)]
    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.resolution as usize) + (x as usize)
    }

    /// Bounds-checked cell access.
    pub fn sample(&self, x: u32, y: u32) -> Option<&SurfaceSample> {
        if x < self.resolution && y < self.resolution {
            Some(&self.samples[self.idx(x, y)])
        } else {
            None
        }
    }

    /// The full record buffer in row-major order.
    #[inline]
    pub fn samples(&self) -> &[SurfaceSample] {
        &self.samples
    }

    /// Mutable record buffer, for integrators filling the surface.
    ///
    /// Field consumers only ever see `&HeightField`; this is reachable
    /// solely through the owning backend.
    #[inline]
    pub fn samples_mut(&mut self) -> &mut [SurfaceSample] {
        &mut self.samples
    }

    /// Bilinear sample at normalized coordinates, for per-vertex mesh
    /// consumers. Inputs are clamped to `[0, 1]`.
    pub fn sample_uv(&self, u: f32, v: f32) -> SurfaceSample {
        let max = (self.resolution - 1) as f32;
        let fx = u.clamp(0.0, 1.0) * max;
        let fy = v.clamp(0.0, 1.0) * max;

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(self.resolution - 1);
        let y1 = (y0 + 1).min(self.resolution - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let s00 = self.samples[self.idx(x0, y0)];
        let s10 = self.samples[self.idx(x1, y0)];
        let s01 = self.samples[self.idx(x0, y1)];
        let s11 = self.samples[self.idx(x1, y1)];

        let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
        let blend = |f: fn(&SurfaceSample) -> f32| {
            lerp(lerp(f(&s00), f(&s10), tx), lerp(f(&s01), f(&s11), tx), ty)
        };

        SurfaceSample {
            height: blend(|s| s.height),
            velocity: blend(|s| s.velocity),
            normal_x: blend(|s| s.normal_x),
            normal_y: blend(|s| s.normal_y),
        }
    }

    /// Sum of squared heights over the grid.
    pub fn total_energy(&self) -> f32 {
        self.samples.iter().map(|s| s.height * s.height).sum()
    }

    /// Maximum absolute height over the grid.
    pub fn max_height(&self) -> f32 {
        self.samples
            .iter()
            .map(|s| s.height.abs())
            .fold(0.0, f32::max)
    }

    /// Zero every channel of every cell.
    pub fn reset(&mut self) {
        self.samples.fill(SurfaceSample::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_creation() {
        let field = HeightField::new(8).unwrap();
        assert_eq!(field.resolution(), 8);
        assert_eq!(field.len(), 64);
        assert!(field.samples().iter().all(|s| s.height == 0.0));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        assert!(HeightField::new(0).is_err());
    }

    #[test]
    fn test_row_major_indexing() {
        let mut field = HeightField::new(4).unwrap();
        field.samples_mut()[2 * 4 + 3].height = 1.5;
        assert_eq!(field.sample(3, 2).unwrap().height, 1.5);
        assert!(field.sample(4, 0).is_none());
        assert!(field.sample(0, 4).is_none());
    }

    #[test]
    fn test_bilinear_sampling() {
        let mut field = HeightField::new(2).unwrap();
        field.samples_mut()[0].height = 0.0; // (0, 0)
        field.samples_mut()[1].height = 1.0; // (1, 0)
        field.samples_mut()[2].height = 2.0; // (0, 1)
        field.samples_mut()[3].height = 3.0; // (1, 1)

        assert!((field.sample_uv(0.0, 0.0).height - 0.0).abs() < 1e-6);
        assert!((field.sample_uv(1.0, 1.0).height - 3.0).abs() < 1e-6);
        // Center of the 2x2 grid averages all four corners.
        assert!((field.sample_uv(0.5, 0.5).height - 1.5).abs() < 1e-6);
        // Out-of-range inputs clamp instead of wrapping.
        assert!((field.sample_uv(2.0, -1.0).height - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_diagnostics() {
        let mut field = HeightField::new(3).unwrap();
        field.samples_mut()[4].height = -2.0;
        field.samples_mut()[0].height = 1.0;
        assert!((field.total_energy() - 5.0).abs() < 1e-6);
        assert_eq!(field.max_height(), 2.0);

        field.reset();
        assert_eq!(field.total_energy(), 0.0);
        assert_eq!(field.max_height(), 0.0);
    }
}
