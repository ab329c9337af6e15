//! Light-convergence estimation from surface curvature.
//!
//! An independent derived-field pass on its own refresh cadence: each
//! output cell samples the height field's Laplacian as a curvature
//! estimate, optionally displaced by refracting the configured light
//! direction through the local surface normal and projecting to the pond
//! floor. Convex regions focus light, concave regions scatter it.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rainpond_core::{CausticsParams, HeightField, RainpondError, Result};
use rayon::prelude::*;

use crate::simulation::PARALLEL_THRESHOLD;

/// Index of refraction of water against air.
const WATER_IOR: f32 = 1.33;

/// Intensity of a perfectly flat surface before the global multiplier.
const BASE_INTENSITY: f32 = 0.3;

/// Warmth fraction separating the red and blue channels.
const WARMTH_BIAS: f32 = 0.08;

/// Vertical component paired with the packed surface slopes when
/// rebuilding a normal; the slopes carry a 4x central-difference gain.
const NORMAL_UP: f32 = 4.0;

/// One RGB intensity estimate, each channel in `[0, 2]`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CausticsPixel {
    /// Warm channel, biased up under convex curvature.
    pub red: f32,
    /// Scalar light-convergence intensity.
    pub green: f32,
    /// Cool channel, biased down under convex curvature.
    pub blue: f32,
}

/// Grid of light-convergence intensities matching the wave field.
#[derive(Debug, Clone)]
pub struct CausticsField {
    resolution: u32,
    pixels: Vec<CausticsPixel>,
}

impl CausticsField {
    fn new(resolution: u32) -> Result<Self> {
        if resolution == 0 {
            return Err(RainpondError::invalid_config(
                "caustics resolution must be at least 1",
            ));
        }
        let cells = resolution as usize * resolution as usize;
        Ok(Self {
            resolution,
            pixels: vec![CausticsPixel::default(); cells],
        })
    }

    /// Grid side length in cells.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> &[CausticsPixel] {
        &self.pixels
    }

    /// The pixel at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&CausticsPixel> {
        if x < self.resolution && y < self.resolution {
            self.pixels
                .get(y as usize * self.resolution as usize + x as usize)
        } else {
            None
        }
    }
}

/// Border-clamped 4-neighbor Laplacian of the height channel.
fn laplacian_at(surface: &HeightField, x: usize, y: usize, res: usize) -> f32 {
    let samples = surface.samples();
    let h = |cx: usize, cy: usize| samples[cy * res + cx].height;
    let left = h(x.saturating_sub(1), y);
    let right = h((x + 1).min(res - 1), y);
    let up = h(x, y.saturating_sub(1));
    let down = h(x, (y + 1).min(res - 1));
    left + right + up + down - 4.0 * h(x, y)
}

/// Cell whose curvature feeds `(x, y)` after refracting the light ray
/// through the local normal and projecting it to the floor plane.
fn refraction_source(
    surface: &HeightField,
    light: Vec3,
    depth: f32,
    x: usize,
    y: usize,
    res: usize,
) -> (usize, usize) {
    let sample = surface.samples()[y * res + x];
    let normal = Vec3::new(sample.normal_x, NORMAL_UP, sample.normal_y).normalize();
    let eta = 1.0 / WATER_IOR;
    let cos_incident = -light.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - cos_incident * cos_incident);
    if k < 0.0 {
        return (x, y);
    }
    let refracted = eta * light + (eta * cos_incident - k.sqrt()) * normal;
    if refracted.y >= -1e-6 {
        return (x, y);
    }
    let travel = depth / -refracted.y;
    let dx = (refracted.x * travel).round() as i64;
    let dy = (refracted.z * travel).round() as i64;
    let sx = (x as i64 + dx).clamp(0, res as i64 - 1) as usize;
    let sy = (y as i64 + dy).clamp(0, res as i64 - 1) as usize;
    (sx, sy)
}

fn shade_cell(
    surface: &HeightField,
    light: Vec3,
    depth: f32,
    focus_gain: f32,
    intensity_scale: f32,
    x: usize,
    y: usize,
    res: usize,
) -> CausticsPixel {
    let (sx, sy) = refraction_source(surface, light, depth, x, y, res);
    let curvature = -laplacian_at(surface, sx, sy, res);
    let intensity =
        ((BASE_INTENSITY + curvature * focus_gain) * intensity_scale).clamp(0.0, 2.0);
    let warmth = if curvature > 0.0 {
        WARMTH_BIAS
    } else if curvature < 0.0 {
        -WARMTH_BIAS
    } else {
        0.0
    };
    CausticsPixel {
        red: (intensity * (1.0 + warmth)).clamp(0.0, 2.0),
        green: intensity,
        blue: (intensity * (1.0 - warmth)).clamp(0.0, 2.0),
    }
}

/// Derives light-convergence intensity from the exposed wave surface.
///
/// Owns its output field; `refresh` rewrites it in place from whatever
/// surface snapshot the caller passes in. Reconfiguration takes effect on
/// the next refresh, previously produced pixels are never revised.
pub struct CausticsEstimator {
    params: CausticsParams,
    field: CausticsField,
}

impl CausticsEstimator {
    /// Create an estimator for a `resolution` x `resolution` surface.
    pub fn new(resolution: u32, params: CausticsParams) -> Result<Self> {
        Ok(Self {
            params,
            field: CausticsField::new(resolution)?,
        })
    }

    /// The most recently computed intensity field.
    pub fn field(&self) -> &CausticsField {
        &self.field
    }

    /// Current estimator configuration.
    pub fn params(&self) -> &CausticsParams {
        &self.params
    }

    /// Update the global intensity multiplier. Rejects negative values.
    pub fn set_intensity(&mut self, intensity: f32) -> Result<()> {
        self.params.set_intensity(intensity)
    }

    /// Update the curvature gain. Rejects negative values.
    pub fn set_focus_gain(&mut self, gain: f32) -> Result<()> {
        self.params.set_focus_gain(gain)
    }

    /// Update the incoming light direction. Rejects zero vectors.
    pub fn set_light_direction(&mut self, direction: Vec3) -> Result<()> {
        self.params.set_light_direction(direction)
    }

    /// Update the assumed pond depth. Rejects non-positive values.
    pub fn set_water_depth(&mut self, depth: f32) -> Result<()> {
        self.params.set_water_depth(depth)
    }

    /// Recompute the intensity field from a surface snapshot.
    pub fn refresh(&mut self, surface: &HeightField) -> Result<()> {
        if surface.resolution() != self.field.resolution {
            return Err(RainpondError::invalid_config(format!(
                "surface resolution {} does not match caustics field resolution {}",
                surface.resolution(),
                self.field.resolution
            )));
        }
        let res = self.field.resolution as usize;
        let light = self.params.light_direction();
        let depth = self.params.water_depth();
        let focus_gain = self.params.focus_gain();
        let intensity_scale = self.params.intensity();

        if res >= PARALLEL_THRESHOLD {
            self.field
                .pixels
                .par_chunks_mut(res)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, pixel) in row.iter_mut().enumerate() {
                        *pixel = shade_cell(
                            surface,
                            light,
                            depth,
                            focus_gain,
                            intensity_scale,
                            x,
                            y,
                            res,
                        );
                    }
                });
        } else {
            for y in 0..res {
                for x in 0..res {
                    self.field.pixels[y * res + x] = shade_cell(
                        surface,
                        light,
                        depth,
                        focus_gain,
                        intensity_scale,
                        x,
                        y,
                        res,
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{CpuRipples, WaveBackend};
    use rainpond_core::{Impact, WaveParams};

    fn rippled_surface(steps: u32) -> CpuRipples {
        let params = WaveParams::new(0.3, 0.99)
            .unwrap()
            .with_edge_fade(0, 1.0)
            .unwrap();
        let mut sim = CpuRipples::new(33, params).unwrap();
        sim.queue_impact(Impact::new(0.5, 0.5, 1.0));
        for _ in 0..steps {
            sim.step().unwrap();
        }
        sim
    }

    #[test]
    fn test_flat_surface_gives_uniform_base_level() {
        let surface = HeightField::new(9).unwrap();
        let mut caustics = CausticsEstimator::new(9, CausticsParams::default()).unwrap();
        caustics.refresh(&surface).unwrap();

        for pixel in caustics.field().pixels() {
            assert_eq!(pixel.green, 0.3);
            assert_eq!(pixel.red, 0.3);
            assert_eq!(pixel.blue, 0.3);
        }
    }

    #[test]
    fn test_crest_brightens_above_base_level() {
        let mut sim = rippled_surface(1);
        let params = CausticsParams::new(1.0, 0.5).unwrap();
        let mut caustics = CausticsEstimator::new(33, params).unwrap();
        caustics.refresh(sim.read_surface().unwrap()).unwrap();

        let center = caustics.field().pixel(16, 16).unwrap();
        assert!(center.green > 0.3);
        assert!(center.green < 2.0);
        assert!(center.red > center.green);
        assert!(center.blue < center.green);
    }

    #[test]
    fn test_intensity_clamps_to_valid_range() {
        let mut sim = rippled_surface(1);
        // Default focus gain saturates the crest against the upper bound.
        let mut caustics = CausticsEstimator::new(33, CausticsParams::default()).unwrap();
        caustics.refresh(sim.read_surface().unwrap()).unwrap();

        assert_eq!(caustics.field().pixel(16, 16).unwrap().green, 2.0);
        for pixel in caustics.field().pixels() {
            for channel in [pixel.red, pixel.green, pixel.blue] {
                assert!((0.0..=2.0).contains(&channel));
            }
        }
    }

    #[test]
    fn test_oblique_light_stays_in_bounds() {
        let mut sim = rippled_surface(6);
        let mut caustics = CausticsEstimator::new(33, CausticsParams::default()).unwrap();
        caustics
            .set_light_direction(Vec3::new(0.6, -1.0, 0.3))
            .unwrap();
        caustics.set_water_depth(40.0).unwrap();
        caustics.refresh(sim.read_surface().unwrap()).unwrap();

        for pixel in caustics.field().pixels() {
            assert!(pixel.green.is_finite());
            assert!((0.0..=2.0).contains(&pixel.green));
        }
    }

    #[test]
    fn test_resolution_mismatch_is_rejected() {
        let surface = HeightField::new(16).unwrap();
        let mut caustics = CausticsEstimator::new(17, CausticsParams::default()).unwrap();
        assert!(caustics.refresh(&surface).is_err());
    }

    #[test]
    fn test_reconfiguration_applies_on_next_refresh() {
        let mut sim = rippled_surface(1);
        let mut caustics = CausticsEstimator::new(33, CausticsParams::default()).unwrap();
        caustics.refresh(sim.read_surface().unwrap()).unwrap();
        let before = *caustics.field().pixel(16, 16).unwrap();

        caustics.set_intensity(0.0).unwrap();
        assert_eq!(*caustics.field().pixel(16, 16).unwrap(), before);

        caustics.refresh(sim.read_surface().unwrap()).unwrap();
        assert_eq!(caustics.field().pixel(16, 16).unwrap().green, 0.0);
    }
}
