//! Host-side wave integration.
//!
//! Advances the leapfrog form of the 2D wave equation over two scalar
//! height grids and publishes the result into a [`HeightField`]. Rows are
//! processed in parallel once the grid reaches [`PARALLEL_THRESHOLD`].

use rainpond_core::{
    HeightField, Impact, ImpactQueue, Result, SurfaceSample, WaveParams, IMPACT_RADIUS,
};
use rayon::prelude::*;
use tracing::debug;

use super::backend::{Backend, WaveBackend};

/// Grid side length at which integration switches to row-parallel rayon.
pub const PARALLEL_THRESHOLD: usize = 512;

/// Leapfrog update for one interior cell.
///
/// Reads the 4-neighbor stencil from the pre-update grid and returns the
/// new height together with the surface normal of the pre-update grid, so
/// both execution paths stay bit-identical.
#[inline(always)]
fn integrate_cell(
    current: &[f32],
    prev_height: f32,
    absorption: f32,
    i: usize,
    res: usize,
    c2: f32,
    damping: f32,
) -> (f32, f32, f32) {
    let center = current[i];
    let left = current[i - 1];
    let right = current[i + 1];
    let up = current[i - res];
    let down = current[i + res];
    let laplacian = left + right + up + down - 4.0 * center;
    let next = (2.0 * center - prev_height + c2 * laplacian) * damping * absorption;
    let normal_x = (left - right) * 2.0;
    let normal_y = (up - down) * 2.0;
    (next, normal_x, normal_y)
}

/// Wave integrator running on the host CPU.
///
/// Keeps two height grids that swap roles every step plus a precomputed
/// per-cell absorption table for the edge fade band. Impacts are injected
/// into both grids so a fresh splash starts with zero vertical velocity
/// and its crest never overshoots the impact strength.
pub struct CpuRipples {
    params: WaveParams,
    resolution: u32,
    current: Vec<f32>,
    previous: Vec<f32>,
    absorption: Vec<f32>,
    surface: HeightField,
    impacts: ImpactQueue,
}

impl CpuRipples {
    /// Create a resting pond of `resolution` x `resolution` cells.
    pub fn new(resolution: u32, params: WaveParams) -> Result<Self> {
        let surface = HeightField::new(resolution)?;
        let cells = surface.len();
        let mut sim = Self {
            params,
            resolution,
            current: vec![0.0; cells],
            previous: vec![0.0; cells],
            absorption: vec![1.0; cells],
            surface,
            impacts: ImpactQueue::new(),
        };
        sim.rebuild_absorption();
        debug!(
            "CPU wave integrator ready: {}x{} cells",
            resolution, resolution
        );
        Ok(sim)
    }

    /// Recompute the edge fade table from the current parameters.
    fn rebuild_absorption(&mut self) {
        let res = self.resolution as usize;
        let width = self.params.edge_fade_width();
        let strength = self.params.edge_fade_strength();
        if width == 0 {
            self.absorption.fill(1.0);
            return;
        }
        let width = width as f32;
        for y in 0..res {
            for x in 0..res {
                let dist = x.min(y).min(res - 1 - x).min(res - 1 - y) as f32;
                let t = (dist / width).clamp(0.0, 1.0);
                let smooth = t * t * (3.0 - 2.0 * t);
                self.absorption[y * res + x] = strength + (1.0 - strength) * smooth;
            }
        }
    }

    /// Splash every queued impact into both height grids.
    fn apply_impacts(&mut self) {
        let res = self.resolution as usize;
        for impact in self.impacts.drain() {
            let (cx, cy) = impact.grid_position(self.resolution);
            let min_x = (cx - IMPACT_RADIUS).floor().max(0.0) as usize;
            let max_x = ((cx + IMPACT_RADIUS).ceil() as usize).min(res - 1);
            let min_y = (cy - IMPACT_RADIUS).floor().max(0.0) as usize;
            let max_y = ((cy + IMPACT_RADIUS).ceil() as usize).min(res - 1);
            for y in min_y..=max_y {
                for x in min_x..=max_x {
                    let dx = x as f32 - cx;
                    let dy = y as f32 - cy;
                    let dist = (dx * dx + dy * dy).sqrt();
                    if dist >= IMPACT_RADIUS {
                        continue;
                    }
                    let falloff = 1.0 - dist / IMPACT_RADIUS;
                    let boost = impact.strength * falloff * falloff;
                    let i = y * res + x;
                    self.current[i] += boost;
                    self.previous[i] += boost;
                }
            }
        }
    }

    fn integrate_sequential(&mut self) {
        let res = self.resolution as usize;
        let c2 = self.params.wave_speed_squared();
        let damping = self.params.damping();
        let current = &self.current;
        let absorption = &self.absorption;
        let next = &mut self.previous;
        let surface = self.surface.samples_mut();
        for y in 1..res.saturating_sub(1) {
            for x in 1..res - 1 {
                let i = y * res + x;
                let (value, normal_x, normal_y) =
                    integrate_cell(current, next[i], absorption[i], i, res, c2, damping);
                next[i] = value;
                surface[i] = SurfaceSample {
                    height: value,
                    velocity: value - current[i],
                    normal_x,
                    normal_y,
                };
            }
        }
    }

    fn integrate_parallel(&mut self) {
        let res = self.resolution as usize;
        let c2 = self.params.wave_speed_squared();
        let damping = self.params.damping();
        let current = &self.current;
        let absorption = &self.absorption;
        self.previous
            .par_chunks_mut(res)
            .zip(self.surface.samples_mut().par_chunks_mut(res))
            .enumerate()
            .skip(1)
            .take(res.saturating_sub(2))
            .for_each(|(y, (next_row, surface_row))| {
                for x in 1..res - 1 {
                    let i = y * res + x;
                    let (value, normal_x, normal_y) =
                        integrate_cell(current, next_row[x], absorption[i], i, res, c2, damping);
                    next_row[x] = value;
                    surface_row[x] = SurfaceSample {
                        height: value,
                        velocity: value - current[i],
                        normal_x,
                        normal_y,
                    };
                }
            });
    }

    /// Pin the outer ring to zero height and zero velocity.
    fn write_boundary(&mut self) {
        let res = self.resolution as usize;
        let current = &self.current;
        let next = &mut self.previous;
        let surface = self.surface.samples_mut();
        let mut stamp = |x: usize, y: usize| {
            let i = y * res + x;
            let left = current[y * res + x.saturating_sub(1)];
            let right = current[y * res + (x + 1).min(res - 1)];
            let up = current[y.saturating_sub(1) * res + x];
            let down = current[(y + 1).min(res - 1) * res + x];
            next[i] = 0.0;
            surface[i] = SurfaceSample {
                height: 0.0,
                velocity: 0.0,
                normal_x: (left - right) * 2.0,
                normal_y: (up - down) * 2.0,
            };
        };
        for x in 0..res {
            stamp(x, 0);
            stamp(x, res - 1);
        }
        for y in 1..res.saturating_sub(1) {
            stamp(0, y);
            stamp(res - 1, y);
        }
    }
}

impl WaveBackend for CpuRipples {
    fn queue_impact(&mut self, impact: Impact) {
        self.impacts.push(impact);
    }

    fn pending_impacts(&self) -> usize {
        self.impacts.len()
    }

    fn clear_impacts(&mut self) {
        self.impacts.clear();
    }

    fn step(&mut self) -> Result<()> {
        self.apply_impacts();
        if self.resolution as usize >= PARALLEL_THRESHOLD {
            self.integrate_parallel();
        } else {
            self.integrate_sequential();
        }
        self.write_boundary();
        std::mem::swap(&mut self.current, &mut self.previous);
        Ok(())
    }

    fn read_surface(&mut self) -> Result<&HeightField> {
        Ok(&self.surface)
    }

    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn params(&self) -> &WaveParams {
        &self.params
    }

    fn set_wave_speed(&mut self, speed: f32) -> Result<()> {
        self.params.set_wave_speed(speed)
    }

    fn set_damping(&mut self, damping: f32) -> Result<()> {
        self.params.set_damping(damping)
    }

    fn set_edge_fade_width(&mut self, width: u32) {
        self.params.set_edge_fade_width(width);
        self.rebuild_absorption();
    }

    fn set_edge_fade_strength(&mut self, strength: f32) -> Result<()> {
        self.params.set_edge_fade_strength(strength)?;
        self.rebuild_absorption();
        Ok(())
    }

    fn reset(&mut self) {
        self.current.fill(0.0);
        self.previous.fill(0.0);
        self.surface.reset();
        self.impacts.clear();
    }

    fn backend(&self) -> Backend {
        Backend::Cpu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_params() -> WaveParams {
        WaveParams::new(0.3, 0.99)
            .unwrap()
            .with_edge_fade(0, 1.0)
            .unwrap()
    }

    #[test]
    fn test_impact_crest_stays_below_strength() {
        let mut sim = CpuRipples::new(33, quiet_params()).unwrap();
        sim.queue_impact(Impact::new(0.5, 0.5, 1.0));
        sim.step().unwrap();

        let surface = sim.read_surface().unwrap();
        let center = *surface.sample(16, 16).unwrap();
        let neighbor = *surface.sample(15, 16).unwrap();

        // (2h - h_prev + c^2 * lap) * damping with a zero-velocity splash:
        // (1.0 + 0.09 * (16/9 - 4)) * 0.99 = 0.792 at the crest.
        assert!((center.height - 0.792).abs() < 1e-4);
        assert!((neighbor.height - 0.43039).abs() < 1e-4);
        assert!(center.height < 1.0);
        assert!(neighbor.height < center.height);
        assert!((center.velocity - (-0.208)).abs() < 1e-4);
    }

    #[test]
    fn test_normals_flank_the_crest() {
        let mut sim = CpuRipples::new(33, quiet_params()).unwrap();
        sim.queue_impact(Impact::new(0.5, 0.5, 1.0));
        sim.step().unwrap();

        let surface = sim.read_surface().unwrap();
        assert!(surface.sample(15, 16).unwrap().normal_x < 0.0);
        assert!(surface.sample(17, 16).unwrap().normal_x > 0.0);
        assert!(surface.sample(16, 15).unwrap().normal_y < 0.0);
        assert!(surface.sample(16, 17).unwrap().normal_y > 0.0);
    }

    #[test]
    fn test_centered_impact_spreads_symmetrically() {
        let mut sim = CpuRipples::new(17, quiet_params()).unwrap();
        sim.queue_impact(Impact::new(0.5, 0.5, 0.8));
        for _ in 0..10 {
            sim.step().unwrap();
        }

        let surface = sim.read_surface().unwrap();
        for k in 1..=8u32 {
            let west = surface.sample(8 - k, 8).unwrap().height;
            let east = surface.sample(8 + k, 8).unwrap().height;
            let north = surface.sample(8, 8 - k).unwrap().height;
            let south = surface.sample(8, 8 + k).unwrap().height;
            assert!((west - east).abs() < 1e-6);
            assert!((north - south).abs() < 1e-6);
            assert!((west - north).abs() < 1e-6);
        }
    }

    #[test]
    fn test_energy_decays_under_damping() {
        // Squared height sloshes between potential and kinetic form over a
        // few steps, so the decay is asserted on well-separated checkpoints
        // and against an undamped baseline rather than per step.
        let run = |damping: f32| -> (f32, f32, f32) {
            let params = WaveParams::new(0.3, damping)
                .unwrap()
                .with_edge_fade(0, 1.0)
                .unwrap();
            let mut sim = CpuRipples::new(33, params).unwrap();
            sim.queue_impact(Impact::new(0.5, 0.5, 1.0));
            sim.step().unwrap();
            let initial = sim.read_surface().unwrap().total_energy();
            for _ in 0..24 {
                sim.step().unwrap();
            }
            let mid = sim.read_surface().unwrap().total_energy();
            for _ in 0..25 {
                sim.step().unwrap();
            }
            let late = sim.read_surface().unwrap().total_energy();
            (initial, mid, late)
        };

        let (initial, mid, late) = run(0.95);
        assert!(mid < 0.6 * initial);
        assert!(late < 0.6 * mid);

        let (_, undamped_mid, _) = run(1.0);
        assert!(mid < 0.5 * undamped_mid);
    }

    #[test]
    fn test_boundary_cells_stay_flat() {
        let mut sim = CpuRipples::new(17, quiet_params()).unwrap();
        sim.queue_impact(Impact::new(0.1, 0.1, 1.0));
        for _ in 0..8 {
            sim.step().unwrap();
        }

        let surface = sim.read_surface().unwrap();
        assert!(surface.max_height() > 0.0);
        for k in 0..17u32 {
            assert_eq!(surface.sample(k, 0).unwrap().height, 0.0);
            assert_eq!(surface.sample(k, 16).unwrap().height, 0.0);
            assert_eq!(surface.sample(0, k).unwrap().height, 0.0);
            assert_eq!(surface.sample(16, k).unwrap().height, 0.0);
        }
    }

    #[test]
    fn test_edge_fade_absorbs_energy() {
        let plain_params = WaveParams::new(0.3, 1.0)
            .unwrap()
            .with_edge_fade(0, 1.0)
            .unwrap();
        let faded_params = WaveParams::new(0.3, 1.0)
            .unwrap()
            .with_edge_fade(6, 0.2)
            .unwrap();

        let mut plain = CpuRipples::new(33, plain_params).unwrap();
        let mut faded = CpuRipples::new(33, faded_params).unwrap();
        for sim in [&mut plain, &mut faded] {
            sim.queue_impact(Impact::new(0.5, 0.5, 1.0));
            for _ in 0..60 {
                sim.step().unwrap();
            }
        }

        let plain_energy = plain.read_surface().unwrap().total_energy();
        let faded_energy = faded.read_surface().unwrap().total_energy();
        assert!(faded_energy < plain_energy * 0.9);
    }

    #[test]
    fn test_out_of_bounds_impacts_are_dropped() {
        let mut sim = CpuRipples::new(17, quiet_params()).unwrap();
        sim.queue_impact(Impact::new(1.5, 0.5, 1.0));
        sim.queue_impact(Impact::new(0.5, -0.1, 1.0));
        assert_eq!(sim.pending_impacts(), 0);

        sim.step().unwrap();
        assert_eq!(sim.read_surface().unwrap().max_height(), 0.0);
    }

    #[test]
    fn test_reset_restores_rest_state() {
        let mut sim = CpuRipples::new(17, quiet_params()).unwrap();
        sim.queue_impact(Impact::new(0.5, 0.5, 1.0));
        for _ in 0..3 {
            sim.step().unwrap();
        }
        sim.queue_impact(Impact::new(0.2, 0.2, 0.5));
        sim.reset();

        assert_eq!(sim.pending_impacts(), 0);
        let surface = sim.read_surface().unwrap();
        assert_eq!(surface.total_energy(), 0.0);
        assert_eq!(sim.params().wave_speed(), 0.3);

        sim.queue_impact(Impact::new(0.5, 0.5, 1.0));
        sim.step().unwrap();
        assert!(sim.read_surface().unwrap().sample(8, 8).unwrap().height > 0.0);
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let mut reference = CpuRipples::new(24, quiet_params()).unwrap();
        let mut parallel = CpuRipples::new(24, quiet_params()).unwrap();
        for sim in [&mut reference, &mut parallel] {
            sim.queue_impact(Impact::new(0.3, 0.6, 0.9));
            sim.queue_impact(Impact::new(0.7, 0.2, 0.4));
        }

        for _ in 0..5 {
            reference.step().unwrap();

            parallel.apply_impacts();
            parallel.integrate_parallel();
            parallel.write_boundary();
            std::mem::swap(&mut parallel.current, &mut parallel.previous);
        }

        let expected = reference.read_surface().unwrap().samples().to_vec();
        let actual = parallel.read_surface().unwrap().samples();
        for (a, b) in expected.iter().zip(actual) {
            assert!((a.height - b.height).abs() < 1e-6);
            assert!((a.normal_x - b.normal_x).abs() < 1e-6);
            assert!((a.normal_y - b.normal_y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fade_setters_rebuild_the_table() {
        let mut sim = CpuRipples::new(17, quiet_params()).unwrap();
        assert!((sim.absorption[0] - 1.0).abs() < 1e-6);

        sim.set_edge_fade_width(4);
        sim.set_edge_fade_strength(0.5).unwrap();
        assert!((sim.absorption[0] - 0.5).abs() < 1e-6);
        let center = sim.absorption[8 * 17 + 8];
        assert!((center - 1.0).abs() < 1e-6);
    }
}
