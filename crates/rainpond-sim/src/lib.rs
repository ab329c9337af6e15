//! # rainpond
//!
//! Real-time 2D wave simulation for rain on a pond surface.
//!
//! Raindrop impacts become localized perturbations in a height field that
//! a finite-difference wave equation evolves tick by tick, with damping
//! and edge absorption. Each cell carries height, vertical velocity, and a
//! surface normal; a separate estimator derives light-convergence
//! (caustics) intensities from the surface curvature.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rainpond::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Create a simulator with auto-detected backend
//!     let mut pond = RippleSimulator::builder()
//!         .resolution(256)
//!         .backend(Backend::Auto)
//!         .build()
//!         .await?;
//!
//!     // A raindrop lands near the middle
//!     pond.add_impact(Impact::new(0.5, 0.45, 0.8));
//!
//!     // Advance and inspect the surface
//!     pond.step()?;
//!     let surface = pond.read_surface()?;
//!     println!("peak height: {}", surface.max_height());
//!     Ok(())
//! }
//! ```
//!
//! ## Backends
//!
//! - **CPU** - leapfrog integration on the host, row-parallel on large
//!   grids (always available)
//! - **WebGPU** - velocity-form compute shader via wgpu (requires the
//!   `wgpu` feature and a supported adapter)
//!
//! `Backend::Auto` probes for a GPU adapter and falls back to the CPU
//! path, so the same code runs everywhere.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod caustics;
pub mod simulation;

// Re-export the data contract
pub use rainpond_core::*;

pub use caustics::{CausticsEstimator, CausticsField, CausticsPixel};
pub use simulation::{Backend, CpuRipples, WaveBackend};
#[cfg(feature = "wgpu")]
pub use simulation::WgpuRipples;

use tracing::info;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::caustics::{CausticsEstimator, CausticsField, CausticsPixel};
    pub use crate::simulation::{Backend, WaveBackend};
    pub use crate::{RippleSimulator, RippleSimulatorBuilder};
    pub use rainpond_core::prelude::*;
}

/// Main pond simulation facade.
///
/// Wraps whichever wave backend was selected at construction; the backend
/// never changes mid-session.
pub struct RippleSimulator {
    /// Inner integrator implementation.
    inner: Box<dyn WaveBackend>,
}

impl RippleSimulator {
    /// Create a new simulator builder.
    pub fn builder() -> RippleSimulatorBuilder {
        RippleSimulatorBuilder::new()
    }

    /// Create a simulator with default settings.
    pub async fn new() -> Result<Self> {
        Self::builder().build().await
    }

    /// Create with a specific backend.
    pub async fn with_backend(backend: Backend) -> Result<Self> {
        Self::builder().backend(backend).build().await
    }

    /// Queue a raindrop impact for the next step. Out-of-bounds events
    /// are dropped silently.
    pub fn add_impact(&mut self, impact: Impact) {
        self.inner.queue_impact(impact);
    }

    /// Number of impacts waiting for the next step.
    pub fn pending_impacts(&self) -> usize {
        self.inner.pending_impacts()
    }

    /// Discard all pending impacts.
    pub fn clear_impacts(&mut self) {
        self.inner.clear_impacts();
    }

    /// Advance the simulation by one timestep.
    pub fn step(&mut self) -> Result<()> {
        self.inner.step()
    }

    /// The surface produced by the last completed step.
    pub fn read_surface(&mut self) -> Result<&HeightField> {
        self.inner.read_surface()
    }

    /// Grid resolution (cells per side).
    pub fn resolution(&self) -> u32 {
        self.inner.resolution()
    }

    /// Current wave parameters.
    pub fn params(&self) -> &WaveParams {
        self.inner.params()
    }

    /// Update the wave speed. Rejects values outside `(0, 0.5]`.
    pub fn set_wave_speed(&mut self, speed: f32) -> Result<()> {
        self.inner.set_wave_speed(speed)
    }

    /// Update the damping factor. Rejects values outside `(0, 1]`.
    pub fn set_damping(&mut self, damping: f32) -> Result<()> {
        self.inner.set_damping(damping)
    }

    /// Update the edge fade band width. Zero disables the fade.
    pub fn set_edge_fade_width(&mut self, width: u32) {
        self.inner.set_edge_fade_width(width);
    }

    /// Update the edge fade strength. Rejects values outside `[0, 1]`.
    pub fn set_edge_fade_strength(&mut self, strength: f32) -> Result<()> {
        self.inner.set_edge_fade_strength(strength)
    }

    /// Return the pond to rest: zero all state, drop pending impacts,
    /// keep parameters.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// Get the active backend.
    pub fn backend(&self) -> Backend {
        self.inner.backend()
    }
}

/// Builder for [`RippleSimulator`].
pub struct RippleSimulatorBuilder {
    resolution: u32,
    backend: Backend,
    params: WaveParams,
}

impl RippleSimulatorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 256,
            backend: Backend::Auto,
            params: WaveParams::default(),
        }
    }

    /// Set the grid resolution (cells per side).
    pub fn resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the backend.
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Set the wave parameters.
    pub fn params(mut self, params: WaveParams) -> Self {
        self.params = params;
        self
    }

    /// Build the simulator.
    pub async fn build(self) -> Result<RippleSimulator> {
        let inner: Box<dyn WaveBackend> = match self.backend {
            Backend::Auto => Self::build_auto(self.resolution, self.params).await?,
            Backend::Cpu => Box::new(CpuRipples::new(self.resolution, self.params)?),
            #[cfg(feature = "wgpu")]
            Backend::Wgpu => {
                Box::new(WgpuRipples::new(self.resolution, self.params).await?)
            }
            #[cfg(not(feature = "wgpu"))]
            Backend::Wgpu => {
                return Err(RainpondError::BackendUnavailable(
                    "wgpu feature not enabled".to_string(),
                ))
            }
        };

        Ok(RippleSimulator { inner })
    }

    /// Auto-select the best available backend.
    async fn build_auto(resolution: u32, params: WaveParams) -> Result<Box<dyn WaveBackend>> {
        #[cfg(feature = "wgpu")]
        if simulation::is_wgpu_available() {
            info!("Auto-selected WebGPU backend");
            return Ok(Box::new(WgpuRipples::new(resolution, params).await?));
        }

        info!("Auto-selected CPU backend (no GPU available)");
        Ok(Box::new(CpuRipples::new(resolution, params)?))
    }
}

impl Default for RippleSimulatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Check availability of backends at runtime.
pub mod availability {
    /// Check if a WebGPU adapter is available.
    pub fn wgpu() -> bool {
        #[cfg(feature = "wgpu")]
        {
            crate::simulation::is_wgpu_available()
        }
        #[cfg(not(feature = "wgpu"))]
        {
            false
        }
    }

    /// Get list of available backends.
    pub fn available_backends() -> Vec<super::Backend> {
        let mut backends = vec![super::Backend::Cpu];

        if wgpu() {
            backends.push(super::Backend::Wgpu);
        }

        backends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder_selects_cpu() {
        let pond = RippleSimulator::builder()
            .resolution(17)
            .backend(Backend::Cpu)
            .build()
            .await
            .unwrap();

        assert_eq!(pond.backend(), Backend::Cpu);
        assert_eq!(pond.resolution(), 17);
    }

    #[tokio::test]
    async fn test_auto_selects_some_backend() {
        let pond = RippleSimulator::builder()
            .resolution(17)
            .build()
            .await
            .unwrap();

        let backend = pond.backend();
        assert!(
            backend == Backend::Cpu || backend == Backend::Wgpu,
            "Expected Cpu or Wgpu backend, got {:?}",
            backend
        );
    }

    #[tokio::test]
    async fn test_facade_runs_a_simulation() {
        let mut pond = RippleSimulator::builder()
            .resolution(33)
            .backend(Backend::Cpu)
            .build()
            .await
            .unwrap();

        pond.add_impact(Impact::new(0.5, 0.5, 1.0));
        assert_eq!(pond.pending_impacts(), 1);
        pond.step().unwrap();
        assert!(pond.read_surface().unwrap().max_height() > 0.0);

        pond.reset();
        assert_eq!(pond.read_surface().unwrap().max_height(), 0.0);
    }

    #[tokio::test]
    async fn test_zero_resolution_is_rejected() {
        let result = RippleSimulator::builder()
            .resolution(0)
            .backend(Backend::Cpu)
            .build()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_setters_validate_through_facade() {
        let mut pond = RippleSimulator::builder()
            .resolution(17)
            .backend(Backend::Cpu)
            .build()
            .await
            .unwrap();

        assert!(pond.set_damping(1.5).is_err());
        assert!(pond.set_wave_speed(0.9).is_err());
        assert!(pond.set_edge_fade_strength(-0.1).is_err());
        assert!(pond.set_damping(0.97).is_ok());
        assert_eq!(pond.params().damping(), 0.97);
    }

    #[test]
    fn test_cpu_backend_always_available() {
        let backends = availability::available_backends();
        assert!(backends.contains(&Backend::Cpu));
    }
}
