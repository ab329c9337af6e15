//! Execution backend abstraction for the wave integrator.
//!
//! Both integrators implement [`WaveBackend`]; the facade in the crate
//! root selects one at construction time and never swaps it mid-session.

use rainpond_core::{HeightField, Impact, Result, WaveParams};

/// Execution backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Probe for a GPU adapter, fall back to the CPU path.
    #[default]
    Auto,
    /// Synchronous host integration (row-parallel on large grids).
    Cpu,
    /// Data-parallel WebGPU compute.
    Wgpu,
}

/// One wave-equation integrator with its owned grids.
///
/// Implementations advance the field strictly one tick at a time: queued
/// impacts are applied at the start of `step`, the buffers rotate at its
/// end, and the surface from `read_surface` always reflects the last
/// completed step.
pub trait WaveBackend: Send {
    /// Queue an impact for the next step. Out-of-bounds events are no-ops.
    fn queue_impact(&mut self, impact: Impact);

    /// Number of impacts waiting for the next step.
    fn pending_impacts(&self) -> usize;

    /// Discard all pending impacts. Safe at any step boundary.
    fn clear_impacts(&mut self);

    /// Apply pending impacts, advance the field one timestep, and rotate
    /// the ping-pong buffers.
    fn step(&mut self) -> Result<()>;

    /// The surface produced by the last completed step.
    ///
    /// Takes `&mut self` so the GPU implementation can run its lazy
    /// once-per-tick readback; the returned reference points to the same
    /// owned field object on every call.
    fn read_surface(&mut self) -> Result<&HeightField>;

    /// Grid resolution (cells per side).
    fn resolution(&self) -> u32;

    /// Current wave parameters.
    fn params(&self) -> &WaveParams;

    /// Update the wave speed. Rejects values outside `(0, 0.5]`.
    fn set_wave_speed(&mut self, speed: f32) -> Result<()>;

    /// Update the damping factor. Rejects values outside `(0, 1]`.
    fn set_damping(&mut self, damping: f32) -> Result<()>;

    /// Update the edge fade band width. Zero disables the fade.
    fn set_edge_fade_width(&mut self, width: u32);

    /// Update the edge fade strength. Rejects values outside `[0, 1]`.
    fn set_edge_fade_strength(&mut self, strength: f32) -> Result<()>;

    /// Zero all simulation state and drop pending impacts. Parameters are
    /// retained.
    fn reset(&mut self);

    /// Which backend implementation this is.
    fn backend(&self) -> Backend;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backend_is_auto() {
        assert_eq!(Backend::default(), Backend::Auto);
    }
}
