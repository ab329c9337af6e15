//! Wave integration backends.
//!
//! The [`WaveBackend`] trait defines the per-tick contract; [`CpuRipples`]
//! and [`WgpuRipples`] implement it with the leapfrog and velocity forms
//! of the same wave equation. Backend selection lives in the crate root.

pub mod backend;
pub mod cpu;
#[cfg(feature = "wgpu")]
pub mod wgpu_compute;

pub use backend::{Backend, WaveBackend};
pub use cpu::{CpuRipples, PARALLEL_THRESHOLD};
#[cfg(feature = "wgpu")]
pub use wgpu_compute::{is_wgpu_available, WgpuRipples, MAX_IMPACTS_PER_STEP};
