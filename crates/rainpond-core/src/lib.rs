//! # Rainpond Core
//!
//! Core types for the rainpond water-surface simulator: the data contract
//! shared by every execution backend and by downstream field consumers.
//!
//! ## Core Abstractions
//!
//! - [`SurfaceSample`] - packed 4-channel output record (height, velocity,
//!   gradient normal)
//! - [`HeightField`] - the read surface exposed to renderers
//! - [`Impact`] / [`ImpactQueue`] - raindrop events queued between steps
//! - [`WaveParams`] / [`CausticsParams`] - validated simulation configuration
//!
//! Backends live in `rainpond-sim`; this crate only defines what flows
//! between them and their consumers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod field;
pub mod impact;
pub mod params;

pub use error::{RainpondError, Result};
pub use field::{HeightField, SurfaceSample};
pub use impact::{Impact, ImpactQueue, IMPACT_RADIUS};
pub use params::{CausticsParams, WaveParams, MAX_WAVE_SPEED};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{RainpondError, Result};
    pub use crate::field::{HeightField, SurfaceSample};
    pub use crate::impact::{Impact, ImpactQueue, IMPACT_RADIUS};
    pub use crate::params::{CausticsParams, WaveParams, MAX_WAVE_SPEED};
}
