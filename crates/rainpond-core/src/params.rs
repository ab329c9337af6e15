//! Simulation parameters and stability validation.

use glam::Vec3;

use crate::error::{RainpondError, Result};

/// Maximum wave speed for a unit-spaced grid.
///
/// Courant-type stability bound for the 4-neighbor FDTD stencil; speeds
/// above this make the integration diverge.
pub const MAX_WAVE_SPEED: f32 = 0.5;

/// Parameters for the damped 2D wave equation.
///
/// Fields are private so every mutation goes through the validating
/// setters; the integrator does not clamp internally, it trusts these
/// ranges.
#[derive(Debug, Clone)]
pub struct WaveParams {
    /// Propagation speed in cells per step, (0, 0.5].
    wave_speed: f32,
    /// Per-step energy retention, (0, 1]. 1.0 disables decay.
    damping: f32,
    /// Width of the absorbing border band in cells. 0 disables the fade.
    edge_fade_width: u32,
    /// Absorption multiplier at the border itself, [0, 1].
    edge_fade_strength: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            wave_speed: 0.4,
            damping: 0.99,
            edge_fade_width: 25,
            edge_fade_strength: 0.9,
        }
    }
}

impl WaveParams {
    /// Create parameters with the given wave speed and damping, default
    /// edge fade.
    pub fn new(wave_speed: f32, damping: f32) -> Result<Self> {
        let mut params = Self::default();
        params.set_wave_speed(wave_speed)?;
        params.set_damping(damping)?;
        Ok(params)
    }

    /// Builder-style edge fade configuration.
    pub fn with_edge_fade(mut self, width: u32, strength: f32) -> Result<Self> {
        self.set_edge_fade_width(width);
        self.set_edge_fade_strength(strength)?;
        Ok(self)
    }

    /// Propagation speed in cells per step.
    pub fn wave_speed(&self) -> f32 {
        self.wave_speed
    }

    /// Wave speed squared, the stencil coefficient.
    pub fn wave_speed_squared(&self) -> f32 {
        self.wave_speed * self.wave_speed
    }

    /// Per-step energy retention factor.
    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Width of the absorbing border band in cells.
    pub fn edge_fade_width(&self) -> u32 {
        self.edge_fade_width
    }

    /// Absorption multiplier at the border itself.
    pub fn edge_fade_strength(&self) -> f32 {
        self.edge_fade_strength
    }

    /// Update the wave speed. Rejects values outside `(0, 0.5]`.
    pub fn set_wave_speed(&mut self, speed: f32) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 || speed > MAX_WAVE_SPEED {
            return Err(RainpondError::invalid_config(format!(
                "wave speed must be in (0, {MAX_WAVE_SPEED}], got {speed}"
            )));
        }
        self.wave_speed = speed;
        Ok(())
    }

    /// Update the damping factor. Rejects values outside `(0, 1]`.
    pub fn set_damping(&mut self, damping: f32) -> Result<()> {
        if !damping.is_finite() || damping <= 0.0 || damping > 1.0 {
            return Err(RainpondError::invalid_config(format!(
                "damping must be in (0, 1], got {damping}"
            )));
        }
        self.damping = damping;
        Ok(())
    }

    /// Update the edge fade band width. Zero disables the fade.
    pub fn set_edge_fade_width(&mut self, width: u32) {
        self.edge_fade_width = width;
    }

    /// Update the edge fade strength. Rejects values outside `[0, 1]`.
    pub fn set_edge_fade_strength(&mut self, strength: f32) -> Result<()> {
        if !strength.is_finite() || !(0.0..=1.0).contains(&strength) {
            return Err(RainpondError::invalid_config(format!(
                "edge fade strength must be in [0, 1], got {strength}"
            )));
        }
        self.edge_fade_strength = strength;
        Ok(())
    }
}

/// Parameters for the caustics intensity estimate.
///
/// Reconfiguration only affects the next refresh; no history is kept.
#[derive(Debug, Clone)]
pub struct CausticsParams {
    /// Global intensity multiplier, >= 0.
    intensity: f32,
    /// Curvature-to-brightness gain.
    focus_gain: f32,
    /// Incident light direction, stored normalized.
    light_direction: Vec3,
    /// Assumed depth of the floor below the surface, > 0.
    water_depth: f32,
}

impl Default for CausticsParams {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            focus_gain: 4.0,
            light_direction: Vec3::new(0.0, -1.0, 0.0),
            water_depth: 2.0,
        }
    }
}

impl CausticsParams {
    /// Create parameters with the given intensity and focus gain.
    pub fn new(intensity: f32, focus_gain: f32) -> Result<Self> {
        let mut params = Self::default();
        params.set_intensity(intensity)?;
        params.set_focus_gain(focus_gain)?;
        Ok(params)
    }

    /// Global intensity multiplier.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Curvature-to-brightness gain.
    pub fn focus_gain(&self) -> f32 {
        self.focus_gain
    }

    /// Normalized incident light direction.
    pub fn light_direction(&self) -> Vec3 {
        self.light_direction
    }

    /// Assumed floor depth below the surface.
    pub fn water_depth(&self) -> f32 {
        self.water_depth
    }

    /// Update the global intensity multiplier. Rejects negatives.
    pub fn set_intensity(&mut self, intensity: f32) -> Result<()> {
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(RainpondError::invalid_config(format!(
                "caustics intensity must be >= 0, got {intensity}"
            )));
        }
        self.intensity = intensity;
        Ok(())
    }

    /// Update the curvature gain. Rejects negatives.
    pub fn set_focus_gain(&mut self, gain: f32) -> Result<()> {
        if !gain.is_finite() || gain < 0.0 {
            return Err(RainpondError::invalid_config(format!(
                "focus gain must be >= 0, got {gain}"
            )));
        }
        self.focus_gain = gain;
        Ok(())
    }

    /// Update the light direction. Rejects zero-length vectors; the stored
    /// direction is normalized.
    pub fn set_light_direction(&mut self, direction: Vec3) -> Result<()> {
        if !direction.is_finite() || direction.length_squared() < f32::EPSILON {
            return Err(RainpondError::invalid_config(
                "light direction must be a non-zero vector",
            ));
        }
        self.light_direction = direction.normalize();
        Ok(())
    }

    /// Update the assumed water depth. Must be positive.
    pub fn set_water_depth(&mut self, depth: f32) -> Result<()> {
        if !depth.is_finite() || depth <= 0.0 {
            return Err(RainpondError::invalid_config(format!(
                "water depth must be > 0, got {depth}"
            )));
        }
        self.water_depth = depth;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wave_params() {
        let params = WaveParams::default();
        assert_eq!(params.wave_speed(), 0.4);
        assert_eq!(params.damping(), 0.99);
        assert_eq!(params.edge_fade_width(), 25);
    }

    #[test]
    fn test_wave_speed_bounds() {
        let mut params = WaveParams::default();
        assert!(params.set_wave_speed(0.5).is_ok());
        assert!(params.set_wave_speed(0.51).is_err());
        assert!(params.set_wave_speed(0.0).is_err());
        assert!(params.set_wave_speed(-0.1).is_err());
        assert!(params.set_wave_speed(f32::NAN).is_err());
        // Rejected values leave the previous setting intact.
        assert_eq!(params.wave_speed(), 0.5);
    }

    #[test]
    fn test_damping_bounds() {
        let mut params = WaveParams::default();
        assert!(params.set_damping(1.0).is_ok());
        assert!(params.set_damping(1.01).is_err());
        assert!(params.set_damping(0.0).is_err());
        assert_eq!(params.damping(), 1.0);
    }

    #[test]
    fn test_edge_fade_strength_bounds() {
        let mut params = WaveParams::default();
        assert!(params.set_edge_fade_strength(0.0).is_ok());
        assert!(params.set_edge_fade_strength(1.0).is_ok());
        assert!(params.set_edge_fade_strength(1.5).is_err());
        assert!(params.set_edge_fade_strength(-0.2).is_err());
    }

    #[test]
    fn test_with_edge_fade_builder() {
        let params = WaveParams::default().with_edge_fade(10, 0.5).unwrap();
        assert_eq!(params.edge_fade_width(), 10);
        assert_eq!(params.edge_fade_strength(), 0.5);
    }

    #[test]
    fn test_caustics_light_direction_normalized() {
        let mut params = CausticsParams::default();
        params
            .set_light_direction(Vec3::new(0.0, -2.0, 0.0))
            .unwrap();
        assert!((params.light_direction().length() - 1.0).abs() < 1e-6);
        assert!(params.set_light_direction(Vec3::ZERO).is_err());
    }

    #[test]
    fn test_caustics_bounds() {
        let mut params = CausticsParams::default();
        assert!(params.set_intensity(0.0).is_ok());
        assert!(params.set_intensity(-1.0).is_err());
        assert!(params.set_water_depth(0.0).is_err());
        assert!(params.set_water_depth(3.5).is_ok());
        assert_eq!(params.water_depth(), 3.5);
    }
}
