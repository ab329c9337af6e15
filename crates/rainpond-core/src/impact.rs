//! Raindrop impact events and the between-steps queue.

/// Radius of an impact's perturbation footprint, in grid cells.
pub const IMPACT_RADIUS: f32 = 3.0;

/// A raindrop impact in normalized grid space.
///
/// Coordinates outside `[0, 1]` on either axis mark the event as
/// out-of-bounds; queues drop such events silently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// Horizontal position in `[0, 1]`.
    pub x: f32,
    /// Vertical position in `[0, 1]`.
    pub y: f32,
    /// Perturbation amplitude, typically `(0, 0.8]`.
    pub strength: f32,
}

impl Impact {
    /// Create an impact at normalized grid coordinates.
    pub fn new(x: f32, y: f32, strength: f32) -> Self {
        Self { x, y, strength }
    }

    /// Map a world-space event to normalized grid space.
    ///
    /// The simulated surface is an `extent x extent` world square centered
    /// at the origin; points outside it produce an out-of-bounds impact.
    pub fn from_world(x: f32, z: f32, strength: f32, extent: f32) -> Self {
        Self {
            x: x / extent + 0.5,
            y: z / extent + 0.5,
            strength,
        }
    }

    /// Whether the impact lands on the simulated surface.
    pub fn in_bounds(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }

    /// Fractional grid cell position for the given resolution.
    pub fn grid_position(&self, resolution: u32) -> (f32, f32) {
        let max = resolution.saturating_sub(1) as f32;
        (self.x * max, self.y * max)
    }
}

/// Pending impacts collected between simulation steps.
///
/// Flushed exactly once at the start of the next integration step; order
/// does not matter since injection is purely additive.
#[derive(Debug, Default)]
pub struct ImpactQueue {
    pending: Vec<Impact>,
}

impl ImpactQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an impact. Out-of-bounds events are dropped as a no-op.
    pub fn push(&mut self, impact: Impact) {
        if !impact.in_bounds() {
            tracing::trace!(
                x = impact.x,
                y = impact.y,
                "dropping out-of-bounds impact"
            );
            return;
        }
        self.pending.push(impact);
    }

    /// Remove and yield all pending impacts, leaving the queue empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Impact> {
        self.pending.drain(..)
    }

    /// Discard all pending impacts. Safe at any step boundary.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending impacts.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether any impacts are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_mapping() {
        let center = Impact::from_world(0.0, 0.0, 0.5, 20.0);
        assert!((center.x - 0.5).abs() < 1e-6);
        assert!((center.y - 0.5).abs() < 1e-6);
        assert!(center.in_bounds());

        let corner = Impact::from_world(-10.0, 10.0, 0.5, 20.0);
        assert!((corner.x - 0.0).abs() < 1e-6);
        assert!((corner.y - 1.0).abs() < 1e-6);
        assert!(corner.in_bounds());

        let outside = Impact::from_world(15.0, 0.0, 0.5, 20.0);
        assert!(!outside.in_bounds());
    }

    #[test]
    fn test_grid_position() {
        let impact = Impact::new(0.5, 0.25, 1.0);
        let (cx, cy) = impact.grid_position(17);
        assert!((cx - 8.0).abs() < 1e-6);
        assert!((cy - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_queue_drops_out_of_bounds() {
        let mut queue = ImpactQueue::new();
        queue.push(Impact::new(1.5, 0.5, 0.3));
        queue.push(Impact::new(0.5, -0.1, 0.3));
        assert!(queue.is_empty());

        queue.push(Impact::new(0.5, 0.5, 0.3));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_drain_consumes_once() {
        let mut queue = ImpactQueue::new();
        queue.push(Impact::new(0.2, 0.2, 0.1));
        queue.push(Impact::new(0.8, 0.8, 0.2));

        let drained: Vec<Impact> = queue.drain().collect();
        assert_eq!(drained.len(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.drain().count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut queue = ImpactQueue::new();
        queue.push(Impact::new(0.5, 0.5, 0.3));
        queue.clear();
        assert!(queue.is_empty());
    }
}
