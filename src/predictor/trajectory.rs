//! Pointer trajectory tracking
//!
//! Depth-1 motion model: the velocity is the first difference between the
//! current and the previous pointer update, and the extrapolated point is
//!
//! ```text
//! extrapolated = position + velocity * (radius / 100)
//! ```
//!
//! The look-ahead factor is tied to the trigger radius, so a larger radius
//! also looks further ahead.

use tracing::trace;

use crate::geometry::{Point, Velocity};

/// Derive the look-ahead multiplier from the trigger radius
pub fn prediction_factor(radius: f64) -> f64 {
    radius / 100.0
}

/// Tracks the pointer and extrapolates where it is heading
#[derive(Debug, Clone)]
pub struct TrajectoryTracker {
    /// Look-ahead multiplier applied to velocity
    factor: f64,

    /// Latest pointer position (`None` before the first move or after leave)
    position: Option<Point>,

    /// Last defined position, kept across leave events
    previous: Option<Point>,

    /// Displacement between the last two defined updates
    velocity: Velocity,
}

impl TrajectoryTracker {
    /// Create a tracker with an explicit look-ahead factor
    pub fn new(factor: f64) -> Self {
        Self {
            factor,
            position: None,
            previous: None,
            velocity: Velocity::ZERO,
        }
    }

    /// Create a tracker whose look-ahead is derived from `radius`
    pub fn for_radius(radius: f64) -> Self {
        Self::new(prediction_factor(radius))
    }

    /// Feed a pointer update
    ///
    /// `None` means the pointer is outside the viewport or has not moved yet;
    /// velocity drops to zero but the last defined position is remembered so
    /// the next defined update measures from it.
    pub fn update(&mut self, position: Option<Point>) {
        self.position = position;

        let Some(current) = position else {
            self.velocity = Velocity::ZERO;
            trace!("Pointer update: undefined position, velocity reset");
            return;
        };

        self.velocity = Velocity::between(self.previous.unwrap_or(current), current);
        self.previous = Some(current);

        trace!(
            "Pointer update: pos=({:.1}, {:.1}), vel=({:.1}, {:.1})",
            current.x,
            current.y,
            self.velocity.vx,
            self.velocity.vy
        );
    }

    /// Current pointer position, if defined
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Current velocity (zero until two defined updates exist)
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// Look-ahead multiplier
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Predicted future pointer position
    ///
    /// Collapses to the origin when the position is undefined.
    pub fn extrapolated(&self) -> Point {
        match self.position {
            Some(p) => p.project(self.velocity, self.factor),
            None => Point::ORIGIN,
        }
    }
}
