//! Trajectory prediction
//!
//! Turns raw pointer updates into the set of tracked targets the pointer is
//! heading towards.
//!
//! # Architecture
//!
//! ```text
//! Pointer update (x, y)
//!   └─> TrajectoryPredictor
//!       ├─> TrajectoryTracker   (velocity, extrapolated point)
//!       └─> select_candidates   (guards, clamp distance, `< radius`)
//!           └─> CandidateSet
//! ```
//!
//! The predictor is synchronous and owns no timers. Debouncing and prefetch
//! dispatch live in [`crate::session`].

mod candidates;
mod target;
mod trajectory;

pub use candidates::{select_candidates, Candidate, CandidateSet, GeometryAccess};
pub use target::{BoundsProvider, SharedBounds, TrackedTarget};
pub use trajectory::{prediction_factor, TrajectoryTracker};

use crate::error::{ForesightError, Result};
use crate::geometry::{Point, Velocity};

/// Default trigger radius (pointer-space units)
pub const DEFAULT_RADIUS: f64 = 100.0;

/// Check that a radius is usable
pub fn validate_radius(radius: f64) -> Result<f64> {
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(ForesightError::InvalidRadius(radius))
    }
}

/// Predicts which tracked targets the pointer is about to reach
#[derive(Debug, Clone)]
pub struct TrajectoryPredictor {
    radius: f64,
    geometry: GeometryAccess,
    tracker: TrajectoryTracker,
    targets: Vec<TrackedTarget>,
}

impl TrajectoryPredictor {
    /// Create a predictor with the given trigger radius
    pub fn new(radius: f64, geometry: GeometryAccess) -> Result<Self> {
        let radius = validate_radius(radius)?;
        Ok(Self {
            radius,
            geometry,
            tracker: TrajectoryTracker::for_radius(radius),
            targets: Vec::new(),
        })
    }

    /// Builder-style target registration
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = TrackedTarget>) -> Self {
        self.targets.extend(targets);
        self
    }

    /// Start tracking a target (appended to iteration order)
    pub fn track(&mut self, target: TrackedTarget) {
        self.targets.push(target);
    }

    /// Stop tracking every target with this key
    pub fn untrack(&mut self, key: &str) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t.key() != key);
        self.targets.len() != before
    }

    /// Tracked targets in iteration order
    pub fn targets(&self) -> &[TrackedTarget] {
        &self.targets
    }

    /// Feed a defined pointer position and recompute candidates
    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> CandidateSet {
        self.on_pointer_update(Some(Point::new(x, y)))
    }

    /// Feed a possibly undefined pointer position and recompute candidates
    pub fn on_pointer_update(&mut self, position: Option<Point>) -> CandidateSet {
        self.tracker.update(position);
        self.candidates()
    }

    /// Candidates for the current pointer state
    pub fn candidates(&self) -> CandidateSet {
        select_candidates(
            &self.targets,
            self.tracker.position(),
            self.tracker.extrapolated(),
            self.radius,
            self.geometry,
        )
    }

    /// Trigger radius
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Look-ahead multiplier (`radius / 100`)
    pub fn prediction_factor(&self) -> f64 {
        self.tracker.factor()
    }

    /// Geometry capability of the execution context
    pub fn geometry(&self) -> GeometryAccess {
        self.geometry
    }

    /// Current pointer position
    pub fn position(&self) -> Option<Point> {
        self.tracker.position()
    }

    /// Current pointer velocity
    pub fn velocity(&self) -> Velocity {
        self.tracker.velocity()
    }

    /// Predicted pointer position
    pub fn extrapolated(&self) -> Point {
        self.tracker.extrapolated()
    }
}
