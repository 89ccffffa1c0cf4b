//! Candidate selection
//!
//! Pure function of the tracked targets, the pointer state and the radius.
//! No timers, no side effects beyond trace logging, so it can be exercised
//! directly in tests and benchmarks.
//!
//! # Guards
//!
//! Evaluated in order; any hit yields an empty set:
//! 1. no tracked targets
//! 2. pointer position undefined
//! 3. pointer exactly at the origin (not yet positioned)
//! 4. geometry cannot be observed (headless/server render pass)

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use super::target::TrackedTarget;
use crate::geometry::Point;

/// Whether the execution context can observe element geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeometryAccess {
    /// Interactive client, bounds can be queried
    #[default]
    Available,

    /// Non-interactive pass (e.g. server-side render), never query bounds
    Unavailable,
}

impl GeometryAccess {
    /// Check if bounds may be queried
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for GeometryAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl std::str::FromStr for GeometryAccess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" | "client" | "interactive" => Ok(Self::Available),
            "unavailable" | "server" | "headless" => Ok(Self::Unavailable),
            _ => Err(format!("Unknown geometry access: {}", s)),
        }
    }
}

/// A target within the predictive radius
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Prefetch key of the target
    pub key: String,
    /// Distance from the extrapolated point to the target bounds
    pub distance: f64,
}

/// Targets within the predictive radius, in tracking order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// Empty set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if no target is within radius
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterate candidates in tracking order
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    /// Keys in tracking order
    pub fn keys(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.key.as_str()).collect()
    }

    /// Check if a key is a candidate
    pub fn contains(&self, key: &str) -> bool {
        self.candidates.iter().any(|c| c.key == key)
    }

    /// Candidate with the smallest distance (first one wins ties)
    pub fn nearest(&self) -> Option<&Candidate> {
        self.candidates.iter().fold(None, |best, c| match best {
            Some(b) if b.distance <= c.distance => Some(b),
            _ => Some(c),
        })
    }
}

impl From<Vec<Candidate>> for CandidateSet {
    fn from(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Select every target whose bounds lie strictly within `radius` of the
/// extrapolated point
pub fn select_candidates(
    targets: &[TrackedTarget],
    position: Option<Point>,
    extrapolated: Point,
    radius: f64,
    geometry: GeometryAccess,
) -> CandidateSet {
    if targets.is_empty() {
        return CandidateSet::empty();
    }
    let Some(position) = position else {
        return CandidateSet::empty();
    };
    if position.is_origin() {
        return CandidateSet::empty();
    }
    if !geometry.is_available() {
        return CandidateSet::empty();
    }

    let mut candidates = Vec::new();
    for target in targets {
        let Some(rect) = target.bounds() else {
            trace!("Target '{}' has no bounds, skipping", target.key());
            continue;
        };

        let distance = rect.distance_to(extrapolated);
        if distance < radius {
            candidates.push(Candidate {
                key: target.key().to_string(),
                distance,
            });
        }
    }

    CandidateSet::from(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::predictor::target::MockBoundsProvider;
    use proptest::prelude::*;

    fn target(key: &str, rect: Rect) -> TrackedTarget {
        TrackedTarget::new(key, rect)
    }

    fn untouched(key: &str) -> TrackedTarget {
        let mut mock = MockBoundsProvider::new();
        mock.expect_bounds().times(0);
        TrackedTarget::new(key, mock)
    }

    #[test]
    fn test_inside_rect_is_candidate() {
        let targets = vec![target("a", Rect::new(200.0, 0.0, 300.0, 100.0))];
        let set = select_candidates(
            &targets,
            Some(Point::new(150.0, 50.0)),
            Point::new(290.0, 50.0),
            100.0,
            GeometryAccess::Available,
        );

        assert_eq!(set.len(), 1);
        assert_eq!(set.keys(), vec!["a"]);
        assert_eq!(set.nearest().map(|c| c.distance), Some(0.0));
    }

    #[test]
    fn test_radius_boundary_is_exclusive() {
        let targets = vec![target("edge", Rect::new(100.0, 0.0, 200.0, 100.0))];

        // exactly radius away
        let set = select_candidates(
            &targets,
            Some(Point::new(50.0, 50.0)),
            Point::new(50.0, 50.0),
            50.0,
            GeometryAccess::Available,
        );
        assert!(set.is_empty());

        // just inside
        let set = select_candidates(
            &targets,
            Some(Point::new(50.5, 50.0)),
            Point::new(50.5, 50.0),
            50.0,
            GeometryAccess::Available,
        );
        assert!(set.contains("edge"));
    }

    #[test]
    fn test_order_follows_tracking_order() {
        let targets = vec![
            target("far", Rect::new(60.0, 0.0, 70.0, 10.0)),
            target("near", Rect::new(20.0, 0.0, 30.0, 10.0)),
        ];
        let set = select_candidates(
            &targets,
            Some(Point::new(10.0, 5.0)),
            Point::new(10.0, 5.0),
            100.0,
            GeometryAccess::Available,
        );

        assert_eq!(set.keys(), vec!["far", "near"]);
        assert_eq!(set.nearest().map(|c| c.key.as_str()), Some("near"));
    }

    #[test]
    fn test_unmounted_targets_skipped() {
        let targets = vec![
            TrackedTarget::new("ghost", || None),
            target("real", Rect::new(0.0, 0.0, 10.0, 10.0)),
        ];
        let set = select_candidates(
            &targets,
            Some(Point::new(5.0, 5.0)),
            Point::new(5.0, 5.0),
            10.0,
            GeometryAccess::Available,
        );

        assert_eq!(set.keys(), vec!["real"]);
    }

    #[test]
    fn test_no_targets() {
        let set = select_candidates(
            &[],
            Some(Point::new(5.0, 5.0)),
            Point::new(5.0, 5.0),
            10.0,
            GeometryAccess::Available,
        );
        assert!(set.is_empty());
    }

    #[test]
    fn test_guards_never_query_geometry() {
        let targets = vec![untouched("a"), untouched("b")];

        let undefined = select_candidates(
            &targets,
            None,
            Point::ORIGIN,
            100.0,
            GeometryAccess::Available,
        );
        assert!(undefined.is_empty());

        let origin = select_candidates(
            &targets,
            Some(Point::ORIGIN),
            Point::ORIGIN,
            100.0,
            GeometryAccess::Available,
        );
        assert!(origin.is_empty());

        let headless = select_candidates(
            &targets,
            Some(Point::new(5.0, 5.0)),
            Point::new(5.0, 5.0),
            100.0,
            GeometryAccess::Unavailable,
        );
        assert!(headless.is_empty());
    }

    #[test]
    fn test_geometry_access_parse() {
        assert_eq!(
            "server".parse::<GeometryAccess>().unwrap(),
            GeometryAccess::Unavailable
        );
        assert_eq!(
            "Client".parse::<GeometryAccess>().unwrap(),
            GeometryAccess::Available
        );
        assert!("maybe".parse::<GeometryAccess>().is_err());
    }

    proptest! {
        #[test]
        fn prop_membership_matches_strict_distance(
            px in 1.0f64..1000.0,
            py in 1.0f64..1000.0,
            left in 0.0f64..1000.0,
            top in 0.0f64..1000.0,
            radius in 1.0f64..300.0,
        ) {
            let rect = Rect::from_origin_size(left, top, 50.0, 50.0);
            let targets = vec![target("t", rect)];
            let p = Point::new(px, py);
            let set = select_candidates(&targets, Some(p), p, radius, GeometryAccess::Available);
            prop_assert_eq!(set.contains("t"), rect.distance_to(p) < radius);
        }
    }
}
