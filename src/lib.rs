//! # foresight
//!
//! Predictive pointer-intent prefetching.
//!
//! Watches pointer motion, extrapolates where the pointer is heading, and
//! starts a one-time prefetch for any tracked UI region the pointer is about
//! to reach, before it gets there.
//!
//! # Architecture
//!
//! ```text
//! foresight
//!   ├─> TrajectoryPredictor (velocity, extrapolation, candidate selection)
//!   ├─> Debouncer           (quiet-interval rate limiting)
//!   ├─> ForesightSession    (at-most-once trigger gate, listeners)
//!   └─> PrefetchRegistry    (key → callback → reactive slot)
//! ```
//!
//! # Data Flow
//!
//! **Pointer Path:** host event → `on_pointer_move` → predictor → debouncer
//!
//! **Prefetch Path:** debounced candidates → FetchedKeys gate →
//! `registry.prefetch(key)` → callback → slot
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use foresight::prelude::*;
//!
//! # async fn demo() -> foresight::Result<()> {
//! let registry = Arc::new(PrefetchRegistry::new());
//! let details = registry.register(
//!     "details",
//!     |_| async { Ok::<_, anyhow::Error>(vec!["row".to_string()]) },
//!     Some(Vec::new()),
//! )?;
//!
//! let session = ForesightSession::new(ForesightConfig::with_radius(100.0), registry)?
//!     .with_targets([TrackedTarget::new("details", Rect::new(200.0, 0.0, 300.0, 100.0))]);
//!
//! session.on_pointer_move(10.0, 50.0);
//! session.on_pointer_move(150.0, 50.0);
//!
//! details.settled().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration (TOML) for sessions and logging
pub mod config;

/// Trailing-edge debounce primitive
pub mod debounce;

/// Error types
pub mod error;

/// Points, velocities and rectangles
pub mod geometry;

/// Pointer trajectory prediction and candidate selection
///
/// Pure and synchronous: feed pointer updates, get the set of tracked
/// targets within the predictive radius.
pub mod predictor;

/// Named prefetch callbacks with typed reactive slots
pub mod registry;

/// Scenario replay used by the `foresight-replay` binary
pub mod replay;

/// Integration of predictor, debouncer and registry
///
/// Enforces at-most-once prefetch per key for the lifetime of a session.
pub mod session;

/// Utility functions
pub mod utils;

pub use error::{ForesightError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::{ForesightConfig, TriggerMode};
    pub use crate::geometry::{Point, Rect, Velocity};
    pub use crate::predictor::{
        BoundsProvider, Candidate, CandidateSet, GeometryAccess, SharedBounds, TrackedTarget,
        TrajectoryPredictor,
    };
    pub use crate::registry::{PrefetchRegistry, Slot, SlotState};
    pub use crate::session::{ForesightSession, SessionStats};
    pub use crate::{ForesightError, Result};
}
