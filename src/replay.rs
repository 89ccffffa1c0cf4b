//! Scenario replay
//!
//! Drives a [`ForesightSession`] from a recorded pointer trace so radius and
//! debounce settings can be evaluated offline.
//!
//! # Scenario format (JSON)
//!
//! ```json
//! {
//!   "targets": [
//!     { "key": "details", "rect": { "left": 200, "top": 0, "right": 300, "bottom": 100 } },
//!     { "key": "hidden", "rect": null },
//!     { "key": "broken", "rect": { "left": 0, "top": 0, "right": 10, "bottom": 10 }, "fail": true }
//!   ],
//!   "samples": [
//!     { "x": 0, "y": 50, "delay_ms": 16 },
//!     { "x": 10, "y": 50, "delay_ms": 16 },
//!     { "delay_ms": 16 }
//!   ]
//! }
//! ```
//!
//! A sample without `x`/`y` is a pointer-leave. Each target gets a prefetch
//! callback returning `"<key>:prefetched"` unless `register` is `false`, or
//! an error if `fail` is `true`.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ForesightConfig;
use crate::geometry::{Point, Rect};
use crate::predictor::TrackedTarget;
use crate::registry::{PrefetchRegistry, SlotState};
use crate::session::{ForesightSession, SessionStats};

/// A target in a replay scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTarget {
    /// Prefetch key
    pub key: String,

    /// Static bounds (`null` = never mounted)
    #[serde(default)]
    pub rect: Option<Rect>,

    /// Register a prefetch callback for this key
    #[serde(default = "default_register")]
    pub register: bool,

    /// Make the callback fail
    #[serde(default)]
    pub fail: bool,
}

fn default_register() -> bool {
    true
}

/// A pointer sample in a replay scenario
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScenarioSample {
    /// Horizontal position (absent = pointer outside)
    #[serde(default)]
    pub x: Option<f64>,

    /// Vertical position (absent = pointer outside)
    #[serde(default)]
    pub y: Option<f64>,

    /// Wait after feeding this sample (ms)
    #[serde(default)]
    pub delay_ms: u64,
}

impl ScenarioSample {
    /// Pointer position, defined only if both coordinates are
    pub fn position(&self) -> Option<Point> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// Recorded pointer trace and tracked targets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Targets in tracking order
    #[serde(default)]
    pub targets: Vec<ScenarioTarget>,

    /// Pointer samples in replay order
    #[serde(default)]
    pub samples: Vec<ScenarioSample>,
}

impl Scenario {
    /// Load a scenario from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read scenario file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse a scenario from JSON text
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse scenario file")
    }
}

/// Final state of one slot after replay
#[derive(Debug, Clone, Serialize)]
pub struct SlotReport {
    /// Prefetch key
    pub key: String,
    /// Lifecycle state
    pub state: SlotState,
    /// Stored value, if any
    pub value: Option<String>,
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Candidate keys of every debounced emission, in order
    pub emissions: Vec<Vec<String>>,
    /// Keys triggered, in trigger order
    pub fetched: Vec<String>,
    /// Slot state per registered key, in registration order
    pub slots: Vec<SlotReport>,
    /// Session counters
    pub stats: SessionStats,
}

/// Replay a scenario against a fresh session
///
/// Waits one debounce interval after the last sample and then for all
/// prefetch callbacks to settle.
pub async fn replay(config: &ForesightConfig, scenario: &Scenario) -> Result<ReplayReport> {
    let registry = Arc::new(PrefetchRegistry::new());
    for target in scenario.targets.iter().filter(|t| t.register) {
        let key = target.key.clone();
        let fail = target.fail;
        registry.register(
            target.key.clone(),
            move |_| {
                let key = key.clone();
                async move {
                    if fail {
                        anyhow::bail!("scripted failure for '{}'", key);
                    }
                    Ok(format!("{}:prefetched", key))
                }
            },
            None::<String>,
        )?;
    }

    let session = ForesightSession::new(config.clone(), Arc::clone(&registry))?.with_targets(
        scenario.targets.iter().map(|t| match t.rect {
            Some(rect) => TrackedTarget::new(t.key.clone(), rect),
            None => TrackedTarget::new(t.key.clone(), || -> Option<Rect> { None }),
        }),
    );

    let emissions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&emissions);
    session.on_candidates_changed(move |candidates| {
        let keys: Vec<String> = candidates.keys().into_iter().map(String::from).collect();
        sink.lock().push(keys);
    });

    info!(
        "Replaying {} sample(s) over {} target(s)",
        scenario.samples.len(),
        scenario.targets.len()
    );

    for sample in &scenario.samples {
        session.on_pointer_update(sample.position());
        if sample.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(sample.delay_ms)).await;
        }
    }

    tokio::time::sleep(config.debounce() + Duration::from_millis(1)).await;
    session.wait_idle().await;
    debug!("Replay settled: {:?}", session.stats());

    let slots = registry
        .keys()
        .into_iter()
        .map(|key| {
            let slot = registry.slot::<String>(&key);
            SlotReport {
                state: slot.as_ref().map(|s| s.state()).unwrap_or_default(),
                value: slot.and_then(|s| s.get()),
                key,
            }
        })
        .collect();

    let report = ReplayReport {
        emissions: emissions.lock().clone(),
        fetched: session.fetched_keys(),
        slots,
        stats: session.stats(),
    };
    Ok(report)
}
