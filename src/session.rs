//! Foresight session
//!
//! Wires the predictor, the debouncer and the prefetch registry together:
//!
//! ```text
//! on_pointer_move(x, y)
//!   └─> TrajectoryPredictor ──> CandidateSet (every update)
//!       └─> Debouncer (quiet interval)
//!           └─> dispatcher task
//!               ├─> candidate listeners / subscribers
//!               └─> FetchedKeys gate ──> registry.prefetch(key) (one task per key)
//! ```
//!
//! # At-most-once
//!
//! A key is marked fetched *before* its callback is spawned, so a key that
//! re-enters the candidate set while its callback is still running is not
//! triggered again. The mark is never cleared for the lifetime of the
//! session, including after a failed callback: retrying requires a new
//! session.
//!
//! Triggering a key with no registered prefetch is a no-op, but the key is
//! still marked: a prefetch registered for it later does not fire in this
//! session.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::{ForesightConfig, TriggerMode};
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::geometry::Point;
use crate::predictor::{CandidateSet, TrackedTarget, TrajectoryPredictor};
use crate::registry::PrefetchRegistry;

type Listener = Arc<dyn Fn(&CandidateSet) + Send + Sync>;

/// Identifies a registered candidate listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Pointer updates fed into the predictor
    pub pointer_updates: u64,
    /// Debounced candidate sets delivered
    pub emissions: u64,
    /// Keys triggered (each key at most once)
    pub triggered: u64,
    /// Prefetch callbacks that resolved
    pub completed: u64,
    /// Prefetch callbacks that failed
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    pointer_updates: AtomicU64,
    emissions: AtomicU64,
    triggered: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> SessionStats {
        SessionStats {
            pointer_updates: self.pointer_updates.load(Ordering::Relaxed),
            emissions: self.emissions.load(Ordering::Relaxed),
            triggered: self.triggered.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Monotonic record of keys whose prefetch has been started
#[derive(Debug, Default)]
struct FetchedKeys {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl FetchedKeys {
    fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Returns `true` if the key was not marked before
    fn mark(&mut self, key: &str) -> bool {
        if !self.seen.insert(key.to_string()) {
            return false;
        }
        self.order.push(key.to_string());
        true
    }
}

struct Shared {
    config: ForesightConfig,
    predictor: Mutex<TrajectoryPredictor>,
    registry: Arc<PrefetchRegistry>,
    fetched: Mutex<FetchedKeys>,
    latest: watch::Sender<CandidateSet>,
    in_flight: watch::Sender<usize>,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    counters: Counters,
}

/// A predictive prefetch session over one pointer and one registry
///
/// Must be created inside a tokio runtime. Dropping the session stops the
/// debouncer and dispatcher; prefetch callbacks already started run to
/// completion.
pub struct ForesightSession {
    shared: Arc<Shared>,
    debouncer: Debouncer<CandidateSet>,
    dispatcher: JoinHandle<()>,
}

impl ForesightSession {
    /// Start a session
    pub fn new(config: ForesightConfig, registry: Arc<PrefetchRegistry>) -> Result<Self> {
        config.validate()?;
        let predictor = TrajectoryPredictor::new(config.radius, config.geometry)?;

        info!(
            "Foresight session: radius={}, factor={:.2}, debounce={}ms, mode={}, geometry={}",
            config.radius,
            predictor.prediction_factor(),
            config.debounce_ms,
            config.mode,
            config.geometry
        );

        let (debouncer, emissions) = Debouncer::spawn(config.debounce());
        let (latest, _) = watch::channel(CandidateSet::empty());
        let (in_flight, _) = watch::channel(0usize);

        let shared = Arc::new(Shared {
            config,
            predictor: Mutex::new(predictor),
            registry,
            fetched: Mutex::new(FetchedKeys::default()),
            latest,
            in_flight,
            listeners: RwLock::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            counters: Counters::default(),
        });

        let dispatcher = tokio::spawn(run_dispatcher(Arc::clone(&shared), emissions));

        Ok(Self {
            shared,
            debouncer,
            dispatcher,
        })
    }

    /// Builder-style target registration
    pub fn with_targets(self, targets: impl IntoIterator<Item = TrackedTarget>) -> Self {
        {
            let mut predictor = self.shared.predictor.lock();
            for target in targets {
                predictor.track(target);
            }
        }
        self
    }

    /// Start tracking a target
    pub fn track(&self, target: TrackedTarget) {
        debug!("Tracking target '{}'", target.key());
        self.shared.predictor.lock().track(target);
    }

    /// Stop tracking a target
    ///
    /// Does not reset its fetched mark.
    pub fn untrack(&self, key: &str) -> bool {
        self.shared.predictor.lock().untrack(key)
    }

    /// Feed a pointer move
    pub fn on_pointer_move(&self, x: f64, y: f64) {
        self.on_pointer_update(Some(Point::new(x, y)));
    }

    /// Pointer left the viewport
    pub fn on_pointer_leave(&self) {
        self.on_pointer_update(None);
    }

    /// Feed a possibly undefined pointer position
    pub fn on_pointer_update(&self, position: Option<Point>) {
        let candidates = self.shared.predictor.lock().on_pointer_update(position);
        self.shared
            .counters
            .pointer_updates
            .fetch_add(1, Ordering::Relaxed);

        trace!("Recomputed {} candidate(s)", candidates.len());
        if !self.debouncer.push(candidates) {
            warn!("Debouncer stopped, pointer update dropped");
        }
    }

    /// Candidates for the current pointer state, bypassing the debounce
    pub fn current_candidates(&self) -> CandidateSet {
        self.shared.predictor.lock().candidates()
    }

    /// Most recent debounced candidate set
    pub fn latest_candidates(&self) -> CandidateSet {
        self.shared.latest.borrow().clone()
    }

    /// Observe debounced candidate sets
    pub fn subscribe(&self) -> watch::Receiver<CandidateSet> {
        self.shared.latest.subscribe()
    }

    /// Call `listener` with every debounced candidate set
    pub fn on_candidates_changed<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CandidateSet) + Send + Sync + 'static,
    {
        let id = ListenerId(self.shared.next_listener.fetch_add(1, Ordering::Relaxed));
        self.shared.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a candidate listener
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.shared.listeners.write();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Keys whose prefetch has been started, in trigger order
    pub fn fetched_keys(&self) -> Vec<String> {
        self.shared.fetched.lock().order.clone()
    }

    /// Check if a key's prefetch has been started
    pub fn is_fetched(&self, key: &str) -> bool {
        self.shared.fetched.lock().contains(key)
    }

    /// Wait until no prefetch callback is running
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.in_flight.subscribe();
        // Sender lives in `shared`, which we hold, so this cannot fail.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Number of prefetch callbacks currently running
    pub fn in_flight(&self) -> usize {
        *self.shared.in_flight.borrow()
    }

    /// Session counters
    pub fn stats(&self) -> SessionStats {
        self.shared.counters.snapshot()
    }

    /// Prefetch registry backing this session
    pub fn registry(&self) -> &Arc<PrefetchRegistry> {
        &self.shared.registry
    }

    /// Session configuration
    pub fn config(&self) -> &ForesightConfig {
        &self.shared.config
    }

    /// Trigger radius
    pub fn radius(&self) -> f64 {
        self.shared.config.radius
    }

    /// Look-ahead multiplier (`radius / 100`)
    pub fn prediction_factor(&self) -> f64 {
        self.shared.predictor.lock().prediction_factor()
    }
}

impl Drop for ForesightSession {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

async fn run_dispatcher(shared: Arc<Shared>, mut emissions: mpsc::UnboundedReceiver<CandidateSet>) {
    while let Some(candidates) = emissions.recv().await {
        dispatch(&shared, candidates);
    }
    trace!("Dispatcher stopped");
}

fn dispatch(shared: &Arc<Shared>, candidates: CandidateSet) {
    shared.counters.emissions.fetch_add(1, Ordering::Relaxed);
    debug!("Debounced candidates: {:?}", candidates.keys());

    shared.latest.send_replace(candidates.clone());

    let listeners: Vec<Listener> = shared
        .listeners
        .read()
        .iter()
        .map(|(_, l)| Arc::clone(l))
        .collect();
    for listener in listeners {
        listener(&candidates);
    }

    if candidates.is_empty() {
        return;
    }

    for key in select_keys(shared, &candidates) {
        shared.in_flight.send_modify(|n| *n += 1);
        shared.counters.triggered.fetch_add(1, Ordering::Relaxed);
        info!("Prefetch triggered for '{}'", key);

        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            match shared.registry.prefetch(&key, None).await {
                Some(Ok(())) => {
                    shared.counters.completed.fetch_add(1, Ordering::Relaxed);
                    info!("Prefetch completed for '{}'", key);
                }
                Some(Err(e)) => {
                    shared.counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Prefetch failed for '{}', not retrying: {}", key, e);
                }
                None => {
                    debug!("No prefetch registered for '{}', marked anyway", key);
                }
            }
            shared.in_flight.send_modify(|n| *n -= 1);
        });
    }
}

/// Pick the keys to trigger and mark them fetched
fn select_keys(shared: &Shared, candidates: &CandidateSet) -> Vec<String> {
    let mut fetched = shared.fetched.lock();
    let eligible = candidates.iter().filter(|c| !fetched.contains(&c.key));

    let chosen: Vec<String> = match shared.config.mode {
        TriggerMode::Multiple => eligible.map(|c| c.key.clone()).collect(),
        TriggerMode::Single => CandidateSet::from(eligible.cloned().collect::<Vec<_>>())
            .nearest()
            .map(|c| vec![c.key.clone()])
            .unwrap_or_default(),
    };

    chosen.into_iter().filter(|key| fetched.mark(key)).collect()
}
