//! Reactive prefetch slots
//!
//! Each registered key owns exactly one slot. The slot holds the key's
//! default (if any) until its callback resolves, then the resolved value.
//! Observers subscribe through a [`SlotWatcher`] and are woken on every
//! state change.

use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::watch;

/// Type-erased prefetch result
pub type PrefetchValue = Arc<dyn Any + Send + Sync>;

/// Lifecycle of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    /// Holding the default (or nothing); callback never started
    #[default]
    Idle,
    /// Callback in flight
    Pending,
    /// Callback resolved and its value is stored
    Ready,
    /// Callback failed; the previous value is kept
    Failed,
}

impl SlotState {
    /// Check if the callback has finished, successfully or not
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Pending => write!(f, "pending"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Contents of a slot at one point in time
#[derive(Clone)]
pub struct SlotSnapshot {
    /// Stored value, if any
    pub value: Option<PrefetchValue>,
    /// Lifecycle state
    pub state: SlotState,
}

impl fmt::Debug for SlotSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotSnapshot")
            .field("has_value", &self.value.is_some())
            .field("state", &self.state)
            .finish()
    }
}

/// Untyped slot storage shared between the registry and typed handles
#[derive(Debug)]
pub(crate) struct SlotCell {
    tx: watch::Sender<SlotSnapshot>,
}

impl SlotCell {
    pub(crate) fn new(default: Option<PrefetchValue>) -> Self {
        let (tx, _rx) = watch::channel(SlotSnapshot {
            value: default,
            state: SlotState::Idle,
        });
        Self { tx }
    }

    pub(crate) fn snapshot(&self) -> SlotSnapshot {
        self.tx.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SlotSnapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn mark_pending(&self) {
        self.tx.send_modify(|s| s.state = SlotState::Pending);
    }

    pub(crate) fn resolve(&self, value: PrefetchValue) {
        self.tx.send_modify(|s| {
            s.value = Some(value);
            s.state = SlotState::Ready;
        });
    }

    pub(crate) fn fail(&self) {
        self.tx.send_modify(|s| s.state = SlotState::Failed);
    }
}

fn downcast<T: Clone + 'static>(value: Option<&PrefetchValue>) -> Option<T> {
    value.and_then(|v| v.downcast_ref::<T>()).cloned()
}

/// Typed handle to one key's slot
///
/// Returned by registration; cheap to clone.
pub struct Slot<T> {
    key: Arc<str>,
    cell: Arc<SlotCell>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + Sync + 'static> Slot<T> {
    pub(crate) fn new(key: Arc<str>, cell: Arc<SlotCell>) -> Self {
        Self {
            key,
            cell,
            _marker: PhantomData,
        }
    }

    /// Key this slot belongs to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value (default, or the resolved prefetch result)
    pub fn get(&self) -> Option<T> {
        let snapshot = self.cell.snapshot();
        downcast(snapshot.value.as_ref())
    }

    /// Current lifecycle state
    pub fn state(&self) -> SlotState {
        self.cell.snapshot().state
    }

    /// Observe future changes of this slot
    pub fn watch(&self) -> SlotWatcher<T> {
        SlotWatcher {
            rx: self.cell.subscribe(),
            _marker: PhantomData,
        }
    }

    /// Wait until the callback has resolved or failed
    ///
    /// Returns immediately if it already has.
    pub async fn settled(&self) -> SlotState {
        let mut rx = self.cell.subscribe();
        let state = match rx.wait_for(|s| s.state.is_settled()).await {
            Ok(snapshot) => snapshot.state,
            Err(_) => self.state(),
        };
        state
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            key: Arc::clone(&self.key),
            cell: Arc::clone(&self.cell),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("key", &self.key)
            .field("type", &std::any::type_name::<T>())
            .field("state", &self.cell.snapshot().state)
            .finish()
    }
}

/// Subscription to a typed slot
pub struct SlotWatcher<T> {
    rx: watch::Receiver<SlotSnapshot>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Clone + Send + Sync + 'static> SlotWatcher<T> {
    /// Wait for the next change
    ///
    /// Returns `false` once the registry owning the slot is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Value as of the latest observed change
    pub fn get(&mut self) -> Option<T> {
        let snapshot = self.rx.borrow_and_update();
        downcast(snapshot.value.as_ref())
    }

    /// State as of the latest observed change
    pub fn state(&self) -> SlotState {
        self.rx.borrow().state
    }
}
