//! Prefetch registry
//!
//! Maps string keys to prefetch callbacks and per-key reactive slots.
//!
//! # Invariants
//!
//! - A key is registered at most once; a second registration is rejected
//!   and never replaces the first callback.
//! - Keys are never removed; `keys()` preserves registration order.
//! - A slot is written only by its default and by its own callback.
//!
//! # Typing
//!
//! Storage is type-erased. Compile-time typing is recovered through the
//! [`Slot<T>`] handle returned by registration, and the [`KeyDescriptor`]
//! kept next to each entry records the value type so [`PrefetchRegistry::slot`]
//! can hand out typed handles later.
//!
//! ```no_run
//! use foresight::registry::PrefetchRegistry;
//!
//! # async fn demo() -> foresight::Result<()> {
//! let registry = PrefetchRegistry::new();
//! let profile = registry.register(
//!     "profile",
//!     |_params| async { Ok::<_, anyhow::Error>("Ada".to_string()) },
//!     None,
//! )?;
//!
//! registry.prefetch("profile", None).await;
//! assert_eq!(profile.get().as_deref(), Some("Ada"));
//! # Ok(())
//! # }
//! ```

mod slot;

pub use slot::{PrefetchValue, Slot, SlotSnapshot, SlotState, SlotWatcher};

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ForesightError, Result};
use slot::SlotCell;

/// Optional parameters passed to a prefetch callback
pub type PrefetchParams = Option<serde_json::Value>;

type ErasedCallback =
    Arc<dyn Fn(PrefetchParams) -> BoxFuture<'static, anyhow::Result<PrefetchValue>> + Send + Sync>;

/// Type information recorded for a registered key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDescriptor {
    /// Registered key
    pub key: String,
    /// Rust type name of the slot value
    pub value_type: &'static str,
    /// Whether a default value was supplied
    pub has_default: bool,
    #[serde(skip)]
    type_id: TypeId,
}

struct Entry {
    callback: ErasedCallback,
    cell: Arc<SlotCell>,
    descriptor: KeyDescriptor,
    key: Arc<str>,
}

#[derive(Default)]
struct Inner {
    keys: Vec<String>,
    entries: HashMap<String, Entry>,
}

/// Registry of named prefetch operations
#[derive(Default)]
pub struct PrefetchRegistry {
    inner: RwLock<Inner>,
}

impl PrefetchRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asynchronous prefetch callback
    ///
    /// The slot starts out holding `default` (or nothing). Fails with
    /// [`ForesightError::DuplicateKey`] if `key` is already registered.
    pub fn register<T, F, Fut>(
        &self,
        key: impl Into<String>,
        callback: F,
        default: Option<T>,
    ) -> Result<Slot<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(PrefetchParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let key = key.into();
        let erased: ErasedCallback = Arc::new(move |params| {
            let fut = callback(params);
            async move { fut.await.map(|v| Arc::new(v) as PrefetchValue) }.boxed()
        });

        self.insert::<T>(key, erased, default)
    }

    /// Register a synchronous prefetch callback
    pub fn register_sync<T, F>(
        &self,
        key: impl Into<String>,
        callback: F,
        default: Option<T>,
    ) -> Result<Slot<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(PrefetchParams) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.register(
            key,
            move |params| futures::future::ready(callback(params)),
            default,
        )
    }

    fn insert<T>(&self, key: String, callback: ErasedCallback, default: Option<T>) -> Result<Slot<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        if inner.entries.contains_key(&key) {
            warn!("Rejected duplicate prefetch registration for '{}'", key);
            return Err(ForesightError::DuplicateKey(key));
        }

        let descriptor = KeyDescriptor {
            key: key.clone(),
            value_type: std::any::type_name::<T>(),
            has_default: default.is_some(),
            type_id: TypeId::of::<T>(),
        };
        let shared_key: Arc<str> = Arc::from(key.as_str());
        let cell = Arc::new(SlotCell::new(
            default.map(|v| Arc::new(v) as PrefetchValue),
        ));

        info!(
            "Registered prefetch '{}' ({}, default: {})",
            key, descriptor.value_type, descriptor.has_default
        );

        inner.keys.push(key.clone());
        inner.entries.insert(
            key,
            Entry {
                callback,
                cell: Arc::clone(&cell),
                descriptor,
                key: Arc::clone(&shared_key),
            },
        );

        Ok(Slot::new(shared_key, cell))
    }

    /// Registered keys in registration order (snapshot)
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys.clone()
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.inner.read().keys.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.inner.read().keys.is_empty()
    }

    /// Check if a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    /// Type information for a key
    pub fn descriptor(&self, key: &str) -> Option<KeyDescriptor> {
        self.inner
            .read()
            .entries
            .get(key)
            .map(|e| e.descriptor.clone())
    }

    /// Typed handle for an existing key
    ///
    /// Returns `None` if the key is unknown or was registered with a
    /// different value type.
    pub fn slot<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<Slot<T>> {
        let inner = self.inner.read();
        let entry = inner.entries.get(key)?;
        if entry.descriptor.type_id != TypeId::of::<T>() {
            return None;
        }
        Some(Slot::new(Arc::clone(&entry.key), Arc::clone(&entry.cell)))
    }

    /// Untyped snapshot of a key's slot
    pub fn snapshot(&self, key: &str) -> Option<SlotSnapshot> {
        self.inner.read().entries.get(key).map(|e| e.cell.snapshot())
    }

    /// Invoke the callback for `key` and return its result
    ///
    /// Unregistered keys are a silent no-op returning `None`. The slot is
    /// left untouched; see [`PrefetchRegistry::prefetch`] for the variant
    /// that stores the result.
    pub async fn trigger(
        &self,
        key: &str,
        params: PrefetchParams,
    ) -> Option<Result<PrefetchValue>> {
        let callback = self.callback(key)?;
        Some(
            invoke(callback, params)
                .await
                .map_err(|source| ForesightError::Callback {
                    key: key.to_string(),
                    source,
                }),
        )
    }

    /// Invoke the callback for `key` and store the result in its slot
    ///
    /// The slot goes `Pending` while the callback runs, then `Ready` with
    /// the resolved value, or `Failed` keeping its previous value. A
    /// panicking callback counts as a failure.
    pub async fn prefetch(&self, key: &str, params: PrefetchParams) -> Option<Result<()>> {
        let (callback, cell) = {
            let inner = self.inner.read();
            let Some(entry) = inner.entries.get(key) else {
                debug!("Prefetch for unregistered key '{}' ignored", key);
                return None;
            };
            (Arc::clone(&entry.callback), Arc::clone(&entry.cell))
        };

        cell.mark_pending();
        match invoke(callback, params).await {
            Ok(value) => {
                cell.resolve(value);
                Some(Ok(()))
            }
            Err(source) => {
                cell.fail();
                Some(Err(ForesightError::Callback {
                    key: key.to_string(),
                    source,
                }))
            }
        }
    }

    fn callback(&self, key: &str) -> Option<ErasedCallback> {
        let inner = self.inner.read();
        match inner.entries.get(key) {
            Some(entry) => Some(Arc::clone(&entry.callback)),
            None => {
                debug!("Trigger for unregistered key '{}' ignored", key);
                None
            }
        }
    }
}

/// Run a callback, turning a panic into an error
///
/// The callback is called inside the future so a synchronous callback that
/// panics is caught as well.
async fn invoke(callback: ErasedCallback, params: PrefetchParams) -> anyhow::Result<PrefetchValue> {
    match AssertUnwindSafe(async move { callback(params).await })
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            anyhow::bail!("prefetch callback panicked: {}", message)
        }
    }
}

impl fmt::Debug for PrefetchRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefetchRegistry")
            .field("keys", &self.inner.read().keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_registry() {
        let registry = PrefetchRegistry::new();
        assert!(registry.keys().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_keys_in_registration_order() {
        let registry = PrefetchRegistry::new();
        registry
            .register_sync("b", |_| Ok(1u32), None)
            .unwrap();
        registry
            .register_sync("a", |_| Ok(2u32), None)
            .unwrap();
        registry
            .register_sync("c", |_| Ok(3u32), None)
            .unwrap();

        assert_eq!(registry.keys(), vec!["b", "a", "c"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_keys_snapshot_is_detached() {
        let registry = PrefetchRegistry::new();
        registry.register_sync("a", |_| Ok(()), None).unwrap();

        let mut keys = registry.keys();
        keys.push("injected".to_string());
        keys.clear();

        assert_eq!(registry.keys(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected_and_first_kept() {
        let registry = PrefetchRegistry::new();
        registry
            .register_sync("user", |_| Ok("first".to_string()), None)
            .unwrap();

        let err = registry
            .register_sync("user", |_| Ok("second".to_string()), None)
            .unwrap_err();
        assert!(matches!(err, ForesightError::DuplicateKey(ref k) if k == "user"));
        assert_eq!(registry.keys(), vec!["user"]);

        let value = registry.trigger("user", None).await.unwrap().unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("first"));
    }

    #[tokio::test]
    async fn test_trigger_unregistered_is_noop() {
        let registry = PrefetchRegistry::new();
        assert!(registry.trigger("missing", None).await.is_none());
        assert!(registry.prefetch("missing", None).await.is_none());
    }

    #[tokio::test]
    async fn test_trigger_passes_params_without_touching_slot() {
        let registry = PrefetchRegistry::new();
        let slot = registry
            .register(
                "echo",
                |params: PrefetchParams| async move {
                    Ok::<_, anyhow::Error>(params.map(|p| p.to_string()).unwrap_or_default())
                },
                Some("default".to_string()),
            )
            .unwrap();

        let value = registry
            .trigger("echo", Some(serde_json::json!({"id": 3})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            value.downcast_ref::<String>().map(String::as_str),
            Some(r#"{"id":3}"#)
        );
        assert_eq!(slot.get().as_deref(), Some("default"));
        assert_eq!(slot.state(), SlotState::Idle);
    }

    #[tokio::test]
    async fn test_prefetch_stores_result() {
        let registry = PrefetchRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let slot = registry
            .register(
                "orders",
                move |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, anyhow::Error>(vec![1u32, 2, 3])
                    }
                },
                Some(Vec::new()),
            )
            .unwrap();
        assert_eq!(slot.get(), Some(Vec::new()));

        registry.prefetch("orders", None).await.unwrap().unwrap();

        assert_eq!(slot.get(), Some(vec![1, 2, 3]));
        assert_eq!(slot.state(), SlotState::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prefetch_failure_keeps_default() {
        let registry = PrefetchRegistry::new();
        let slot = registry
            .register_sync(
                "flaky",
                |_| -> anyhow::Result<u32> { anyhow::bail!("backend unavailable") },
                Some(0u32),
            )
            .unwrap();

        let result = registry.prefetch("flaky", None).await.unwrap();
        assert!(result.unwrap_err().is_callback_failure());
        assert_eq!(slot.get(), Some(0));
        assert_eq!(slot.state(), SlotState::Failed);
    }

    #[tokio::test]
    async fn test_slots_are_disjoint() {
        let registry = PrefetchRegistry::new();
        let a = registry.register_sync("a", |_| Ok(1u8), None).unwrap();
        let b = registry.register_sync("b", |_| Ok(2u8), Some(9u8)).unwrap();

        registry.prefetch("a", None).await;

        assert_eq!(a.get(), Some(1));
        assert_eq!(b.get(), Some(9));
        assert_eq!(b.state(), SlotState::Idle);
    }

    #[test]
    fn test_typed_slot_lookup() {
        let registry = PrefetchRegistry::new();
        registry
            .register_sync("count", |_| Ok(5u64), Some(1u64))
            .unwrap();

        assert_eq!(registry.slot::<u64>("count").and_then(|s| s.get()), Some(1));
        assert!(registry.slot::<String>("count").is_none());
        assert!(registry.slot::<u64>("missing").is_none());

        let descriptor = registry.descriptor("count").unwrap();
        assert_eq!(descriptor.value_type, "u64");
        assert!(descriptor.has_default);
    }

    #[tokio::test]
    async fn test_panicking_callback_fails_slot() {
        let registry = PrefetchRegistry::new();
        let slot = registry
            .register_sync(
                "boom",
                |_| -> anyhow::Result<u32> { panic!("layout exploded") },
                Some(3u32),
            )
            .unwrap();

        let err = registry.prefetch("boom", None).await.unwrap().unwrap_err();
        assert!(err.is_callback_failure());
        assert!(err.to_string().contains("layout exploded"));
        assert_eq!(slot.state(), SlotState::Failed);
        assert_eq!(slot.get(), Some(3));
        assert_eq!(slot.settled().await, SlotState::Failed);
    }

    #[tokio::test]
    async fn test_panicking_async_callback_is_caught() {
        let registry = PrefetchRegistry::new();
        registry
            .register(
                "later",
                |_| async {
                    let explode = true;
                    tokio::task::yield_now().await;
                    if explode {
                        panic!("after yield");
                    }
                    Ok::<u8, anyhow::Error>(0)
                },
                None,
            )
            .unwrap();

        let result = registry.trigger("later", None).await.unwrap();
        assert!(result.unwrap_err().is_callback_failure());
    }
}
