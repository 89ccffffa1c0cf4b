//! Tracked targets
//!
//! A target pairs a prefetch key with a lazily evaluated bounds query. The
//! query is re-run on every recomputation so layout changes are picked up
//! without re-registering the target.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::geometry::Rect;

/// Source of a target's current bounding rectangle
///
/// Returns `None` while the element is not mounted or not visible; such
/// targets are skipped, never treated as an error.
#[cfg_attr(test, mockall::automock)]
pub trait BoundsProvider: Send + Sync {
    /// Current bounds in pointer space
    fn bounds(&self) -> Option<Rect>;
}

impl<F> BoundsProvider for F
where
    F: Fn() -> Option<Rect> + Send + Sync,
{
    fn bounds(&self) -> Option<Rect> {
        self()
    }
}

impl BoundsProvider for Rect {
    fn bounds(&self) -> Option<Rect> {
        Some(*self)
    }
}

/// Host-updatable bounds cell
///
/// The host writes the element rectangle on mount/layout and clears it on
/// unmount; the predictor reads it during recomputation.
#[derive(Debug, Clone, Default)]
pub struct SharedBounds {
    inner: Arc<RwLock<Option<Rect>>>,
}

impl SharedBounds {
    /// Create an unmounted cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cell that is already mounted
    pub fn mounted(rect: Rect) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(rect))),
        }
    }

    /// Record the element's current rectangle
    pub fn set(&self, rect: Rect) {
        *self.inner.write() = Some(rect);
    }

    /// Mark the element as unmounted
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Check if the element currently has bounds
    pub fn is_mounted(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl BoundsProvider for SharedBounds {
    fn bounds(&self) -> Option<Rect> {
        *self.inner.read()
    }
}

/// A UI region the predictor watches
#[derive(Clone)]
pub struct TrackedTarget {
    key: String,
    bounds: Arc<dyn BoundsProvider>,
}

impl TrackedTarget {
    /// Track `key` using any bounds provider
    pub fn new(key: impl Into<String>, bounds: impl BoundsProvider + 'static) -> Self {
        Self {
            key: key.into(),
            bounds: Arc::new(bounds),
        }
    }

    /// Track `key` using an already shared provider
    pub fn with_provider(key: impl Into<String>, bounds: Arc<dyn BoundsProvider>) -> Self {
        Self {
            key: key.into(),
            bounds,
        }
    }

    /// Prefetch key of this target
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Query the current bounds
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds.bounds()
    }
}

impl fmt::Debug for TrackedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedTarget")
            .field("key", &self.key)
            .field("bounds", &self.bounds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_rect_target() {
        let target = TrackedTarget::new("card", Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(target.key(), "card");
        assert_eq!(target.bounds(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_closure_target() {
        let target = TrackedTarget::new("hidden", || None);
        assert_eq!(target.bounds(), None);
    }

    #[test]
    fn test_shared_bounds_mount_cycle() {
        let cell = SharedBounds::new();
        let target = TrackedTarget::new("menu", cell.clone());
        assert!(!cell.is_mounted());
        assert_eq!(target.bounds(), None);

        cell.set(Rect::new(5.0, 5.0, 15.0, 15.0));
        assert!(cell.is_mounted());
        assert_eq!(target.bounds(), Some(Rect::new(5.0, 5.0, 15.0, 15.0)));

        cell.clear();
        assert_eq!(target.bounds(), None);
    }

    #[test]
    fn test_mock_provider() {
        let mut mock = MockBoundsProvider::new();
        mock.expect_bounds()
            .times(1)
            .returning(|| Some(Rect::new(1.0, 2.0, 3.0, 4.0)));

        let target = TrackedTarget::new("mocked", mock);
        assert_eq!(target.bounds(), Some(Rect::new(1.0, 2.0, 3.0, 4.0)));
    }
}
