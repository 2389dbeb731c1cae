//! Persisted cart store.
//!
//! The cart is a deduplicated set of product identifiers, persisted as a
//! JSON array of integers in a single slot file. This module is the only
//! owner of that slot; no other code reads or writes it.
//!
//! # Semantics
//!
//! - Membership is a set, never a list: adding an identifier that is already
//!   present is a no-op, so two racing additions cannot leave a duplicate
//!   entry behind.
//! - An absent or malformed slot loads as the empty set with a warning. The
//!   next successful write replaces it with a valid encoding (self-healing).
//! - Every successful [`CartStore::toggle`] broadcasts [`CartChanged`] so
//!   all subscribed views in this process can refresh their cart indicators
//!   without a reload. Subscribers that lag simply miss notifications;
//!   nothing blocks the writer.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use bodega_core::ProductId;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::instrument;

/// Notification that the cart set changed. Carries no payload; observers
/// re-read whatever membership state they display.
#[derive(Debug, Clone, Copy)]
pub struct CartChanged;

/// Capacity of the change-notification channel. Slow subscribers past this
/// many pending notifications start missing events instead of backing up
/// the writer.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Errors from the cart write path.
///
/// Reads never error: a slot that cannot be read or decoded is treated as
/// the empty cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// Slot file could not be written.
    #[error("Cart slot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cart set could not be encoded.
    #[error("Cart slot encode error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted, deduplicated set of product identifiers with change
/// notification.
///
/// Cheaply cloneable; all clones share the same set, slot, and broadcast
/// channel. Methods take `&self` - the set lives behind a mutex, which also
/// serializes the read-modify-write in [`toggle`](Self::toggle) so two
/// concurrent toggles cannot interleave mid-operation.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    path: PathBuf,
    set: Mutex<BTreeSet<ProductId>>,
    tx: broadcast::Sender<CartChanged>,
}

impl CartStore {
    /// Open the cart store backed by the slot at `path`.
    ///
    /// The slot is read once, tolerantly: a missing file means an empty
    /// cart created lazily on first write, and malformed contents are
    /// discarded with a warning.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let set = load_slot(&path);
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(CartStoreInner {
                path,
                set: Mutex::new(set),
                tx,
            }),
        }
    }

    /// Whether `id` is currently in the cart.
    #[must_use]
    pub fn is_in_cart(&self, id: ProductId) -> bool {
        self.lock_set().contains(&id)
    }

    /// Exact number of distinct identifiers in the cart.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock_set().len()
    }

    /// Snapshot of the current cart set.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<ProductId> {
        self.lock_set().clone()
    }

    /// Toggle membership of `id` and return the new membership state.
    ///
    /// Adds if absent, removes if present, writes the slot back, and
    /// broadcasts [`CartChanged`]. If the write fails the in-memory set is
    /// reverted so it keeps matching the slot, and no notification is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated set cannot be persisted.
    #[instrument(skip(self), fields(id = %id))]
    pub fn toggle(&self, id: ProductId) -> Result<bool, CartError> {
        let mut set = self.lock_set();

        let now_in_cart = if set.contains(&id) {
            set.remove(&id);
            false
        } else {
            set.insert(id);
            true
        };

        if let Err(e) = persist_slot(&self.inner.path, &set) {
            // Keep memory and slot consistent.
            if now_in_cart {
                set.remove(&id);
            } else {
                set.insert(id);
            }
            return Err(e);
        }
        drop(set);

        // No receivers is fine; the notification is best-effort.
        let _ = self.inner.tx.send(CartChanged);

        Ok(now_in_cart)
    }

    /// Subscribe to cart change notifications.
    ///
    /// Views subscribe on mount and unsubscribe by dropping the receiver.
    /// A receiver that lags past the channel capacity misses the skipped
    /// notifications silently.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartChanged> {
        self.inner.tx.subscribe()
    }

    fn lock_set(&self) -> std::sync::MutexGuard<'_, BTreeSet<ProductId>> {
        // A poisoned lock means a panic elsewhere; the set itself is still
        // a valid snapshot, so reads and writes continue.
        self.inner.set.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read the slot, treating anything unusable as the empty set.
fn load_slot(path: &Path) -> BTreeSet<ProductId> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeSet::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read cart slot, starting empty");
            return BTreeSet::new();
        }
    };

    match serde_json::from_str::<Vec<u64>>(&text) {
        // Collecting into the set collapses any duplicates an earlier
        // (buggy) writer may have left in the slot.
        Ok(ids) => ids.into_iter().map(ProductId::new).collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cart slot is malformed, starting empty");
            BTreeSet::new()
        }
    }
}

/// Write the slot as a JSON array of identifiers.
fn persist_slot(path: &Path, set: &BTreeSet<ProductId>) -> Result<(), CartError> {
    let ids: Vec<u64> = set.iter().map(|id| id.as_u64()).collect();
    let encoded = serde_json::to_string(&ids)?;
    std::fs::write(path, encoded)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_slot() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        (dir, path)
    }

    #[test]
    fn test_absent_slot_is_empty_cart() {
        let (_dir, path) = temp_slot();
        let store = CartStore::open(&path);

        assert!(!store.is_in_cart(ProductId::new(1)));
        assert_eq!(store.count(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let (_dir, path) = temp_slot();
        let store = CartStore::open(&path);
        let id = ProductId::new(7);

        assert!(store.toggle(id).unwrap());
        assert!(store.is_in_cart(id));
        assert_eq!(store.count(), 1);

        assert!(!store.toggle(id).unwrap());
        assert!(!store.is_in_cart(id));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_toggle_twice_restores_slot_cardinality() {
        let (_dir, path) = temp_slot();
        std::fs::write(&path, "[1,2]").unwrap();
        let store = CartStore::open(&path);

        store.toggle(ProductId::new(9)).unwrap();
        store.toggle(ProductId::new(9)).unwrap();

        let slot: Vec<u64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(slot, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_entries_collapse_on_load() {
        let (_dir, path) = temp_slot();
        std::fs::write(&path, "[5,5,5]").unwrap();
        let store = CartStore::open(&path);

        assert_eq!(store.count(), 1);

        // Removing once removes entirely; set semantics, not list semantics.
        assert!(!store.toggle(ProductId::new(5)).unwrap());
        assert!(!store.is_in_cart(ProductId::new(5)));

        let slot: Vec<u64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(slot.is_empty());
    }

    #[test]
    fn test_malformed_slot_is_empty_cart() {
        let (_dir, path) = temp_slot();
        std::fs::write(&path, "not-json").unwrap();
        let store = CartStore::open(&path);

        assert!(!store.is_in_cart(ProductId::new(1)));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_non_integer_slot_is_empty_cart() {
        let (_dir, path) = temp_slot();
        std::fs::write(&path, r#"{"cart": [1, 2]}"#).unwrap();
        assert_eq!(CartStore::open(&path).count(), 0);

        std::fs::write(&path, r#"[1, "two"]"#).unwrap();
        assert_eq!(CartStore::open(&path).count(), 0);
    }

    #[test]
    fn test_malformed_slot_self_heals_on_write() {
        let (_dir, path) = temp_slot();
        std::fs::write(&path, "not-json").unwrap();
        let store = CartStore::open(&path);

        store.toggle(ProductId::new(3)).unwrap();

        let slot: Vec<u64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(slot, vec![3]);
    }

    #[test]
    fn test_slot_survives_reopen() {
        let (_dir, path) = temp_slot();
        {
            let store = CartStore::open(&path);
            store.toggle(ProductId::new(2)).unwrap();
            store.toggle(ProductId::new(1)).unwrap();
        }

        let store = CartStore::open(&path);
        assert!(store.is_in_cart(ProductId::new(1)));
        assert!(store.is_in_cart(ProductId::new(2)));
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_concurrent_toggles_serialize() {
        let (_dir, path) = temp_slot();
        let store = CartStore::open(&path);

        let handles: Vec<_> = (1..=8u64)
            .map(|id| {
                let store = store.clone();
                std::thread::spawn(move || store.toggle(ProductId::new(id)).unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        assert_eq!(store.count(), 8);
        let slot: Vec<u64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(slot, (1..=8).collect::<Vec<u64>>());
    }

    #[test]
    fn test_racing_toggles_never_duplicate() {
        let (_dir, path) = temp_slot();
        let store = CartStore::open(&path);
        let id = ProductId::new(11);

        // Two rapid toggles of the same id with no read-back in between.
        // A list-append implementation would end up with two copies here.
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.toggle(id).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let slot: Vec<u64> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(slot.len() <= 1);
        assert_eq!(store.count(), slot.len());
    }

    #[test]
    fn test_toggle_broadcasts_change() {
        let (_dir, path) = temp_slot();
        let store = CartStore::open(&path);
        let mut rx = store.subscribe();

        store.toggle(ProductId::new(4)).unwrap();
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_ids_snapshot() {
        let (_dir, path) = temp_slot();
        let store = CartStore::open(&path);
        store.toggle(ProductId::new(2)).unwrap();
        store.toggle(ProductId::new(1)).unwrap();

        let ids = store.ids();
        assert!(ids.contains(&ProductId::new(1)));
        assert!(ids.contains(&ProductId::new(2)));
        assert_eq!(ids.len(), 2);
    }
}
