//! Swappable handle to the active catalog set.
//!
//! Readers load an `Arc<CatalogSet>` snapshot and resolve against it without
//! locking. Locale changes build a complete replacement set off the hot path
//! and publish it with one atomic pointer swap, so a reader sees either the
//! old set or the new one, never a mixture.
//!
//! Reloads are generation-guarded: each request takes a ticket, and only the
//! newest ticket may publish. A slow load that finishes after a newer request
//! is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::error::Result;
use crate::loader::{CatalogLoader, LoadReport};
use crate::set::CatalogSet;

/// Permission to publish the result of one reload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket {
    generation: u64,
}

impl ReloadTicket {
    /// Request number, increasing per handle.
    #[must_use]
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// What happened to a finished reload.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// The new set is now active.
    Published(LoadReport),
    /// A newer request was made while this one loaded; the result was dropped.
    Superseded(LoadReport),
}

impl ReloadOutcome {
    /// Load diagnostics, regardless of whether the set was published.
    #[must_use]
    pub fn report(&self) -> &LoadReport {
        match self {
            Self::Published(report) | Self::Superseded(report) => report,
        }
    }

    /// Whether the set became active.
    #[must_use]
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published(_))
    }
}

#[derive(Debug)]
struct HandleInner {
    current: ArcSwap<CatalogSet>,
    requested: AtomicU64,
    // Serializes the generation check with the swap; readers never take it.
    publish: Mutex<()>,
}

/// Shared, swappable reference to the active [`CatalogSet`].
///
/// Clones share the same underlying slot. Independent handles (one per test,
/// one per window) never observe each other's swaps.
#[derive(Debug, Clone)]
pub struct CatalogHandle {
    inner: Arc<HandleInner>,
}

impl Default for CatalogHandle {
    fn default() -> Self {
        Self::new(CatalogSet::new())
    }
}

impl CatalogHandle {
    /// Create a handle serving `set`.
    #[must_use]
    pub fn new(set: CatalogSet) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                current: ArcSwap::from_pointee(set),
                requested: AtomicU64::new(0),
                publish: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the active set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSet> {
        self.inner.current.load_full()
    }

    /// Run `f` against the active set without cloning the `Arc`.
    pub fn with_current<R>(&self, f: impl FnOnce(&CatalogSet) -> R) -> R {
        let guard = self.inner.current.load();
        f(&guard)
    }

    /// Replace the active set unconditionally, returning the previous one.
    ///
    /// Also invalidates any reload still in flight.
    pub fn replace(&self, set: CatalogSet) -> Arc<CatalogSet> {
        let _lock = self
            .inner
            .publish
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generation = self.inner.requested.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(generation, stores = set.len(), "catalog set replaced");
        self.inner.current.swap(Arc::new(set))
    }

    /// Start a reload request. Any earlier ticket becomes stale.
    #[must_use]
    pub fn begin_reload(&self) -> ReloadTicket {
        let generation = self.inner.requested.fetch_add(1, Ordering::AcqRel) + 1;
        ReloadTicket { generation }
    }

    /// Whether `ticket` is still the newest request.
    #[must_use]
    pub fn is_current(&self, ticket: ReloadTicket) -> bool {
        self.inner.requested.load(Ordering::Acquire) == ticket.generation
    }

    /// Publish `set` if `ticket` is still the newest request.
    ///
    /// Returns `false` and drops the set when it was superseded.
    pub fn publish(&self, ticket: ReloadTicket, set: CatalogSet) -> bool {
        let _lock = self
            .inner
            .publish
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(ticket) {
            debug!(
                generation = ticket.generation,
                "catalog reload superseded, discarding"
            );
            return false;
        }
        info!(
            generation = ticket.generation,
            locale = set.locale().unwrap_or(""),
            stores = set.len(),
            "catalog set published"
        );
        self.inner.current.store(Arc::new(set));
        true
    }

    /// Load catalogs for `locale` on the calling thread and publish them.
    ///
    /// The old set stays active until the new one is complete.
    pub fn reload(&self, loader: &CatalogLoader, locale: &str) -> Result<ReloadOutcome> {
        let ticket = self.begin_reload();
        let outcome = loader.load(locale)?;
        Ok(self.finish(ticket, outcome.set, outcome.report))
    }

    /// Load catalogs for `locale` on a background thread.
    ///
    /// The returned handle yields the outcome; dropping it detaches the
    /// thread without affecting publication.
    pub fn spawn_reload(
        &self,
        loader: Arc<CatalogLoader>,
        locale: impl Into<String>,
    ) -> JoinHandle<Result<ReloadOutcome>> {
        let handle = self.clone();
        let locale = locale.into();
        let ticket = self.begin_reload();
        thread::spawn(move || -> Result<ReloadOutcome> {
            let outcome = loader.load(&locale)?;
            Ok(handle.finish(ticket, outcome.set, outcome.report))
        })
    }

    fn finish(&self, ticket: ReloadTicket, set: CatalogSet, report: LoadReport) -> ReloadOutcome {
        if self.publish(ticket, set) {
            ReloadOutcome::Published(report)
        } else {
            ReloadOutcome::Superseded(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::CatalogEntry;
    use crate::store::CatalogStore;

    fn set_with(translation: &str) -> CatalogSet {
        let store = CatalogStore::build(vec![CatalogEntry::new("Ctx", "Hello", translation)])
            .unwrap()
            .store;
        CatalogSet::from_stores(vec![Arc::new(store)])
    }

    fn current_translation(handle: &CatalogHandle) -> Option<String> {
        handle.with_current(|set| {
            set.resolve("Ctx", "Hello", "")
                .map(|e| e.translation.clone())
        })
    }

    #[test]
    fn default_is_empty() {
        let handle = CatalogHandle::default();
        assert!(handle.snapshot().is_empty());
        assert_eq!(current_translation(&handle), None);
    }

    #[test]
    fn replace_swaps_and_returns_old() {
        let handle = CatalogHandle::new(set_with("Hallo"));
        let old = handle.replace(set_with("Bonjour"));
        assert_eq!(old.resolve("Ctx", "Hello", "").unwrap().translation, "Hallo");
        assert_eq!(current_translation(&handle).as_deref(), Some("Bonjour"));
    }

    #[test]
    fn snapshot_survives_swap() {
        let handle = CatalogHandle::new(set_with("Hallo"));
        let pinned = handle.snapshot();
        handle.replace(set_with("Hola"));
        assert_eq!(
            pinned.resolve("Ctx", "Hello", "").unwrap().translation,
            "Hallo"
        );
    }

    #[test]
    fn stale_ticket_cannot_publish() {
        let handle = CatalogHandle::default();
        let first = handle.begin_reload();
        let second = handle.begin_reload();
        assert!(!handle.is_current(first));
        assert!(handle.publish(second, set_with("Nieuw")));
        assert!(!handle.publish(first, set_with("Oud")));
        assert_eq!(current_translation(&handle).as_deref(), Some("Nieuw"));
        assert!(second.generation() > first.generation());
    }

    #[test]
    fn replace_invalidates_in_flight_reload() {
        let handle = CatalogHandle::default();
        let ticket = handle.begin_reload();
        handle.replace(set_with("Direct"));
        assert!(!handle.publish(ticket, set_with("Late")));
        assert_eq!(current_translation(&handle).as_deref(), Some("Direct"));
    }

    #[test]
    fn clones_share_slot() {
        let a = CatalogHandle::default();
        let b = a.clone();
        a.replace(set_with("Gedeeld"));
        assert_eq!(current_translation(&b).as_deref(), Some("Gedeeld"));

        let independent = CatalogHandle::default();
        assert_eq!(current_translation(&independent), None);
    }
}
