//! Layered locale fallback over several stores.
//!
//! # Invariants
//!
//! 1. **Specificity wins**: stores are consulted most specific first and the
//!    first live match is returned outright. A later, more complete store
//!    never overrides an earlier hit.
//! 2. **Fallback terminates**: every lookup walks the chain at most once.
//! 3. **No obsolete hits**: obsolete entries are invisible to resolution.

use std::sync::Arc;

use crate::entry::CatalogEntry;
use crate::store::CatalogStore;

/// Ordered stores for one active locale, most specific first.
///
/// Stores are shared; cloning a set or building several sets over the same
/// stores costs only reference-count bumps.
#[derive(Debug, Clone, Default)]
pub struct CatalogSet {
    locale: Option<String>,
    stores: Vec<Arc<CatalogStore>>,
}

impl CatalogSet {
    /// An empty set. Every lookup misses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from stores ordered most specific first.
    #[must_use]
    pub fn from_stores(stores: Vec<Arc<CatalogStore>>) -> Self {
        Self {
            locale: None,
            stores,
        }
    }

    /// Tag the set with the locale it serves.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Append a less specific store.
    pub fn push(&mut self, store: Arc<CatalogStore>) {
        self.stores.push(store);
    }

    /// Locale this set was built for, if recorded.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Stores in resolution order.
    #[must_use]
    pub fn stores(&self) -> &[Arc<CatalogStore>] {
        &self.stores
    }

    /// Number of stores in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Whether the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Resolve a key to the most specific live entry.
    #[must_use]
    pub fn resolve(
        &self,
        context: &str,
        source_text: &str,
        disambiguation: &str,
    ) -> Option<&CatalogEntry> {
        self.resolve_where(context, source_text, disambiguation, |_| true)
    }

    /// Resolve, skipping entries rejected by `accept`.
    ///
    /// A rejected entry does not stop the walk; the next store is tried.
    pub fn resolve_where<F>(
        &self,
        context: &str,
        source_text: &str,
        disambiguation: &str,
        accept: F,
    ) -> Option<&CatalogEntry>
    where
        F: Fn(&CatalogEntry) -> bool,
    {
        self.stores
            .iter()
            .filter_map(|store| store.lookup(context, source_text, disambiguation))
            .find(|entry| accept(entry))
    }

    /// Finished fraction of `context` in the most specific store that has it.
    ///
    /// Reports `1.0` when no store knows the context.
    #[must_use]
    pub fn completeness(&self, context: &str) -> f32 {
        self.stores
            .iter()
            .find(|store| store.has_context(context))
            .map_or(1.0, |store| store.context_completeness(context))
    }
}
