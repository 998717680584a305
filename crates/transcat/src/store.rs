//! Immutable per-catalog index.
//!
//! # Invariants
//!
//! 1. **One live entry per key**: within a store, `(context, source_text,
//!    disambiguation)` maps to at most one non-obsolete entry. Duplicates
//!    are resolved last-wins; every replaced entry is reported as a
//!    [`KeyCollision`] in the [`StoreBuild`].
//!
//! 2. **Obsolete entries are unreachable**: they live in a separate list that
//!    [`CatalogStore::lookup`] never consults.
//!
//! 3. **Immutable**: a store is never edited after [`CatalogStore::build`];
//!    reloading produces a new store. `CatalogStore` is `Send + Sync`.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Entry without source text or comment | Malformed resource | `I18nError::Parse` |
//! | Duplicate key | Authoring mistake | Last wins, collision recorded |
//! | Unfinished entry | Work in progress | Returned by lookup, lowers completeness |

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::entry::CatalogEntry;
use crate::error::{I18nError, Result};

/// Origin name used for stores built directly from entries.
pub const MEMORY_ORIGIN: &str = "<memory>";

/// A duplicate key found while building a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    /// Context of the duplicated key.
    pub context: String,
    /// Source text of the duplicated key.
    pub source_text: String,
    /// Disambiguation of the duplicated key.
    pub disambiguation: String,
    /// Translation that was discarded in favor of the later entry.
    pub discarded: String,
}

/// Result of building a store: the store plus load diagnostics.
#[derive(Debug)]
pub struct StoreBuild {
    /// The built store.
    pub store: CatalogStore,
    /// Duplicate keys, in input order. Each discarded entry appears once.
    pub collisions: Vec<KeyCollision>,
}

/// Entries of one context, keyed by source text.
///
/// Each source text holds its distinct disambiguations in a short vector;
/// real catalogs rarely carry more than two uses of one string per context.
#[derive(Debug, Clone, Default)]
struct ContextIndex {
    messages: HashMap<String, Vec<CatalogEntry>>,
    live: usize,
    finished: usize,
}

impl ContextIndex {
    fn get(&self, source_text: &str, disambiguation: &str) -> Option<&CatalogEntry> {
        self.messages
            .get(source_text)?
            .iter()
            .find(|e| e.disambiguation == disambiguation)
    }

    fn completeness(&self) -> f32 {
        if self.live == 0 {
            1.0
        } else {
            self.finished as f32 / self.live as f32
        }
    }
}

/// In-memory index of one loaded catalog.
///
/// # Example
///
/// ```
/// use transcat::{CatalogEntry, CatalogStore, EntryStatus};
///
/// let build = CatalogStore::build(vec![
///     CatalogEntry::new("DInputDialog", "Cancel", "Annuleren"),
///     CatalogEntry::new("Preview", "Cancel", "Annuleren").with_disambiguation("button"),
///     CatalogEntry::new("Preview", "*.pdf", "").with_status(EntryStatus::Unfinished),
/// ])
/// .unwrap();
///
/// let store = build.store;
/// assert_eq!(
///     store.lookup("Preview", "Cancel", "button").map(|e| e.translation.as_str()),
///     Some("Annuleren")
/// );
/// assert!(store.lookup("Preview", "Cancel", "").is_none());
/// assert!((store.context_completeness("Preview") - 0.5).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    origin: String,
    language: Option<String>,
    contexts: HashMap<String, ContextIndex>,
    obsolete: Vec<CatalogEntry>,
    live: usize,
    finished: usize,
}

impl CatalogStore {
    /// Build a store from raw entries.
    ///
    /// Fails when an entry has neither source text nor a disambiguation
    /// comment, since such an entry can never be looked up.
    pub fn build(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<StoreBuild> {
        Self::build_from(MEMORY_ORIGIN, None, entries)
    }

    /// Build a store, recording where it came from and its target language.
    pub fn build_from(
        origin: impl Into<String>,
        language: Option<String>,
        entries: impl IntoIterator<Item = CatalogEntry>,
    ) -> Result<StoreBuild> {
        let mut store = Self {
            origin: origin.into(),
            language,
            ..Self::default()
        };
        let mut collisions = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            if entry.source_text.is_empty() && entry.disambiguation.is_empty() {
                return Err(I18nError::parse(
                    store.origin.clone(),
                    format!(
                        "entry {} in context '{}' has no source text",
                        index + 1,
                        entry.context
                    ),
                ));
            }
            if entry.is_obsolete() {
                store.obsolete.push(entry);
                continue;
            }
            if let Some(collision) = store.insert_live(entry) {
                warn!(
                    origin = store.origin.as_str(),
                    context = collision.context.as_str(),
                    source = collision.source_text.as_str(),
                    disambiguation = collision.disambiguation.as_str(),
                    "duplicate catalog key, keeping the later entry"
                );
                collisions.push(collision);
            }
        }

        debug!(
            origin = store.origin.as_str(),
            contexts = store.contexts.len(),
            live = store.live,
            obsolete = store.obsolete.len(),
            completeness = store.completeness(),
            "catalog store built"
        );

        Ok(StoreBuild { store, collisions })
    }

    fn insert_live(&mut self, entry: CatalogEntry) -> Option<KeyCollision> {
        let finished = entry.is_finished();
        let index = self.contexts.entry(entry.context.clone()).or_default();
        let slot = index.messages.entry(entry.source_text.clone()).or_default();

        if let Some(existing) = slot
            .iter_mut()
            .find(|e| e.disambiguation == entry.disambiguation)
        {
            let was_finished = existing.is_finished();
            let old = std::mem::replace(existing, entry);
            match (was_finished, finished) {
                (true, false) => {
                    index.finished -= 1;
                    self.finished -= 1;
                }
                (false, true) => {
                    index.finished += 1;
                    self.finished += 1;
                }
                _ => {}
            }
            return Some(KeyCollision {
                context: old.context,
                source_text: old.source_text,
                disambiguation: old.disambiguation,
                discarded: old.translation,
            });
        }

        slot.push(entry);
        index.live += 1;
        self.live += 1;
        if finished {
            index.finished += 1;
            self.finished += 1;
        }
        None
    }

    /// Find the live entry for a key. Never returns obsolete entries.
    #[must_use]
    pub fn lookup(
        &self,
        context: &str,
        source_text: &str,
        disambiguation: &str,
    ) -> Option<&CatalogEntry> {
        self.contexts
            .get(context)?
            .get(source_text, disambiguation)
    }

    /// Resource this store was built from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Target language declared by the resource, if any.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Whether the store knows the context at all.
    #[must_use]
    pub fn has_context(&self, context: &str) -> bool {
        self.contexts.contains_key(context)
    }

    /// Context names, sorted for deterministic output.
    #[must_use]
    pub fn contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of live (non-obsolete) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the store has no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over all live entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.contexts
            .values()
            .flat_map(|index| index.messages.values().flatten())
    }

    /// Obsolete entries, in load order.
    #[must_use]
    pub fn obsolete_entries(&self) -> &[CatalogEntry] {
        &self.obsolete
    }

    /// Fraction of live entries that are finished, in `[0.0, 1.0]`.
    ///
    /// An empty store is complete.
    #[must_use]
    pub fn completeness(&self) -> f32 {
        if self.live == 0 {
            1.0
        } else {
            self.finished as f32 / self.live as f32
        }
    }

    /// Completeness restricted to one context.
    ///
    /// An unknown context reports `1.0`; nothing in it is unfinished.
    #[must_use]
    pub fn context_completeness(&self, context: &str) -> f32 {
        self.contexts
            .get(context)
            .map_or(1.0, ContextIndex::completeness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryStatus;

    fn preview_entries() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new("DInputDialog", "Cancel", "Annuleren"),
            CatalogEntry::new("DInputDialog", "Confirm", "Ok??"),
            CatalogEntry::new("Preview", "Cancel", "Annuleren").with_disambiguation("button"),
            CatalogEntry::new("Preview", "Print", "Afdrukken").with_disambiguation("button"),
            CatalogEntry::new("Preview", "Print", "Afdrukken (menu)"),
            CatalogEntry::new("Preview", "*.pdf", "").with_status(EntryStatus::Unfinished),
            CatalogEntry::new("Preview", "Old label", "Oud").with_status(EntryStatus::Obsolete),
        ]
    }

    #[test]
    fn groups_by_context() {
        let store = CatalogStore::build(preview_entries()).unwrap().store;
        assert_eq!(store.contexts(), vec!["DInputDialog", "Preview"]);
        assert_eq!(store.len(), 6);
        assert!(store.has_context("Preview"));
        assert!(!store.has_context("TitleBarMenu"));
    }

    #[test]
    fn disambiguation_is_part_of_key() {
        let store = CatalogStore::build(preview_entries()).unwrap().store;
        let plain = store.lookup("Preview", "Print", "").unwrap();
        let button = store.lookup("Preview", "Print", "button").unwrap();
        assert_eq!(plain.translation, "Afdrukken (menu)");
        assert_eq!(button.translation, "Afdrukken");
        // Empty comment is its own key.
        assert!(store.lookup("Preview", "Cancel", "").is_none());
        assert!(store.lookup("Preview", "Cancel", "menu").is_none());
    }

    #[test]
    fn context_scopes_lookup() {
        let store = CatalogStore::build(preview_entries()).unwrap().store;
        assert!(store.lookup("DInputDialog", "Cancel", "").is_some());
        assert!(store.lookup("DInputDialog", "Print", "button").is_none());
    }

    #[test]
    fn obsolete_is_listed_but_not_returned() {
        let store = CatalogStore::build(preview_entries()).unwrap().store;
        assert!(store.lookup("Preview", "Old label", "").is_none());
        assert_eq!(store.obsolete_entries().len(), 1);
        assert_eq!(store.obsolete_entries()[0].translation, "Oud");
        assert!(store.entries().all(|e| !e.is_obsolete()));
    }

    #[test]
    fn unfinished_is_returned_and_counted() {
        let store = CatalogStore::build(preview_entries()).unwrap().store;
        let e = store.lookup("Preview", "*.pdf", "").unwrap();
        assert_eq!(e.status, EntryStatus::Unfinished);
        assert!((store.completeness() - 5.0 / 6.0).abs() < 1e-6);
        assert!((store.context_completeness("Preview") - 0.75).abs() < 1e-6);
        assert!((store.context_completeness("DInputDialog") - 1.0).abs() < f32::EPSILON);
        assert!((store.context_completeness("Missing") - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn duplicates_last_wins_with_diagnostic() {
        let build = CatalogStore::build(vec![
            CatalogEntry::new("Ctx", "Save", "Bewaar"),
            CatalogEntry::new("Ctx", "Save", "Opslaan").with_status(EntryStatus::Unfinished),
            CatalogEntry::new("Ctx", "Save", "Opslaan!"),
        ])
        .unwrap();
        assert_eq!(build.collisions.len(), 2);
        assert_eq!(build.collisions[0].discarded, "Bewaar");
        assert_eq!(build.collisions[1].discarded, "Opslaan");

        let store = build.store;
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup("Ctx", "Save", "").unwrap().translation, "Opslaan!");
        assert!((store.completeness() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn duplicate_replaced_by_unfinished_lowers_completeness() {
        let store = CatalogStore::build(vec![
            CatalogEntry::new("Ctx", "Save", "Opslaan"),
            CatalogEntry::new("Ctx", "Save", "").with_status(EntryStatus::Unfinished),
        ])
        .unwrap()
        .store;
        assert_eq!(store.len(), 1);
        assert!(store.completeness().abs() < f32::EPSILON);
    }

    #[test]
    fn obsolete_duplicate_is_not_a_collision() {
        let build = CatalogStore::build(vec![
            CatalogEntry::new("Ctx", "Save", "Opslaan"),
            CatalogEntry::new("Ctx", "Save", "Bewaren").with_status(EntryStatus::Obsolete),
        ])
        .unwrap();
        assert!(build.collisions.is_empty());
        assert_eq!(
            build.store.lookup("Ctx", "Save", "").unwrap().translation,
            "Opslaan"
        );
    }

    #[test]
    fn missing_source_text_is_parse_error() {
        let err = CatalogStore::build(vec![CatalogEntry::new("Ctx", "", "Iets")]).unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("context 'Ctx'"));
    }

    #[test]
    fn comment_only_entry_is_accepted() {
        let store = CatalogStore::build(vec![
            CatalogEntry::new("Ctx", "", "Iets").with_disambiguation("id:something"),
        ])
        .unwrap()
        .store;
        assert!(store.lookup("Ctx", "", "id:something").is_some());
    }

    #[test]
    fn empty_store_is_complete() {
        let store = CatalogStore::build(Vec::new()).unwrap().store;
        assert!(store.is_empty());
        assert!((store.completeness() - 1.0).abs() < f32::EPSILON);
        assert_eq!(store.origin(), MEMORY_ORIGIN);
        assert!(store.language().is_none());
    }

    #[test]
    fn build_from_records_metadata() {
        let store = CatalogStore::build_from("widgets_nl", Some("nl".into()), preview_entries())
            .unwrap()
            .store;
        assert_eq!(store.origin(), "widgets_nl");
        assert_eq!(store.language(), Some("nl"));
    }

    #[test]
    fn store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CatalogStore>();
    }
}
