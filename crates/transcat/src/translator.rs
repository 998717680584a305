//! The runtime translation entry point.
//!
//! # Invariants
//!
//! 1. **Always renderable**: `translate` returns a string for every input.
//!    A miss, an empty translation, or a missing plural rule all degrade to
//!    text the UI can show, never to an error.
//! 2. **Identity fallback**: when nothing matches, the source text is the
//!    template, so untranslated UI shows the original language.
//! 3. **Snapshot consistency**: one call resolves against one
//!    [`CatalogSet`](crate::CatalogSet) snapshot, even if a locale switch
//!    lands mid-call.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Lookup miss | Key absent from every store | Source text used |
//! | Empty translation | No text, or the chosen plural form is empty | Next store, then source text |
//! | No plural selector | Plural entry, no rule injected | First variant, warned once |
//! | Missing argument | `%3` with two args | [`MissingArgPolicy`](crate::MissingArgPolicy) |

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::config::TranslatorConfig;
use crate::entry::CatalogEntry;
use crate::format::substitute;
use crate::handle::CatalogHandle;
use crate::plural::PluralSelector;

/// Resolves and formats UI strings against a swappable catalog set.
///
/// Cheap to clone; clones share the catalog handle and plural selector.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use transcat::{CatalogEntry, CatalogHandle, CatalogSet, CatalogStore, PluralRule, Translator};
///
/// let store = CatalogStore::build(vec![
///     CatalogEntry::new("DAboutDialog", "%1 is released under %2", "%2 is de licentie van %1"),
///     CatalogEntry::new("Files", "%n file(s)", "").with_plural_forms(["%n bestand", "%n bestanden"]),
/// ])
/// .unwrap()
/// .store;
/// let handle = CatalogHandle::new(CatalogSet::from_stores(vec![Arc::new(store)]));
/// let tr = Translator::new(handle).with_plural_selector(PluralRule::OneOther);
///
/// assert_eq!(
///     tr.translate("DAboutDialog", "%1 is released under %2", "", None, &["DTK", "LGPL"]),
///     "LGPL is de licentie van DTK"
/// );
/// assert_eq!(tr.translate::<&str>("Files", "%n file(s)", "", Some(3), &[]), "3 bestanden");
/// assert_eq!(tr.tr("Dialog", "Hello"), "Hello");
/// ```
#[derive(Clone)]
pub struct Translator {
    catalogs: CatalogHandle,
    plural: Option<Arc<dyn PluralSelector>>,
    config: TranslatorConfig,
    plural_warned: Arc<AtomicBool>,
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("catalogs", &self.catalogs)
            .field("has_plural_selector", &self.plural.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl Translator {
    /// Translator over `catalogs` with default configuration and no plural
    /// selector.
    #[must_use]
    pub fn new(catalogs: CatalogHandle) -> Self {
        Self {
            catalogs,
            plural: None,
            config: TranslatorConfig::default(),
            plural_warned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Inject the locale's plural rule.
    #[must_use]
    pub fn with_plural_selector(mut self, selector: impl PluralSelector + 'static) -> Self {
        self.plural = Some(Arc::new(selector));
        self
    }

    /// Inject a shared plural rule.
    #[must_use]
    pub fn with_shared_plural_selector(mut self, selector: Arc<dyn PluralSelector>) -> Self {
        self.plural = Some(selector);
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: TranslatorConfig) -> Self {
        self.config = config;
        self
    }

    /// The catalog handle; swap sets through it to change locale.
    #[must_use]
    pub fn catalogs(&self) -> &CatalogHandle {
        &self.catalogs
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Resolve and format one string.
    ///
    /// `disambiguation` is `""` for the default use of a string.
    /// `plural_count` selects among plural variants and feeds `%n`.
    /// `args` fill `%1`..`%9` by index.
    #[must_use]
    pub fn translate<A: AsRef<str>>(
        &self,
        context: &str,
        source_text: &str,
        disambiguation: &str,
        plural_count: Option<i64>,
        args: &[A],
    ) -> String {
        self.catalogs.with_current(|set| {
            // An entry whose chosen text is empty is a miss for its layer.
            let accept = |entry: &CatalogEntry| {
                (self.config.use_unfinished || entry.is_finished())
                    && !self.template(entry, plural_count).is_empty()
            };
            let template = set
                .resolve_where(context, source_text, disambiguation, accept)
                .map_or(source_text, |entry| self.template(entry, plural_count));
            let count = plural_count.filter(|_| self.config.substitute_count);
            substitute(template, args, count, self.config.missing_args)
        })
    }

    /// Translate a plain string with no comment, count, or arguments.
    #[must_use]
    pub fn tr(&self, context: &str, source_text: &str) -> String {
        self.translate::<&str>(context, source_text, "", None, &[])
    }

    /// Translate a counted string; `%n` receives the count.
    #[must_use]
    pub fn trn(&self, context: &str, source_text: &str, count: i64) -> String {
        self.translate::<&str>(context, source_text, "", Some(count), &[])
    }

    /// Finished fraction of `context` in the active set, in `[0.0, 1.0]`.
    #[must_use]
    pub fn is_complete(&self, context: &str) -> f32 {
        self.catalogs.with_current(|set| set.completeness(context))
    }

    fn template<'e>(&self, entry: &'e CatalogEntry, plural_count: Option<i64>) -> &'e str {
        let (Some(count), Some(forms)) = (plural_count, entry.plural_forms.as_deref()) else {
            return &entry.translation;
        };
        if forms.is_empty() {
            return &entry.translation;
        }
        let index = match &self.plural {
            Some(selector) => selector.form_index(count, forms.len()).min(forms.len() - 1),
            None => {
                if !self.plural_warned.swap(true, Ordering::Relaxed) {
                    warn!(
                        context = entry.context.as_str(),
                        source = entry.source_text.as_str(),
                        "no plural rule configured, using first plural form"
                    );
                }
                0
            }
        };
        &forms[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryStatus;
    use crate::format::MissingArgPolicy;
    use crate::plural::PluralRule;
    use crate::set::CatalogSet;
    use crate::store::CatalogStore;

    const NO_ARGS: &[&str] = &[];

    fn store(entries: Vec<CatalogEntry>) -> Arc<CatalogStore> {
        Arc::new(CatalogStore::build(entries).unwrap().store)
    }

    fn translator() -> Translator {
        let nl = store(vec![
            CatalogEntry::new("DAboutDialog", "Version: %1", "Versie: %1"),
            CatalogEntry::new("DAboutDialog", "%1 is released under %2", "%1 is uitgebracht onder de %2"),
            CatalogEntry::new("DInputDialog", "Cancel", "Annuleren"),
            CatalogEntry::new("Preview", "Cancel", "Afbreken").with_disambiguation("button"),
            CatalogEntry::new("Preview", "*.pdf", "").with_status(EntryStatus::Unfinished),
            CatalogEntry::new("Preview", "Draft", "Concept").with_status(EntryStatus::Unfinished),
            CatalogEntry::new("Preview", "Legacy", "Oud").with_status(EntryStatus::Obsolete),
            CatalogEntry::new("Files", "file", "").with_plural_forms(["1 file", "%1 files"]),
            CatalogEntry::new("Files", "%n page(s)", "").with_plural_forms(["%n pagina", ""]),
        ]);
        let handle = CatalogHandle::new(CatalogSet::from_stores(vec![nl]).with_locale("nl"));
        Translator::new(handle).with_plural_selector(PluralRule::OneOther)
    }

    #[test]
    fn simple_translation() {
        let tr = translator();
        assert_eq!(tr.tr("DInputDialog", "Cancel"), "Annuleren");
    }

    #[test]
    fn disambiguation_selects_entry() {
        let tr = translator();
        assert_eq!(tr.translate("Preview", "Cancel", "button", None, NO_ARGS), "Afbreken");
        // Default use of the same word in that context is untranslated.
        assert_eq!(tr.tr("Preview", "Cancel"), "Cancel");
    }

    #[test]
    fn miss_returns_source_verbatim() {
        let tr = translator();
        assert_eq!(tr.tr("Nowhere", "Hello"), "Hello");
        assert_eq!(
            tr.translate("Nowhere", "Hello %1", "", None, &["you"]),
            "Hello you"
        );
    }

    #[test]
    fn placeholders_by_index() {
        let tr = translator();
        assert_eq!(
            tr.translate("DAboutDialog", "Version: %1", "", None, &["5.6"]),
            "Versie: 5.6"
        );
        assert_eq!(
            tr.translate("Nowhere", "%2 is released under %1", "", None, &["MIT", "1.0"]),
            "1.0 is released under MIT"
        );
    }

    #[test]
    fn plural_selection() {
        let tr = translator();
        assert_eq!(tr.translate("Files", "file", "", Some(1), &["1"]), "1 file");
        assert_eq!(tr.translate("Files", "file", "", Some(5), &["5"]), "5 files");
    }

    #[test]
    fn plural_without_count_uses_translation() {
        let tr = translator();
        assert_eq!(tr.tr("Files", "file"), "1 file");
    }

    #[test]
    fn empty_plural_form_falls_back_to_source() {
        let tr = translator();
        assert_eq!(tr.trn("Files", "%n page(s)", 1), "1 pagina");
        assert_eq!(tr.trn("Files", "%n page(s)", 4), "4 page(s)");
    }

    #[test]
    fn empty_plural_form_continues_down_the_chain() {
        let regional = store(vec![
            CatalogEntry::new("Files", "%n page(s)", "").with_plural_forms(["%n bladzijde", ""]),
        ]);
        let language = store(vec![
            CatalogEntry::new("Files", "%n page(s)", "").with_plural_forms(["%n pagina", "%n pagina's"]),
        ]);
        let handle = CatalogHandle::new(CatalogSet::from_stores(vec![regional, language]));
        let tr = Translator::new(handle).with_plural_selector(PluralRule::OneOther);
        assert_eq!(tr.trn("Files", "%n page(s)", 1), "1 bladzijde");
        assert_eq!(tr.trn("Files", "%n page(s)", 4), "4 pagina's");
    }

    #[test]
    fn missing_plural_selector_uses_first_form() {
        let tr = Translator::new(translator().catalogs().clone());
        assert_eq!(tr.translate("Files", "file", "", Some(5), &["5"]), "1 file");
        assert_eq!(tr.translate("Files", "file", "", Some(7), &["7"]), "1 file");
    }

    #[test]
    fn synthetic_selector() {
        let tr = Translator::new(translator().catalogs().clone())
            .with_plural_selector(|_count: i64, forms: usize| forms - 1);
        assert_eq!(tr.translate("Files", "file", "", Some(1), &["1"]), "1 files");
    }

    #[test]
    fn out_of_range_selector_is_clamped() {
        let tr = Translator::new(translator().catalogs().clone())
            .with_plural_selector(|_count: i64, _forms: usize| 99);
        assert_eq!(tr.translate("Files", "file", "", Some(2), &["2"]), "2 files");
    }

    #[test]
    fn empty_unfinished_translation_is_a_miss() {
        let tr = translator();
        assert_eq!(tr.tr("Preview", "*.pdf"), "*.pdf");
    }

    #[test]
    fn unfinished_used_by_default() {
        let tr = translator();
        assert_eq!(tr.tr("Preview", "Draft"), "Concept");
    }

    #[test]
    fn unfinished_can_be_disabled() {
        let tr = translator().with_config(TranslatorConfig::default().with_use_unfinished(false));
        assert_eq!(tr.tr("Preview", "Draft"), "Draft");
    }

    #[test]
    fn obsolete_never_used() {
        let tr = translator();
        assert_eq!(tr.tr("Preview", "Legacy"), "Legacy");
    }

    #[test]
    fn missing_arg_policy() {
        let tr = translator();
        assert_eq!(tr.tr("DAboutDialog", "Version: %1"), "Versie: %1");
        let tr = tr.with_config(TranslatorConfig::default().with_missing_args(MissingArgPolicy::Empty));
        assert_eq!(tr.tr("DAboutDialog", "Version: %1"), "Versie: ");
    }

    #[test]
    fn count_substitution_can_be_disabled() {
        let tr = translator().with_config(TranslatorConfig::default().with_substitute_count(false));
        assert_eq!(tr.trn("Files", "%n page(s)", 1), "%n pagina");
    }

    #[test]
    fn locale_swap_is_visible() {
        let tr = translator();
        let fr = store(vec![CatalogEntry::new("DInputDialog", "Cancel", "Annuler")]);
        tr.catalogs().replace(CatalogSet::from_stores(vec![fr]));
        assert_eq!(tr.tr("DInputDialog", "Cancel"), "Annuler");
        assert_eq!(tr.tr("DAboutDialog", "Version: %1"), "Version: %1");
    }

    #[test]
    fn completeness_query() {
        let tr = translator();
        assert!((tr.is_complete("DAboutDialog") - 1.0).abs() < f32::EPSILON);
        assert!((tr.is_complete("Preview") - 1.0 / 3.0).abs() < 1e-6);
        assert!((tr.is_complete("Unknown") - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn translator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Translator>();
    }
}
