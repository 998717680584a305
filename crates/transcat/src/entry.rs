//! The translatable unit stored in a catalog.

use serde::{Deserialize, Serialize};

/// Translation state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Reviewed and authoritative.
    #[default]
    Finished,
    /// Present but not yet reviewed. Still returned by lookup.
    Unfinished,
    /// Kept for history only. Never returned by lookup.
    Obsolete,
}

impl EntryStatus {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Unfinished => "unfinished",
            Self::Obsolete => "obsolete",
        }
    }
}

/// Where in the application sources a message was extracted from.
///
/// Advisory only; the resolver never looks at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Origin file, as recorded by the extraction tool.
    pub file: String,
    /// 1-based line number, `0` when unknown.
    pub line: u32,
}

impl SourceLocation {
    /// Create a location.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// A single translatable message.
///
/// The lookup key is `(context, source_text, disambiguation)`. An absent
/// disambiguation is stored as the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Logical scope, usually a widget or dialog class name.
    pub context: String,
    /// Untranslated text as authored in the application.
    pub source_text: String,
    /// Comment separating otherwise identical `(context, source_text)` pairs.
    pub disambiguation: String,
    /// Translated template. Empty for untranslated plural entries.
    pub translation: String,
    /// Plural variants ordered by the locale's plural rule.
    pub plural_forms: Option<Vec<String>>,
    /// Translation state.
    pub status: EntryStatus,
    /// Extraction sites.
    pub source_locations: Vec<SourceLocation>,
    /// Free-form notes for translators (extracted or translator comments).
    pub notes: Vec<String>,
}

impl CatalogEntry {
    /// A finished, non-plural entry.
    pub fn new(
        context: impl Into<String>,
        source_text: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            source_text: source_text.into(),
            disambiguation: String::new(),
            translation: translation.into(),
            plural_forms: None,
            status: EntryStatus::Finished,
            source_locations: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Set the disambiguation comment.
    #[must_use]
    pub fn with_disambiguation(mut self, comment: impl Into<String>) -> Self {
        self.disambiguation = comment.into();
        self
    }

    /// Set the status.
    #[must_use]
    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach plural variants. The first variant also becomes the plain
    /// translation when none was given.
    #[must_use]
    pub fn with_plural_forms<I, S>(mut self, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let forms: Vec<String> = forms.into_iter().map(Into::into).collect();
        if self.translation.is_empty()
            && let Some(first) = forms.first()
        {
            self.translation = first.clone();
        }
        self.plural_forms = Some(forms);
        self
    }

    /// Append an extraction site.
    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.source_locations.push(SourceLocation::new(file, line));
        self
    }

    /// Whether lookup may ever return this entry.
    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.status == EntryStatus::Obsolete
    }

    /// Whether the entry is authoritative.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == EntryStatus::Finished
    }

    /// Whether the entry carries any usable translated text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.translation.is_empty()
            || self
                .plural_forms
                .as_ref()
                .is_some_and(|forms| forms.iter().any(|f| !f.is_empty()))
    }
}
