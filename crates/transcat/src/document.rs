//! JSON catalog documents.
//!
//! A lightweight alternative to `.ts` files for catalogs that are generated
//! or embedded by build tooling:
//!
//! ```json
//! {
//!   "language": "nl",
//!   "contexts": [
//!     {
//!       "name": "DAboutDialog",
//!       "messages": [
//!         { "source": "Version: %1", "translation": "Versie: %1" },
//!         { "source": "Save", "comment": "button", "translation": "Opslaan" },
//!         { "source": "*.pdf", "status": "unfinished" },
//!         { "source": "%n file(s)", "plural_forms": ["%n bestand", "%n bestanden"] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::entry::{CatalogEntry, EntryStatus, SourceLocation};
use crate::error::Result;

/// A whole JSON catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Target language tag.
    #[serde(default)]
    pub language: Option<String>,
    /// Contexts in authoring order.
    #[serde(default)]
    pub contexts: Vec<DocumentContext>,
}

/// One context block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentContext {
    /// Context name.
    pub name: String,
    /// Messages in authoring order.
    #[serde(default)]
    pub messages: Vec<DocumentMessage>,
}

/// One message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMessage {
    /// Untranslated text.
    pub source: String,
    /// Disambiguation comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Translated text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    /// Plural variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural_forms: Option<Vec<String>>,
    /// Translation state; defaults to finished.
    #[serde(default)]
    pub status: EntryStatus,
    /// Extraction sites.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,
}

impl CatalogDocument {
    /// Parse a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Flatten into catalog entries, context by context.
    #[must_use]
    pub fn into_entries(self) -> Vec<CatalogEntry> {
        self.contexts
            .into_iter()
            .flat_map(|ctx| {
                let name = ctx.name;
                ctx.messages.into_iter().map(move |msg| CatalogEntry {
                    context: name.clone(),
                    source_text: msg.source,
                    disambiguation: msg.comment.unwrap_or_default(),
                    translation: msg
                        .translation
                        .or_else(|| msg.plural_forms.as_ref().and_then(|f| f.first().cloned()))
                        .unwrap_or_default(),
                    plural_forms: msg.plural_forms,
                    status: msg.status,
                    source_locations: msg.locations,
                    notes: Vec::new(),
                })
            })
            .collect()
    }

    /// Group entries back into a document. Contexts keep first-seen order.
    #[must_use]
    pub fn from_entries<'a>(
        language: Option<String>,
        entries: impl IntoIterator<Item = &'a CatalogEntry>,
    ) -> Self {
        let mut contexts: Vec<DocumentContext> = Vec::new();
        for entry in entries {
            let message = DocumentMessage {
                source: entry.source_text.clone(),
                comment: (!entry.disambiguation.is_empty()).then(|| entry.disambiguation.clone()),
                translation: (!entry.translation.is_empty()).then(|| entry.translation.clone()),
                plural_forms: entry.plural_forms.clone(),
                status: entry.status,
                locations: entry.source_locations.clone(),
            };
            match contexts.iter_mut().find(|c| c.name == entry.context) {
                Some(ctx) => ctx.messages.push(message),
                None => contexts.push(DocumentContext {
                    name: entry.context.clone(),
                    messages: vec![message],
                }),
            }
        }
        Self { language, contexts }
    }
}
