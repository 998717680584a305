#![forbid(unsafe_code)]

//! Translation catalog runtime.
//!
//! Loads translation catalogs, resolves `(context, source text,
//! disambiguation)` keys through a layered locale fallback chain, selects
//! plural variants through an injected rule, and substitutes positional
//! placeholders.
//!
//! # How the pieces fit
//!
//! ```text
//! LocaleResolver ──ids──▶ CatalogSource ──text──▶ CatalogStore (one per id)
//!                                                   │
//!                      CatalogHandle ◀──swap── CatalogSet (most specific first)
//!                           │
//!                      Translator::translate ──▶ String
//! ```
//!
//! Lookups are lock-free reads of an immutable snapshot. Changing locale
//! builds a new [`CatalogSet`] off the hot path and publishes it atomically
//! through the [`CatalogHandle`].

pub mod config;
pub mod document;
pub mod entry;
pub mod error;
pub mod format;
pub mod handle;
pub mod loader;
pub mod plural;
pub mod set;
pub mod store;
pub mod translator;
pub mod ts;

pub use config::TranslatorConfig;
pub use document::CatalogDocument;
pub use entry::{CatalogEntry, EntryStatus, SourceLocation};
pub use error::{I18nError, Result};
pub use format::MissingArgPolicy;
pub use handle::{CatalogHandle, ReloadOutcome, ReloadTicket};
pub use loader::{
    CatalogFormat, CatalogId, CatalogLoader, CatalogSource, DirectorySource, LoadFailure,
    LoadOutcome, LoadReport, LocaleResolver, MemorySource, PrefixResolver,
};
pub use plural::{PluralCategory, PluralRule, PluralSelector};
pub use set::CatalogSet;
pub use store::{CatalogStore, KeyCollision, StoreBuild};
pub use translator::Translator;
pub use ts::{TsDocument, parse_ts};
