//! Turning a locale into a [`CatalogSet`].
//!
//! A [`LocaleResolver`] decides which catalogs a locale needs, most specific
//! first. A [`CatalogSource`] fetches each one. The [`CatalogLoader`] parses
//! and indexes them, and any catalog that fails to load is left out of the
//! set. A broken catalog degrades translation to the next fallback; it never
//! stops the load.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Catalog file missing | Layer not shipped | Omitted, logged at debug |
//! | Catalog malformed | Authoring/tooling bug | Omitted, logged at warn |
//! | Locale tag malformed | Caller bug | `I18nError::InvalidLocale` |

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::document::CatalogDocument;
use crate::error::{I18nError, Result};
use crate::set::CatalogSet;
use crate::store::{CatalogStore, KeyCollision, StoreBuild};
use crate::ts::parse_ts;

/// Name of one loadable catalog, e.g. `widgets_nl_BE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogId(String);

impl CatalogId {
    /// Wrap a catalog name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The catalog name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CatalogId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Decides which catalogs serve a locale.
pub trait LocaleResolver: Send + Sync {
    /// Catalog ids for `locale`, most specific first.
    fn catalogs_for_locale(&self, locale: &str) -> Result<Vec<CatalogId>>;
}

impl<F> LocaleResolver for F
where
    F: Fn(&str) -> Result<Vec<CatalogId>> + Send + Sync,
{
    fn catalogs_for_locale(&self, locale: &str) -> Result<Vec<CatalogId>> {
        self(locale)
    }
}

/// Split a locale tag into normalized subtags.
///
/// Accepts `-` or `_` separators and POSIX suffixes (`nl_BE.UTF-8@euro`).
/// The language is lowercased, a 4-letter script is title-cased and a region
/// is uppercased. `C` and `POSIX` yield no subtags.
pub fn locale_subtags(locale: &str) -> Result<Vec<String>> {
    let trimmed = locale.trim();
    let base = trimmed
        .split(['.', '@'])
        .next()
        .unwrap_or_default();
    if base.is_empty() || base == "C" || base == "POSIX" {
        return Ok(Vec::new());
    }

    let invalid = || I18nError::InvalidLocale(locale.to_owned());
    let mut subtags = Vec::new();
    for (i, part) in base.split(['-', '_']).enumerate() {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid());
        }
        let normalized = if i == 0 {
            if !(2..=3).contains(&part.len()) || !part.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(invalid());
            }
            part.to_ascii_lowercase()
        } else if part.len() == 4 && part.chars().all(|c| c.is_ascii_alphabetic()) {
            let mut chars = part.chars();
            chars
                .next()
                .map(|first| first.to_ascii_uppercase())
                .into_iter()
                .chain(chars.map(|c| c.to_ascii_lowercase()))
                .collect()
        } else {
            part.to_ascii_uppercase()
        };
        subtags.push(normalized);
    }
    Ok(subtags)
}

/// Resolves `nl_BE` to `[<prefix>_nl_BE, <prefix>_nl]`, then an optional
/// base catalog.
#[derive(Debug, Clone)]
pub struct PrefixResolver {
    prefix: String,
    base: Option<CatalogId>,
}

impl PrefixResolver {
    /// Resolver producing `<prefix>_<subtags>` ids.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            base: None,
        }
    }

    /// Append a least-specific catalog to every chain (e.g. built-in strings).
    #[must_use]
    pub fn with_base(mut self, base: impl Into<CatalogId>) -> Self {
        self.base = Some(base.into());
        self
    }
}

impl LocaleResolver for PrefixResolver {
    fn catalogs_for_locale(&self, locale: &str) -> Result<Vec<CatalogId>> {
        let subtags = locale_subtags(locale)?;
        let mut ids: Vec<CatalogId> = (1..=subtags.len())
            .rev()
            .map(|n| CatalogId::new(format!("{}_{}", self.prefix, subtags[..n].join("_"))))
            .collect();
        ids.extend(self.base.clone());
        Ok(ids)
    }
}

/// On-disk catalog formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogFormat {
    /// Qt Linguist XML.
    Ts,
    /// JSON [`CatalogDocument`].
    Json,
}

impl CatalogFormat {
    /// Every supported format, in probing order.
    pub const ALL: [Self; 2] = [Self::Ts, Self::Json];

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::Json => "json",
        }
    }

    /// Format for a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Format for a path, by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| I18nError::UnknownFormat(path.display().to_string()))
    }
}

/// Parse catalog text into a store.
pub fn parse_catalog(origin: &str, text: &str, format: CatalogFormat) -> Result<StoreBuild> {
    match format {
        CatalogFormat::Ts => parse_ts(text, origin)?.into_store(origin),
        CatalogFormat::Json => {
            let doc: CatalogDocument = serde_json::from_str(text).map_err(|err| match err.line() {
                0 => I18nError::parse(origin, err.to_string()),
                line => I18nError::parse_at(origin, line, err.to_string()),
            })?;
            let language = doc.language.clone();
            CatalogStore::build_from(origin, language, doc.into_entries())
        }
    }
}

/// Read and parse a catalog file, picking the format from its extension.
pub fn load_file(path: &Path) -> Result<StoreBuild> {
    let format = CatalogFormat::from_path(path)?;
    let bytes = fs::read(path).map_err(|err| io_error(path, &err))?;
    let text = decode_utf8(path, bytes)?;
    parse_catalog(&path.display().to_string(), &text, format)
}

/// Catalog text must be UTF-8; anything else is a malformed resource.
fn decode_utf8(path: &Path, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|err| {
        let valid = &err.as_bytes()[..err.utf8_error().valid_up_to()];
        let line = valid.iter().filter(|&&b| b == b'\n').count() + 1;
        I18nError::parse_at(path.display().to_string(), line, err.utf8_error().to_string())
    })
}

fn io_error(path: &Path, err: &io::Error) -> I18nError {
    I18nError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Fetches raw catalog text by id.
pub trait CatalogSource: Send + Sync {
    /// Catalog text and its format.
    fn fetch(&self, id: &CatalogId) -> Result<(String, CatalogFormat)>;
}

/// Catalogs stored as `<root>/<id>.ts` or `<root>/<id>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being read.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CatalogSource for DirectorySource {
    fn fetch(&self, id: &CatalogId) -> Result<(String, CatalogFormat)> {
        for format in CatalogFormat::ALL {
            let path = self
                .root
                .join(format!("{}.{}", id.as_str(), format.extension()));
            match fs::read(&path) {
                Ok(bytes) => return Ok((decode_utf8(&path, bytes)?, format)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(io_error(&path, &err)),
            }
        }
        Err(I18nError::Io {
            path: self.root.join(id.as_str()).display().to_string(),
            message: "catalog not found".into(),
        })
    }
}

/// Catalogs held in memory, for embedded resources and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    catalogs: HashMap<CatalogId, (String, CatalogFormat)>,
}

impl MemorySource {
    /// An empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a catalog.
    pub fn insert(&mut self, id: impl Into<CatalogId>, text: impl Into<String>, format: CatalogFormat) {
        self.catalogs.insert(id.into(), (text.into(), format));
    }

    /// Builder form of [`MemorySource::insert`].
    #[must_use]
    pub fn with(mut self, id: impl Into<CatalogId>, text: impl Into<String>, format: CatalogFormat) -> Self {
        self.insert(id, text, format);
        self
    }
}

impl CatalogSource for MemorySource {
    fn fetch(&self, id: &CatalogId) -> Result<(String, CatalogFormat)> {
        self.catalogs.get(id).cloned().ok_or_else(|| I18nError::Io {
            path: id.to_string(),
            message: "catalog not found".into(),
        })
    }
}

/// A catalog that was left out of the set.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    /// Catalog that failed.
    pub id: CatalogId,
    /// Why.
    pub error: I18nError,
}

/// Diagnostics from one load.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Locale that was requested.
    pub locale: String,
    /// Catalogs in the set, most specific first.
    pub loaded: Vec<CatalogId>,
    /// Catalogs that were omitted.
    pub failures: Vec<LoadFailure>,
    /// Duplicate keys found, per catalog.
    pub collisions: Vec<(CatalogId, KeyCollision)>,
}

impl LoadReport {
    /// Whether any catalog was omitted.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Omitted catalogs that were present but malformed.
    pub fn parse_failures(&self) -> impl Iterator<Item = &LoadFailure> {
        self.failures.iter().filter(|f| f.error.is_parse())
    }
}

/// A built set plus its diagnostics.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Set ready to publish.
    pub set: CatalogSet,
    /// What happened while building it.
    pub report: LoadReport,
}

/// Builds catalog sets for locales.
pub struct CatalogLoader {
    resolver: Box<dyn LocaleResolver>,
    source: Box<dyn CatalogSource>,
}

impl fmt::Debug for CatalogLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogLoader").finish_non_exhaustive()
    }
}

impl CatalogLoader {
    /// Loader combining a resolver and a source.
    pub fn new(
        resolver: impl LocaleResolver + 'static,
        source: impl CatalogSource + 'static,
    ) -> Self {
        Self {
            resolver: Box::new(resolver),
            source: Box::new(source),
        }
    }

    /// Build the set for `locale`.
    ///
    /// Fails only when the resolver rejects the locale; individual catalog
    /// failures are recorded in the report.
    pub fn load(&self, locale: &str) -> Result<LoadOutcome> {
        let ids = self.resolver.catalogs_for_locale(locale)?;
        let mut report = LoadReport {
            locale: locale.to_owned(),
            ..LoadReport::default()
        };
        let mut set = CatalogSet::new().with_locale(locale);

        for id in ids {
            match self.load_one(&id) {
                Ok(build) => {
                    report
                        .collisions
                        .extend(build.collisions.into_iter().map(|c| (id.clone(), c)));
                    set.push(Arc::new(build.store));
                    report.loaded.push(id);
                }
                Err(error) => {
                    if error.is_parse() {
                        warn!(catalog = id.as_str(), %error, "catalog omitted");
                    } else {
                        debug!(catalog = id.as_str(), %error, "catalog unavailable");
                    }
                    report.failures.push(LoadFailure { id, error });
                }
            }
        }

        debug!(
            locale,
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            collisions = report.collisions.len(),
            "catalog set loaded"
        );
        Ok(LoadOutcome { set, report })
    }

    fn load_one(&self, id: &CatalogId) -> Result<StoreBuild> {
        let (text, format) = self.source.fetch(id)?;
        parse_catalog(id.as_str(), &text, format)
    }
}
