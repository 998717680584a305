//! Plural category selection.
//!
//! Catalogs store plural variants as an ordered list; which variant a count
//! maps to depends on the locale. The translator never hardcodes a rule: it
//! receives a [`PluralSelector`]. [`PluralRule`] provides ready-made
//! selectors for common language families, and any
//! `Fn(i64, usize) -> usize` closure works as a synthetic rule.

/// CLDR plural categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    /// Zero items (Arabic, Latvian, ...).
    Zero,
    /// Singular.
    One,
    /// Dual.
    Two,
    /// Paucal (Slavic 2-4, Arabic 3-10).
    Few,
    /// Large counts in Slavic and Arabic rules.
    Many,
    /// Everything else.
    Other,
}

/// Maps a count to the index of the plural variant to use.
///
/// `forms` is the number of variants the entry carries. Implementations
/// should return an index below `forms`; the translator clamps anything
/// larger to the last variant.
pub trait PluralSelector: Send + Sync {
    /// Variant index for `count`.
    fn form_index(&self, count: i64, forms: usize) -> usize;
}

impl<F> PluralSelector for F
where
    F: Fn(i64, usize) -> usize + Send + Sync,
{
    fn form_index(&self, count: i64, forms: usize) -> usize {
        self(count, forms)
    }
}

/// Built-in plural rules, grouped by language family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PluralRule {
    /// No plural distinction (ja, zh, ko, vi, th, id).
    Invariant,
    /// `one` for exactly 1, else `other` (en, nl, de, es, it, sv, ...).
    #[default]
    OneOther,
    /// `one` for 0 and 1 (fr, pt-BR).
    French,
    /// one / few / many (ru, uk, be).
    EastSlavic,
    /// one / few / many with exact-one singular (pl).
    Polish,
    /// one / few / other (cs, sk).
    Czech,
    /// zero / one / two / few / many / other (ar).
    Arabic,
}

impl PluralRule {
    /// Pick the rule for a locale tag by its primary language subtag.
    ///
    /// Unknown languages use [`PluralRule::OneOther`].
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        let lower = locale.to_ascii_lowercase().replace('_', "-");
        if lower == "pt-br" {
            return Self::French;
        }
        let lang = lower.split('-').next().unwrap_or("");
        match lang {
            "ja" | "zh" | "ko" | "vi" | "th" | "id" | "ms" => Self::Invariant,
            "fr" => Self::French,
            "ru" | "uk" | "be" => Self::EastSlavic,
            "pl" => Self::Polish,
            "cs" | "sk" => Self::Czech,
            "ar" => Self::Arabic,
            _ => Self::OneOther,
        }
    }

    /// Categories in the order catalogs list their variants.
    #[must_use]
    pub const fn categories(self) -> &'static [PluralCategory] {
        use PluralCategory::{Few, Many, One, Other, Two, Zero};
        match self {
            Self::Invariant => &[Other],
            Self::OneOther | Self::French => &[One, Other],
            Self::EastSlavic | Self::Polish => &[One, Few, Many],
            Self::Czech => &[One, Few, Other],
            Self::Arabic => &[Zero, One, Two, Few, Many, Other],
        }
    }

    /// Classify a count.
    #[must_use]
    pub fn categorize(self, count: i64) -> PluralCategory {
        let n = count.unsigned_abs();
        let mod10 = n % 10;
        let mod100 = n % 100;
        match self {
            Self::Invariant => PluralCategory::Other,
            Self::OneOther => {
                if n == 1 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            Self::French => {
                if n <= 1 {
                    PluralCategory::One
                } else {
                    PluralCategory::Other
                }
            }
            Self::EastSlavic => {
                if mod10 == 1 && mod100 != 11 {
                    PluralCategory::One
                } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
                    PluralCategory::Few
                } else {
                    PluralCategory::Many
                }
            }
            Self::Polish => {
                if n == 1 {
                    PluralCategory::One
                } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
                    PluralCategory::Few
                } else {
                    PluralCategory::Many
                }
            }
            Self::Czech => match n {
                1 => PluralCategory::One,
                2..=4 => PluralCategory::Few,
                _ => PluralCategory::Other,
            },
            Self::Arabic => match (n, mod100) {
                (0, _) => PluralCategory::Zero,
                (1, _) => PluralCategory::One,
                (2, _) => PluralCategory::Two,
                (_, 3..=10) => PluralCategory::Few,
                (_, 11..=99) => PluralCategory::Many,
                _ => PluralCategory::Other,
            },
        }
    }
}

impl PluralSelector for PluralRule {
    fn form_index(&self, count: i64, forms: usize) -> usize {
        let category = self.categorize(count);
        let index = self
            .categories()
            .iter()
            .position(|&c| c == category)
            .unwrap_or(0);
        index.min(forms.saturating_sub(1))
    }
}
