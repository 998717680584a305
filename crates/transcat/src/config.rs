//! Translator configuration.
//!
//! Defaults favor never showing a blank or broken string: unfinished
//! translations are used, and placeholders without arguments stay visible.
//! Environment overrides exist so a build can be inspected without code
//! changes:
//!
//! | Variable | Values | Effect |
//! |----------|--------|--------|
//! | `TRANSCAT_MISSING_ARGS` | `keep`, `empty` | [`MissingArgPolicy`] |
//! | `TRANSCAT_USE_UNFINISHED` | `1/true/yes/on`, `0/false/no/off` | `use_unfinished` |
//!
//! Unrecognized values are ignored and the programmatic setting is kept.

use crate::format::MissingArgPolicy;

/// Environment variable selecting the missing-argument policy.
pub const ENV_MISSING_ARGS: &str = "TRANSCAT_MISSING_ARGS";
/// Environment variable toggling use of unfinished translations.
pub const ENV_USE_UNFINISHED: &str = "TRANSCAT_USE_UNFINISHED";

/// Behavior switches for [`Translator`](crate::Translator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// What to emit for `%N` with no matching argument.
    pub missing_args: MissingArgPolicy,
    /// Whether unfinished translations are shown. When `false` they are
    /// skipped and resolution continues down the fallback chain.
    pub use_unfinished: bool,
    /// Whether `%n` is replaced by the plural count.
    pub substitute_count: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            missing_args: MissingArgPolicy::KeepLiteral,
            use_unfinished: true,
            substitute_count: true,
        }
    }
}

impl TranslatorConfig {
    /// Default configuration with process environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a custom environment lookup.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(policy) = get_env(ENV_MISSING_ARGS).and_then(|v| MissingArgPolicy::parse(&v)) {
            self.missing_args = policy;
        }
        if let Some(flag) = get_env(ENV_USE_UNFINISHED).and_then(|v| env_flag(&v)) {
            self.use_unfinished = flag;
        }
        self
    }

    /// Set the missing-argument policy.
    #[must_use]
    pub fn with_missing_args(mut self, policy: MissingArgPolicy) -> Self {
        self.missing_args = policy;
        self
    }

    /// Set whether unfinished translations are used.
    #[must_use]
    pub fn with_use_unfinished(mut self, enabled: bool) -> Self {
        self.use_unfinished = enabled;
        self
    }

    /// Set whether `%n` is substituted.
    #[must_use]
    pub fn with_substitute_count(mut self, enabled: bool) -> Self {
        self.substitute_count = enabled;
        self
    }
}

#[inline]
fn env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn defaults() {
        let config = TranslatorConfig::default();
        assert_eq!(config.missing_args, MissingArgPolicy::KeepLiteral);
        assert!(config.use_unfinished);
        assert!(config.substitute_count);
    }

    #[test]
    fn env_overrides_apply() {
        let config = TranslatorConfig::default().with_env_overrides(lookup(&[
            (ENV_MISSING_ARGS, "empty"),
            (ENV_USE_UNFINISHED, "off"),
        ]));
        assert_eq!(config.missing_args, MissingArgPolicy::Empty);
        assert!(!config.use_unfinished);
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let base = TranslatorConfig::default()
            .with_missing_args(MissingArgPolicy::Empty)
            .with_use_unfinished(false);
        let config = base.with_env_overrides(lookup(&[
            (ENV_MISSING_ARGS, "sometimes"),
            (ENV_USE_UNFINISHED, "maybe"),
        ]));
        assert_eq!(config, base);
    }

    #[test]
    fn no_env_keeps_settings() {
        let config = TranslatorConfig::default()
            .with_substitute_count(false)
            .with_env_overrides(|_| None);
        assert!(!config.substitute_count);
    }
}
