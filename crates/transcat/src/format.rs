//! Positional placeholder substitution.
//!
//! Templates use `%1`..`%9` for arguments, `%n` for the plural count and
//! `%%` for a literal percent sign. Arguments bind by index, not by order of
//! appearance, so translators may reorder them freely.
//!
//! # Invariants
//!
//! 1. **Single pass**: substituted values are never rescanned, so an argument
//!    containing `%1` is inserted verbatim.
//! 2. **Total**: every template formats; malformed or unmatched tokens are
//!    handled by [`MissingArgPolicy`] or left as text.

/// What to emit for a placeholder whose argument was not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingArgPolicy {
    /// Leave the placeholder as literal text (`%3`).
    #[default]
    KeepLiteral,
    /// Drop the placeholder.
    Empty,
}

impl MissingArgPolicy {
    /// Parse a policy name (`keep` / `empty`), case-insensitive.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep" | "literal" | "keep-literal" => Some(Self::KeepLiteral),
            "empty" | "drop" => Some(Self::Empty),
            _ => None,
        }
    }
}

/// Substitute placeholders in `template`.
///
/// `count` feeds `%n`; without a count `%n` is left as text.
///
/// ```
/// use transcat::format::{substitute, MissingArgPolicy};
///
/// let out = substitute(
///     "%2 is released under %1",
///     &["MIT", "1.0"],
///     None,
///     MissingArgPolicy::KeepLiteral,
/// );
/// assert_eq!(out, "1.0 is released under MIT");
/// ```
#[must_use]
pub fn substitute<A: AsRef<str>>(
    template: &str,
    args: &[A],
    count: Option<i64>,
    policy: MissingArgPolicy,
) -> String {
    if !template.contains('%') {
        return template.to_owned();
    }

    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(d @ '1'..='9') => {
                chars.next();
                let index = (d as usize) - ('1' as usize);
                match args.get(index) {
                    Some(arg) => out.push_str(arg.as_ref()),
                    None => {
                        if policy == MissingArgPolicy::KeepLiteral {
                            out.push('%');
                            out.push(d);
                        }
                    }
                }
            }
            Some('n') if count.is_some() => {
                chars.next();
                if let Some(n) = count {
                    out.push_str(&n.to_string());
                }
            }
            _ => out.push('%'),
        }
    }

    out
}
