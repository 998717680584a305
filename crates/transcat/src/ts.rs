//! Reader for Qt Linguist `.ts` catalogs.
//!
//! Covers the subset of XML that translation files use: elements,
//! attributes, character entities, comments, CDATA, and the
//! `<?xml?>`/`<!DOCTYPE>` prologue. There is no DTD processing and no
//! namespace support; neither appears in `.ts` files.
//!
//! ```text
//! <TS language="nl" version="2.1">
//!   <context>
//!     <name>DAboutDialog</name>
//!     <message>
//!       <location filename="../widgets/daboutdialog.cpp" line="190"/>
//!       <source>Acknowledgements</source>
//!       <translation>Erkenningen</translation>
//!     </message>
//!   </context>
//! </TS>
//! ```
//!
//! Translated text is kept exactly as written, including any encoding
//! artifacts a previous tool left behind.

use std::borrow::Cow;
use std::collections::HashMap;
use std::iter::Peekable;
use std::vec::IntoIter;

use crate::entry::{CatalogEntry, EntryStatus, SourceLocation};
use crate::error::{I18nError, Result};
use crate::store::{CatalogStore, StoreBuild};

/// A parsed `.ts` file.
#[derive(Debug, Clone, Default)]
pub struct TsDocument {
    /// `language` attribute of the root element.
    pub language: Option<String>,
    /// `sourcelanguage` attribute of the root element.
    pub source_language: Option<String>,
    /// Format version.
    pub version: Option<String>,
    /// Messages in file order.
    pub entries: Vec<CatalogEntry>,
}

impl TsDocument {
    /// Index the entries into a store named `origin`.
    pub fn into_store(self, origin: impl Into<String>) -> Result<StoreBuild> {
        CatalogStore::build_from(origin, self.language, self.entries)
    }
}

/// Parse `.ts` text. `origin` names the resource in error messages.
pub fn parse_ts(text: &str, origin: &str) -> Result<TsDocument> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let text = normalize_line_ends(text);
    let tokens = tokenize(&text, origin)?;
    Parser {
        src: &text,
        origin,
        tokens: tokens.into_iter().peekable(),
        last_line: HashMap::new(),
        last_file: None,
    }
    .document()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Text(String),
    Open {
        name: String,
        attrs: Vec<(String, String)>,
        empty: bool,
    },
    Close(String),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

/// Fold `\r\n` and lone `\r` into `\n`, as XML requires before parsing.
///
/// Runs on the raw text, so a `&#13;` reference still yields a carriage
/// return.
fn normalize_line_ends(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

fn line_at(src: &str, offset: usize) -> usize {
    src.as_bytes()[..offset.min(src.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

fn tokenize(src: &str, origin: &str) -> Result<Vec<Token>> {
    let err = |offset: usize, msg: &str| I18nError::parse_at(origin, line_at(src, offset), msg);
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < src.len() {
        let rest = &src[pos..];
        if let Some(body) = rest.strip_prefix("<!--") {
            let end = body
                .find("-->")
                .ok_or_else(|| err(pos, "unterminated comment"))?;
            pos += 4 + end + 3;
        } else if let Some(body) = rest.strip_prefix("<![CDATA[") {
            let end = body
                .find("]]>")
                .ok_or_else(|| err(pos, "unterminated CDATA section"))?;
            tokens.push(Token {
                kind: TokenKind::Text(body[..end].to_owned()),
                offset: pos,
            });
            pos += 9 + end + 3;
        } else if let Some(body) = rest.strip_prefix("<?") {
            let end = body
                .find("?>")
                .ok_or_else(|| err(pos, "unterminated processing instruction"))?;
            pos += 2 + end + 2;
        } else if rest.starts_with("<!") {
            let end = rest
                .find('>')
                .ok_or_else(|| err(pos, "unterminated declaration"))?;
            pos += end + 1;
        } else if let Some(body) = rest.strip_prefix("</") {
            let end = body
                .find('>')
                .ok_or_else(|| err(pos, "unterminated closing tag"))?;
            tokens.push(Token {
                kind: TokenKind::Close(body[..end].trim().to_owned()),
                offset: pos,
            });
            pos += 2 + end + 1;
        } else if rest.starts_with('<') {
            let end = tag_end(rest).ok_or_else(|| err(pos, "unterminated tag"))?;
            let inner = &rest[1..end];
            let (inner, empty) = match inner.strip_suffix('/') {
                Some(stripped) => (stripped, true),
                None => (inner, false),
            };
            let (name, attrs) =
                parse_tag(inner).ok_or_else(|| err(pos, "malformed tag or attribute"))?;
            tokens.push(Token {
                kind: TokenKind::Open { name, attrs, empty },
                offset: pos,
            });
            pos += end + 1;
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            tokens.push(Token {
                kind: TokenKind::Text(decode_entities(&rest[..end])),
                offset: pos,
            });
            pos += end;
        }
    }

    Ok(tokens)
}

/// Index of the `>` closing a start tag, skipping quoted attribute values.
fn tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    for (i, b) in tag.bytes().enumerate().skip(1) {
        match (quote, b) {
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            (None, b'>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_tag(inner: &str) -> Option<(String, Vec<(String, String)>)> {
    let inner = inner.trim();
    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let name = &inner[..name_end];
    if name.is_empty() {
        return None;
    }

    let mut attrs = Vec::new();
    let mut rest = inner[name_end..].trim_start();
    while !rest.is_empty() {
        let eq = rest.find('=')?;
        let key = rest[..eq].trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return None;
        }
        let after = rest[eq + 1..].trim_start();
        let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let close = after[1..].find(quote)?;
        attrs.push((key.to_owned(), decode_entities(&after[1..1 + close])));
        rest = after[close + 2..].trim_start();
    }
    Some((name.to_owned(), attrs))
}

/// Decode the five predefined entities and numeric character references.
/// Unknown or malformed references are kept verbatim.
#[must_use]
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 12)
            .and_then(|semi| decode_reference(&tail[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// `<byte value="x9"/>` escapes for control characters.
fn byte_value(attrs: &[(String, String)]) -> Option<char> {
    let value = attr(attrs, "value")?;
    let code = match value.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => value.parse().ok()?,
    };
    char::from_u32(code)
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

struct Parser<'a> {
    src: &'a str,
    origin: &'a str,
    tokens: Peekable<IntoIter<Token>>,
    // Relative `line="+3"` locations count from the previous line in the same file.
    last_line: HashMap<String, u32>,
    last_file: Option<String>,
}

impl Parser<'_> {
    fn error(&self, offset: usize, message: impl Into<String>) -> I18nError {
        I18nError::parse_at(self.origin, line_at(self.src, offset), message)
    }

    fn next(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    fn document(mut self) -> Result<TsDocument> {
        let (attrs, empty, root_offset) = loop {
            match self.next() {
                None => return Err(I18nError::parse(self.origin, "missing <TS> root element")),
                Some(Token {
                    kind: TokenKind::Text(t),
                    ..
                }) if t.trim().is_empty() => {}
                Some(Token {
                    kind: TokenKind::Open { name, attrs, empty },
                    offset,
                }) if name == "TS" => break (attrs, empty, offset),
                Some(tok) => return Err(self.error(tok.offset, "expected <TS> root element")),
            }
        };

        let mut doc = TsDocument {
            language: attr(&attrs, "language").map(str::to_owned),
            source_language: attr(&attrs, "sourcelanguage").map(str::to_owned),
            version: attr(&attrs, "version").map(str::to_owned),
            entries: Vec::new(),
        };
        if empty {
            return Ok(doc);
        }

        loop {
            let Some(Token { kind, offset }) = self.next() else {
                return Err(self.error(root_offset, "unterminated <TS>"));
            };
            match kind {
                TokenKind::Close(name) if name == "TS" => break,
                TokenKind::Close(name) => {
                    return Err(self.error(offset, format!("unexpected </{name}>")));
                }
                TokenKind::Open {
                    name, empty: false, ..
                } if name == "context" => self.context(offset, &mut doc.entries)?,
                TokenKind::Open { empty: true, .. } | TokenKind::Text(_) => {}
                TokenKind::Open { name, .. } => self.skip_element(&name, offset)?,
            }
        }

        Ok(doc)
    }

    fn context(&mut self, open_offset: usize, entries: &mut Vec<CatalogEntry>) -> Result<()> {
        let mut name = None;
        let mut messages = Vec::new();

        loop {
            let Some(Token { kind, offset }) = self.next() else {
                return Err(self.error(open_offset, "unterminated <context>"));
            };
            match kind {
                TokenKind::Close(tag) if tag == "context" => break,
                TokenKind::Close(tag) => {
                    return Err(self.error(offset, format!("unexpected </{tag}> in <context>")));
                }
                TokenKind::Open { name: tag, empty, .. } if tag == "name" => {
                    name = Some(self.text_of("name", empty, offset)?);
                }
                TokenKind::Open {
                    name: tag,
                    attrs,
                    empty,
                } if tag == "message" => {
                    if empty {
                        return Err(self.error(offset, "message without <source>"));
                    }
                    messages.push(self.message(&attrs, offset)?);
                }
                TokenKind::Open { empty: true, .. } | TokenKind::Text(_) => {}
                TokenKind::Open { name: tag, .. } => self.skip_element(&tag, offset)?,
            }
        }

        let Some(name) = name else {
            return Err(self.error(open_offset, "<context> without <name>"));
        };
        entries.extend(messages.into_iter().map(|mut m| {
            m.context.clone_from(&name);
            m
        }));
        Ok(())
    }

    fn message(&mut self, attrs: &[(String, String)], open_offset: usize) -> Result<CatalogEntry> {
        let numerus = attr(attrs, "numerus") == Some("yes");
        let mut entry = CatalogEntry::new("", "", "");
        let mut source = None;

        loop {
            let Some(Token { kind, offset }) = self.next() else {
                return Err(self.error(open_offset, "unterminated <message>"));
            };
            let (tag, attrs, empty) = match kind {
                TokenKind::Close(tag) if tag == "message" => break,
                TokenKind::Close(tag) => {
                    return Err(self.error(offset, format!("unexpected </{tag}> in <message>")));
                }
                TokenKind::Text(_) => continue,
                TokenKind::Open { name, attrs, empty } => (name, attrs, empty),
            };
            match tag.as_str() {
                "location" => {
                    let location = self.location(&attrs);
                    entry.source_locations.push(location);
                    if !empty {
                        self.skip_element(&tag, offset)?;
                    }
                }
                "source" => source = Some(self.text_of(&tag, empty, offset)?),
                "comment" => entry.disambiguation = self.text_of(&tag, empty, offset)?,
                "extracomment" | "translatorcomment" => {
                    let note = self.text_of(&tag, empty, offset)?;
                    if !note.is_empty() {
                        entry.notes.push(note);
                    }
                }
                "translation" => self.translation(&attrs, empty, offset, numerus, &mut entry)?,
                _ if empty => {}
                _ => self.skip_element(&tag, offset)?,
            }
        }

        entry.source_text =
            source.ok_or_else(|| self.error(open_offset, "message without <source>"))?;
        Ok(entry)
    }

    fn location(&mut self, attrs: &[(String, String)]) -> SourceLocation {
        let file = attr(attrs, "filename")
            .map(str::to_owned)
            .or_else(|| self.last_file.clone())
            .unwrap_or_default();
        let previous = self.last_line.get(&file).copied().unwrap_or(0);
        let line = match attr(attrs, "line") {
            Some(rel) if rel.starts_with(['+', '-']) => rel
                .parse::<i64>()
                .ok()
                .and_then(|delta| u32::try_from(i64::from(previous) + delta).ok())
                .unwrap_or(0),
            Some(abs) => abs.parse().unwrap_or(0),
            None => 0,
        };
        self.last_line.insert(file.clone(), line);
        self.last_file = Some(file.clone());
        SourceLocation { file, line }
    }

    fn translation(
        &mut self,
        attrs: &[(String, String)],
        empty: bool,
        open_offset: usize,
        numerus: bool,
        entry: &mut CatalogEntry,
    ) -> Result<()> {
        entry.status = match attr(attrs, "type") {
            Some("unfinished") => EntryStatus::Unfinished,
            Some("obsolete" | "vanished") => EntryStatus::Obsolete,
            _ => EntryStatus::Finished,
        };
        if empty {
            return Ok(());
        }

        let mut text = String::new();
        let mut forms = Vec::new();
        let mut variant_taken = false;
        loop {
            let Some(Token { kind, offset }) = self.next() else {
                return Err(self.error(open_offset, "unterminated <translation>"));
            };
            match kind {
                TokenKind::Close(tag) if tag == "translation" => break,
                TokenKind::Close(tag) => {
                    return Err(self.error(offset, format!("unexpected </{tag}> in <translation>")));
                }
                TokenKind::Text(t) => text.push_str(&t),
                TokenKind::Open { name, empty, .. } if name == "numerusform" => {
                    forms.push(self.text_of(&name, empty, offset)?);
                }
                TokenKind::Open { name, empty, .. } if name == "lengthvariant" => {
                    let variant = self.text_of(&name, empty, offset)?;
                    if !variant_taken {
                        text.push_str(&variant);
                        variant_taken = true;
                    }
                }
                TokenKind::Open { name, attrs, empty } if name == "byte" => {
                    text.extend(byte_value(&attrs));
                    if !empty {
                        self.skip_element(&name, offset)?;
                    }
                }
                TokenKind::Open { empty: true, .. } => {}
                TokenKind::Open { name, .. } => self.skip_element(&name, offset)?,
            }
        }

        if numerus && !forms.is_empty() {
            entry.translation = forms[0].clone();
            entry.plural_forms = Some(forms);
        } else if let Some(first) = forms.into_iter().next() {
            // Stray numerus forms on a plain message: keep the first.
            entry.translation = first;
        } else {
            entry.translation = text;
        }
        Ok(())
    }

    fn text_of(&mut self, tag: &str, empty: bool, open_offset: usize) -> Result<String> {
        if empty {
            Ok(String::new())
        } else {
            self.text(tag, open_offset)
        }
    }

    /// Collect character data up to `</tag>`.
    fn text(&mut self, tag: &str, open_offset: usize) -> Result<String> {
        let mut out = String::new();
        let mut variant_taken = false;
        loop {
            let Some(Token { kind, offset }) = self.next() else {
                return Err(self.error(open_offset, format!("unterminated <{tag}>")));
            };
            match kind {
                TokenKind::Close(name) if name == tag => return Ok(out),
                TokenKind::Close(name) => {
                    return Err(self.error(
                        offset,
                        format!("mismatched </{name}>, expected </{tag}>"),
                    ));
                }
                TokenKind::Text(t) => out.push_str(&t),
                TokenKind::Open { name, attrs, empty } if name == "byte" => {
                    out.extend(byte_value(&attrs));
                    if !empty {
                        self.skip_element(&name, offset)?;
                    }
                }
                TokenKind::Open { name, empty, .. } if name == "lengthvariant" => {
                    let variant = self.text_of(&name, empty, offset)?;
                    if !variant_taken {
                        out.push_str(&variant);
                        variant_taken = true;
                    }
                }
                TokenKind::Open { empty: true, .. } => {}
                TokenKind::Open { name, .. } => self.skip_element(&name, offset)?,
            }
        }
    }

    /// Skip an unknown element and everything inside it.
    fn skip_element(&mut self, tag: &str, open_offset: usize) -> Result<()> {
        let mut stack = vec![tag.to_owned()];
        while let Some(Token { kind, offset }) = self.next() {
            match kind {
                TokenKind::Open {
                    name, empty: false, ..
                } => stack.push(name),
                TokenKind::Close(name) => {
                    if stack.last() != Some(&name) {
                        return Err(self.error(offset, format!("mismatched </{name}>")));
                    }
                    stack.pop();
                    if stack.is_empty() {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(self.error(open_offset, format!("unterminated <{tag}>")))
    }
}
