//! Low-level HTML text helpers.
//!
//! They cover the markup MediaWiki emits for the
//! guide page, not arbitrary HTML.

use std::sync::LazyLock;

use regex::Regex;

static EDIT_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[\s*edit[^\]]*\]").expect("valid regex"));

static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid regex"));

/// Removes every `<...>` tag, decodes entities, and collapses whitespace.
#[must_use]
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&decode_entities(&out))
}

/// Plain text of a heading element's inner HTML, without the
/// `[edit]` / `[edit | edit source]` section links.
#[must_use]
pub fn heading_text(inner: &str) -> String {
    let text = strip_tags(inner);
    normalize_ws(&EDIT_LINK_RE.replace_all(&text, ""))
}

/// Decodes the named entities MediaWiki emits plus numeric references.
#[must_use]
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let named = s
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">");
    let numeric = NUMERIC_ENTITY_RE.replace_all(&named, |caps: &regex::Captures<'_>| {
        let code = &caps[1];
        let value = code
            .strip_prefix('x')
            .map_or_else(|| code.parse::<u32>().ok(), |hex| u32::from_str_radix(hex, 16).ok());
        value
            .and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), String::from)
    });
    // `&amp;` last so `&amp;lt;` stays literal `&lt;`
    numeric.replace("&amp;", "&")
}

/// Collapses runs of whitespace into a single space and trims.
#[must_use]
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Returns the (entity-decoded) value of a double- or single-quoted
/// attribute within an opening tag.
#[must_use]
pub fn attr(open_tag: &str, name: &str) -> Option<String> {
    let lower = open_tag.to_ascii_lowercase();
    let needle = format!("{}=", name.to_ascii_lowercase());
    let mut from = 0;
    while let Some(rel) = lower[from..].find(&needle) {
        let at = from + rel;
        let preceded_by_space = at == 0
            || lower[..at]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace);
        let value_start = at + needle.len();
        if preceded_by_space {
            let rest = &open_tag[value_start..];
            let quote = rest.chars().next()?;
            if quote == '"' || quote == '\'' {
                let body = &rest[1..];
                let end = body.find(quote)?;
                return Some(decode_entities(&body[..end]));
            }
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(rest.len());
            return Some(decode_entities(&rest[..end]));
        }
        from = value_start;
    }
    None
}
