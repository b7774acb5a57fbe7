//! HTML entity encoding and decoding, used everywhere text becomes output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `#?\w+;` — the tail of an entity that is already encoded.
static ENTITY_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#?\w+;").unwrap());

/// Decimal, hex, and named HTML entities.
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#(?:\d+)|(?:#x[0-9A-Fa-f]+)|(?:\w+));?").unwrap());

/// Encode `&`, `<`, `>`, `"` and `'` as HTML entities.
///
/// With `encode` set every ampersand is encoded; otherwise ampersands that
/// already introduce an entity are left alone so escaping is idempotent.
pub fn escape(html: &str, encode: bool) -> String {
    let mut out = String::with_capacity(html.len());
    for (i, ch) in html.char_indices() {
        match ch {
            '&' => {
                if !encode && ENTITY_TAIL.is_match(&html[i + 1..]) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decode numeric character references and `&colon;`. Other named entities
/// decode to the empty string; this is only used to normalize addresses
/// before the scheme check, not to produce output.
pub fn unescape(html: &str) -> String {
    ENTITY
        .replace_all(html, |caps: &Captures| {
            let name = caps[1].to_lowercase();
            if name == "colon" {
                return ":".to_string();
            }
            if let Some(num) = name.strip_prefix('#') {
                let code = match num.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => num.parse::<u32>().ok(),
                };
                return code
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default();
            }
            String::new()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_basic() {
        assert_eq!(escape("<div>", false), "&lt;div&gt;");
        assert_eq!(escape("a & b", false), "a &amp; b");
        assert_eq!(escape("\"hi\"", false), "&quot;hi&quot;");
        assert_eq!(escape("it's", false), "it&#39;s");
    }

    #[test]
    fn test_escape_preserves_entities() {
        assert_eq!(escape("&amp;", false), "&amp;");
        assert_eq!(escape("&#39;", false), "&#39;");
    }

    #[test]
    fn test_escape_encode_all() {
        assert_eq!(escape("&amp;", true), "&amp;amp;");
    }

    #[test]
    fn test_unescape_numeric() {
        assert_eq!(unescape("&#65;"), "A");
        assert_eq!(unescape("&#x41;"), "A");
        assert_eq!(unescape("&#x6A;avascript"), "javascript");
    }

    #[test]
    fn test_unescape_colon() {
        assert_eq!(unescape("javascript&colon;alert"), "javascript:alert");
    }

    #[test]
    fn test_unescape_named_drops() {
        assert_eq!(unescape("&nbsp;"), "");
    }
}
