//! Inline-level grammar: four variants (normal, pedantic, GFM, GFM+breaks).

use once_cell::sync::Lazy;
use regex::Regex;

use super::re;

/// One inline-grammar variant. Strong/em/code-span matching needs
/// backtracking the `regex` crate does not do, so those live in scanners on
/// the compiler; the flags here tell the scanners which dialect to apply.
pub struct InlineRules {
    pub escape: Regex,
    pub autolink: Regex,
    /// Bare URLs (GFM only).
    pub url: Option<Regex>,
    pub tag: Regex,
    /// Collapsed reference links: `[label]` with no trailing part.
    pub nolink: Regex,
    /// The `[label]` part following a scanned reference-link label.
    pub reflink_tail: Regex,
    /// The inside of a link's `(...)` part: href, optional quoted title.
    pub link_inner: Regex,
    /// Hard line break (the not-at-end-of-input check is the caller's).
    pub br: Regex,
    /// Strikethrough (GFM only).
    pub del: Option<Regex>,
    pub gfm: bool,
    pub breaks: bool,
    pub pedantic: bool,
}

impl InlineRules {
    fn build(gfm: bool, breaks: bool, pedantic: bool) -> Self {
        let escape = if gfm {
            // the GFM class also covers `~` (del) and `|` (table cells)
            r"^\\([\\`*{}\[\]()#+\-.!_>~|])"
        } else {
            r"^\\([\\`*{}\[\]()#+\-.!_>])"
        };
        let br = if breaks { r"^ *\n" } else { r"^ {2,}\n" };
        InlineRules {
            escape: re(escape),
            autolink: re(r"^<([^ >]+(@|:/)[^ >]+)>"),
            url: gfm.then(|| re(r#"^(https?://[^\s<]+[^<.,:;"')\]\s])"#)),
            tag: re(r#"^<!--(?s:.)*?-->|^</?\w+(?:"[^"]*"|'[^']*'|[^'">])*?>"#),
            nolink: re(r"^!?\[((?:\[[^\]]*\]|[^\[\]])*)\]"),
            reflink_tail: re(r"^\s*\[([^\]]*)\]"),
            link_inner: re(r#"^\s*<?((?s:.)*?)>?(?:\s+['"]((?s:.)*?)['"])?\s*$"#),
            br: re(br),
            del: gfm.then(|| re(r"^~~(\S(?:(?s:.)*?\S)?)~~")),
            gfm,
            breaks,
            pedantic,
        }
    }

    pub fn normal() -> &'static InlineRules {
        static RULES: Lazy<InlineRules> = Lazy::new(|| InlineRules::build(false, false, false));
        &RULES
    }

    pub fn pedantic() -> &'static InlineRules {
        static RULES: Lazy<InlineRules> = Lazy::new(|| InlineRules::build(false, false, true));
        &RULES
    }

    pub fn gfm() -> &'static InlineRules {
        static RULES: Lazy<InlineRules> = Lazy::new(|| InlineRules::build(true, false, false));
        &RULES
    }

    pub fn breaks() -> &'static InlineRules {
        static RULES: Lazy<InlineRules> = Lazy::new(|| InlineRules::build(true, true, false));
        &RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_class_per_dialect() {
        assert!(InlineRules::gfm().escape.is_match(r"\|"));
        assert!(InlineRules::gfm().escape.is_match(r"\~"));
        assert!(!InlineRules::normal().escape.is_match(r"\|"));
        assert!(InlineRules::normal().escape.is_match(r"\*"));
    }

    #[test]
    fn test_autolink_shapes() {
        let rules = InlineRules::gfm();
        let cap = rules.autolink.captures("<http://x.y/z>").unwrap();
        assert_eq!(&cap[1], "http://x.y/z");
        assert_eq!(&cap[2], ":/");
        let cap = rules.autolink.captures("<mailto:a@b.c>").unwrap();
        assert_eq!(&cap[2], "@");
        assert!(rules.autolink.captures("<not a link>").is_none());
    }

    #[test]
    fn test_link_inner_href_and_title() {
        let rules = InlineRules::gfm();
        let cap = rules.link_inner.captures("/url \"Title\"").unwrap();
        assert_eq!(&cap[1], "/url");
        assert_eq!(&cap[2], "Title");
        let cap = rules.link_inner.captures("</url>").unwrap();
        assert_eq!(&cap[1], "/url");
        assert!(cap.get(2).is_none());
    }

    #[test]
    fn test_del_needs_nonspace_edges() {
        let del = InlineRules::gfm().del.as_ref().unwrap();
        assert_eq!(&del.captures("~~hi there~~").unwrap()[1], "hi there");
        assert_eq!(&del.captures("~~x~~").unwrap()[1], "x");
        assert!(del.captures("~~ x~~").is_none());
    }

    #[test]
    fn test_br_dialects() {
        assert!(InlineRules::gfm().br.is_match("  \nx"));
        assert!(!InlineRules::gfm().br.is_match(" \nx"));
        assert!(InlineRules::breaks().br.is_match("\nx"));
    }
}
