//! Inline-level compiler: one block's text plus the link table in, an HTML
//! fragment out.
//!
//! Rules are tried in a fixed priority order; every arm consumes at least
//! one character, so compilation always terminates. Strong, emphasis and
//! code spans need the original grammar's lazy backtracking, which lives
//! in the scanners at the bottom of this file.

use once_cell::sync::Lazy;
use rand::RngExt;
use regex::Regex;

use crate::escape::escape;
use crate::grammar::inline::InlineRules;
use crate::options::Options;
use crate::renderer::Renderer;
use crate::token::{LinkRef, Links};

static A_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)<a ").unwrap());
static A_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)</a>").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// smartypants openers: start of text or a dash, slash, bracket, quote or
// whitespace before the quote mark
static OPENING_SINGLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(^|[-\u{2014}/(\[{"\s])'"#).unwrap());
static OPENING_DOUBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(^|[-\u{2014}/(\[{\u{2018}\s])""#).unwrap());

pub struct InlineCompiler<'a> {
    options: &'a Options,
    rules: &'static InlineRules,
    links: &'a Links,
    renderer: &'a dyn Renderer,
    in_link: bool,
}

impl<'a> InlineCompiler<'a> {
    pub fn new(links: &'a Links, options: &'a Options, renderer: &'a dyn Renderer) -> Self {
        let rules = if options.gfm {
            if options.breaks {
                InlineRules::breaks()
            } else {
                InlineRules::gfm()
            }
        } else if options.pedantic {
            InlineRules::pedantic()
        } else {
            InlineRules::normal()
        };
        InlineCompiler {
            options,
            rules,
            links,
            renderer,
            in_link: false,
        }
    }

    /// Compile inline markdown into an HTML fragment. Re-entrant: strong,
    /// emphasis, del and link labels feed their content back through.
    pub fn output(&mut self, src: &str) -> String {
        let mut out = String::new();
        let mut src = src;

        while !src.is_empty() {
            // backslash escape
            if let Some(cap) = self.rules.escape.captures(src) {
                out.push_str(&cap[1]);
                src = &src[cap[0].len()..];
                continue;
            }

            // autolink
            if let Some(cap) = self.rules.autolink.captures(src) {
                let consumed = cap[0].len();
                let (text, href) = if &cap[2] == "@" {
                    let address = cap[1].strip_prefix("mailto:").unwrap_or(&cap[1]);
                    let text = self.mangle(address);
                    let href = format!("{}{}", self.mangle("mailto:"), text);
                    (text, href)
                } else {
                    let text = escape(&cap[1], false);
                    (text.clone(), text)
                };
                out.push_str(&self.renderer.link(&href, None, &text, self.options));
                src = &src[consumed..];
                continue;
            }

            // bare URL (never inside a link)
            if !self.in_link {
                if let Some(cap) = self.rules.url.as_ref().and_then(|r| r.captures(src)) {
                    let text = escape(&cap[1], false);
                    out.push_str(&self.renderer.link(&text, None, &text, self.options));
                    src = &src[cap[0].len()..];
                    continue;
                }
            }

            // raw inline HTML
            if let Some(m) = self.rules.tag.find(src) {
                let raw = m.as_str();
                if !self.in_link && A_OPEN.is_match(raw) {
                    self.in_link = true;
                } else if self.in_link && A_CLOSE.is_match(raw) {
                    self.in_link = false;
                }
                let emitted = if self.options.sanitize {
                    match &self.options.sanitizer {
                        Some(sanitizer) => sanitizer(raw),
                        None => escape(raw, false),
                    }
                } else {
                    raw.to_string()
                };
                out.push_str(&emitted);
                src = &src[m.end()..];
                continue;
            }

            // inline link / image
            if let Some((consumed, image, label, link)) = self.scan_link(src) {
                out.push_str(&self.output_link(image, &label, &link));
                src = &src[consumed..];
                continue;
            }

            // reference link / image
            if let Some((consumed, image, label, key)) =
                self.scan_reflink(src).or_else(|| self.scan_nolink(src))
            {
                let key = WHITESPACE_RUN.replace_all(&key, " ").to_lowercase();
                let link = self.links.get(&key).cloned();
                match link {
                    Some(link) if !link.href.is_empty() => {
                        out.push_str(&self.output_link(image, &label, &link));
                        src = &src[consumed..];
                    }
                    _ => {
                        // unknown label: emit the lead character literally
                        // and rescan one character later
                        if let Some(first) = src.chars().next() {
                            out.push(first);
                            src = &src[first.len_utf8()..];
                        }
                    }
                }
                continue;
            }

            // strong
            if let Some((consumed, content)) = scan_strong(src, self.rules.pedantic) {
                let inner = self.output(content);
                out.push_str(&self.renderer.strong(&inner));
                src = &src[consumed..];
                continue;
            }

            // emphasis
            if let Some((consumed, content)) = scan_em(src, self.rules.pedantic) {
                let inner = self.output(content);
                out.push_str(&self.renderer.em(&inner));
                src = &src[consumed..];
                continue;
            }

            // code span
            if let Some((consumed, content)) = scan_codespan(src) {
                out.push_str(&self.renderer.codespan(&escape(content, true)));
                src = &src[consumed..];
                continue;
            }

            // hard break, unless only whitespace remains
            if let Some(m) = self.rules.br.find(src) {
                if !src[m.end()..].trim().is_empty() {
                    out.push_str(&self.renderer.br(self.options));
                    src = &src[m.end()..];
                    continue;
                }
            }

            // strikethrough
            if let Some(cap) = self.rules.del.as_ref().and_then(|r| r.captures(src)) {
                let consumed = cap[0].len();
                let content = cap.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
                let inner = self.output(&content);
                out.push_str(&self.renderer.del(&inner));
                src = &src[consumed..];
                continue;
            }

            // plain text up to the next possible rule start
            let consumed = self.scan_text(src);
            let run = self.smartypants(&src[..consumed]);
            out.push_str(&self.renderer.text(&escape(&run, false)));
            src = &src[consumed..];
        }
        out
    }

    fn output_link(&mut self, image: bool, label: &str, link: &LinkRef) -> String {
        let href = escape(&link.href, false);
        let title = link.title.as_deref().map(|t| escape(t, false));
        if image {
            self.renderer
                .image(&href, title.as_deref(), &escape(label, false), self.options)
        } else {
            let text = self.with_in_link(|compiler| compiler.output(label));
            self.renderer
                .link(&href, title.as_deref(), &text, self.options)
        }
    }

    /// Run `f` with the in-link flag raised, restoring it afterwards so no
    /// path can leave it stuck.
    fn with_in_link<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::replace(&mut self.in_link, true);
        let result = f(self);
        self.in_link = saved;
        result
    }

    /// `[label](href "title")`, label scanned by bracket depth (longest
    /// candidate first, like a greedy match), the parenthesized part
    /// ending at the first `)`.
    fn scan_link(&self, src: &str) -> Option<(usize, bool, String, LinkRef)> {
        let (image, open) = link_open(src)?;
        let area = &src[open..];
        for close in label_closes(area).into_iter().rev() {
            let Some(rest) = area[close + 1..].strip_prefix('(') else {
                continue;
            };
            let Some(rp) = rest.find(')') else { continue };
            let Some(cap) = self.rules.link_inner.captures(&rest[..rp]) else {
                continue;
            };
            let href = cap.get(1).map(|m| m.as_str()).unwrap_or("").to_string();
            let title = cap.get(2).map(|m| m.as_str().to_string());
            let consumed = open + close + 2 + rp + 1;
            let label = area[1..close].to_string();
            return Some((consumed, image, label, LinkRef { href, title }));
        }
        None
    }

    /// `[label][key]`; an empty second pair falls back to the label.
    fn scan_reflink(&self, src: &str) -> Option<(usize, bool, String, String)> {
        let (image, open) = link_open(src)?;
        let area = &src[open..];
        for close in label_closes(area).into_iter().rev() {
            let Some(tail) = self.rules.reflink_tail.captures(&area[close + 1..]) else {
                continue;
            };
            let label = area[1..close].to_string();
            let second = tail.get(1).map(|m| m.as_str()).unwrap_or("");
            let key = if second.is_empty() {
                label.clone()
            } else {
                second.to_string()
            };
            let consumed = open + close + 1 + tail.get(0)?.end();
            return Some((consumed, image, label, key));
        }
        None
    }

    /// `[label]` with no trailing part.
    fn scan_nolink(&self, src: &str) -> Option<(usize, bool, String, String)> {
        let cap = self.rules.nolink.captures(src)?;
        let label = cap[1].to_string();
        Some((cap[0].len(), cap[0].starts_with('!'), label.clone(), label))
    }

    /// Length of the plain-text run: everything before the next character
    /// that could begin another inline rule.
    fn scan_text(&self, src: &str) -> usize {
        let mut iter = src.char_indices();
        iter.next();
        for (i, c) in iter {
            let special = match c {
                '\\' | '<' | '!' | '[' | '_' | '*' | '`' => true,
                '~' if self.rules.gfm => true,
                'h' if self.rules.gfm => {
                    src[i..].starts_with("http://") || src[i..].starts_with("https://")
                }
                '\n' if self.rules.breaks => true,
                ' ' => self.rules.br.is_match(&src[i..]),
                _ => false,
            };
            if special {
                return i;
            }
        }
        src.len()
    }

    /// Entity-mangle an email address, one numeric reference per character,
    /// randomly hex or decimal.
    fn mangle(&self, text: &str) -> String {
        if !self.options.mangle {
            return text.to_string();
        }
        let mut rng = rand::rng();
        let mut out = String::new();
        for ch in text.chars() {
            if rng.random::<bool>() {
                out.push_str(&format!("&#x{:x};", ch as u32));
            } else {
                out.push_str(&format!("&#{};", ch as u32));
            }
        }
        out
    }

    /// Typographic replacements, applied to plain text runs only:
    /// em dash, en dash, opening/closing singles, opening/closing doubles,
    /// ellipsis — in that order.
    fn smartypants(&self, text: &str) -> String {
        if !self.options.smartypants {
            return text.to_string();
        }
        let text = text.replace("---", "\u{2014}").replace("--", "\u{2013}");
        let text = OPENING_SINGLE.replace_all(&text, "${1}\u{2018}");
        let text = text.replace('\'', "\u{2019}");
        let text = OPENING_DOUBLE.replace_all(&text, "${1}\u{201c}");
        let text = text.replace('"', "\u{201d}");
        text.replace("...", "\u{2026}")
    }
}

fn link_open(src: &str) -> Option<(bool, usize)> {
    if src.starts_with("![") {
        Some((true, 1))
    } else if src.starts_with('[') {
        Some((false, 0))
    } else {
        None
    }
}

/// Offsets of `]` candidates that could close the label starting at
/// `area[0] == '['`. Bracket pairs inside the label are skipped.
fn label_closes(area: &str) -> Vec<usize> {
    let mut closes = Vec::new();
    let mut depth = 0usize;
    for (i, c) in area.char_indices().skip(1) {
        match c {
            '[' => depth += 1,
            ']' => {
                if depth > 0 {
                    depth -= 1;
                } else {
                    closes.push(i);
                }
            }
            _ => {}
        }
    }
    closes
}

/// `**text**` / `__text__`; the closing pair must not be followed by a
/// third delimiter character. Pedantic additionally requires non-space
/// content edges.
fn scan_strong(src: &str, pedantic: bool) -> Option<(usize, &str)> {
    let delim = if src.starts_with("__") {
        b'_'
    } else if src.starts_with("**") {
        b'*'
    } else {
        return None;
    };
    let bytes = src.as_bytes();
    let mut j = 3;
    while j + 1 < bytes.len() {
        if bytes[j] == delim && bytes[j + 1] == delim && bytes.get(j + 2) != Some(&delim) {
            let content = &src[2..j];
            if !pedantic || nonspace_edges(content) {
                return Some((j + 2, content));
            }
        }
        j += 1;
    }
    None
}

/// `_text_` / `*text*` emphasis. The `_` form treats `__` pairs as
/// content and closes only at a word boundary; the `*` form treats `**`
/// pairs as content, with a second pass that allows a close on the
/// trailing half of such a pair when the first pass finds nothing (the
/// original pattern backtracks into exactly that).
fn scan_em(src: &str, pedantic: bool) -> Option<(usize, &str)> {
    let bytes = src.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    if pedantic {
        let delim = match bytes[0] {
            b'_' => b'_',
            b'*' => b'*',
            _ => return None,
        };
        let mut j = 2;
        while j < bytes.len() {
            if bytes[j] == delim && bytes.get(j + 1) != Some(&delim) {
                let content = &src[1..j];
                if nonspace_edges(content) {
                    return Some((j + 1, content));
                }
            }
            j += 1;
        }
        return None;
    }

    match bytes[0] {
        b'_' => {
            let mut j = 1;
            while j < bytes.len() {
                if bytes[j] == b'_' {
                    let boundary = match src[j + 1..].chars().next() {
                        Some(c) => !c.is_ascii_alphanumeric() && c != '_',
                        None => true,
                    };
                    if j > 1 && boundary {
                        return Some((j + 1, &src[1..j]));
                    }
                    if bytes.get(j + 1) == Some(&b'_') {
                        j += 2;
                        continue;
                    }
                    return None;
                }
                j += 1;
            }
            None
        }
        b'*' => {
            // pass one: `**` pairs are opaque content units
            let mut pos = 1;
            while pos < bytes.len() {
                if pos > 1 && bytes[pos] == b'*' && bytes.get(pos + 1) != Some(&b'*') {
                    return Some((pos + 1, &src[1..pos]));
                }
                if bytes[pos] == b'*' && bytes.get(pos + 1) == Some(&b'*') {
                    pos += 2;
                } else {
                    pos += 1;
                }
            }
            // pass two: any `*` not followed by another may close
            let mut j = 2;
            while j < bytes.len() {
                if bytes[j] == b'*' && bytes.get(j + 1) != Some(&b'*') {
                    return Some((j + 1, &src[1..j]));
                }
                j += 1;
            }
            None
        }
        _ => None,
    }
}

fn nonspace_edges(content: &str) -> bool {
    let starts = content.chars().next().is_some_and(|c| !c.is_whitespace());
    let ends = content.chars().last().is_some_and(|c| !c.is_whitespace());
    starts && ends
}

/// `` `code` ``: the close is a backtick run of exactly the opening
/// length; surrounding whitespace is trimmed and the trimmed content must
/// be non-empty and not end in a backtick.
fn scan_codespan(src: &str) -> Option<(usize, &str)> {
    let n = src.bytes().take_while(|&b| b == b'`').count();
    if n == 0 {
        return None;
    }
    let bytes = src.as_bytes();
    let mut j = n;
    while j < bytes.len() {
        if bytes[j] != b'`' {
            j += 1;
            continue;
        }
        let mut run = 0;
        while j + run < bytes.len() && bytes[j + run] == b'`' {
            run += 1;
        }
        if run == n {
            let content = src[n..j].trim();
            if !content.is_empty() && !content.ends_with('`') {
                return Some((j + n, content));
            }
        }
        j += run;
    }
    None
}
