//! The rendering capability set.
//!
//! One method per construct; each receives already-compiled child content
//! and returns a finished fragment. The default method bodies produce
//! HTML5, so a custom renderer overrides only the constructs it changes
//! and [`Html`] is just the trait with nothing overridden.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::escape::{escape, unescape};
use crate::options::{Highlighter, Options};
use crate::token::Align;

/// Non-word runs collapsed into the heading id slug.
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]+").unwrap());

/// Position of one table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFlags {
    pub header: bool,
    pub align: Option<Align>,
}

pub trait Renderer {
    fn code(&self, code: &str, lang: Option<&str>, escaped: bool, options: &Options) -> String {
        let mut code = code.to_string();
        let mut escaped = escaped;
        if let Some(Highlighter::Sync(highlight)) = &options.highlight {
            // any non-null return counts as highlighted, even an identical
            // one; it is emitted verbatim
            if let Some(replaced) = highlight(&code, lang) {
                code = replaced;
                escaped = true;
            }
        }
        let body = if escaped { code } else { escape(&code, true) };
        match lang {
            Some(lang) if !lang.is_empty() => format!(
                "<pre><code class=\"{}{}\">{}\n</code></pre>\n",
                options.lang_prefix,
                escape(lang, true),
                body
            ),
            _ => format!("<pre><code>{body}\n</code></pre>"),
        }
    }

    fn blockquote(&self, quote: &str) -> String {
        format!("<blockquote>\n{quote}</blockquote>\n")
    }

    fn html(&self, html: &str) -> String {
        html.to_string()
    }

    fn heading(&self, text: &str, level: usize, raw: &str, options: &Options) -> String {
        format!(
            "<h{level} id=\"{}{}\">{text}</h{level}>\n",
            options.header_prefix,
            NON_WORD.replace_all(&raw.to_lowercase(), "-"),
        )
    }

    fn hr(&self, options: &Options) -> String {
        if options.xhtml {
            "<hr/>\n".to_string()
        } else {
            "<hr>\n".to_string()
        }
    }

    fn list(&self, body: &str, ordered: bool) -> String {
        let tag = if ordered { "ol" } else { "ul" };
        format!("<{tag}>\n{body}</{tag}>\n")
    }

    fn list_item(&self, text: &str) -> String {
        format!("<li>{text}</li>\n")
    }

    fn paragraph(&self, text: &str) -> String {
        format!("<p>{text}</p>\n")
    }

    fn table(&self, header: &str, body: &str) -> String {
        format!("<table>\n<thead>\n{header}</thead>\n<tbody>\n{body}</tbody>\n</table>\n")
    }

    fn table_row(&self, content: &str) -> String {
        format!("<tr>\n{content}</tr>\n")
    }

    fn table_cell(&self, content: &str, flags: CellFlags) -> String {
        let tag = if flags.header { "th" } else { "td" };
        match flags.align {
            Some(align) => format!(
                "<{tag} style=\"text-align:{}\">{content}</{tag}>\n",
                align.as_str()
            ),
            None => format!("<{tag}>{content}</{tag}>\n"),
        }
    }

    fn strong(&self, text: &str) -> String {
        format!("<strong>{text}</strong>")
    }

    fn em(&self, text: &str) -> String {
        format!("<em>{text}</em>")
    }

    fn codespan(&self, text: &str) -> String {
        format!("<code>{text}</code>")
    }

    fn br(&self, options: &Options) -> String {
        if options.xhtml {
            "<br/>".to_string()
        } else {
            "<br>".to_string()
        }
    }

    fn del(&self, text: &str) -> String {
        format!("<del>{text}</del>")
    }

    fn link(&self, href: &str, title: Option<&str>, text: &str, options: &Options) -> String {
        if options.sanitize && !safe_url(href, true) {
            return String::new();
        }
        let mut out = format!("<a href=\"{href}\"");
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            out.push_str(&format!(" title=\"{title}\""));
        }
        out.push('>');
        out.push_str(text);
        out.push_str("</a>");
        out
    }

    fn image(&self, href: &str, title: Option<&str>, text: &str, options: &Options) -> String {
        if options.sanitize && !safe_url(href, false) {
            return String::new();
        }
        let mut out = format!("<img src=\"{href}\" alt=\"{text}\"");
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            out.push_str(&format!(" title=\"{title}\""));
        }
        out.push_str(if options.xhtml { "/>" } else { ">" });
        out
    }

    fn text(&self, text: &str) -> String {
        text.to_string()
    }
}

/// The built-in HTML renderer.
pub struct Html;

impl Renderer for Html {}

/// Scheme check for sanitize mode: entity- and percent-decode the address,
/// keep only word characters and colons, lowercase, then refuse
/// `javascript:` and `vbscript:` (and `data:` for links). A malformed
/// percent escape refuses the address too.
fn safe_url(href: &str, deny_data: bool) -> bool {
    let unescaped = unescape(href);
    let decoded = match percent_decode_str(&unescaped).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => return false,
    };
    let prot: String = decoded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ':')
        .collect::<String>()
        .to_lowercase();
    if prot.starts_with("javascript:") || prot.starts_with("vbscript:") {
        return false;
    }
    if deny_data && prot.starts_with("data:") {
        return false;
    }
    true
}
