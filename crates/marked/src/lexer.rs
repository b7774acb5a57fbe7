//! Block-level lexer: raw markdown in, token stream + link table out.
//!
//! Rules are tried in a fixed priority order and the first match wins; each
//! match consumes a prefix of the remaining input, so every pass makes
//! progress. Container constructs (blockquotes, lists) re-enter
//! [`Lexer::tokenize`] on their inner text with start/end tokens
//! bracketing the recursion.

use regex::Captures;
use tracing::debug;

use crate::grammar::block::{
    block_tag_name, BlockRules, ALIGN_CENTER, ALIGN_LEFT, ALIGN_RIGHT, BLANK_LINE, BULLET_HEAD,
    CODE_INDENT, LIST_HR, QUOTE_HEAD, QUOTE_PREFIX, TRAILING_NEWLINES,
};
use crate::options::Options;
use crate::token::{Align, LinkRef, Links, Token};
use crate::{Error, Result};

pub struct Lexer<'a> {
    options: &'a Options,
    rules: &'static BlockRules,
    tokens: Vec<Token>,
    links: Links,
}

impl<'a> Lexer<'a> {
    pub fn new(options: &'a Options) -> Self {
        let rules = if options.gfm {
            if options.tables {
                BlockRules::tables()
            } else {
                BlockRules::gfm()
            }
        } else {
            BlockRules::normal()
        };
        Lexer {
            options,
            rules,
            tokens: Vec::new(),
            links: Links::new(),
        }
    }

    /// Tokenize a whole document.
    pub fn lex(src: &str, options: &'a Options) -> Result<(Vec<Token>, Links)> {
        let src = src
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\t', "    ")
            .replace('\u{00a0}', " ")
            .replace('\u{2424}', "\n");
        let mut lexer = Lexer::new(options);
        lexer.tokenize(&src, true, false)?;
        debug!(
            tokens = lexer.tokens.len(),
            links = lexer.links.len(),
            "lexed document"
        );
        Ok((lexer.tokens, lexer.links))
    }

    /// One pass of the block grammar, appending tokens. `top` marks the
    /// document level (paragraphs, tables and definitions only exist
    /// there); `bq` marks blockquote context (no definitions inside).
    fn tokenize(&mut self, src: &str, top: bool, bq: bool) -> Result<()> {
        let blanked = BLANK_LINE.replace_all(src, "");
        let mut src: &str = &blanked;

        while !src.is_empty() {
            // blank lines
            if let Some(m) = self.rules.newline.find(src) {
                if m.end() > 1 {
                    self.tokens.push(Token::Space);
                }
                src = &src[m.end()..];
                continue;
            }

            // indented code
            if let Some(m) = self.rules.code.find(src) {
                let text = CODE_INDENT.replace_all(m.as_str(), "");
                let text = if self.options.pedantic {
                    text.into_owned()
                } else {
                    TRAILING_NEWLINES.replace(&text, "").into_owned()
                };
                self.tokens.push(Token::Code {
                    text,
                    lang: None,
                    escaped: false,
                });
                src = &src[m.end()..];
                continue;
            }

            // fenced code
            if let Some((len, lang, text)) = self.scan_fences(src) {
                self.tokens.push(Token::Code {
                    text,
                    lang,
                    escaped: false,
                });
                src = &src[len..];
                continue;
            }

            // ATX heading
            if let Some(cap) = self.rules.heading.captures(src) {
                self.tokens.push(Token::Heading {
                    depth: cap[1].len(),
                    text: cap[2].to_string(),
                });
                src = &src[cap[0].len()..];
                continue;
            }

            // table without leading pipes
            if top {
                if let Some(cap) = self.rules.nptable.as_ref().and_then(|r| r.captures(src)) {
                    let len = cap[0].len();
                    let token = self.table_token(&cap, false);
                    self.tokens.push(token);
                    src = &src[len..];
                    continue;
                }
            }

            // setext heading
            if let Some(cap) = self.rules.lheading.captures(src) {
                self.tokens.push(Token::Heading {
                    depth: if &cap[2] == "=" { 1 } else { 2 },
                    text: cap[1].to_string(),
                });
                src = &src[cap[0].len()..];
                continue;
            }

            // horizontal rule
            if let Some(m) = self.rules.hr.find(src) {
                self.tokens.push(Token::Hr);
                src = &src[m.end()..];
                continue;
            }

            // blockquote
            if let Some(len) = self.scan_blockquote(src) {
                self.tokens.push(Token::BlockquoteStart);
                let inner = QUOTE_PREFIX.replace_all(&src[..len], "");
                // keep the current document-level state so definitions at
                // the top level still register, but never inside a quote
                self.tokenize(&inner, top, true)?;
                self.tokens.push(Token::BlockquoteEnd);
                src = &src[len..];
                continue;
            }

            // list
            if let Some((len, indent, bull)) = self.scan_list(src) {
                self.tokens.push(Token::ListStart {
                    ordered: bull.len() > 1,
                });
                let items = self.split_list_items(&src[..len], &indent);
                let count = items.len();
                let mut next_loose = false;
                let mut pushback: Option<String> = None;

                for (i, item) in items.iter().enumerate() {
                    let space = item.len();
                    let mut text = self.rules.bullet_strip.replace(item, "").into_owned();

                    // outdent by the marker's column width, unless the body
                    // holds indented continuation lines (a nested list)
                    if !text.contains("\n ") {
                        let width = space - text.len();
                        text = if self.options.pedantic {
                            outdent(&text, 4)
                        } else {
                            outdent(&text, width)
                        };
                    }

                    // a changed bullet style starts a fresh list with the
                    // remaining items
                    if self.options.smart_lists && i != count - 1 {
                        let next = items[i + 1];
                        let sibling = self
                            .rules
                            .bullet
                            .find(next)
                            .map(|m| m.as_str())
                            .unwrap_or("");
                        if bull != sibling && !(bull.len() > 1 && sibling.len() > 1) {
                            let mut rest = items[i + 1..].join("\n");
                            rest.push_str(&src[len..]);
                            pushback = Some(rest);
                        }
                    }

                    let last = i == count - 1 || pushback.is_some();
                    let mut loose = next_loose || loose_body(&text);
                    if !last {
                        next_loose = text.ends_with('\n');
                        if !loose {
                            loose = next_loose;
                        }
                    }

                    self.tokens.push(Token::ListItemStart { loose });
                    self.tokenize(&text, false, bq)?;
                    self.tokens.push(Token::ListItemEnd);

                    if pushback.is_some() {
                        break;
                    }
                }

                self.tokens.push(Token::ListEnd);
                match pushback {
                    Some(rest) => {
                        self.tokenize(&rest, top, bq)?;
                        return Ok(());
                    }
                    None => src = &src[len..],
                }
                continue;
            }

            // raw HTML
            if let Some((len, tag)) = self.scan_html(src) {
                let text = src[..len].to_string();
                if self.options.sanitize {
                    self.tokens.push(Token::Paragraph { text });
                } else {
                    let pre = self.options.sanitizer.is_none()
                        && matches!(tag.as_deref(), Some("pre" | "script" | "style"));
                    self.tokens.push(Token::Html { pre, text });
                }
                src = &src[len..];
                continue;
            }

            // link-reference definition
            if top && !bq {
                if let Some(cap) = self.rules.def.captures(src) {
                    self.links.insert(
                        cap[1].to_lowercase(),
                        LinkRef {
                            href: cap[2].to_string(),
                            title: cap.get(3).map(|m| m.as_str().to_string()),
                        },
                    );
                    src = &src[cap[0].len()..];
                    continue;
                }
            }

            // table with leading pipes
            if top {
                if let Some(cap) = self.rules.table.as_ref().and_then(|r| r.captures(src)) {
                    let len = cap[0].len();
                    let token = self.table_token(&cap, true);
                    self.tokens.push(token);
                    src = &src[len..];
                    continue;
                }
            }

            // paragraph
            if top {
                if let Some((len, text)) = self.scan_paragraph(src) {
                    self.tokens.push(Token::Paragraph { text });
                    src = &src[len..];
                    continue;
                }
            }

            // inline text (non-top contexts)
            if let Some(m) = self.rules.text.find(src) {
                self.tokens.push(Token::Text {
                    text: m.as_str().to_string(),
                });
                src = &src[m.end()..];
                continue;
            }

            return Err(Error::InfiniteLoop {
                near: src.chars().take(16).collect(),
            });
        }
        Ok(())
    }

    /// A fenced code block. The close is the exact opening fence string
    /// followed only by spaces and a newline (or end of input); anything
    /// between belongs to the body, trailing whitespace trimmed. An
    /// unclosed fence fails the rule.
    fn scan_fences(&self, src: &str) -> Option<(usize, Option<String>, String)> {
        let open = self.rules.fence_open.as_ref()?.captures(src)?;
        let fence = open.get(1)?.as_str();
        let lang = open.get(2).map(|m| m.as_str().to_string());
        let body_start = open.get(0)?.end();

        let mut at = body_start;
        while let Some(found) = src[at..].find(fence) {
            let close = at + found;
            let after = &src[close + fence.len()..];
            let tail = after.trim_start_matches(' ');
            if tail.is_empty() || tail.starts_with('\n') {
                let body = src[body_start..close].trim_end_matches(char::is_whitespace);
                let mut end = close + fence.len() + (after.len() - tail.len());
                while src[end..].starts_with('\n') {
                    end += 1;
                }
                return Some((end, lang, body.to_string()));
            }
            at = close + 1;
        }
        None
    }

    /// A blockquote: chunks of `> `-prefixed lines, each followed by
    /// unprefixed continuation lines (except link definitions) and blank
    /// lines.
    fn scan_blockquote(&self, src: &str) -> Option<usize> {
        let mut pos = 0;
        while let Some(head) = QUOTE_HEAD.find(&src[pos..]) {
            let mut end = pos + head.end();
            while src[end..].starts_with('\n') {
                let rest = &src[end + 1..];
                if rest.is_empty() || rest.starts_with('\n') {
                    break;
                }
                if self.rules.def.is_match(rest) {
                    break;
                }
                let line = rest.find('\n').unwrap_or(rest.len());
                end += 1 + line;
            }
            while src[end..].starts_with('\n') {
                end += 1;
            }
            pos = end;
        }
        (pos > 0).then_some(pos)
    }

    /// The extent of a list block plus its first marker's indent and
    /// bullet. The block runs until a blank-line boundary followed by a
    /// horizontal rule, a link definition, or (after two or more blank
    /// lines) anything that is not an indented line or a sibling item;
    /// otherwise it takes the rest of the input.
    fn scan_list(&self, src: &str) -> Option<(usize, String, String)> {
        let head = self.rules.item_head.captures(src)?;
        let indent = head[1].to_string();
        let bullet = head[2].to_string();
        let content_start = head.get(0)?.end();
        if content_start >= src.len() {
            return None;
        }

        let bytes = src.as_bytes();
        let mut pos = content_start + 1;
        while pos < src.len() {
            if bytes[pos] != b'\n' {
                pos += 1;
                continue;
            }
            let mut run_end = pos;
            while run_end < src.len() && bytes[run_end] == b'\n' {
                run_end += 1;
            }
            let run = run_end - pos;
            let after = &src[run_end..];

            if self.hr_follows(after, &indent) {
                return Some((run_end, indent, bullet));
            }
            if self.rules.def.is_match(after) {
                return Some((run_end, indent, bullet));
            }
            if after.is_empty() {
                return Some((src.len(), indent, bullet));
            }
            if run >= 2 && !after.starts_with(' ') && !self.sibling_item(after, &indent) {
                return Some((run_end, indent, bullet));
            }
            pos = run_end;
        }
        Some((src.len(), indent, bullet))
    }

    fn hr_follows(&self, after: &str, indent: &str) -> bool {
        if LIST_HR.is_match(after) {
            return true;
        }
        !indent.is_empty()
            && after
                .strip_prefix(indent)
                .is_some_and(|rest| LIST_HR.is_match(rest))
    }

    fn sibling_item(&self, after: &str, indent: &str) -> bool {
        after
            .strip_prefix(indent)
            .is_some_and(|rest| BULLET_HEAD.is_match(rest))
    }

    /// Split a list block into item texts. A line begins a new item only
    /// when it carries the block's exact indent and a bullet; every other
    /// line (blank, deeper, shallower) continues the current item. Items
    /// keep a trailing newline when a blank line ends them, which is what
    /// looseness detection keys on.
    fn split_list_items<'s>(&self, text: &'s str, indent: &str) -> Vec<&'s str> {
        let mut items = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let rest = &text[pos..];
            let first = rest.find('\n').unwrap_or(rest.len());
            let mut end = pos + first;
            while end < text.len() {
                let line_start = end + 1;
                let line = &text[line_start..];
                if self.sibling_item(line, indent) {
                    break;
                }
                let len = line.find('\n').unwrap_or(line.len());
                end = line_start + len;
            }
            items.push(&text[pos..end]);
            pos = if end < text.len() { end + 1 } else { end };
        }
        items
    }

    /// A raw HTML block: a comment, a closed non-phrasing tag, or a
    /// self-contained open tag, each ending at a blank line or end of
    /// input (a single newline suffices after a comment). Returns the
    /// consumed length and the tag name for closed blocks.
    fn scan_html(&self, src: &str) -> Option<(usize, Option<String>)> {
        let spaces = src.len() - src.trim_start_matches(' ').len();
        let rest = &src[spaces..];

        if let Some(body) = rest.strip_prefix("<!--") {
            let close = body.find("-->")?;
            let end = spaces + 4 + close + 3;
            let len = html_tail(src, end, true)?;
            return Some((len, None));
        }

        if !rest.starts_with('<') {
            return None;
        }
        let name = block_tag_name(&rest[1..])?;

        // closed form first: `<name ...> ... </name>`
        let closer = format!("</{name}>");
        if let Some(at) = rest.find(&closer) {
            if at > 1 + name.len() {
                let end = spaces + at + closer.len();
                if let Some(len) = html_tail(src, end, false) {
                    return Some((len, Some(name.to_string())));
                }
            }
        }

        // a single self-contained open tag
        let name_end = 1 + name.len();
        let attrs = scan_tag_attrs(&rest[name_end..])?;
        let end = spaces + name_end + attrs;
        let len = html_tail(src, end, false)?;
        Some((len, None))
    }

    /// A top-level paragraph: the first line unconditionally, then lines
    /// until a blank line or a construct that interrupts a paragraph.
    fn scan_paragraph(&self, src: &str) -> Option<(usize, String)> {
        let first = src.find('\n').unwrap_or(src.len());
        if first == 0 {
            return None;
        }
        let mut end = first;
        while end < src.len() {
            let rest = &src[end + 1..];
            if rest.is_empty() || rest.starts_with('\n') {
                break;
            }
            if self.interrupts_paragraph(rest) {
                break;
            }
            let line = rest.find('\n').unwrap_or(rest.len());
            end += 1 + line;
        }
        let text = src[..end].to_string();
        let mut len = end;
        while src[len..].starts_with('\n') {
            len += 1;
        }
        Some((len, text))
    }

    fn interrupts_paragraph(&self, rest: &str) -> bool {
        if self.scan_fences(rest).is_some() {
            return true;
        }
        if self.rules.gfm && self.rules.item_head.is_match(rest) {
            return true;
        }
        self.rules.hr.is_match(rest)
            || self.rules.heading.is_match(rest)
            || self.rules.lheading.is_match(rest)
            || QUOTE_HEAD.is_match(rest)
            || (rest.starts_with('<') && block_tag_name(&rest[1..]).is_some())
            || self.rules.def.is_match(rest)
    }

    /// Assemble a table token from the three captured rows: header,
    /// separator, body. `piped` tables carry leading/trailing pipes that
    /// are stripped per row.
    fn table_token(&self, cap: &Captures<'_>, piped: bool) -> Token {
        let header = split_cells(trim_row(&cap[1], false));
        let align = split_cells(trim_row(&cap[2], false))
            .iter()
            .map(|cell| classify_align(cell))
            .collect();
        let mut cells = Vec::new();
        for line in cap[3].trim_end_matches('\n').split('\n') {
            if line.is_empty() {
                continue;
            }
            cells.push(split_cells(trim_row(line, piped)));
        }
        Token::Table {
            header,
            align,
            cells,
        }
    }
}

/// Remove up to `max` leading spaces from every line.
fn outdent(text: &str, max: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let spaces = line.len() - line.trim_start_matches(' ').len();
        out.push_str(&line[spaces.min(max)..]);
    }
    out
}

/// An interior blank line (one not just padding the end) makes an item
/// loose.
fn loose_body(item: &str) -> bool {
    let mut from = 0;
    while let Some(found) = item[from..].find("\n\n") {
        let at = from + found;
        if !item[at + 2..].trim().is_empty() {
            return true;
        }
        from = at + 1;
    }
    false
}

/// Trailing content after an HTML construct: optional spaces, then a blank
/// line (a single newline when `comment`) or nothing but whitespace to the
/// end of input.
fn html_tail(src: &str, end: usize, comment: bool) -> Option<usize> {
    let rest = &src[end..];
    let spaces = rest.len() - rest.trim_start_matches(' ').len();
    let after = &rest[spaces..];
    if comment {
        if after.starts_with('\n') {
            return Some(end + spaces + 1);
        }
    } else if after.starts_with("\n\n") {
        let mut stop = end + spaces;
        while src[stop..].starts_with('\n') {
            stop += 1;
        }
        return Some(stop);
    }
    if after.trim().is_empty() {
        return Some(src.len());
    }
    None
}

/// The attribute section of a tag, quote-aware, up to and including `>`.
fn scan_tag_attrs(s: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '>' => return Some(i + 1),
            '"' | '\'' => loop {
                match chars.next() {
                    Some((_, q)) if q == c => break,
                    Some(_) => {}
                    None => return None,
                }
            },
            _ => {}
        }
    }
    None
}

/// Strip `^ *` and a trailing ` *| *` from a table row; `leading_pipe`
/// rows lose a leading `| ` as well.
fn trim_row(row: &str, leading_pipe: bool) -> &str {
    let mut row = row.trim_start_matches(' ');
    if leading_pipe {
        if let Some(stripped) = row.strip_prefix('|') {
            row = stripped.trim_start_matches(' ');
        }
    }
    let mut row = row.trim_end_matches(' ');
    if let Some(stripped) = row.strip_suffix('|') {
        row = stripped.trim_end_matches(' ');
    }
    row
}

/// Split a table row on unescaped pipes, trimming each cell; `\|` yields a
/// literal pipe inside a cell.
fn split_cells(row: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = row.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'|') {
            chars.next();
            cell.push('|');
        } else if c == '|' {
            cells.push(cell.trim().to_string());
            cell = String::new();
        } else {
            cell.push(c);
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

fn classify_align(cell: &str) -> Option<Align> {
    if ALIGN_RIGHT.is_match(cell) {
        Some(Align::Right)
    } else if ALIGN_CENTER.is_match(cell) {
        Some(Align::Center)
    } else if ALIGN_LEFT.is_match(cell) {
        Some(Align::Left)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(src: &str) -> Vec<Token> {
        let options = Options::default();
        Lexer::lex(src, &options).unwrap().0
    }

    #[test]
    fn test_atx_heading() {
        assert_eq!(
            lex("# Hello"),
            vec![Token::Heading {
                depth: 1,
                text: "Hello".to_string()
            }]
        );
        assert_eq!(
            lex("### Deep ###"),
            vec![Token::Heading {
                depth: 3,
                text: "Deep".to_string()
            }]
        );
    }

    #[test]
    fn test_setext_heading() {
        assert_eq!(
            lex("Hello\n====="),
            vec![Token::Heading {
                depth: 1,
                text: "Hello".to_string()
            }]
        );
        assert_eq!(
            lex("World\n-----"),
            vec![Token::Heading {
                depth: 2,
                text: "World".to_string()
            }]
        );
    }

    #[test]
    fn test_indented_code_trims_trailing_blank_lines() {
        assert_eq!(
            lex("    let x;\n    let y;\n\n"),
            vec![Token::Code {
                text: "let x;\nlet y;".to_string(),
                lang: None,
                escaped: false
            }]
        );
    }

    #[test]
    fn test_pedantic_code_keeps_trailing_blank_lines() {
        let mut options = Options::default();
        options.pedantic = true;
        let (tokens, _) = Lexer::lex("    a\n\n", &options).unwrap();
        assert_eq!(
            tokens,
            vec![Token::Code {
                text: "a\n\n".to_string(),
                lang: None,
                escaped: false
            }]
        );
    }

    #[test]
    fn test_pedantic_outdent_fixed_at_four_columns() {
        assert_eq!(outdent("      deep\nplain", 4), "  deep\nplain");
        let mut options = Options::default();
        options.pedantic = true;
        let (tokens, _) = Lexer::lex("*  a\n*  b\n", &options).unwrap();
        assert_eq!(tokens[0], Token::ListStart { ordered: false });
        assert_eq!(
            tokens[2],
            Token::Text {
                text: "a".to_string()
            }
        );
    }

    #[test]
    fn test_fenced_code_with_language() {
        assert_eq!(
            lex("```js\nvar x = 1;\n```\n"),
            vec![Token::Code {
                text: "var x = 1;".to_string(),
                lang: Some("js".to_string()),
                escaped: false
            }]
        );
    }

    #[test]
    fn test_fence_body_may_hold_other_fences() {
        assert_eq!(
            lex("~~~\ncode with ``` inside\n~~~\n"),
            vec![Token::Code {
                text: "code with ``` inside".to_string(),
                lang: None,
                escaped: false
            }]
        );
    }

    #[test]
    fn test_unclosed_fence_falls_through() {
        let tokens = lex("```\ncode");
        assert!(matches!(tokens[0], Token::Paragraph { .. }));
    }

    #[test]
    fn test_hr() {
        assert_eq!(lex("* * *\n"), vec![Token::Hr]);
        assert_eq!(lex("---\n"), vec![Token::Hr]);
    }

    #[test]
    fn test_blockquote_wraps_paragraph() {
        assert_eq!(
            lex("> quoted text\n"),
            vec![
                Token::BlockquoteStart,
                Token::Paragraph {
                    text: "quoted text".to_string()
                },
                Token::BlockquoteEnd,
            ]
        );
    }

    #[test]
    fn test_blockquote_lazy_continuation() {
        assert_eq!(
            lex("> line one\nline two\n"),
            vec![
                Token::BlockquoteStart,
                Token::Paragraph {
                    text: "line one\nline two".to_string()
                },
                Token::BlockquoteEnd,
            ]
        );
    }

    #[test]
    fn test_tight_list() {
        assert_eq!(
            lex("- a\n- b\n"),
            vec![
                Token::ListStart { ordered: false },
                Token::ListItemStart { loose: false },
                Token::Text {
                    text: "a".to_string()
                },
                Token::ListItemEnd,
                Token::ListItemStart { loose: false },
                Token::Text {
                    text: "b".to_string()
                },
                Token::ListItemEnd,
                Token::ListEnd,
            ]
        );
    }

    #[test]
    fn test_loose_list_marks_every_item() {
        let tokens = lex("- a\n\n- b\n");
        let loose: Vec<bool> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::ListItemStart { loose } => Some(*loose),
                _ => None,
            })
            .collect();
        assert_eq!(loose, vec![true, true]);
    }

    #[test]
    fn test_ordered_list() {
        let tokens = lex("1. one\n2. two\n");
        assert_eq!(tokens[0], Token::ListStart { ordered: true });
    }

    #[test]
    fn test_nested_list_keeps_indent() {
        assert_eq!(
            lex("- a\n  - b\n"),
            vec![
                Token::ListStart { ordered: false },
                Token::ListItemStart { loose: false },
                Token::Text {
                    text: "a".to_string()
                },
                Token::ListStart { ordered: false },
                Token::ListItemStart { loose: false },
                Token::Text {
                    text: "b".to_string()
                },
                Token::ListItemEnd,
                Token::ListEnd,
                Token::ListItemEnd,
                Token::ListEnd,
            ]
        );
    }

    #[test]
    fn test_smart_lists_split_on_bullet_change() {
        let mut options = Options::default();
        options.smart_lists = true;
        let (tokens, _) = Lexer::lex("* a\n1. b\n", &options).unwrap();
        let starts: Vec<&Token> = tokens
            .iter()
            .filter(|t| matches!(t, Token::ListStart { .. }))
            .collect();
        assert_eq!(
            starts,
            vec![
                &Token::ListStart { ordered: false },
                &Token::ListStart { ordered: true }
            ]
        );
    }

    #[test]
    fn test_definition_collected_not_emitted() {
        let options = Options::default();
        let (tokens, links) = Lexer::lex("[Foo]: /url \"Title\"\n", &options).unwrap();
        assert!(tokens.is_empty());
        assert_eq!(
            links.get("foo"),
            Some(&LinkRef {
                href: "/url".to_string(),
                title: Some("Title".to_string())
            })
        );
    }

    #[test]
    fn test_no_definition_inside_blockquote() {
        let options = Options::default();
        let (_, links) = Lexer::lex("> [foo]: /url\n", &options).unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn test_piped_table() {
        let tokens = lex("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        assert_eq!(
            tokens,
            vec![Token::Table {
                header: vec!["a".to_string(), "b".to_string()],
                align: vec![Some(Align::Left), Some(Align::Right)],
                cells: vec![vec!["1".to_string(), "2".to_string()]],
            }]
        );
    }

    #[test]
    fn test_nptable() {
        let tokens = lex("a | b\n:-: | ---\n1 | 2\n");
        assert_eq!(
            tokens,
            vec![Token::Table {
                header: vec!["a".to_string(), "b".to_string()],
                align: vec![Some(Align::Center), None],
                cells: vec![vec!["1".to_string(), "2".to_string()]],
            }]
        );
    }

    #[test]
    fn test_escaped_pipe_stays_in_cell() {
        let tokens = lex("| a \\| b | c |\n| --- | --- |\n| 1 | 2 |\n");
        match &tokens[0] {
            Token::Table { header, .. } => {
                assert_eq!(header[0], "a | b");
                assert_eq!(header[1], "c");
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_html_block() {
        assert_eq!(
            lex("<div>\n<span>x</span>\n</div>\n\nafter\n"),
            vec![
                Token::Html {
                    pre: false,
                    text: "<div>\n<span>x</span>\n</div>\n\n".to_string()
                },
                Token::Paragraph {
                    text: "after".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_html_pre_flag() {
        let tokens = lex("<pre>raw</pre>\n");
        assert_eq!(
            tokens,
            vec![Token::Html {
                pre: true,
                text: "<pre>raw</pre>\n".to_string()
            }]
        );
    }

    #[test]
    fn test_html_sanitize_downgrades_to_paragraph() {
        let mut options = Options::default();
        options.sanitize = true;
        let (tokens, _) = Lexer::lex("<div>x</div>\n", &options).unwrap();
        assert!(matches!(tokens[0], Token::Paragraph { .. }));
    }

    #[test]
    fn test_paragraph_interrupted_by_heading() {
        assert_eq!(
            lex("text\n# head\n"),
            vec![
                Token::Paragraph {
                    text: "text".to_string()
                },
                Token::Heading {
                    depth: 1,
                    text: "head".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_blank_run_between_paragraphs() {
        let tokens = lex("a\n\n\nb\n");
        assert_eq!(
            tokens,
            vec![
                Token::Paragraph {
                    text: "a".to_string()
                },
                Token::Paragraph {
                    text: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_preprocessing_normalizes_line_endings_and_tabs() {
        assert_eq!(
            lex("\tcode\r\n"),
            vec![Token::Code {
                text: "code".to_string(),
                lang: None,
                escaped: false
            }]
        );
    }
}
