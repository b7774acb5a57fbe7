//! Block-level grammar: three variants (normal, GFM, GFM+tables).

use once_cell::sync::Lazy;
use regex::Regex;

use super::{expand, re};

/// The shared list-bullet fragment.
pub(crate) const BULLET: &str = r"(?:[*+-]|\d+\.)";

/// Phrasing tags that never open a raw HTML block.
const INLINE_TAGS: &[&str] = &[
    "a", "em", "strong", "small", "s", "cite", "q", "dfn", "abbr", "data", "time", "code", "var",
    "samp", "kbd", "sub", "sup", "i", "b", "u", "mark", "ruby", "rt", "rp", "bdi", "bdo", "span",
    "br", "wbr", "ins", "del", "img",
];

/// Whitespace-only lines, blanked before each tokenize pass.
pub(crate) static BLANK_LINE: Lazy<Regex> = Lazy::new(|| re(r"(?m)^ +$"));

/// The 4-space prefix of an indented code line.
pub(crate) static CODE_INDENT: Lazy<Regex> = Lazy::new(|| re(r"(?m)^ {4}"));

pub(crate) static TRAILING_NEWLINES: Lazy<Regex> = Lazy::new(|| re(r"\n+$"));

/// First line of a blockquote chunk.
pub(crate) static QUOTE_HEAD: Lazy<Regex> = Lazy::new(|| re(r"^ *>[^\n]+"));

/// The `> ` marker stripped from every quoted line.
pub(crate) static QUOTE_PREFIX: Lazy<Regex> = Lazy::new(|| re(r"(?m)^ *> ?"));

/// A horizontal rule as it appears after a list (spaces trail the marks).
pub(crate) static LIST_HR: Lazy<Regex> = Lazy::new(|| re(r"^(?:[-*_] *){3,}(?:\n+|$)"));

/// A bullet marker with its required trailing space.
pub(crate) static BULLET_HEAD: Lazy<Regex> =
    Lazy::new(|| re(&expand(r"^bull ", &[("bull", BULLET)])));

static TAG_NAME: Lazy<Regex> = Lazy::new(|| re(r"^\w+"));
static EMAILISH: Lazy<Regex> = Lazy::new(|| re(r"^[^\w\s@]*@"));

/// Table separator cells.
pub(crate) static ALIGN_RIGHT: Lazy<Regex> = Lazy::new(|| re(r"^ *-+: *$"));
pub(crate) static ALIGN_CENTER: Lazy<Regex> = Lazy::new(|| re(r"^ *:-+: *$"));
pub(crate) static ALIGN_LEFT: Lazy<Regex> = Lazy::new(|| re(r"^ *:-+ *$"));

/// The tag name opening a raw HTML block, if `rest` (the input just after
/// a `<`) starts one: a word that is not a phrasing tag and is not part of
/// an autolink-looking `scheme:/` or `user@host` sequence.
pub(crate) fn block_tag_name(rest: &str) -> Option<&str> {
    let m = TAG_NAME.find(rest)?;
    let name = m.as_str();
    if INLINE_TAGS.contains(&name) {
        return None;
    }
    let after = &rest[m.end()..];
    if after.starts_with(":/") || EMAILISH.is_match(after) {
        return None;
    }
    Some(name)
}

/// One block-grammar variant. `fence_open`, `nptable` and `table` are
/// `None` in variants that do not support the construct.
pub struct BlockRules {
    pub newline: Regex,
    pub code: Regex,
    /// The opening fence line; the close is found by a scanner.
    pub fence_open: Option<Regex>,
    pub hr: Regex,
    pub heading: Regex,
    pub lheading: Regex,
    pub def: Regex,
    pub nptable: Option<Regex>,
    pub table: Option<Regex>,
    pub text: Regex,
    /// Unanchored bullet fragment, used to compare sibling bullets.
    pub bullet: Regex,
    /// `^( *)(bullet) ` — the line that opens a list or item.
    pub item_head: Regex,
    /// The marker stripped off the front of an item's text.
    pub bullet_strip: Regex,
    pub gfm: bool,
}

impl BlockRules {
    fn build(gfm: bool, tables: bool) -> Self {
        let heading = if gfm {
            // GFM requires whitespace between the `#` run and the text
            r"^ *(#{1,6}) +([^\n]+?) *#* *(?:\n+|$)"
        } else {
            r"^ *(#{1,6}) *([^\n]+?) *#* *(?:\n+|$)"
        };
        BlockRules {
            newline: re(r"^\n+"),
            code: re(r"^( {4}[^\n]+\n*)+"),
            fence_open: gfm.then(|| re(r"^ *(`{3,}|~{3,})[ .]*(\S+)? *\n")),
            hr: re(r"^( *[-*_]){3,} *(?:\n+|$)"),
            heading: re(heading),
            lheading: re(r"^([^\n]+)\n *(=|-){2,} *(?:\n+|$)"),
            def: re(r#"^ *\[([^\]]+)\]: *<?([^\s>]+)>?(?: +["(]([^\n]+)[")])? *(?:\n+|$)"#),
            nptable: tables
                .then(|| re(r"^ *(\S.*\|.*)\n *([-:]+ *\|[-| :]*)\n((?:.*\|.*(?:\n|$))*)\n*")),
            table: tables
                .then(|| re(r"^ *\|(.+)\n *\|( *[-:]+[-| :]*)\n((?: *\|.*(?:\n|$))*)\n*")),
            text: re(r"^[^\n]+"),
            bullet: re(BULLET),
            item_head: re(&expand(r"^( *)(bull) ", &[("bull", BULLET)])),
            bullet_strip: re(r"^ *([*+-]|\d+\.) +"),
            gfm,
        }
    }

    pub fn normal() -> &'static BlockRules {
        static RULES: Lazy<BlockRules> = Lazy::new(|| BlockRules::build(false, false));
        &RULES
    }

    pub fn gfm() -> &'static BlockRules {
        static RULES: Lazy<BlockRules> = Lazy::new(|| BlockRules::build(true, false));
        &RULES
    }

    pub fn tables() -> &'static BlockRules {
        static RULES: Lazy<BlockRules> = Lazy::new(|| BlockRules::build(true, true));
        &RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_gating() {
        assert!(BlockRules::normal().fence_open.is_none());
        assert!(BlockRules::normal().table.is_none());
        assert!(BlockRules::gfm().fence_open.is_some());
        assert!(BlockRules::gfm().table.is_none());
        assert!(BlockRules::tables().table.is_some());
        assert!(BlockRules::tables().nptable.is_some());
    }

    #[test]
    fn test_heading_space_requirement() {
        assert!(BlockRules::normal().heading.is_match("#Hello"));
        assert!(!BlockRules::gfm().heading.is_match("#Hello"));
        assert!(BlockRules::gfm().heading.is_match("# Hello"));
    }

    #[test]
    fn test_item_head_captures_indent_and_bullet() {
        let rules = BlockRules::tables();
        let cap = rules.item_head.captures("  2. item").unwrap();
        assert_eq!(&cap[1], "  ");
        assert_eq!(&cap[2], "2.");
        assert!(rules.item_head.captures("text").is_none());
    }

    #[test]
    fn test_def_captures() {
        let rules = BlockRules::tables();
        let cap = rules.def.captures("[Foo]: </url> \"Title\"\n").unwrap();
        assert_eq!(&cap[1], "Foo");
        assert_eq!(&cap[2], "/url");
        assert_eq!(&cap[3], "Title");

        let cap = rules.def.captures("[bar]: http://x.y\n").unwrap();
        assert_eq!(&cap[2], "http://x.y");
        assert!(cap.get(3).is_none());
    }

    #[test]
    fn test_block_tag_name_guards() {
        assert_eq!(block_tag_name("div class=\"x\">"), Some("div"));
        assert_eq!(block_tag_name("em>text"), None);
        assert_eq!(block_tag_name("http://x.y>"), None);
        assert_eq!(block_tag_name("user@host>"), None);
    }

    #[test]
    fn test_hr_variants() {
        let rules = BlockRules::tables();
        assert!(rules.hr.is_match("---\n"));
        assert!(rules.hr.is_match("* * *\n"));
        assert!(!rules.hr.is_match("--\n"));
    }
}
