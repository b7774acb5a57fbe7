//! The block token stream and the link-reference side table.

use indexmap::IndexMap;

/// Column alignment parsed from a table separator cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    /// The CSS `text-align` keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// A link-reference definition collected while lexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    pub href: String,
    pub title: Option<String>,
}

/// Label → definition table. Keys are lowercased on insert; lookups
/// additionally collapse internal whitespace. Insertion-ordered so
/// diagnostics stay deterministic.
pub type Links = IndexMap<String, LinkRef>;

/// One structural unit of the document, produced in document order.
///
/// Container constructs are bracketed: every `*Start` is matched by a
/// later `*End`, and everything between belongs to the container.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A run of two or more blank lines.
    Space,
    /// Indented or fenced code. `escaped` marks text that is already safe
    /// to emit (a highlighter replaced it).
    Code {
        text: String,
        lang: Option<String>,
        escaped: bool,
    },
    Heading {
        depth: usize,
        text: String,
    },
    Table {
        header: Vec<String>,
        align: Vec<Option<Align>>,
        cells: Vec<Vec<String>>,
    },
    Hr,
    BlockquoteStart,
    BlockquoteEnd,
    ListStart {
        ordered: bool,
    },
    ListEnd,
    /// `loose` items wrap their text in paragraphs when rendered.
    ListItemStart {
        loose: bool,
    },
    ListItemEnd,
    /// A raw HTML block. `pre` suppresses inline compilation of the body.
    Html {
        pre: bool,
        text: String,
    },
    Paragraph {
        text: String,
    },
    /// Inline-level text inside a non-top-level context (list items,
    /// blockquotes).
    Text {
        text: String,
    },
}

impl Token {
    /// Short tag name for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Token::Space => "space",
            Token::Code { .. } => "code",
            Token::Heading { .. } => "heading",
            Token::Table { .. } => "table",
            Token::Hr => "hr",
            Token::BlockquoteStart => "blockquote_start",
            Token::BlockquoteEnd => "blockquote_end",
            Token::ListStart { .. } => "list_start",
            Token::ListEnd => "list_end",
            Token::ListItemStart { .. } => "list_item_start",
            Token::ListItemEnd => "list_item_end",
            Token::Html { .. } => "html",
            Token::Paragraph { .. } => "paragraph",
            Token::Text { .. } => "text",
        }
    }
}
