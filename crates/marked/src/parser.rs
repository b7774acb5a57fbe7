//! Token-stream parser: walks the block tokens front to back, handing
//! inline text to the inline compiler and markup production to the
//! renderer.

use tracing::debug;

use crate::inline::InlineCompiler;
use crate::options::Options;
use crate::renderer::{CellFlags, Renderer};
use crate::token::{Links, Token};
use crate::{Error, Result};

pub struct Parser<'a> {
    /// Reversed at construction; consumed by popping off the back.
    tokens: Vec<Token>,
    options: &'a Options,
    renderer: &'a dyn Renderer,
    inline: InlineCompiler<'a>,
}

impl<'a> Parser<'a> {
    /// Render a token stream to HTML.
    pub fn parse(
        mut tokens: Vec<Token>,
        links: &'a Links,
        options: &'a Options,
        renderer: &'a dyn Renderer,
    ) -> Result<String> {
        tokens.reverse();
        let mut parser = Parser {
            tokens,
            options,
            renderer,
            inline: InlineCompiler::new(links, options, renderer),
        };
        let mut out = String::new();
        while let Some(token) = parser.next_token() {
            out.push_str(&parser.tok(token)?);
        }
        debug!(bytes = out.len(), "parsed token stream");
        Ok(out)
    }

    fn next_token(&mut self) -> Option<Token> {
        self.tokens.pop()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// Join adjacent text tokens into a single inline-compiled run.
    fn parse_text(&mut self, first: String) -> String {
        let mut body = first;
        while matches!(self.peek(), Some(Token::Text { .. })) {
            if let Some(Token::Text { text }) = self.next_token() {
                body.push('\n');
                body.push_str(&text);
            }
        }
        self.inline.output(&body)
    }

    fn tok(&mut self, token: Token) -> Result<String> {
        match token {
            Token::Space => Ok(String::new()),

            Token::Hr => Ok(self.renderer.hr(self.options)),

            Token::Heading { depth, text } => {
                let compiled = self.inline.output(&text);
                Ok(self.renderer.heading(&compiled, depth, &text, self.options))
            }

            Token::Code {
                text,
                lang,
                escaped,
            } => Ok(self
                .renderer
                .code(&text, lang.as_deref(), escaped, self.options)),

            Token::Table {
                header,
                align,
                cells,
            } => {
                let mut head = String::new();
                for (i, cell) in header.iter().enumerate() {
                    let content = self.inline.output(cell);
                    head.push_str(&self.renderer.table_cell(
                        &content,
                        CellFlags {
                            header: true,
                            align: align.get(i).copied().flatten(),
                        },
                    ));
                }
                let head = self.renderer.table_row(&head);

                let mut body = String::new();
                for row in &cells {
                    let mut rendered = String::new();
                    // always the header's width: missing cells render
                    // empty, extra cells are dropped
                    for i in 0..header.len() {
                        let content = match row.get(i) {
                            Some(cell) => self.inline.output(cell),
                            None => String::new(),
                        };
                        rendered.push_str(&self.renderer.table_cell(
                            &content,
                            CellFlags {
                                header: false,
                                align: align.get(i).copied().flatten(),
                            },
                        ));
                    }
                    body.push_str(&self.renderer.table_row(&rendered));
                }
                Ok(self.renderer.table(&head, &body))
            }

            Token::BlockquoteStart => {
                let mut body = String::new();
                loop {
                    match self.next_token() {
                        Some(Token::BlockquoteEnd) => break,
                        Some(token) => body.push_str(&self.tok(token)?),
                        None => return Err(Error::UnexpectedToken("end of stream")),
                    }
                }
                Ok(self.renderer.blockquote(&body))
            }

            Token::ListStart { ordered } => {
                let mut body = String::new();
                loop {
                    match self.next_token() {
                        Some(Token::ListEnd) => break,
                        Some(token) => body.push_str(&self.tok(token)?),
                        None => return Err(Error::UnexpectedToken("end of stream")),
                    }
                }
                Ok(self.renderer.list(&body, ordered))
            }

            Token::ListItemStart { loose } => {
                let mut body = String::new();
                loop {
                    match self.next_token() {
                        Some(Token::ListItemEnd) => break,
                        // tight items compile their text inline, without
                        // paragraph wrappers
                        Some(Token::Text { text }) if !loose => {
                            body.push_str(&self.parse_text(text));
                        }
                        Some(token) => body.push_str(&self.tok(token)?),
                        None => return Err(Error::UnexpectedToken("end of stream")),
                    }
                }
                Ok(self.renderer.list_item(&body))
            }

            Token::Html { pre, text } => {
                let html = if !pre && !self.options.pedantic {
                    self.inline.output(&text)
                } else {
                    text
                };
                Ok(self.renderer.html(&html))
            }

            Token::Paragraph { text } => {
                let compiled = self.inline.output(&text);
                Ok(self.renderer.paragraph(&compiled))
            }

            Token::Text { text } => {
                let compiled = self.parse_text(text);
                Ok(self.renderer.paragraph(&compiled))
            }

            stray @ (Token::BlockquoteEnd | Token::ListEnd | Token::ListItemEnd) => {
                Err(Error::UnexpectedToken(stray.tag()))
            }
        }
    }
}
