//! Markdown to HTML rendering.
//!
//! The classic three-stage pipeline: a block [`Lexer`] turns raw text into
//! a token stream plus a table of link-reference definitions, a [`Parser`]
//! walks that stream, and an [`InlineCompiler`] resolves span-level markup
//! on the way — all feeding a pluggable [`Renderer`].
//!
//! ```
//! let html = marked::render("# Hello", &marked::Options::default()).unwrap();
//! assert_eq!(html, "<h1 id=\"hello\">Hello</h1>\n");
//! ```
//!
//! Behavior is controlled by [`Options`]; [`render_default`] uses a
//! process-wide default set managed with [`set_defaults`]. For slow
//! external syntax highlighters there is [`render_with_callback`], which
//! highlights all code blocks concurrently before parsing.

mod escape;
mod grammar;
mod inline;
mod lexer;
mod options;
mod parser;
mod renderer;
mod token;

use std::sync::{Arc, Mutex};

use tracing::debug;

pub use crate::escape::{escape, unescape};
pub use crate::inline::InlineCompiler;
pub use crate::lexer::Lexer;
pub use crate::options::{
    defaults, set_defaults, AsyncHighlight, Highlighter, Options, Sanitizer, SyncHighlight,
};
pub use crate::parser::Parser;
pub use crate::renderer::{CellFlags, Html, Renderer};
pub use crate::token::{Align, LinkRef, Links, Token};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No block rule consumed the remaining input. Grammar rules overlap
    /// to cover everything, so hitting this is a defect worth reporting.
    #[error("no block rule matched the input near {near:?}; please report this at https://github.com/sebastian-software/marked-rs")]
    InfiniteLoop { near: String },
    /// The token stream was not well nested.
    #[error("unexpected `{0}` token in stream; please report this at https://github.com/sebastian-software/marked-rs")]
    UnexpectedToken(&'static str),
    /// An asynchronous highlighter reported a failure.
    #[error("highlight failed: {0}")]
    Highlight(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Render markdown to HTML.
///
/// With `silent` set, internal errors render an error fragment instead of
/// propagating.
pub fn render(src: &str, options: &Options) -> Result<String> {
    match render_inner(src, options) {
        Ok(html) => Ok(html),
        Err(err) if options.silent => Ok(error_fragment(&err)),
        Err(err) => Err(err),
    }
}

/// Render markdown to HTML with the process-wide default options.
pub fn render_default(src: &str) -> Result<String> {
    render(src, &options::defaults())
}

/// Render markdown to HTML, invoking `callback` exactly once with the
/// result. When an [`Highlighter::Async`] hook is configured, every code
/// block is highlighted on its own thread first and the callback receives
/// the first highlighter error, if any. All outstanding highlight calls
/// are awaited before the callback fires; there is no cancellation.
pub fn render_with_callback<F>(src: &str, options: &Options, callback: F)
where
    F: FnOnce(Result<String>),
{
    let highlight = match &options.highlight {
        Some(Highlighter::Async(highlight)) => Arc::clone(highlight),
        // a synchronous highlighter already runs inside `Renderer::code`
        _ => return callback(render(src, options)),
    };

    let (mut tokens, links) = match Lexer::lex(src, options) {
        Ok(lexed) => lexed,
        Err(err) => return callback(Err(err)),
    };

    let failure: Mutex<Option<String>> = Mutex::new(None);
    std::thread::scope(|scope| {
        for token in tokens.iter_mut() {
            if let Token::Code {
                text,
                lang,
                escaped,
            } = token
            {
                let highlight = Arc::clone(&highlight);
                let failure = &failure;
                scope.spawn(move || match highlight(text, lang.as_deref()) {
                    Ok(Some(replaced)) => {
                        if replaced != *text {
                            *text = replaced;
                            *escaped = true;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => {
                        let mut slot = failure.lock().unwrap_or_else(|e| e.into_inner());
                        if slot.is_none() {
                            *slot = Some(message);
                        }
                    }
                });
            }
        }
    });

    if let Some(message) = failure.into_inner().unwrap_or_else(|e| e.into_inner()) {
        return callback(Err(Error::Highlight(message)));
    }

    let renderer = renderer_of(options);
    callback(Parser::parse(tokens, &links, options, renderer.as_ref()));
}

fn render_inner(src: &str, options: &Options) -> Result<String> {
    debug!(len = src.len(), "rendering markdown");
    let (tokens, links) = Lexer::lex(src, options)?;
    let renderer = renderer_of(options);
    Parser::parse(tokens, &links, options, renderer.as_ref())
}

fn renderer_of(options: &Options) -> Arc<dyn Renderer + Send + Sync> {
    match &options.renderer {
        Some(renderer) => Arc::clone(renderer),
        None => Arc::new(Html),
    }
}

fn error_fragment(err: &Error) -> String {
    format!(
        "<p>An error occurred:</p><pre>{}</pre>",
        escape(&err.to_string(), true)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_minimal() {
        let html = render("hello", &Options::default()).unwrap();
        assert_eq!(html, "<p>hello</p>\n");
    }

    #[test]
    fn test_internal_errors_carry_report_hint() {
        let err = Error::InfiniteLoop {
            near: "@@".to_string(),
        };
        assert!(err.to_string().contains("please report this at"));
        assert!(Error::UnexpectedToken("list_end")
            .to_string()
            .contains("please report this at"));
    }

    #[test]
    fn test_error_fragment_escapes_message() {
        let fragment = error_fragment(&Error::Highlight("a < b".to_string()));
        assert_eq!(
            fragment,
            "<p>An error occurred:</p><pre>highlight failed: a &lt; b</pre>"
        );
    }
}
