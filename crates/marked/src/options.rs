//! Rendering configuration and the process-wide default store.

use std::fmt;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::renderer::Renderer;

/// Caller-supplied HTML cleaner applied to raw HTML when `sanitize` is on.
/// Without one, sanitize mode entity-escapes raw HTML instead.
pub type Sanitizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Synchronous code highlighter: raw code plus the declared language in,
/// replacement HTML out. `None` keeps the code unhighlighted.
pub type SyncHighlight = Arc<dyn Fn(&str, Option<&str>) -> Option<String> + Send + Sync>;

/// Fallible highlighter for [`render_with_callback`](crate::render_with_callback);
/// a reported error is surfaced through the completion callback.
pub type AsyncHighlight =
    Arc<dyn Fn(&str, Option<&str>) -> Result<Option<String>, String> + Send + Sync>;

/// External syntax-highlighter hook.
#[derive(Clone)]
pub enum Highlighter {
    /// Invoked inline by [`Renderer::code`] while rendering.
    Sync(SyncHighlight),
    /// Dispatched concurrently, one worker per code block, before parsing.
    Async(AsyncHighlight),
}

/// All rendering behavior switches plus the pluggable hooks.
#[derive(Clone)]
pub struct Options {
    /// GitHub-flavored extensions (fences, strikethrough, bare URLs,
    /// space-required headings).
    pub gfm: bool,
    /// Pipe tables (requires `gfm`).
    pub tables: bool,
    /// Every newline inside a paragraph becomes a hard break.
    pub breaks: bool,
    /// Older, laxer emphasis and list handling.
    pub pedantic: bool,
    /// A bullet-style change starts a new list.
    pub smart_lists: bool,
    /// Typographic quotes, dashes and ellipses in plain text.
    pub smartypants: bool,
    /// Entity-mangle autolinked email addresses.
    pub mangle: bool,
    /// Escape raw HTML (or route it through `sanitizer`) and vet link
    /// schemes.
    pub sanitize: bool,
    /// Swallow internal errors, rendering an error fragment instead.
    pub silent: bool,
    /// Self-closing void elements (`<br/>`).
    pub xhtml: bool,
    /// Class prefix for fenced-code language annotations.
    pub lang_prefix: String,
    /// Prefix for generated heading ids.
    pub header_prefix: String,
    pub sanitizer: Option<Sanitizer>,
    pub highlight: Option<Highlighter>,
    /// Custom renderer; `None` means the built-in HTML renderer.
    pub renderer: Option<Arc<dyn Renderer + Send + Sync>>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            gfm: true,
            tables: true,
            breaks: false,
            pedantic: false,
            smart_lists: false,
            smartypants: false,
            mangle: true,
            sanitize: false,
            silent: false,
            xhtml: false,
            lang_prefix: "lang-".to_string(),
            header_prefix: String::new(),
            sanitizer: None,
            highlight: None,
            renderer: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("gfm", &self.gfm)
            .field("tables", &self.tables)
            .field("breaks", &self.breaks)
            .field("pedantic", &self.pedantic)
            .field("smart_lists", &self.smart_lists)
            .field("smartypants", &self.smartypants)
            .field("mangle", &self.mangle)
            .field("sanitize", &self.sanitize)
            .field("silent", &self.silent)
            .field("xhtml", &self.xhtml)
            .field("lang_prefix", &self.lang_prefix)
            .field("header_prefix", &self.header_prefix)
            .field("sanitizer", &self.sanitizer.as_ref().map(|_| ".."))
            .field("highlight", &self.highlight.as_ref().map(|_| ".."))
            .field("renderer", &self.renderer.as_ref().map(|_| ".."))
            .finish()
    }
}

static DEFAULTS: Lazy<RwLock<Options>> = Lazy::new(|| RwLock::new(Options::default()));

/// Replace the process-wide default options used by
/// [`render_default`](crate::render_default).
pub fn set_defaults(options: Options) {
    *DEFAULTS.write().expect("options lock") = options;
}

/// A snapshot of the process-wide default options.
pub fn defaults() -> Options {
    DEFAULTS.read().expect("options lock").clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_values() {
        let options = Options::default();
        assert!(options.gfm);
        assert!(options.tables);
        assert!(options.mangle);
        assert!(!options.breaks);
        assert!(!options.pedantic);
        assert!(!options.sanitize);
        assert!(!options.silent);
        assert_eq!(options.lang_prefix, "lang-");
        assert_eq!(options.header_prefix, "");
        assert!(options.renderer.is_none());
    }
}
