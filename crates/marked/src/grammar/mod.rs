//! Grammar rule tables for both lexing levels.
//!
//! Each variant (normal, GFM, tables, pedantic, breaks) is an immutable set
//! of anchored matchers built once and shared. Composite patterns are
//! assembled from shared named fragments with [`expand`]. Constructs the
//! `regex` crate cannot express (backreferences, lookaround) are matched by
//! hand scanners in the lexer and inline compiler instead; the tables carry
//! the pieces those scanners need.

pub mod block;
pub mod inline;

use regex::Regex;

/// Substitute named fragments into a pattern template.
pub(crate) fn expand(template: &str, fragments: &[(&str, &str)]) -> String {
    let mut pattern = template.to_string();
    for (name, fragment) in fragments {
        pattern = pattern.replace(name, fragment);
    }
    pattern
}

/// Compile a table pattern. Patterns are fixed strings, so failure is a
/// programming error.
pub(crate) fn re(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => panic!("bad grammar pattern {pattern:?}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_substitutes_every_occurrence() {
        let pattern = expand("^(bull) bull", &[("bull", "[*+-]")]);
        assert_eq!(pattern, "^([*+-]) [*+-]");
        assert!(re(&pattern).is_match("* *"));
    }
}
