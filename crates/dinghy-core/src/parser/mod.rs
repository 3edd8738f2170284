//! Concrete parsers producing the uniform syntax tree
//!
//! The Dockerfile splitter cuts a file into instructions and hands the shell
//! portions of `RUN`, `CMD`, `ENTRYPOINT` and `HEALTHCHECK CMD` to the shell
//! parser, which positions its nodes in Dockerfile coordinates directly.

mod dockerfile;
mod shell;

pub use dockerfile::parse_dockerfile;

use crate::error::DinghyError;
use crate::position::SourceFile;
use crate::tree::{NodeKind, Tree};
use serde::Serialize;
use std::fmt;

/// A recovered syntax problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub message: String,
    /// 0-based
    pub line: usize,
    /// 0-based
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line + 1, self.column + 1, self.message)
    }
}

impl From<ParseError> for DinghyError {
    fn from(err: ParseError) -> Self {
        DinghyError::parse_error(err.message, err.line + 1, err.column + 1)
    }
}

/// Tree plus the problems recovered while building it
#[derive(Debug)]
pub struct ParseOutput {
    pub tree: Tree,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a standalone shell snippet.
///
/// Positions are not bound to any source file, so the printer treats the
/// nodes as new text. On a syntax error the tree is an empty script.
pub fn parse_shell_fragment(text: &str) -> ParseOutput {
    let scratch = SourceFile::new(text);
    match shell::parse_script(&scratch, 0, text.len(), false) {
        Ok(tree) => ParseOutput {
            tree,
            errors: Vec::new(),
        },
        Err(err) => {
            tracing::debug!("Shell fragment failed to parse: {}", err);
            ParseOutput {
                tree: Tree::new(NodeKind::BashScript, None),
                errors: vec![err],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_positions_have_no_file() {
        let out = parse_shell_fragment("rm -rf /tmp/x");
        assert!(out.is_clean());
        let tree = &out.tree;
        let word = tree.elements(tree.root(), "BASH-WORD")[0];
        assert!(tree.position(word).is_some_and(|p| p.file().is_none()));
    }

    #[test]
    fn test_fragment_error_is_reported() {
        let out = parse_shell_fragment("echo 'unterminated");
        assert_eq!(out.errors.len(), 1);
        assert!(out.errors[0].message.contains("quote"));
        assert!(out.tree.children(out.tree.root()).is_empty());
    }

    #[test]
    fn test_parse_error_converts_to_one_based() {
        let err: DinghyError = ParseError::new("bad", 0, 4).into();
        assert_eq!(err.to_string(), "Parse error: bad at line 1, column 5");
    }
}
