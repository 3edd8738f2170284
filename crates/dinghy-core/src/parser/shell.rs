//! Recursive-descent parser for the POSIX shell subset found in Dockerfiles
//!
//! The parser works on a byte range of a [`SourceFile`] so every node it
//! creates is positioned in the coordinates of that file. A backslash-newline
//! is blank space, and in Dockerfile mode the comment lines Docker strips from
//! continued instructions are skipped as well.

use super::ParseError;
use crate::position::{Position, SourceFile};
use crate::tree::{NodeId, NodeKind, Tree};
use std::sync::Arc;

type PResult<T> = Result<T, ParseError>;

/// Where a statement list stops
#[derive(Debug, Clone, Copy)]
enum Until {
    Eof,
    Keywords(&'static [&'static str]),
    CloseParen,
    CloseBrace,
    Backtick,
    CaseItem,
}

impl Until {
    fn describe(self) -> String {
        match self {
            Until::Eof => "end of input".to_string(),
            Until::Keywords(words) => format!("'{}'", words.join("' or '")),
            Until::CloseParen => "')'".to_string(),
            Until::CloseBrace => "'}'".to_string(),
            Until::Backtick => "'`'".to_string(),
            Until::CaseItem => "';;' or 'esac'".to_string(),
        }
    }
}

const REDIRECT_OPS: &[&str] = &[
    "&>>", "&>", "<<<", "<<-", ">>", ">&", ">|", "<<", "<&", "<>", ">", "<",
];

/// Parse `file.text()[start..end]` into a tree rooted at a `BASH-SCRIPT`.
///
/// With `bind` set, positions reference `file` and Dockerfile continuation
/// comments are skipped.
pub(super) fn parse_script(
    file: &Arc<SourceFile>,
    start: usize,
    end: usize,
    bind: bool,
) -> PResult<Tree> {
    let parser = ShellParser {
        file,
        bytes: file.text().as_bytes(),
        text: file.text(),
        pos: start,
        end: end.min(file.text().len()),
        last_end: start,
        bind,
        backticks: 0,
        tree: Tree::new(NodeKind::BashScript, None),
    };
    parser.script()
}

struct ShellParser<'a> {
    file: &'a Arc<SourceFile>,
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
    end: usize,
    last_end: usize,
    bind: bool,
    backticks: usize,
    tree: Tree,
}

fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b' ' | b'\t' | b'\r' | b'\n' | b';' | b'&' | b'|' | b'<' | b'>' | b'(' | b')'
    )
}

fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

impl<'a> ShellParser<'a> {
    fn script(mut self) -> PResult<Tree> {
        let root = self.tree.root();
        self.skip_blank_lines();
        let start = self.pos;
        self.last_end = start;
        self.list_into(root, Until::Eof)?;
        let position = self.position(start, self.last_end.max(start));
        self.tree.set_position(root, Some(position));
        self.tree.reset_changes();
        Ok(self.tree)
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        let index = self.pos + offset;
        (index < self.end).then(|| self.bytes[index])
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.bytes[self.pos..self.end].starts_with(prefix.as_bytes())
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.text.get(start..end).unwrap_or_default().to_string()
    }

    fn position(&self, start: usize, end: usize) -> Position {
        let position = Position::range(self.file.point_at(start), self.file.point_at(end));
        if self.bind {
            position.with_file(Arc::clone(self.file))
        } else {
            position
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let point = self.file.point_at(self.pos);
        ParseError::new(message, point.line, point.column)
    }

    fn node(&mut self, kind: NodeKind, start: usize, end: usize) -> NodeId {
        self.last_end = self.last_end.max(end);
        let position = self.position(start, end);
        self.tree.new_node(kind, Some(position))
    }

    /// Node spanning from the first to the last of `children`
    fn wrap(&mut self, kind: NodeKind, children: &[NodeId]) -> NodeId {
        let position = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => match (self.tree.position(first), self.tree.position(last)) {
                (Some(a), Some(b)) => Some(a.union(b)),
                _ => None,
            },
            _ => None,
        };
        let node = self.tree.new_node(kind, position);
        self.tree.add_children(node, children.iter().copied());
        node
    }

    fn at_line_continuation(&self) -> bool {
        self.peek() == Some(b'\\')
            && (matches!(self.peek_at(1), Some(b'\n') | None)
                || (self.peek_at(1) == Some(b'\r') && self.peek_at(2) == Some(b'\n')))
    }

    fn skip_blank(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r') => self.pos += 1,
                Some(b'\\') if self.at_line_continuation() => {
                    self.pos += if self.peek_at(1) == Some(b'\r') { 3 } else { 2 };
                    self.pos = self.pos.min(self.end);
                    self.skip_continuation_comments();
                }
                _ => break,
            }
        }
    }

    fn skip_continuation_comments(&mut self) {
        if !self.bind {
            return;
        }
        loop {
            let mut index = self.pos;
            while index < self.end && matches!(self.bytes[index], b' ' | b'\t' | b'\r') {
                index += 1;
            }
            if index < self.end && self.bytes[index] == b'#' {
                while index < self.end && self.bytes[index] != b'\n' {
                    index += 1;
                }
                self.pos = (index + 1).min(self.end);
            } else if index < self.end && self.bytes[index] == b'\n' {
                self.pos = index + 1;
            } else {
                break;
            }
        }
    }

    fn skip_blank_lines(&mut self) {
        loop {
            self.skip_blank();
            if self.peek() == Some(b'\n') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.starts_with(keyword)
            && self
                .bytes
                .get(self.pos + keyword.len())
                .filter(|_| self.pos + keyword.len() < self.end)
                .is_none_or(|&next| is_delimiter(next))
    }

    /// Consume a reserved word, returning its start offset
    fn keyword(&mut self, keyword: &str) -> PResult<usize> {
        self.skip_blank_lines();
        if !self.at_keyword(keyword) {
            return Err(self.error(format!("expected '{keyword}'")));
        }
        let start = self.pos;
        self.pos += keyword.len();
        self.last_end = self.last_end.max(self.pos);
        Ok(start)
    }

    fn expect_byte(&mut self, byte: u8, what: &str) -> PResult<()> {
        self.skip_blank_lines();
        if self.peek() != Some(byte) {
            return Err(self.error(format!("expected {what}")));
        }
        self.pos += 1;
        self.last_end = self.last_end.max(self.pos);
        Ok(())
    }

    fn at_stop(&self, until: Until) -> bool {
        match until {
            Until::Eof => self.peek().is_none(),
            Until::Keywords(words) => words.iter().any(|w| self.at_keyword(w)),
            Until::CloseParen => self.peek() == Some(b')'),
            Until::CloseBrace => self.at_keyword("}"),
            Until::Backtick => self.peek() == Some(b'`'),
            Until::CaseItem => self.starts_with(";;") || self.at_keyword("esac"),
        }
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    fn list_into(&mut self, parent: NodeId, until: Until) -> PResult<()> {
        loop {
            self.skip_blank_lines();
            if self.at_stop(until) {
                return Ok(());
            }
            if self.peek().is_none() {
                return Err(self.error(format!(
                    "unexpected end of input, expected {}",
                    until.describe()
                )));
            }
            if self.peek() == Some(b'#') {
                let comment = self.comment();
                self.tree.add_child(parent, comment);
                continue;
            }
            let statement = self.and_or()?;
            self.tree.add_child(parent, statement);
            self.skip_blank();
            match self.peek() {
                Some(b';') if self.peek_at(1) != Some(b';') => {
                    let start = self.pos;
                    self.pos += 1;
                    let term = self.node(NodeKind::BashTerminator(";".into()), start, self.pos);
                    self.tree.add_child(parent, term);
                }
                Some(b'&') if !matches!(self.peek_at(1), Some(b'&' | b'>')) => {
                    let start = self.pos;
                    self.pos += 1;
                    let term = self.node(NodeKind::BashTerminator("&".into()), start, self.pos);
                    self.tree.add_child(parent, term);
                }
                Some(b'\n') => self.pos += 1,
                _ => {}
            }
        }
    }

    fn comment(&mut self) -> NodeId {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
        let mut end = self.pos;
        while end > start && self.bytes[end - 1] == b'\r' {
            end -= 1;
        }
        let text = self.slice(start, end);
        self.node(NodeKind::BashComment(text), start, end)
    }

    fn and_or(&mut self) -> PResult<NodeId> {
        let mut lhs = self.pipeline()?;
        loop {
            self.skip_blank();
            let kind = if self.starts_with("&&") {
                NodeKind::BashAndIf
            } else if self.starts_with("||") {
                NodeKind::BashOrIf
            } else {
                break;
            };
            let start = self.pos;
            self.pos += 2;
            let op_text = self.slice(start, self.pos);
            let op = self.node(NodeKind::BashOperator(op_text), start, self.pos);
            self.skip_blank_lines();
            let rhs = self.pipeline()?;
            lhs = self.wrap(kind, &[lhs, op, rhs]);
        }
        Ok(lhs)
    }

    fn pipeline(&mut self) -> PResult<NodeId> {
        let mut parts = Vec::new();
        self.skip_blank();
        if self.peek() == Some(b'!') && self.peek_at(1).is_none_or(is_delimiter) {
            let start = self.pos;
            self.pos += 1;
            parts.push(self.node(NodeKind::BashOperator("!".into()), start, self.pos));
            self.skip_blank();
        }
        parts.push(self.command()?);
        loop {
            self.skip_blank();
            if self.peek() != Some(b'|') || self.peek_at(1) == Some(b'|') {
                break;
            }
            let start = self.pos;
            self.pos += if self.peek_at(1) == Some(b'&') { 2 } else { 1 };
            let op_text = self.slice(start, self.pos);
            parts.push(self.node(NodeKind::BashOperator(op_text), start, self.pos));
            self.skip_blank_lines();
            parts.push(self.command()?);
        }
        if parts.len() == 1 {
            Ok(parts[0])
        } else {
            Ok(self.wrap(NodeKind::BashPipeline, &parts))
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    fn command(&mut self) -> PResult<NodeId> {
        self.skip_blank();
        let compound = if self.at_keyword("if") {
            self.if_clause()?
        } else if self.at_keyword("for") {
            self.for_clause()?
        } else if self.at_keyword("while") {
            self.loop_clause("while", NodeKind::BashWhile)?
        } else if self.at_keyword("until") {
            self.loop_clause("until", NodeKind::BashUntil)?
        } else if self.at_keyword("case") {
            self.case_clause()?
        } else if self.at_keyword("function") {
            self.function_keyword()?
        } else if self.at_keyword("{") {
            self.group(NodeKind::BashBraceGroup, Until::CloseBrace, b'}', "'}'")?
        } else if self.peek() == Some(b'(') {
            self.group(NodeKind::BashSubshell, Until::CloseParen, b')', "')'")?
        } else {
            return self.simple_command();
        };
        loop {
            self.skip_blank();
            if !self.at_redirect() {
                break;
            }
            let redirect = self.redirect()?;
            self.tree.add_child(compound, redirect);
        }
        Ok(compound)
    }

    fn at_command_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(b'&') => !self.starts_with("&>"),
            Some(b';' | b'|' | b')' | b'\n' | b'#') => true,
            Some(b'`') => self.backticks > 0,
            _ => false,
        }
    }

    fn simple_command(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let mut name: Option<NodeId> = None;
        let mut args = Vec::new();
        let mut extras = Vec::new();
        loop {
            self.skip_blank();
            if self.at_command_end() {
                break;
            }
            if self.peek() == Some(b'(') {
                return Err(self.error("unexpected '('"));
            }
            if self.at_redirect() {
                extras.push(self.redirect()?);
                continue;
            }
            if name.is_none() && args.is_empty() && self.at_assignment() {
                extras.push(self.assignment()?);
                continue;
            }
            let word = self.word()?;
            if name.is_none() {
                if extras.is_empty() && self.at_function_parens() {
                    return self.function_after_name(start, word);
                }
                name = Some(word);
            } else {
                args.push(word);
            }
        }
        if name.is_none() && extras.is_empty() {
            return Err(self.error("expected a command"));
        }

        let command = self.tree.new_node(NodeKind::BashCommand, None);
        self.tree.add_children(command, extras);
        if let Some(word) = name {
            let wrapper = self.wrap(NodeKind::BashCommandCommand, &[word]);
            self.tree.add_child(command, wrapper);
        }
        if !args.is_empty() {
            let wrapper = self.wrap(NodeKind::BashCommandArgs, &args);
            self.tree.add_child(command, wrapper);
        }
        let position = self.position(start, self.last_end.max(start));
        self.tree.set_position(command, Some(position));
        Ok(command)
    }

    fn at_assignment(&self) -> bool {
        let mut index = self.pos;
        if index >= self.end || !is_name_start(self.bytes[index]) {
            return false;
        }
        while index < self.end && is_name_char(self.bytes[index]) {
            index += 1;
        }
        index < self.end && self.bytes[index] == b'='
    }

    fn assignment(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        let name_text = self.slice(start, self.pos);
        let name = self.node(NodeKind::BashName(name_text), start, self.pos);
        self.pos += 1;
        self.last_end = self.last_end.max(self.pos);
        let mut children = vec![name];
        if !self.at_word_end() {
            children.push(self.word()?);
        }
        let assignment = self.tree.new_node(NodeKind::BashAssignment, None);
        self.tree.add_children(assignment, children);
        let position = self.position(start, self.last_end);
        self.tree.set_position(assignment, Some(position));
        Ok(assignment)
    }

    fn at_redirect(&self) -> bool {
        let mut index = self.pos;
        while index < self.end && self.bytes[index].is_ascii_digit() {
            index += 1;
        }
        match self.bytes.get(index).filter(|_| index < self.end) {
            Some(b'<' | b'>') => true,
            Some(b'&') => index == self.pos && self.starts_with("&>"),
            _ => false,
        }
    }

    fn redirect(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let Some(op) = REDIRECT_OPS.iter().find(|op| self.starts_with(op)) else {
            return Err(self.error("expected a redirection operator"));
        };
        self.pos += op.len();
        let op_text = self.slice(start, self.pos);
        let operator = self.node(NodeKind::BashOperator(op_text), start, self.pos);
        self.skip_blank();
        if self.at_word_end() {
            return Err(self.error("expected a redirection target"));
        }
        let target = self.word()?;
        Ok(self.wrap(NodeKind::BashRedirect, &[operator, target]))
    }

    fn at_function_parens(&mut self) -> bool {
        let saved = self.pos;
        self.skip_blank();
        let found = self.peek() == Some(b'(') && {
            self.pos += 1;
            self.skip_blank();
            self.peek() == Some(b')')
        };
        if found {
            self.pos += 1;
        } else {
            self.pos = saved;
        }
        found
    }

    fn function_after_name(&mut self, start: usize, word: NodeId) -> PResult<NodeId> {
        let name_text = self.tree.text_value(word);
        let name_position = self.tree.position(word).cloned();
        let name = self.tree.new_node(NodeKind::BashName(name_text), name_position);
        self.skip_blank_lines();
        let body = self.command()?;
        let function = self.node(NodeKind::BashFunction, start, self.last_end);
        self.tree.add_children(function, [name, body]);
        Ok(function)
    }

    fn function_keyword(&mut self) -> PResult<NodeId> {
        let start = self.keyword("function")?;
        self.skip_blank();
        let name_start = self.pos;
        while self.peek().is_some_and(|b| !is_delimiter(b)) {
            self.pos += 1;
        }
        if name_start == self.pos {
            return Err(self.error("expected a function name"));
        }
        let name_text = self.slice(name_start, self.pos);
        let name = self.node(NodeKind::BashName(name_text), name_start, self.pos);
        self.at_function_parens();
        self.skip_blank_lines();
        let body = self.command()?;
        let function = self.node(NodeKind::BashFunction, start, self.last_end);
        self.tree.add_children(function, [name, body]);
        Ok(function)
    }

    // ------------------------------------------------------------------
    // Compound commands
    // ------------------------------------------------------------------

    fn group(&mut self, kind: NodeKind, until: Until, close: u8, what: &str) -> PResult<NodeId> {
        let start = self.pos;
        self.pos += 1;
        let group = self.tree.new_node(kind, None);
        self.list_into(group, until)?;
        self.expect_byte(close, what)?;
        let position = self.position(start, self.pos);
        self.tree.set_position(group, Some(position));
        Ok(group)
    }

    /// Statement list positioned from its first statement
    fn condition(&mut self, stops: &'static [&'static str]) -> PResult<NodeId> {
        self.skip_blank_lines();
        let start = self.pos;
        let condition = self.tree.new_node(NodeKind::BashCondition, None);
        self.list_into(condition, Until::Keywords(stops))?;
        let position = self.position(start, self.last_end.max(start));
        self.tree.set_position(condition, Some(position));
        Ok(condition)
    }

    /// Statement list positioned from the keyword that opens it
    fn body(&mut self, kind: NodeKind, keyword_start: usize, stops: &'static [&'static str]) -> PResult<NodeId> {
        let body = self.tree.new_node(kind, None);
        self.list_into(body, Until::Keywords(stops))?;
        let position = self.position(keyword_start, self.last_end.max(keyword_start));
        self.tree.set_position(body, Some(position));
        Ok(body)
    }

    fn if_clause(&mut self) -> PResult<NodeId> {
        let start = self.keyword("if")?;
        let if_node = self.tree.new_node(NodeKind::BashIf, None);
        let condition = self.condition(&["then"])?;
        let then_start = self.keyword("then")?;
        let then = self.body(NodeKind::BashThen, then_start, &["elif", "else", "fi"])?;
        self.tree.add_children(if_node, [condition, then]);
        loop {
            self.skip_blank_lines();
            if self.at_keyword("elif") {
                let elif_start = self.keyword("elif")?;
                let condition = self.condition(&["then"])?;
                let then_start = self.keyword("then")?;
                let then = self.body(NodeKind::BashThen, then_start, &["elif", "else", "fi"])?;
                let elif = self.node(NodeKind::BashElif, elif_start, self.last_end);
                self.tree.add_children(elif, [condition, then]);
                self.tree.add_child(if_node, elif);
            } else if self.at_keyword("else") {
                let else_start = self.keyword("else")?;
                let otherwise = self.body(NodeKind::BashElse, else_start, &["fi"])?;
                self.tree.add_child(if_node, otherwise);
            } else {
                break;
            }
        }
        self.keyword("fi")?;
        let position = self.position(start, self.pos);
        self.tree.set_position(if_node, Some(position));
        Ok(if_node)
    }

    fn do_group(&mut self) -> PResult<NodeId> {
        let do_start = self.keyword("do")?;
        let group = self.body(NodeKind::BashDoGroup, do_start, &["done"])?;
        self.keyword("done")?;
        let position = self.position(do_start, self.pos);
        self.tree.set_position(group, Some(position));
        Ok(group)
    }

    fn for_clause(&mut self) -> PResult<NodeId> {
        let start = self.keyword("for")?;
        self.skip_blank();
        let name_start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        if name_start == self.pos {
            return Err(self.error("expected a loop variable"));
        }
        let name_text = self.slice(name_start, self.pos);
        let name = self.node(NodeKind::BashName(name_text), name_start, self.pos);
        let for_node = self.tree.new_node(NodeKind::BashFor, None);
        self.tree.add_child(for_node, name);

        self.skip_blank_lines();
        if self.at_keyword("in") {
            let in_start = self.keyword("in")?;
            let mut words = Vec::new();
            loop {
                self.skip_blank();
                if self.at_command_end() {
                    break;
                }
                words.push(self.word()?);
            }
            let items = self.node(NodeKind::BashForIn, in_start, self.last_end);
            self.tree.add_children(items, words);
            self.tree.add_child(for_node, items);
        }
        self.skip_blank();
        if self.peek() == Some(b';') {
            self.pos += 1;
        }
        let group = self.do_group()?;
        self.tree.add_child(for_node, group);
        let position = self.position(start, self.pos);
        self.tree.set_position(for_node, Some(position));
        Ok(for_node)
    }

    fn loop_clause(&mut self, keyword: &str, kind: NodeKind) -> PResult<NodeId> {
        let start = self.keyword(keyword)?;
        let node = self.tree.new_node(kind, None);
        let condition = self.condition(&["do"])?;
        let group = self.do_group()?;
        self.tree.add_children(node, [condition, group]);
        let position = self.position(start, self.pos);
        self.tree.set_position(node, Some(position));
        Ok(node)
    }

    fn case_clause(&mut self) -> PResult<NodeId> {
        let start = self.keyword("case")?;
        self.skip_blank();
        let subject = self.word()?;
        let case = self.tree.new_node(NodeKind::BashCase, None);
        self.tree.add_child(case, subject);
        self.keyword("in")?;
        loop {
            self.skip_blank_lines();
            if self.at_keyword("esac") {
                break;
            }
            if self.peek().is_none() {
                return Err(self.error("unexpected end of input, expected 'esac'"));
            }
            let item = self.case_item()?;
            self.tree.add_child(case, item);
        }
        self.keyword("esac")?;
        let position = self.position(start, self.pos);
        self.tree.set_position(case, Some(position));
        Ok(case)
    }

    fn case_item(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        if self.peek() == Some(b'(') {
            self.pos += 1;
        }
        let mut patterns = Vec::new();
        loop {
            self.skip_blank();
            patterns.push(self.word()?);
            self.skip_blank();
            match self.peek() {
                Some(b'|') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ')' after case pattern")),
            }
        }
        let pattern = self.node(NodeKind::BashCasePattern, start, self.pos);
        self.tree.add_children(pattern, patterns);
        let item = self.tree.new_node(NodeKind::BashCaseItem, None);
        self.tree.add_child(item, pattern);
        self.list_into(item, Until::CaseItem)?;
        self.skip_blank_lines();
        if self.starts_with(";;") {
            let term_start = self.pos;
            self.pos += 2;
            let term = self.node(NodeKind::BashTerminator(";;".into()), term_start, self.pos);
            self.tree.add_child(item, term);
        }
        let position = self.position(start, self.last_end);
        self.tree.set_position(item, Some(position));
        Ok(item)
    }

    // ------------------------------------------------------------------
    // Words
    // ------------------------------------------------------------------

    fn at_word_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(b'`') => self.backticks > 0,
            Some(b'\\') => self.at_line_continuation(),
            Some(byte) => is_delimiter(byte),
        }
    }

    fn flush_literal(&mut self, literal_start: &mut Option<usize>, parts: &mut Vec<NodeId>) {
        if let Some(start) = literal_start.take() {
            let text = self.slice(start, self.pos);
            parts.push(self.node(NodeKind::BashLiteral(text), start, self.pos));
        }
    }

    fn word(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        let mut parts = Vec::new();
        let mut literal_start = None;
        while !self.at_word_end() {
            match self.peek() {
                Some(b'\'') => {
                    self.flush_literal(&mut literal_start, &mut parts);
                    parts.push(self.single_quoted()?);
                }
                Some(b'"') => {
                    self.flush_literal(&mut literal_start, &mut parts);
                    parts.push(self.double_quoted()?);
                }
                Some(b'$') if self.at_expansion() => {
                    self.flush_literal(&mut literal_start, &mut parts);
                    parts.push(self.dollar()?);
                }
                Some(b'`') => {
                    self.flush_literal(&mut literal_start, &mut parts);
                    parts.push(self.backtick()?);
                }
                Some(b'\\') => {
                    literal_start.get_or_insert(self.pos);
                    self.pos = (self.pos + 2).min(self.end);
                }
                _ => {
                    literal_start.get_or_insert(self.pos);
                    self.pos += 1;
                }
            }
        }
        self.flush_literal(&mut literal_start, &mut parts);
        if parts.is_empty() {
            return Err(self.error("expected a word"));
        }
        let word = self.node(NodeKind::BashWord, start, self.pos);
        self.tree.add_children(word, parts);
        Ok(word)
    }

    fn single_quoted(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        while self.peek().is_some_and(|b| b != b'\'') {
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(self.error("unterminated single quote"));
        }
        let content_end = self.pos;
        self.pos += 1;
        let quoted = self.node(NodeKind::BashSingleQuoted, start, self.pos);
        if content_end > content_start {
            let text = self.slice(content_start, content_end);
            let literal = self.node(NodeKind::BashLiteral(text), content_start, content_end);
            self.tree.add_child(quoted, literal);
        }
        Ok(quoted)
    }

    fn double_quoted(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.pos += 1;
        let mut parts = Vec::new();
        let mut literal_start = None;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated double quote")),
                Some(b'"') => break,
                Some(b'\\') => {
                    literal_start.get_or_insert(self.pos);
                    self.pos = (self.pos + 2).min(self.end);
                }
                Some(b'$') if self.at_expansion() => {
                    self.flush_literal(&mut literal_start, &mut parts);
                    parts.push(self.dollar()?);
                }
                Some(b'`') => {
                    self.flush_literal(&mut literal_start, &mut parts);
                    parts.push(self.backtick()?);
                }
                Some(_) => {
                    literal_start.get_or_insert(self.pos);
                    self.pos += 1;
                }
            }
        }
        self.flush_literal(&mut literal_start, &mut parts);
        self.pos += 1;
        let quoted = self.node(NodeKind::BashDoubleQuoted, start, self.pos);
        self.tree.add_children(quoted, parts);
        Ok(quoted)
    }

    fn at_expansion(&self) -> bool {
        match self.peek_at(1) {
            Some(b'(' | b'{') => true,
            Some(byte) => is_name_char(byte) || b"@*#?$!-".contains(&byte),
            None => false,
        }
    }

    fn dollar(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        if self.starts_with("$((") {
            self.pos += 3;
            let mut depth = 0usize;
            loop {
                match self.peek() {
                    None => return Err(self.error("unterminated arithmetic expansion")),
                    Some(b'(') => depth += 1,
                    Some(b')') if depth == 0 && self.peek_at(1) == Some(b')') => {
                        self.pos += 2;
                        break;
                    }
                    Some(b')') => depth = depth.saturating_sub(1),
                    Some(_) => {}
                }
                self.pos += 1;
            }
            let text = self.slice(start, self.pos);
            return Ok(self.node(NodeKind::BashArithmetic(text), start, self.pos));
        }
        if self.starts_with("$(") {
            self.pos += 2;
            let substitution = self.tree.new_node(NodeKind::BashCommandSubstitution, None);
            let saved = self.backticks;
            self.backticks = 0;
            let listed = self.list_into(substitution, Until::CloseParen);
            self.backticks = saved;
            listed?;
            self.expect_byte(b')', "')'")?;
            let position = self.position(start, self.pos);
            self.tree.set_position(substitution, Some(position));
            return Ok(substitution);
        }
        if self.starts_with("${") {
            self.pos += 2;
            let mut depth = 0usize;
            loop {
                match self.peek() {
                    None => return Err(self.error("unterminated parameter expansion")),
                    Some(b'{') => depth += 1,
                    Some(b'}') if depth == 0 => {
                        self.pos += 1;
                        break;
                    }
                    Some(b'}') => depth -= 1,
                    Some(_) => {}
                }
                self.pos += 1;
            }
            let text = self.slice(start, self.pos);
            return Ok(self.node(NodeKind::BashBracedVariable(text), start, self.pos));
        }
        self.pos += 1;
        match self.peek() {
            Some(byte) if is_name_start(byte) => {
                while self.peek().is_some_and(is_name_char) {
                    self.pos += 1;
                }
            }
            Some(_) => self.pos += 1,
            None => {}
        }
        let text = self.slice(start, self.pos);
        Ok(self.node(NodeKind::BashVariable(text), start, self.pos))
    }

    fn backtick(&mut self) -> PResult<NodeId> {
        let start = self.pos;
        self.pos += 1;
        let substitution = self.tree.new_node(NodeKind::BashBacktickSubstitution, None);
        let saved = self.backticks;
        self.backticks += 1;
        let listed = self.list_into(substitution, Until::Backtick);
        self.backticks = saved;
        listed?;
        if self.peek() != Some(b'`') {
            return Err(self.error("unterminated backtick substitution"));
        }
        self.pos += 1;
        self.last_end = self.last_end.max(self.pos);
        let position = self.position(start, self.pos);
        self.tree.set_position(substitution, Some(position));
        Ok(substitution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Tree {
        let file = SourceFile::new(text);
        parse_script(&file, 0, text.len(), false).expect("fragment should parse")
    }

    fn tags(tree: &Tree) -> Vec<&'static str> {
        let mut out = Vec::new();
        tree.preorder(tree.root(), true, &mut |t, id| out.push(t.tag(id)));
        out
    }

    #[test]
    fn test_simple_command_shape() {
        let tree = parse("apt-get install -y curl");
        let command = tree.elements(tree.root(), "BASH-COMMAND")[0];
        assert_eq!(tree.command_name_text(command).as_deref(), Some("apt-get"));
        assert_eq!(tree.command_word_values(command), vec!["install", "-y", "curl"]);
    }

    #[test]
    fn test_and_or_is_left_associative() {
        let tree = parse("a && b || c");
        let top = tree.children(tree.root())[0];
        assert_eq!(tree.tag(top), "BASH-OR-IF");
        let lhs = tree.sorted_children(top)[0];
        assert_eq!(tree.tag(lhs), "BASH-AND-IF");
    }

    #[test]
    fn test_terminators_are_nodes() {
        let tree = parse("a; b &");
        let kids: Vec<_> = tree
            .sorted_children(tree.root())
            .into_iter()
            .map(|id| tree.tag(id))
            .collect();
        assert_eq!(
            kids,
            vec!["BASH-COMMAND", "BASH-TERMINATOR", "BASH-COMMAND", "BASH-TERMINATOR"]
        );
    }

    #[test]
    fn test_quoting_and_expansions() {
        let tree = parse(r#"echo "a $HOME ${X:-y}" 'lit' $(date) `pwd` $((1+2))"#);
        let found = tags(&tree);
        for tag in [
            "BASH-DOUBLE-QUOTED",
            "BASH-VARIABLE",
            "BASH-BRACED-VARIABLE",
            "BASH-SINGLE-QUOTED",
            "BASH-COMMAND-SUBSTITUTION",
            "BASH-BACKTICK-SUBSTITUTION",
            "BASH-ARITHMETIC",
        ] {
            assert!(found.contains(&tag), "missing {tag}");
        }
        let var = tree.elements(tree.root(), "BASH-VARIABLE")[0];
        assert_eq!(tree.value(var), Some("$HOME"));
    }

    #[test]
    fn test_compound_commands() {
        let tree = parse(
            "if [ -f x ]; then echo a; elif true; then :; else echo b; fi; \
             for f in a b; do echo $f; done; while false; do :; done; \
             case $x in a|b) echo ab;; *) ;; esac; (cd /; ls); { echo g; }",
        );
        let found = tags(&tree);
        for tag in [
            "BASH-IF",
            "BASH-ELIF",
            "BASH-ELSE",
            "BASH-FOR",
            "BASH-FOR-IN",
            "BASH-DO-GROUP",
            "BASH-WHILE",
            "BASH-CASE",
            "BASH-CASE-ITEM",
            "BASH-CASE-PATTERN",
            "BASH-SUBSHELL",
            "BASH-BRACE-GROUP",
        ] {
            assert!(found.contains(&tag), "missing {tag}");
        }
    }

    #[test]
    fn test_if_positions_start_at_keywords() {
        let tree = parse("if a; then b; fi");
        let if_node = tree.elements(tree.root(), "BASH-IF")[0];
        let then = tree.child(if_node, "BASH-THEN").expect("then body");
        assert_eq!(tree.start(then).map(|p| p.column), Some(6));
        let end = tree.position(if_node).and_then(|p| p.end).expect("end");
        assert_eq!(end.column, 16);
    }

    #[test]
    fn test_redirects_and_assignments() {
        let tree = parse("FOO=bar cmd 2>/dev/null >> log &> all");
        let command = tree.elements(tree.root(), "BASH-COMMAND")[0];
        assert_eq!(tree.children_of(command, "BASH-ASSIGNMENT").len(), 1);
        assert_eq!(tree.children_of(command, "BASH-REDIRECT").len(), 3);
        let op = tree.elements(command, "BASH-OPERATOR")[0];
        assert_eq!(tree.value(op), Some("2>"));
    }

    #[test]
    fn test_pipeline_and_function() {
        let tree = parse("f() { echo hi; }; ! cat x | grep y |& wc");
        let found = tags(&tree);
        assert!(found.contains(&"BASH-FUNCTION"));
        assert!(found.contains(&"BASH-PIPELINE"));
    }

    #[test]
    fn test_line_continuation_is_blank() {
        let tree = parse("apt-get update \\\n  && apt-get install x");
        let top = tree.children(tree.root())[0];
        assert_eq!(tree.tag(top), "BASH-AND-IF");
        let op = tree.child(top, "BASH-OPERATOR").expect("operator");
        assert_eq!(tree.start(op).map(|p| (p.line, p.column)), Some((1, 2)));
    }

    #[test]
    fn test_comment_in_script() {
        let tree = parse("echo a # trailing\necho b");
        assert_eq!(tree.elements(tree.root(), "BASH-COMMENT").len(), 1);
        assert_eq!(tree.elements(tree.root(), "BASH-COMMAND").len(), 2);
    }

    #[test]
    fn test_errors_carry_location() {
        let file = SourceFile::new("echo \"open");
        let err = parse_script(&file, 0, 10, false).unwrap_err();
        assert!(err.message.contains("double quote"));
        let file = SourceFile::new("if true; then echo");
        let err = parse_script(&file, 0, 18, false).unwrap_err();
        assert!(err.message.contains("fi"));
    }

    #[test]
    fn test_failed_substitution_inside_backticks_recovers() {
        for text in ["\"$(`$(&& -d", "`$(&&`", "echo `a $(b` c`"] {
            let file = SourceFile::new(text);
            assert!(parse_script(&file, 0, text.len(), false).is_err(), "{text}");
        }
    }
}
