//! Incremental, format-preserving printer
//!
//! Untouched subtrees are copied from the source file byte for byte; only
//! nodes that changed (or descend into a change) are regenerated from their
//! structure. Spacing between tokens is derived from their positions, with
//! one cursor per source file so that grafted fragments and original text
//! can be interleaved.

use crate::position::{FileKey, Point, Position, SourceFile};
use crate::tree::{NodeId, NodeKind, Tree};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A node met during printing that has no concrete syntax
#[derive(Debug, Clone, Serialize)]
pub struct PrintError {
    pub message: String,
    pub tag: &'static str,
    pub position: Option<Position>,
}

impl fmt::Display for PrintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => write!(f, "{} at {}", self.message, position),
            None => f.write_str(&self.message),
        }
    }
}

/// Printer output
#[derive(Debug, Clone, Default)]
pub struct Printed {
    pub text: String,
    pub errors: Vec<PrintError>,
}

impl Printed {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Print a whole tree
pub fn print(tree: &Tree) -> Printed {
    let root = tree.root();
    if matches!(tree.kind(root), NodeKind::DockerFile)
        && !tree.has_changes(root)
        && let Some(file) = tree.position(root).and_then(Position::file)
    {
        debug!("Tree unchanged, emitting source text");
        return Printed {
            text: file.text().to_string(),
            errors: Vec::new(),
        };
    }
    print_node(tree, root)
}

/// Print one subtree
pub fn print_node(tree: &Tree, id: NodeId) -> Printed {
    let newline = tree
        .position(id)
        .and_then(Position::file)
        .map_or("\n", |file| file.newline());
    let mut printer = Printer {
        tree,
        out: String::new(),
        cursors: HashMap::new(),
        newline,
        in_command: false,
        after_comment: false,
        pending_comments: Vec::new(),
        errors: Vec::new(),
    };
    printer.generate(id);
    Printed {
        text: printer.out,
        errors: printer.errors,
    }
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Start,
    End,
}

struct Printer<'a> {
    tree: &'a Tree,
    out: String,
    /// End of the last emitted token, per source file
    cursors: HashMap<FileKey, Point>,
    /// Line terminator for breaks that have no source line to copy
    newline: &'static str,
    /// Inside a Dockerfile instruction, where line breaks need a `\`
    in_command: bool,
    after_comment: bool,
    /// Comment lines inside the continuation of the current instruction
    pending_comments: Vec<NodeId>,
    errors: Vec<PrintError>,
}

impl<'a> Printer<'a> {
    fn generate(&mut self, id: NodeId) {
        let tree = self.tree;
        let position = tree.position(id);
        if !tree.has_changes(id)
            && let Some(position) = position
            && let Some(text) = position.content()
        {
            self.emit(text, Some(position));
            self.after_comment = tree.kind(id).is_comment();
            return;
        }
        if let Some(position) = position
            && position.file().is_some()
        {
            self.space_to(position);
        }
        self.render(id);
    }

    // ------------------------------------------------------------------
    // Spacing
    // ------------------------------------------------------------------

    fn push(&mut self, text: &str) {
        self.emit(text, None);
    }

    fn emit(&mut self, text: &str, position: Option<&Position>) {
        match position {
            Some(position) => self.space_to(position),
            None if self.after_comment => {
                self.trim_trailing_blanks();
                self.out.push_str(self.newline);
            }
            None => {}
        }
        self.out.push_str(text);
        self.after_comment = false;
        if let Some(position) = position {
            self.advance(position.file_key(), position.end_or_start());
        }
    }

    fn advance(&mut self, key: FileKey, point: Point) {
        self.cursors
            .entry(key)
            .and_modify(|cursor| *cursor = (*cursor).max(point))
            .or_insert(point);
    }

    /// Break lines until the output reaches the line of `position`
    fn space_to(&mut self, position: &Position) {
        let key = position.file_key();
        match self.cursors.get(&key).copied() {
            Some(previous) if position.start.line > previous.line => {
                self.line_breaks(position, previous);
            }
            _ if self.after_comment => {
                self.trim_trailing_blanks();
                self.out.push_str(self.newline);
                self.indent(position);
                self.after_comment = false;
            }
            _ => {}
        }
        self.advance(key, position.start);
    }

    /// Blank lines are kept, and so are the comment lines of a continued
    /// instruction; other skipped source lines belonged to removed nodes.
    fn line_breaks(&mut self, position: &Position, previous: Point) {
        let file = position.file();
        self.trim_trailing_blanks();
        if self.in_command && !self.after_comment {
            let tail = file.and_then(|f| continuation_tail(f, previous)).unwrap_or(" \\");
            self.out.push_str(tail);
        }
        self.push_line_end(file, previous.line);
        for line in previous.line + 1..position.start.line {
            let Some(file) = file else {
                self.out.push_str(self.newline);
                continue;
            };
            if let Some(comment) = self.take_comment(position.file_key(), line) {
                self.continuation_comment(comment);
                self.push_line_end(Some(file), line);
            } else if file.line_text(line).is_some_and(|text| text.trim().is_empty()) {
                self.push_line_end(Some(file), line);
            }
        }
        self.indent(position);
        self.after_comment = false;
    }

    /// Terminator of a source line, or the file default
    fn push_line_end(&mut self, file: Option<&Arc<SourceFile>>, line: usize) {
        let newline = file
            .map(|file| file.terminator(line))
            .filter(|terminator| !terminator.is_empty())
            .unwrap_or(self.newline);
        self.out.push_str(newline);
    }

    fn take_comment(&mut self, key: FileKey, line: usize) -> Option<NodeId> {
        let tree = self.tree;
        let index = self.pending_comments.iter().position(|&comment| {
            tree.position(comment)
                .is_some_and(|position| position.file_key() == key && position.start.line == line)
        })?;
        Some(self.pending_comments.remove(index))
    }

    fn continuation_comment(&mut self, comment: NodeId) {
        let tree = self.tree;
        if let (Some(position), NodeKind::DockerComment(text)) =
            (tree.position(comment), tree.kind(comment))
        {
            self.indent(position);
            self.out.push_str(text);
        }
    }

    fn indent(&mut self, position: &Position) {
        let column = position.start.column;
        let original = position
            .file()
            .and_then(|f| f.line_text(position.start.line))
            .and_then(|line| line.get(..column))
            .filter(|prefix| prefix.chars().all(|c| c == ' ' || c == '\t'));
        match original {
            Some(prefix) => self.out.push_str(prefix),
            None => self.out.extend(std::iter::repeat_n(' ', column)),
        }
    }

    fn trim_trailing_blanks(&mut self) {
        let trimmed = self.out.trim_end_matches([' ', '\t']).len();
        self.out.truncate(trimmed);
    }

    fn on_new_line(&self, id: NodeId) -> bool {
        self.tree.position(id).is_some_and(|position| {
            self.cursors
                .get(&position.file_key())
                .is_some_and(|cursor| position.start.line > cursor.line)
        })
    }

    fn keyword(&mut self, word: &str, base: Option<&Position>, anchor: Anchor) {
        let position = base.and_then(|base| token_position(base, word, anchor));
        self.emit(word, position.as_ref());
    }

    // ------------------------------------------------------------------
    // Renderers
    // ------------------------------------------------------------------

    fn render(&mut self, id: NodeId) {
        let tree = self.tree;
        let position = tree.position(id);
        match tree.kind(id) {
            NodeKind::DockerFile => self.render_file(id),
            NodeKind::DockerComment(text) | NodeKind::BashComment(text) => {
                self.emit(text, position);
                self.after_comment = true;
            }
            NodeKind::DockerJsonString(value) => {
                let quoted = Value::String(value.clone()).to_string();
                self.emit(&quoted, position);
            }
            NodeKind::DockerKeyword(text)
            | NodeKind::DockerFlag(text)
            | NodeKind::DockerImageName(text)
            | NodeKind::DockerImageTag(text)
            | NodeKind::DockerImageDigest(text)
            | NodeKind::DockerImageAlias(text)
            | NodeKind::DockerPath(text)
            | NodeKind::DockerName(text)
            | NodeKind::DockerLiteral(text)
            | NodeKind::DockerPort(text)
            | NodeKind::BashTerminator(text)
            | NodeKind::BashOperator(text)
            | NodeKind::BashName(text)
            | NodeKind::BashLiteral(text)
            | NodeKind::BashVariable(text)
            | NodeKind::BashBracedVariable(text)
            | NodeKind::BashArithmetic(text) => self.emit(text, position),
            NodeKind::DockerFrom
            | NodeKind::DockerRun
            | NodeKind::DockerCmd
            | NodeKind::DockerEntrypoint
            | NodeKind::DockerShell
            | NodeKind::DockerCopy
            | NodeKind::DockerAdd
            | NodeKind::DockerEnv
            | NodeKind::DockerArg
            | NodeKind::DockerLabel
            | NodeKind::DockerExpose
            | NodeKind::DockerWorkdir
            | NodeKind::DockerUser
            | NodeKind::DockerVolume
            | NodeKind::DockerStopSignal
            | NodeKind::DockerHealthcheck
            | NodeKind::DockerOnbuild
            | NodeKind::DockerMaintainer
            | NodeKind::DockerInstruction => self.render_instruction(id),
            NodeKind::DockerExecForm => {
                self.push("[");
                self.joined(&tree.sorted_children(id), ", ");
                self.push("]");
            }
            NodeKind::DockerKeyValue => self.render_key_value(id),
            NodeKind::BashScript => self.render_list(&tree.sorted_children(id), false),
            NodeKind::BashCondition => self.render_list(&tree.sorted_children(id), true),
            NodeKind::BashThen => self.render_body("then", id),
            NodeKind::BashElse => self.render_body("else", id),
            NodeKind::BashDoGroup => {
                self.render_body("do", id);
                self.push(" ");
                self.keyword("done", position, Anchor::End);
            }
            NodeKind::BashCommandSubstitution => {
                self.push("$(");
                self.render_list(&tree.sorted_children(id), false);
                self.push(")");
            }
            NodeKind::BashBacktickSubstitution => {
                self.push("`");
                self.render_list(&tree.sorted_children(id), false);
                self.push("`");
            }
            NodeKind::BashSubshell => {
                let (body, redirects) = self.split_redirects(id);
                self.push("(");
                self.render_list(&body, false);
                self.push(")");
                self.render_redirects(&redirects);
            }
            NodeKind::BashBraceGroup => {
                let (body, redirects) = self.split_redirects(id);
                self.push("{ ");
                self.render_list(&body, true);
                self.push(" }");
                self.render_redirects(&redirects);
            }
            NodeKind::BashAndIf
            | NodeKind::BashOrIf
            | NodeKind::BashPipeline
            | NodeKind::BashCommand
            | NodeKind::BashCommandCommand
            | NodeKind::BashCommandArgs => self.joined(&tree.sorted_children(id), " "),
            NodeKind::BashAssignment => {
                let children = tree.sorted_children(id);
                if let Some((&name, value)) = children.split_first() {
                    self.generate(name);
                    self.push("=");
                    self.joined(value, "");
                }
            }
            NodeKind::BashRedirect => {
                let children = tree.sorted_children(id);
                let mut previous: Option<NodeId> = None;
                for child in children {
                    if let Some(previous) = previous
                        && self.has_gap(previous, child)
                    {
                        self.push(" ");
                    }
                    self.generate(child);
                    previous = Some(child);
                }
            }
            NodeKind::BashWord => self.joined(&tree.sorted_children(id), ""),
            NodeKind::BashSingleQuoted => {
                self.push("'");
                self.joined(&tree.sorted_children(id), "");
                self.push("'");
            }
            NodeKind::BashDoubleQuoted => {
                self.push("\"");
                self.joined(&tree.sorted_children(id), "");
                self.push("\"");
            }
            NodeKind::BashIf => {
                let (body, redirects) = self.split_redirects(id);
                self.keyword("if", position, Anchor::Start);
                for child in body {
                    self.push(" ");
                    self.generate(child);
                }
                self.push(" ");
                self.keyword("fi", position, Anchor::End);
                self.render_redirects(&redirects);
            }
            NodeKind::BashElif => {
                self.keyword("elif", position, Anchor::Start);
                for child in tree.sorted_children(id) {
                    self.push(" ");
                    self.generate(child);
                }
            }
            NodeKind::BashFor => self.render_for(id),
            NodeKind::BashForIn => {
                self.keyword("in", position, Anchor::Start);
                for child in tree.sorted_children(id) {
                    self.push(" ");
                    self.generate(child);
                }
            }
            NodeKind::BashWhile => self.render_loop("while", id),
            NodeKind::BashUntil => self.render_loop("until", id),
            NodeKind::BashCase => self.render_case(id),
            NodeKind::BashCaseItem => {
                let children = tree.sorted_children(id);
                if let Some((&pattern, rest)) = children.split_first() {
                    self.generate(pattern);
                    if !rest.is_empty() {
                        self.push(" ");
                        self.render_list(rest, false);
                    }
                }
            }
            NodeKind::BashCasePattern => {
                self.joined(&tree.sorted_children(id), "|");
                self.push(")");
            }
            NodeKind::BashFunction => {
                let children = tree.sorted_children(id);
                if let Some((&name, body)) = children.split_first() {
                    self.generate(name);
                    self.push("() ");
                    self.joined(body, " ");
                }
            }
            NodeKind::AbstractIdentity(_) | NodeKind::OptionGroup => self.render_analysis_only(id),
        }
    }

    fn joined(&mut self, children: &[NodeId], separator: &str) {
        for (index, &child) in children.iter().enumerate() {
            if index > 0 {
                self.push(separator);
            }
            self.generate(child);
        }
    }

    fn render_file(&mut self, id: NodeId) {
        let tree = self.tree;
        let position = tree.position(id);
        if let Some(position) = position {
            self.cursors.insert(position.file_key(), Point::default());
        }
        for child in tree.sorted_children(id) {
            self.in_command = false;
            self.pending_comments.clear();
            if !self.out.is_empty() && !self.out.ends_with('\n') && !self.on_new_line(child) {
                self.out.push_str(self.newline);
                self.after_comment = false;
            }
            self.generate(child);
        }
        self.in_command = false;
        if !self.pending_comments.is_empty() {
            debug!("Dropping {} comments of removed lines", self.pending_comments.len());
            self.pending_comments.clear();
        }

        let file = position.and_then(Position::file);
        let tail = position.and_then(|position| {
            let file = position.file()?;
            let cursor = self.cursors.get(&position.file_key())?;
            let offset = file.offset(*cursor)?;
            file.text().get(offset..)
        });
        match tail {
            Some(tail) if !tail.is_empty() && tail.trim().is_empty() => {
                self.trim_trailing_blanks();
                self.out.push_str(tail);
            }
            // a source without a final line break stays without one
            _ if file.is_some_and(|file| !file.text().ends_with('\n')) => {}
            _ if !self.out.is_empty() && !self.out.ends_with('\n') => {
                self.out.push_str(self.newline);
            }
            _ => {}
        }
    }

    fn render_instruction(&mut self, id: NodeId) {
        let tree = self.tree;
        self.in_command = false;
        let (comments, children): (Vec<NodeId>, Vec<NodeId>) = tree
            .sorted_children(id)
            .into_iter()
            .partition(|&child| matches!(tree.kind(child), NodeKind::DockerComment(_)));
        // emitted by `line_breaks` when the output passes their line
        self.pending_comments.extend(comments);
        for (index, child) in children.into_iter().enumerate() {
            if index > 0 {
                match tree.kind(child) {
                    NodeKind::DockerImageTag(_) => self.push(":"),
                    NodeKind::DockerImageDigest(_) => self.push("@"),
                    _ => self.push(" "),
                }
            }
            self.generate(child);
            self.in_command = true;
        }
    }

    fn render_key_value(&mut self, id: NodeId) {
        let children = self.tree.sorted_children(id);
        if let Some((&name, value)) = children.split_first() {
            self.generate(name);
            if !value.is_empty() {
                let separator = self.key_value_separator(name);
                self.push(separator);
                self.joined(value, "");
            }
        }
    }

    /// Legacy `ENV KEY value` pairs keep their space; everything else gets `=`
    fn key_value_separator(&self, name: NodeId) -> &'static str {
        let spaced = self.tree.position(name).is_some_and(|position| {
            match (position.file(), position.end) {
                (Some(file), Some(end)) => file
                    .offset(end)
                    .and_then(|offset| file.text().as_bytes().get(offset))
                    .is_some_and(|&byte| matches!(byte, b' ' | b'\t')),
                _ => false,
            }
        });
        if spaced { " " } else { "=" }
    }

    /// Statements with their terminators.
    ///
    /// A `closed` list is followed by a keyword or brace, so a generated
    /// last statement gets a `;`.
    fn render_list(&mut self, items: &[NodeId], closed: bool) {
        let tree = self.tree;
        let mut previous: Option<NodeId> = None;
        for &child in items {
            let is_terminator = matches!(tree.kind(child), NodeKind::BashTerminator(_));
            match previous {
                Some(previous) if is_terminator => {
                    if !is_statement(tree.kind(previous))
                        || self.has_gap(previous, child)
                        || (!has_file_position(tree, child) && tree.value(child) == Some("&"))
                    {
                        self.push(" ");
                    }
                }
                Some(previous) => {
                    // a line break inside an instruction is a continuation,
                    // so it never separates statements
                    if is_statement(tree.kind(previous))
                        && (self.in_command || !self.on_new_line(child))
                    {
                        self.push(";");
                    }
                    self.push(" ");
                }
                None => {}
            }
            self.generate(child);
            previous = Some(child);
        }
        if closed
            && let Some(last) = previous
            && is_statement(tree.kind(last))
            && !has_file_position(tree, last)
        {
            self.push(";");
        }
    }

    fn render_body(&mut self, keyword: &str, id: NodeId) {
        let tree = self.tree;
        self.keyword(keyword, tree.position(id), Anchor::Start);
        let (body, _) = self.split_redirects(id);
        if !body.is_empty() {
            self.push(" ");
            self.render_list(&body, true);
        }
    }

    fn render_for(&mut self, id: NodeId) {
        let tree = self.tree;
        let (body, redirects) = self.split_redirects(id);
        self.keyword("for", tree.position(id), Anchor::Start);
        for child in body {
            if matches!(tree.kind(child), NodeKind::BashDoGroup) && !self.on_new_line(child) {
                self.push(";");
            }
            self.push(" ");
            self.generate(child);
        }
        self.render_redirects(&redirects);
    }

    fn render_loop(&mut self, keyword: &str, id: NodeId) {
        let tree = self.tree;
        let (body, redirects) = self.split_redirects(id);
        self.keyword(keyword, tree.position(id), Anchor::Start);
        for child in body {
            self.push(" ");
            self.generate(child);
        }
        self.render_redirects(&redirects);
    }

    fn render_case(&mut self, id: NodeId) {
        let tree = self.tree;
        let position = tree.position(id);
        let (body, redirects) = self.split_redirects(id);
        self.keyword("case", position, Anchor::Start);
        if let Some((&subject, items)) = body.split_first() {
            self.push(" ");
            self.generate(subject);
            self.push(" in");
            for &item in items {
                self.push(" ");
                self.generate(item);
            }
        }
        self.push(" ");
        self.keyword("esac", position, Anchor::End);
        self.render_redirects(&redirects);
    }

    fn split_redirects(&self, id: NodeId) -> (Vec<NodeId>, Vec<NodeId>) {
        self.tree
            .sorted_children(id)
            .into_iter()
            .partition(|&child| !matches!(self.tree.kind(child), NodeKind::BashRedirect))
    }

    fn render_redirects(&mut self, redirects: &[NodeId]) {
        for &redirect in redirects {
            self.push(" ");
            self.generate(redirect);
        }
    }

    /// Whether the source has blank space between two tokens on one line
    fn has_gap(&self, a: NodeId, b: NodeId) -> bool {
        match (self.tree.position(a), self.tree.position(b)) {
            (Some(pa), Some(pb)) if pa.file().is_some() && pa.same_file(pb) => {
                let end = pa.end_or_start();
                pb.start.line > end.line || pb.start.column > end.column
            }
            _ => false,
        }
    }

    fn render_analysis_only(&mut self, id: NodeId) {
        let tree = self.tree;
        let tag = tree.tag(id);
        warn!("Printing {} which has no concrete syntax", tag);
        self.errors.push(PrintError {
            message: format!("{tag} has no concrete syntax"),
            tag,
            position: tree.position(id).cloned(),
        });
        match tree.original(id) {
            Some(original) if original != id && original.index() < tree.len() => self.generate(original),
            _ => self.joined(&tree.sorted_children(id), " "),
        }
    }
}

/// Statements as opposed to terminators and comments inside a list
fn is_statement(kind: &NodeKind) -> bool {
    !matches!(kind, NodeKind::BashTerminator(_)) && !kind.is_comment()
}

fn has_file_position(tree: &Tree, id: NodeId) -> bool {
    tree.position(id).is_some_and(|position| position.file().is_some())
}

/// Position of a structural keyword at the start or end of `base`
fn token_position(base: &Position, word: &str, anchor: Anchor) -> Option<Position> {
    let start = match anchor {
        Anchor::Start => base.start,
        Anchor::End => {
            let end = base.end?;
            Point::new(end.line, end.column.checked_sub(word.len())?)
        }
    };
    let position = Position::range(start, Point::new(start.line, start.column + word.len()));
    Some(match base.file() {
        Some(file) => position.with_file(Arc::clone(file)),
        None => position,
    })
}

/// Original `\` continuation after a point, if nothing else follows it
fn continuation_tail(file: &SourceFile, point: Point) -> Option<&str> {
    let tail = file.line_text(point.line)?.get(point.column..)?;
    (tail.trim() == "\\").then(|| tail.trim_end())
}
