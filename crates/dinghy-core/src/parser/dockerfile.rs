//! Dockerfile instruction splitter
//!
//! Cuts the file into comment lines and instructions (following line
//! continuations), then builds one top-level node per instruction with
//! positioned children. Shell-form commands are handed to the shell parser
//! with their byte range so the script lands in file coordinates.

use super::shell::parse_script;
use super::{ParseError, ParseOutput};
use crate::position::{Position, SourceFile};
use crate::tree::{NodeId, NodeKind, Tree};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// One raw line-level item of a Dockerfile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawItem {
    Comment { start: usize, end: usize },
    Instruction { start: usize, end: usize },
}

/// Split the text into comments and (continued) instructions.
///
/// Offsets are byte offsets; `end` excludes trailing whitespace.
fn split(text: &str) -> Vec<RawItem> {
    let mut items = Vec::new();
    let mut offset = 0;
    while offset < text.len() {
        let this_end = line_end(text, offset);
        let line = &text[offset..this_end];
        let content_start = offset + (line.len() - line.trim_start().len());
        let content_end = offset + line.trim_end().len();
        if content_start >= content_end {
            offset = this_end + 1;
            continue;
        }
        if text[content_start..].starts_with('#') {
            items.push(RawItem::Comment {
                start: content_start,
                end: content_end,
            });
            offset = this_end + 1;
            continue;
        }

        let mut end = content_end;
        let mut current_end = this_end;
        while text[..end].ends_with('\\') && current_end < text.len() {
            let mut next = current_end + 1;
            let mut found = false;
            while next < text.len() {
                let next_end = line_end(text, next);
                let next_line = &text[next..next_end];
                let trimmed = next_line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    next = next_end + 1;
                    continue;
                }
                end = next + next_line.trim_end().len();
                current_end = next_end;
                found = true;
                break;
            }
            if !found {
                break;
            }
        }
        items.push(RawItem::Instruction {
            start: content_start,
            end,
        });
        offset = current_end + 1;
    }
    items
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i)
}

/// Parse a whole Dockerfile
pub fn parse_dockerfile(file: Arc<SourceFile>) -> ParseOutput {
    let root_position = Position::range(
        file.point_at(0),
        file.point_at(file.text().len()),
    )
    .with_file(Arc::clone(&file));
    let mut builder = DockerBuilder {
        tree: Tree::new(NodeKind::DockerFile, Some(root_position)),
        errors: Vec::new(),
        file,
    };
    let root = builder.tree.root();
    let items = split(builder.file.text());
    debug!("Split Dockerfile into {} items", items.len());
    for item in items {
        let node = match item {
            RawItem::Comment { start, end } => {
                let text = builder.slice(start, end);
                builder.node(NodeKind::DockerComment(text), start, end)
            }
            RawItem::Instruction { start, end } => {
                let node = builder.instruction(start, end);
                builder.continuation_comments(node, start, end);
                node
            }
        };
        builder.tree.add_child(root, node);
    }
    builder.tree.reset_changes();
    ParseOutput {
        tree: builder.tree,
        errors: builder.errors,
    }
}

struct DockerBuilder {
    file: Arc<SourceFile>,
    tree: Tree,
    errors: Vec<ParseError>,
}

impl DockerBuilder {
    fn bytes(&self) -> &[u8] {
        self.file.text().as_bytes()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.file.text().get(start..end).unwrap_or_default().to_string()
    }

    fn node(&mut self, kind: NodeKind, start: usize, end: usize) -> NodeId {
        let position = Position::range(self.file.point_at(start), self.file.point_at(end))
            .with_file(Arc::clone(&self.file));
        self.tree.new_node(kind, Some(position))
    }

    fn child(&mut self, parent: NodeId, kind: NodeKind, start: usize, end: usize) -> NodeId {
        let node = self.node(kind, start, end);
        self.tree.add_child(parent, node);
        node
    }

    /// Keep the comment lines Docker strips from a continued instruction
    fn continuation_comments(&mut self, parent: NodeId, start: usize, end: usize) {
        let file = Arc::clone(&self.file);
        let text = file.text();
        let mut offset = line_end(text, start) + 1;
        while offset < end {
            let this_end = line_end(text, offset).min(end);
            let line = &text[offset..this_end];
            let trimmed = line.trim();
            if trimmed.starts_with('#') {
                let content_start = offset + (line.len() - line.trim_start().len());
                let content_end = content_start + trimmed.len();
                self.child(
                    parent,
                    NodeKind::DockerComment(trimmed.to_string()),
                    content_start,
                    content_end,
                );
            }
            offset = this_end + 1;
        }
    }

    /// Skip blanks, continuations and the comment lines inside them
    fn skip_ws(&self, mut pos: usize, to: usize) -> usize {
        let bytes = self.bytes();
        while pos < to {
            match bytes[pos] {
                b' ' | b'\t' | b'\r' => pos += 1,
                b'\\' if pos + 1 == to || matches!(bytes[pos + 1], b'\n' | b'\r') => pos += 1,
                b'\n' => {
                    pos += 1;
                    let mut scan = pos;
                    while scan < to && matches!(bytes[scan], b' ' | b'\t') {
                        scan += 1;
                    }
                    if scan < to && bytes[scan] == b'#' {
                        while scan < to && bytes[scan] != b'\n' {
                            scan += 1;
                        }
                        pos = scan;
                    }
                }
                _ => break,
            }
        }
        pos
    }

    fn word_end(&self, mut pos: usize, to: usize) -> usize {
        let bytes = self.bytes();
        while pos < to {
            match bytes[pos] {
                b' ' | b'\t' | b'\r' | b'\n' => break,
                b'\\' if pos + 1 == to || matches!(bytes[pos + 1], b'\n' | b'\r') => break,
                b'\\' => pos += 2,
                quote @ (b'"' | b'\'') => {
                    pos += 1;
                    while pos < to && bytes[pos] != quote {
                        if bytes[pos] == b'\\' && quote == b'"' {
                            pos += 1;
                        }
                        pos += 1;
                    }
                    pos += 1;
                }
                _ => pos += 1,
            }
        }
        pos.min(to)
    }

    /// Whitespace-separated words of `[from, to)`, quotes respected
    fn words(&self, from: usize, to: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut pos = self.skip_ws(from, to);
        while pos < to {
            let end = self.word_end(pos, to);
            if end == pos {
                break;
            }
            out.push((pos, end));
            pos = self.skip_ws(end, to);
        }
        out
    }

    fn instruction(&mut self, start: usize, end: usize) -> NodeId {
        let keyword_end = self.word_end(start, end);
        let keyword_text = self.slice(start, keyword_end);
        let kind = match keyword_text.to_ascii_uppercase().as_str() {
            "FROM" => NodeKind::DockerFrom,
            "RUN" => NodeKind::DockerRun,
            "CMD" => NodeKind::DockerCmd,
            "ENTRYPOINT" => NodeKind::DockerEntrypoint,
            "SHELL" => NodeKind::DockerShell,
            "COPY" => NodeKind::DockerCopy,
            "ADD" => NodeKind::DockerAdd,
            "ENV" => NodeKind::DockerEnv,
            "ARG" => NodeKind::DockerArg,
            "LABEL" => NodeKind::DockerLabel,
            "EXPOSE" => NodeKind::DockerExpose,
            "WORKDIR" => NodeKind::DockerWorkdir,
            "USER" => NodeKind::DockerUser,
            "VOLUME" => NodeKind::DockerVolume,
            "STOPSIGNAL" => NodeKind::DockerStopSignal,
            "HEALTHCHECK" => NodeKind::DockerHealthcheck,
            "ONBUILD" => NodeKind::DockerOnbuild,
            "MAINTAINER" => NodeKind::DockerMaintainer,
            _ => NodeKind::DockerInstruction,
        };
        trace!("Instruction {} at byte {}", keyword_text, start);
        let node = self.node(kind.clone(), start, end);
        self.child(node, NodeKind::DockerKeyword(keyword_text), start, keyword_end);
        let args = self.skip_ws(keyword_end, end);
        if args >= end {
            return node;
        }

        match kind {
            NodeKind::DockerFrom => self.from_args(node, args, end),
            NodeKind::DockerRun => {
                let rest = self.flags(node, args, end);
                self.command_args(node, rest, end);
            }
            NodeKind::DockerCmd | NodeKind::DockerEntrypoint => self.command_args(node, args, end),
            NodeKind::DockerShell => {
                if !self.exec_form(node, args, end) {
                    self.literal(node, args, end);
                }
            }
            NodeKind::DockerCopy | NodeKind::DockerAdd => {
                let rest = self.flags(node, args, end);
                if !self.exec_form(node, rest, end) {
                    self.paths(node, rest, end);
                }
            }
            NodeKind::DockerVolume => {
                if !self.exec_form(node, args, end) {
                    self.paths(node, args, end);
                }
            }
            NodeKind::DockerEnv | NodeKind::DockerArg | NodeKind::DockerLabel => {
                let legacy = !matches!(kind, NodeKind::DockerArg);
                self.key_values(node, args, end, legacy);
            }
            NodeKind::DockerExpose => {
                for (s, e) in self.words(args, end) {
                    let text = self.slice(s, e);
                    self.child(node, NodeKind::DockerPort(text), s, e);
                }
            }
            NodeKind::DockerHealthcheck => self.healthcheck_args(node, args, end),
            NodeKind::DockerOnbuild => {
                let nested = self.instruction(args, end);
                self.tree.add_child(node, nested);
            }
            _ => self.literal(node, args, end),
        }
        node
    }

    fn literal(&mut self, parent: NodeId, start: usize, end: usize) {
        let text = self.slice(start, end);
        self.child(parent, NodeKind::DockerLiteral(text), start, end);
    }

    /// Leading `--flag[=value]` words; returns the offset after them
    fn flags(&mut self, parent: NodeId, mut pos: usize, end: usize) -> usize {
        while pos < end && self.file.text()[pos..end].starts_with("--") {
            let word_end = self.word_end(pos, end);
            let text = self.slice(pos, word_end);
            self.child(parent, NodeKind::DockerFlag(text), pos, word_end);
            pos = self.skip_ws(word_end, end);
        }
        pos
    }

    /// Exec form when the arguments are a JSON string array, shell otherwise
    fn command_args(&mut self, parent: NodeId, start: usize, end: usize) {
        if start >= end || self.exec_form(parent, start, end) {
            return;
        }
        match parse_script(&self.file, start, end, true) {
            Ok(script) => {
                let copy = self.tree.graft(&script, script.root());
                self.tree.add_child(parent, copy);
            }
            Err(err) => {
                warn!("Keeping raw shell text after parse error: {}", err);
                self.errors.push(err);
                self.literal(parent, start, end);
            }
        }
    }

    /// Try to read `[ "a", "b" ]`; nothing is added unless it is valid JSON
    fn exec_form(&mut self, parent: NodeId, start: usize, end: usize) -> bool {
        let Some(strings) = self.scan_json_array(start, end) else {
            return false;
        };
        let form = self.node(NodeKind::DockerExecForm, start, end);
        for (s, e, value) in strings {
            self.child(form, NodeKind::DockerJsonString(value), s, e);
        }
        self.tree.add_child(parent, form);
        true
    }

    fn scan_json_array(&self, start: usize, end: usize) -> Option<Vec<(usize, usize, String)>> {
        let bytes = self.bytes();
        if bytes.get(start) != Some(&b'[') {
            return None;
        }
        let mut strings = Vec::new();
        let mut pos = self.skip_ws(start + 1, end);
        if pos < end && bytes[pos] == b']' {
            pos += 1;
        } else {
            loop {
                if pos >= end || bytes[pos] != b'"' {
                    return None;
                }
                let mut close = pos + 1;
                while close < end && bytes[close] != b'"' {
                    if bytes[close] == b'\\' {
                        close += 1;
                    }
                    close += 1;
                }
                if close >= end {
                    return None;
                }
                let raw = self.file.text().get(pos..=close)?;
                let value: String = serde_json::from_str(raw).ok()?;
                strings.push((pos, close + 1, value));
                pos = self.skip_ws(close + 1, end);
                match bytes.get(pos).filter(|_| pos < end) {
                    Some(b',') => pos = self.skip_ws(pos + 1, end),
                    Some(b']') => {
                        pos += 1;
                        break;
                    }
                    _ => return None,
                }
            }
        }
        (self.skip_ws(pos, end) >= end).then_some(strings)
    }

    fn paths(&mut self, parent: NodeId, start: usize, end: usize) {
        for (s, e) in self.words(start, end) {
            let text = self.slice(s, e);
            self.child(parent, NodeKind::DockerPath(text), s, e);
        }
    }

    fn from_args(&mut self, node: NodeId, start: usize, end: usize) {
        let rest = self.flags(node, start, end);
        let words = self.words(rest, end);
        let Some(&(image_start, image_end)) = words.first() else {
            return;
        };
        self.image_reference(node, image_start, image_end);
        if let [_, (as_start, as_end), (alias_start, alias_end), ..] = words[..] {
            let keyword = self.slice(as_start, as_end);
            if keyword.eq_ignore_ascii_case("as") {
                self.child(node, NodeKind::DockerKeyword(keyword), as_start, as_end);
                let alias = self.slice(alias_start, alias_end);
                self.child(node, NodeKind::DockerImageAlias(alias), alias_start, alias_end);
            }
        }
    }

    /// `name[:tag][@digest]`; a colon before the last `/` is a registry port
    fn image_reference(&mut self, parent: NodeId, start: usize, end: usize) {
        let reference = self.slice(start, end);
        let (name_and_tag, digest) = match reference.find('@') {
            Some(at) => (&reference[..at], Some(at)),
            None => (reference.as_str(), None),
        };
        let slash = name_and_tag.rfind('/').map_or(0, |i| i + 1);
        let colon = name_and_tag[slash..].rfind(':').map(|i| slash + i);
        let name_end = colon.unwrap_or(name_and_tag.len());

        self.child(
            parent,
            NodeKind::DockerImageName(reference[..name_end].to_string()),
            start,
            start + name_end,
        );
        if let Some(colon) = colon {
            self.child(
                parent,
                NodeKind::DockerImageTag(name_and_tag[colon + 1..].to_string()),
                start + colon + 1,
                start + name_and_tag.len(),
            );
        }
        if let Some(at) = digest {
            self.child(
                parent,
                NodeKind::DockerImageDigest(reference[at + 1..].to_string()),
                start + at + 1,
                end,
            );
        }
    }

    fn key_values(&mut self, parent: NodeId, start: usize, end: usize, legacy_allowed: bool) {
        let words = self.words(start, end);
        for (index, &(s, e)) in words.iter().enumerate() {
            let raw = self.slice(s, e);
            let equals = raw
                .find(['=', '"', '\''])
                .filter(|&i| raw.as_bytes()[i] == b'=');
            let pair = self.node(NodeKind::DockerKeyValue, s, e);
            self.tree.add_child(parent, pair);
            match equals {
                Some(eq) => {
                    self.child(pair, NodeKind::DockerName(raw[..eq].to_string()), s, s + eq);
                    self.child(
                        pair,
                        NodeKind::DockerLiteral(raw[eq + 1..].to_string()),
                        s + eq + 1,
                        e,
                    );
                }
                None if legacy_allowed && index == 0 && words.len() > 1 => {
                    // `ENV KEY value with spaces`
                    self.child(pair, NodeKind::DockerName(raw), s, e);
                    let value_start = words[1].0;
                    self.literal(pair, value_start, end);
                    let position = Position::range(self.file.point_at(s), self.file.point_at(end))
                        .with_file(Arc::clone(&self.file));
                    self.tree.set_position(pair, Some(position));
                    return;
                }
                None => {
                    self.child(pair, NodeKind::DockerName(raw), s, e);
                }
            }
        }
    }

    fn healthcheck_args(&mut self, node: NodeId, start: usize, end: usize) {
        let rest = self.flags(node, start, end);
        let keyword_end = self.word_end(rest, end);
        let keyword = self.slice(rest, keyword_end);
        if keyword.eq_ignore_ascii_case("NONE") || keyword.eq_ignore_ascii_case("CMD") {
            let is_cmd = keyword.eq_ignore_ascii_case("CMD");
            self.child(node, NodeKind::DockerKeyword(keyword), rest, keyword_end);
            if is_cmd {
                let args = self.skip_ws(keyword_end, end);
                self.command_args(node, args, end);
            }
        } else if rest < end {
            self.literal(node, rest, end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParseOutput {
        parse_dockerfile(SourceFile::new(text))
    }

    fn top_tags(out: &ParseOutput) -> Vec<&'static str> {
        let tree = &out.tree;
        tree.sorted_children(tree.root())
            .into_iter()
            .map(|id| tree.tag(id))
            .collect()
    }

    #[test]
    fn test_split_follows_continuations_and_comments() {
        let text = "# c\nRUN a \\\n  # inner\n  b\n\nFROM x\n";
        let items = split(text);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], RawItem::Comment { start: 0, end: 3 });
        let RawItem::Instruction { start, end } = items[1] else {
            panic!("expected an instruction");
        };
        assert_eq!(&text[start..end], "RUN a \\\n  # inner\n  b");
    }

    #[test]
    fn test_instruction_kinds() {
        let out = parse(
            "FROM ubuntu:22.04 AS build\nRUN echo hi\nCMD [\"run\"]\nCOPY --from=build a b\n\
             ENV A=1 B=2\nEXPOSE 80 443\nWORKDIR /app\nFOOBAR x\n",
        );
        assert!(out.is_clean());
        assert_eq!(
            top_tags(&out),
            vec![
                "DOCKER-FROM",
                "DOCKER-RUN",
                "DOCKER-CMD",
                "DOCKER-COPY",
                "DOCKER-ENV",
                "DOCKER-EXPOSE",
                "DOCKER-WORKDIR",
                "DOCKER-INSTRUCTION",
            ]
        );
    }

    #[test]
    fn test_from_splits_image_reference() {
        let out = parse("FROM localhost:5000/team/app:1.2@sha256:abc AS base\n");
        let tree = &out.tree;
        let from = tree.children(tree.root())[0];
        let name = tree.child(from, "DOCKER-IMAGE-NAME").expect("name");
        assert_eq!(tree.value(name), Some("localhost:5000/team/app"));
        let tag = tree.child(from, "DOCKER-IMAGE-TAG").expect("tag");
        assert_eq!(tree.value(tag), Some("1.2"));
        let digest = tree.child(from, "DOCKER-IMAGE-DIGEST").expect("digest");
        assert_eq!(tree.value(digest), Some("sha256:abc"));
        let alias = tree.child(from, "DOCKER-IMAGE-ALIAS").expect("alias");
        assert_eq!(tree.value(alias), Some("base"));
        assert_eq!(tree.position(tag).and_then(|p| p.content()), Some("1.2"));
    }

    #[test]
    fn test_run_script_uses_file_coordinates() {
        let out = parse("FROM x\nRUN apt-get update \\\n    && apt-get install -y curl\n");
        let tree = &out.tree;
        let run = tree.children(tree.root())[1];
        let script = tree.script_of(run).expect("script");
        let commands = tree.elements(script, "BASH-COMMAND");
        assert_eq!(commands.len(), 2);
        let second = tree.position(commands[1]).expect("position");
        assert_eq!((second.start.line, second.start.column), (2, 7));
        assert_eq!(second.content(), Some("apt-get install -y curl"));
    }

    #[test]
    fn test_comments_inside_continuation_are_kept() {
        let out = parse("RUN gem update \\\n    # why\n\n    && echo ok\n# after\n");
        let tree = &out.tree;
        assert_eq!(top_tags(&out), vec!["DOCKER-RUN", "DOCKER-COMMENT"]);
        let run = tree.children(tree.root())[0];
        let comment = tree.child(run, "DOCKER-COMMENT").expect("comment");
        assert_eq!(tree.value(comment), Some("# why"));
        let position = tree.position(comment).expect("position");
        assert_eq!((position.start.line, position.start.column), (1, 4));
        assert_eq!(tree.elements(run, "BASH-COMMAND").len(), 2);
    }

    #[test]
    fn test_exec_form_decodes_strings() {
        let out = parse("ENTRYPOINT [\"/bin/sh\", \"-c\", \"echo \\\"hi\\\"\"]\n");
        let tree = &out.tree;
        let form = tree.elements(tree.root(), "DOCKER-EXEC-FORM")[0];
        let values: Vec<_> = tree
            .sorted_children(form)
            .into_iter()
            .map(|id| tree.value(id).unwrap_or_default().to_string())
            .collect();
        assert_eq!(values, vec!["/bin/sh", "-c", "echo \"hi\""]);
    }

    #[test]
    fn test_malformed_shell_keeps_literal() {
        let out = parse("RUN echo 'oops\n");
        assert_eq!(out.errors.len(), 1);
        let tree = &out.tree;
        let run = tree.children(tree.root())[0];
        let literal = tree.child(run, "DOCKER-LITERAL").expect("literal");
        assert_eq!(tree.value(literal), Some("echo 'oops"));
    }

    #[test]
    fn test_env_legacy_form() {
        let out = parse("ENV PATH /usr/local/bin:$PATH\n");
        let tree = &out.tree;
        let pair = tree.elements(tree.root(), "DOCKER-KEY-VALUE")[0];
        let name = tree.child(pair, "DOCKER-NAME").expect("name");
        let value = tree.child(pair, "DOCKER-LITERAL").expect("value");
        assert_eq!(tree.value(name), Some("PATH"));
        assert_eq!(tree.value(value), Some("/usr/local/bin:$PATH"));
    }

    #[test]
    fn test_onbuild_and_healthcheck_nest() {
        let out = parse("ONBUILD RUN make\nHEALTHCHECK --interval=5s CMD curl -f localhost\n");
        let tree = &out.tree;
        let onbuild = tree.children(tree.root())[0];
        assert!(tree.child(onbuild, "DOCKER-RUN").is_some());
        let health = tree.children(tree.root())[1];
        assert!(tree.child(health, "DOCKER-FLAG").is_some());
        assert!(tree.script_of(health).is_some());
    }

    #[test]
    fn test_nodes_start_unchanged() {
        let out = parse("RUN a && b\n");
        assert!(!out.tree.has_changes(out.tree.root()));
    }
}
