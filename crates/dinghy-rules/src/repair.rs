//! Tree edits shared by the built-in repairs
//!
//! New syntax is always produced by parsing a small shell fragment and
//! grafting the relevant nodes into the live tree, so inserted code has the
//! same shape the parser would give it. Fragment positions belong to no file
//! and therefore never disturb the spacing of the original text.

use dinghy_core::{DinghyError, NodeId, NodeKind, Result, Tree, parse_shell_fragment};
use tracing::trace;

/// Parse `text` and return its tree together with the first statement
fn fragment(text: &str) -> Result<(Tree, NodeId)> {
    let output = parse_shell_fragment(text);
    if !output.is_clean() {
        return Err(DinghyError::tree_error(format!(
            "cannot parse repair fragment '{text}'"
        )));
    }
    let first = output.tree.sorted_children(output.tree.root()).into_iter().next();
    match first {
        Some(statement) => Ok((output.tree, statement)),
        None => Err(DinghyError::tree_error(format!("empty repair fragment '{text}'"))),
    }
}

/// Parse a single argument word
fn fragment_word(text: &str) -> Result<(Tree, NodeId)> {
    let (tree, statement) = fragment(&format!("x {text}"))?;
    let word = tree.command_args(statement).into_iter().next();
    match word {
        Some(word) => Ok((tree, word)),
        None => Err(DinghyError::tree_error(format!("no word in fragment '{text}'"))),
    }
}

/// Statement containing `command`: the enclosing `&&`/`||`/pipeline chain
pub fn statement_of(tree: &Tree, command: NodeId) -> NodeId {
    let mut current = command;
    while let Some(parent) = tree.parent(current) {
        match tree.kind(parent) {
            NodeKind::BashAndIf | NodeKind::BashOrIf | NodeKind::BashPipeline => current = parent,
            _ => break,
        }
    }
    current
}

/// Insert `flag` as an argument of `command`.
///
/// The word goes right after the first argument equal to `after` (the
/// subcommand), or first when there is no such argument.
pub fn insert_flag(tree: &mut Tree, command: NodeId, after: Option<&str>, flag: &str) -> Result<NodeId> {
    if !matches!(tree.kind(command), NodeKind::BashCommand) {
        return Err(DinghyError::tree_error(format!(
            "cannot add '{flag}' to a {} node",
            tree.tag(command)
        )));
    }
    let (fragment, word) = fragment_word(flag)?;
    let anchor = after.and_then(|subcommand| {
        tree.command_args(command)
            .into_iter()
            .find(|&arg| tree.text_value(arg) == subcommand)
    });
    let inserted = tree.graft(&fragment, word);
    match (anchor, tree.child(command, "BASH-COMMAND-ARGS")) {
        (Some(anchor), _) => {
            tree.insert_after(anchor, inserted);
        }
        (None, Some(args)) => tree.insert_child(args, 0, inserted),
        (None, None) => {
            let args = tree.new_node(NodeKind::BashCommandArgs, None);
            tree.add_child(args, inserted);
            tree.add_child(command, args);
        }
    }
    trace!("Inserted '{}' into {}", flag, command);
    Ok(inserted)
}

/// Run `text` after the statement containing `command`.
///
/// An unterminated statement is joined with `&&` and the new list gets a
/// `;`; a terminated one is followed by the new command as its own
/// statement.
pub fn append_after(tree: &mut Tree, command: NodeId, text: &str) -> Result<NodeId> {
    let statement = statement_of(tree, command);
    if tree.parent(statement).is_none() {
        return Err(DinghyError::tree_error("statement is not attached to a script"));
    }
    let (fragment, follow_up) = fragment(text)?;
    let next = tree.siblings_after(statement).into_iter().next();
    let terminator = next.filter(|&id| matches!(tree.kind(id), NodeKind::BashTerminator(_)));
    let inserted = tree.graft(&fragment, follow_up);

    if let Some(terminator) = terminator {
        tree.insert_after(terminator, inserted);
        trace!("Appended '{}' after terminator {}", text, terminator);
        return Ok(inserted);
    }

    let and_if = tree.new_node(NodeKind::BashAndIf, None);
    tree.replace(statement, and_if);
    let operator = tree.new_node(NodeKind::BashOperator("&&".into()), None);
    tree.add_children(and_if, [statement, operator, inserted]);
    let terminator = tree.new_node(NodeKind::BashTerminator(";".into()), None);
    tree.insert_after(and_if, terminator);
    trace!("Joined '{}' to {} with &&", text, statement);
    Ok(inserted)
}

/// Run `text` before the statement containing `command`, joined with `&&`
pub fn prepend_before(tree: &mut Tree, command: NodeId, text: &str) -> Result<NodeId> {
    let statement = statement_of(tree, command);
    if tree.parent(statement).is_none() {
        return Err(DinghyError::tree_error("statement is not attached to a script"));
    }
    let (fragment, lead) = fragment(text)?;
    let inserted = tree.graft(&fragment, lead);
    let and_if = tree.new_node(NodeKind::BashAndIf, None);
    tree.replace(statement, and_if);
    let operator = tree.new_node(NodeKind::BashOperator("&&".into()), None);
    tree.add_children(and_if, [inserted, operator, statement]);
    trace!("Prepended '{}' to {}", text, statement);
    Ok(inserted)
}

/// Rewrite every `http://` argument of `command` to `https://`
pub fn upgrade_http_urls(tree: &mut Tree, command: NodeId) -> Result<usize> {
    let mut literals = Vec::new();
    for word in tree.command_args(command) {
        if let Some(&first) = tree.sorted_children(word).first()
            && let Some(rest) = tree.value(first).and_then(|v| v.strip_prefix("http://"))
        {
            literals.push((first, format!("https://{rest}")));
        }
    }
    if literals.is_empty() {
        return Err(DinghyError::tree_error("no http:// URL to rewrite"));
    }
    let count = literals.len();
    for (literal, value) in literals {
        tree.set_value(literal, value);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinghy_core::{SourceFile, parse_dockerfile, print};

    fn parse(text: &str) -> Tree {
        parse_dockerfile(SourceFile::new(text)).tree
    }

    fn command(tree: &Tree, index: usize) -> NodeId {
        tree.elements(tree.root(), "BASH-COMMAND")[index]
    }

    #[test]
    fn test_insert_flag_after_subcommand() {
        let mut tree = parse("RUN apk add curl\n");
        let apk = command(&tree, 0);
        insert_flag(&mut tree, apk, Some("add"), "--no-cache").unwrap();
        assert_eq!(print(&tree).text, "RUN apk add --no-cache curl\n");
    }

    #[test]
    fn test_insert_flag_without_subcommand_goes_first() {
        let mut tree = parse("RUN curl -sL https://example.com\n");
        let curl = command(&tree, 0);
        insert_flag(&mut tree, curl, None, "-f").unwrap();
        assert_eq!(print(&tree).text, "RUN curl -f -sL https://example.com\n");
    }

    #[test]
    fn test_insert_flag_into_bare_command() {
        let mut tree = parse("RUN gpg\n");
        let gpg = command(&tree, 0);
        insert_flag(&mut tree, gpg, None, "--batch").unwrap();
        assert_eq!(print(&tree).text, "RUN gpg --batch\n");
    }

    #[test]
    fn test_append_joins_unterminated_statement() {
        let mut tree = parse("RUN yum install -y x\n");
        let yum = command(&tree, 0);
        append_after(&mut tree, yum, "rm -rf /var/cache/yum").unwrap();
        assert_eq!(print(&tree).text, "RUN yum install -y x && rm -rf /var/cache/yum;\n");
    }

    #[test]
    fn test_append_after_existing_terminator() {
        let mut tree = parse("RUN npm install; echo done\n");
        let npm = command(&tree, 0);
        append_after(&mut tree, npm, "npm cache clean --force").unwrap();
        assert_eq!(
            print(&tree).text,
            "RUN npm install; npm cache clean --force; echo done\n"
        );
    }

    #[test]
    fn test_append_before_continued_statement_keeps_separator() {
        let mut tree = parse("RUN apt-get install x; \\\n    echo done\n");
        let install = command(&tree, 0);
        append_after(&mut tree, install, "rm -rf /var/lib/apt/lists/*").unwrap();
        assert_eq!(
            print(&tree).text,
            "RUN apt-get install x; rm -rf /var/lib/apt/lists/*; \\\n    echo done\n"
        );
    }

    #[test]
    fn test_append_after_background_statement() {
        let mut tree = parse("RUN apt-get install x & echo hi\n");
        let install = command(&tree, 0);
        append_after(&mut tree, install, "rm -rf /var/lib/apt/lists/*").unwrap();
        assert_eq!(
            print(&tree).text,
            "RUN apt-get install x & rm -rf /var/lib/apt/lists/*; echo hi\n"
        );
    }

    #[test]
    fn test_append_uses_whole_and_chain() {
        let mut tree = parse("RUN apt-get update && apt-get install -y x\n");
        let install = command(&tree, 1);
        append_after(&mut tree, install, "rm -rf /var/lib/apt/lists/*").unwrap();
        assert_eq!(
            print(&tree).text,
            "RUN apt-get update && apt-get install -y x && rm -rf /var/lib/apt/lists/*;\n"
        );
    }

    #[test]
    fn test_prepend_joins_with_and() {
        let mut tree = parse("RUN apt-get install -y x\n");
        let install = command(&tree, 0);
        prepend_before(&mut tree, install, "apt-get update").unwrap();
        assert_eq!(print(&tree).text, "RUN apt-get update && apt-get install -y x\n");
    }

    #[test]
    fn test_upgrade_http_urls() {
        let mut tree = parse("RUN wget http://example.com/a.tgz\n");
        let wget = command(&tree, 0);
        assert_eq!(upgrade_http_urls(&mut tree, wget).unwrap(), 1);
        assert_eq!(print(&tree).text, "RUN wget https://example.com/a.tgz\n");
        assert!(upgrade_http_urls(&mut tree, wget).is_err());
    }

    #[test]
    fn test_detached_command_is_an_error() {
        let mut tree = Tree::new(NodeKind::BashCommand, None);
        let root = tree.root();
        assert!(append_after(&mut tree, root, "true").is_err());
    }
}
