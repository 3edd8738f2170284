//! Tree navigation and query behaviour over parsed Dockerfiles

use dinghy_core::{Dockerfile, NodeId, Query, Tree, q};
use insta::assert_snapshot;

fn outline(tree: &Tree, id: NodeId, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(tree.tag(id));
    if let Some(value) = tree.value(id) {
        out.push_str(&format!(" {value:?}"));
    }
    out.push('\n');
    for child in tree.sorted_children(id) {
        outline(tree, child, depth + 1, out);
    }
}

#[test]
fn test_from_outline() {
    let doc = Dockerfile::parse("FROM alpine:3.19 AS build\n");
    let mut out = String::new();
    outline(doc.tree(), doc.tree().root(), 0, &mut out);
    assert_snapshot!(out, @r#"
    DOCKER-FILE
      DOCKER-FROM
        DOCKER-KEYWORD "FROM"
        DOCKER-IMAGE-NAME "alpine"
        DOCKER-IMAGE-TAG "3.19"
        DOCKER-KEYWORD "AS"
        DOCKER-IMAGE-ALIAS "build"
    "#);
}

#[test]
fn test_run_command_shape() {
    let doc = Dockerfile::parse("RUN apk add --no-cache curl\n");
    let tree = doc.tree();
    let commands = tree.elements(tree.root(), "BASH-COMMAND");
    assert_eq!(commands.len(), 1);
    assert_eq!(tree.command_name_text(commands[0]).as_deref(), Some("apk"));
    assert_eq!(
        tree.command_word_values(commands[0]),
        vec!["add", "--no-cache", "curl"]
    );
}

#[test]
fn test_traverse_stops_at_first_refusal() {
    let doc = Dockerfile::parse("RUN a && b\nRUN c\n");
    let tree = doc.tree();
    let mut visited = Vec::new();
    let completed = tree.traverse(tree.root(), true, |t, id| {
        visited.push(t.tag(id));
        t.tag(id) != "BASH-COMMAND"
    });
    assert!(!completed);
    assert_eq!(visited.last(), Some(&"BASH-COMMAND"));
    assert_eq!(visited.iter().filter(|tag| **tag == "BASH-COMMAND").count(), 1);

    let mut all = 0;
    assert!(tree.traverse(tree.root(), false, |_, _| {
        all += 1;
        true
    }));
    assert!(all > visited.len());
}

#[test]
fn test_sorted_children_follow_source_order() {
    let doc = Dockerfile::parse(
        "FROM x\nRUN set -e; apt-get update && apt-get install -y a | tee log; echo done\nCMD [\"sh\"]\n",
    );
    let tree = doc.tree();
    tree.preorder(tree.root(), true, &mut |t, id| {
        let starts: Vec<_> = t
            .sorted_children(id)
            .into_iter()
            .filter_map(|child| t.start(child))
            .collect();
        assert!(starts.windows(2).all(|pair| pair[0] <= pair[1]), "{}", t.tag(id));
    });
}

#[test]
fn test_all_respects_order_on_analysis_view() {
    let mut doc = Dockerfile::parse("RUN apt-get update && apt-get install -y x\n");
    let view = doc.analysis();
    let root = view.root();
    let forward = Query::all([q("SC-APT-UPDATE"), q("SC-APT-INSTALL")]);
    let backward = Query::all([q("SC-APT-INSTALL"), q("SC-APT-UPDATE")]);
    assert!(forward.matches(&view, root));
    assert!(!backward.matches(&view, root));
    // `one` only looks at immediate children
    let chain = view.elements(root, "BASH-AND-IF")[0];
    assert!(Query::one([q("SC-APT-INSTALL")]).matches(&view, chain));
    assert!(!Query::one([q("SC-APT-INSTALL")]).matches(&view, root));
}

#[test]
fn test_find_returns_document_order() {
    let doc = Dockerfile::parse("RUN echo one\nRUN echo two && echo three\n");
    let tree = doc.tree();
    let words: Vec<String> = tree
        .find(tree.root(), &q("BASH-LITERAL"))
        .into_iter()
        .map(|id| tree.text_value(id))
        .collect();
    assert_eq!(words, vec!["echo", "one", "echo", "two", "echo", "three"]);
}

#[test]
fn test_ancestor_and_instruction_lookup() {
    let doc = Dockerfile::parse("FROM x\nRUN cd /tmp && make\n");
    let tree = doc.tree();
    let make = tree
        .find(tree.root(), &q("BASH-LITERAL").value("make"))
        .into_iter()
        .next()
        .expect("make literal");
    let instruction = tree.instruction_of(make).expect("instruction");
    assert_eq!(tree.tag(instruction), "DOCKER-RUN");
    assert!(tree.ancestor(make, "BASH-AND-IF").is_some());
    assert!(tree.ancestor(make, "DOCKER-FROM").is_none());
}
