//! Printing an untouched parse reproduces the source exactly

use dinghy_core::{Dockerfile, NodeKind, SourceFile, parse_dockerfile, print, print_node};

const SAMPLES: &[&str] = &[
    "FROM alpine\n",
    "FROM alpine",
    "\n\n# syntax=docker/dockerfile:1\nFROM ubuntu:22.04 AS base\n\n",
    "FROM debian:bookworm-slim\n\
     RUN set -eux; \\\n\
     \tapt-get update; \\\n\
     \tapt-get install -y --no-install-recommends ca-certificates curl; \\\n\
     \trm -rf /var/lib/apt/lists/*\n\
     ENV LANG=C.UTF-8 \\\n    PATH=/usr/local/bin:$PATH\n\
     CMD [\"bash\"]\n",
    "FROM node:20\r\nWORKDIR /app\r\nCOPY --chown=node:node package*.json ./\r\nRUN npm ci\r\n",
    "FROM python:3.12\n\
     RUN if [ -f requirements.txt ]; then pip install -r requirements.txt; fi \\\n\
     # comment inside a continuation\n\
     \x20   && for f in a b; do echo \"$f\" > /tmp/$f; done\n\
     HEALTHCHECK --interval=30s CMD curl -f http://localhost/ || exit 1\n\
     ONBUILD RUN make   \n\
     LABEL maintainer=\"someone\" version='1'\n\
     EXPOSE 80/tcp 443\n\
     ENTRYPOINT [\"/docker-entrypoint.sh\"]\n",
    "RUN echo 'unterminated\n",
    "FROM scratch\nADD https://example.com/a.tar.gz /\nVOLUME [\"/data\"]\nUSER 1000:1000\nSTOPSIGNAL SIGTERM\n",
];

#[test]
fn test_untouched_parse_prints_source() {
    for sample in SAMPLES {
        let output = parse_dockerfile(SourceFile::new(*sample));
        assert_eq!(print(&output.tree).text, *sample, "sample {sample:?}");
    }
}

#[test]
fn test_regenerated_root_matches_source_when_nodes_are_untouched() {
    // marking only the root forces the per-node path for every instruction
    for sample in [SAMPLES[0], SAMPLES[3], SAMPLES[4], SAMPLES[7]] {
        let mut doc = Dockerfile::parse(sample);
        let root = doc.tree().root();
        doc.tree_mut().mark_changed(root);
        let printed = doc.print();
        assert!(printed.is_clean());
        assert_eq!(printed.text, sample, "sample {sample:?}");
    }
}

#[test]
fn test_print_node_of_instruction() {
    let doc = Dockerfile::parse("FROM x\nRUN apt-get update \\\n  && apt-get install y\n");
    let tree = doc.tree();
    let run = tree
        .sorted_children(tree.root())
        .into_iter()
        .find(|&id| matches!(tree.kind(id), NodeKind::DockerRun))
        .expect("run");
    assert_eq!(
        print_node(tree, run).text,
        "RUN apt-get update \\\n  && apt-get install y"
    );
}
