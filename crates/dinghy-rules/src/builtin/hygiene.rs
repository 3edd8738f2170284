//! Build hygiene rules
//!
//! Temporary build inputs (archives, sources, scratch directories) should
//! be removed in the same layer that created them. Only the `configure`
//! rule can be repaired automatically.

use crate::repair::insert_flag;
use crate::rule::Rule;
use dinghy_core::{NodeId, Query, Result, Tree, q};

pub const CONFIGURE_SHOULD_USE_BUILD_FLAG: &str = "configureShouldUseBuildFlag";
pub const TAR_SOMETHING_RM_THE_SOMETHING: &str = "tarSomethingRmTheSomething";
pub const MKDIR_USR_SRC_THEN_REMOVE: &str = "mkdirUsrSrcThenRemove";
pub const RM_RECURSIVE_AFTER_MKTEMP_D: &str = "rmRecursiveAfterMktempD";

const BUILD_FLAG: &str = "--build=\"$(dpkg-architecture --query DEB_BUILD_GNU_TYPE)\"";

/// `command` with some descendant tagged `tag`
fn with(command: &str, tag: &str) -> Query {
    Query::and([q(command), Query::all([q(tag)])])
}

pub fn rules() -> Vec<Rule> {
    vec![
        Rule::new(
            CONFIGURE_SHOULD_USE_BUILD_FLAG,
            "./configure should be given --build",
            q("SC-CONFIGURE"),
        )
        .in_node(q("SC-CONFIGURE-F-BUILD"))
        .repair(configure_build),
        Rule::new(
            TAR_SOMETHING_RM_THE_SOMETHING,
            "an extracted archive should be removed afterwards",
            Query::and([
                with("SC-TAR", "SC-TAR-F-EXTRACT"),
                Query::all([q("ABS-EXTENSION-TAR")]),
            ]),
        )
        .after(q("SC-RM-PATH").child(q("ABS-EXTENSION-TAR"))),
        Rule::new(
            MKDIR_USR_SRC_THEN_REMOVE,
            "sources created under /usr/src should be removed afterwards",
            with("SC-MKDIR", "ABS-USR-SRC-PATH"),
        )
        .after(q("SC-RM-PATH").child(q("ABS-USR-SRC-PATH"))),
        Rule::new(
            RM_RECURSIVE_AFTER_MKTEMP_D,
            "a directory from mktemp -d should be removed with rm -r",
            with("SC-MKTEMP", "SC-MKTEMP-F-DIRECTORY"),
        )
        .after(q("SC-RM-F-RECURSIVE")),
    ]
}

fn configure_build(tree: &mut Tree, command: NodeId) -> Result<()> {
    insert_flag(tree, command, None, BUILD_FLAG).map(drop)
}
