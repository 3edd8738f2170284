//! Literal abstraction
//!
//! Leaf values are classified by an ordered table of named patterns, each hit
//! adding an `ABS-*` annotation. Nodes carrying one of the identity tags are
//! folded into a single opaque `ABSTRACT-IDENTITY` token so rules can match
//! "some package" or "some image" without caring which one.

use crate::tree::{NodeId, NodeKind, Tree};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// Ordered classification table: `(annotation, pattern)`
static VALUE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("ABS-URL-HTTPS", r"^https://"),
        ("ABS-URL-HTTP", r"^http://"),
        ("ABS-URL-FTP", r"^ftp://"),
        (
            "ABS-PROBABLY-URL",
            r"^(https?://|ftp://|www\.|[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.(com|org|net|io|dev|edu|gov|co)(:[0-9]+)?(/|$))",
        ),
        ("ABS-APT-LISTS", r"^/var/lib/apt/lists"),
        ("ABS-VAR-CACHE-YUM", r"^/var/cache/yum"),
        ("ABS-ROOT-GEM", r"^(/root|~|\$HOME)/\.gem"),
        ("ABS-USR-SRC-PATH", r"^/usr/src(/|$)"),
        ("ABS-TMP-PATH", r"^/tmp(/|$)"),
        ("ABS-EXTENSION-TAR", r"\.(tar|tar\.gz|tar\.bz2|tar\.xz|tgz|tbz2?|txz)$"),
        ("ABS-EXTENSION-ZIP", r"\.zip$"),
        ("ABS-EXTENSION-ASC", r"\.asc$"),
        ("ABS-EXTENSION-SIG", r"\.sig$"),
        ("ABS-EXTENSION-GPG", r"\.gpg$"),
        ("ABS-SINGLE-SPACE", r"^ $"),
        ("ABS-MULTI-SPACE", r"^ {2,}$"),
        ("ABS-WHITESPACE", r"^\s+$"),
        ("ABS-GEMRC-NO-DOCUMENT", r"gem:\s*--no-(document|rdoc)"),
        ("ABS-CONFIGURE", r"(^|/)configure$"),
    ]
    .into_iter()
    .filter_map(|(tag, pattern)| Regex::new(pattern).ok().map(|re| (tag, re)))
    .collect()
});

/// Tags whose nodes are folded into identity tokens
pub const IDENTITY_TAGS: &[&str] = &[
    "SC-APT-PACKAGE",
    "SC-YUM-PACKAGE",
    "SC-APK-PACKAGE",
    "SC-PIP-PACKAGE",
    "SC-NPM-PACKAGE",
    "SC-GEM-PACKAGE",
    "DOCKER-IMAGE-NAME",
    "DOCKER-PORT",
    "BASH-VARIABLE",
];

/// Annotations the classification table would give `value`
pub fn classify(value: &str) -> Vec<&'static str> {
    VALUE_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(value))
        .map(|(tag, _)| *tag)
        .collect()
}

/// Run both abstraction steps over `tree`
pub fn abstract_tree(tree: &mut Tree) {
    let root = tree.root();
    let mut leaves = Vec::new();
    tree.preorder(root, true, &mut |t, id| {
        if t.kind(id).is_value() {
            leaves.push(id);
        }
    });
    let mut annotated = 0;
    for leaf in leaves {
        let tags = classify(tree.value(leaf).unwrap_or_default());
        for tag in tags {
            trace!("{} gets {}", leaf, tag);
            tree.annotate(leaf, tag);
            annotated += 1;
        }
    }

    let mut identities = Vec::new();
    tree.preorder(root, true, &mut |t, id| {
        if let Some(tag) = IDENTITY_TAGS.iter().find(|tag| t.is_a(id, tag)) {
            identities.push((id, *tag));
        }
    });
    let mut folded = 0;
    for (id, tag) in identities {
        // an enclosing identity already replaced this node
        if !tree.is_descendant_of(id, root) {
            continue;
        }
        fold_identity(tree, id, tag);
        folded += 1;
    }
    debug!("Abstraction added {} annotations and {} identities", annotated, folded);
}

fn fold_identity(tree: &mut Tree, id: NodeId, tag: &str) -> NodeId {
    let value = format!("{}:{}", tag, tree.text_value(id));
    let position = tree.position(id).cloned();
    let identity = tree.new_node(NodeKind::AbstractIdentity(value), position);
    tree.annotate(identity, tag);
    let original = tree.original(id);
    tree.set_original(identity, original);
    tree.replace(id, identity);
    identity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{EnricherRegistry, enrich};
    use crate::parser::parse_shell_fragment;

    #[test]
    fn test_classify_urls_and_paths() {
        assert_eq!(classify("http://example.com"), vec!["ABS-URL-HTTP", "ABS-PROBABLY-URL"]);
        assert!(classify("/var/lib/apt/lists/*").contains(&"ABS-APT-LISTS"));
        assert!(classify("node-v1.tar.gz").contains(&"ABS-EXTENSION-TAR"));
        assert!(classify("/usr/src/app").contains(&"ABS-USR-SRC-PATH"));
        assert!(classify("gem: --no-document").contains(&"ABS-GEMRC-NO-DOCUMENT"));
        assert!(classify("install").is_empty());
    }

    #[test]
    fn test_identity_fold_links_original() {
        let live = parse_shell_fragment("apt-get install -y curl").tree;
        let mut tree = live.clone();
        enrich(&mut tree, &EnricherRegistry::builtin());
        abstract_tree(&mut tree);
        let identities = tree.elements(tree.root(), "ABSTRACT-IDENTITY");
        assert_eq!(identities.len(), 1);
        let identity = identities[0];
        assert_eq!(tree.value(identity), Some("SC-APT-PACKAGE:curl"));
        assert!(tree.is_a(identity, "SC-APT-PACKAGE"));
        let original = tree.original(identity).expect("back-link");
        assert_eq!(live.text_value(original), "curl");
        assert_eq!(tree.position(identity), live.position(original));
    }

    #[test]
    fn test_nested_identities_fold_once() {
        let mut tree = parse_shell_fragment("pip install $PKG").tree.clone();
        enrich(&mut tree, &EnricherRegistry::builtin());
        abstract_tree(&mut tree);
        let identities = tree.elements(tree.root(), "ABSTRACT-IDENTITY");
        assert_eq!(identities.len(), 1);
        assert_eq!(tree.value(identities[0]), Some("SC-PIP-PACKAGE:$PKG"));
    }

    #[test]
    fn test_leaf_annotations() {
        let mut tree = parse_shell_fragment("rm -rf /var/lib/apt/lists/*").tree.clone();
        abstract_tree(&mut tree);
        assert_eq!(tree.elements(tree.root(), "ABS-APT-LISTS").len(), 1);
    }
}
