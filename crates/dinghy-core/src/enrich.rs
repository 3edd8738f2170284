//! Command-specific semantic tagging
//!
//! Each registered command name maps to an [`Enricher`]. Most enrichers are a
//! declarative [`CommandSpec`] (subcommands, flags, positional arguments)
//! interpreted by one generic tagger; custom functions can be registered for
//! commands whose command lines do not fit that shape.
//!
//! Enrichment only adds annotations and option groups. It runs on analysis
//! clones, never on the live tree.

use crate::tree::{NodeId, NodeKind, Tree};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Signature of a custom enricher: `(tree, command, arg strings, arg words)`
pub type EnrichFn = fn(&mut Tree, NodeId, &[String], &[NodeId]);

/// A flag a command understands
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    pub short: Option<char>,
    pub long: Option<&'static str>,
    pub takes_value: bool,
    pub tag: &'static str,
}

impl FlagSpec {
    pub const fn short(short: char, tag: &'static str) -> Self {
        Self {
            short: Some(short),
            long: None,
            takes_value: false,
            tag,
        }
    }

    pub const fn long(long: &'static str, tag: &'static str) -> Self {
        Self {
            short: None,
            long: Some(long),
            takes_value: false,
            tag,
        }
    }

    pub const fn both(short: char, long: &'static str, tag: &'static str) -> Self {
        Self {
            short: Some(short),
            long: Some(long),
            takes_value: false,
            tag,
        }
    }

    pub const fn with_value(self) -> Self {
        Self {
            takes_value: true,
            ..self
        }
    }
}

/// A subcommand, possibly spanning several words (`cache clean`)
#[derive(Debug, Clone, Copy)]
pub struct SubcommandSpec {
    pub name: &'static str,
    pub tag: &'static str,
    /// Tag for the positional arguments that follow the subcommand
    pub positional: Option<&'static str>,
}

const fn sub(name: &'static str, tag: &'static str, positional: Option<&'static str>) -> SubcommandSpec {
    SubcommandSpec {
        name,
        tag,
        positional,
    }
}

/// Declarative description of a command line
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Tag added to every invocation
    pub tag: &'static str,
    pub subcommands: &'static [SubcommandSpec],
    pub flags: &'static [FlagSpec],
    /// Tag for positional arguments when no subcommand claims them
    pub positional: Option<&'static str>,
    /// First argument may be a dash-less short flag cluster (`tar xzf`)
    pub bundled_first: bool,
}

impl CommandSpec {
    fn by_short(&self, c: char) -> Option<&FlagSpec> {
        self.flags.iter().find(|f| f.short == Some(c))
    }

    fn by_long(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.iter().find(|f| f.long == Some(name))
    }
}

/// A registered tagger
#[derive(Debug, Clone, Copy)]
pub enum Enricher {
    Spec(&'static CommandSpec),
    Custom(EnrichFn),
}

impl Enricher {
    pub fn apply(&self, tree: &mut Tree, command: NodeId, args: &[String], words: &[NodeId]) {
        match self {
            Enricher::Spec(spec) => tag_command(spec, tree, command, args, words),
            Enricher::Custom(f) => f(tree, command, args, words),
        }
    }
}

/// Explicit table from command name to enricher
#[derive(Debug, Clone, Default)]
pub struct EnricherRegistry {
    enrichers: HashMap<String, Enricher>,
}

impl EnricherRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command table
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, spec) in BUILTIN_SPECS {
            registry.register(*name, Enricher::Spec(*spec));
        }
        debug!("Registered {} built-in enrichers", registry.len());
        registry
    }

    /// Register an enricher, replacing any previous one for the same name
    pub fn register(&mut self, name: impl Into<String>, enricher: Enricher) {
        let name = name.into();
        if self.enrichers.insert(name.clone(), enricher).is_some() {
            debug!("Replaced enricher for '{}'", name);
        }
    }

    /// Look up by command name; a path such as `./configure` resolves by its
    /// last component
    pub fn get(&self, command: &str) -> Option<&Enricher> {
        self.enrichers.get(command).or_else(|| {
            let base = command.rsplit('/').next()?;
            self.enrichers.get(base)
        })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.enrichers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.enrichers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enrichers.is_empty()
    }
}

/// Run every registered enricher over the simple commands of `tree`
pub fn enrich(tree: &mut Tree, registry: &EnricherRegistry) {
    let commands = tree.elements(tree.root(), "BASH-COMMAND");
    let mut tagged = 0;
    for command in commands {
        let Some(name) = tree.command_name_text(command) else {
            continue;
        };
        let Some(enricher) = registry.get(&name) else {
            continue;
        };
        let words = tree.command_args(command);
        let args: Vec<String> = words.iter().map(|&w| tree.text_value(w)).collect();
        trace!("Enriching '{}' with {} arguments", name, args.len());
        enricher.apply(tree, command, &args, &words);
        tagged += 1;
    }
    debug!("Enriched {} commands", tagged);
}

/// The generic tagger behind [`Enricher::Spec`]
pub fn tag_command(spec: &CommandSpec, tree: &mut Tree, command: NodeId, args: &[String], words: &[NodeId]) {
    tree.annotate(command, spec.tag);
    let mut positionals: Vec<usize> = Vec::new();
    let mut options_done = false;
    let mut i = 0;
    while i < words.len() {
        let arg = args[i].as_str();
        let word = words[i];
        if options_done || arg == "-" || !arg.starts_with('-') {
            let bundled = i == 0
                && spec.bundled_first
                && !arg.is_empty()
                && arg.chars().all(|c| c.is_ascii_alphabetic());
            if bundled {
                i += tag_short_cluster(spec, tree, arg, i, words);
            } else {
                positionals.push(i);
                i += 1;
            }
            continue;
        }
        if arg == "--" {
            options_done = true;
            i += 1;
            continue;
        }
        if let Some(long) = arg.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let Some(flag) = spec.by_long(name) else {
                i += 1;
                continue;
            };
            tree.annotate(word, flag.tag);
            if flag.takes_value && inline.is_none() && i + 1 < words.len() {
                option_group(tree, word, words[i + 1], flag.tag);
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        i += tag_short_cluster(spec, tree, &arg[1..], i, words);
    }

    let values: Vec<&str> = positionals.iter().map(|&i| args[i].as_str()).collect();
    let subcommand = spec
        .subcommands
        .iter()
        .filter(|s| {
            let parts: Vec<&str> = s.name.split(' ').collect();
            values.len() >= parts.len() && values[..parts.len()] == parts[..]
        })
        .max_by_key(|s| s.name.split(' ').count());
    let (skip, positional_tag) = match subcommand {
        Some(s) => {
            tree.annotate(command, s.tag);
            (s.name.split(' ').count(), s.positional)
        }
        None => (0, spec.positional),
    };
    if let Some(tag) = positional_tag {
        for &index in positionals.iter().skip(skip) {
            tree.annotate(words[index], tag);
        }
    }
}

/// Tag each flag of a short cluster; returns how many words were consumed
fn tag_short_cluster(spec: &CommandSpec, tree: &mut Tree, cluster: &str, i: usize, words: &[NodeId]) -> usize {
    let word = words[i];
    let count = cluster.chars().count();
    for (k, c) in cluster.chars().enumerate() {
        let Some(flag) = spec.by_short(c) else {
            continue;
        };
        tree.annotate(word, flag.tag);
        if flag.takes_value {
            if k + 1 == count && i + 1 < words.len() {
                option_group(tree, word, words[i + 1], flag.tag);
                return 2;
            }
            // the rest of the cluster is the value
            return 1;
        }
    }
    1
}

/// Merge a flag word and its value word under one `SC-OPTION-GROUP`
fn option_group(tree: &mut Tree, flag: NodeId, value: NodeId, tag: &str) {
    let position = match (tree.position(flag), tree.position(value)) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, _) => a.cloned(),
    };
    let group = tree.new_node(NodeKind::OptionGroup, position);
    tree.annotate(group, tag);
    tree.insert_before(flag, group);
    tree.add_child(group, flag);
    tree.add_child(group, value);
}

// ----------------------------------------------------------------------
// Built-in command tables
// ----------------------------------------------------------------------

const APT_FLAGS: &[FlagSpec] = &[
    FlagSpec::both('y', "yes", "SC-APT-F-YES"),
    FlagSpec::long("assume-yes", "SC-APT-F-YES"),
    FlagSpec::both('q', "quiet", "SC-APT-F-QUIET"),
    FlagSpec::long("no-install-recommends", "SC-APT-F-NO-INSTALL-RECOMMENDS"),
    FlagSpec::long("no-install-suggests", "SC-APT-F-NO-INSTALL-SUGGESTS"),
    FlagSpec::short('o', "SC-APT-F-OPTION").with_value(),
    FlagSpec::short('t', "SC-APT-F-TARGET-RELEASE").with_value(),
    FlagSpec::long("force-yes", "SC-APT-F-FORCE-YES"),
];

const APT_SUBCOMMANDS: &[SubcommandSpec] = &[
    sub("install", "SC-APT-INSTALL", Some("SC-APT-PACKAGE")),
    sub("update", "SC-APT-UPDATE", None),
    sub("upgrade", "SC-APT-UPGRADE", None),
    sub("dist-upgrade", "SC-APT-DIST-UPGRADE", None),
    sub("remove", "SC-APT-REMOVE", Some("SC-APT-PACKAGE")),
    sub("purge", "SC-APT-PURGE", Some("SC-APT-PACKAGE")),
    sub("autoremove", "SC-APT-AUTOREMOVE", None),
    sub("clean", "SC-APT-CLEAN", None),
];

const APT_GET: CommandSpec = CommandSpec {
    tag: "SC-APT-GET",
    subcommands: APT_SUBCOMMANDS,
    flags: APT_FLAGS,
    positional: None,
    bundled_first: false,
};

const APT: CommandSpec = CommandSpec {
    tag: "SC-APT",
    ..APT_GET
};

const YUM: CommandSpec = CommandSpec {
    tag: "SC-YUM",
    subcommands: &[
        sub("install", "SC-YUM-INSTALL", Some("SC-YUM-PACKAGE")),
        sub("update", "SC-YUM-UPDATE", None),
        sub("remove", "SC-YUM-REMOVE", Some("SC-YUM-PACKAGE")),
        sub("clean all", "SC-YUM-CLEAN-ALL", None),
        sub("clean", "SC-YUM-CLEAN", None),
    ],
    flags: &[
        FlagSpec::both('y', "assumeyes", "SC-YUM-F-ASSUMEYES"),
        FlagSpec::both('q', "quiet", "SC-YUM-F-QUIET"),
        FlagSpec::long("setopt", "SC-YUM-F-SETOPT").with_value(),
        FlagSpec::long("enablerepo", "SC-YUM-F-ENABLEREPO").with_value(),
    ],
    positional: None,
    bundled_first: false,
};

// dnf accepts yum's command line
const DNF: CommandSpec = CommandSpec {
    tag: "SC-DNF",
    ..YUM
};

const APK: CommandSpec = CommandSpec {
    tag: "SC-APK",
    subcommands: &[
        sub("add", "SC-APK-ADD", Some("SC-APK-PACKAGE")),
        sub("del", "SC-APK-DEL", Some("SC-APK-PACKAGE")),
        sub("update", "SC-APK-UPDATE", None),
        sub("upgrade", "SC-APK-UPGRADE", None),
    ],
    flags: &[
        FlagSpec::long("no-cache", "SC-APK-F-NO-CACHE"),
        FlagSpec::both('U', "update-cache", "SC-APK-F-UPDATE-CACHE"),
        FlagSpec::both('t', "virtual", "SC-APK-F-VIRTUAL").with_value(),
        FlagSpec::both('q', "quiet", "SC-APK-F-QUIET"),
        FlagSpec::long("repository", "SC-APK-F-REPOSITORY").with_value(),
    ],
    positional: None,
    bundled_first: false,
};

const PIP: CommandSpec = CommandSpec {
    tag: "SC-PIP",
    subcommands: &[
        sub("install", "SC-PIP-INSTALL", Some("SC-PIP-PACKAGE")),
        sub("uninstall", "SC-PIP-UNINSTALL", Some("SC-PIP-PACKAGE")),
        sub("download", "SC-PIP-DOWNLOAD", Some("SC-PIP-PACKAGE")),
    ],
    flags: &[
        FlagSpec::long("no-cache-dir", "SC-PIP-F-NO-CACHE-DIR"),
        FlagSpec::both('r', "requirement", "SC-PIP-F-REQUIREMENT").with_value(),
        FlagSpec::both('U', "upgrade", "SC-PIP-F-UPGRADE"),
        FlagSpec::both('q', "quiet", "SC-PIP-F-QUIET"),
        FlagSpec::long("user", "SC-PIP-F-USER"),
        FlagSpec::both('e', "editable", "SC-PIP-F-EDITABLE").with_value(),
        FlagSpec::both('i', "index-url", "SC-PIP-F-INDEX-URL").with_value(),
        FlagSpec::long("extra-index-url", "SC-PIP-F-EXTRA-INDEX-URL").with_value(),
    ],
    positional: None,
    bundled_first: false,
};

const PIP3: CommandSpec = PIP;

const NPM: CommandSpec = CommandSpec {
    tag: "SC-NPM",
    subcommands: &[
        sub("install", "SC-NPM-INSTALL", Some("SC-NPM-PACKAGE")),
        sub("i", "SC-NPM-INSTALL", Some("SC-NPM-PACKAGE")),
        sub("ci", "SC-NPM-CI", None),
        sub("uninstall", "SC-NPM-UNINSTALL", Some("SC-NPM-PACKAGE")),
        sub("cache clean", "SC-NPM-CACHE-CLEAN", None),
        sub("run", "SC-NPM-RUN", None),
    ],
    flags: &[
        FlagSpec::both('f', "force", "SC-NPM-F-FORCE"),
        FlagSpec::both('g', "global", "SC-NPM-F-GLOBAL"),
        FlagSpec::long("production", "SC-NPM-F-PRODUCTION"),
        FlagSpec::both('S', "save", "SC-NPM-F-SAVE"),
        FlagSpec::both('D', "save-dev", "SC-NPM-F-SAVE-DEV"),
        FlagSpec::long("unsafe-perm", "SC-NPM-F-UNSAFE-PERM"),
        FlagSpec::long("registry", "SC-NPM-F-REGISTRY").with_value(),
    ],
    positional: None,
    bundled_first: false,
};

const GEM: CommandSpec = CommandSpec {
    tag: "SC-GEM",
    subcommands: &[
        sub("install", "SC-GEM-INSTALL", Some("SC-GEM-PACKAGE")),
        sub("update", "SC-GEM-UPDATE", Some("SC-GEM-PACKAGE")),
        sub("uninstall", "SC-GEM-UNINSTALL", Some("SC-GEM-PACKAGE")),
    ],
    flags: &[
        FlagSpec::long("no-document", "SC-GEM-F-NO-DOCUMENT"),
        FlagSpec::short('N', "SC-GEM-F-NO-DOCUMENT"),
        FlagSpec::long("no-rdoc", "SC-GEM-F-NO-RDOC"),
        FlagSpec::long("no-ri", "SC-GEM-F-NO-RI"),
        FlagSpec::long("system", "SC-GEM-F-SYSTEM"),
        FlagSpec::both('v', "version", "SC-GEM-F-VERSION").with_value(),
    ],
    positional: None,
    bundled_first: false,
};

const CURL: CommandSpec = CommandSpec {
    tag: "SC-CURL",
    subcommands: &[],
    flags: &[
        FlagSpec::both('f', "fail", "SC-CURL-F-FAIL"),
        FlagSpec::both('s', "silent", "SC-CURL-F-SILENT"),
        FlagSpec::both('S', "show-error", "SC-CURL-F-SHOW-ERROR"),
        FlagSpec::both('L', "location", "SC-CURL-F-LOCATION"),
        FlagSpec::both('k', "insecure", "SC-CURL-F-INSECURE"),
        FlagSpec::both('O', "remote-name", "SC-CURL-F-REMOTE-NAME"),
        FlagSpec::both('o', "output", "SC-CURL-F-OUTPUT").with_value(),
        FlagSpec::both('H', "header", "SC-CURL-F-HEADER").with_value(),
        FlagSpec::both('X', "request", "SC-CURL-F-REQUEST").with_value(),
        FlagSpec::both('d', "data", "SC-CURL-F-DATA").with_value(),
        FlagSpec::both('u', "user", "SC-CURL-F-USER").with_value(),
        FlagSpec::both('A', "user-agent", "SC-CURL-F-USER-AGENT").with_value(),
        FlagSpec::both('m', "max-time", "SC-CURL-F-MAX-TIME").with_value(),
        FlagSpec::long("retry", "SC-CURL-F-RETRY").with_value(),
        FlagSpec::long("connect-timeout", "SC-CURL-F-CONNECT-TIMEOUT").with_value(),
        FlagSpec::long("create-dirs", "SC-CURL-F-CREATE-DIRS"),
        FlagSpec::long("compressed", "SC-CURL-F-COMPRESSED"),
    ],
    positional: Some("SC-CURL-URL"),
    bundled_first: false,
};

const WGET: CommandSpec = CommandSpec {
    tag: "SC-WGET",
    subcommands: &[],
    flags: &[
        FlagSpec::both('q', "quiet", "SC-WGET-F-QUIET"),
        FlagSpec::both('O', "output-document", "SC-WGET-F-OUTPUT-DOCUMENT").with_value(),
        FlagSpec::both('P', "directory-prefix", "SC-WGET-F-DIRECTORY-PREFIX").with_value(),
        FlagSpec::long("no-check-certificate", "SC-WGET-F-NO-CHECK-CERTIFICATE"),
        FlagSpec::both('c', "continue", "SC-WGET-F-CONTINUE"),
        FlagSpec::both('T', "timeout", "SC-WGET-F-TIMEOUT").with_value(),
        FlagSpec::long("progress", "SC-WGET-F-PROGRESS").with_value(),
    ],
    positional: Some("SC-WGET-URL"),
    bundled_first: false,
};

const RM: CommandSpec = CommandSpec {
    tag: "SC-RM",
    subcommands: &[],
    flags: &[
        FlagSpec::both('r', "recursive", "SC-RM-F-RECURSIVE"),
        FlagSpec::short('R', "SC-RM-F-RECURSIVE"),
        FlagSpec::both('f', "force", "SC-RM-F-FORCE"),
        FlagSpec::both('v', "verbose", "SC-RM-F-VERBOSE"),
    ],
    positional: Some("SC-RM-PATH"),
    bundled_first: false,
};

const MKDIR: CommandSpec = CommandSpec {
    tag: "SC-MKDIR",
    subcommands: &[],
    flags: &[
        FlagSpec::both('p', "parents", "SC-MKDIR-F-PARENTS"),
        FlagSpec::both('m', "mode", "SC-MKDIR-F-MODE").with_value(),
        FlagSpec::both('v', "verbose", "SC-MKDIR-F-VERBOSE"),
    ],
    positional: Some("SC-MKDIR-PATH"),
    bundled_first: false,
};

const TAR: CommandSpec = CommandSpec {
    tag: "SC-TAR",
    subcommands: &[],
    flags: &[
        FlagSpec::both('x', "extract", "SC-TAR-F-EXTRACT"),
        FlagSpec::long("get", "SC-TAR-F-EXTRACT"),
        FlagSpec::both('c', "create", "SC-TAR-F-CREATE"),
        FlagSpec::both('t', "list", "SC-TAR-F-LIST"),
        FlagSpec::both('z', "gzip", "SC-TAR-F-GZIP"),
        FlagSpec::both('j', "bzip2", "SC-TAR-F-BZIP2"),
        FlagSpec::both('J', "xz", "SC-TAR-F-XZ"),
        FlagSpec::both('v', "verbose", "SC-TAR-F-VERBOSE"),
        FlagSpec::both('f', "file", "SC-TAR-F-FILE").with_value(),
        FlagSpec::both('C', "directory", "SC-TAR-F-DIRECTORY").with_value(),
        FlagSpec::long("strip-components", "SC-TAR-F-STRIP-COMPONENTS").with_value(),
    ],
    positional: Some("SC-TAR-PATH"),
    bundled_first: true,
};

const GPG: CommandSpec = CommandSpec {
    tag: "SC-GPG",
    subcommands: &[],
    flags: &[
        FlagSpec::long("batch", "SC-GPG-F-BATCH"),
        FlagSpec::long("no-tty", "SC-GPG-F-NO-TTY"),
        FlagSpec::long("keyserver", "SC-GPG-F-KEYSERVER").with_value(),
        FlagSpec::long("recv-keys", "SC-GPG-F-RECV-KEYS"),
        FlagSpec::long("verify", "SC-GPG-F-VERIFY"),
        FlagSpec::long("import", "SC-GPG-F-IMPORT"),
        FlagSpec::long("export", "SC-GPG-F-EXPORT"),
        FlagSpec::long("dearmor", "SC-GPG-F-DEARMOR"),
        FlagSpec::both('a', "armor", "SC-GPG-F-ARMOR"),
        FlagSpec::both('o', "output", "SC-GPG-F-OUTPUT").with_value(),
        FlagSpec::long("homedir", "SC-GPG-F-HOMEDIR").with_value(),
        FlagSpec::both('q', "quiet", "SC-GPG-F-QUIET"),
    ],
    positional: Some("SC-GPG-ARG"),
    bundled_first: false,
};

const ECHO: CommandSpec = CommandSpec {
    tag: "SC-ECHO",
    subcommands: &[],
    flags: &[
        FlagSpec::short('e', "SC-ECHO-F-ESCAPES"),
        FlagSpec::short('n', "SC-ECHO-F-NO-NEWLINE"),
    ],
    positional: Some("SC-ECHO-ITEM"),
    bundled_first: false,
};

const SHA256SUM: CommandSpec = CommandSpec {
    tag: "SC-SHA256SUM",
    subcommands: &[],
    flags: &[
        FlagSpec::both('c', "check", "SC-SHA256SUM-F-CHECK"),
        FlagSpec::long("strict", "SC-SHA256SUM-F-STRICT"),
    ],
    positional: Some("SC-SHA256SUM-PATH"),
    bundled_first: false,
};

const CONFIGURE: CommandSpec = CommandSpec {
    tag: "SC-CONFIGURE",
    subcommands: &[],
    flags: &[
        FlagSpec::long("build", "SC-CONFIGURE-F-BUILD").with_value(),
        FlagSpec::long("host", "SC-CONFIGURE-F-HOST").with_value(),
        FlagSpec::long("prefix", "SC-CONFIGURE-F-PREFIX").with_value(),
    ],
    positional: None,
    bundled_first: false,
};

const MKTEMP: CommandSpec = CommandSpec {
    tag: "SC-MKTEMP",
    subcommands: &[],
    flags: &[
        FlagSpec::both('d', "directory", "SC-MKTEMP-F-DIRECTORY"),
        FlagSpec::short('t', "SC-MKTEMP-F-TMPDIR"),
        FlagSpec::both('p', "tmpdir", "SC-MKTEMP-F-TMPDIR").with_value(),
    ],
    positional: Some("SC-MKTEMP-TEMPLATE"),
    bundled_first: false,
};

const CD: CommandSpec = CommandSpec {
    tag: "SC-CD",
    subcommands: &[],
    flags: &[],
    positional: Some("SC-CD-PATH"),
    bundled_first: false,
};

const BUILTIN_SPECS: &[(&str, &CommandSpec)] = &[
    ("apt-get", &APT_GET),
    ("apt", &APT),
    ("yum", &YUM),
    ("dnf", &DNF),
    ("apk", &APK),
    ("pip", &PIP),
    ("pip3", &PIP3),
    ("npm", &NPM),
    ("gem", &GEM),
    ("curl", &CURL),
    ("wget", &WGET),
    ("rm", &RM),
    ("mkdir", &MKDIR),
    ("tar", &TAR),
    ("gpg", &GPG),
    ("echo", &ECHO),
    ("sha256sum", &SHA256SUM),
    ("configure", &CONFIGURE),
    ("mktemp", &MKTEMP),
    ("cd", &CD),
];
