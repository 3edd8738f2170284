//! Dinghy Core
//!
//! Syntax trees for Dockerfiles and the shell scripts embedded in them,
//! together with the machinery rules are built from: a structural query
//! language, command-aware enrichment, literal abstraction and a printer
//! that reproduces untouched source byte for byte.

pub mod abstraction;
pub mod config;
pub mod document;
pub mod enrich;
pub mod error;
pub mod parser;
pub mod position;
pub mod printer;
pub mod query;
pub mod tree;

pub use abstraction::{IDENTITY_TAGS, abstract_tree, classify};
pub use config::{ConfigLoader, DinghyConfig, RuleSeverity};
pub use document::Dockerfile;
pub use enrich::{CommandSpec, EnrichFn, Enricher, EnricherRegistry, FlagSpec, SubcommandSpec, enrich};
pub use error::{DinghyError, ErrorKind, Result};
pub use parser::{ParseError, ParseOutput, parse_dockerfile, parse_shell_fragment};
pub use position::{FileKey, Point, Position, SourceFile};
pub use printer::{PrintError, Printed, print, print_node};
pub use query::{Query, q};
pub use tree::{DiffSummary, NodeId, NodeKind, Tag, Tree, TreeEdit};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    init_tracing_with("dinghy=info");
}

/// Initialize tracing with a default directive, overridable through `RUST_LOG`
pub fn init_tracing_with(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // a second initialisation (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
