//! Dockerfile session
//!
//! Owns the live tree of one parsed file together with the enricher registry
//! and a cached analysis view (enriched and abstracted clone) that is rebuilt
//! whenever the live tree's revision moves.

use crate::abstraction::abstract_tree;
use crate::enrich::{EnricherRegistry, enrich};
use crate::error::{DinghyError, Result};
use crate::parser::{ParseError, parse_dockerfile};
use crate::position::SourceFile;
use crate::printer::{Printed, print};
use crate::tree::Tree;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A parsed Dockerfile and its analysis cache
#[derive(Debug)]
pub struct Dockerfile {
    file: Arc<SourceFile>,
    tree: Tree,
    errors: Vec<ParseError>,
    enrichers: Arc<EnricherRegistry>,
    analysis: Option<(u64, Arc<Tree>)>,
}

impl Dockerfile {
    /// Read and parse a file with the built-in enrichers
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DinghyError::io_error(path, e))?;
        info!("Parsing {}", path.display());
        Ok(Self::from_source(
            SourceFile::with_path(path, text),
            Arc::new(EnricherRegistry::builtin()),
        ))
    }

    /// Parse in-memory text with the built-in enrichers
    pub fn parse(text: &str) -> Self {
        Self::from_source(SourceFile::new(text), Arc::new(EnricherRegistry::builtin()))
    }

    pub fn from_source(file: Arc<SourceFile>, enrichers: Arc<EnricherRegistry>) -> Self {
        let output = parse_dockerfile(Arc::clone(&file));
        if !output.is_clean() {
            debug!("Parsed with {} recovered errors", output.errors.len());
        }
        Self {
            file,
            tree: output.tree,
            errors: output.errors,
            enrichers,
            analysis: None,
        }
    }

    pub fn file(&self) -> &Arc<SourceFile> {
        &self.file
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.path()
    }

    /// Problems recovered while parsing
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn enrichers(&self) -> &EnricherRegistry {
        &self.enrichers
    }

    /// The live tree
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The live tree, for repairs
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Enriched and abstracted clone of the live tree.
    ///
    /// Computed once per revision of the live tree.
    pub fn analysis(&mut self) -> Arc<Tree> {
        let revision = self.tree.revision();
        if let Some((cached, tree)) = &self.analysis
            && *cached == revision
        {
            return Arc::clone(tree);
        }
        debug!("Building analysis view at revision {}", revision);
        let mut view = self.tree.clone();
        enrich(&mut view, &self.enrichers);
        abstract_tree(&mut view);
        let view = Arc::new(view);
        self.analysis = Some((revision, Arc::clone(&view)));
        view
    }

    /// Print the live tree
    pub fn print(&self) -> Printed {
        print(&self.tree)
    }
}
