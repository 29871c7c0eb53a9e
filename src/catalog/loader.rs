//! Catalog loading with path fallbacks.
//!
//! Documents are fetched through a `CatalogSource` so the session never
//! cares whether data comes from disk or from memory (tests, embedding).
//! Loading never fails: a document that cannot be fetched or parsed from
//! any candidate path degrades to an empty object and the failure is logged.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{parse_uniques, Catalog, CoreCatalog, GemCatalog};
use crate::error::{RandomancerError, Result};

/// Something that can hand out raw catalog documents by relative path
pub trait CatalogSource {
    fn fetch(&self, path: &str) -> Result<String>;
}

/// Documents read from a directory on disk
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl CatalogSource for FsSource {
    fn fetch(&self, path: &str) -> Result<String> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(RandomancerError::NotFound(full));
        }
        Ok(std::fs::read_to_string(full)?)
    }
}

/// In-memory documents keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    docs: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, body: impl Into<String>) -> Self {
        self.docs.insert(path.to_string(), body.into());
        self
    }
}

impl CatalogSource for MemorySource {
    fn fetch(&self, path: &str) -> Result<String> {
        self.docs
            .get(path)
            .cloned()
            .ok_or_else(|| RandomancerError::NotFound(PathBuf::from(path)))
    }
}

/// Candidate paths per document, tried in order
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub core: Vec<String>,
    pub gems: Vec<String>,
    pub skills: Vec<String>,
    pub uniques: Vec<String>,
}

impl Default for CatalogPaths {
    fn default() -> Self {
        Self {
            core: vec!["data_0.8.0.json".to_string()],
            gems: vec!["data/skill_gems.json".to_string(), "gems.json".to_string()],
            skills: vec!["data/skills.json".to_string()],
            uniques: vec!["uniques_enriched_0.8.0.json".to_string()],
        }
    }
}

/// Memoizes parsed documents by path; each path is fetched at most once
#[derive(Debug, Default)]
pub struct CatalogCache {
    docs: HashMap<String, Value>,
    misses: HashSet<String>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.docs.len()
    }

    fn load_one(&mut self, source: &dyn CatalogSource, path: &str) -> Option<Value> {
        if let Some(doc) = self.docs.get(path) {
            return Some(doc.clone());
        }
        if self.misses.contains(path) {
            return None;
        }
        let parsed = source
            .fetch(path)
            .and_then(|body| serde_json::from_str::<Value>(&body).map_err(RandomancerError::from));
        match parsed {
            Ok(doc) => {
                info!(path, "loaded catalog document");
                self.docs.insert(path.to_string(), doc.clone());
                Some(doc)
            }
            Err(e) => {
                info!(path, error = %e, "catalog document unavailable, trying next path");
                self.misses.insert(path.to_string());
                None
            }
        }
    }

    /// First candidate path that fetches and parses
    pub fn try_load(&mut self, source: &dyn CatalogSource, paths: &[String]) -> Result<Value> {
        for path in paths {
            if let Some(doc) = self.load_one(source, path) {
                return Ok(doc);
            }
        }
        Err(RandomancerError::Fetch {
            paths: paths.to_vec(),
        })
    }

    /// Like `try_load`, but degrades to an empty object
    pub fn load_or_empty(&mut self, source: &dyn CatalogSource, paths: &[String]) -> Value {
        self.try_load(source, paths).unwrap_or_else(|err| {
            warn!("{err}");
            Value::Object(Default::default())
        })
    }
}

/// Load every document and assemble the catalog. Never fails; missing
/// documents produce empty sections.
pub fn load_catalog(
    source: &dyn CatalogSource,
    cache: &mut CatalogCache,
    paths: &CatalogPaths,
) -> Catalog {
    let core_doc = cache.load_or_empty(source, &paths.core);
    let gems_doc = cache.load_or_empty(source, &paths.gems);
    let skills_doc = cache.load_or_empty(source, &paths.skills);
    let uniques_doc = cache.load_or_empty(source, &paths.uniques);

    let catalog = Catalog {
        core: CoreCatalog::from_document(&core_doc),
        gems: GemCatalog::enrich(&gems_doc, &skills_doc),
        uniques: parse_uniques(&uniques_doc),
    };
    info!(
        classes = catalog.core.classes.len(),
        gems = catalog.gems.len(),
        uniques = catalog.uniques.len(),
        "catalog ready"
    );
    catalog
}
