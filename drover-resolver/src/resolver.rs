//! Document resolution: locator expansion, fetch, parse, and table merge.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use drover_core::{CancellationToken, PluginRegistry, Target, TargetSpec, TargetTable};

use crate::error::{io_err, ResolveError};
use crate::locator::{is_document_name, Locator, Scheme};
use crate::store;

/// Reserved top-level document key carrying metadata instead of a target.
pub const META_KEY: &str = "_meta";

/// The `_meta` section: locators of documents this document depends on.
#[derive(Debug, Clone, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Resolves document locators into a merged target table.
///
/// One resolver instance corresponds to one orchestrator pass: it remembers
/// which locators it has loaded (so each loads at most once) and produces
/// one table. Document dependencies declared under `_meta.dependencies` are
/// followed exactly one level deep: only documents supplied directly to
/// [`Resolver::resolve`] have theirs expanded; a dependency document's own
/// `_meta` is ignored. That bounds recursion without document-level cycle
/// detection, at the cost of not pulling in transitive document
/// dependencies.
pub struct Resolver {
    registry: Arc<PluginRegistry>,
    loaded: HashSet<String>,
}

impl Resolver {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Resolver {
            registry,
            loaded: HashSet::new(),
        }
    }

    /// Expand and load every supplied locator, in order, and merge all their
    /// targets into a fresh table. Any failure aborts the whole resolution.
    pub fn resolve(
        mut self,
        locators: &[String],
        cancel: &CancellationToken,
    ) -> Result<TargetTable, ResolveError> {
        let mut table = TargetTable::new();
        for raw in locators {
            let locator = Locator::parse(raw)?;
            for document in self.expand(&locator, cancel)? {
                self.load(&mut table, &document, true, cancel)?;
            }
        }
        Ok(table)
    }

    /// Expand a locator into concrete document locators.
    ///
    /// A file yields itself; a directory yields every contained document
    /// (non-recursive, natural listing order); an HTTP locator yields
    /// exactly itself; object storage yields a prefix listing or a single
    /// existing object.
    pub fn expand(
        &self,
        locator: &Locator,
        cancel: &CancellationToken,
    ) -> Result<Vec<Locator>, ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        match locator.scheme()? {
            Scheme::File => expand_path(locator),
            Scheme::Http => Ok(vec![locator.clone()]),
            Scheme::Store => store::expand(locator, cancel),
        }
    }

    /// Load one document and merge its targets into the table.
    ///
    /// `follow_deps` marks a document supplied directly by the run
    /// configuration; only those get their `_meta.dependencies` loaded.
    fn load(
        &mut self,
        table: &mut TargetTable,
        locator: &Locator,
        follow_deps: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ResolveError> {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        if !self.loaded.insert(locator.as_str().to_string()) {
            debug!(locator = %locator, "document already loaded, skipping");
            return Ok(());
        }

        debug!(locator = %locator, follow_deps, "loading document");
        let text = fetch(locator, cancel)?;
        let document: Mapping =
            serde_yaml::from_str(&text).map_err(|source| ResolveError::Parse {
                locator: locator.as_str().to_string(),
                source,
            })?;

        if follow_deps {
            if let Some(meta_value) = document.get(META_KEY) {
                let meta: Meta =
                    serde_yaml::from_value(meta_value.clone()).map_err(|source| {
                        ResolveError::Parse {
                            locator: locator.as_str().to_string(),
                            source,
                        }
                    })?;
                for dependency in &meta.dependencies {
                    let dep_locator = Locator::parse(dependency)?;
                    for dep_document in self.expand(&dep_locator, cancel)? {
                        self.load(table, &dep_document, false, cancel)?;
                    }
                }
            }
        }

        for (key, value) in document {
            let Value::String(id) = key else {
                return Err(ResolveError::InvalidDocument {
                    locator: locator.as_str().to_string(),
                    reason: "top-level keys must be strings".to_string(),
                });
            };
            if id == META_KEY {
                continue;
            }

            // A bare `id:` key is a target with an empty body.
            let spec: TargetSpec = if value.is_null() {
                TargetSpec::default()
            } else {
                serde_yaml::from_value(value).map_err(|source| ResolveError::Parse {
                    locator: locator.as_str().to_string(),
                    source,
                })?
            };
            let target = Target::from_spec(id.clone(), spec, &self.registry)
                .map_err(|source| ResolveError::Target { id, source })?;
            debug!(target_id = %target.id, locator = %locator, "merging target");
            table.insert(target).map_err(|dup| ResolveError::DuplicateTarget {
                id: dup.0,
                locator: locator.as_str().to_string(),
            })?;
        }

        Ok(())
    }
}

fn fetch(locator: &Locator, cancel: &CancellationToken) -> Result<String, ResolveError> {
    if cancel.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }
    match locator.scheme()? {
        Scheme::File => {
            let path = locator.to_file_path()?;
            fs::read_to_string(&path).map_err(|source| io_err(path, source))
        }
        Scheme::Http => {
            let response = ureq::get(locator.as_str())
                .call()
                .map_err(|source| ResolveError::Http {
                    url: locator.as_str().to_string(),
                    source: Box::new(source),
                })?;
            response
                .into_string()
                .map_err(|source| io_err(PathBuf::from(locator.as_str()), source))
        }
        Scheme::Store => store::fetch(locator, cancel),
    }
}

fn expand_path(locator: &Locator) -> Result<Vec<Locator>, ResolveError> {
    let path = locator.to_file_path()?;
    let metadata = fs::metadata(&path).map_err(|source| io_err(&path, source))?;
    if !metadata.is_dir() {
        return Ok(vec![locator.clone()]);
    }

    // Natural listing order on purpose: merge order may only influence which
    // duplicate-id error fires first, never the table contents.
    let mut documents = Vec::new();
    for entry in fs::read_dir(&path).map_err(|source| io_err(&path, source))? {
        let entry = entry.map_err(|source| io_err(&path, source))?;
        let file_type = entry
            .file_type()
            .map_err(|source| io_err(entry.path(), source))?;
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if is_document_name(name) {
            documents.push(Locator::from_path(&entry.path())?);
        }
    }
    Ok(documents)
}
