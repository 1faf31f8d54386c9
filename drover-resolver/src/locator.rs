//! Locators: addresses identifying one document or a collection of them.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{io_err, ResolveError};

/// Scheme family of a [`Locator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Local file or directory.
    File,
    /// `http` / `https` endpoint.
    Http,
    /// Object storage (`s3`, `gs`, `az`).
    Store,
}

/// An address identifying one document or a collection of documents.
///
/// Everything is normalized to a URL; bare paths become absolute `file://`
/// URLs first. The canonical string form is what deduplication compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    url: Url,
}

impl Locator {
    /// Parse a user-supplied locator string. Anything without a `scheme://`
    /// marker is treated as a filesystem path and made absolute.
    pub fn parse(raw: &str) -> Result<Locator, ResolveError> {
        if raw.contains("://") {
            let url = Url::parse(raw).map_err(|source| ResolveError::InvalidLocator {
                locator: raw.to_string(),
                source,
            })?;
            return Ok(Locator { url });
        }
        let absolute = std::path::absolute(raw).map_err(|source| io_err(raw, source))?;
        Locator::from_path(&absolute)
    }

    /// Build a `file://` locator from a path (made absolute if needed).
    pub fn from_path(path: &Path) -> Result<Locator, ResolveError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::path::absolute(path).map_err(|source| io_err(path, source))?
        };
        let url = Url::from_file_path(&absolute)
            .map_err(|_| ResolveError::InvalidPath { path: absolute })?;
        Ok(Locator { url })
    }

    pub(crate) fn from_url(url: Url) -> Locator {
        Locator { url }
    }

    /// Canonical string form, used for deduplication.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Scheme family; anything unrecognized is an error.
    pub fn scheme(&self) -> Result<Scheme, ResolveError> {
        match self.url.scheme() {
            "file" => Ok(Scheme::File),
            "http" | "https" => Ok(Scheme::Http),
            "s3" | "gs" | "az" => Ok(Scheme::Store),
            other => Err(ResolveError::UnsupportedScheme(other.to_string())),
        }
    }

    /// The filesystem path of a `file` locator.
    pub fn to_file_path(&self) -> Result<PathBuf, ResolveError> {
        self.url.to_file_path().map_err(|_| ResolveError::InvalidPath {
            path: PathBuf::from(self.url.path()),
        })
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.url.fmt(f)
    }
}

/// Whether a file name looks like a drover document.
///
/// Recognized: `Droverfile` exactly, or the suffixes `.drover`,
/// `.droverfile`, `.drover.yaml`, `.drover.yml`.
pub fn is_document_name(name: &str) -> bool {
    name == "Droverfile"
        || name.ends_with(".drover")
        || name.ends_with(".droverfile")
        || name.ends_with(".drover.yaml")
        || name.ends_with(".drover.yml")
}
