//! Object-storage access for `s3` / `gs` / `az` document locators.
//!
//! `object_store` is async; resolution is synchronous, so each operation
//! drives a small current-thread runtime. That keeps the resolver callable
//! from both the CLI thread and the daemon's blocking worker.

use std::future::Future;

use futures::TryStreamExt;
use object_store::{parse_url, ObjectStore};
use tracing::debug;
use url::Url;

use drover_core::CancellationToken;

use crate::error::{io_err, ResolveError};
use crate::locator::{is_document_name, Locator};

fn store_err(url: &Url, source: object_store::Error) -> ResolveError {
    ResolveError::Store {
        url: url.to_string(),
        source,
    }
}

fn block_on<F: Future>(future: F) -> Result<F::Output, ResolveError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| io_err("tokio-runtime", source))?;
    Ok(runtime.block_on(future))
}

/// Whether the locator addresses a prefix (listing form) rather than a
/// single object: its path ends in a separator or is empty.
fn is_prefix(url: &Url) -> bool {
    let path = url.path().trim_start_matches('/');
    path.is_empty() || path.ends_with('/')
}

/// Expand an object-storage locator: a prefix yields every matching object
/// under it, a single object yields itself when it exists and nothing
/// otherwise.
pub(crate) fn expand(
    locator: &Locator,
    cancel: &CancellationToken,
) -> Result<Vec<Locator>, ResolveError> {
    if cancel.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }

    let url = locator.url();
    if is_prefix(url) {
        return list_documents(url);
    }

    if object_exists(url)? {
        Ok(vec![locator.clone()])
    } else {
        debug!(locator = %locator, "object not found, expanding to nothing");
        Ok(vec![])
    }
}

/// Fetch a single object's bytes as a UTF-8 document.
pub(crate) fn fetch(locator: &Locator, cancel: &CancellationToken) -> Result<String, ResolveError> {
    if cancel.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }

    let url = locator.url();
    let (store, path) = parse_url(url).map_err(|source| store_err(url, source))?;
    let bytes = block_on(async move {
        let result = store.get(&path).await?;
        result.bytes().await
    })?
    .map_err(|source| store_err(url, source))?;

    String::from_utf8(bytes.to_vec()).map_err(|source| ResolveError::InvalidDocument {
        locator: locator.as_str().to_string(),
        reason: format!("not valid UTF-8: {source}"),
    })
}

fn list_documents(url: &Url) -> Result<Vec<Locator>, ResolveError> {
    let (store, prefix) = parse_url(url).map_err(|source| store_err(url, source))?;
    let locations = block_on(async move {
        store
            .list(Some(&prefix))
            .map_ok(|meta| meta.location)
            .try_collect::<Vec<_>>()
            .await
    })?
    .map_err(|source| store_err(url, source))?;

    let mut documents = Vec::new();
    for location in locations {
        let matches = location.filename().map(is_document_name).unwrap_or(false);
        if !matches {
            continue;
        }
        let mut object_url = url.clone();
        object_url.set_path(&format!("/{location}"));
        documents.push(Locator::from_url(object_url));
    }
    Ok(documents)
}

fn object_exists(url: &Url) -> Result<bool, ResolveError> {
    let (store, path) = parse_url(url).map_err(|source| store_err(url, source))?;
    match block_on(async move { store.head(&path).await })? {
        Ok(_) => Ok(true),
        Err(object_store::Error::NotFound { .. }) => Ok(false),
        Err(source) => Err(store_err(url, source)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("url")
    }

    #[test]
    fn prefix_detection() {
        assert!(is_prefix(&url("s3://configs")));
        assert!(is_prefix(&url("s3://configs/")));
        assert!(is_prefix(&url("s3://configs/site/")));
        assert!(!is_prefix(&url("s3://configs/site/Droverfile")));
    }
}
