//! # drover-resolver
//!
//! Turns document locators (paths, URLs, object-storage addresses) into a
//! deduplicated, merged [`drover_core::TargetTable`], honoring one level of
//! declared cross-document dependencies.

pub mod error;
pub mod locator;
pub mod resolver;
mod store;

pub use error::ResolveError;
pub use locator::{is_document_name, Locator, Scheme};
pub use resolver::{Resolver, META_KEY};
