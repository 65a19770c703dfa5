//! REST catalogue adapter for a hosted model manifest.

mod catalog;
mod dto;

pub use catalog::ManifestCatalog;
