//! Application services for the research pipeline.

mod store;

pub use store::{
    DEFAULT_RATE_LIMIT_ATTEMPTS, RepositoryStateStore, StoreError, StoreResult,
};
