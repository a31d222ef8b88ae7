use thiserror::Error;

/// Failure while fetching a metadata snapshot from the catalog store.
///
/// The underlying cause is carried unchanged. Any variant aborts the whole
/// lineage computation; no partial graph is returned.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("metadata store unavailable: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("metadata query failed: {0}")]
    Query(#[from] diesel::result::Error),
}
