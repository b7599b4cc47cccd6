/// Errors raised while resolving or rebinding a channel's owning worker (§4.B, §7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `listActiveWorkers()` returned nothing live; the caller should treat
    /// this as retryable (§4.B "Failure", §7 `NoWorkersAvailable`).
    #[error("no workers available to own this channel")]
    NoWorkersAvailable,

    /// The routing store could not be reached or returned an unexpected
    /// failure (§7 `StoreError`).
    #[error("routing store error: {0}")]
    Store(#[from] relaymesh_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
