/// Errors surfaced by the worker runtime (§7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The routing store was unreachable or failed (§7 `StoreError`); the
    /// consume loop backs off and resumes rather than propagating this.
    #[error("routing store error: {0}")]
    Store(#[from] relaymesh_store::Error),

    /// A stream record's payload could not be parsed into an [`crate::Event`].
    #[error("malformed stream record: {0}")]
    MalformedRecord(String),
}

pub type Result<T> = std::result::Result<T, Error>;
