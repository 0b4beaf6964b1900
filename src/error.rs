use std::io;
use thiserror::Error;

/// Errors surfaced by pool lifecycle operations.
///
/// Misuse of the lifecycle (starting twice, unbalanced pause/unpause,
/// resizing after start) is a bug in the calling code and panics instead of
/// returning a variant here.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("failed to spawn worker thread for pool {pool}: {source}")]
    ThreadSpawn {
        pool: String,
        #[source]
        source: io::Error,
    },
}
