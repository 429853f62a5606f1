use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuotaError {
    #[error("folder exists")]
    FolderExists,

    #[error("folder not found")]
    FolderNotFound,

    #[error("not started")]
    NotStarted,

    /// Never produced by the library itself; reserved for callers racing
    /// a reply against their own timer.
    #[error("timeout")]
    Timeout,

    #[error("cannot scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("cannot delete {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
