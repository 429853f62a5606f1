use std::{
    path::PathBuf,
    sync::mpsc::{self, Receiver, SyncSender},
};

use crate::{FolderSnapshot, QuotaError};

/// One queued unit of work for the keeper thread. Each variant carries
/// its operands and the single-use handle the result travels back over.
pub(crate) enum Command {
    Add {
        location: PathBuf,
        max_size: u64,
        reply: Reply<()>,
    },
    Remove {
        location: PathBuf,
        reply: Reply<()>,
    },
    Get {
        location: PathBuf,
        reply: Reply<FolderSnapshot>,
    },
    Recheck {
        location: PathBuf,
        reply: Reply<()>,
    },

    /// Synchronization barrier; confirms the loop is serving.
    Ping { reply: Reply<()> },

    /// Tear down every managed folder and exit the loop.
    Shutdown { reply: Reply<()> },
}

/// Sending half of a one-shot reply channel.
///
/// `complete` consumes the handle, so a result can only ever be produced
/// once per command.
pub(crate) struct Reply<T> {
    tx: SyncSender<Result<T, QuotaError>>,
}

impl<T> Reply<T> {
    pub fn new() -> (Self, Receiver<Result<T, QuotaError>>) {
        // One buffered slot: completing never blocks the keeper on a
        // caller that has already given up on its receiver.
        let (tx, rx) = mpsc::sync_channel(1);
        (Self { tx }, rx)
    }

    pub fn complete(self, result: Result<T, QuotaError>) {
        let _ = self.tx.send(result);
    }
}
