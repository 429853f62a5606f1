use std::{
    collections::{hash_map::Entry, HashMap},
    mem,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError},
        Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    folder::ManagedFolder,
    meta::MetadataReader,
    op::{Command, Reply},
    strategy::{EvictionStrategy, OldestFirst},
    FileRecord, FolderSnapshot, QuotaError,
};

/// Capacity of the command queue between callers and the keeper thread.
const COMMAND_QUEUE_DEPTH: usize = 10;

/// Receives the files evicted from a folder, right after their deletion
/// succeeded.
pub trait RemovalObserver: Send {
    fn on_removed(&mut self, folder: &FolderSnapshot, removed: &[FileRecord]);
}

/// Default observer; ignores every removal.
pub struct VoidRemovalObserver;

impl RemovalObserver for VoidRemovalObserver {
    fn on_removed(&mut self, _folder: &FolderSnapshot, _removed: &[FileRecord]) {}
}

/// Hooks and filters applied to every managed folder. Injected at
/// construction and owned by the keeper thread from then on.
pub struct KeeperOptions {
    /// Picks the files to delete when a folder runs over its quota.
    pub strategy: Box<dyn EvictionStrategy>,

    /// Notified after each successful eviction batch.
    pub removal_observer: Box<dyn RemovalObserver>,

    /// Annotates freshly scanned files with arbitrary key/value data.
    pub metadata_reader: Option<Box<dyn MetadataReader>>,

    /// Restricts scans to these file extensions (leading dot optional).
    /// `None` admits every file.
    pub extensions: Option<Vec<String>>,
}

impl Default for KeeperOptions {
    fn default() -> Self {
        Self {
            strategy: Box::new(OldestFirst::new()),
            removal_observer: Box::new(VoidRemovalObserver),
            metadata_reader: None,
            extensions: None,
        }
    }
}

/// Keeps a set of folders below their configured maximum sizes.
///
/// All folder state lives on one background thread. The public methods
/// enqueue a command and block until that thread replies, so callers
/// always observe folders either before or after an operation, never
/// mid-mutation. Periodically, and between commands, the thread re-checks
/// every initialized folder and evicts files from those over quota.
pub struct QuotaKeeper {
    state: Mutex<Lifecycle>,
}

enum Lifecycle {
    NotStarted {
        sweep_interval: Duration,
        options: KeeperOptions,
    },
    Running {
        queue: SyncSender<Command>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

impl QuotaKeeper {
    pub fn new(sweep_interval: Duration, options: KeeperOptions) -> Self {
        Self {
            state: Mutex::new(Lifecycle::NotStarted {
                sweep_interval,
                options,
            }),
        }
    }

    /// Spawns the keeper thread and blocks until it confirms readiness.
    /// Starting an already running keeper does nothing; a stopped keeper
    /// cannot be started again.
    pub fn start(&self) -> Result<(), QuotaError> {
        let mut state = self.lock_state()?;
        match mem::replace(&mut *state, Lifecycle::Stopped) {
            running @ Lifecycle::Running { .. } => {
                *state = running;
                Ok(())
            }
            Lifecycle::Stopped => Err(QuotaError::NotStarted),
            Lifecycle::NotStarted {
                sweep_interval,
                options,
            } => {
                let (queue, commands) = mpsc::sync_channel(COMMAND_QUEUE_DEPTH);
                let handle =
                    thread::spawn(move || run_keeper(sweep_interval, options, commands));

                let (reply, confirmation) = Reply::new();
                if queue.send(Command::Ping { reply }).is_err() {
                    return Err(QuotaError::NotStarted);
                }
                confirmation.recv().unwrap_or(Err(QuotaError::NotStarted))?;

                *state = Lifecycle::Running { queue, handle };
                Ok(())
            }
        }
    }

    /// Requests shutdown and blocks until the keeper thread has torn down
    /// every managed folder and exited. Stopping a keeper that never ran
    /// does nothing.
    pub fn stop(&self) -> Result<(), QuotaError> {
        let mut state = self.lock_state()?;
        match mem::replace(&mut *state, Lifecycle::Stopped) {
            Lifecycle::Running { queue, handle } => {
                let (reply, confirmation) = Reply::new();
                if queue.send(Command::Shutdown { reply }).is_ok() {
                    let _ = confirmation.recv();
                }
                drop(queue);
                if handle.join().is_err() {
                    log::error!("keeper thread panicked during shutdown");
                }
                Ok(())
            }
            not_started @ Lifecycle::NotStarted { .. } => {
                *state = not_started;
                Ok(())
            }
            Lifecycle::Stopped => Ok(()),
        }
    }

    /// Registers `location` with the given quota; zero means unlimited.
    /// The folder is scanned lazily, on first access or explicit recheck.
    pub fn add_folder(
        &self,
        location: impl Into<PathBuf>,
        max_size: u64,
    ) -> Result<(), QuotaError> {
        let location = location.into();
        self.submit(|reply| Command::Add {
            location,
            max_size,
            reply,
        })
    }

    /// Stops managing `location`, dropping its change subscription.
    pub fn remove_folder(&self, location: impl Into<PathBuf>) -> Result<(), QuotaError> {
        let location = location.into();
        self.submit(|reply| Command::Remove { location, reply })
    }

    /// Returns the folder's current statistics, initializing it first if
    /// it has not been scanned yet.
    pub fn get_folder(&self, location: impl Into<PathBuf>) -> Result<FolderSnapshot, QuotaError> {
        let location = location.into();
        self.submit(|reply| Command::Get { location, reply })
    }

    /// Forces an immediate re-scan and quota check, outside the sweep
    /// cadence.
    pub fn recheck_folder(&self, location: impl Into<PathBuf>) -> Result<(), QuotaError> {
        let location = location.into();
        self.submit(|reply| Command::Recheck { location, reply })
    }

    fn submit<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, QuotaError> {
        let queue = {
            let state = self.lock_state()?;
            match &*state {
                Lifecycle::Running { queue, .. } => queue.clone(),
                _ => return Err(QuotaError::NotStarted),
            }
        };

        let (reply, result) = Reply::new();
        if queue.send(command(reply)).is_err() {
            // the keeper thread is gone; nothing was enqueued
            return Err(QuotaError::NotStarted);
        }
        result.recv().unwrap_or(Err(QuotaError::NotStarted))
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, Lifecycle>, QuotaError> {
        self.state.lock().map_err(|_| QuotaError::NotStarted)
    }
}

/// Tells the serving loop whether to keep going after a dispatch.
#[derive(PartialEq)]
enum Flow {
    Continue,
    Shutdown,
}

/// The registry and its hooks, owned by the keeper thread alone.
struct Registry {
    folders: HashMap<PathBuf, ManagedFolder>,
    options: KeeperOptions,
}

fn run_keeper(sweep_interval: Duration, options: KeeperOptions, commands: Receiver<Command>) {
    let mut registry = Registry {
        folders: HashMap::new(),
        options,
    };
    log::debug!("keeper serving, sweep interval {:?}", sweep_interval);

    'serve: loop {
        let deadline = Instant::now() + sweep_interval;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if timeout.is_zero() {
                break;
            }
            match commands.recv_timeout(timeout) {
                Ok(command) => {
                    if registry.dispatch(command) == Flow::Shutdown {
                        break 'serve;
                    }
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break 'serve,
            }
        }

        if registry.sweep(&commands) == Flow::Shutdown {
            break;
        }
    }

    registry.teardown();
    log::debug!("keeper stopped");
}

impl Registry {
    fn dispatch(&mut self, command: Command) -> Flow {
        match command {
            Command::Add {
                location,
                max_size,
                reply,
            } => reply.complete(self.add(location, max_size)),
            Command::Remove { location, reply } => reply.complete(self.remove(&location)),
            Command::Get { location, reply } => reply.complete(self.get(&location)),
            Command::Recheck { location, reply } => reply.complete(self.recheck(&location)),
            Command::Ping { reply } => reply.complete(Ok(())),
            Command::Shutdown { reply } => {
                self.teardown();
                reply.complete(Ok(()));
                return Flow::Shutdown;
            }
        }
        Flow::Continue
    }

    fn add(&mut self, location: PathBuf, max_size: u64) -> Result<(), QuotaError> {
        match self.folders.entry(location) {
            Entry::Occupied(_) => Err(QuotaError::FolderExists),
            Entry::Vacant(slot) => {
                log::debug!("managing {}", slot.key().display());
                let folder = ManagedFolder::new(slot.key().clone(), max_size);
                slot.insert(folder);
                Ok(())
            }
        }
    }

    fn remove(&mut self, location: &Path) -> Result<(), QuotaError> {
        match self.folders.remove(location) {
            Some(mut folder) => {
                folder.de_init();
                log::debug!("released {}", location.display());
                Ok(())
            }
            None => Err(QuotaError::FolderNotFound),
        }
    }

    fn get(&mut self, location: &Path) -> Result<FolderSnapshot, QuotaError> {
        let Registry { folders, options } = self;
        let Some(folder) = folders.get_mut(location) else {
            return Err(QuotaError::FolderNotFound);
        };
        folder.initialize(options)?;
        Ok(folder.snapshot())
    }

    fn recheck(&mut self, location: &Path) -> Result<(), QuotaError> {
        let Registry { folders, options } = self;
        let Some(folder) = folders.get_mut(location) else {
            return Err(QuotaError::FolderNotFound);
        };
        folder.de_init();
        folder.initialize(options)
    }

    /// One pass over the registry, checking every folder. Queued commands
    /// are drained between folders so callers are never stuck behind a
    /// full sweep.
    fn sweep(&mut self, commands: &Receiver<Command>) -> Flow {
        let locations: Vec<PathBuf> = self.folders.keys().cloned().collect();
        if !locations.is_empty() {
            log::trace!("sweeping {} folders", locations.len());
        }

        for location in locations {
            loop {
                match commands.try_recv() {
                    Ok(command) => {
                        if self.dispatch(command) == Flow::Shutdown {
                            return Flow::Shutdown;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Flow::Shutdown,
                }
            }

            let Registry { folders, options } = self;
            let Some(folder) = folders.get_mut(&location) else {
                // removed by a command that cut in
                continue;
            };
            if let Err(err) = folder.check(options) {
                log::warn!("sweep of {} failed: {}", location.display(), err);
            }
        }
        Flow::Continue
    }

    fn teardown(&mut self) {
        for folder in self.folders.values_mut() {
            folder.de_init();
        }
        self.folders.clear();
    }
}
