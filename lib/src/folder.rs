use std::path::PathBuf;

use crate::{
    fs::{self, FileRecord},
    meta,
    utils::format_file_size,
    watch::FolderWatch,
    KeeperOptions, QuotaError,
};

/// Read-only view of a managed folder, handed to callers and hooks.
#[derive(Debug, Clone)]
pub struct FolderSnapshot {
    pub location: PathBuf,

    /// Quota in bytes; zero disables enforcement for this folder.
    pub max_size: u64,

    /// Size sum of the non-directory files found by the last scan.
    pub current_size: u64,
}

/// One quota-enforced directory. Owned exclusively by the keeper thread;
/// the file set and the change subscription exist only while the folder
/// is initialized.
pub(crate) struct ManagedFolder {
    location: PathBuf,
    max_size: u64,
    current_size: u64,
    files: Option<Vec<FileRecord>>,
    watch: Option<FolderWatch>,
}

impl ManagedFolder {
    pub fn new(location: PathBuf, max_size: u64) -> Self {
        Self {
            location,
            max_size,
            current_size: 0,
            files: None,
            watch: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.files.is_some()
    }

    pub fn snapshot(&self) -> FolderSnapshot {
        FolderSnapshot {
            location: self.location.clone(),
            max_size: self.max_size,
            current_size: self.current_size,
        }
    }

    /// Scan, annotate, subscribe, then enforce the quota once. No-op when
    /// already initialized; any failure tears the folder back down before
    /// the error propagates, so a later call starts from scratch.
    pub fn initialize(&mut self, options: &mut KeeperOptions) -> Result<(), QuotaError> {
        if self.is_initialized() {
            return Ok(());
        }
        log::debug!("initializing {}", self.location.display());

        let mut files = fs::collect_files(&self.location, options.extensions.as_deref(), false)
            .map_err(|source| QuotaError::Scan {
                path: self.location.clone(),
                source,
            })?;
        files.sort_by_key(|file| file.created_at);
        self.current_size = fs::total_size(&files);

        // Annotation happens before the file set is published anywhere,
        // so the readers are the only ones seeing these records.
        if let Some(reader) = &options.metadata_reader {
            meta::enrich_files(&self.snapshot(), &mut files, reader.as_ref());
        }

        let watch =
            FolderWatch::subscribe(&self.location).map_err(|source| QuotaError::Watch {
                path: self.location.clone(),
                source,
            })?;

        self.files = Some(files);
        self.watch = Some(watch);

        if let Err(err) = self.check(options) {
            self.de_init();
            return Err(err);
        }
        Ok(())
    }

    /// Enforces the quota against the last scan. A deletion failure aborts
    /// the remaining batch and leaves `current_size` overcounting until
    /// the next scan corrects it.
    pub fn check(&mut self, options: &mut KeeperOptions) -> Result<(), QuotaError> {
        let Some(files) = &self.files else {
            return Ok(());
        };
        if self.max_size == 0 || self.current_size <= self.max_size {
            return Ok(());
        }

        let bytes_to_free = self.current_size - self.max_size;
        let snapshot = self.snapshot();
        let doomed = options.strategy.select(&snapshot, files, bytes_to_free);
        log::info!(
            "{} over quota by {}, evicting {} files",
            self.location.display(),
            format_file_size(bytes_to_free),
            doomed.len()
        );

        fs::delete_files(&doomed)?;
        options.removal_observer.on_removed(&snapshot, &doomed);
        self.current_size -= fs::total_size(&doomed);
        Ok(())
    }

    /// Idempotent teardown: subscription dropped, file set cleared.
    pub fn de_init(&mut self) {
        self.watch = None;
        self.files = None;
    }
}
