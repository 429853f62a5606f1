use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use crate::QuotaError;

/// One filesystem entry captured at scan time.
///
/// Records are rebuilt wholesale on every scan; nothing updates them
/// incrementally in between.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub created_at: SystemTime,
    pub modified_at: SystemTime,

    /// Filled in by a configured [`MetadataReader`](crate::MetadataReader)
    /// after a fresh scan, empty otherwise.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl FileRecord {
    /// The file extension without the leading dot, if any.
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }
}

/// Total size in bytes of all non-directory records.
pub fn total_size(files: &[FileRecord]) -> u64 {
    files
        .iter()
        .filter(|file| !file.is_dir)
        .map(|file| file.size)
        .sum()
}

/// Lists the immediate children of `folder`, directories included.
pub fn list_entries(folder: &Path) -> io::Result<Vec<FileRecord>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let meta = entry.metadata()?;

        entries.push(FileRecord {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            is_dir: meta.is_dir(),
            size: meta.len(),
            created_at: creation_time(&meta),
            modified_at: modification_time(&meta),
            metadata: HashMap::new(),
        });
    }
    Ok(entries)
}

/// Collects the files below `folder` that pass the extension filter,
/// descending into subdirectories when `recursive` is set.
///
/// Entries that cannot be read and subdirectories that cannot be entered
/// are skipped; only a failure to read `folder` itself is an error.
pub fn collect_files(
    folder: &Path,
    extensions: Option<&[String]>,
    recursive: bool,
) -> io::Result<Vec<FileRecord>> {
    let mut files = Vec::new();
    collect_into(folder, extensions, recursive, &mut files)?;
    Ok(files)
}

fn collect_into(
    folder: &Path,
    extensions: Option<&[String]>,
    recursive: bool,
    files: &mut Vec<FileRecord>,
) -> io::Result<()> {
    for entry in fs::read_dir(folder)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_err) => continue,
        };
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(_err) => continue,
        };

        if meta.is_dir() {
            if recursive {
                let _ = collect_into(&entry.path(), extensions, recursive, files);
            }
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if !has_allowed_extension(&name, extensions) {
            continue;
        }

        files.push(FileRecord {
            path: entry.path(),
            name,
            is_dir: false,
            size: meta.len(),
            created_at: creation_time(&meta),
            modified_at: modification_time(&meta),
            metadata: HashMap::new(),
        });
    }
    Ok(())
}

/// Physically removes every non-directory record, stopping at the first
/// failure. Files deleted before a failure stay deleted.
pub fn delete_files(files: &[FileRecord]) -> Result<(), QuotaError> {
    for file in files {
        if file.is_dir {
            continue;
        }

        fs::remove_file(&file.path).map_err(|source| QuotaError::Delete {
            path: file.path.clone(),
            source,
        })?;
        log::debug!("deleted {}", file.path.display());
    }
    Ok(())
}

/// Case-insensitive extension match; `allowed` entries may carry the
/// leading dot or not. No filter admits everything.
fn has_allowed_extension(name: &str, extensions: Option<&[String]>) -> bool {
    let Some(extensions) = extensions else {
        return true;
    };

    let ext = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').to_lowercase() == ext)
}

/// Not every filesystem records a birth time; fall back to the
/// modification time where it is unavailable.
fn creation_time(meta: &fs::Metadata) -> SystemTime {
    meta.created()
        .or_else(|_| meta.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn modification_time(meta: &fs::Metadata) -> SystemTime {
    meta.modified().unwrap_or(SystemTime::UNIX_EPOCH)
}
