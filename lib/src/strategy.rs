use crate::{FileRecord, FolderSnapshot};

/// Picks the files to delete from a folder in order to free at least
/// `bytes_to_free` bytes.
///
/// Implementations must never return directories and must not mutate the
/// input set; any ordering happens on a private copy. A strategy runs
/// synchronously on the keeper's serialization path, so a slow one stalls
/// every other folder operation while it runs.
pub trait EvictionStrategy: Send {
    /// `bytes_to_free` is strictly positive. The returned files are the
    /// smallest prefix, under the strategy's order, whose sizes sum to at
    /// least `bytes_to_free` — or every deletable file when the folder
    /// does not hold that much.
    fn select(
        &self,
        folder: &FolderSnapshot,
        files: &[FileRecord],
        bytes_to_free: u64,
    ) -> Vec<FileRecord>;
}

/// Evicts files in order of creation time, oldest first.
pub struct OldestFirst;

impl OldestFirst {
    pub fn new() -> Self {
        Self
    }
}

impl EvictionStrategy for OldestFirst {
    fn select(
        &self,
        _folder: &FolderSnapshot,
        files: &[FileRecord],
        bytes_to_free: u64,
    ) -> Vec<FileRecord> {
        let mut candidates = deletable(files);
        candidates.sort_by_key(|file| file.created_at);
        take_covering_prefix(candidates, bytes_to_free)
    }
}

/// Evicts files in ascending, case-sensitive name order.
pub struct NameAscending;

impl NameAscending {
    pub fn new() -> Self {
        Self
    }
}

impl EvictionStrategy for NameAscending {
    fn select(
        &self,
        _folder: &FolderSnapshot,
        files: &[FileRecord],
        bytes_to_free: u64,
    ) -> Vec<FileRecord> {
        let mut candidates = deletable(files);
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        take_covering_prefix(candidates, bytes_to_free)
    }
}

fn deletable(files: &[FileRecord]) -> Vec<&FileRecord> {
    files.iter().filter(|file| !file.is_dir).collect()
}

fn take_covering_prefix(candidates: Vec<&FileRecord>, bytes_to_free: u64) -> Vec<FileRecord> {
    let mut freed = 0u64;
    let mut selected = Vec::new();

    for file in candidates {
        if freed >= bytes_to_free {
            break;
        }
        freed += file.size;
        selected.push(file.clone());
    }

    selected
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        path::PathBuf,
        time::{Duration, SystemTime},
    };

    use super::*;

    fn record(name: &str, size: u64, age_secs: u64, is_dir: bool) -> FileRecord {
        FileRecord {
            path: PathBuf::from("/managed").join(name),
            name: name.to_string(),
            is_dir,
            size,
            created_at: SystemTime::UNIX_EPOCH + Duration::from_secs(age_secs),
            modified_at: SystemTime::UNIX_EPOCH + Duration::from_secs(age_secs),
            metadata: HashMap::new(),
        }
    }

    fn snapshot() -> FolderSnapshot {
        FolderSnapshot {
            location: PathBuf::from("/managed"),
            max_size: 100,
            current_size: 350,
        }
    }

    fn names(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|file| file.name.as_str()).collect()
    }

    #[test]
    fn oldest_first_takes_minimal_covering_prefix() {
        let files = vec![
            record("b", 100, 30, false),
            record("a", 200, 10, false),
            record("c", 50, 20, false),
        ];

        let picked = OldestFirst::new().select(&snapshot(), &files, 120);
        assert_eq!(names(&picked), ["a"]);

        let picked = OldestFirst::new().select(&snapshot(), &files, 240);
        assert_eq!(names(&picked), ["a", "c"]);
    }

    #[test]
    fn name_ascending_is_case_sensitive() {
        let files = vec![
            record("beta", 100, 1, false),
            record("Zeta", 100, 2, false),
            record("alpha", 100, 3, false),
        ];

        let picked = NameAscending::new().select(&snapshot(), &files, 250);
        assert_eq!(names(&picked), ["Zeta", "alpha", "beta"]);
    }

    #[test]
    fn directories_are_never_selected() {
        let files = vec![
            record("sub", 1_000_000, 1, true),
            record("a", 100, 2, false),
        ];

        let picked = OldestFirst::new().select(&snapshot(), &files, 500_000);
        assert_eq!(names(&picked), ["a"]);
    }

    #[test]
    fn insufficient_total_returns_every_file() {
        let files = vec![
            record("a", 100, 1, false),
            record("b", 100, 2, false),
        ];

        let picked = OldestFirst::new().select(&snapshot(), &files, 10_000);
        assert_eq!(names(&picked), ["a", "b"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let files = vec![
            record("third", 10, 5, false),
            record("first", 10, 5, false),
            record("second", 10, 5, false),
        ];

        let picked = OldestFirst::new().select(&snapshot(), &files, 100);
        assert_eq!(names(&picked), ["third", "first", "second"]);
    }

    #[test]
    fn selection_is_deterministic_and_pure() {
        let files = vec![
            record("b", 100, 30, false),
            record("a", 200, 10, false),
        ];
        let before = names(&files);

        let first = OldestFirst::new().select(&snapshot(), &files, 250);
        let second = OldestFirst::new().select(&snapshot(), &files, 250);
        assert_eq!(names(&first), names(&second));
        assert_eq!(names(&files), before);
    }
}
