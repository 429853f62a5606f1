use std::{collections::HashMap, thread};

use crate::{FileRecord, FolderSnapshot};

/// Key/value annotations attached to a [`FileRecord`] after a fresh scan.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Caller-supplied annotation hook, invoked once per freshly scanned file.
///
/// Annotation is best effort: there is no error channel back to the
/// folder being initialized, and a reader that cannot produce anything
/// useful simply returns an empty map.
pub trait MetadataReader: Send + Sync {
    fn read_metadata(&self, folder: &FolderSnapshot, file: &FileRecord) -> Metadata;
}

const MAX_CONCURRENT_READS: usize = 10;

/// Runs the reader over every record, at most [`MAX_CONCURRENT_READS`] at
/// a time: start a batch, join it, start the next. Latency of a batch is
/// bounded by its slowest invocation.
pub(crate) fn enrich_files(
    folder: &FolderSnapshot,
    files: &mut [FileRecord],
    reader: &dyn MetadataReader,
) {
    for batch in files.chunks_mut(MAX_CONCURRENT_READS) {
        thread::scope(|scope| {
            for file in batch.iter_mut() {
                scope.spawn(move || {
                    let metadata = reader.read_metadata(folder, file);
                    file.metadata = metadata;
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        sync::atomic::{AtomicUsize, Ordering},
        time::{Duration, SystemTime},
    };

    use super::*;

    struct CountingReader {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl CountingReader {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl MetadataReader for CountingReader {
        fn read_metadata(&self, _folder: &FolderSnapshot, file: &FileRecord) -> Metadata {
            let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);

            let mut metadata = Metadata::new();
            metadata.insert("name".to_string(), file.name.clone().into());
            metadata
        }
    }

    fn records(count: usize) -> Vec<FileRecord> {
        (0..count)
            .map(|index| FileRecord {
                path: PathBuf::from("/managed").join(format!("file-{index}")),
                name: format!("file-{index}"),
                is_dir: false,
                size: 1,
                created_at: SystemTime::UNIX_EPOCH,
                modified_at: SystemTime::UNIX_EPOCH,
                metadata: Metadata::new(),
            })
            .collect()
    }

    #[test]
    fn every_file_is_annotated_once() {
        let folder = FolderSnapshot {
            location: PathBuf::from("/managed"),
            max_size: 0,
            current_size: 0,
        };
        let mut files = records(25);
        let reader = CountingReader::new();

        enrich_files(&folder, &mut files, &reader);

        assert_eq!(reader.calls.load(Ordering::SeqCst), 25);
        assert!(reader.peak.load(Ordering::SeqCst) <= MAX_CONCURRENT_READS);
        for file in &files {
            assert_eq!(file.metadata.get("name"), Some(&file.name.clone().into()));
        }
    }
}
