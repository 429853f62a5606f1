use std::path::Path;

use notify::{event::ModifyKind, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// An active change-notification subscription for one managed folder.
///
/// Dropping the handle terminates the subscription.
pub(crate) struct FolderWatch {
    _watcher: RecommendedWatcher,
}

impl FolderWatch {
    /// Starts watching the immediate contents of `location`.
    pub fn subscribe(location: &Path) -> Result<FolderWatch, notify::Error> {
        let root = location.to_path_buf();
        let mut watcher =
            notify::recommended_watcher(move |event: notify::Result<Event>| match event {
                Ok(event) => log_event(&root, &event),
                Err(err) => log::warn!("watch error below {}: {}", root.display(), err),
            })?;
        watcher.watch(location, RecursiveMode::NonRecursive)?;

        log::debug!("watching {}", location.display());
        Ok(FolderWatch { _watcher: watcher })
    }
}

/// Events are only made visible. Folder state belongs to the keeper
/// thread, so a rescan in response to an event would have to travel
/// through the command queue.
fn log_event(root: &Path, event: &Event) {
    let label = match event.kind {
        EventKind::Create(_) => "created",
        EventKind::Modify(ModifyKind::Name(_)) => "renamed",
        EventKind::Modify(_) => "modified",
        EventKind::Remove(_) => "removed",
        _ => return,
    };

    for path in &event.paths {
        log::debug!("{}: {} {}", root.display(), label, path.display());
    }
}
