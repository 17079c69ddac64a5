//! Filesystem event handler for the directory watcher.
//!
//! Runs on the watcher's notification thread. It only classifies events and
//! pushes eligible paths onto the work queue; it never touches the network or
//! reads files. The only filesystem call is a `stat` of `.mp4` paths reported
//! with a generic creation kind, to drop directories.

use std::path::{Path, PathBuf};

use notify::event::CreateKind;
use notify::{Event, EventKind};
use tokio::sync::mpsc::UnboundedSender;

/// Suffix a file name must end with to be ingested. Case-sensitive.
pub const VIDEO_SUFFIX: &str = ".mp4";

/// Whether the file name of `path` ends in [`VIDEO_SUFFIX`].
pub fn is_eligible_video(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(VIDEO_SUFFIX))
        .unwrap_or(false)
}

/// Hands eligible creation events to the async runtime.
#[derive(Clone, Debug)]
pub struct WatchDispatcher {
    queue: UnboundedSender<PathBuf>,
}

impl WatchDispatcher {
    pub fn new(queue: UnboundedSender<PathBuf>) -> Self {
        Self { queue }
    }

    /// Paths in `event` that should each become one ingestion task.
    pub fn eligible_paths(event: &Event) -> Vec<PathBuf> {
        let kind = match event.kind {
            EventKind::Create(kind) => kind,
            _ => return Vec::new(),
        };
        if kind == CreateKind::Folder {
            return Vec::new();
        }

        event
            .paths
            .iter()
            .filter(|path| is_eligible_video(path))
            // Only generic creation kinds (CreateKind::Any/Other) pay for a stat.
            .filter(|path| kind == CreateKind::File || !path.is_dir())
            .cloned()
            .collect()
    }

    /// Handle one watcher callback. Returns how many paths were enqueued.
    ///
    /// Enqueueing is non-blocking; the queue is drained by the supervisor on
    /// the runtime thread.
    pub fn handle_event(&self, result: notify::Result<Event>) -> usize {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "filesystem watcher error");
                return 0;
            }
        };

        tracing::trace!(kind = ?event.kind, paths = ?event.paths, "filesystem event");

        let mut dispatched = 0;
        for path in Self::eligible_paths(&event) {
            tracing::info!(path = %path.display(), "New video detected");
            match self.queue.send(path) {
                Ok(()) => dispatched += 1,
                Err(rejected) => {
                    tracing::debug!(
                        path = %rejected.0.display(),
                        "work queue closed, dropping event"
                    );
                }
            }
        }
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{ModifyKind, RemoveKind};
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    fn event(kind: EventKind, path: impl Into<PathBuf>) -> Event {
        Event::new(kind).add_path(path.into())
    }

    #[test]
    fn test_suffix_is_case_sensitive() {
        assert!(is_eligible_video(Path::new("videos/clip.mp4")));
        assert!(!is_eligible_video(Path::new("videos/clip.MP4")));
        assert!(!is_eligible_video(Path::new("videos/clip.mov")));
        assert!(!is_eligible_video(Path::new("videos/clip.mp4.part")));
        assert!(!is_eligible_video(Path::new("videos/mp4")));
    }

    #[test]
    fn test_only_mp4_creations_are_dispatched() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = WatchDispatcher::new(tx);

        let sent = dispatcher.handle_event(Ok(event(
            EventKind::Create(CreateKind::File),
            "videos/clip.mp4",
        )));
        assert_eq!(sent, 1);
        assert_eq!(rx.try_recv().unwrap(), PathBuf::from("videos/clip.mp4"));

        for ignored in ["videos/notes.txt", "videos/clip.mkv", "videos/clip.MP4"] {
            let sent =
                dispatcher.handle_event(Ok(event(EventKind::Create(CreateKind::File), ignored)));
            assert_eq!(sent, 0, "{} should be ignored", ignored);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_non_creation_events_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = WatchDispatcher::new(tx);

        for kind in [
            EventKind::Modify(ModifyKind::Any),
            EventKind::Remove(RemoveKind::File),
            EventKind::Access(notify::event::AccessKind::Any),
        ] {
            assert_eq!(dispatcher.handle_event(Ok(event(kind, "videos/clip.mp4"))), 0);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_directory_creation_never_dispatched() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("season.mp4");
        std::fs::create_dir(&folder).unwrap();

        // Explicit folder kind
        let paths = WatchDispatcher::eligible_paths(&event(
            EventKind::Create(CreateKind::Folder),
            folder.clone(),
        ));
        assert!(paths.is_empty());

        // Generic kind, path on disk is a directory
        let paths =
            WatchDispatcher::eligible_paths(&event(EventKind::Create(CreateKind::Any), folder));
        assert!(paths.is_empty());
    }

    #[test]
    fn test_generic_creation_of_file_dispatched() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("clip.mp4");
        std::fs::write(&file, b"x").unwrap();

        let paths = WatchDispatcher::eligible_paths(&event(
            EventKind::Create(CreateKind::Any),
            file.clone(),
        ));
        assert_eq!(paths, vec![file]);
    }

    #[test]
    fn test_file_kind_is_trusted_without_stat() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("season.mp4");
        std::fs::create_dir(&folder).unwrap();

        // A file creation kind is taken at its word; the path is never inspected.
        let paths = WatchDispatcher::eligible_paths(&event(
            EventKind::Create(CreateKind::File),
            folder.clone(),
        ));
        assert_eq!(paths, vec![folder]);

        // Paths that do not exist are classified from the event alone.
        let missing = dir.path().join("gone.mp4");
        let paths = WatchDispatcher::eligible_paths(&event(
            EventKind::Create(CreateKind::File),
            missing.clone(),
        ));
        assert_eq!(paths, vec![missing]);
    }

    #[test]
    fn test_one_task_per_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = WatchDispatcher::new(tx);
        let create = EventKind::Create(CreateKind::File);

        dispatcher.handle_event(Ok(event(create, "videos/a.mp4")));
        dispatcher.handle_event(Ok(event(create, "videos/b.mp4")));
        dispatcher.handle_event(Ok(event(create, "videos/a.mp4")));

        let mut received = Vec::new();
        while let Ok(path) = rx.try_recv() {
            received.push(path);
        }
        assert_eq!(
            received,
            vec![
                PathBuf::from("videos/a.mp4"),
                PathBuf::from("videos/b.mp4"),
                PathBuf::from("videos/a.mp4"),
            ]
        );
    }

    #[test]
    fn test_watcher_error_and_closed_queue_are_absorbed() {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = WatchDispatcher::new(tx);

        assert_eq!(
            dispatcher.handle_event(Err(notify::Error::generic("inotify overflow"))),
            0
        );

        drop(rx);
        assert_eq!(
            dispatcher.handle_event(Ok(event(
                EventKind::Create(CreateKind::File),
                "videos/clip.mp4"
            ))),
            0
        );
    }
}
