//! File Watching
//!
//! Bridges notify callbacks into a tokio channel and groups bursts of
//! changes into one batch.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Quiet period that ends a batch of changes
pub const DEBOUNCE: Duration = Duration::from_millis(250);

/// Events from the file watcher
#[derive(Debug)]
pub enum WatcherEvent {
    FileChanged(PathBuf),
    WatcherError(notify::Error),
}

/// A debounced group of changes
#[derive(Debug)]
pub enum WatchBatch {
    /// Changed documents or profiles, sorted and deduplicated
    Changed(Vec<PathBuf>),
    Error(notify::Error),
}

/// Files whose changes trigger a re-check
pub fn is_relevant(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "md" | "markdown" | "toml"))
}

/// Watches documents and profile directories
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<WatcherEvent>,
}

impl DocumentWatcher {
    /// Start watching; directories recursively, files on their own
    pub fn new(paths: &[PathBuf]) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) =
                        event.kind
                    {
                        for path in event.paths {
                            if is_relevant(&path) {
                                let _ = tx.send(WatcherEvent::FileChanged(path));
                            }
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatcherEvent::WatcherError(e));
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )
        .context("Failed to create file watcher")?;

        for path in paths {
            if !path.exists() {
                log::debug!("Not watching missing path {}", path.display());
                continue;
            }
            let mode = if path.is_dir() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            watcher
                .watch(path, mode)
                .with_context(|| format!("Failed to watch {}", path.display()))?;
            log::info!("Watching {}", path.display());
        }

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next batch of changes
    pub async fn next_batch(&mut self) -> Option<WatchBatch> {
        next_batch(&mut self.rx, DEBOUNCE).await
    }
}

/// Wait for one event, then collect more until `quiet` passes without any
///
/// Errors are reported on their own and end the batch early. Returns
/// `None` once the sender side is gone.
pub async fn next_batch(
    rx: &mut mpsc::UnboundedReceiver<WatcherEvent>,
    quiet: Duration,
) -> Option<WatchBatch> {
    let mut changed = BTreeSet::new();

    match rx.recv().await? {
        WatcherEvent::FileChanged(path) => {
            changed.insert(path);
        }
        WatcherEvent::WatcherError(e) => return Some(WatchBatch::Error(e)),
    }

    loop {
        match timeout(quiet, rx.recv()).await {
            Ok(Some(WatcherEvent::FileChanged(path))) => {
                changed.insert(path);
            }
            Ok(Some(WatcherEvent::WatcherError(e))) => {
                log::warn!("File watcher error: {}", e);
            }
            Ok(None) | Err(_) => break,
        }
    }

    Some(WatchBatch::Changed(changed.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_relevant() {
        assert!(is_relevant(Path::new("docs/guide.md")));
        assert!(is_relevant(Path::new("docs/GUIDE.MARKDOWN")));
        assert!(is_relevant(Path::new("profiles/frontend.docs-profile.toml")));
        assert!(!is_relevant(Path::new("docs/diagram.png")));
        assert!(!is_relevant(Path::new("docs/README")));
    }

    #[tokio::test]
    async fn test_burst_is_one_batch() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        for name in ["b.md", "a.md", "b.md"] {
            tx.send(WatcherEvent::FileChanged(PathBuf::from(name))).unwrap();
        }

        match next_batch(&mut rx, Duration::from_millis(50)).await {
            Some(WatchBatch::Changed(paths)) => {
                assert_eq!(paths, vec![PathBuf::from("a.md"), PathBuf::from("b.md")]);
            }
            other => panic!("unexpected batch {:?}", other),
        }

        drop(tx);
        assert!(next_batch(&mut rx, Duration::from_millis(50)).await.is_none());
    }

    #[tokio::test]
    async fn test_separate_bursts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(WatcherEvent::FileChanged(PathBuf::from("a.md"))).unwrap();

        let first = next_batch(&mut rx, Duration::from_millis(20)).await;
        assert!(matches!(first, Some(WatchBatch::Changed(ref p)) if p.len() == 1));

        tx.send(WatcherEvent::FileChanged(PathBuf::from("c.md"))).unwrap();
        let second = next_batch(&mut rx, Duration::from_millis(20)).await;
        assert!(matches!(second, Some(WatchBatch::Changed(ref p)) if p == &vec![PathBuf::from("c.md")]));
    }
}
