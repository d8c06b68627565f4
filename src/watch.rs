//! Change notifications for the manifest.
//!
//! The engine only needs two things from a notification source: block until
//! the next change, and tell whether changes queued up while it was busy.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{Result, SyncError};

pub trait ChangeFeed {
    /// Block until the next change. `false` once the feed is closed.
    fn wait(&mut self) -> bool;

    /// Non-blocking: whether a change arrived since the last call.
    fn poll(&mut self) -> bool;
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE SYSTEM
// ═══════════════════════════════════════════════════════════════════════════════

/// Watches the manifest's directory and reports writes to the manifest file.
/// Editors often replace the file instead of writing in place, so the
/// directory is watched and events are filtered by file name.
pub struct ManifestWatcher {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    file_name: OsString,
    debounce: Duration,
}

impl ManifestWatcher {
    pub fn new(manifest: &Path, debounce: Duration) -> Result<Self> {
        let dir = manifest
            .parent()
            .ok_or_else(|| SyncError::Structure(format!("{} has no parent", manifest.display())))?;
        let file_name = manifest
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| SyncError::Structure(format!("{} has no file name", manifest.display())))?;

        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(100)),
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::info!("Watching for changes in {}", manifest.display());

        Ok(Self {
            _watcher: watcher,
            events: rx,
            file_name,
            debounce,
        })
    }

    fn is_relevant(&self, event: &Event) -> bool {
        let kind = matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
        );
        kind && event
            .paths
            .iter()
            .any(|p| p.file_name().map(|n| n == self.file_name).unwrap_or(false))
    }

    fn classify(&self, received: notify::Result<Event>) -> bool {
        match received {
            Ok(event) => self.is_relevant(&event),
            Err(e) => {
                tracing::error!("[{}] watcher error: {}", crate::error::ERR_WATCH, e);
                false
            }
        }
    }

    /// Absorb events until the file has been quiet for the debounce window.
    fn settle(&mut self) {
        loop {
            match self.events.recv_timeout(self.debounce) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

impl ChangeFeed for ManifestWatcher {
    fn wait(&mut self) -> bool {
        loop {
            match self.events.recv() {
                Ok(received) => {
                    if self.classify(received) {
                        self.settle();
                        return true;
                    }
                }
                Err(_) => return false,
            }
        }
    }

    fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.events.try_recv() {
                Ok(received) => changed |= self.classify(received),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return changed,
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOUBLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Never reports anything. Used by the one-shot commands.
#[derive(Debug, Default)]
pub struct NullFeed;

impl ChangeFeed for NullFeed {
    fn wait(&mut self) -> bool {
        false
    }

    fn poll(&mut self) -> bool {
        false
    }
}

/// Replays a fixed script of `poll` results; `wait` pops the same queue.
#[derive(Debug, Default)]
pub struct ScriptedFeed {
    script: VecDeque<bool>,
}

impl ScriptedFeed {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl ChangeFeed for ScriptedFeed {
    fn wait(&mut self) -> bool {
        self.script.pop_front().is_some()
    }

    fn poll(&mut self) -> bool {
        self.script.pop_front().unwrap_or(false)
    }
}

impl<F: ChangeFeed + ?Sized> ChangeFeed for Box<F> {
    fn wait(&mut self) -> bool {
        (**self).wait()
    }

    fn poll(&mut self) -> bool {
        (**self).poll()
    }
}
