//! Reloads the schedule when its file changes on disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, DebouncedEvent, Debouncer, new_debouncer};

use crate::displayable::Schedule;
use crate::parser;
use crate::render::dispatch::Marshal;

const DEBOUNCE: Duration = Duration::from_millis(300);

/// Keeps the file watch alive. Dropping it stops reloading.
pub struct ScheduleWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl ScheduleWatcher {
    /// Watch `path` and send every successfully parsed version through
    /// `marshal`. Parsing happens on the watcher's thread.
    pub fn spawn(path: &Path, marshal: Marshal<Schedule>) -> Result<Self> {
        let target = path
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        // Editors often replace the file, so watch its directory.
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let watched = target.clone();
        let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
            Ok(events) => {
                if touches(&events, &watched) {
                    reload(&watched, &marshal);
                }
            }
            Err(e) => tracing::warn!("File watch error: {e}"),
        })
        .context("Failed to start file watcher")?;

        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        tracing::debug!("Watching {} for changes", target.display());

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

fn touches(events: &[DebouncedEvent], target: &Path) -> bool {
    events.iter().any(|e| {
        e.path == target || (e.path.file_name().is_some() && e.path.file_name() == target.file_name())
    })
}

/// Parse `path` and hand the result to the render thread. A schedule that no
/// longer parses is logged and the current one stays up.
pub fn reload(path: &Path, marshal: &Marshal<Schedule>) -> bool {
    match parser::load(path) {
        Ok(schedule) => {
            tracing::info!(items = schedule.items.len(), "Schedule reloaded");
            marshal.send(schedule)
        }
        Err(e) => {
            tracing::warn!("Keeping previous schedule: {e:#}");
            false
        }
    }
}
