//! Flat-file output layout.
//!
//! ```text
//! <root>/<subject>_structure.json
//! <root>/<subject>/<main id>/<subtopic id>_lesson.json
//! <root>/<subject>/<main id>/<subtopic id>_assessments.json
//! <root>/<subject>_content.json
//! <root>/<subject>_roadmap.json
//! ```
//!
//! Files are derived artifacts. Writes go to a sibling temp file that is then
//! renamed over the target, so a reader sees either the previous complete file
//! or the new one.

use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::{
    mem,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Which per-subtopic record a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Lesson,
    Assessments,
}

impl RecordKind {
    fn suffix(self) -> &'static str {
        match self {
            RecordKind::Lesson => "lesson",
            RecordKind::Assessments => "assessments",
        }
    }
}

/// Owns the output root and the writes in flight against it.
#[derive(Clone, Debug)]
pub struct OutputStore {
    root: PathBuf,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn structure_path(&self, subject: &str) -> PathBuf {
        self.root
            .join(format!("{}_structure.json", subject_key(subject)))
    }

    pub fn content_path(&self, subject: &str) -> PathBuf {
        self.root.join(format!("{}_content.json", subject_key(subject)))
    }

    pub fn roadmap_path(&self, subject: &str) -> PathBuf {
        self.root.join(format!("{}_roadmap.json", subject_key(subject)))
    }

    pub fn record_path(
        &self,
        subject: &str,
        main_topic_id: &str,
        subtopic_id: &str,
        kind: RecordKind,
    ) -> PathBuf {
        self.root
            .join(subject_key(subject))
            .join(path_component(main_topic_id))
            .join(format!("{}_{}.json", path_component(subtopic_id), kind.suffix()))
    }

    /// Writes `value` as pretty JSON, replacing any previous file atomically.
    pub async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let contents = serde_json::to_vec_pretty(value).context("Failed to serialize record")?;
        write_atomic(path, &contents).await
    }

    /// Like [`Self::write_json`], but a failure is logged instead of returned.
    pub async fn persist<T: Serialize + ?Sized>(&self, path: &Path, value: &T) {
        match self.write_json(path, value).await {
            Ok(()) => debug!(path = %path.display(), "Persisted"),
            Err(e) => warn!(path = %path.display(), error = ?e, "Failed to persist output"),
        }
    }

    /// Schedules a write in the background and returns immediately.
    ///
    /// The value is serialized up front, so the caller may keep using its copy.
    /// Call [`Self::flush`] to wait for every scheduled write.
    pub fn persist_detached<T: Serialize + ?Sized>(&self, path: PathBuf, value: &T) {
        let contents = match serde_json::to_vec_pretty(value) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = ?e, "Failed to serialize record");
                return;
            }
        };

        let handle = tokio::spawn(async move {
            match write_atomic(&path, &contents).await {
                Ok(()) => debug!(path = %path.display(), "Persisted"),
                Err(e) => warn!(path = %path.display(), error = ?e, "Failed to persist output"),
            }
        });
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handle);
    }

    /// Waits for every write scheduled with [`Self::persist_detached`] so far.
    pub async fn flush(&self) {
        let handles = mem::take(
            &mut *self
                .pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                warn!(error = ?e, "Background write task failed");
            }
        }
    }
}

/// Lower-cased subject used in every path, reduced to a single component.
pub fn subject_key(subject: &str) -> String {
    path_component(&subject.trim().to_lowercase())
}

/// Maps caller-supplied text onto one file name under the output root.
///
/// Separators and other characters outside `[alnum - _ . space]` become `_`.
/// Leading dots become `_` too, so the result is never `.`, `..` or hidden,
/// and never empty.
fn path_component(raw: &str) -> String {
    let mut component: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let leading_dots = component.len() - component.trim_start_matches('.').len();
    component.replace_range(..leading_dots, &"_".repeat(leading_dots));
    if component.is_empty() {
        component.push('_');
    }
    component
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("Invalid output file name")?;
    let tmp_path = path.with_file_name(format!(
        ".{}.tmp.{}.{}",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    if let Err(e) = tokio::fs::write(&tmp_path, contents).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e).with_context(|| format!("Failed to write {}", tmp_path.display()));
    }
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to move output into {}", path.display()))
}
