//! Incremental store handle: load and atomic upsert of the persisted dataset.

use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::Mutex as AsyncMutex;

use crate::codec::{self, DecodeError};
use crate::dataset::{Dataset, UpsertSummary};
use crate::lock::writer_lock;
use premia_core::{FeatureRow, PremiaError, WindowSet};

/// Handle to one persisted dataset.
///
/// Handles are cheap to clone. All handles opened on the same path share one
/// writer lock, so `upsert` calls are serialized process-wide while `load`
/// reads whatever complete file is currently in place.
#[derive(Debug, Clone)]
pub struct IncrementalStore {
    path: PathBuf,
    windows: WindowSet,
    writer: Arc<AsyncMutex<()>>,
}

impl IncrementalStore {
    /// Open a store at `path` whose layout follows `windows`.
    ///
    /// Nothing is read or created until the first `load` or `upsert`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, windows: WindowSet) -> Self {
        let path = path.into();
        Self {
            writer: writer_lock(&path),
            path,
            windows,
        }
    }

    /// Dataset location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Window layout of the dataset columns.
    #[must_use]
    pub const fn windows(&self) -> &WindowSet {
        &self.windows
    }

    /// Read the full dataset. An absent file is an empty dataset.
    ///
    /// # Errors
    /// Returns `StoreCorruption` when the file cannot be read, its header does
    /// not match the configured windows, a row fails to decode, or rows are
    /// not strictly ordered by key.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "premia::store::load",
            skip(self),
            fields(path = %self.path.display()),
        )
    )]
    pub async fn load(&self) -> Result<Dataset, PremiaError> {
        let path = self.path.clone();
        let windows = self.windows.clone();
        tokio::task::spawn_blocking(move || read_dataset(&path, &windows))
            .await
            .map_err(|e| PremiaError::Other(format!("dataset read task failed: {e}")))?
    }

    /// Blocking variant of [`IncrementalStore::load`] for synchronous callers.
    ///
    /// # Errors
    /// Same as [`IncrementalStore::load`].
    pub fn load_blocking(&self) -> Result<Dataset, PremiaError> {
        read_dataset(&self.path, &self.windows)
    }

    /// Merge `rows` into the dataset and replace the file atomically.
    ///
    /// Behavior and trade-offs:
    /// - Holds the path's writer lock for the whole read-merge-sort-write
    ///   section and nothing else.
    /// - Last write wins: an incoming row replaces a persisted row with the
    ///   same `(instrument, primary_timestamp)`; among incoming rows the later
    ///   one wins.
    /// - The new file is written next to the old one, synced, and renamed
    ///   over it. If the caller is cancelled mid-way the blocking write still
    ///   runs to completion or not at all; readers never see a partial file.
    /// - An empty `rows` validates the existing dataset but writes nothing.
    ///
    /// # Errors
    /// - `InvalidArg` if a row's window features do not match the store layout.
    /// - `StoreCorruption` if the existing dataset cannot be decoded; the file
    ///   is left untouched.
    /// - `Store` if writing or renaming the new file fails; the previous
    ///   dataset stays in place.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "premia::store::upsert",
            skip(self, rows),
            fields(path = %self.path.display(), rows = rows.len()),
        )
    )]
    pub async fn upsert(&self, rows: Vec<FeatureRow>) -> Result<UpsertSummary, PremiaError> {
        if let Some(bad) = rows.iter().find(|r| {
            r.windows.len() != self.windows.len()
                || r.windows
                    .iter()
                    .zip(self.windows.sizes())
                    .any(|(f, &w)| f.window != w)
        }) {
            return Err(PremiaError::InvalidArg(format!(
                "row {} @ {} does not carry windows {:?}",
                bad.instrument,
                bad.primary_timestamp,
                self.windows.sizes()
            )));
        }

        let guard = Arc::clone(&self.writer).lock_owned().await;
        let path = self.path.clone();
        let windows = self.windows.clone();
        let summary = tokio::task::spawn_blocking(move || -> Result<UpsertSummary, PremiaError> {
            let _guard = guard;
            let mut dataset = read_dataset(&path, &windows)?;
            if rows.is_empty() {
                return Ok(UpsertSummary {
                    total: dataset.len(),
                    ..UpsertSummary::default()
                });
            }
            let summary = dataset.merge(rows);
            write_dataset(&path, dataset.rows(), &windows)?;
            Ok(summary)
        })
        .await
        .map_err(|e| PremiaError::Store(format!("writer task failed: {e}")))??;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            inserted = summary.inserted,
            replaced = summary.replaced,
            total = summary.total,
            "dataset replaced"
        );
        Ok(summary)
    }
}

fn read_dataset(path: &Path, windows: &WindowSet) -> Result<Dataset, PremiaError> {
    let display = path.display().to_string();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Dataset::default()),
        Err(e) => return Err(PremiaError::corruption(display, format!("cannot open: {e}"))),
    };
    let rows = codec::read_rows(BufReader::new(file), windows).map_err(|e| match e {
        DecodeError::Header(reason) | DecodeError::Csv(reason) => {
            PremiaError::corruption(display.clone(), reason)
        }
        DecodeError::Record(line, reason) => {
            PremiaError::corruption(display.clone(), format!("line {line}: {reason}"))
        }
    })?;
    if let Some(i) = rows
        .windows(2)
        .position(|w| w[0].key() >= w[1].key())
    {
        return Err(PremiaError::corruption(
            display,
            format!(
                "rows not strictly ordered by (instrument, primary_timestamp) at data row {}",
                i + 2
            ),
        ));
    }
    Ok(Dataset::from_sorted(rows))
}

fn write_dataset(path: &Path, rows: &[FeatureRow], windows: &WindowSet) -> Result<(), PremiaError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|e| PremiaError::Store(format!("create {}: {e}", dir.display())))?;
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| PremiaError::Store(format!("temp file in {}: {e}", dir.display())))?;
    codec::write_rows(&mut tmp, rows, windows).map_err(PremiaError::Store)?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| PremiaError::Store(format!("sync: {e}")))?;
    tmp.persist(path)
        .map_err(|e| PremiaError::Store(format!("replace {}: {}", path.display(), e.error)))?;
    Ok(())
}
