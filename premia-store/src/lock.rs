//! Process-wide writer locks, one per dataset path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

type Registry = Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>;

static WRITERS: OnceLock<Registry> = OnceLock::new();

/// Lock shared by every store handle opened on the same dataset path.
///
/// Paths are made absolute first so `./data.csv` and `data.csv` agree.
/// Different spellings that resolve through symlinks are not unified.
pub(crate) fn writer_lock(path: &Path) -> Arc<AsyncMutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let registry = WRITERS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = registry.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(map.entry(key).or_insert_with(|| Arc::new(AsyncMutex::new(()))))
}
