//! Flattens dropped items into `(entry, relative path)` pairs.

use futures_util::future::{BoxFuture, FutureExt};
use tracing::debug;

use super::entry::{DropEntry, DropItems};
use super::ingest::IngestError;

pub struct WalkedFile {
    pub entry: Box<dyn DropEntry>,
    pub relative_path: String,
}

impl std::fmt::Debug for WalkedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkedFile")
            .field("relative_path", &self.relative_path)
            .field("size", &self.entry.size())
            .finish()
    }
}

fn is_ingestible_file(entry: &dyn DropEntry) -> bool {
    !entry.is_hidden() && entry.size() > 0
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Walks every dropped item, returning files in traversal order.
///
/// Hidden entries and empty files are skipped. Any listing failure aborts
/// the whole walk.
pub async fn walk(items: DropItems) -> Result<Vec<WalkedFile>, IngestError> {
    let mut files = Vec::new();
    match items {
        DropItems::Flat(entries) => {
            for entry in entries {
                if entry.is_hidden() {
                    continue;
                }
                if entry.is_directory() {
                    return Err(IngestError::Enumerate {
                        path: entry.name().to_string(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            "directories cannot be traversed from a flat file list",
                        ),
                    });
                }
                if is_ingestible_file(entry.as_ref()) {
                    let relative_path = entry.name().to_string();
                    files.push(WalkedFile {
                        entry,
                        relative_path,
                    });
                }
            }
        }
        DropItems::Hierarchical(entries) => {
            for entry in entries {
                files.extend(walk_entry(entry, String::new()).await?);
            }
        }
    }
    debug!(count = files.len(), "Walk complete");
    Ok(files)
}

fn walk_entry(
    entry: Box<dyn DropEntry>,
    parent: String,
) -> BoxFuture<'static, Result<Vec<WalkedFile>, IngestError>> {
    async move {
        if entry.is_hidden() {
            return Ok(Vec::new());
        }
        let path = join_path(&parent, entry.name());

        if entry.is_file() {
            if entry.size() == 0 {
                return Ok(Vec::new());
            }
            return Ok(vec![WalkedFile {
                entry,
                relative_path: path,
            }]);
        }

        let children = drain_children(entry.as_ref(), &path).await?;
        let mut files = Vec::new();
        for child in children {
            files.extend(walk_entry(child, path.clone()).await?);
        }
        Ok(files)
    }
    .boxed()
}

/// Reads batches until the listing reports an empty one.
async fn drain_children(
    entry: &dyn DropEntry,
    path: &str,
) -> Result<Vec<Box<dyn DropEntry>>, IngestError> {
    let mut reader = entry.list_children();
    let mut children = Vec::new();
    loop {
        let batch = reader
            .next_batch()
            .await
            .map_err(|source| IngestError::Enumerate {
                path: path.to_string(),
                source,
            })?;
        if batch.is_empty() {
            break;
        }
        children.extend(batch);
    }
    Ok(children)
}
