//! The ingestion pipeline: walk, read every file concurrently, rename.

use futures_util::future::try_join_all;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::entry::DropItems;
use super::record::FileRecord;
use super::rename::TargetExtension;
use super::walker::{walk, WalkedFile};

/// Errors that abort an ingestion batch.
#[derive(Debug)]
pub enum IngestError {
    /// A directory could not be listed (or could not be listed from this source).
    Enumerate {
        path: String,
        source: io::Error,
    },

    /// A file's contents could not be read.
    Read {
        path: String,
        source: io::Error,
    },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Enumerate { path, source } => {
                write!(f, "Failed to list {}: {}", path, source)
            }
            IngestError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path, source)
            }
        }
    }
}

impl StdError for IngestError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            IngestError::Enumerate { source, .. } => Some(source),
            IngestError::Read { source, .. } => Some(source),
        }
    }
}

async fn load_record(
    file: &WalkedFile,
    target: &TargetExtension,
) -> Result<FileRecord, IngestError> {
    let bytes = file
        .entry
        .read()
        .await
        .map_err(|source| IngestError::Read {
            path: file.relative_path.clone(),
            source,
        })?;
    Ok(FileRecord::new(
        file.relative_path.clone(),
        bytes,
        file.entry.modified_ms(),
        target,
    ))
}

/// Walks `items` and reads every file at once.
///
/// The result follows traversal order, not read completion order. A single
/// failed read fails the whole batch.
pub async fn ingest(
    items: DropItems,
    target: &TargetExtension,
) -> Result<Vec<FileRecord>, IngestError> {
    let files = walk(items).await?;
    let records = try_join_all(files.iter().map(|file| load_record(file, target))).await?;
    debug!(
        count = records.len(),
        target = %target,
        "Ingestion batch complete"
    );
    Ok(records)
}

/// Hands out tickets so that only the newest ingestion may publish results.
#[derive(Debug, Default)]
pub struct IngestGate {
    generation: AtomicU64,
}

/// Proof that an ingestion was started; stale once a newer one begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestTicket(u64);

impl IngestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> IngestTicket {
        IngestTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: IngestTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }
}
