//! Drop entries: the handles the walker traverses.
//!
//! A drop hands over a mix of files and directories. Every handle exposes the
//! same capability set regardless of where it came from, and directories are
//! listed through a lazy, batched reader that signals completion with an
//! empty batch.

use async_trait::async_trait;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[async_trait]
pub trait DropEntry: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> EntryKind;

    /// Size in bytes. Directories report zero.
    fn size(&self) -> u64;

    /// Last modification time in milliseconds since the Unix epoch.
    fn modified_ms(&self) -> i64;

    async fn read(&self) -> io::Result<Vec<u8>>;

    /// Starts a fresh listing of the entry's children. Files yield nothing.
    fn list_children(&self) -> Box<dyn EntryBatches>;

    fn is_file(&self) -> bool {
        self.kind() == EntryKind::File
    }

    fn is_directory(&self) -> bool {
        self.kind() == EntryKind::Directory
    }

    fn is_hidden(&self) -> bool {
        self.name().starts_with('.')
    }
}

/// A finite sequence of child batches. An empty batch means the listing is
/// exhausted; it cannot be rewound.
#[async_trait]
pub trait EntryBatches: Send {
    async fn next_batch(&mut self) -> io::Result<Vec<Box<dyn DropEntry>>>;
}

/// The batch reader for entries without children.
pub struct NoChildren;

#[async_trait]
impl EntryBatches for NoChildren {
    async fn next_batch(&mut self) -> io::Result<Vec<Box<dyn DropEntry>>> {
        Ok(Vec::new())
    }
}

/// What a drop produced.
pub enum DropItems {
    /// Entries that can be traversed, files and directories alike.
    Hierarchical(Vec<Box<dyn DropEntry>>),
    /// A plain file list from a source without directory support.
    Flat(Vec<Box<dyn DropEntry>>),
}

impl DropItems {
    pub fn len(&self) -> usize {
        match self {
            DropItems::Hierarchical(items) | DropItems::Flat(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const DEFAULT_MEMORY_BATCH: usize = 100;

/// An in-memory entry tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File {
        name: String,
        bytes: Vec<u8>,
        modified_ms: i64,
    },
    Directory {
        name: String,
        children: Vec<Entry>,
        batch_size: usize,
    },
}

impl Entry {
    pub fn file(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Entry::File {
            name: name.into(),
            bytes: bytes.into(),
            modified_ms: 0,
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<Entry>) -> Self {
        Entry::Directory {
            name: name.into(),
            children,
            batch_size: DEFAULT_MEMORY_BATCH,
        }
    }

    /// Sets the listing batch size of a directory. Files are unaffected.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        if let Entry::Directory { batch_size, .. } = &mut self {
            *batch_size = size.max(1);
        }
        self
    }

    pub fn with_modified(mut self, ms: i64) -> Self {
        if let Entry::File { modified_ms, .. } = &mut self {
            *modified_ms = ms;
        }
        self
    }

    pub fn boxed(self) -> Box<dyn DropEntry> {
        Box::new(self)
    }
}

#[async_trait]
impl DropEntry for Entry {
    fn name(&self) -> &str {
        match self {
            Entry::File { name, .. } | Entry::Directory { name, .. } => name,
        }
    }

    fn kind(&self) -> EntryKind {
        match self {
            Entry::File { .. } => EntryKind::File,
            Entry::Directory { .. } => EntryKind::Directory,
        }
    }

    fn size(&self) -> u64 {
        match self {
            Entry::File { bytes, .. } => bytes.len() as u64,
            Entry::Directory { .. } => 0,
        }
    }

    fn modified_ms(&self) -> i64 {
        match self {
            Entry::File { modified_ms, .. } => *modified_ms,
            Entry::Directory { .. } => 0,
        }
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        match self {
            Entry::File { bytes, .. } => Ok(bytes.clone()),
            Entry::Directory { name, .. } => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{name} is a directory"),
            )),
        }
    }

    fn list_children(&self) -> Box<dyn EntryBatches> {
        match self {
            Entry::File { .. } => Box::new(NoChildren),
            Entry::Directory {
                children,
                batch_size,
                ..
            } => Box::new(MemoryBatches {
                pending: children.clone(),
                batch_size: *batch_size,
            }),
        }
    }
}

struct MemoryBatches {
    pending: Vec<Entry>,
    batch_size: usize,
}

#[async_trait]
impl EntryBatches for MemoryBatches {
    async fn next_batch(&mut self) -> io::Result<Vec<Box<dyn DropEntry>>> {
        let take = self.batch_size.min(self.pending.len());
        Ok(self
            .pending
            .drain(..take)
            .map(|entry| Box::new(entry) as Box<dyn DropEntry>)
            .collect())
    }
}
