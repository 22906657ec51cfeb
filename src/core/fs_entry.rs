//! Drop entries backed by paths on the local filesystem.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

use super::entry::{DropEntry, EntryBatches, EntryKind, NoChildren};

pub const FS_BATCH_SIZE: usize = 100;

/// A drop entry backed by a path on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsEntry {
    path: PathBuf,
    name: String,
    kind: EntryKind,
    size: u64,
    modified_ms: i64,
}

impl FsEntry {
    /// Stats `path` and captures its metadata. Symlinks are followed.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        Ok(Self::from_metadata(path, &metadata))
    }

    /// Stats a directory child without trusting symlinks. A link to a file
    /// is read through; a link to a directory or a dangling link yields
    /// `None`, so a walk never loops back into an ancestor.
    async fn open_child(path: PathBuf) -> io::Result<Option<Self>> {
        let link = tokio::fs::symlink_metadata(&path).await?;
        if !link.file_type().is_symlink() {
            return Ok(Some(Self::from_metadata(path, &link)));
        }
        match tokio::fs::metadata(&path).await {
            Ok(target) if target.is_file() => Ok(Some(Self::from_metadata(path, &target))),
            Ok(_) => {
                debug!(path = %path.display(), "Not following directory symlink");
                Ok(None)
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "Skipping dangling symlink");
                Ok(None)
            }
        }
    }

    fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .or_else(|| {
                // `.` and `..` have no file name; fall back to the resolved one.
                std::fs::canonicalize(&path)
                    .ok()
                    .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            })
            .unwrap_or_else(|| path.display().to_string());
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        Self {
            path,
            name,
            kind,
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            modified_ms,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DropEntry for FsEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn modified_ms(&self) -> i64 {
        self.modified_ms
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    fn list_children(&self) -> Box<dyn EntryBatches> {
        match self.kind {
            EntryKind::File => Box::new(NoChildren),
            EntryKind::Directory => Box::new(FsBatches {
                dir: self.path.clone(),
                pending: None,
                batch_size: FS_BATCH_SIZE,
            }),
        }
    }
}

/// Lists a directory once, sorted by name, and serves it in batches.
/// Hidden names are dropped before anything is stat'd.
struct FsBatches {
    dir: PathBuf,
    pending: Option<Vec<PathBuf>>,
    batch_size: usize,
}

impl FsBatches {
    async fn list(dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut reader = tokio::fs::read_dir(dir).await?;
        let mut paths = Vec::new();
        while let Some(child) = reader.next_entry().await? {
            if child.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            paths.push(child.path());
        }
        paths.sort();
        debug!(dir = %dir.display(), count = paths.len(), "Listed directory");
        Ok(paths)
    }
}

#[async_trait]
impl EntryBatches for FsBatches {
    async fn next_batch(&mut self) -> io::Result<Vec<Box<dyn DropEntry>>> {
        if self.pending.is_none() {
            self.pending = Some(Self::list(&self.dir).await?);
        }
        let Some(pending) = self.pending.as_mut() else {
            return Ok(Vec::new());
        };

        // Skipped children must not produce an empty batch early, since
        // that ends the listing.
        let mut batch: Vec<Box<dyn DropEntry>> = Vec::new();
        while batch.is_empty() && !pending.is_empty() {
            let take = self.batch_size.min(pending.len());
            for path in pending.drain(..take).collect::<Vec<_>>() {
                if let Some(entry) = FsEntry::open_child(path).await? {
                    batch.push(Box::new(entry));
                }
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_reports_metadata() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("hello.txt");
        std::fs::write(&file_path, "hello").unwrap();

        let entry = FsEntry::open(&file_path).await.unwrap();
        assert_eq!(entry.name(), "hello.txt");
        assert!(entry.is_file());
        assert_eq!(entry.size(), 5);
        assert!(entry.modified_ms() > 0);
        assert_eq!(entry.read().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn directory_batches_are_sorted_and_drain() {
        let dir = tempdir().unwrap();
        for name in ["b.txt", "a.txt", "c"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }

        let root = FsEntry::open(dir.path()).await.unwrap();
        assert!(root.is_directory());

        let mut batches = root.list_children();
        let first = batches.next_batch().await.unwrap();
        let names: Vec<_> = first.iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c"]);
        assert!(batches.next_batch().await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hidden_dangling_links_are_never_stated() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("main.js"), "run()").unwrap();
        std::os::unix::fs::symlink("user@host.1234:1", dir.path().join(".#main.js")).unwrap();

        let root = FsEntry::open(dir.path()).await.unwrap();
        let mut batches = root.list_children();
        let names: Vec<_> = batches
            .next_batch()
            .await
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["main.js"]);
        assert!(batches.next_batch().await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_to_directories_are_not_followed() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("self")).unwrap();
        std::os::unix::fs::symlink("missing-target", dir.path().join("broken")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("link.txt"))
            .unwrap();

        let root = FsEntry::open(dir.path()).await.unwrap();
        let mut batches = root.list_children();
        let batch = batches.next_batch().await.unwrap();
        let names: Vec<_> = batch.iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["a.txt", "link.txt"]);
        assert!(batch.iter().all(|e| e.is_file()));
        assert_eq!(batch[1].size(), 1);
    }

    #[tokio::test]
    async fn skipped_children_do_not_end_the_listing_early() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("z.txt"), "z").unwrap();
        #[cfg(unix)]
        for name in ["a-link", "b-link"] {
            std::os::unix::fs::symlink("nowhere", dir.path().join(name)).unwrap();
        }

        let root = FsEntry::open(dir.path()).await.unwrap();
        let mut batches = FsBatches {
            dir: root.path().to_path_buf(),
            pending: None,
            batch_size: 1,
        };
        let first = batches.next_batch().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name(), "z.txt");
        assert!(batches.next_batch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_path_fails_to_open() {
        let dir = tempdir().unwrap();
        assert!(FsEntry::open(dir.path().join("nope")).await.is_err());
    }
}
