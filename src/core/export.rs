//! Archive, combined-text and "download all" output.

use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::{self, Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::config::data::path_display;
use super::prompt::framed_section;
use super::record::{FileRecord, WorkingSet};
use super::rename::leaf_name;

pub const DEFAULT_ARCHIVE_NAME: &str = "renamed-files.zip";

#[derive(Debug)]
pub enum ExportError {
    /// There is nothing to export.
    Empty,

    /// Two records map to the same name inside the archive.
    DuplicateEntry(String),

    /// The zip writer failed.
    Archive(zip::result::ZipError),

    /// Writing the output file failed.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Empty => write!(f, "No files loaded"),
            ExportError::DuplicateEntry(name) => {
                write!(f, "More than one file would be stored as {name}")
            }
            ExportError::Archive(err) => write!(f, "Failed to build archive: {err}"),
            ExportError::Io { path, source } => {
                write!(f, "Failed to write {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for ExportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ExportError::Archive(err) => Some(err),
            ExportError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::Archive(err)
    }
}

/// The archive entry name for `record`.
pub fn archive_entry_name(record: &FileRecord, preserve_folders: bool) -> &str {
    if preserve_folders {
        record.new_path()
    } else {
        leaf_name(record.new_path())
    }
}

/// Streams every record, unmodified, into a zip written to `writer`.
pub fn write_archive<W: Write + Seek>(
    working_set: &WorkingSet,
    preserve_folders: bool,
    writer: W,
) -> Result<W, ExportError> {
    if working_set.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut seen = HashSet::new();
    for record in working_set {
        let name = archive_entry_name(record, preserve_folders);
        if !seen.insert(name) {
            return Err(ExportError::DuplicateEntry(name.to_string()));
        }
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);
    for record in working_set {
        zip.start_file(archive_entry_name(record, preserve_folders), options)?;
        zip.write_all(record.raw_bytes())
            .map_err(|err| ExportError::Archive(err.into()))?;
    }
    Ok(zip.finish()?)
}

pub fn archive_bytes(working_set: &WorkingSet, preserve_folders: bool) -> Result<Vec<u8>, ExportError> {
    write_archive(working_set, preserve_folders, Cursor::new(Vec::new())).map(Cursor::into_inner)
}

/// Every record as a marker-framed section, in working-set order.
pub fn combined_text(working_set: &WorkingSet) -> String {
    let mut document = String::new();
    for (index, record) in working_set.iter().enumerate() {
        if index > 0 {
            document.push('\n');
        }
        let content = String::from_utf8_lossy(record.raw_bytes());
        document.push_str(&framed_section(record.original_path(), &content));
    }
    document
}

/// Writes `bytes` to `path` through a temporary file in the same directory.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new_in("."),
    }
    .map_err(io_err)?;
    temp_file.write_all(bytes).map_err(io_err)?;
    temp_file.persist(path).map_err(|err| io_err(err.error))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote output file");
    Ok(())
}

pub fn export_archive(
    working_set: &WorkingSet,
    preserve_folders: bool,
    path: &Path,
) -> Result<(), ExportError> {
    let bytes = archive_bytes(working_set, preserve_folders)?;
    write_output(path, &bytes)
}

pub fn export_combined_text(working_set: &WorkingSet, path: &Path) -> Result<(), ExportError> {
    if working_set.is_empty() {
        return Err(ExportError::Empty);
    }
    write_output(path, combined_text(working_set).as_bytes())
}

/// What "download all" does for the current working set.
#[derive(Debug, PartialEq, Eq)]
pub enum DownloadPlan<'a> {
    Nothing,
    Single(&'a FileRecord),
    Archive,
}

impl<'a> DownloadPlan<'a> {
    pub fn for_working_set(working_set: &'a WorkingSet) -> Self {
        match working_set.records() {
            [] => DownloadPlan::Nothing,
            [only] => DownloadPlan::Single(only),
            _ => DownloadPlan::Archive,
        }
    }
}

/// Saves one file directly, or everything as an archive, into `out_dir`.
/// Returns the written path, or `None` when nothing is loaded.
pub fn download_all(
    working_set: &WorkingSet,
    preserve_folders: bool,
    out_dir: &Path,
    archive_name: &str,
) -> Result<Option<PathBuf>, ExportError> {
    match DownloadPlan::for_working_set(working_set) {
        DownloadPlan::Nothing => Ok(None),
        DownloadPlan::Single(record) => {
            let path = out_dir.join(leaf_name(record.new_path()));
            write_output(&path, record.raw_bytes())?;
            Ok(Some(path))
        }
        DownloadPlan::Archive => {
            let path = out_dir.join(archive_name);
            export_archive(working_set, preserve_folders, &path)?;
            Ok(Some(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rename::TargetExtension;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn working_set(files: &[(&str, &str)]) -> WorkingSet {
        let ts = TargetExtension::parse("ts").unwrap();
        WorkingSet::new(
            files
                .iter()
                .map(|(path, body)| FileRecord::new(*path, body.as_bytes().to_vec(), 0, &ts))
                .collect(),
        )
    }

    fn entries(bytes: Vec<u8>) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut body = String::new();
                file.read_to_string(&mut body).unwrap();
                (file.name().to_string(), body)
            })
            .collect()
    }

    #[test]
    fn archive_preserves_folders_when_asked() {
        let set = working_set(&[("src/a.js", "A"), ("src/lib/b.js", "B")]);
        assert_eq!(
            entries(archive_bytes(&set, true).unwrap()),
            vec![
                ("src/a.ts".to_string(), "A".to_string()),
                ("src/lib/b.ts".to_string(), "B".to_string()),
            ]
        );
        assert_eq!(
            entries(archive_bytes(&set, false).unwrap()),
            vec![
                ("a.ts".to_string(), "A".to_string()),
                ("b.ts".to_string(), "B".to_string()),
            ]
        );
    }

    #[test]
    fn flattening_collisions_fail() {
        let set = working_set(&[("x/a.js", "1"), ("y/a.js", "2")]);
        assert!(matches!(
            archive_bytes(&set, false),
            Err(ExportError::DuplicateEntry(name)) if name == "a.ts"
        ));
        assert!(archive_bytes(&set, true).is_ok());
    }

    #[test]
    fn combined_text_frames_sections_in_order() {
        let set = working_set(&[("a.ts", "A"), ("b/c.ts", "B")]);
        assert_eq!(
            combined_text(&set),
            "--- START OF FILE: a.ts ---\nA\n--- END OF FILE: a.ts ---\n\n\
             --- START OF FILE: b/c.ts ---\nB\n--- END OF FILE: b/c.ts ---\n"
        );
    }

    #[test]
    fn download_plan_depends_on_count() {
        let empty = WorkingSet::default();
        let one = working_set(&[("a.js", "a")]);
        let two = working_set(&[("a.js", "a"), ("b.js", "b")]);

        assert_eq!(DownloadPlan::for_working_set(&empty), DownloadPlan::Nothing);
        assert_eq!(
            DownloadPlan::for_working_set(&one),
            DownloadPlan::Single(&one.records()[0])
        );
        assert_eq!(DownloadPlan::for_working_set(&two), DownloadPlan::Archive);
    }

    #[test]
    fn download_all_writes_single_file_or_archive() {
        let temp_dir = TempDir::new().unwrap();

        let one = working_set(&[("dir/only.js", "solo")]);
        let written = download_all(&one, true, temp_dir.path(), DEFAULT_ARCHIVE_NAME)
            .unwrap()
            .unwrap();
        assert_eq!(written, temp_dir.path().join("only.ts"));
        assert_eq!(fs::read(&written).unwrap(), b"solo");

        let two = working_set(&[("a.js", "a"), ("b.js", "b")]);
        let written = download_all(&two, true, temp_dir.path(), "bundle.zip")
            .unwrap()
            .unwrap();
        assert_eq!(written, temp_dir.path().join("bundle.zip"));
        assert_eq!(entries(fs::read(&written).unwrap()).len(), 2);

        assert_eq!(
            download_all(&WorkingSet::default(), true, temp_dir.path(), "x.zip").unwrap(),
            None
        );
    }

    #[test]
    fn exporting_nothing_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.txt");
        assert!(matches!(
            export_combined_text(&WorkingSet::default(), &path),
            Err(ExportError::Empty)
        ));
        assert!(!path.exists());
    }
}
