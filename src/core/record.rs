use serde::{Deserialize, Serialize};

use super::rename::{extension_of, remap_extension, TargetExtension};

/// One ingested file and its renamed destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    id: String,
    original_path: String,
    new_path: String,
    #[serde(with = "crate::utils::base64_bytes")]
    raw_bytes: Vec<u8>,
    original_extension: String,
    new_extension: String,
}

impl FileRecord {
    pub fn new(
        original_path: impl Into<String>,
        raw_bytes: Vec<u8>,
        modified_ms: i64,
        target: &TargetExtension,
    ) -> Self {
        let original_path = original_path.into();
        let id = format!("{}:{}:{}", original_path, modified_ms, raw_bytes.len());
        let new_path = remap_extension(&original_path, target);
        let original_extension = extension_of(&original_path).to_string();

        Self {
            id,
            new_path,
            raw_bytes,
            original_extension,
            new_extension: target.as_str().to_string(),
            original_path,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    pub fn new_path(&self) -> &str {
        &self.new_path
    }

    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    pub fn original_extension(&self) -> &str {
        &self.original_extension
    }

    pub fn new_extension(&self) -> &str {
        &self.new_extension
    }

    pub fn size(&self) -> usize {
        self.raw_bytes.len()
    }
}

/// The ordered set of files currently loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkingSet {
    records: Vec<FileRecord>,
}

impl WorkingSet {
    pub fn new(records: Vec<FileRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.records.iter().map(FileRecord::size).sum()
    }
}

impl<'a> IntoIterator for &'a WorkingSet {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
