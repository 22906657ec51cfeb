//! Extension rewriting for ingested paths.
//!
//! Paths are always `/`-separated relative paths. Only the final extension of
//! the leaf name changes; directory segments are carried over verbatim.

use memchr::memrchr;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

pub const DEFAULT_TARGET_EXTENSION: &str = "txt";

/// A validated extension token such as `ts` or `md`.
///
/// Tokens never contain a dot or a path separator, which keeps
/// [`remap_extension`] idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetExtension(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidExtension {
    Empty,
    Separator(String),
}

impl fmt::Display for InvalidExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidExtension::Empty => write!(f, "extension must not be empty"),
            InvalidExtension::Separator(token) => write!(
                f,
                "extension '{token}' must not contain '.', '/' or '\\'"
            ),
        }
    }
}

impl Error for InvalidExtension {}

impl TargetExtension {
    pub fn parse(raw: &str) -> Result<Self, InvalidExtension> {
        let token = raw.trim().trim_start_matches('.');
        if token.is_empty() {
            return Err(InvalidExtension::Empty);
        }
        if token.contains(&['.', '/', '\\'][..]) {
            return Err(InvalidExtension::Separator(token.to_string()));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TargetExtension {
    fn default() -> Self {
        Self(DEFAULT_TARGET_EXTENSION.to_string())
    }
}

impl fmt::Display for TargetExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TargetExtension {
    type Error = InvalidExtension;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TargetExtension> for String {
    fn from(value: TargetExtension) -> Self {
        value.0
    }
}

/// Splits a leaf name at its last `.`. A leaf without a dot is all base.
fn split_leaf(leaf: &str) -> (&str, Option<&str>) {
    match memrchr(b'.', leaf.as_bytes()) {
        Some(pos) => (&leaf[..pos], Some(&leaf[pos + 1..])),
        None => (leaf, None),
    }
}

/// Rewrites the final extension of `path` to `target`.
///
/// ```
/// use extshift::core::rename::{remap_extension, TargetExtension};
///
/// let ts = TargetExtension::parse("ts").unwrap();
/// assert_eq!(remap_extension("src/app.js", &ts), "src/app.ts");
/// assert_eq!(remap_extension("Makefile", &ts), "Makefile.ts");
/// ```
pub fn remap_extension(path: &str, target: &TargetExtension) -> String {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let leaf = segments.pop().unwrap_or("");
    let (base, _) = split_leaf(leaf);
    let renamed = format!("{base}.{target}");

    if segments.is_empty() {
        renamed
    } else {
        format!("{}/{}", segments.join("/"), renamed)
    }
}

/// The final extension of the leaf name, or an empty string when it has none.
pub fn extension_of(path: &str) -> &str {
    let leaf = path.rsplit('/').next().unwrap_or(path);
    split_leaf(leaf).1.unwrap_or("")
}

/// The last non-empty segment of a `/`-separated path.
pub fn leaf_name(path: &str) -> &str {
    path.split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .unwrap_or(path)
}
