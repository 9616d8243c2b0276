use crate::shared::error::ScanError;
use crate::shared::security::{validate_not_symlink, validate_size, MAX_CONTENT_SIZE};
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// FileSystemReader adapter for loading the content of `file` scans
///
/// The CLI hands the content to the scan engine; the engine itself never
/// touches the filesystem.
pub struct FileSystemReader;

impl FileSystemReader {
    pub fn new() -> Self {
        Self
    }

    /// Safely read a file with security checks:
    /// - Reject symbolic links
    /// - Validate file is a regular file
    /// - Check the content size limit
    pub fn read_content(&self, path: &Path) -> Result<String> {
        let to_validation = |e: anyhow::Error| -> anyhow::Error {
            ScanError::validation(
                format!("Cannot read {}: {}", path.display(), e),
                "Pass a regular, readable file with --content-file",
            )
            .into()
        };

        validate_not_symlink(path, "read").map_err(to_validation)?;

        let metadata = fs::metadata(path).map_err(|e| to_validation(e.into()))?;
        if !metadata.is_file() {
            return Err(to_validation(anyhow::anyhow!("not a regular file")));
        }

        validate_size(metadata.len(), "content file", MAX_CONTENT_SIZE).map_err(to_validation)?;

        fs::read_to_string(path).map_err(|e| to_validation(e.into()))
    }
}

impl Default for FileSystemReader {
    fn default() -> Self {
        Self::new()
    }
}
