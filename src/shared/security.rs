use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum size of scanned content and persisted entity files (50 MiB)
/// This prevents DoS attacks via excessively large inputs
pub const MAX_CONTENT_SIZE: u64 = 50 * 1024 * 1024;

/// Validates that a path is not a symbolic link
///
/// # Security
/// This function uses `symlink_metadata()` instead of `metadata()` to ensure
/// we check the symlink itself, not the target it points to.
///
/// # Arguments
/// * `path` - The path to validate
/// * `operation` - Description of the operation (e.g., "read", "write") for error messages
///
/// # Errors
/// Returns an error if the path is a symbolic link or if metadata cannot be read
pub fn validate_not_symlink(path: &Path, operation: &str) -> Result<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read metadata for {} operation on {}: {}",
            operation,
            path.display(),
            e
        )
    })?;

    if metadata.is_symlink() {
        anyhow::bail!(
            "Security: {} is a symbolic link. For security reasons, {} operations on symbolic links are not allowed.",
            path.display(),
            operation
        );
    }

    Ok(())
}

/// Validates a size is within acceptable limits
///
/// # Arguments
/// * `size` - The size in bytes
/// * `what` - Description of the measured input (for error messages)
/// * `max_size` - Maximum allowed size in bytes
pub fn validate_size(size: u64, what: &str, max_size: u64) -> Result<()> {
    if size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            what,
            size,
            max_size
        );
    }
    Ok(())
}
