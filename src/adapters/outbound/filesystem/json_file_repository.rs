use crate::ports::outbound::Repository;
use crate::scan_orchestration::domain::Entity;
use crate::shared::error::ScanError;
use crate::shared::security::{validate_not_symlink, validate_size, MAX_CONTENT_SIZE};
use crate::shared::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// JsonFileRepository adapter persisting one pretty-printed JSON file per entity
///
/// Layout: `{root}/{T::KIND}/{id}.json`. Writes go to a temporary file that is
/// renamed into place, so readers never observe a half-written entity.
pub struct JsonFileRepository<T: Entity> {
    dir: PathBuf,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> JsonFileRepository<T> {
    /// Creates the repository under `root`; the entity directory is created on first write
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(T::KIND),
            _entity: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn storage_error(path: &Path, details: impl ToString) -> anyhow::Error {
        ScanError::Storage {
            path: path.to_path_buf(),
            details: details.to_string(),
        }
        .into()
    }

    /// Ids become file names, so anything that could escape the directory is rejected
    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ScanError::validation(
                format!("Invalid {} id: '{}'", T::KIND, id),
                "Ids contain only letters, digits, '-' and '_'",
            )
            .into());
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn read_entity(path: &Path) -> Result<T> {
        validate_not_symlink(path, "read").map_err(|e| Self::storage_error(path, e))?;
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| Self::storage_error(path, e))?;
        validate_size(metadata.len(), "stored entity", MAX_CONTENT_SIZE)
            .map_err(|e| Self::storage_error(path, e))?;

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Self::storage_error(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| Self::storage_error(path, format!("Invalid JSON: {}", e)))
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for JsonFileRepository<T> {
    async fn load(&self, id: &str) -> Result<Option<T>> {
        let path = self.path_for(id)?;
        match tokio::fs::symlink_metadata(&path).await {
            Ok(_) => Ok(Some(Self::read_entity(&path).await?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::storage_error(&path, e)),
        }
    }

    /// Unreadable files are skipped with a warning so one corrupt entity does
    /// not hide the others
    async fn load_all(&self) -> Result<Vec<T>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::storage_error(&self.dir, e)),
        };

        let mut entities = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::storage_error(&self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read_entity(&path).await {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable entity"),
            }
        }
        debug!(kind = T::KIND, count = entities.len(), "entities loaded");
        Ok(entities)
    }

    async fn save(&self, entity: &T) -> Result<()> {
        let path = self.path_for(entity.id())?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::storage_error(&self.dir, e))?;

        if tokio::fs::symlink_metadata(&path).await.is_ok() {
            validate_not_symlink(&path, "write").map_err(|e| Self::storage_error(&path, e))?;
        }

        let content = serde_json::to_string_pretty(entity)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .map_err(|e| Self::storage_error(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Self::storage_error(&path, e))?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::storage_error(&path, e)),
        }
    }
}
