use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::application::{AppError, AppResult, DocumentStore};

/// One `<key>.json` file per document under a directory.
pub struct JsonFileDocumentStore {
    dir: PathBuf,
}

impl JsonFileDocumentStore {
    pub async fn new(dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Storage(format!("{}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn read(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("{}: {e}", path.display()))),
        }
    }

    /// Writes a sibling temp file, then renames it over the document.
    async fn write(&self, key: &str, body: &str) -> AppResult<()> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        let storage_err = |e: std::io::Error| AppError::Storage(format!("{}: {e}", path.display()));

        let mut file = fs::File::create(&tmp).await.map_err(storage_err)?;
        file.write_all(body.as_bytes()).await.map_err(storage_err)?;
        file.sync_all().await.map_err(storage_err)?;
        drop(file);

        fs::rename(&tmp, &path).await.map_err(storage_err)?;
        debug!(path = %path.display(), bytes = body.len(), "document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_document_reads_as_none() {
        let temp = tempdir().unwrap();
        let store = JsonFileDocumentStore::new(temp.path()).await.unwrap();
        assert_eq!(store.read("db").await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_then_read() {
        let temp = tempdir().unwrap();
        let store = JsonFileDocumentStore::new(temp.path().join("nested"))
            .await
            .unwrap();

        store.write("db", r#"{"watches":[]}"#).await.unwrap();
        store.write("db", r#"{"watches":[1]}"#).await.unwrap();

        assert_eq!(
            store.read("db").await.unwrap().as_deref(),
            Some(r#"{"watches":[1]}"#)
        );
        assert!(store.path_for("db").exists());
        assert!(!temp.path().join("nested").join("db.json.tmp").exists());
    }
}
