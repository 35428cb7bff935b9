use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Location and fingerprint of a file written to the upload directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub path: String,
    pub saved_filename: String,
    /// SHA-256 of the content, lowercase hex
    pub hash: String,
    pub size: i64,
}

#[derive(Clone)]
pub struct FileService {
    upload_path: String,
}

impl FileService {
    pub fn new(upload_path: String) -> Self {
        Self { upload_path }
    }

    /// Initialize the upload directory structure
    pub async fn initialize_directory_structure(&self) -> Result<()> {
        let base_path = Path::new(&self.upload_path);

        for dir in ["documents", "temp"] {
            let dir_path = base_path.join(dir);
            if let Err(e) = fs::create_dir_all(&dir_path).await {
                error!("Failed to create directory {:?}: {}", dir_path, e);
                return Err(anyhow::anyhow!("Failed to create directory structure: {}", e));
            }
            info!("Ensured directory exists: {:?}", dir_path);
        }

        Ok(())
    }

    pub fn get_documents_path(&self) -> PathBuf {
        Path::new(&self.upload_path).join("documents")
    }

    pub fn get_temp_path(&self) -> PathBuf {
        Path::new(&self.upload_path).join("temp")
    }

    /// Write `data` under `documents/` with a UUID name that keeps the original extension.
    pub async fn save_file(&self, filename: &str, data: &[u8]) -> Result<StoredFile> {
        let file_id = Uuid::new_v4();
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        let saved_filename = if extension.is_empty() {
            file_id.to_string()
        } else {
            format!("{}.{}", file_id, extension)
        };

        let documents_dir = self.get_documents_path();
        if let Err(e) = fs::create_dir_all(&documents_dir).await {
            error!("Failed to create documents directory: {}", e);
            return Err(anyhow::anyhow!("Failed to create documents directory: {}", e));
        }

        let file_path = documents_dir.join(&saved_filename);
        fs::write(&file_path, data).await?;
        debug!("Stored {} ({} bytes) as {:?}", filename, data.len(), file_path);

        Ok(StoredFile {
            path: file_path.to_string_lossy().to_string(),
            saved_filename,
            hash: calculate_file_hash(data),
            size: data.len() as i64,
        })
    }

    pub async fn read_file(&self, file_path: &str) -> Result<Vec<u8>> {
        if !Path::new(file_path).exists() {
            return Err(anyhow::anyhow!("File not found: {}", file_path));
        }
        Ok(fs::read(file_path).await?)
    }

    /// Remove a stored file. Missing files are not an error.
    pub async fn delete_file(&self, file_path: &str) -> Result<()> {
        match fs::remove_file(file_path).await {
            Ok(()) => {
                info!("Deleted stored file: {}", file_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("File already removed: {}", file_path);
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!("Failed to delete {}: {}", file_path, e)),
        }
    }
}

pub fn calculate_file_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
