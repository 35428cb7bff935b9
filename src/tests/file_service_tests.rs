#[cfg(test)]
use crate::services::file_service::{calculate_file_hash, FileService};
#[cfg(test)]
use std::fs;
#[cfg(test)]
use tempfile::TempDir;

#[cfg(test)]
fn create_test_file_service() -> (FileService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let upload_path = temp_dir.path().to_string_lossy().to_string();
    let service = FileService::new(upload_path);
    (service, temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_file() {
        let (service, _temp_dir) = create_test_file_service();
        let data = b"Hello, World!";

        let stored = service.save_file("test.txt", data).await.unwrap();

        assert!(fs::metadata(&stored.path).is_ok());
        assert_eq!(fs::read(&stored.path).unwrap(), data);
        assert_eq!(stored.size, data.len() as i64);
        assert!(stored.path.contains("documents"));
    }

    #[tokio::test]
    async fn test_save_file_keeps_extension() {
        let (service, _temp_dir) = create_test_file_service();

        let stored = service.save_file("Facture-2024.PDF", b"%PDF-1.4").await.unwrap();

        assert!(stored.saved_filename.ends_with(".pdf"));
        assert_ne!(stored.saved_filename, "Facture-2024.PDF");
    }

    #[tokio::test]
    async fn test_save_file_without_extension() {
        let (service, _temp_dir) = create_test_file_service();

        let stored = service.save_file("scan", b"data").await.unwrap();

        assert!(!stored.saved_filename.contains('.'));
        assert_eq!(stored.saved_filename.len(), 36);
    }

    #[tokio::test]
    async fn test_same_name_twice_gets_distinct_paths() {
        let (service, _temp_dir) = create_test_file_service();

        let first = service.save_file("receipt.png", b"one").await.unwrap();
        let second = service.save_file("receipt.png", b"two").await.unwrap();

        assert_ne!(first.path, second.path);
    }

    #[tokio::test]
    async fn test_hash_is_sha256_hex() {
        let (service, _temp_dir) = create_test_file_service();

        let stored = service.save_file("a.txt", b"abc").await.unwrap();

        assert_eq!(
            stored.hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(stored.hash, calculate_file_hash(b"abc"));
    }

    #[tokio::test]
    async fn test_read_and_delete_file() {
        let (service, _temp_dir) = create_test_file_service();
        let stored = service.save_file("note.txt", b"contenu").await.unwrap();

        assert_eq!(service.read_file(&stored.path).await.unwrap(), b"contenu");

        service.delete_file(&stored.path).await.unwrap();
        assert!(service.read_file(&stored.path).await.is_err());
        // Deleting twice is fine
        service.delete_file(&stored.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_directory_structure() {
        let (service, temp_dir) = create_test_file_service();

        service.initialize_directory_structure().await.unwrap();

        assert!(temp_dir.path().join("documents").is_dir());
        assert!(temp_dir.path().join("temp").is_dir());
    }
}
