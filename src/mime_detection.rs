/// MIME type detection and upload admission checks.
///
/// Uploaded bytes are identified in this order:
/// 1. Magic bytes of the content (most reliable)
/// 2. The Content-Type declared in the multipart part, when it is specific
/// 3. The filename extension
/// 4. `application/octet-stream`
///
/// The result is then checked against the configured size limit and allow-list.

use std::path::Path;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::upload::UploadError;

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Method that produced the final MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    MagicBytes,
    Declared,
    Extension,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MimeDetectionResult {
    pub mime_type: String,
    pub method: DetectionMethod,
    /// Content-Type the client sent, when it disagreed with the bytes
    pub declared_mismatch: Option<String>,
}

impl MimeDetectionResult {
    fn new(mime_type: impl Into<String>, method: DetectionMethod) -> Self {
        Self {
            mime_type: normalize_mime_type(&mime_type.into()),
            method,
            declared_mismatch: None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }
}

/// Identify an upload from its bytes, filename and declared content type.
pub fn detect_mime_type(content: &[u8], filename: &str, declared: Option<&str>) -> MimeDetectionResult {
    let declared = declared.map(normalize_mime_type).filter(|d| is_specific(d));

    if let Some(kind) = infer::get(content) {
        let mut result = MimeDetectionResult::new(kind.mime_type(), DetectionMethod::MagicBytes);
        if let Some(declared) = declared {
            if !are_mime_types_compatible(&result.mime_type, &declared) {
                warn!(
                    "MIME type mismatch for {}: declared={}, content={}",
                    filename, declared, result.mime_type
                );
                result.declared_mismatch = Some(declared);
            }
        }
        return result;
    }

    if let Some(declared) = declared {
        debug!("Using declared MIME type {} for {}", declared, filename);
        return MimeDetectionResult::new(declared, DetectionMethod::Declared);
    }

    match mime_guess::from_path(Path::new(filename)).first() {
        Some(guess) => {
            debug!("Extension-based detection: {} -> {}", filename, guess);
            MimeDetectionResult::new(guess.to_string(), DetectionMethod::Extension)
        }
        None => MimeDetectionResult::new(FALLBACK_MIME_TYPE, DetectionMethod::Fallback),
    }
}

/// Reject uploads that are empty, too large, or of a type the server does not process.
pub fn validate_upload(filename: &str, size: u64, mime_type: &str, config: &Config) -> Result<(), UploadError> {
    if size == 0 {
        return Err(UploadError::EmptyFile { filename: filename.to_string() });
    }
    if size > config.max_file_size_bytes() {
        return Err(UploadError::FileTooLarge { size, limit_mb: config.max_file_size_mb });
    }
    let mime_type = normalize_mime_type(mime_type);
    if !config.allowed_mime_types.iter().any(|allowed| allowed == &mime_type) {
        return Err(UploadError::UnsupportedMimeType { mime_type });
    }
    Ok(())
}

/// Lowercase, strip parameters, and fold common aliases.
pub fn normalize_mime_type(mime_type: &str) -> String {
    let base = mime_type.split(';').next().unwrap_or("").trim().to_lowercase();
    match base.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "image/tif" => "image/tiff".to_string(),
        "text/txt" => "text/plain".to_string(),
        "application/x-pdf" => "application/pdf".to_string(),
        _ => base,
    }
}

/// Generic types some clients send for everything
fn is_specific(mime_type: &str) -> bool {
    !matches!(
        mime_type,
        "" | "application/octet-stream" | "application/binary" | "binary/octet-stream" | "unknown"
    ) && mime_type.contains('/')
}

fn are_mime_types_compatible(detected: &str, declared: &str) -> bool {
    // Same primary type is close enough, e.g. image/png declared for a jpeg
    detected == declared || detected.split('/').next() == declared.split('/').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_magic_bytes_win_over_declared_type() {
        let result = detect_mime_type(b"%PDF-1.7\n...", "scan.bin", Some("image/png"));
        assert_eq!(result.mime_type, "application/pdf");
        assert_eq!(result.method, DetectionMethod::MagicBytes);
        assert_eq!(result.declared_mismatch.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_declared_type_used_for_plain_text() {
        let result = detect_mime_type(b"Facture no 1234", "facture", Some("text/plain; charset=utf-8"));
        assert_eq!(result.mime_type, "text/plain");
        assert_eq!(result.method, DetectionMethod::Declared);
    }

    #[test]
    fn test_generic_declared_type_falls_back_to_extension() {
        let result = detect_mime_type(b"a,b,c\n1,2,3", "export.csv", Some("application/octet-stream"));
        assert_eq!(result.mime_type, "text/csv");
        assert_eq!(result.method, DetectionMethod::Extension);
    }

    #[test]
    fn test_unknown_everything_is_octet_stream() {
        let result = detect_mime_type(b"\x01\x02\x03", "mystery", None);
        assert_eq!(result.mime_type, FALLBACK_MIME_TYPE);
        assert_eq!(result.method, DetectionMethod::Fallback);
    }

    #[test]
    fn test_png_detection() {
        let result = detect_mime_type(&PNG_HEADER, "receipt.png", Some("image/png"));
        assert!(result.is_image());
        assert!(result.declared_mismatch.is_none());
    }

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize_mime_type("IMAGE/JPG"), "image/jpeg");
        assert_eq!(normalize_mime_type("application/pdf; name=x"), "application/pdf");
    }

    #[test]
    fn test_validate_upload() {
        let config = Config::for_tests("postgresql://localhost/test", "/tmp/uploads");

        assert!(validate_upload("a.pdf", 1024, "application/pdf", &config).is_ok());
        assert_eq!(
            validate_upload("a.pdf", 0, "application/pdf", &config),
            Err(UploadError::EmptyFile { filename: "a.pdf".to_string() })
        );
        assert_eq!(
            validate_upload("a.pdf", 2 * 1024 * 1024, "application/pdf", &config),
            Err(UploadError::FileTooLarge { size: 2 * 1024 * 1024, limit_mb: 1 })
        );
        assert_eq!(
            validate_upload("a.zip", 10, "application/zip", &config),
            Err(UploadError::UnsupportedMimeType { mime_type: "application/zip".to_string() })
        );
    }
}
