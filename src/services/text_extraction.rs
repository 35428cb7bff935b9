use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No readable text found in {mime_type} document")]
    NoText { mime_type: String },

    #[error("Text extraction is not supported for {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("{tool} failed: {details}")]
    ToolFailed { tool: String, details: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Pulls raw text out of stored uploads.
///
/// Plain text formats are decoded directly. PDFs go through `pdftotext` and
/// images through `tesseract`, both run as child processes.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    pdftotext_bin: String,
    tesseract_bin: String,
    ocr_languages: String,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor {
    pub fn new() -> Self {
        Self::with_tools("pdftotext", "tesseract")
    }

    pub fn with_tools(pdftotext_bin: &str, tesseract_bin: &str) -> Self {
        Self {
            pdftotext_bin: pdftotext_bin.to_string(),
            tesseract_bin: tesseract_bin.to_string(),
            ocr_languages: "eng+fra".to_string(),
        }
    }

    pub async fn extract(&self, file_path: &str, mime_type: &str) -> Result<String, ExtractionError> {
        debug!("Extracting text from {} ({})", file_path, mime_type);

        if is_plain_text(mime_type) {
            let bytes = tokio::fs::read(file_path).await?;
            return Ok(String::from_utf8_lossy(&bytes).trim().to_string());
        }

        let text = if mime_type == "application/pdf" {
            self.extract_pdf(file_path).await?
        } else if mime_type.starts_with("image/") {
            self.extract_image(file_path).await?
        } else {
            return Err(ExtractionError::UnsupportedType { mime_type: mime_type.to_string() });
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ExtractionError::NoText { mime_type: mime_type.to_string() });
        }
        Ok(text)
    }

    async fn extract_pdf(&self, file_path: &str) -> Result<String, ExtractionError> {
        let output = Command::new(&self.pdftotext_bin)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(file_path)
            .arg("-")
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                let text = String::from_utf8_lossy(&out.stdout).to_string();
                if !text.trim().is_empty() {
                    return Ok(text);
                }
                debug!("pdftotext produced no text for {}, scraping content streams", file_path);
            }
            Ok(out) => {
                warn!(
                    "pdftotext exited with {} for {}: {}",
                    out.status,
                    file_path,
                    String::from_utf8_lossy(&out.stderr).trim()
                );
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} is not installed, falling back to byte scraping", self.pdftotext_bin);
            }
            Err(e) => return Err(e.into()),
        }

        let bytes = tokio::fs::read(file_path).await?;
        Ok(scrape_printable_text(&bytes))
    }

    async fn extract_image(&self, file_path: &str) -> Result<String, ExtractionError> {
        if !Path::new(file_path).exists() {
            return Err(std::io::Error::new(ErrorKind::NotFound, file_path.to_string()).into());
        }

        let output = Command::new(&self.tesseract_bin)
            .arg(file_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.ocr_languages)
            .output()
            .await
            .map_err(|e| ExtractionError::ToolFailed {
                tool: self.tesseract_bin.clone(),
                details: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ExtractionError::ToolFailed {
                tool: self.tesseract_bin.clone(),
                details: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn is_plain_text(mime_type: &str) -> bool {
    mime_type.starts_with("text/") || mime_type == "application/json"
}

/// Keep runs of printable characters longer than three bytes. Good enough for
/// uncompressed PDFs when no proper extractor is installed.
pub(crate) fn scrape_printable_text(bytes: &[u8]) -> String {
    let mut words = Vec::new();
    let mut current = String::new();

    for &byte in bytes {
        if (32..=126).contains(&byte) {
            current.push(byte as char);
        } else {
            if current.len() > 3 {
                words.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() > 3 {
        words.push(current);
    }

    words
        .iter()
        .flat_map(|w| w.split_whitespace())
        .filter(|word| word.len() > 1)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn missing_tools() -> TextExtractor {
        TextExtractor::with_tools("dossier-missing-pdftotext", "dossier-missing-tesseract")
    }

    async fn write(dir: &TempDir, name: &str, data: &[u8]) -> String {
        let path = dir.path().join(name);
        tokio::fs::write(&path, data).await.unwrap();
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_plain_text_is_decoded_lossily() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "note.txt", b"  Re\xC3\xA7u no 42 \xFF  \n").await;

        let text = TextExtractor::new().extract(&path, "text/plain").await.unwrap();

        assert!(text.starts_with("Reçu no 42"));
    }

    #[tokio::test]
    async fn test_pdf_falls_back_to_scraping_without_pdftotext() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "inv.pdf", b"%PDF-1.4\n\x00\x01(Invoice Total 120.00)\x00").await;

        let text = missing_tools().extract(&path, "application/pdf").await.unwrap();

        assert!(text.contains("Invoice"));
        assert!(text.contains("120.00"));
    }

    #[tokio::test]
    async fn test_pdf_without_text_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.pdf", &[0u8, 1, 2, 0xFF, b'a', 0]).await;

        let err = missing_tools().extract(&path, "application/pdf").await.unwrap_err();

        assert!(matches!(err, ExtractionError::NoText { .. }));
    }

    #[tokio::test]
    async fn test_image_without_tesseract_is_a_tool_failure() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "scan.png", &[0x89, 0x50, 0x4E, 0x47]).await;

        let err = missing_tools().extract(&path, "image/png").await.unwrap_err();

        assert!(matches!(err, ExtractionError::ToolFailed { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_type() {
        let err = TextExtractor::new()
            .extract("/nonexistent", "application/zip")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType { .. }));
    }

    #[test]
    fn test_scrape_printable_text() {
        assert_eq!(scrape_printable_text(b"\x00abc\x00Total: 12.50\x01x"), "Total: 12.50");
    }
}
