//! File storage for admin uploads
//!
//! Files land in a flat directory and are served back by `ServeDir`
//! under [`PUBLIC_PREFIX`].

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_NAME_CHARS: usize = 100;

/// (extension, content type) pairs accepted for upload
const ALLOWED: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("empty file")]
    Empty,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredFile {
    pub url: String,
    pub file_name: String,
    pub size: usize,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check and write one file. The stored name is `<uuid>-<sanitized>`.
    pub async fn store(
        &self,
        original_name: &str,
        declared_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        let content_type = resolve_content_type(original_name, declared_type)?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(original_name));
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&stored_name), bytes).await?;

        tracing::info!(file = %stored_name, size = bytes.len(), content_type, "stored upload");

        Ok(StoredFile {
            url: format!("{PUBLIC_PREFIX}/{stored_name}"),
            file_name: original_name.to_string(),
            size: bytes.len(),
            content_type: content_type.to_string(),
        })
    }
}

/// The extension decides; a declared type, when present, must agree.
fn resolve_content_type(
    name: &str,
    declared: Option<&str>,
) -> Result<&'static str, UploadError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let (_, content_type) = ALLOWED
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .ok_or_else(|| UploadError::UnsupportedType(name.to_string()))?;

    match declared.map(|d| d.split(';').next().unwrap_or(d).trim()) {
        None | Some("") | Some("application/octet-stream") => Ok(content_type),
        Some(d) if d.eq_ignore_ascii_case(content_type) => Ok(content_type),
        Some(d) => Err(UploadError::UnsupportedType(d.to_string())),
    }
}

/// Keep letters (any script), digits, `.`, `-` and `_`; everything else
/// becomes `_`. Path separators never survive.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');

    // keep the tail so the extension survives truncation
    let excess = trimmed.chars().count().saturating_sub(MAX_NAME_CHARS);
    let mut out: String = trimmed.chars().skip(excess).collect();
    if out.is_empty() {
        out.push_str("file");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_paths_and_spaces() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\a\\דוח כספי.pdf"), "דוח_כספי.pdf");
        assert_eq!(sanitize_file_name(".hidden.png"), "hidden.png");
        assert_eq!(sanitize_file_name("///"), "file");
    }

    #[test]
    fn long_names_keep_their_extension() {
        let name = format!("{}.xlsx", "a".repeat(300));
        let out = sanitize_file_name(&name);
        assert_eq!(out.chars().count(), MAX_NAME_CHARS);
        assert!(out.ends_with(".xlsx"));
    }

    #[test]
    fn content_type_rules() {
        assert_eq!(resolve_content_type("a.PDF", None).unwrap(), "application/pdf");
        assert_eq!(
            resolve_content_type("a.jpg", Some("image/jpeg")).unwrap(),
            "image/jpeg"
        );
        assert_eq!(
            resolve_content_type("a.png", Some("application/octet-stream")).unwrap(),
            "image/png"
        );
        assert!(resolve_content_type("a.exe", None).is_err());
        assert!(resolve_content_type("a.png", Some("text/html")).is_err());
        assert!(resolve_content_type("noext", None).is_err());
    }

    #[tokio::test]
    async fn stores_file_under_uuid_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"), 1024);

        let stored = store
            .store("protocol 1.pdf", Some("application/pdf"), b"%PDF-1.4")
            .await
            .unwrap();

        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with("-protocol_1.pdf"));
        assert_eq!(stored.size, 8);
        assert_eq!(stored.file_name, "protocol 1.pdf");

        let on_disk = stored.url.trim_start_matches("/uploads/");
        let content = std::fs::read(dir.path().join("uploads").join(on_disk)).unwrap();
        assert_eq!(content, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn rejects_oversized_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path(), 4);

        assert!(matches!(
            store.store("a.png", None, b"12345").await,
            Err(UploadError::TooLarge { size: 5, limit: 4 })
        ));
        assert!(matches!(
            store.store("a.png", None, b"").await,
            Err(UploadError::Empty)
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
