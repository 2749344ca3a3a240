//! Local file validation
//!
//! Every candidate file is checked against [`ValidationRules`] before any
//! network call is made. Rejection has no side effects.

use crate::progress::format_bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncReadExt;

/// Extensions accepted by the ingestion backend
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".txt", ".json", ".csv", ".html", ".zip"];

/// Largest accepted upload (100 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Reasons a file is rejected before upload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{name}' has no file extension. Supported formats: {allowed}")]
    MissingExtension { name: String, allowed: String },

    #[error("Unsupported file format '{extension}' for '{name}'. Supported formats: {allowed}")]
    UnsupportedExtension {
        name: String,
        extension: String,
        allowed: String,
    },

    #[error(
        "'{name}' is too large ({}). Files must not exceed {}",
        format_bytes(*.size_bytes),
        format_bytes(*.max_bytes)
    )]
    TooLarge {
        name: String,
        size_bytes: u64,
        max_bytes: u64,
    },
}

/// Where the bytes of a candidate file come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// A file offered for ingestion, not yet validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    name: String,
    size_bytes: u64,
    content: FileContent,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, size_bytes: u64, content: FileContent) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            content,
        }
    }

    /// Candidate backed by an in-memory buffer; size is the buffer length
    pub fn in_memory(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self::new(name, size_bytes, FileContent::Memory(bytes))
    }

    /// Candidate for a file on disk, named after its final path component
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self::new(name, metadata.len(), FileContent::Path(path.to_path_buf())))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn content(&self) -> &FileContent {
        &self.content
    }
}

/// A candidate that passed every [`ValidationRules`] check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    file: CandidateFile,
    extension: String,
}

impl ValidatedFile {
    pub fn name(&self) -> &str {
        self.file.name()
    }

    pub fn size_bytes(&self) -> u64 {
        self.file.size_bytes()
    }

    /// Lower-cased extension including the leading dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn content(&self) -> &FileContent {
        self.file.content()
    }

    /// Load the file body for transmission.
    ///
    /// Reads at most one byte past the validated size, and fails if the body
    /// no longer has exactly that size, so a file that grew after validation
    /// is never sent past the cap.
    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        let expected = self.size_bytes();
        let bytes = match self.file.content() {
            FileContent::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                let mut bytes = Vec::with_capacity(usize::try_from(expected).unwrap_or(0));
                file.take(expected.saturating_add(1))
                    .read_to_end(&mut bytes)
                    .await?;
                bytes
            },
            FileContent::Memory(bytes) => bytes.clone(),
        };

        if bytes.len() as u64 != expected {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "'{}' changed after validation (expected {} bytes)",
                    self.name(),
                    expected
                ),
            ));
        }

        Ok(bytes)
    }
}

/// Extension allow-set and size cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    allowed_extensions: Vec<String>,
    max_size_bytes: u64,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_EXTENSIONS.iter().copied(), DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl ValidationRules {
    /// Extensions are normalized to lower case with a leading dot
    pub fn new<I, S>(allowed_extensions: I, max_size_bytes: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref().trim().to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                }
            })
            .collect();

        Self {
            allowed_extensions,
            max_size_bytes,
        }
    }

    pub fn with_max_size_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Check extension first, then size
    pub fn validate(&self, candidate: CandidateFile) -> Result<ValidatedFile, ValidationError> {
        let Some(extension) = extension_of(candidate.name()) else {
            return Err(ValidationError::MissingExtension {
                name: candidate.name().to_string(),
                allowed: self.allowed_list(),
            });
        };

        if !self.allowed_extensions.iter().any(|allowed| *allowed == extension) {
            return Err(ValidationError::UnsupportedExtension {
                name: candidate.name().to_string(),
                extension,
                allowed: self.allowed_list(),
            });
        }

        if candidate.size_bytes() > self.max_size_bytes {
            return Err(ValidationError::TooLarge {
                name: candidate.name().to_string(),
                size_bytes: candidate.size_bytes(),
                max_bytes: self.max_size_bytes,
            });
        }

        Ok(ValidatedFile {
            file: candidate,
            extension,
        })
    }

    fn allowed_list(&self) -> String {
        self.allowed_extensions.join(", ")
    }
}

/// Final dot-segment of `name`, lower-cased, with its dot
fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn candidate(name: &str, size: u64) -> CandidateFile {
        CandidateFile::new(name, size, FileContent::Memory(Vec::new()))
    }

    #[test]
    fn test_accepts_every_default_extension() {
        let rules = ValidationRules::default();
        for name in ["a.txt", "b.json", "c.csv", "d.html", "e.zip"] {
            let file = rules.validate(candidate(name, 1)).unwrap();
            assert_eq!(file.name(), name);
        }
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let file = ValidationRules::default()
            .validate(candidate("WeChat Export.ZIP", 10))
            .unwrap();
        assert_eq!(file.extension(), ".zip");
    }

    #[test]
    fn test_only_final_dot_segment_counts() {
        let rules = ValidationRules::default();
        assert!(rules.validate(candidate("chat.txt.exe", 1)).is_err());
        assert!(rules.validate(candidate("backup.2024.json", 1)).is_ok());
    }

    #[test]
    fn test_rejects_unsupported_extension() {
        let err = ValidationRules::default()
            .validate(candidate("messages.db", 1))
            .unwrap_err();
        match &err {
            ValidationError::UnsupportedExtension { extension, .. } => assert_eq!(extension, ".db"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains(".txt, .json, .csv, .html, .zip"));
    }

    #[test]
    fn test_rejects_name_without_extension() {
        let err = ValidationRules::default()
            .validate(candidate("README", 1))
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingExtension { .. }));
    }

    #[test]
    fn test_trailing_dot_is_not_an_allowed_extension() {
        let err = ValidationRules::default()
            .validate(candidate("notes.", 1))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedExtension { .. }));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let rules = ValidationRules::default();
        assert!(rules.validate(candidate("a.zip", 100 * MIB)).is_ok());

        let err = rules.validate(candidate("a.zip", 100 * MIB + 1)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { .. }));
        assert!(err.to_string().contains("100.00 MB"));
    }

    #[test]
    fn test_extension_checked_before_size() {
        let err = ValidationRules::default()
            .validate(candidate("huge.exe", 500 * MIB))
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedExtension { .. }));
    }

    #[test]
    fn test_custom_rules_normalize_extensions() {
        let rules = ValidationRules::new(["DB", ".Txt"], 10);
        assert_eq!(rules.allowed_extensions(), &[".db".to_string(), ".txt".to_string()]);
        assert!(rules.validate(candidate("x.db", 10)).is_ok());
        assert!(rules.validate(candidate("x.db", 11)).is_err());
    }

    #[test]
    fn test_candidate_from_path_reads_name_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        std::fs::write(&path, b"a,b\n1,2\n").unwrap();

        let candidate = CandidateFile::from_path(&path).unwrap();
        assert_eq!(candidate.name(), "history.csv");
        assert_eq!(candidate.size_bytes(), 8);
        assert_eq!(candidate.content(), &FileContent::Path(path));
    }

    #[test]
    fn test_candidate_from_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CandidateFile::from_path(dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_read_bytes_from_memory_and_disk() {
        let rules = ValidationRules::default();
        let in_memory = rules
            .validate(CandidateFile::in_memory("a.txt", b"hello".to_vec()))
            .unwrap();
        assert_eq!(in_memory.read_bytes().await.unwrap(), b"hello");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b.json");
        std::fs::write(&path, b"{}").unwrap();
        let on_disk = rules.validate(CandidateFile::from_path(&path).unwrap()).unwrap();
        assert_eq!(on_disk.read_bytes().await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_read_bytes_returns_validated_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        std::fs::write(&path, b"alice: hi\n").unwrap();

        let file = ValidationRules::default()
            .validate(CandidateFile::from_path(&path).unwrap())
            .unwrap();
        assert_eq!(file.read_bytes().await.unwrap(), b"alice: hi\n");
    }

    #[tokio::test]
    async fn test_read_bytes_rejects_file_grown_past_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let rules = ValidationRules::new([".txt"], 16);
        let file = rules.validate(CandidateFile::from_path(&path).unwrap()).unwrap();
        assert_eq!(file.size_bytes(), 10);

        let mut grown = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        std::io::Write::write_all(&mut grown, &[b'x'; 1000]).unwrap();
        drop(grown);

        let err = file.read_bytes().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("changed after validation"));
    }

    #[tokio::test]
    async fn test_read_bytes_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        std::fs::write(&path, b"0123456789").unwrap();

        let file = ValidationRules::default()
            .validate(CandidateFile::from_path(&path).unwrap())
            .unwrap();
        std::fs::write(&path, b"0123").unwrap();

        assert!(file.read_bytes().await.is_err());
    }
}
