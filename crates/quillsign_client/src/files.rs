//! File typing for uploads and downloads.

use core::fmt;
use std::path::Path;

use reqwest::multipart::Part;
use serde::Serialize;

use crate::error::ClientError;

// ─────────────────────────────────────────────────────────────────────────────
// FileType
// ─────────────────────────────────────────────────────────────────────────────

/// Document types accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Portable Document Format.
    Pdf,
    /// Legacy Word document.
    Doc,
    /// Word document.
    Docx,
    /// Legacy Excel workbook.
    Xls,
    /// Excel workbook.
    Xlsx,
    /// Legacy PowerPoint deck.
    Ppt,
    /// PowerPoint deck.
    Pptx,
    /// Plain text.
    Txt,
    /// HTML page.
    Html,
    /// PNG image.
    Png,
    /// JPEG image.
    Jpg,
    /// GIF image.
    Gif,
    /// Zip archive.
    Zip,
}

impl FileType {
    /// Every supported type.
    pub const ALL: [Self; 13] = [
        Self::Pdf,
        Self::Doc,
        Self::Docx,
        Self::Xls,
        Self::Xlsx,
        Self::Ppt,
        Self::Pptx,
        Self::Txt,
        Self::Html,
        Self::Png,
        Self::Jpg,
        Self::Gif,
        Self::Zip,
    ];

    /// Resolves a file extension, ignoring case and a leading dot.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        match extension.as_str() {
            "jpeg" => Some(Self::Jpg),
            "htm" => Some(Self::Html),
            other => Self::ALL
                .into_iter()
                .find(|file_type| file_type.extension() == other),
        }
    }

    /// Resolves the type of a file from its path.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }

    /// Resolves a MIME type, ignoring parameters such as `charset`.
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|file_type| file_type.mime_type().eq_ignore_ascii_case(essence))
    }

    /// Returns the canonical extension, without a dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
            Self::Ppt => "ppt",
            Self::Pptx => "pptx",
            Self::Txt => "txt",
            Self::Html => "html",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Gif => "gif",
            Self::Zip => "zip",
        }
    }

    /// Returns the MIME type sent with uploads.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Doc => "application/msword",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Xls => "application/vnd.ms-excel",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Ppt => "application/vnd.ms-powerpoint",
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Self::Txt => "text/plain",
            Self::Html => "text/html",
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Zip => "application/zip",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FileUpload
// ─────────────────────────────────────────────────────────────────────────────

/// A document attached to a request.
///
/// Serializes to its metadata only; the contents never reach hook payloads.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct FileUpload {
    name: String,
    file_type: FileType,
    size: usize,
    #[serde(skip)]
    contents: Vec<u8>,
}

impl FileUpload {
    /// Creates an upload, inferring the type from `name`.
    pub fn new(name: impl Into<String>, contents: Vec<u8>) -> Result<Self, ClientError> {
        let name = name.into();
        let file_type = FileType::from_path(&name).ok_or_else(|| {
            ClientError::InvalidRequest(format!("unsupported file type: '{name}'"))
        })?;
        Ok(Self::with_type(name, file_type, contents))
    }

    /// Creates an upload with an explicit type.
    pub fn with_type(name: impl Into<String>, file_type: FileType, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            file_type,
            size: contents.len(),
            contents,
        }
    }

    /// Reads an upload from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ClientError::InvalidRequest(format!("not a file path: {}", path.display()))
            })?;
        let contents = std::fs::read(path).map_err(|err| {
            ClientError::InvalidRequest(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::new(name, contents)
    }

    /// Returns the file name sent with the upload.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the document type.
    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Returns the file contents.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub(crate) fn to_part(&self) -> Result<Part, ClientError> {
        Ok(Part::bytes(self.contents.clone())
            .file_name(self.name.clone())
            .mime_str(self.file_type.mime_type())?)
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("name", &self.name)
            .field("file_type", &self.file_type)
            .field("size", &self.size)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FileFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Format of downloaded signature request files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// One merged PDF.
    #[default]
    Pdf,
    /// A zip archive with one PDF per document.
    Zip,
}

impl FileFormat {
    /// Returns the value of the `file_type` query parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Zip => "zip",
        }
    }
}
