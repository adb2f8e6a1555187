use crate::constants::{content_type_for_extension, FALLBACK_CONTENT_TYPE, IMAGE_CONTENT_TYPE_PREFIX};
use crate::error::{CompressionError, Result};
use bytes::Bytes;
use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file as handed to the orchestrator: name, declared content type, bytes.
///
/// The content type is whatever the source declared; it is not sniffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    name: String,
    content_type: String,
    data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Reads a file from disk, declaring a content type from its extension
    /// the way a browser file picker would.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CompressionError::FileNotFound(path.to_path_buf()));
        }

        let data = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, declared_content_type(path), data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// True when the declared content type starts with `image/`, compared
    /// case-sensitively.
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with(IMAGE_CONTENT_TYPE_PREFIX)
    }
}

/// Content type a file picker would declare for `path`, from its extension.
pub fn declared_content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(content_type_for_extension)
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

/// Reads the collected paths whose declared type is an image.
///
/// Other entries are skipped before any I/O, so an unreadable non-image never
/// fails the batch. A read error on an image entry is returned.
pub fn read_upload_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        let content_type = declared_content_type(path);
        if !content_type.starts_with(IMAGE_CONTENT_TYPE_PREFIX) {
            tracing::debug!(path = %path.display(), content_type, "Skipping non-image input");
            continue;
        }
        files.push(UploadFile::from_path(path)?);
    }

    Ok(files)
}

/// Expands CLI inputs (files, directories or glob patterns) into a list of
/// files, keeping the order the inputs were given in.
///
/// Nothing is filtered by type here; the orchestrator drops non-images.
/// Hidden entries are skipped when walking directories.
pub fn collect_upload_files(inputs: &[String], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let input_path = Path::new(input);

        if input_path.is_file() {
            files.push(input_path.to_path_buf());
        } else if input_path.is_dir() {
            let walker = if recursive {
                WalkDir::new(input_path)
            } else {
                WalkDir::new(input_path).max_depth(1)
            };

            for entry in walker
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            {
                let entry = entry?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else if let Ok(pattern) = glob(input) {
            for entry in pattern.flatten() {
                if entry.is_file() {
                    files.push(entry);
                }
            }
        } else {
            return Err(CompressionError::NoFilesFound(input.clone()));
        }
    }

    Ok(files)
}
