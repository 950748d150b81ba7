//! Loading documents from a folder.

use crate::types::Document;
use docqa_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions read as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Reads every supported text file under a root folder.
#[derive(Debug, Clone)]
pub struct FolderSource {
    root: PathBuf,
}

impl FolderSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load documents in path order.
    ///
    /// Document ids are paths relative to the root, with `/` separators.
    /// Unsupported and empty files are skipped.
    ///
    /// # Errors
    /// `AppError::Knowledge` if the root is not a readable directory.
    pub fn load(&self) -> AppResult<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(AppError::Knowledge(format!(
                "Document folder not found: {}",
                self.root.display()
            )));
        }

        tracing::info!("Loading documents from {}", self.root.display());

        let mut documents = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                AppError::Knowledge(format!("Failed to walk {}: {}", self.root.display(), e))
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            if !is_supported(path) {
                tracing::debug!("Skipping unsupported file: {}", path.display());
                continue;
            }

            let bytes = fs::read(path)?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            if text.trim().is_empty() {
                tracing::debug!("Skipping empty file: {}", path.display());
                continue;
            }

            let id = relative_id(&self.root, path);
            tracing::debug!("Loaded '{}' ({} bytes)", id, bytes.len());
            documents.push(Document::new(id, path, text));
        }

        tracing::info!("Loaded {} documents", documents.len());
        Ok(documents)
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn relative_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
