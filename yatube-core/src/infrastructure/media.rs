use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::form::ImageUpload;

const UPLOAD_DIR: &str = "posts";
/// Width of the `posts.image` column.
const IMAGE_PATH_MAX: usize = 100;
const SUFFIX_LEN: usize = 7;

/// Stores post images under `<root>/posts/` and hands back the path relative
/// to the media root, which is what gets persisted on the post.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub async fn save(&self, upload: &ImageUpload) -> Result<String, DomainError> {
        let dir = self.root.join(UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            DomainError::Internal(format!("cannot create media dir {}: {}", dir.display(), e))
        })?;

        let name = sanitize_file_name(&upload.file_name);
        let mut candidate = fit_name(&name, None);
        // create_new claims the name atomically
        let (mut file, candidate) = loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dir.join(&candidate))
                .await
            {
                Ok(file) => break (file, candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let suffix = Uuid::new_v4().simple().to_string();
                    candidate = fit_name(&name, Some(&suffix[..SUFFIX_LEN]));
                }
                Err(e) => {
                    return Err(DomainError::Internal(format!(
                        "cannot store {}: {}",
                        candidate, e
                    )));
                }
            }
        };

        let relative = format!("{UPLOAD_DIR}/{candidate}");
        let mut written = file.write_all(&upload.content).await;
        if written.is_ok() {
            written = file.flush().await;
        }
        if let Err(e) = written {
            drop(file);
            self.remove(&relative).await;
            return Err(DomainError::Internal(format!("cannot store {}: {}", candidate, e)));
        }

        info!(path = %relative, bytes = upload.content.len(), "image stored");
        Ok(relative)
    }

    /// Best-effort removal of a stored file.
    pub async fn remove(&self, relative: &str) {
        if let Err(e) = tokio::fs::remove_file(self.path_of(relative)).await {
            warn!(path = %relative, "failed to remove image: {}", e);
        }
    }
}

fn sanitize_file_name(raw: &str) -> String {
    // keep only the last path component of whatever the client sent
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();
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
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Builds the stored file name, shortening the stem so that
/// `posts/<name>` fits the image column even with a collision suffix.
fn fit_name(name: &str, suffix: Option<&str>) -> String {
    let max = IMAGE_PATH_MAX - UPLOAD_DIR.len() - 1;
    let (stem, ext) = match name.rsplit_once('.') {
        // an absurdly long extension is kept as part of the stem
        Some((stem, ext))
            if !stem.is_empty() && ext.chars().count() + SUFFIX_LEN + 3 < max =>
        {
            (stem, Some(ext))
        }
        _ => (name, None),
    };
    let tail = match (suffix, ext) {
        (Some(suffix), Some(ext)) => format!("_{suffix}.{ext}"),
        (Some(suffix), None) => format!("_{suffix}"),
        (None, Some(ext)) => format!(".{ext}"),
        (None, None) => String::new(),
    };
    let stem: String = stem
        .chars()
        .take(max.saturating_sub(tail.chars().count()))
        .collect();
    format!("{stem}{tail}")
}
