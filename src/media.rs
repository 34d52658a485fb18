use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use uuid::Uuid;

use crate::forms::UploadedFile;

pub const POST_IMAGE_DIR: &str = "posts";

/// Keeps only characters that are safe in a file name; directories are
/// stripped so uploads cannot escape the media root.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_owned()
    } else {
        cleaned.to_owned()
    }
}

fn with_suffix(file_name: &str) -> String {
    let suffix = &Uuid::new_v4().simple().to_string()[..7];
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", file_name, suffix),
    }
}

/// Writes a post image under `<media_root>/posts/` and returns the path
/// relative to the media root, e.g. `posts/small.gif`. An existing file of
/// the same name gets a random suffix instead of being overwritten.
pub async fn save_post_image(media_root: &Path, upload: &UploadedFile) -> Result<String> {
    let dir: PathBuf = media_root.join(POST_IMAGE_DIR);
    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create media directory {}", dir.display()))?;

    let mut file_name = sanitize_file_name(&upload.file_name);
    while fs::try_exists(dir.join(&file_name)).await.unwrap_or(false) {
        file_name = with_suffix(&sanitize_file_name(&upload.file_name));
    }

    let path = dir.join(&file_name);
    fs::write(&path, &upload.data)
        .await
        .with_context(|| format!("Failed to save image {}", path.display()))?;
    tracing::info!("Saved post image {}", path.display());

    Ok(format!("{}/{}", POST_IMAGE_DIR, file_name))
}
