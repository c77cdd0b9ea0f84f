use anyhow::Result;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};

/// On-disk storage for uploaded files.
///
/// Uploads land directly in the public directory, so the static file
/// service serves them at `/{filename}` as soon as they are written.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Write an upload. `filename` must already be sanitized.
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<()> {
        fs::write(self.file_path(filename), data).await?;
        Ok(())
    }

    /// Delete a stored file. A file already gone is not an error.
    pub async fn delete(&self, filename: &str) -> Result<()> {
        let path = self.file_path(filename);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted stale upload {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Stale upload {} already gone", filename);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Flatten an untrusted client filename to a safe single path component.
/// Keeps ASCII alphanumerics plus `.-_`, folds whitespace to underscores,
/// drops everything else, and strips leading dots. May come out empty.
pub fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = last
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                Some(c)
            } else if c.is_whitespace() {
                Some('_')
            } else {
                None
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}
