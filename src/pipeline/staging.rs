//! Scoped on-disk staging for uploaded audio
//!
//! Uploads are written to a uniquely named file so the provider can stream
//! them and infer the container from the extension. The file belongs to the
//! request that staged it and is removed when the guard drops, whichever
//! way the request ends.

use std::path::Path;

use tempfile::TempPath;

use crate::Result;

/// Extension used when the upload name gives no usable one
pub const FALLBACK_EXTENSION: &str = "webm";

/// A staged upload, deleted on drop
#[derive(Debug)]
pub struct StagedAudio {
    path: TempPath,
}

impl StagedAudio {
    /// Write `data` to a fresh file in `dir`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created or written
    pub async fn write(dir: &Path, file_name: Option<&str>, data: &[u8]) -> Result<Self> {
        let suffix = format!(".{}", upload_extension(file_name));
        let path = tempfile::Builder::new()
            .prefix("parley-upload-")
            .suffix(&suffix)
            .tempfile_in(dir)?
            .into_temp_path();

        // On failure `path` drops here and takes the empty file with it
        tokio::fs::write(&path, data).await?;

        tracing::debug!(path = %path.display(), bytes = data.len(), "staged upload");
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting any error
    ///
    /// # Errors
    ///
    /// Returns error if the file could not be removed
    pub fn remove(self) -> Result<()> {
        self.path.close()?;
        Ok(())
    }
}

/// Pick a safe extension from the client-supplied file name
fn upload_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| FALLBACK_EXTENSION.to_string(), str::to_ascii_lowercase)
}
