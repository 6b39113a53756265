use std::path::Path;

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::error::DownloadError;
use super::paths;

/// Write downloaded bytes to `artifact_path` via a `.part` temp file.
///
/// The `.part` file is checked for content before it replaces anything, so
/// an empty download never clobbers an earlier artifact from the same day.
/// After the rename the final file is verified again. Returns its size.
pub async fn write_artifact(artifact_path: &Path, bytes: &[u8]) -> Result<u64, DownloadError> {
    let part_path = paths::part_path(artifact_path);

    let result = async {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&part_path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        verify_artifact(&part_path).await?;
        fs::rename(&part_path, artifact_path).await?;
        Ok::<(), DownloadError>(())
    }
    .await;

    if let Err(e) = result {
        let _ = fs::remove_file(&part_path).await;
        return Err(e);
    }

    verify_artifact(artifact_path).await
}

/// Check that `path` is a regular file with non-zero size and return the size.
pub async fn verify_artifact(path: &Path) -> Result<u64, DownloadError> {
    let display = path.display().to_string();
    match fs::metadata(path).await {
        Ok(meta) if !meta.is_file() => Err(DownloadError::MissingArtifact(display)),
        Ok(meta) if meta.len() == 0 => Err(DownloadError::EmptyArtifact(display)),
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(DownloadError::MissingArtifact(display))
        }
        Err(e) => Err(DownloadError::Disk(e)),
    }
}
