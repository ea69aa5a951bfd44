//! Paths of the temporary files exchanged during one fill cycle.
//!
//! # Design
//! - Every path in a set shares the same millisecond timestamp suffix.
//! - The result base has no extension; `.png` and `.txt` are appended to it.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{HostError, HostResult};
use crate::geometry::Offset;

/// Artifact paths for one fill cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    timestamp: i64,
    image: PathBuf,
    mask: PathBuf,
    result_base: PathBuf,
}

impl ArtifactSet {
    /// Artifact set rooted at `root` and keyed by `timestamp` (epoch millis).
    #[must_use]
    pub fn new(root: &Path, timestamp: i64) -> Self {
        Self {
            timestamp,
            image: root.join(format!("image_{timestamp}.png")),
            mask: root.join(format!("mask_{timestamp}.png")),
            result_base: root.join(format!("result_{timestamp}")),
        }
    }

    /// Timestamp shared by every path in the set.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Crop of the padded selection window.
    #[must_use]
    pub fn image_path(&self) -> &Path {
        &self.image
    }

    /// Mask of the selection within the padded window.
    #[must_use]
    pub fn mask_path(&self) -> &Path {
        &self.mask
    }

    /// Extension-less base from which the result paths derive.
    #[must_use]
    pub fn result_base(&self) -> &Path {
        &self.result_base
    }

    /// Inference result image.
    #[must_use]
    pub fn result_png(&self) -> PathBuf {
        with_suffix(&self.result_base, ".png")
    }

    /// Offset record (`"x,y"`) of the padded window.
    #[must_use]
    pub fn result_offset(&self) -> PathBuf {
        with_suffix(&self.result_base, ".txt")
    }

    /// Every path that must be removed once the cycle ends.
    #[must_use]
    pub fn cleanup_paths(&self) -> [PathBuf; 4] {
        [
            self.image.clone(),
            self.mask.clone(),
            self.result_png(),
            self.result_offset(),
        ]
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut raw = OsString::from(base.as_os_str());
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Parse offset record `content` read from `path`.
///
/// # Errors
///
/// Returns [`HostError::InvalidOffset`] unless the content is two
/// comma-separated integers.
pub fn parse_offset_record(path: &Path, content: &str) -> HostResult<Offset> {
    Offset::parse(content).ok_or_else(|| HostError::InvalidOffset {
        path: path.to_path_buf(),
        content: content.to_string(),
    })
}

/// Read and parse the offset record at `path`.
///
/// # Errors
///
/// Returns [`HostError::MissingArtifact`] when the record does not exist and
/// [`HostError::InvalidOffset`] when it is malformed.
pub async fn read_offset_record(path: &Path) -> HostResult<Offset> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| missing_or_io("offset.read", path, source))?;
    parse_offset_record(path, &content)
}

/// Write `offset` as the record at `path`.
///
/// # Errors
///
/// Returns [`HostError::Io`] when the file cannot be written.
pub fn write_offset_record(path: &Path, offset: Offset) -> HostResult<()> {
    std::fs::write(path, offset.to_string()).map_err(|source| HostError::Io {
        operation: "offset.write",
        path: path.to_path_buf(),
        source,
    })
}

/// Remove the file at `path`; a missing file is not an error.
///
/// # Errors
///
/// Returns [`HostError::Io`] for failures other than the file being absent.
pub async fn remove_if_exists(path: &Path) -> HostResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(HostError::Io {
            operation: "artifact.remove",
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn missing_or_io(operation: &'static str, path: &Path, source: io::Error) -> HostError {
    if source.kind() == io::ErrorKind::NotFound {
        HostError::MissingArtifact {
            path: path.to_path_buf(),
        }
    } else {
        HostError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::TempDir;

    #[test]
    fn artifact_names_share_timestamp() {
        let set = ArtifactSet::new(Path::new("/tmp/fill"), 1_700_000_000_123);
        assert_eq!(
            set.image_path(),
            Path::new("/tmp/fill/image_1700000000123.png")
        );
        assert_eq!(set.mask_path(), Path::new("/tmp/fill/mask_1700000000123.png"));
        assert_eq!(
            set.result_png(),
            PathBuf::from("/tmp/fill/result_1700000000123.png")
        );
        assert_eq!(
            set.result_offset(),
            PathBuf::from("/tmp/fill/result_1700000000123.txt")
        );
        assert_eq!(set.cleanup_paths().len(), 4);
    }

    #[tokio::test]
    async fn offset_record_round_trips_through_disk() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("result_1.txt");
        write_offset_record(&path, Offset::new(0, 0))?;
        assert_eq!(std::fs::read_to_string(&path)?, "0,0");
        assert_eq!(read_offset_record(&path).await?, Offset::new(0, 0));
        Ok(())
    }

    #[tokio::test]
    async fn missing_and_malformed_records_are_distinct() -> Result<()> {
        let temp = TempDir::new()?;
        let missing = temp.path().join("absent.txt");
        assert!(matches!(
            read_offset_record(&missing).await,
            Err(HostError::MissingArtifact { .. })
        ));

        let malformed = temp.path().join("bad.txt");
        std::fs::write(&malformed, "left,top")?;
        assert!(matches!(
            read_offset_record(&malformed).await,
            Err(HostError::InvalidOffset { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn removal_is_idempotent() -> Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("mask_1.png");
        std::fs::write(&path, b"png")?;
        remove_if_exists(&path).await?;
        remove_if_exists(&path).await?;
        assert!(!path.exists());
        Ok(())
    }
}
