use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Log directory does not exist: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("Log path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Log directory is not readable: {}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid archive format '{0}' (expected tar.gz, zip or individual)")]
    InvalidFormat(String),
    #[error(
        "Failed to create archive directory {} \
         (retry with elevated privileges or pass a different --archive-dir)",
        .path.display()
    )]
    ArchiveDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write archive {}", .artifact.display())]
    Compression {
        artifact: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ArchiveError {
    pub(crate) fn compression(artifact: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Compression {
            artifact: artifact.into(),
            source,
        }
    }
}
