use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("I/O error while reading source: {0}")]
    Io(#[from] io::Error),

    #[error("Read of {len} bytes at offset {offset} exceeds source size {size}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search pattern of {len} bytes exceeds comparison block of {max} bytes")]
    NeedleTooLong { len: usize, max: usize },

    #[error("Search pattern must not be empty")]
    EmptyNeedle,
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Invalid extraction range: {length} bytes at offset {start} (source size {size})")]
    InvalidRange { start: u64, length: u64, size: u64 },

    #[error("Can't create extraction dir \"{}\": {cause}", path.display())]
    CreateDirectory {
        path: PathBuf,
        cause: DirectoryCause,
        #[source]
        source: io::Error,
    },

    #[error("No free extraction dir name below \"{}\" after {attempts} attempts", base.display())]
    DirectoryExhausted { base: PathBuf, attempts: usize },

    #[error("Can't create file \"{}\": {source}", path.display())]
    CreateArtifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Write to \"{}\" failed: {source}", path.display())]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    /// True when the output directory itself could not be made available.
    pub fn is_directory_failure(&self) -> bool {
        matches!(
            self,
            Self::CreateDirectory { .. } | Self::DirectoryExhausted { .. }
        )
    }
}

/// Classified reason for an extraction directory that could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryCause {
    PermissionDenied,
    MissingParent,
    NameTooLong,
    NoSpace,
    ReadOnly,
    TooManyLinks,
    Other,
}

impl DirectoryCause {
    pub fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotFound => Self::MissingParent,
            io::ErrorKind::InvalidFilename => Self::NameTooLong,
            io::ErrorKind::StorageFull => Self::NoSpace,
            io::ErrorKind::ReadOnlyFilesystem => Self::ReadOnly,
            io::ErrorKind::TooManyLinks => Self::TooManyLinks,
            _ => Self::Other,
        }
    }
}

impl Display for DirectoryCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(
                f,
                "write permission is denied for the parent directory of the new directory"
            ),
            Self::MissingParent => write!(
                f,
                "a component of the path prefix does not name an existing directory"
            ),
            Self::NameTooLong => write!(f, "path or name too long"),
            Self::NoSpace => write!(
                f,
                "the file system doesn't have enough room to create the new directory"
            ),
            Self::ReadOnly => write!(f, "the parent directory is on a read-only file system"),
            Self::TooManyLinks => write!(f, "the parent directory has too many entries"),
            Self::Other => write!(f, "unexpected I/O failure"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameHeaderError {
    #[error("Frame sync (11 bits) not set")]
    NoSync,

    #[error("Reserved MPEG version")]
    ReservedVersion,

    #[error("Reserved layer")]
    ReservedLayer,

    #[error("Bitrate index {0:#06b} is free-format or invalid")]
    BadBitrateIndex(u8),

    #[error("Reserved sample rate index")]
    ReservedSampleRate,
}
