use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtsError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a valid IPA archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid IPA: {0}")]
    InvalidIpa(String),

    #[error("Plist error: {0}")]
    Plist(#[from] plist::Error),

    #[error("Invalid plist: {0}")]
    InvalidPlist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Broad failure class, used to pick the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The archive is missing, unreadable, not a zip, or has no Info.plist.
    Archive,
    /// The Info.plist bytes could not be decoded.
    Parse,
    /// Writing the report failed.
    Output,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Output => 1,
            ErrorKind::Archive => 3,
            ErrorKind::Parse => 4,
        }
    }
}

impl AtsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AtsError::FileNotFound(_)
            | AtsError::Unreadable { .. }
            | AtsError::Zip(_)
            | AtsError::InvalidIpa(_) => ErrorKind::Archive,
            AtsError::Plist(_) | AtsError::InvalidPlist(_) => ErrorKind::Parse,
            AtsError::Io(_) | AtsError::Json(_) => ErrorKind::Output,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

pub type Result<T> = std::result::Result<T, AtsError>;
