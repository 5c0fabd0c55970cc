use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{} is not a {suffix} file", .path.display())]
    UnsupportedFileType { path: PathBuf, suffix: String },

    #[error("not a git repository: {0}")]
    NotARepository(String),

    #[error("unable to blame {}: {reason}", .path.display())]
    BlameUnavailable { path: PathBuf, reason: String },

    #[error("{provider} failed on {}: {detail}", .path.display())]
    ProviderFailure {
        provider: String,
        path: PathBuf,
        detail: String,
    },

    #[error("inconsistent data for {}: {detail}", .path.display())]
    Inconsistent { path: PathBuf, detail: String },

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("process error: {0}")]
    Process(String),

    #[error("interrupted")]
    Interrupted,
}

impl Error {
    /// Whether the error only invalidates the file it was raised for.
    ///
    /// File-scoped errors are rendered in that file's block and the run
    /// continues; everything else terminates the process.
    pub fn is_file_scoped(&self) -> bool {
        matches!(
            self,
            Error::BlameUnavailable { .. } | Error::Inconsistent { .. }
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Interrupted => 130,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
