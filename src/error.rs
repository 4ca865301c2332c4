//! Error types for vcard-bot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Allow-list error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Failed to download file {file_id} on channel {name}: {reason}")]
    DownloadFailed {
        name: String,
        file_id: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while producing an output file.
///
/// Validation failures are kept apart from everything else: the user can fix
/// those and retry the same step, the rest abort the flow.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Could not read email archive: {reason}")]
    Archive { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn archive(reason: impl Into<String>) -> Self {
        Self::Archive {
            reason: reason.into(),
        }
    }

    /// Whether the user can correct the input and try the same step again.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("The {field} must not be empty.")]
    Empty { field: &'static str },

    #[error("The {field} is too long ({length} characters, at most {max} allowed).")]
    TooLong {
        field: &'static str,
        length: usize,
        max: usize,
    },

    #[error("The {field} contains characters that are not allowed: {value:?}")]
    InvalidCharacters { field: &'static str, value: String },

    #[error("Line {line} is not a phone number: {value:?}")]
    InvalidNumber { line: usize, value: String },

    #[error("The uploaded file is not UTF-8 text.")]
    NotText,
}

/// Allow-list persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed allow-list {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
