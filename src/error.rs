use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogShieldError>;

#[derive(Error, Debug)]
pub enum LogShieldError {
    #[error("Scanning service unreachable at {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Scanning service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed scan response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error ({format}): {message}")]
    Export { format: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LogShieldError {
    pub fn exit_code(&self) -> i32 {
        2
    }

    /// True for failures that happen at the scanning-service boundary.
    pub fn is_submission_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::MalformedResponse(_)
        )
    }
}
