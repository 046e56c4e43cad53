//! Domain error types.
//!
//! Only parameter validation and I/O surface as errors. Unstable reads,
//! zero denominators and out-of-order bars are resolved inside the
//! algorithms and never reach the caller.

/// Top-level error type for barstream.
#[derive(Debug, thiserror::Error)]
pub enum BarstreamError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unknown indicator: {spec}")]
    UnknownIndicator { spec: String },

    #[error("malformed indicator {spec}: {reason}")]
    IndicatorSyntax { spec: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("{source_name} line {line}: {reason}")]
    DataParse {
        source_name: String,
        line: u64,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BarstreamError {
    /// Shorthand for [`BarstreamError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        BarstreamError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Rejects zero-length windows at construction time.
pub fn require_window(name: &str, length: usize) -> Result<usize, BarstreamError> {
    if length == 0 {
        return Err(BarstreamError::invalid_parameter(
            name,
            "window length must be positive",
        ));
    }
    Ok(length)
}

impl From<&BarstreamError> for std::process::ExitCode {
    fn from(err: &BarstreamError) -> Self {
        let code: u8 = match err {
            BarstreamError::Io(_) => 1,
            BarstreamError::ConfigParse { .. }
            | BarstreamError::ConfigMissing { .. }
            | BarstreamError::ConfigInvalid { .. } => 2,
            BarstreamError::InvalidParameter { .. }
            | BarstreamError::UnknownIndicator { .. }
            | BarstreamError::IndicatorSyntax { .. } => 4,
            BarstreamError::DataParse { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
