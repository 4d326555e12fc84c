//! Crate error types for the driver surface.
//!
//! Scoring itself never errors: short or malformed inputs degrade to
//! neutral values. Errors exist only at the driver boundary: configuration,
//! data loading, and universe validation.

/// Top-level error type for signalloc.
#[derive(Debug, thiserror::Error)]
pub enum SignallocError {
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

    #[error("unknown strategy kind: {name}")]
    UnknownStrategy { name: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SignallocError> for std::process::ExitCode {
    fn from(err: &SignallocError) -> Self {
        let code: u8 = match err {
            SignallocError::Io(_) => 1,
            SignallocError::ConfigParse { .. }
            | SignallocError::ConfigMissing { .. }
            | SignallocError::ConfigInvalid { .. } => 2,
            SignallocError::UnknownStrategy { .. } => 3,
            SignallocError::Data { .. }
            | SignallocError::NoData { .. }
            | SignallocError::InsufficientData { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = SignallocError::ConfigMissing {
            section: "strategy".into(),
            key: "kind".into(),
        };
        assert_eq!(err.to_string(), "missing config key [strategy] kind");

        let err = SignallocError::InsufficientData {
            symbol: "SPY".into(),
            bars: 3,
            minimum: 30,
        };
        assert_eq!(
            err.to_string(),
            "insufficient data for SPY: have 3 bars, need 30"
        );
    }
}
