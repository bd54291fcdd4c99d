//! Domain error types.

/// Top-level error type for niftyshop.
#[derive(Debug, thiserror::Error)]
pub enum NiftyShopError {
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

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error("trade ledger error: {reason}")]
    Ledger { reason: String },

    #[error("broker error for {symbol}: {reason}")]
    Broker { symbol: String, reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&NiftyShopError> for std::process::ExitCode {
    fn from(err: &NiftyShopError) -> Self {
        let code: u8 = match err {
            NiftyShopError::Io(_) => 1,
            NiftyShopError::ConfigParse { .. }
            | NiftyShopError::ConfigMissing { .. }
            | NiftyShopError::ConfigInvalid { .. } => 2,
            NiftyShopError::Data { .. } => 3,
            NiftyShopError::Ledger { .. } => 4,
            NiftyShopError::Broker { .. } => 5,
            NiftyShopError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
