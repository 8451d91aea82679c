//! Domain error types.

/// Top-level error type for wealthlog.
#[derive(Debug, thiserror::Error)]
pub enum WealthlogError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("trade {trade_id} has an unparseable timestamp: {value:?}")]
    InvalidTimestamp { trade_id: String, value: String },

    #[error("invalid trade record: {reason}")]
    InvalidTrade { reason: String },

    #[error("unknown account type: {0:?}")]
    UnknownAccountType(String),

    #[error("account {account_id} not found")]
    AccountNotFound { account_id: String },

    #[error("no balance stored for account {account_id}")]
    MissingSeedBalance { account_id: String },

    #[error("cannot reconstruct balances: {reason}")]
    Reconstruction { reason: String },

    #[error("unauthorized: the API rejected the session token")]
    Unauthorized,

    #[error("fetch error: {reason}")]
    Fetch { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&WealthlogError> for std::process::ExitCode {
    fn from(err: &WealthlogError) -> Self {
        let code: u8 = match err {
            WealthlogError::Io(_) => 1,
            WealthlogError::ConfigParse { .. }
            | WealthlogError::ConfigMissing { .. }
            | WealthlogError::ConfigInvalid { .. } => 2,
            WealthlogError::Database { .. }
            | WealthlogError::DatabaseQuery { .. }
            | WealthlogError::Unauthorized
            | WealthlogError::Fetch { .. } => 3,
            WealthlogError::InvalidTimestamp { .. }
            | WealthlogError::InvalidTrade { .. }
            | WealthlogError::UnknownAccountType(_)
            | WealthlogError::Reconstruction { .. } => 4,
            WealthlogError::AccountNotFound { .. } | WealthlogError::MissingSeedBalance { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
