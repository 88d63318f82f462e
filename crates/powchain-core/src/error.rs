use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid peer address: {0:?}")]
    InvalidAddress(String),

    #[error("missing values: {0}")]
    Validation(String),

    /// The tip moved (chain replaced) while the proof was being searched.
    #[error("chain tip changed while mining, retry")]
    StaleTip,

    #[error("proof search aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
