use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShoraError {
    #[error("Tip ledger error: {0}")]
    Ledger(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShoraError>;
