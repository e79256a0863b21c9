/// Shared error type for the scenario matching engine and its coordination plane.
///
/// Variants map onto the error taxonomy: `InvalidInput` and `NotFound` are
/// caller-facing (HTTP 400/404), `PersistenceFailure` surfaces as 500/504,
/// and `PolicyViolation` / `HostCallFailure` never leave the dispatcher —
/// they are logged and the remaining actions in a scenario still run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("policy violation: {0}")]
    PolicyViolation(String),

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("host call failed: {0}")]
    HostCallFailure(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
