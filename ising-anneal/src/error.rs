use thiserror::Error;

/// Errors surfaced by lattice construction, stepping and persistence.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid construction-time or run-time parameters.
    #[error("configuration error: {0}")]
    Config(String),

    /// A boundary topology or update rule that is declared but has no behavior.
    #[error("'{0}' is not implemented")]
    NotImplemented(&'static str),

    #[error("unsupported persistence format '{0}', expected one of bin.gz, bin, json, msgpack.gz, csv")]
    UnsupportedFormat(String),

    /// A required field was absent from a persisted state.
    #[error("missing field '{0}' in persisted state")]
    MissingField(&'static str),

    /// A persisted or supplied state that cannot be installed.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("run interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<validator::ValidationErrors> for SimError {
    fn from(e: validator::ValidationErrors) -> Self {
        SimError::Config(format!("{e}"))
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
