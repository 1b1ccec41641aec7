use thiserror::Error;

/// Failures at the edges of the program: files, configuration, the
/// logger and the terminal. Typing itself never fails.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corpus `{0}` contains no texts")]
    EmptyCorpus(String),

    #[error("no bundled corpus named `{0}`")]
    UnknownCorpus(String),

    #[error("duration must be between 1 and {max} seconds, got {got}")]
    InvalidDuration { got: u32, max: u32 },

    #[error("unknown log level `{0}`")]
    InvalidLogLevel(String),

    #[error("terminal input closed")]
    InputClosed,

    #[error("logger already installed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, Error>;
