use thiserror::Error;

/// Errors surfaced by keshi's persistence and validation layers.
///
/// Almost none of these reach the user: persistence failures are logged and
/// swallowed by the controllers. Only validation errors make it to the UI.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("image error: {0}")]
    Image(String),
}

pub type Result<T> = std::result::Result<T, Error>;
