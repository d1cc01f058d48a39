use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the radio-extension layer
#[derive(Error, Debug)]
pub enum Error {
    /// Error originating from the binder wire plumbing.
    #[error("binder error: {0}")]
    Binder(#[from] mtkims_binder::Error),

    /// The remote service could not be resolved.
    #[error("radio service unavailable: {0}")]
    Unavailable(String),

    /// The callback-endpoint registration handshake failed.
    #[error("endpoint registration failed: {0}")]
    Handshake(String),

    /// Other miscellaneous errors.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
