use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the binder wire plumbing
#[derive(Error, Debug)]
pub enum Error {
    /// A read ran past the end of the payload.
    #[error("truncated parcel: needed {needed} more bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    /// A length-prefixed string was not valid UTF-8.
    #[error("invalid UTF-8 in parcel string")]
    InvalidUtf8,

    /// A length prefix exceeded the remaining payload.
    #[error("bad length prefix {len} with {remaining} bytes remaining")]
    BadLength { len: usize, remaining: usize },

    /// The transport has been closed.
    #[error("transport is closed")]
    TransportClosed,

    /// A one-way transmission could not be queued.
    #[error("transmit failed: {0}")]
    TransmitFailed(String),

    /// A synchronous call was answered with a non-zero binder status.
    #[error("remote call failed with status {0}")]
    RemoteStatus(i32),

    /// Service-manager lookup failed.
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    /// Internal channel error (e.g., receiver dropped).
    #[error("internal channel closed")]
    ChannelClosed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed
    }
}
