use thiserror::Error;

/// A type alias for handling `Result`s with `Error`
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the slot wiring and host glue
#[derive(Error, Debug)]
pub enum Error {
    /// Error from the radio-extension layer.
    #[error("radio error: {0}")]
    Radio(#[from] mtkims_radio_ext::Error),

    /// D-Bus error from the NetworkManager watcher.
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    /// No NetworkManager device for the requested interface name.
    #[error("network device not found: {0}")]
    DeviceNotFound(String),

    /// An extension with the same name is already registered.
    #[error("extension already registered: {0}")]
    AlreadyRegistered(String),
}
