use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Plugin error: {0}")]
    Plugin(String),
}

pub type Result<T> = std::result::Result<T, Error>;
