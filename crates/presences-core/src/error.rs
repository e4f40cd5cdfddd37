use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("remote API error: {0}")]
    Remote(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("secret storage error: {0}")]
    Secret(String),
}

impl Error {
    pub fn config<T: Into<String>>(message: T) -> Self {
        Error::Config(message.into())
    }

    pub fn remote<T: Into<String>>(message: T) -> Self {
        Error::Remote(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
