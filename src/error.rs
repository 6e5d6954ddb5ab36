// SPDX-License-Identifier: MPL-2.0
use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Config(String),
    Decoder(DecoderError),
    /// The transport owner task is no longer running.
    TransportClosed,
}

/// Failure categories reported by the decoder.
/// Surfaced to listeners through `TransportEvent::LoadFailed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderError {
    /// The media source could not be opened (missing file, bad URL, ...)
    SourceUnavailable(String),

    /// Container or codec is not supported by the decoder
    UnsupportedFormat(String),

    /// Remote source failed to download
    Network(String),

    /// Generic error with raw message
    Other(String),
}

impl DecoderError {
    /// Attempts to categorize a raw decoder message.
    pub fn from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("no such file")
            || msg_lower.contains("not found")
            || msg_lower.contains("permission denied")
        {
            return DecoderError::SourceUnavailable(msg.to_string());
        }

        if msg_lower.contains("unsupported")
            || msg_lower.contains("codec")
            || msg_lower.contains("format")
        {
            return DecoderError::UnsupportedFormat(msg.to_string());
        }

        if msg_lower.contains("network")
            || msg_lower.contains("timed out")
            || msg_lower.contains("connection")
            || msg_lower.contains("http")
        {
            return DecoderError::Network(msg.to_string());
        }

        DecoderError::Other(msg.to_string())
    }
}

impl fmt::Display for DecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderError::SourceUnavailable(msg) => write!(f, "Source unavailable: {}", msg),
            DecoderError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            DecoderError::Network(msg) => write!(f, "Network error: {}", msg),
            DecoderError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Decoder(e) => write!(f, "Decoder Error: {}", e),
            Error::TransportClosed => write!(f, "Transport is not running"),
        }
    }
}

impl std::error::Error for Error {}

impl From<DecoderError> for Error {
    fn from(err: DecoderError) -> Self {
        Error::Decoder(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
