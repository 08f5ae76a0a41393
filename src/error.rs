use std::error::Error as StdError;

use thiserror::Error;

/// Failures of a round trip against the KMS backend.
///
/// The `Display` text of every variant is what ends up in the chat log or
/// in an upload notice, so keep it readable.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 2xx response carrying an `error` field.
    #[error("Error from server: {0}")]
    Server(String),

    /// 2xx response with neither an answer nor an error.
    #[error("Received an empty response from the server.")]
    EmptyResponse,

    /// Non-2xx response. `message` is the body's `error` field when there is
    /// one, otherwise the canonical status text.
    #[error("Error {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never completed: connection refused, DNS, timeout...
    #[error("Could not reach the server or a network error occurred. ({0})")]
    Network(String),

    /// A 2xx response whose body could not be read as JSON.
    #[error("Could not read the server response. ({0})")]
    Decode(String),
}

impl ClientError {
    /// True for failures where the server never produced a usable answer
    /// (as opposed to answering with an error).
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Decode(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(describe(&err))
        } else {
            ClientError::Network(describe(&err))
        }
    }
}

/// Flatten an error and its sources into one line.
///
/// reqwest keeps the interesting part ("Connection refused") in the source
/// chain, behind a generic "error sending request" message.
pub fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}
