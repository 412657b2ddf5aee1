//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating a wire
/// message.
///
/// `Decode` and `InvalidMessage` are both reported to the client as an
/// `error` event; they differ only in whether the JSON parsed at all.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame was not valid JSON, or did not match any message shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but a field is out of range, e.g. a username
    /// with punctuation or a cell index of 9.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// The text sent back to the client in an `error` event.
    pub fn client_message(&self) -> String {
        match self {
            ProtocolError::InvalidMessage(reason) => reason.clone(),
            #[cfg(feature = "json")]
            ProtocolError::Encode(_) | ProtocolError::Decode(_) => {
                "Invalid message format".to_owned()
            }
        }
    }
}
