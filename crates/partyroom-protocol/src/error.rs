//! Error types for the protocol layer.
//!
//! Each crate in Partyroom defines its own error enum. A `ProtocolError`
//! always means a problem with identifiers or serialization, never with
//! game rules or room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// wrong data types, or truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A room code that is not exactly four ASCII letters or digits.
    #[error("invalid room code: {0:?}")]
    InvalidRoomCode(String),

    /// A game kind tag that no engine implements.
    #[error("unknown game kind: {0:?}")]
    UnknownGameKind(String),
}
