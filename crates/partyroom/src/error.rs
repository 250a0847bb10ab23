//! Unified error type for the Partyroom facade.

use partyroom_engine::EngineError;
use partyroom_protocol::ProtocolError;
use partyroom_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PartyError {
    /// A malformed room code or game kind, or an encode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Lifecycle misuse of an engine driven directly.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An orchestrator error (unknown room, duplicate room, refused
    /// lifecycle call).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use partyroom_protocol::RoomCode;

    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err: PartyError = ProtocolError::InvalidRoomCode("x".into()).into();
        assert!(matches!(err, PartyError::Protocol(_)));
        assert!(err.to_string().contains("\"x\""));
    }

    #[test]
    fn test_from_engine_error() {
        let err: PartyError = EngineError::AlreadyInitialized.into();
        assert!(matches!(err, PartyError::Engine(_)));
    }

    #[test]
    fn test_from_room_error() {
        let code = RoomCode::parse("ABCD").unwrap();
        let err: PartyError = RoomError::NotFound(code).into();
        assert!(matches!(err, PartyError::Room(_)));
        assert_eq!(err.to_string(), "no game for room ABCD");
    }
}
