//! Error types for the orchestrator layer.

use partyroom_engine::{EngineError, Rejection};
use partyroom_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live game for this room code.
    #[error("no game for room {0}")]
    NotFound(RoomCode),

    /// A game (possibly a finished one still in its grace period) already
    /// occupies this room code.
    #[error("a game already exists for room {0}")]
    AlreadyExists(RoomCode),

    /// The player is not seated in this room's game.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// The room's command channel is closed; the actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),

    /// Lifecycle misuse reported by the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The move was refused. The submitter has already been sent a
    /// `move_rejected` event.
    #[error("move rejected: {0}")]
    Rejected(#[from] Rejection),
}
