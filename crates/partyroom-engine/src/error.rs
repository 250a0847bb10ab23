//! Error types for the engine layer.
//!
//! Two families, handled very differently by callers:
//!
//! - [`EngineError`]: lifecycle misuse (starting twice, pausing a game
//!   that isn't running). These are bugs in the calling layer.
//! - [`Rejection`]: a player's move was refused. Expected during normal
//!   play; nothing in the game changed.

use partyroom_protocol::PlayerId;

use crate::GameStatus;

/// Hard errors from misusing the engine's lifecycle or roster API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// `initialize` was called on a game that already has a roster.
    #[error("game is already initialized")]
    AlreadyInitialized,

    /// `start` was called before `initialize`.
    #[error("game has not been initialized")]
    NotInitialized,

    /// The roster size is outside the game's bounds.
    #[error("{count} players is outside the allowed range {min}..={max}")]
    InvalidPlayerCount { count: usize, min: usize, max: usize },

    /// A lifecycle method was called from the wrong status.
    #[error("cannot {action} a game that is {from}")]
    InvalidTransition { from: GameStatus, action: &'static str },

    /// Players can only join before the game starts.
    #[error("roster is locked while the game is {0}")]
    RosterLocked(GameStatus),

    /// The roster is already at `max_players`.
    #[error("roster is full ({max} players)")]
    RosterFull { max: usize },

    /// A player with this id is already seated.
    #[error("player {0} is already in the game")]
    DuplicatePlayer(PlayerId),

    /// The rule set needs more active players than are available to set up.
    #[error("need at least {needed} active players, have {active}")]
    NotEnoughPlayers { needed: usize, active: usize },

    /// The rule set's own configuration cannot produce a playable game.
    #[error("invalid game configuration: {0}")]
    InvalidConfig(String),
}

/// Why a submitted move was refused.
///
/// A rejection never changes game state. The orchestrator forwards the
/// `Display` text to the submitting player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("game is not in progress")]
    NotInProgress,

    #[error("player {0} is not in this game")]
    UnknownPlayer(PlayerId),

    #[error("player {0} is not active")]
    PlayerInactive(PlayerId),

    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("unknown move type {0:?}")]
    UnknownMove(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The move is well-formed and in turn, but breaks a game rule.
    #[error("{0}")]
    Illegal(&'static str),
}
