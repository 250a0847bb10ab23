//! Domain events the engine records as it runs.
//!
//! Every mutating call pushes events onto the game's outbox; the owner
//! drains them with `GameEngine::take_events` and decides how to fan
//! them out. Nothing here knows about connections.

use partyroom_protocol::PlayerId;
use serde::Serialize;

use crate::games::clue_team::CardKind;
use crate::games::wire_cut::{WireKind, WirePhase};
use crate::{EndReason, GameResult, Move, Team};

/// Something that happened inside one game.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// The roster was bound by `initialize`.
    Initialized { players: usize },
    Started,
    Paused,
    Resumed,
    PlayerAdded { player_id: PlayerId },
    /// Removed before the start; the seat is gone.
    PlayerRemoved { player_id: PlayerId },
    /// Left a live game; the seat is kept for reconnection.
    PlayerDisconnected { player_id: PlayerId },
    PlayerReconnected { player_id: PlayerId },
    /// A move passed validation and was applied.
    MoveApplied { mv: Move },
    TurnChanged { player_id: PlayerId },
    PlayerEliminated { player_id: PlayerId },
    Ended {
        reason: EndReason,
        result: Option<GameResult>,
    },
    /// A rule-set-specific happening, safe to show to every player.
    Notice(GameNotice),
}

/// Rule-set-specific events. None of these carries private information:
/// a wire or card kind appears only once it has been revealed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum GameNotice {
    // -- dice bidding --
    RoundStarted {
        round: u32,
        first_player: PlayerId,
    },
    BidMade {
        player_id: PlayerId,
        quantity: u32,
        face_value: u8,
        next_player: Option<PlayerId>,
    },
    ChallengeResolved {
        challenger: PlayerId,
        bidder: PlayerId,
        quantity: u32,
        face_value: u8,
        actual_count: u32,
        success: bool,
        loser: PlayerId,
    },
    ExactResolved {
        caller: PlayerId,
        quantity: u32,
        face_value: u8,
        actual_count: u32,
        success: bool,
        losers: Vec<PlayerId>,
    },

    // -- clue team --
    ClueGiven {
        team: Team,
        word: String,
        number: u8,
    },
    CardRevealed {
        position: usize,
        word: String,
        kind: CardKind,
        guesser: PlayerId,
        team: Team,
    },
    TurnPassed {
        team: Team,
    },

    // -- wire cutting --
    RoleAcknowledged {
        player_id: PlayerId,
        waiting_on: usize,
    },
    PhaseChanged {
        phase: WirePhase,
    },
    WireCut {
        player_id: PlayerId,
        wire_index: usize,
        kind: WireKind,
        defuse_count: u32,
        bomb_count: u32,
    },
}
