//! Outbound events: what the orchestrator asks the transport to deliver.
//!
//! Every event that carries a `state` carries the projection computed for
//! its recipient, so two players in the same room may receive different
//! `state` payloads for the same event. The projections are opaque JSON
//! at this layer; the engine crate owns their shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{GameKind, PlayerId, RoomCode};

/// An event sent from a room to one or more connected players.
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` yields internally
/// tagged JSON such as `{ "type": "turn_changed", "player_id": "u-1", ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The engine for a room was created and its roster bound.
    GameCreated {
        room: RoomCode,
        kind: GameKind,
        state: Value,
    },

    /// Setup finished; the game is in progress.
    GameStarted { room: RoomCode, state: Value },

    /// A move was accepted. Sent after every accepted move.
    GameStateUpdated {
        room: RoomCode,
        player_id: PlayerId,
        move_type: String,
        state: Value,
    },

    /// The turn passed to another player.
    TurnChanged {
        room: RoomCode,
        player_id: PlayerId,
        state: Value,
    },

    /// A player lost their last die or was otherwise knocked out.
    PlayerEliminated { room: RoomCode, player_id: PlayerId },

    /// A player's connection went away mid-game; their seat is kept.
    PlayerDisconnected {
        room: RoomCode,
        player_id: PlayerId,
        state: Value,
    },

    /// A disconnected player is back.
    PlayerReconnected {
        room: RoomCode,
        player_id: PlayerId,
        state: Value,
    },

    /// A game-specific happening (a bid, a revealed card, a cut wire).
    GameNotice { room: RoomCode, notice: Value },

    GamePaused { room: RoomCode, state: Value },

    GameResumed { room: RoomCode, state: Value },

    /// The game is over. `result` is `null` when it was aborted without
    /// a winner.
    GameEnded {
        room: RoomCode,
        reason: String,
        result: Value,
        state: Value,
    },

    /// The turn holder used up the configured turn time. Nothing is
    /// forced; the dispatcher decides what to do.
    TurnTimedOut { room: RoomCode, player_id: PlayerId },

    /// Sent only to the player whose move was refused.
    MoveRejected {
        room: RoomCode,
        move_type: String,
        reason: String,
    },
}

impl ServerEvent {
    /// The snake_case tag of this event, as it appears in JSON.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GameCreated { .. } => "game_created",
            Self::GameStarted { .. } => "game_started",
            Self::GameStateUpdated { .. } => "game_state_updated",
            Self::TurnChanged { .. } => "turn_changed",
            Self::PlayerEliminated { .. } => "player_eliminated",
            Self::PlayerDisconnected { .. } => "player_disconnected",
            Self::PlayerReconnected { .. } => "player_reconnected",
            Self::GameNotice { .. } => "game_notice",
            Self::GamePaused { .. } => "game_paused",
            Self::GameResumed { .. } => "game_resumed",
            Self::GameEnded { .. } => "game_ended",
            Self::TurnTimedOut { .. } => "turn_timed_out",
            Self::MoveRejected { .. } => "move_rejected",
        }
    }

    /// The room this event belongs to.
    pub fn room(&self) -> &RoomCode {
        match self {
            Self::GameCreated { room, .. }
            | Self::GameStarted { room, .. }
            | Self::GameStateUpdated { room, .. }
            | Self::TurnChanged { room, .. }
            | Self::PlayerEliminated { room, .. }
            | Self::PlayerDisconnected { room, .. }
            | Self::PlayerReconnected { room, .. }
            | Self::GameNotice { room, .. }
            | Self::GamePaused { room, .. }
            | Self::GameResumed { room, .. }
            | Self::GameEnded { room, .. }
            | Self::TurnTimedOut { room, .. }
            | Self::MoveRejected { room, .. } => room,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn room() -> RoomCode {
        RoomCode::parse("ABCD").unwrap()
    }

    #[test]
    fn test_turn_changed_json_shape() {
        let event = ServerEvent::TurnChanged {
            room: room(),
            player_id: PlayerId::from("u-1"),
            state: json!({ "status": "in_progress" }),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "turn_changed");
        assert_eq!(value["room"], "ABCD");
        assert_eq!(value["player_id"], "u-1");
        assert_eq!(value["state"]["status"], "in_progress");
    }

    #[test]
    fn test_name_matches_serde_tag() {
        let events = [
            ServerEvent::GamePaused { room: room(), state: Value::Null },
            ServerEvent::GameEnded {
                room: room(),
                reason: "game_over".into(),
                result: Value::Null,
                state: Value::Null,
            },
            ServerEvent::MoveRejected {
                room: room(),
                move_type: "bid".into(),
                reason: "not your turn".into(),
            },
            ServerEvent::TurnTimedOut {
                room: room(),
                player_id: PlayerId::from("u-2"),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.name());
            assert_eq!(event.room().as_str(), "ABCD");
        }
    }
}
