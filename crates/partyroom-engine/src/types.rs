//! Shared vocabulary for every game: statuses, players, moves, settings,
//! and results. No rules live here.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use partyroom_protocol::{ConnectionId, PlayerId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Rejection;

/// Counter for generating unique game ids within this process.
static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// GameId
// ---------------------------------------------------------------------------

/// Process-unique identifier of one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl GameId {
    pub(crate) fn next() -> Self {
        Self(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a game.
///
/// ```text
/// Waiting → Starting → InProgress ⇄ Paused
///                          │          │
///                          └──────────┴──→ Finished
/// ```
///
/// Monotonic except for the `InProgress ⇄ Paused` toggle. `end()` may jump
/// to `Finished` from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    Starting,
    InProgress,
    Paused,
    Finished,
}

impl GameStatus {
    /// `true` while a started game has not finished.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::InProgress | Self::Paused)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Starting => "starting",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Per-participant status. Elimination and disconnection change the
/// status; a player is never removed from a live game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,
    Eliminated,
    Disconnected,
    Spectator,
}

/// A seated participant.
///
/// Game-specific per-player data (dice, team, role, wires) is owned by the
/// rule set and keyed by `user_id`, not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub user_id: PlayerId,
    pub display_name: String,
    pub connection: ConnectionId,
    pub status: PlayerStatus,
    pub score: i64,
}

impl Player {
    pub fn new(
        user_id: impl Into<PlayerId>,
        display_name: impl Into<String>,
        connection: ConnectionId,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            connection,
            status: PlayerStatus::Active,
            score: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }
}

/// The public part of a [`Player`], as it appears in every projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub user_id: PlayerId,
    pub display_name: String,
    pub status: PlayerStatus,
    pub score: i64,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            user_id: p.user_id.clone(),
            display_name: p.display_name.clone(),
            status: p.status,
            score: p.score,
        }
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// A move as submitted by a player. Immutable once created; accepted
/// moves are appended to the game's move log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub player_id: PlayerId,
    pub move_type: String,
    pub payload: Value,
    /// Milliseconds since the Unix epoch at submission.
    pub timestamp: u64,
}

impl Move {
    /// Creates a move stamped with the current time.
    pub fn new(
        player_id: impl Into<PlayerId>,
        move_type: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            move_type: move_type.into(),
            payload,
            timestamp: now_millis(),
        }
    }

    /// Decodes the move into a rule set's typed action.
    ///
    /// `move_type` becomes the `"type"` tag and the payload object supplies
    /// the fields, so actions are plain `#[serde(tag = "type")]` enums. A
    /// `null` payload is treated as an empty object.
    pub(crate) fn decode<A: serde::de::DeserializeOwned>(
        &self,
        known: &[&str],
    ) -> Result<A, Rejection> {
        if !known.contains(&self.move_type.as_str()) {
            return Err(Rejection::UnknownMove(self.move_type.clone()));
        }
        let mut fields = match &self.payload {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                return Err(Rejection::MalformedPayload(
                    "payload must be an object".into(),
                ));
            }
        };
        fields.insert("type".into(), Value::String(self.move_type.clone()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|e| Rejection::MalformedPayload(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Settings common to every game. Game-specific knobs live in each rule
/// set's own config type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    pub min_players: usize,
    pub max_players: usize,
    /// Whole-game time limit in seconds, if any.
    pub time_limit_secs: Option<u32>,
    /// Per-turn time limit in seconds, if any. Enforced by the
    /// orchestrator, never by the engine.
    pub turn_time_limit_secs: Option<u32>,
}

impl GameSettings {
    pub fn new(min_players: usize, max_players: usize) -> Self {
        Self {
            min_players,
            max_players,
            time_limit_secs: None,
            turn_time_limit_secs: None,
        }
    }

    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    pub fn with_turn_time_limit(mut self, secs: u32) -> Self {
        self.turn_time_limit_secs = Some(secs);
        self
    }

    /// The per-turn limit as a `Duration`. A zero limit counts as none.
    pub fn turn_time_limit(&self) -> Option<Duration> {
        self.turn_time_limit_secs
            .filter(|s| *s > 0)
            .map(|s| Duration::from_secs(u64::from(s)))
    }

    /// Returns a copy with every `Some` field of `overrides` applied.
    pub fn merged(&self, overrides: &SettingsOverride) -> Self {
        Self {
            min_players: overrides.min_players.unwrap_or(self.min_players),
            max_players: overrides.max_players.unwrap_or(self.max_players),
            time_limit_secs: overrides.time_limit_secs.or(self.time_limit_secs),
            turn_time_limit_secs: overrides
                .turn_time_limit_secs
                .or(self.turn_time_limit_secs),
        }
    }

    pub fn allows(&self, count: usize) -> bool {
        (self.min_players..=self.max_players).contains(&count)
    }
}

/// Partial settings applied once, at `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsOverride {
    pub min_players: Option<usize>,
    pub max_players: Option<usize>,
    pub time_limit_secs: Option<u32>,
    pub turn_time_limit_secs: Option<u32>,
}

// ---------------------------------------------------------------------------
// Teams, results, end reasons
// ---------------------------------------------------------------------------

/// The two sides in the team games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn other(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Blue => "blue",
        })
    }
}

/// Who won: a single player, or a whole team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Winner {
    Player { player_id: PlayerId },
    Team { team: Team, players: Vec<PlayerId> },
}

impl Winner {
    /// Every player credited with the win.
    pub fn players(&self) -> Vec<PlayerId> {
        match self {
            Self::Player { player_id } => vec![player_id.clone()],
            Self::Team { players, .. } => players.clone(),
        }
    }
}

/// Final outcome of a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Winner,
    /// Final score per player id.
    pub scores: BTreeMap<PlayerId, i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
}

/// Why a game ended.
///
/// Serialized as a bare string (`"game_over"`, `"not_enough_players"`,
/// or whatever the caller supplied).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EndReason {
    /// A rule set's end condition was reached.
    GameOver,
    /// Fewer than two players remained active.
    NotEnoughPlayers,
    /// Ended on request without a more specific reason.
    Normal,
    Other(String),
}

impl EndReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::GameOver => "game_over",
            Self::NotEnoughPlayers => "not_enough_players",
            Self::Normal => "normal",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EndReason {
    fn from(s: &str) -> Self {
        match s {
            "game_over" => Self::GameOver,
            "not_enough_players" => Self::NotEnoughPlayers,
            "normal" | "" => Self::Normal,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for EndReason {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<EndReason> for String {
    fn from(r: EndReason) -> Self {
        r.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, serde::Deserialize, PartialEq)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Probe {
        Poke { strength: u8 },
        Wave,
    }

    const PROBES: &[&str] = &["poke", "wave"];

    #[test]
    fn test_decode_merges_type_and_payload() {
        let mv = Move::new("a", "poke", json!({ "strength": 3 }));
        assert_eq!(mv.decode::<Probe>(PROBES), Ok(Probe::Poke { strength: 3 }));
    }

    #[test]
    fn test_decode_null_payload_for_unit_move() {
        let mv = Move::new("a", "wave", Value::Null);
        assert_eq!(mv.decode::<Probe>(PROBES), Ok(Probe::Wave));
    }

    #[test]
    fn test_decode_unknown_and_malformed() {
        let mv = Move::new("a", "dance", Value::Null);
        assert_eq!(
            mv.decode::<Probe>(PROBES),
            Err(Rejection::UnknownMove("dance".into()))
        );

        let mv = Move::new("a", "poke", json!({ "strength": -1 }));
        assert!(matches!(
            mv.decode::<Probe>(PROBES),
            Err(Rejection::MalformedPayload(_))
        ));

        let mv = Move::new("a", "poke", json!([1, 2]));
        assert!(matches!(
            mv.decode::<Probe>(PROBES),
            Err(Rejection::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_settings_merge_only_overrides_some_fields() {
        let base = GameSettings::new(2, 6).with_turn_time_limit(60);
        let merged = base.merged(&SettingsOverride {
            max_players: Some(4),
            ..SettingsOverride::default()
        });
        assert_eq!(merged.min_players, 2);
        assert_eq!(merged.max_players, 4);
        assert_eq!(merged.turn_time_limit_secs, Some(60));
        assert!(merged.allows(4));
        assert!(!merged.allows(5));
    }

    #[test]
    fn test_zero_turn_limit_means_none() {
        let s = GameSettings::new(2, 2).with_turn_time_limit(0);
        assert_eq!(s.turn_time_limit(), None);
    }

    #[test]
    fn test_end_reason_string_form() {
        assert_eq!(EndReason::from("not_enough_players"), EndReason::NotEnoughPlayers);
        assert_eq!(EndReason::from("host_left").as_str(), "host_left");
        let json = serde_json::to_string(&EndReason::GameOver).unwrap();
        assert_eq!(json, "\"game_over\"");
    }

    #[test]
    fn test_winner_players() {
        let w = Winner::Team {
            team: Team::Blue,
            players: vec!["a".into(), "b".into()],
        };
        assert_eq!(w.players().len(), 2);
        assert_eq!(Team::Blue.other(), Team::Red);
    }
}
