//! Core identifier types shared by every Partyroom layer.
//!
//! These are the keys the engine, the orchestrator, and the transport
//! layer agree on. None of them carries game logic.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player, issued by the (external) account
/// service.
///
/// Newtype wrapper so a player id can never be confused with a room code
/// or a display name. `#[serde(transparent)]` keeps the JSON a plain
/// string: `PlayerId("u-42")` serializes as `"u-42"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque handle for a player's live transport connection.
///
/// The engine stores it on the player record and rebinds it on
/// reconnect; only the transport layer knows what it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomCode
// ---------------------------------------------------------------------------

/// The four-character code that identifies a room, and through it the one
/// live game in that room.
///
/// Codes are case-insensitive on input and always stored uppercase, so
/// `"ab12"` and `"AB12"` name the same room.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of characters in every code.
    pub const LEN: usize = 4;

    /// Symbols a generated code is drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Normalizes and validates a code.
    ///
    /// Surrounding whitespace is trimmed, letters are uppercased, and the
    /// result must match `^[A-Z0-9]{4}$`.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        let valid = code.len() == Self::LEN
            && code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if valid {
            Ok(Self(code))
        } else {
            Err(ProtocolError::InvalidRoomCode(raw.to_string()))
        }
    }

    /// Draws a random code. Uniqueness against live rooms is the caller's
    /// concern.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let code = (0..Self::LEN)
            .map(|_| {
                let idx = rng.random_range(0..Self::ALPHABET.len());
                Self::ALPHABET[idx] as char
            })
            .collect();
        Self(code)
    }

    /// Borrows the normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

// ---------------------------------------------------------------------------
// GameKind
// ---------------------------------------------------------------------------

/// Which rule set a room is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Dice bidding and bluff calling with elimination.
    DiceBid,
    /// Two teams guess words from a spymaster's one-word clues.
    ClueTeam,
    /// Hidden roles, private wires, and one bomb.
    WireCut,
}

impl GameKind {
    /// The wire tag, as used in JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DiceBid => "dice_bid",
            Self::ClueTeam => "clue_team",
            Self::WireCut => "wire_cut",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dice_bid" => Ok(Self::DiceBid),
            "clue_team" => Ok(Self::ClueTeam),
            "wire_cut" => Ok(Self::WireCut),
            other => Err(ProtocolError::UnknownGameKind(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive an outbound event.
///
/// The orchestrator pairs every [`ServerEvent`](crate::ServerEvent) it
/// produces with a `Recipient`; the transport layer only has to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connected player in the room.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` is covered by this recipient.
    pub fn includes(&self, player: &PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => p == player,
            Self::AllExcept(p) => p != player,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::from("u-42")).unwrap();
        assert_eq!(json, "\"u-42\"");
        let pid: PlayerId = serde_json::from_str("\"u-42\"").unwrap();
        assert_eq!(pid.as_str(), "u-42");
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "C-7");
    }

    #[test]
    fn test_room_code_is_normalized_to_uppercase() {
        let code = RoomCode::parse(" ab1z ").unwrap();
        assert_eq!(code.as_str(), "AB1Z");
        assert_eq!(code, "AB1Z".parse::<RoomCode>().unwrap());
    }

    #[test]
    fn test_room_code_rejects_bad_input() {
        for raw in ["", "ABC", "ABCDE", "AB-1", "ÀBCD", "AB 1"] {
            assert!(
                RoomCode::parse(raw).is_err(),
                "{raw:?} should not be a valid room code"
            );
        }
    }

    #[test]
    fn test_room_code_serde_validates() {
        let code: RoomCode = serde_json::from_str("\"xy99\"").unwrap();
        assert_eq!(code.as_str(), "XY99");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"XY99\"");

        let bad: Result<RoomCode, _> = serde_json::from_str("\"toolong\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_generated_room_codes_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let code = RoomCode::generate(&mut rng);
            assert_eq!(RoomCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn test_game_kind_round_trips_through_str() {
        for kind in [GameKind::DiceBid, GameKind::ClueTeam, GameKind::WireCut] {
            assert_eq!(kind.as_str().parse::<GameKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("chess".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_recipient_includes() {
        let a = PlayerId::from("a");
        let b = PlayerId::from("b");
        assert!(Recipient::All.includes(&a));
        assert!(Recipient::Player(a.clone()).includes(&a));
        assert!(!Recipient::Player(a.clone()).includes(&b));
        assert!(!Recipient::AllExcept(a.clone()).includes(&a));
        assert!(Recipient::AllExcept(a).includes(&b));
    }
}
