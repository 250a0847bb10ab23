//! The concrete rule sets, and a factory that builds any of them by kind.

pub mod clue_team;
pub mod dice_bid;
pub mod wire_cut;
pub mod words;

use partyroom_protocol::{GameKind, RoomCode};

use crate::{Game, GameEngine};

pub use clue_team::{ClueTeam, ClueTeamConfig};
pub use dice_bid::{DiceBid, DiceBidConfig};
pub use wire_cut::{WireCut, WireCutConfig};

/// Builds a fresh, uninitialized game of `kind` with default configuration.
pub fn new_game(kind: GameKind, room_code: RoomCode) -> Box<dyn GameEngine> {
    match kind {
        GameKind::DiceBid => Box::new(Game::new(room_code, DiceBid::new(DiceBidConfig::default()))),
        GameKind::ClueTeam => {
            Box::new(Game::new(room_code, ClueTeam::new(ClueTeamConfig::default())))
        }
        GameKind::WireCut => Box::new(Game::new(room_code, WireCut::new(WireCutConfig::default()))),
    }
}
