//! Authoritative turn-based game engine for party games.
//!
//! A [`Game`] couples the shared lifecycle and move pipeline with a
//! [`GameRules`] implementation. Three rule sets ship in [`games`]:
//! dice bidding, team word-clues, and hidden-role wire cutting.
//!
//! The engine is synchronous and single-owner. It records what happened as
//! [`GameEvent`]s; fanning those out to connections is the room layer's job.
//!
//! ```
//! use partyroom_engine::{games, GameEngine, Move, Player};
//! use partyroom_protocol::{ConnectionId, GameKind, RoomCode};
//!
//! let mut game = games::new_game(GameKind::DiceBid, RoomCode::parse("ABCD").unwrap());
//! game.initialize(
//!     vec![
//!         Player::new("ann", "Ann", ConnectionId(1)),
//!         Player::new("bob", "Bob", ConnectionId(2)),
//!     ],
//!     None,
//! )
//! .unwrap();
//! game.start().unwrap();
//!
//! let first = game.current_turn().cloned().unwrap();
//! let bid = Move::new(first, "bid", serde_json::json!({ "quantity": 1, "faceValue": 2 }));
//! assert!(game.process_move(bid).is_ok());
//! ```

mod core;
mod engine;
mod error;
mod event;
mod rules;
mod types;

pub mod games;

pub use crate::core::GameCore;
pub use engine::{Game, GameEngine, GameView};
pub use error::{EngineError, Rejection};
pub use event::{GameEvent, GameNotice};
pub use rules::GameRules;
pub use types::{
    EndReason, GameId, GameResult, GameSettings, GameStatus, Move, Player, PlayerStatus,
    PlayerView, SettingsOverride, Team, Winner,
};
