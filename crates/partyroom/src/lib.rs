//! # Partyroom
//!
//! The authoritative game core behind real-time party-game rooms.
//!
//! A room is named by a four-character code and hosts one live game at a
//! time: dice bidding, team word clues, or hidden-role wire cutting. The
//! engine enforces turn order and hides private information per player;
//! the orchestrator serializes moves per room and fans out per-player
//! projections as [`ServerEvent`](prelude::ServerEvent)s.
//!
//! Transport, authentication, and persistence stay outside: a dispatch
//! layer calls [`PartyServer`] and forwards what arrives on each player's
//! channel.
//!
//! ## Quick Start
//!
//! ```rust
//! use partyroom::prelude::*;
//! use tokio::sync::mpsc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), PartyError> {
//! let server = PartyServer::builder().build();
//!
//! let (ann_tx, mut ann_rx) = mpsc::unbounded_channel();
//! let (bob_tx, _bob_rx) = mpsc::unbounded_channel();
//! let roster = vec![
//!     RosterEntry::new("ann", "Ann", ConnectionId(1), ann_tx),
//!     RosterEntry::new("bob", "Bob", ConnectionId(2), bob_tx),
//! ];
//! server.create_game("ab12", GameKind::DiceBid, roster).await?;
//!
//! let accepted = server
//!     .submit_move("AB12", "ann", "bid", serde_json::json!({ "quantity": 1, "faceValue": 3 }))
//!     .await?;
//! assert!(accepted);
//! assert_eq!(ann_rx.recv().await.unwrap().name(), "game_created");
//! # Ok(())
//! # }
//! ```

mod error;
mod server;

pub use error::PartyError;
pub use server::{PartyServer, PartyServerBuilder};

pub use partyroom_engine as engine;
pub use partyroom_protocol as protocol;
pub use partyroom_room as room;
pub use partyroom_timer as timer;

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG`, defaulting
/// to `info`. Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// The types most callers need.
pub mod prelude {
    pub use crate::{PartyError, PartyServer, PartyServerBuilder, init_tracing};
    pub use partyroom_engine::{EndReason, GameStatus, SettingsOverride};
    pub use partyroom_protocol::{
        Codec, ConnectionId, GameKind, JsonCodec, PlayerId, RoomCode, ServerEvent,
    };
    pub use partyroom_room::{ManagerConfig, PlayerSender, RosterEntry};
}
