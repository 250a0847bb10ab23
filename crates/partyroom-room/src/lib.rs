//! The game orchestrator for Partyroom.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! game engine. All mutation goes through the actor's command channel, so
//! moves for a room are serialized without locks.
//!
//! # Key types
//!
//! - [`GameManager`]: maps room codes to live games; creates, routes to,
//!   and tears down rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RosterEntry`]: a connected member handed over at game creation
//! - [`ManagerConfig`]: cleanup delay, channel size, turn timers
//!
//! Outbound traffic is a stream of [`ServerEvent`](partyroom_protocol::ServerEvent)s
//! per player, delivered on the [`PlayerSender`] supplied for them. Events
//! that carry a `state` carry that recipient's own projection.

mod config;
mod error;
mod manager;
mod room;

pub use config::ManagerConfig;
pub use error::RoomError;
pub use manager::{GameManager, ManagerStats, RosterEntry};
pub use room::{PlayerSender, RoomHandle, RoomInfo};
