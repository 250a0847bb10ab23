//! Wire-facing vocabulary for Partyroom.
//!
//! This crate defines what the game core shares with the outside world:
//!
//! - **Identifiers** ([`PlayerId`], [`RoomCode`], [`ConnectionId`],
//!   [`GameKind`]): the keys every other layer uses.
//! - **Outbound events** ([`ServerEvent`], [`Recipient`]): what the
//!   orchestrator hands to the transport layer for delivery.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those events are
//!   turned into bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer knows nothing about rules or rooms. It sits between
//! the transport (bytes on a socket, out of scope here) and the
//! orchestrator (room actors):
//!
//! ```text
//! Transport (bytes) ← Protocol (ServerEvent) ← Orchestrator (room actors)
//! ```

mod codec;
mod error;
mod event;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::ServerEvent;
pub use types::{ConnectionId, GameKind, PlayerId, Recipient, RoomCode};
