//! `PartyServer`: the handle a dispatch layer talks to.
//!
//! Every operation takes room codes and player ids as the raw strings a
//! transport delivers. Codes are normalized to uppercase before lookup.

use std::sync::Arc;

use partyroom_engine::{EndReason, SettingsOverride};
use partyroom_protocol::{Codec, ConnectionId, GameKind, JsonCodec, PlayerId, RoomCode, ServerEvent};
use partyroom_room::{
    GameManager, ManagerConfig, ManagerStats, PlayerSender, RoomError, RoomHandle, RoomInfo,
    RosterEntry,
};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::PartyError;

/// Builder for a [`PartyServer`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use partyroom::PartyServer;
///
/// let server = PartyServer::builder()
///     .cleanup_delay(Duration::from_secs(10))
///     .turn_timers(false)
///     .build();
/// # let _ = server;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PartyServerBuilder {
    config: ManagerConfig,
}

impl PartyServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole manager configuration.
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// How long a finished game stays reachable.
    pub fn cleanup_delay(mut self, delay: std::time::Duration) -> Self {
        self.config = self.config.with_cleanup_delay(delay);
        self
    }

    pub fn channel_size(mut self, size: usize) -> Self {
        self.config = self.config.with_channel_size(size);
        self
    }

    pub fn turn_timers(mut self, enabled: bool) -> Self {
        self.config = self.config.with_turn_timers(enabled);
        self
    }

    pub fn build(self) -> PartyServer {
        PartyServer {
            manager: Arc::new(Mutex::new(GameManager::new(self.config))),
            codec: JsonCodec,
        }
    }
}

/// Shared entry point to the game core.
///
/// Cheap to clone; clones share the same set of rooms. The manager lock is
/// only held to look up or register a room, never while waiting on a room
/// actor.
#[derive(Clone)]
pub struct PartyServer {
    manager: Arc<Mutex<GameManager>>,
    codec: JsonCodec,
}

impl PartyServer {
    pub fn builder() -> PartyServerBuilder {
        PartyServerBuilder::new()
    }

    /// Creates, initializes, and starts a game in `room`.
    pub async fn create_game(
        &self,
        room: &str,
        kind: GameKind,
        roster: Vec<RosterEntry>,
    ) -> Result<RoomHandle, PartyError> {
        self.create_game_with(room, kind, roster, None).await
    }

    /// [`create_game`](Self::create_game) with settings overrides.
    pub async fn create_game_with(
        &self,
        room: &str,
        kind: GameKind,
        roster: Vec<RosterEntry>,
        overrides: Option<SettingsOverride>,
    ) -> Result<RoomHandle, PartyError> {
        let code = RoomCode::parse(room)?;
        let handle = self
            .manager
            .lock()
            .await
            .create_game(code, kind, roster, overrides)?;
        Ok(handle)
    }

    /// Creates a game under a freshly drawn room code.
    pub async fn open_room(
        &self,
        kind: GameKind,
        roster: Vec<RosterEntry>,
    ) -> Result<RoomHandle, PartyError> {
        let mut manager = self.manager.lock().await;
        let code = manager.allocate_code();
        tracing::debug!(room = %code, kind = ?kind, "opening room under drawn code");
        Ok(manager.create_game(code, kind, roster, None)?)
    }

    /// Routes a move. Returns `Ok(false)` when the engine refused it; the
    /// submitter has then already been sent `move_rejected`.
    pub async fn submit_move(
        &self,
        room: &str,
        player: &str,
        move_type: &str,
        payload: Value,
    ) -> Result<bool, PartyError> {
        let handle = self.room(room).await?;
        let mv = partyroom_engine::Move::new(player, move_type, payload);
        match handle.submit_move(mv).await {
            Ok(()) => Ok(true),
            Err(RoomError::Rejected(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn pause_game(&self, room: &str) -> Result<(), PartyError> {
        Ok(self.room(room).await?.pause().await?)
    }

    pub async fn resume_game(&self, room: &str) -> Result<(), PartyError> {
        Ok(self.room(room).await?.resume().await?)
    }

    /// Ends the game with a free-form reason (`"normal"` if empty).
    pub async fn end_game(&self, room: &str, reason: &str) -> Result<(), PartyError> {
        Ok(self.room(room).await?.end(EndReason::from(reason)).await?)
    }

    /// The projection for `player`, or the full observer view for `None`.
    pub async fn get_state(&self, room: &str, player: Option<&str>) -> Result<Value, PartyError> {
        let viewer = player.map(PlayerId::from);
        Ok(self.room(room).await?.state(viewer).await?)
    }

    pub async fn player_disconnected(&self, room: &str, player: &str) -> Result<(), PartyError> {
        Ok(self.room(room).await?.disconnect(PlayerId::from(player)).await?)
    }

    /// Returns `false` if the player was not disconnected.
    pub async fn player_reconnected(
        &self,
        room: &str,
        player: &str,
        connection: ConnectionId,
        sender: PlayerSender,
    ) -> Result<bool, PartyError> {
        Ok(self
            .room(room)
            .await?
            .reconnect(PlayerId::from(player), connection, sender)
            .await?)
    }

    pub async fn room_info(&self, room: &str) -> Result<RoomInfo, PartyError> {
        Ok(self.room(room).await?.info().await?)
    }

    pub async fn has_game(&self, room: &str) -> bool {
        match RoomCode::parse(room) {
            Ok(code) => self.manager.lock().await.has_game(&code),
            Err(_) => false,
        }
    }

    pub async fn stats(&self) -> ManagerStats {
        self.manager.lock().await.stats()
    }

    /// Serializes an outbound event with the server's codec.
    pub fn encode(&self, event: &ServerEvent) -> Result<Vec<u8>, PartyError> {
        Ok(self.codec.encode(event)?)
    }

    /// Looks up a room handle and releases the manager lock.
    async fn room(&self, room: &str) -> Result<RoomHandle, PartyError> {
        let code = RoomCode::parse(room)?;
        let handle = self.manager.lock().await.handle(&code)?;
        Ok(handle)
    }
}

impl Default for PartyServer {
    fn default() -> Self {
        PartyServerBuilder::new().build()
    }
}
