//! Game manager: maps room codes to live games.

use std::collections::{BTreeMap, HashMap};

use partyroom_engine::{EndReason, GameEngine, Move, Player, SettingsOverride, games};
use partyroom_protocol::{ConnectionId, GameKind, PlayerId, RoomCode};
use serde::Serialize;
use serde_json::Value;

use crate::room::spawn_room;
use crate::{ManagerConfig, PlayerSender, RoomError, RoomHandle, RoomInfo};

/// One connected room member, as supplied when a game is created.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub user_id: PlayerId,
    pub display_name: String,
    pub connection: ConnectionId,
    /// Where this player's outbound events go.
    pub sender: PlayerSender,
}

impl RosterEntry {
    pub fn new(
        user_id: impl Into<PlayerId>,
        display_name: impl Into<String>,
        connection: ConnectionId,
        sender: PlayerSender,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            connection,
            sender,
        }
    }
}

/// Aggregate numbers over every live room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagerStats {
    pub active_games: usize,
    pub games_by_kind: BTreeMap<GameKind, usize>,
    pub total_players: usize,
}

/// Owns the room-code → game mapping for the whole process.
///
/// There is at most one live game per room code. Each game runs inside
/// its own room actor; the manager only holds handles. Rooms whose actor
/// has stopped (after the post-game grace period, or a shutdown) are
/// treated as gone and pruned lazily.
pub struct GameManager {
    config: ManagerConfig,
    rooms: HashMap<RoomCode, RoomHandle>,
}

impl GameManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Creates, initializes, and starts a game of `kind` for `code`.
    ///
    /// Every roster member receives `game_created` and `game_started`
    /// with their own projection before this returns.
    ///
    /// # Errors
    ///
    /// [`RoomError::AlreadyExists`] if the code is taken, or
    /// [`RoomError::Engine`] if the roster does not fit the game.
    pub fn create_game(
        &mut self,
        code: RoomCode,
        kind: GameKind,
        roster: Vec<RosterEntry>,
        overrides: Option<SettingsOverride>,
    ) -> Result<RoomHandle, RoomError> {
        self.launch(games::new_game(kind, code), roster, overrides)
    }

    /// Like [`create_game`](Self::create_game), with a caller-built engine.
    ///
    /// The engine must be fresh: the room code and kind are taken from it.
    pub fn launch(
        &mut self,
        mut engine: Box<dyn GameEngine>,
        roster: Vec<RosterEntry>,
        overrides: Option<SettingsOverride>,
    ) -> Result<RoomHandle, RoomError> {
        let code = engine.room_code().clone();
        self.prune_closed();
        if self.rooms.contains_key(&code) {
            return Err(RoomError::AlreadyExists(code));
        }

        let mut players = Vec::with_capacity(roster.len());
        let mut senders = HashMap::with_capacity(roster.len());
        for entry in roster {
            players.push(Player::new(
                entry.user_id.clone(),
                entry.display_name,
                entry.connection,
            ));
            senders.insert(entry.user_id, entry.sender);
        }

        engine.initialize(players, overrides)?;
        engine.start()?;

        let kind = engine.kind();
        let handle = spawn_room(engine, senders, self.config.clone());
        self.rooms.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, kind = %kind, "game launched");
        Ok(handle)
    }

    /// Draws a random room code not used by any live room.
    pub fn allocate_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let code = RoomCode::generate(&mut rng);
            if self.handle(&code).is_err() {
                return code;
            }
        }
    }

    /// A handle to the live room for `code`.
    ///
    /// Callers that share the manager behind a lock should clone the
    /// handle and release the lock before awaiting on it.
    pub fn handle(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(code)
            .filter(|h| !h.is_closed())
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    pub fn has_game(&self, code: &RoomCode) -> bool {
        self.handle(code).is_ok()
    }

    /// Routes a move to the room's engine.
    pub async fn submit_move(
        &self,
        code: &RoomCode,
        player_id: PlayerId,
        move_type: &str,
        payload: Value,
    ) -> Result<(), RoomError> {
        self.handle(code)?
            .submit_move(Move::new(player_id, move_type, payload))
            .await
    }

    pub async fn pause_game(&self, code: &RoomCode) -> Result<(), RoomError> {
        self.handle(code)?.pause().await
    }

    pub async fn resume_game(&self, code: &RoomCode) -> Result<(), RoomError> {
        self.handle(code)?.resume().await
    }

    /// Ends the game; the room is torn down after the cleanup delay.
    pub async fn end_game(&self, code: &RoomCode, reason: EndReason) -> Result<(), RoomError> {
        self.handle(code)?.end(reason).await
    }

    pub async fn get_state(
        &self,
        code: &RoomCode,
        viewer: Option<PlayerId>,
    ) -> Result<Value, RoomError> {
        self.handle(code)?.state(viewer).await
    }

    pub async fn player_disconnected(
        &self,
        code: &RoomCode,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        self.handle(code)?.disconnect(player_id).await
    }

    pub async fn player_reconnected(
        &self,
        code: &RoomCode,
        player_id: PlayerId,
        connection: ConnectionId,
        sender: PlayerSender,
    ) -> Result<bool, RoomError> {
        self.handle(code)?.reconnect(player_id, connection, sender).await
    }

    pub async fn room_info(&self, code: &RoomCode) -> Result<RoomInfo, RoomError> {
        self.handle(code)?.info().await
    }

    /// Stops a room immediately, without waiting for the grace period.
    pub async fn destroy_room(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let _ = handle.shutdown().await;

        tracing::info!(room = %code, "room destroyed");
        Ok(())
    }

    /// Drops handles of rooms whose actor has stopped. Returns how many
    /// were removed.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|code, handle| {
            let open = !handle.is_closed();
            if !open {
                tracing::debug!(room = %code, "pruning closed room");
            }
            open
        });
        before - self.rooms.len()
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.live().count()
    }

    /// Lists all live room codes, sorted.
    pub fn room_codes(&self) -> Vec<RoomCode> {
        let mut codes: Vec<_> = self.live().map(|h| h.code().clone()).collect();
        codes.sort();
        codes
    }

    pub fn stats(&self) -> ManagerStats {
        let mut stats = ManagerStats::default();
        for handle in self.live() {
            stats.active_games += 1;
            *stats.games_by_kind.entry(handle.kind()).or_default() += 1;
            stats.total_players += handle.player_count();
        }
        stats
    }

    fn live(&self) -> impl Iterator<Item = &RoomHandle> {
        self.rooms.values().filter(|h| !h.is_closed())
    }
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}
