//! The abstract game engine: lifecycle state machine, roster management,
//! the move pipeline, and per-player projection.
//!
//! [`Game<R>`] wraps a [`GameRules`] implementation with everything the
//! three games have in common. [`GameEngine`] is the object-safe face of
//! it, so one orchestrator can hold games of different kinds side by side.

use partyroom_protocol::{ConnectionId, GameKind, PlayerId, RoomCode};
use serde::Serialize;
use serde_json::Value;

use crate::{
    EndReason, EngineError, GameCore, GameEvent, GameId, GameResult, GameRules, GameSettings,
    GameStatus, Move, Player, PlayerStatus, PlayerView, Rejection, SettingsOverride, Winner,
    types::now_millis,
};

// ---------------------------------------------------------------------------
// GameEngine: the object-safe API
// ---------------------------------------------------------------------------

/// Everything an orchestrator may do to a game.
///
/// All mutation of a game goes through these methods. Lifecycle misuse is
/// an [`EngineError`]; a refused move is a [`Rejection`]. Events produced
/// along the way accumulate until [`take_events`](Self::take_events).
pub trait GameEngine: Send {
    fn id(&self) -> GameId;
    fn kind(&self) -> GameKind;
    fn room_code(&self) -> &RoomCode;
    fn status(&self) -> GameStatus;
    fn settings(&self) -> &GameSettings;
    fn players(&self) -> &[Player];
    fn current_turn(&self) -> Option<&PlayerId>;

    /// The player the shared rotation would pick next.
    fn next_player(&self) -> Option<PlayerId>;

    /// Binds the roster and applies settings overrides. One-shot.
    fn initialize(
        &mut self,
        players: Vec<Player>,
        overrides: Option<SettingsOverride>,
    ) -> Result<(), EngineError>;

    /// `Waiting → Starting → InProgress`, running the rule set's setup.
    fn start(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self) -> Result<(), EngineError>;
    fn resume(&mut self) -> Result<(), EngineError>;

    /// Forces the game to `Finished`. Idempotent.
    fn end(&mut self, reason: EndReason);

    /// Runs one move through the pipeline.
    fn process_move(&mut self, mv: Move) -> Result<(), Rejection>;

    /// Seats a new player. Only before the start.
    fn add_player(&mut self, player: Player) -> Result<(), EngineError>;

    /// Before the start the seat is removed; afterwards the player is
    /// marked disconnected and keeps their seat.
    fn remove_player(&mut self, player_id: &PlayerId);

    /// Restores a disconnected player. Returns `false` (and does nothing)
    /// if the player is not currently disconnected.
    fn reconnect_player(&mut self, player_id: &PlayerId, connection: ConnectionId) -> bool;

    /// The projection for `viewer` as JSON.
    fn public_state(&self, viewer: Option<&PlayerId>) -> Value;

    /// The final result. Only ever `Some` once the game is finished.
    fn result(&self) -> Option<GameResult>;

    fn is_game_over(&self) -> bool;

    /// Accepted moves, oldest first.
    fn move_log(&self) -> &[Move];

    /// Drains the outbox.
    fn take_events(&mut self) -> Vec<GameEvent>;
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// One player's (or the server's) view of a game.
#[derive(Debug, Clone, Serialize)]
pub struct GameView<V> {
    pub id: GameId,
    pub room_code: RoomCode,
    pub kind: GameKind,
    pub status: GameStatus,
    pub players: Vec<PlayerView>,
    pub current_turn: Option<PlayerId>,
    pub winner: Option<Winner>,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
    pub settings: GameSettings,
    pub game: V,
}

// ---------------------------------------------------------------------------
// Game<R>
// ---------------------------------------------------------------------------

/// One game instance: shared core plus a rule set.
pub struct Game<R: GameRules> {
    core: GameCore,
    rules: R,
    move_log: Vec<Move>,
}

impl<R: GameRules> Game<R> {
    /// Creates an empty game in `Waiting` with the rule set's default
    /// settings.
    pub fn new(room_code: RoomCode, rules: R) -> Self {
        Self {
            core: GameCore::new(room_code, R::KIND, R::default_settings()),
            rules,
            move_log: Vec::new(),
        }
    }

    pub fn core(&self) -> &GameCore {
        &self.core
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// The typed projection for `viewer`.
    pub fn view(&self, viewer: Option<&PlayerId>) -> GameView<R::View> {
        let core = &self.core;
        GameView {
            id: core.id,
            room_code: core.room_code.clone(),
            kind: core.kind,
            status: core.status,
            players: core.players.iter().map(PlayerView::from).collect(),
            current_turn: core.current_turn.clone(),
            winner: core.winner.clone(),
            started_at: core.started_at,
            finished_at: core.finished_at,
            settings: core.settings.clone(),
            game: self.rules.project(core, viewer),
        }
    }

    #[cfg(test)]
    pub(crate) fn parts_mut(&mut self) -> (&mut GameCore, &mut R) {
        (&mut self.core, &mut self.rules)
    }

    fn end_if_short_handed(&mut self) {
        if self.core.status.is_live() && self.core.active_count() < 2 {
            self.end(EndReason::NotEnoughPlayers);
        }
    }
}

impl<R: GameRules> GameEngine for Game<R> {
    fn id(&self) -> GameId {
        self.core.id
    }

    fn kind(&self) -> GameKind {
        self.core.kind
    }

    fn room_code(&self) -> &RoomCode {
        &self.core.room_code
    }

    fn status(&self) -> GameStatus {
        self.core.status
    }

    fn settings(&self) -> &GameSettings {
        &self.core.settings
    }

    fn players(&self) -> &[Player] {
        &self.core.players
    }

    fn current_turn(&self) -> Option<&PlayerId> {
        self.core.current_turn.as_ref()
    }

    fn next_player(&self) -> Option<PlayerId> {
        self.core.next_player()
    }

    fn initialize(
        &mut self,
        players: Vec<Player>,
        overrides: Option<SettingsOverride>,
    ) -> Result<(), EngineError> {
        if self.core.initialized || self.core.status != GameStatus::Waiting {
            return Err(EngineError::AlreadyInitialized);
        }

        let settings = match &overrides {
            Some(o) => self.core.settings.merged(o),
            None => self.core.settings.clone(),
        };
        if !settings.allows(players.len()) {
            return Err(EngineError::InvalidPlayerCount {
                count: players.len(),
                min: settings.min_players,
                max: settings.max_players,
            });
        }
        if let Some(dup) = first_duplicate(&players) {
            return Err(EngineError::DuplicatePlayer(dup));
        }

        self.core.settings = settings;
        self.core.players = players
            .into_iter()
            .map(|mut p| {
                p.status = PlayerStatus::Active;
                p.score = 0;
                p
            })
            .collect();
        self.core.initialized = true;

        tracing::debug!(
            room = %self.core.room_code,
            kind = %self.core.kind,
            players = self.core.players.len(),
            "game initialized"
        );
        let players = self.core.players.len();
        self.core.emit(GameEvent::Initialized { players });
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        if self.core.status != GameStatus::Waiting {
            return Err(EngineError::InvalidTransition {
                from: self.core.status,
                action: "start",
            });
        }
        if !self.core.initialized {
            return Err(EngineError::NotInitialized);
        }
        let count = self.core.players.len();
        if !self.core.settings.allows(count) {
            return Err(EngineError::InvalidPlayerCount {
                count,
                min: self.core.settings.min_players,
                max: self.core.settings.max_players,
            });
        }

        self.core.status = GameStatus::Starting;
        let outbox_len = self.core.outbox.len();
        if let Err(e) = self.rules.on_start(&mut self.core) {
            // Setup failed part-way; nothing it emitted should escape.
            self.core.status = GameStatus::Waiting;
            self.core.current_turn = None;
            self.core.outbox.truncate(outbox_len);
            tracing::warn!(room = %self.core.room_code, error = %e, "game setup failed");
            return Err(e);
        }
        self.core.started_at = Some(now_millis());
        self.core.status = GameStatus::InProgress;

        tracing::info!(
            room = %self.core.room_code,
            kind = %self.core.kind,
            "game started"
        );
        self.core.emit(GameEvent::Started);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        if self.core.status != GameStatus::InProgress {
            return Err(EngineError::InvalidTransition {
                from: self.core.status,
                action: "pause",
            });
        }
        self.core.status = GameStatus::Paused;
        self.core.emit(GameEvent::Paused);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        if self.core.status != GameStatus::Paused {
            return Err(EngineError::InvalidTransition {
                from: self.core.status,
                action: "resume",
            });
        }
        self.core.status = GameStatus::InProgress;
        self.core.emit(GameEvent::Resumed);
        Ok(())
    }

    fn end(&mut self, reason: EndReason) {
        if self.core.status == GameStatus::Finished {
            return;
        }

        let result = self.rules.calculate_result(&self.core);
        self.core.status = GameStatus::Finished;
        self.core.finished_at = Some(now_millis());
        self.core.clear_turn();

        if let Some(result) = &result {
            for player in &mut self.core.players {
                if let Some(score) = result.scores.get(&player.user_id) {
                    player.score = *score;
                }
            }
            self.core.winner = Some(result.winner.clone());
        }
        self.core.result = result.clone();
        self.core.end_reason = Some(reason.clone());

        tracing::info!(
            room = %self.core.room_code,
            kind = %self.core.kind,
            %reason,
            has_winner = result.is_some(),
            "game ended"
        );
        self.core.emit(GameEvent::Ended { reason, result });
    }

    fn process_move(&mut self, mv: Move) -> Result<(), Rejection> {
        if self.core.status != GameStatus::InProgress {
            return Err(Rejection::NotInProgress);
        }
        let actor = mv.player_id.clone();
        match self.core.player(&actor) {
            None => return Err(Rejection::UnknownPlayer(actor)),
            Some(p) if !p.is_active() => return Err(Rejection::PlayerInactive(actor)),
            Some(_) => {}
        }

        let action: R::Action = mv.decode(R::MOVES)?;
        if !self.rules.may_act(&self.core, &actor, &action) {
            return Err(Rejection::NotYourTurn(actor));
        }
        self.rules.validate(&self.core, &actor, &action)?;

        tracing::trace!(room = %self.core.room_code, player = %actor, ?action, "applying move");
        self.rules.apply(&mut self.core, &actor, action);
        self.move_log.push(mv.clone());
        self.core.emit(GameEvent::MoveApplied { mv });

        if self.rules.is_game_over(&self.core) {
            self.end(EndReason::GameOver);
        }
        Ok(())
    }

    fn add_player(&mut self, player: Player) -> Result<(), EngineError> {
        if self.core.status != GameStatus::Waiting {
            return Err(EngineError::RosterLocked(self.core.status));
        }
        if self.core.players.len() >= self.core.settings.max_players {
            return Err(EngineError::RosterFull {
                max: self.core.settings.max_players,
            });
        }
        if self.core.player(&player.user_id).is_some() {
            return Err(EngineError::DuplicatePlayer(player.user_id));
        }

        let player_id = player.user_id.clone();
        self.core.players.push(Player {
            status: PlayerStatus::Active,
            score: 0,
            ..player
        });
        self.core.emit(GameEvent::PlayerAdded { player_id });
        Ok(())
    }

    fn remove_player(&mut self, player_id: &PlayerId) {
        let Some(index) = self.core.players.iter().position(|p| &p.user_id == player_id) else {
            return;
        };

        match self.core.status {
            GameStatus::Waiting => {
                self.core.players.remove(index);
                self.core.emit(GameEvent::PlayerRemoved {
                    player_id: player_id.clone(),
                });
            }
            GameStatus::Finished => {}
            _ => {
                let player = &mut self.core.players[index];
                if player.status != PlayerStatus::Active {
                    return;
                }
                player.status = PlayerStatus::Disconnected;
                tracing::info!(
                    room = %self.core.room_code,
                    player = %player_id,
                    "player disconnected from live game"
                );
                self.core.emit(GameEvent::PlayerDisconnected {
                    player_id: player_id.clone(),
                });
                if self.core.status.is_live() {
                    self.rules.on_player_disconnect(&mut self.core, player_id);
                }
                self.end_if_short_handed();
            }
        }
    }

    fn reconnect_player(&mut self, player_id: &PlayerId, connection: ConnectionId) -> bool {
        let Some(player) = self.core.player_mut(player_id) else {
            return false;
        };
        if player.status != PlayerStatus::Disconnected {
            return false;
        }
        player.status = PlayerStatus::Active;
        player.connection = connection;

        self.core.emit(GameEvent::PlayerReconnected {
            player_id: player_id.clone(),
        });
        if self.core.status.is_live() {
            self.rules.on_player_reconnect(&mut self.core, player_id);
        }
        true
    }

    fn public_state(&self, viewer: Option<&PlayerId>) -> Value {
        match serde_json::to_value(self.view(viewer)) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(room = %self.core.room_code, error = %e, "projection failed to serialize");
                Value::Null
            }
        }
    }

    fn result(&self) -> Option<GameResult> {
        if self.core.status != GameStatus::Finished {
            return None;
        }
        self.core.result.clone()
    }

    fn is_game_over(&self) -> bool {
        self.rules.is_game_over(&self.core)
    }

    fn move_log(&self) -> &[Move] {
        &self.move_log
    }

    fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.core.outbox)
    }
}

fn first_duplicate(players: &[Player]) -> Option<PlayerId> {
    players.iter().enumerate().find_map(|(i, p)| {
        players[..i]
            .iter()
            .any(|q| q.user_id == p.user_id)
            .then(|| p.user_id.clone())
    })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Lifecycle and pipeline tests against a minimal rule set, so the
    //! assertions are about the engine and not about any real game.

    use std::collections::BTreeMap;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    /// Players take turns adding to a shared counter; reaching the target
    /// ends the game with the last adder as winner.
    struct CounterRules {
        count: u32,
        target: u32,
        last: Option<PlayerId>,
        fail_setup: bool,
    }

    #[derive(Debug, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum CounterAction {
        Add { amount: u32 },
    }

    impl GameRules for CounterRules {
        type Action = CounterAction;
        type View = u32;
        const KIND: GameKind = GameKind::DiceBid;
        const MOVES: &'static [&'static str] = &["add"];

        fn default_settings() -> GameSettings {
            GameSettings::new(2, 4)
        }

        fn on_start(&mut self, core: &mut GameCore) -> Result<(), EngineError> {
            if self.fail_setup {
                return Err(EngineError::InvalidConfig("broken".into()));
            }
            let first = core.players()[0].user_id.clone();
            core.set_turn(first);
            Ok(())
        }

        fn validate(
            &self,
            _core: &GameCore,
            _player: &PlayerId,
            action: &CounterAction,
        ) -> Result<(), Rejection> {
            let CounterAction::Add { amount } = action;
            if *amount == 0 || *amount > 3 {
                return Err(Rejection::Illegal("add between 1 and 3"));
            }
            Ok(())
        }

        fn apply(&mut self, core: &mut GameCore, player: &PlayerId, action: CounterAction) {
            let CounterAction::Add { amount } = action;
            self.count += amount;
            self.last = Some(player.clone());
            if let Some(next) = core.next_player() {
                core.set_turn(next);
            }
        }

        fn is_game_over(&self, _core: &GameCore) -> bool {
            self.count >= self.target
        }

        fn calculate_result(&self, core: &GameCore) -> Option<GameResult> {
            let winner = self.last.clone().filter(|_| self.count >= self.target)?;
            let scores: BTreeMap<PlayerId, i64> = core
                .players()
                .iter()
                .map(|p| (p.user_id.clone(), i64::from(p.user_id == winner)))
                .collect();
            Some(GameResult {
                winner: Winner::Player { player_id: winner },
                scores,
                stats: None,
            })
        }

        fn project(&self, _core: &GameCore, _viewer: Option<&PlayerId>) -> u32 {
            self.count
        }
    }

    fn counter(target: u32) -> Game<CounterRules> {
        Game::new(
            RoomCode::parse("CNTR").unwrap(),
            CounterRules {
                count: 0,
                target,
                last: None,
                fail_setup: false,
            },
        )
    }

    fn roster(ids: &[&str]) -> Vec<Player> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Player::new(*id, *id, ConnectionId(i as u64)))
            .collect()
    }

    fn started(ids: &[&str], target: u32) -> Game<CounterRules> {
        let mut game = counter(target);
        game.initialize(roster(ids), None).unwrap();
        game.start().unwrap();
        game.take_events();
        game
    }

    fn add(player: &str, amount: u32) -> Move {
        Move::new(player, "add", json!({ "amount": amount }))
    }

    // -- initialize --

    #[test]
    fn test_initialize_rejects_bad_counts() {
        let mut game = counter(10);
        assert_eq!(
            game.initialize(roster(&["a"]), None),
            Err(EngineError::InvalidPlayerCount { count: 1, min: 2, max: 4 })
        );
        assert!(matches!(
            game.initialize(roster(&["a", "b", "c", "d", "e"]), None),
            Err(EngineError::InvalidPlayerCount { count: 5, .. })
        ));
        // A failed attempt does not consume the one-shot.
        assert!(game.initialize(roster(&["a", "b"]), None).is_ok());
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut game = counter(10);
        game.initialize(roster(&["a", "b"]), None).unwrap();
        assert_eq!(
            game.initialize(roster(&["a", "b"]), None),
            Err(EngineError::AlreadyInitialized)
        );
    }

    #[test]
    fn test_initialize_applies_override_and_resets_players() {
        let mut game = counter(10);
        let mut players = roster(&["a", "b", "c", "d", "e"]);
        players[0].score = 99;
        players[1].status = PlayerStatus::Spectator;
        let overrides = SettingsOverride {
            max_players: Some(5),
            turn_time_limit_secs: Some(30),
            ..SettingsOverride::default()
        };
        game.initialize(players, Some(overrides)).unwrap();

        assert_eq!(game.settings().max_players, 5);
        assert_eq!(game.settings().turn_time_limit_secs, Some(30));
        assert!(game.players().iter().all(|p| p.is_active() && p.score == 0));
    }

    #[test]
    fn test_initialize_rejects_duplicate_ids() {
        let mut game = counter(10);
        assert_eq!(
            game.initialize(roster(&["a", "a"]), None),
            Err(EngineError::DuplicatePlayer("a".into()))
        );
    }

    // -- lifecycle --

    #[test]
    fn test_start_requires_waiting() {
        let mut game = started(&["a", "b"], 10);
        assert_eq!(game.status(), GameStatus::InProgress);
        assert!(matches!(
            game.start(),
            Err(EngineError::InvalidTransition { from: GameStatus::InProgress, .. })
        ));
    }

    #[test]
    fn test_start_requires_initialize() {
        let mut game = counter(10);
        assert_eq!(game.start(), Err(EngineError::NotInitialized));
    }

    #[test]
    fn test_failed_setup_leaves_game_waiting() {
        let mut game = Game::new(
            RoomCode::parse("CNTR").unwrap(),
            CounterRules {
                count: 0,
                target: 10,
                last: None,
                fail_setup: true,
            },
        );
        game.initialize(roster(&["a", "b"]), None).unwrap();
        assert!(matches!(game.start(), Err(EngineError::InvalidConfig(_))));
        assert_eq!(game.status(), GameStatus::Waiting);
    }

    #[test]
    fn test_start_emits_started_and_turn() {
        let mut game = counter(10);
        game.initialize(roster(&["a", "b"]), None).unwrap();
        game.start().unwrap();
        let events = game.take_events();
        assert!(events.contains(&GameEvent::Started));
        assert!(events.contains(&GameEvent::TurnChanged { player_id: "a".into() }));
        assert!(game.take_events().is_empty(), "outbox drains");
    }

    #[test]
    fn test_pause_resume_toggle() {
        let mut game = started(&["a", "b"], 10);
        assert!(game.resume().is_err());
        game.pause().unwrap();
        assert_eq!(game.status(), GameStatus::Paused);
        assert!(game.pause().is_err());
        assert_eq!(game.process_move(add("a", 1)), Err(Rejection::NotInProgress));
        game.resume().unwrap();
        assert_eq!(game.status(), GameStatus::InProgress);
        assert!(game.process_move(add("a", 1)).is_ok());
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut game = started(&["a", "b"], 2);
        game.process_move(add("a", 2)).unwrap();
        assert_eq!(game.status(), GameStatus::Finished);
        let first = game.result();
        let finished_at = game.core().finished_at;
        let events = game.take_events();
        assert_eq!(
            events.iter().filter(|e| matches!(e, GameEvent::Ended { .. })).count(),
            1
        );

        game.end(EndReason::Normal);
        assert_eq!(game.result(), first);
        assert_eq!(game.core().finished_at, finished_at);
        assert_eq!(game.core().end_reason(), Some(&EndReason::GameOver));
        assert!(game.take_events().is_empty());
        assert_eq!(game.players()[0].score, 1);
    }

    #[test]
    fn test_result_is_none_until_finished() {
        let mut game = started(&["a", "b"], 10);
        assert_eq!(game.result(), None);
        game.end(EndReason::Normal);
        // Ended without reaching the target: finished but no winner.
        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.result(), None);
        assert_eq!(game.current_turn(), None);
    }

    // -- move pipeline --

    #[test]
    fn test_only_turn_holder_may_move() {
        let mut game = started(&["a", "b", "c"], 10);
        assert_eq!(game.process_move(add("b", 1)), Err(Rejection::NotYourTurn("b".into())));
        assert!(game.move_log().is_empty());
        assert!(game.take_events().is_empty());

        game.process_move(add("a", 1)).unwrap();
        assert_eq!(game.current_turn(), Some(&"b".into()));
        assert_eq!(game.process_move(add("a", 1)), Err(Rejection::NotYourTurn("a".into())));
    }

    #[test]
    fn test_rejections_do_not_mutate() {
        let mut game = started(&["a", "b"], 10);
        let before = game.public_state(None);

        assert!(matches!(game.process_move(add("a", 0)), Err(Rejection::Illegal(_))));
        assert_eq!(
            game.process_move(Move::new("a", "multiply", Value::Null)),
            Err(Rejection::UnknownMove("multiply".into()))
        );
        assert!(matches!(
            game.process_move(Move::new("a", "add", json!({ "amount": "lots" }))),
            Err(Rejection::MalformedPayload(_))
        ));
        assert_eq!(
            game.process_move(add("zed", 1)),
            Err(Rejection::UnknownPlayer("zed".into()))
        );

        assert_eq!(game.public_state(None), before);
        assert!(game.move_log().is_empty());
    }

    #[test]
    fn test_accepted_move_is_logged_and_announced() {
        let mut game = started(&["a", "b"], 10);
        game.process_move(add("a", 3)).unwrap();
        assert_eq!(game.move_log().len(), 1);
        let events = game.take_events();
        assert!(matches!(&events[..], [GameEvent::TurnChanged { .. }, GameEvent::MoveApplied { .. }]));
    }

    // -- roster --

    #[test]
    fn test_add_player_rules() {
        let mut game = counter(10);
        game.initialize(roster(&["a", "b"]), None).unwrap();
        assert!(game.add_player(Player::new("c", "C", ConnectionId(9))).is_ok());
        assert_eq!(
            game.add_player(Player::new("c", "C", ConnectionId(9))),
            Err(EngineError::DuplicatePlayer("c".into()))
        );
        game.add_player(Player::new("d", "D", ConnectionId(10))).unwrap();
        assert_eq!(
            game.add_player(Player::new("e", "E", ConnectionId(11))),
            Err(EngineError::RosterFull { max: 4 })
        );

        game.start().unwrap();
        assert!(matches!(
            game.add_player(Player::new("f", "F", ConnectionId(12))),
            Err(EngineError::RosterLocked(GameStatus::InProgress))
        ));
    }

    #[test]
    fn test_remove_before_start_deletes_seat() {
        let mut game = counter(10);
        game.initialize(roster(&["a", "b", "c"]), None).unwrap();
        game.remove_player(&"b".into());
        assert_eq!(game.players().len(), 2);
        assert!(game.players().iter().all(|p| p.user_id.as_str() != "b"));
    }

    #[test]
    fn test_remove_during_play_disconnects_and_aborts_when_short() {
        let mut game = started(&["a", "b", "c"], 10);
        game.remove_player(&"c".into());
        assert_eq!(game.players().len(), 3);
        assert_eq!(game.players()[2].status, PlayerStatus::Disconnected);
        assert_eq!(game.status(), GameStatus::InProgress);

        game.remove_player(&"b".into());
        assert_eq!(game.status(), GameStatus::Finished);
        assert_eq!(game.core().end_reason(), Some(&EndReason::NotEnoughPlayers));
    }

    #[test]
    fn test_disconnected_player_is_skipped_and_cannot_move() {
        let mut game = started(&["a", "b", "c"], 10);
        game.remove_player(&"b".into());
        game.process_move(add("a", 1)).unwrap();
        assert_eq!(game.current_turn(), Some(&"c".into()));
        assert_eq!(game.process_move(add("b", 1)), Err(Rejection::PlayerInactive("b".into())));
    }

    #[test]
    fn test_reconnect_restores_and_rebinds() {
        let mut game = started(&["a", "b", "c"], 10);
        assert!(!game.reconnect_player(&"b".into(), ConnectionId(77)), "not disconnected");

        game.remove_player(&"b".into());
        assert!(game.reconnect_player(&"b".into(), ConnectionId(77)));
        let b = &game.players()[1];
        assert!(b.is_active());
        assert_eq!(b.connection, ConnectionId(77));
        assert!(!game.reconnect_player(&"nobody".into(), ConnectionId(1)));
    }

    #[test]
    fn test_public_state_shape() {
        let game = started(&["a", "b"], 10);
        let state = game.public_state(Some(&"a".into()));
        assert_eq!(state["status"], "in_progress");
        assert_eq!(state["room_code"], "CNTR");
        assert_eq!(state["current_turn"], "a");
        assert_eq!(state["players"][1]["user_id"], "b");
        assert!(state["players"][0].get("connection").is_none());
        assert_eq!(state["game"], 0);
    }
}
