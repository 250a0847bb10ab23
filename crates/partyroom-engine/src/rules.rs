//! The `GameRules` trait: what a concrete game implements.
//!
//! The engine ([`Game`](crate::Game)) owns the lifecycle, the roster, the
//! turn gate, and the move pipeline. A rule set only supplies the parts
//! that differ between games: setup, move validation, move effects, the
//! end condition, and what each player is allowed to see.

use std::fmt;

use partyroom_protocol::{GameKind, PlayerId};
use serde::{Serialize, de::DeserializeOwned};

use crate::{EngineError, GameCore, GameResult, GameSettings, Rejection};

/// A concrete game's rules and private state.
///
/// The implementing type *is* the game-specific data (dice, board, wires);
/// the engine never looks inside it.
///
/// The move pipeline calls, in order:
///
/// 1. [`may_act`](Self::may_act): is this player allowed to move now?
/// 2. [`validate`](Self::validate): is the move legal? Must not mutate.
/// 3. [`apply`](Self::apply): perform it. Cannot fail.
/// 4. [`is_game_over`](Self::is_game_over): if so, the engine ends the game.
pub trait GameRules: Send + 'static {
    /// Typed moves, decoded from `{ "type": move_type, ..payload }`.
    type Action: DeserializeOwned + fmt::Debug;

    /// The game-specific part of a projection.
    type View: Serialize;

    const KIND: GameKind;

    /// Every `move_type` tag this game understands.
    const MOVES: &'static [&'static str];

    /// Settings used unless overridden at `initialize`.
    fn default_settings() -> GameSettings;

    /// Game setup: deal, assign roles, pick the first turn holder.
    ///
    /// Called once while the game is `Starting`. An error aborts the start
    /// and leaves the game `Waiting`.
    fn on_start(&mut self, core: &mut GameCore) -> Result<(), EngineError>;

    /// Whether `player` currently holds the authority to submit `action`.
    ///
    /// Default: only the current turn holder may move. Games whose
    /// authority is wider than one seat (a whole team, or everyone during
    /// a setup phase) override this.
    fn may_act(&self, core: &GameCore, player: &PlayerId, _action: &Self::Action) -> bool {
        core.current_turn() == Some(player)
    }

    /// Rule checks. Returning `Err` leaves the game untouched.
    fn validate(
        &self,
        core: &GameCore,
        player: &PlayerId,
        action: &Self::Action,
    ) -> Result<(), Rejection>;

    /// Applies an action that already passed [`validate`](Self::validate).
    fn apply(&mut self, core: &mut GameCore, player: &PlayerId, action: Self::Action);

    fn is_game_over(&self, core: &GameCore) -> bool;

    /// The final result, or `None` when there is no winner to name.
    fn calculate_result(&self, core: &GameCore) -> Option<GameResult>;

    /// The game-specific projection for `viewer`. `None` is the server's
    /// own view and may include everything; a `Some` view must hide every
    /// private field that does not belong to the viewer.
    fn project(&self, core: &GameCore, viewer: Option<&PlayerId>) -> Self::View;

    /// Called after a player of a live game was marked disconnected.
    fn on_player_disconnect(&mut self, _core: &mut GameCore, _player: &PlayerId) {}

    /// Called after a disconnected player was restored to active.
    fn on_player_reconnect(&mut self, _core: &mut GameCore, _player: &PlayerId) {}
}
