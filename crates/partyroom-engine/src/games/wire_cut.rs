//! Wire-Cut: a hidden-role bomb defusal game.
//!
//! Players are secretly split into a blue team (led by Sherlock) and a red
//! team (led by Moriarty). Everyone holds a hand of face-down wires; on
//! their turn a player cuts one of their own. Blue wins once enough
//! defuse wires are cut; red wins the moment the bomb is cut.
//!
//! Play has two phases. During `role-reveal` every active player must
//! acknowledge their role; only then does wire cutting begin.

use partyroom_protocol::{GameKind, PlayerId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    EngineError, GameCore, GameNotice, GameResult, GameRules, GameSettings, GameStatus,
    PlayerStatus, Rejection, Team, Winner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireRole {
    Sherlock,
    Moriarty,
    Innocent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireKind {
    Safe,
    Bomb,
    Defuse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WirePhase {
    RoleReveal,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    pub owner: PlayerId,
    pub index: usize,
    pub revealed: bool,
    pub kind: WireKind,
}

/// One player's secret role and hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub player_id: PlayerId,
    pub role: WireRole,
    pub team: Team,
    pub wires: Vec<Wire>,
    /// `false` once every wire in the hand has been cut.
    pub alive: bool,
    pub acknowledged: bool,
}

impl Seat {
    pub fn wires_remaining(&self) -> usize {
        self.wires.iter().filter(|w| !w.revealed).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCutConfig {
    pub wires_per_player: usize,
    /// Defuse cuts needed for blue to win.
    pub defuses_to_win: u32,
}

impl Default for WireCutConfig {
    fn default() -> Self {
        Self {
            wires_per_player: 4,
            defuses_to_win: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireAction {
    AcknowledgeRole,
    CutWire {
        /// Whose wire to cut. Must be the acting player.
        #[serde(alias = "playerId")]
        player_id: PlayerId,
        #[serde(alias = "wireIndex")]
        wire_index: usize,
    },
}

/// Blue innocents for a table of `players`: an even split of the
/// innocents up to five players, three fifths from six up.
pub fn blue_innocents(players: usize) -> usize {
    let innocents = players.saturating_sub(2);
    if players <= 5 {
        innocents / 2
    } else {
        innocents * 3 / 5
    }
}

/// Rules and private state of a wire-cut game.
pub struct WireCut {
    config: WireCutConfig,
    rng: StdRng,
    seats: Vec<Seat>,
    phase: WirePhase,
    turn_index: usize,
    defuse_count: u32,
    bomb_count: u32,
    cuts: u32,
    winning_team: Option<Team>,
}

impl WireCut {
    pub fn new(config: WireCutConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: WireCutConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: WireCutConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            seats: Vec::new(),
            phase: WirePhase::RoleReveal,
            turn_index: 0,
            defuse_count: 0,
            bomb_count: 0,
            cuts: 0,
            winning_team: None,
        }
    }

    pub fn phase(&self) -> WirePhase {
        self.phase
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, player: &PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| &s.player_id == player)
    }

    pub fn defuse_count(&self) -> u32 {
        self.defuse_count
    }

    pub fn bomb_count(&self) -> u32 {
        self.bomb_count
    }

    pub fn winning_team(&self) -> Option<Team> {
        self.winning_team
    }

    fn deal(&mut self, core: &GameCore) {
        let n = core.players().len();
        let blue = blue_innocents(n);
        let mut roles = vec![(WireRole::Sherlock, Team::Blue), (WireRole::Moriarty, Team::Red)];
        roles.extend(std::iter::repeat_n((WireRole::Innocent, Team::Blue), blue));
        roles.extend(std::iter::repeat_n(
            (WireRole::Innocent, Team::Red),
            n.saturating_sub(2 + blue),
        ));
        roles.shuffle(&mut self.rng);

        let per_player = self.config.wires_per_player;
        self.seats = core
            .players()
            .iter()
            .zip(roles)
            .map(|(player, (role, team))| {
                let special = match (role, team) {
                    (_, Team::Blue) => Some(WireKind::Defuse),
                    (WireRole::Moriarty, _) => Some(WireKind::Bomb),
                    _ => None,
                };
                let mut kinds: Vec<WireKind> = special.into_iter().collect();
                kinds.resize(per_player, WireKind::Safe);
                kinds.shuffle(&mut self.rng);

                Seat {
                    player_id: player.user_id.clone(),
                    role,
                    team,
                    wires: kinds
                        .into_iter()
                        .enumerate()
                        .map(|(index, kind)| Wire {
                            owner: player.user_id.clone(),
                            index,
                            revealed: false,
                            kind,
                        })
                        .collect(),
                    alive: true,
                    acknowledged: false,
                }
            })
            .collect();
    }

    fn can_play(&self, core: &GameCore, index: usize) -> bool {
        self.seats
            .get(index)
            .is_some_and(|s| s.alive && core.is_active(&s.player_id))
    }

    /// Active players who have not yet acknowledged their role.
    fn unacknowledged(&self, core: &GameCore) -> usize {
        self.seats
            .iter()
            .filter(|s| !s.acknowledged && core.is_active(&s.player_id))
            .count()
    }

    /// Leaves the reveal phase once nobody active is left to acknowledge.
    fn maybe_begin_play(&mut self, core: &mut GameCore) {
        if self.phase != WirePhase::RoleReveal || self.unacknowledged(core) > 0 {
            return;
        }
        self.phase = WirePhase::Playing;
        tracing::debug!(room = %core.room_code(), "all roles acknowledged");
        core.notice(GameNotice::PhaseChanged {
            phase: WirePhase::Playing,
        });
        if self.can_play(core, self.turn_index) {
            if let Some(seat) = self.seats.get(self.turn_index) {
                core.set_turn(seat.player_id.clone());
            }
        } else {
            self.advance_turn(core);
        }
    }

    /// Hands the turn to the next seat, in roster order, that still has
    /// wires and is connected. With no such seat the bomb can never be
    /// defused, so red takes the game.
    fn advance_turn(&mut self, core: &mut GameCore) {
        let n = self.seats.len();
        let next = (1..=n)
            .map(|step| (self.turn_index + step) % n)
            .find(|i| self.can_play(core, *i));

        match next {
            Some(index) => {
                self.turn_index = index;
                core.set_turn(self.seats[index].player_id.clone());
            }
            None => {
                tracing::warn!(
                    room = %core.room_code(),
                    defuse_count = self.defuse_count,
                    "no seat left that can cut a wire"
                );
                self.finish(Team::Red);
            }
        }
    }

    fn finish(&mut self, winner: Team) {
        self.winning_team = Some(winner);
        self.phase = WirePhase::GameOver;
    }

    fn roles_public(&self, core: &GameCore) -> bool {
        self.phase == WirePhase::GameOver || core.status() == GameStatus::Finished
    }
}

impl GameRules for WireCut {
    type Action = WireAction;
    type View = WireCutView;
    const KIND: GameKind = GameKind::WireCut;
    const MOVES: &'static [&'static str] = &["acknowledge_role", "cut_wire"];

    fn default_settings() -> GameSettings {
        GameSettings::new(4, 8).with_turn_time_limit(60)
    }

    fn on_start(&mut self, core: &mut GameCore) -> Result<(), EngineError> {
        if self.config.wires_per_player == 0 || self.config.defuses_to_win == 0 {
            return Err(EngineError::InvalidConfig(
                "wires_per_player and defuses_to_win must be positive".into(),
            ));
        }
        let seated = core.players().len();
        if seated < 2 {
            return Err(EngineError::NotEnoughPlayers {
                needed: 2,
                active: core.active_count(),
            });
        }

        self.deal(core);
        self.phase = WirePhase::RoleReveal;
        self.defuse_count = 0;
        self.bomb_count = 0;
        self.cuts = 0;
        self.winning_team = None;
        self.turn_index = (0..seated)
            .find(|i| self.can_play(core, *i))
            .unwrap_or(0);
        let first = self.seats[self.turn_index].player_id.clone();
        core.set_turn(first);
        Ok(())
    }

    fn may_act(&self, core: &GameCore, player: &PlayerId, action: &WireAction) -> bool {
        match action {
            WireAction::AcknowledgeRole => true,
            WireAction::CutWire { .. } => core.current_turn() == Some(player),
        }
    }

    fn validate(
        &self,
        _core: &GameCore,
        player: &PlayerId,
        action: &WireAction,
    ) -> Result<(), Rejection> {
        match action {
            WireAction::AcknowledgeRole => {
                if self.phase != WirePhase::RoleReveal {
                    return Err(Rejection::Illegal("roles have already been revealed"));
                }
                match self.seat(player) {
                    Some(seat) if seat.acknowledged => {
                        Err(Rejection::Illegal("role already acknowledged"))
                    }
                    Some(_) => Ok(()),
                    None => Err(Rejection::UnknownPlayer(player.clone())),
                }
            }
            WireAction::CutWire {
                player_id,
                wire_index,
            } => {
                if self.phase != WirePhase::Playing {
                    return Err(Rejection::Illegal("wires cannot be cut yet"));
                }
                if player_id != player {
                    return Err(Rejection::Illegal("you may only cut your own wires"));
                }
                let wire = self
                    .seat(player)
                    .and_then(|s| s.wires.get(*wire_index))
                    .ok_or(Rejection::Illegal("no such wire"))?;
                if wire.revealed {
                    return Err(Rejection::Illegal("wire already cut"));
                }
                Ok(())
            }
        }
    }

    fn apply(&mut self, core: &mut GameCore, player: &PlayerId, action: WireAction) {
        match action {
            WireAction::AcknowledgeRole => {
                if let Some(seat) = self.seats.iter_mut().find(|s| &s.player_id == player) {
                    seat.acknowledged = true;
                }
                let waiting_on = self.unacknowledged(core);
                core.notice(GameNotice::RoleAcknowledged {
                    player_id: player.clone(),
                    waiting_on,
                });
                self.maybe_begin_play(core);
            }

            WireAction::CutWire {
                player_id,
                wire_index,
            } => {
                let Some(seat) = self.seats.iter_mut().find(|s| s.player_id == player_id) else {
                    return;
                };
                let Some(wire) = seat.wires.get_mut(wire_index) else {
                    return;
                };
                wire.revealed = true;
                let kind = wire.kind;
                seat.alive = seat.wires_remaining() > 0;
                self.cuts += 1;

                match kind {
                    WireKind::Defuse => {
                        self.defuse_count += 1;
                        if self.defuse_count >= self.config.defuses_to_win {
                            self.finish(Team::Blue);
                        }
                    }
                    WireKind::Bomb => {
                        self.bomb_count += 1;
                        self.finish(Team::Red);
                    }
                    WireKind::Safe => {}
                }

                tracing::debug!(
                    room = %core.room_code(),
                    player = %player_id,
                    wire_index,
                    ?kind,
                    "wire cut"
                );
                core.notice(GameNotice::WireCut {
                    player_id,
                    wire_index,
                    kind,
                    defuse_count: self.defuse_count,
                    bomb_count: self.bomb_count,
                });

                if self.phase != WirePhase::GameOver {
                    self.advance_turn(core);
                }
            }
        }
    }

    fn is_game_over(&self, _core: &GameCore) -> bool {
        self.phase == WirePhase::GameOver
            || self.defuse_count >= self.config.defuses_to_win
            || self.bomb_count >= 1
    }

    fn calculate_result(&self, core: &GameCore) -> Option<GameResult> {
        let team = self.winning_team?;
        let players: Vec<PlayerId> = self
            .seats
            .iter()
            .filter(|s| s.team == team)
            .map(|s| s.player_id.clone())
            .collect();
        let scores = core
            .players()
            .iter()
            .map(|p| (p.user_id.clone(), i64::from(players.contains(&p.user_id))))
            .collect();
        Some(GameResult {
            winner: Winner::Team { team, players },
            scores,
            stats: Some(json!({
                "defuse_count": self.defuse_count,
                "bomb_count": self.bomb_count,
                "cuts": self.cuts,
            })),
        })
    }

    fn on_player_disconnect(&mut self, core: &mut GameCore, _player: &PlayerId) {
        // A player who leaves mid-reveal must not hold everyone else up.
        self.maybe_begin_play(core);
    }

    fn project(&self, core: &GameCore, viewer: Option<&PlayerId>) -> WireCutView {
        let public = self.roles_public(core);
        let seats = self
            .seats
            .iter()
            .map(|seat| {
                let own = viewer.is_none_or(|id| id == &seat.player_id);
                let show_role = own || public;
                SeatView {
                    player_id: seat.player_id.clone(),
                    display_name: core.display_name(&seat.player_id),
                    status: core
                        .player(&seat.player_id)
                        .map_or(PlayerStatus::Disconnected, |p| p.status),
                    is_alive: seat.alive,
                    wires_remaining: seat.wires_remaining(),
                    wires: seat
                        .wires
                        .iter()
                        .map(|w| WireView {
                            index: w.index,
                            revealed: w.revealed,
                            kind: (own || w.revealed).then_some(w.kind),
                        })
                        .collect(),
                    role: show_role.then_some(seat.role),
                    team: show_role.then_some(seat.team),
                    acknowledged: seat.acknowledged,
                }
            })
            .collect();

        let mine = viewer.and_then(|id| self.seat(id));
        WireCutView {
            phase: self.phase,
            seats,
            current_turn_index: self.turn_index,
            defuse_count: self.defuse_count,
            bomb_count: self.bomb_count,
            defuses_to_win: self.config.defuses_to_win,
            cuts: self.cuts,
            my_role: mine.map(|s| s.role),
            my_team: mine.map(|s| s.team),
            winning_team: self.winning_team,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WireView {
    pub index: usize,
    pub revealed: bool,
    /// `None` while the viewer is not allowed to know.
    pub kind: Option<WireKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatView {
    pub player_id: PlayerId,
    pub display_name: String,
    pub status: PlayerStatus,
    pub is_alive: bool,
    pub wires_remaining: usize,
    pub wires: Vec<WireView>,
    pub role: Option<WireRole>,
    pub team: Option<Team>,
    pub acknowledged: bool,
}

/// Projection of a wire-cut game.
///
/// A viewer sees all of their own wires and only the revealed wires of
/// everyone else. Roles and teams stay private until the game is over.
#[derive(Debug, Clone, Serialize)]
pub struct WireCutView {
    pub phase: WirePhase,
    pub seats: Vec<SeatView>,
    pub current_turn_index: usize,
    pub defuse_count: u32,
    pub bomb_count: u32,
    pub defuses_to_win: u32,
    pub cuts: u32,
    pub my_role: Option<WireRole>,
    pub my_team: Option<Team>,
    pub winning_team: Option<Team>,
}
