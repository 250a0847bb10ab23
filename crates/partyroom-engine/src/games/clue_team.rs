//! Clue-Team: two teams race to find their words on a shared 25-card board.
//!
//! Each team has one spymaster, who sees which card belongs to whom, and
//! some agents, who do not. The spymaster gives a one-word clue and a
//! number; the agents then guess cards. Uncovering the assassin loses the
//! game on the spot.
//!
//! Turn authority belongs to a team, not a seat: the turn pointer names
//! the spymaster until a clue is given, then the team's lead agent, but
//! any agent of the acting team may guess or end the turn.

use partyroom_protocol::{GameKind, PlayerId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::words::DEFAULT_WORDS;
use crate::{
    EngineError, GameCore, GameNotice, GameResult, GameRules, GameSettings, Rejection, Team,
    Winner,
};

pub const BOARD_SIZE: usize = 25;
const STARTING_QUOTA: u32 = 9;
const SECOND_QUOTA: u32 = 8;
const NEUTRAL_CARDS: usize = 7;
const MAX_CLUE_NUMBER: u8 = 9;
const MIN_PLAYERS: usize = 4;

/// What a card really is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Red,
    Blue,
    Neutral,
    Assassin,
}

impl CardKind {
    fn team(self) -> Option<Team> {
        match self {
            Self::Red => Some(Team::Red),
            Self::Blue => Some(Team::Blue),
            Self::Neutral | Self::Assassin => None,
        }
    }
}

impl From<Team> for CardKind {
    fn from(team: Team) -> Self {
        match team {
            Team::Red => Self::Red,
            Team::Blue => Self::Blue,
        }
    }
}

/// A card as a given viewer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellFace {
    Red,
    Blue,
    Neutral,
    Assassin,
    Hidden,
}

impl From<CardKind> for CellFace {
    fn from(kind: CardKind) -> Self {
        match kind {
            CardKind::Red => Self::Red,
            CardKind::Blue => Self::Blue,
            CardKind::Neutral => Self::Neutral,
            CardKind::Assassin => Self::Assassin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub word: String,
    pub kind: CardKind,
    pub revealed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClueRole {
    Spymaster,
    Agent,
}

/// The clue currently in force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clue {
    pub word: String,
    pub number: u8,
    pub guesses_remaining: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueTeamConfig {
    /// Words the board is drawn from. Needs at least 25 distinct entries.
    pub word_pool: Vec<String>,
}

impl Default for ClueTeamConfig {
    fn default() -> Self {
        Self {
            word_pool: DEFAULT_WORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClueAction {
    GiveClue { word: String, number: u8 },
    GuessWord { position: usize },
    EndTurn,
}

#[derive(Debug, Clone, Default)]
struct TeamSide {
    members: Vec<PlayerId>,
    spymaster: Option<PlayerId>,
    score: u32,
    quota: u32,
}

/// Rules and private state of a clue-team game.
pub struct ClueTeam {
    config: ClueTeamConfig,
    rng: StdRng,
    board: Vec<Card>,
    red: TeamSide,
    blue: TeamSide,
    starting_team: Team,
    current_team: Team,
    clue: Option<Clue>,
    winner: Option<Team>,
}

impl ClueTeam {
    pub fn new(config: ClueTeamConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: ClueTeamConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ClueTeamConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            board: Vec::new(),
            red: TeamSide::default(),
            blue: TeamSide::default(),
            starting_team: Team::Red,
            current_team: Team::Red,
            clue: None,
            winner: None,
        }
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn current_team(&self) -> Team {
        self.current_team
    }

    pub fn starting_team(&self) -> Team {
        self.starting_team
    }

    pub fn clue(&self) -> Option<&Clue> {
        self.clue.as_ref()
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn score(&self, team: Team) -> u32 {
        self.side(team).score
    }

    pub fn quota(&self, team: Team) -> u32 {
        self.side(team).quota
    }

    pub fn members(&self, team: Team) -> &[PlayerId] {
        &self.side(team).members
    }

    pub fn spymaster(&self, team: Team) -> Option<&PlayerId> {
        self.side(team).spymaster.as_ref()
    }

    pub fn team_of(&self, player: &PlayerId) -> Option<Team> {
        [Team::Red, Team::Blue]
            .into_iter()
            .find(|t| self.side(*t).members.contains(player))
    }

    pub fn role_of(&self, player: &PlayerId) -> Option<ClueRole> {
        let team = self.team_of(player)?;
        if self.side(team).spymaster.as_ref() == Some(player) {
            Some(ClueRole::Spymaster)
        } else {
            Some(ClueRole::Agent)
        }
    }

    pub fn is_spymaster(&self, player: &PlayerId) -> bool {
        self.role_of(player) == Some(ClueRole::Spymaster)
    }

    fn side(&self, team: Team) -> &TeamSide {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }

    fn side_mut(&mut self, team: Team) -> &mut TeamSide {
        match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        }
    }

    fn is_current_agent(&self, player: &PlayerId) -> bool {
        self.team_of(player) == Some(self.current_team)
            && self.role_of(player) == Some(ClueRole::Agent)
    }

    /// The first active agent of the acting team.
    fn lead_agent(&self, core: &GameCore) -> Option<PlayerId> {
        let side = self.side(self.current_team);
        side.members
            .iter()
            .filter(|id| side.spymaster.as_ref() != Some(*id))
            .find(|id| core.is_active(id))
            .cloned()
    }

    fn deal_board(&mut self) -> Result<(), EngineError> {
        let mut pool: Vec<String> = self
            .config
            .word_pool
            .iter()
            .map(|w| w.trim().to_uppercase())
            .filter(|w| !w.is_empty())
            .collect();
        pool.sort_unstable();
        pool.dedup();
        if pool.len() < BOARD_SIZE {
            return Err(EngineError::InvalidConfig(format!(
                "word pool has {} distinct words, need {BOARD_SIZE}",
                pool.len()
            )));
        }
        pool.shuffle(&mut self.rng);

        let mut kinds = Vec::with_capacity(BOARD_SIZE);
        kinds.extend(std::iter::repeat_n(
            CardKind::from(self.starting_team),
            STARTING_QUOTA as usize,
        ));
        kinds.extend(std::iter::repeat_n(
            CardKind::from(self.starting_team.other()),
            SECOND_QUOTA as usize,
        ));
        kinds.extend(std::iter::repeat_n(CardKind::Neutral, NEUTRAL_CARDS));
        kinds.push(CardKind::Assassin);
        kinds.shuffle(&mut self.rng);

        self.board = pool
            .into_iter()
            .zip(kinds)
            .map(|(word, kind)| Card {
                word,
                kind,
                revealed: false,
            })
            .collect();
        Ok(())
    }

    fn pass_turn(&mut self, core: &mut GameCore) {
        self.current_team = self.current_team.other();
        self.clue = None;
        if let Some(spymaster) = self.side(self.current_team).spymaster.clone() {
            core.set_turn(spymaster);
        }
        core.notice(GameNotice::TurnPassed {
            team: self.current_team,
        });
    }
}

impl GameRules for ClueTeam {
    type Action = ClueAction;
    type View = ClueTeamView;
    const KIND: GameKind = GameKind::ClueTeam;
    const MOVES: &'static [&'static str] = &["give_clue", "guess_word", "end_turn"];

    fn default_settings() -> GameSettings {
        GameSettings::new(4, 12)
            .with_time_limit(1800)
            .with_turn_time_limit(180)
    }

    fn on_start(&mut self, core: &mut GameCore) -> Result<(), EngineError> {
        let mut players: Vec<PlayerId> = core.active_players().map(|p| p.user_id.clone()).collect();
        if players.len() < MIN_PLAYERS {
            return Err(EngineError::NotEnoughPlayers {
                needed: MIN_PLAYERS,
                active: players.len(),
            });
        }

        self.starting_team = if self.rng.random_bool(0.5) {
            Team::Red
        } else {
            Team::Blue
        };
        self.current_team = self.starting_team;
        self.deal_board()?;

        players.shuffle(&mut self.rng);
        let blue_members = players.split_off(players.len().div_ceil(2));
        let red_members = players;
        for (team, members) in [(Team::Red, red_members), (Team::Blue, blue_members)] {
            let quota = if team == self.starting_team {
                STARTING_QUOTA
            } else {
                SECOND_QUOTA
            };
            *self.side_mut(team) = TeamSide {
                spymaster: members.first().cloned(),
                members,
                score: 0,
                quota,
            };
        }
        self.clue = None;
        self.winner = None;

        tracing::debug!(
            room = %core.room_code(),
            starting_team = %self.starting_team,
            red = self.red.members.len(),
            blue = self.blue.members.len(),
            "board dealt"
        );
        if let Some(spymaster) = self.side(self.starting_team).spymaster.clone() {
            core.set_turn(spymaster);
        }
        Ok(())
    }

    fn may_act(&self, _core: &GameCore, player: &PlayerId, action: &ClueAction) -> bool {
        match action {
            ClueAction::GiveClue { .. } => {
                self.side(self.current_team).spymaster.as_ref() == Some(player)
            }
            ClueAction::GuessWord { .. } | ClueAction::EndTurn => self.is_current_agent(player),
        }
    }

    fn validate(
        &self,
        _core: &GameCore,
        _player: &PlayerId,
        action: &ClueAction,
    ) -> Result<(), Rejection> {
        match action {
            ClueAction::GiveClue { word, number } => {
                if self.clue.is_some() {
                    return Err(Rejection::Illegal("a clue is already active"));
                }
                if *number > MAX_CLUE_NUMBER {
                    return Err(Rejection::Illegal("clue number must be between 0 and 9"));
                }
                if word.trim().is_empty() || word.trim().contains(char::is_whitespace) {
                    return Err(Rejection::Illegal("clue must be a single word"));
                }
                Ok(())
            }
            ClueAction::GuessWord { position } => {
                match &self.clue {
                    Some(clue) if clue.guesses_remaining > 0 => {}
                    _ => return Err(Rejection::Illegal("no clue to guess from")),
                }
                match self.board.get(*position) {
                    None => Err(Rejection::Illegal("no card at that position")),
                    Some(card) if card.revealed => Err(Rejection::Illegal("card already revealed")),
                    Some(_) => Ok(()),
                }
            }
            ClueAction::EndTurn => {
                if self.clue.is_none() {
                    return Err(Rejection::Illegal("wait for a clue before ending the turn"));
                }
                Ok(())
            }
        }
    }

    fn apply(&mut self, core: &mut GameCore, player: &PlayerId, action: ClueAction) {
        match action {
            ClueAction::GiveClue { word, number } => {
                let word = word.trim().to_uppercase();
                self.clue = Some(Clue {
                    word: word.clone(),
                    number,
                    guesses_remaining: number.saturating_add(1),
                });
                core.notice(GameNotice::ClueGiven {
                    team: self.current_team,
                    word,
                    number,
                });
                if let Some(agent) = self.lead_agent(core) {
                    core.set_turn(agent);
                }
            }

            ClueAction::GuessWord { position } => {
                let team = self.current_team;
                let Some(card) = self.board.get_mut(position) else {
                    return;
                };
                card.revealed = true;
                let kind = card.kind;
                let word = card.word.clone();
                if let Some(clue) = self.clue.as_mut() {
                    clue.guesses_remaining = clue.guesses_remaining.saturating_sub(1);
                }
                core.notice(GameNotice::CardRevealed {
                    position,
                    word,
                    kind,
                    guesser: player.clone(),
                    team,
                });

                if kind == CardKind::Assassin {
                    tracing::debug!(room = %core.room_code(), %team, "assassin revealed");
                    self.winner = Some(team.other());
                    return;
                }
                if let Some(owner) = kind.team() {
                    let side = self.side_mut(owner);
                    side.score += 1;
                    if side.score >= side.quota {
                        self.winner = Some(owner);
                        return;
                    }
                }

                let out_of_guesses = self.clue.as_ref().is_none_or(|c| c.guesses_remaining == 0);
                if kind.team() != Some(team) || out_of_guesses {
                    self.pass_turn(core);
                }
            }

            ClueAction::EndTurn => self.pass_turn(core),
        }
    }

    fn is_game_over(&self, _core: &GameCore) -> bool {
        self.winner.is_some()
    }

    fn calculate_result(&self, core: &GameCore) -> Option<GameResult> {
        let team = self.winner?;
        let players = self.side(team).members.clone();
        let scores = core
            .players()
            .iter()
            .map(|p| (p.user_id.clone(), i64::from(players.contains(&p.user_id))))
            .collect();
        Some(GameResult {
            winner: Winner::Team { team, players },
            scores,
            stats: Some(json!({
                "red_score": self.red.score,
                "blue_score": self.blue.score,
            })),
        })
    }

    fn project(&self, core: &GameCore, viewer: Option<&PlayerId>) -> ClueTeamView {
        let sees_all = viewer.is_none_or(|id| self.is_spymaster(id));
        let board = self
            .board
            .iter()
            .enumerate()
            .map(|(position, card)| CardView {
                position,
                word: card.word.clone(),
                kind: if card.revealed || sees_all {
                    card.kind.into()
                } else {
                    CellFace::Hidden
                },
                revealed: card.revealed,
            })
            .collect();

        let roster = |team: Team| -> Vec<MemberView> {
            self.side(team)
                .members
                .iter()
                .map(|id| MemberView {
                    player_id: id.clone(),
                    display_name: core.display_name(id),
                    role: self.role_of(id).unwrap_or(ClueRole::Agent),
                })
                .collect()
        };

        ClueTeamView {
            board,
            red_team: roster(Team::Red),
            blue_team: roster(Team::Blue),
            starting_team: self.starting_team,
            current_team: self.current_team,
            red_score: self.red.score,
            blue_score: self.blue.score,
            red_quota: self.red.quota,
            blue_quota: self.blue.quota,
            current_clue: self.clue.clone(),
            is_spymaster: viewer.is_some_and(|id| self.is_spymaster(id)),
            my_team: viewer.and_then(|id| self.team_of(id)),
            my_role: viewer.and_then(|id| self.role_of(id)),
            winner: self.winner,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    pub position: usize,
    pub word: String,
    pub kind: CellFace,
    pub revealed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    pub player_id: PlayerId,
    pub display_name: String,
    pub role: ClueRole,
}

/// Projection of a clue-team game. Card kinds are hidden from agents
/// until revealed; spymasters and the observer see the whole key.
#[derive(Debug, Clone, Serialize)]
pub struct ClueTeamView {
    pub board: Vec<CardView>,
    pub red_team: Vec<MemberView>,
    pub blue_team: Vec<MemberView>,
    pub starting_team: Team,
    pub current_team: Team,
    pub red_score: u32,
    pub blue_score: u32,
    pub red_quota: u32,
    pub blue_quota: u32,
    pub current_clue: Option<Clue>,
    pub is_spymaster: bool,
    pub my_team: Option<Team>,
    pub my_role: Option<ClueRole>,
    pub winner: Option<Team>,
}
