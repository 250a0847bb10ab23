//! Dice-Bid: a round-based dice bluffing game.
//!
//! Every active player holds a private hand of dice. Players take turns
//! raising a bid ("there are at least N dice showing F on the table"),
//! until someone calls the last bid a lie (`challenge`) or claims it is
//! exactly right (`exact`). Ones are wild and count toward every face.
//! Losing your last die eliminates you; the last player holding dice wins.

use std::collections::{BTreeMap, HashMap};

use partyroom_protocol::{GameKind, PlayerId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    EngineError, GameCore, GameNotice, GameResult, GameRules, GameSettings, Rejection, Winner,
};

const MIN_FACE: u8 = 1;
const MAX_FACE: u8 = 6;
/// The wildcard face.
const WILD: u8 = 1;

/// Game-specific configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceBidConfig {
    pub dice_per_player: usize,
}

impl Default for DiceBidConfig {
    fn default() -> Self {
        Self { dice_per_player: 5 }
    }
}

/// The standing bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bid {
    pub quantity: u32,
    pub face_value: u8,
    pub bidder: PlayerId,
}

/// Moves understood by [`DiceBid`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiceAction {
    Bid {
        quantity: u32,
        #[serde(alias = "faceValue", alias = "dieValue")]
        face_value: u8,
    },
    Challenge,
    Exact,
}

/// One entry of the public dice-count table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiceCount {
    pub player_id: PlayerId,
    pub count: usize,
}

/// Projection of a dice-bid game.
#[derive(Debug, Clone, Serialize)]
pub struct DiceBidView {
    pub round: u32,
    pub current_bid: Option<Bid>,
    pub total_dice: usize,
    pub player_dice_count: Vec<DiceCount>,
    /// The viewer's own dice. Absent for the observer view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_dice: Option<Vec<u8>>,
    /// Every hand. Only in the observer view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hands: Option<BTreeMap<PlayerId, Vec<u8>>>,
}

/// Rules and private state of a dice-bid game.
pub struct DiceBid {
    config: DiceBidConfig,
    rng: StdRng,
    hands: HashMap<PlayerId, Vec<u8>>,
    current_bid: Option<Bid>,
    round: u32,
}

impl DiceBid {
    pub fn new(config: DiceBidConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Deterministic dice, for tests and replays.
    pub fn with_seed(config: DiceBidConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: DiceBidConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            hands: HashMap::new(),
            current_bid: None,
            round: 0,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn current_bid(&self) -> Option<&Bid> {
        self.current_bid.as_ref()
    }

    pub fn hand(&self, player: &PlayerId) -> Option<&[u8]> {
        self.hands.get(player).map(Vec::as_slice)
    }

    /// Dice held by active players.
    pub fn total_dice(&self, core: &GameCore) -> usize {
        core.active_players()
            .filter_map(|p| self.hands.get(&p.user_id))
            .map(Vec::len)
            .sum()
    }

    /// Dice across all active hands that show `face` or the wildcard.
    pub fn count_matching(&self, core: &GameCore, face: u8) -> u32 {
        core.active_players()
            .filter_map(|p| self.hands.get(&p.user_id))
            .flatten()
            .filter(|d| **d == face || **d == WILD)
            .count() as u32
    }

    fn start_round(&mut self, core: &mut GameCore, first: PlayerId) {
        self.round += 1;
        self.current_bid = None;

        for player in core.active_players() {
            if let Some(hand) = self.hands.get_mut(&player.user_id) {
                for die in hand.iter_mut() {
                    *die = self.rng.random_range(MIN_FACE..=MAX_FACE);
                }
            }
        }

        tracing::debug!(room = %core.room_code(), round = self.round, first = %first, "round started");
        core.set_turn(first.clone());
        core.notice(GameNotice::RoundStarted {
            round: self.round,
            first_player: first,
        });
    }

    /// Begins the next round with `preferred` to act first, or the next
    /// active player after them if they are out. Nothing happens once the
    /// game is down to one player.
    fn next_round(&mut self, core: &mut GameCore, preferred: &PlayerId) {
        if core.active_count() <= 1 {
            return;
        }
        let first = if core.is_active(preferred) {
            Some(preferred.clone())
        } else {
            core.next_active_after(preferred)
        };
        if let Some(first) = first {
            self.start_round(core, first);
        }
    }

    fn take_die(&mut self, core: &mut GameCore, player: &PlayerId) {
        let Some(hand) = self.hands.get_mut(player) else {
            return;
        };
        hand.pop();
        if hand.is_empty() {
            core.eliminate(player);
        }
    }
}

impl GameRules for DiceBid {
    type Action = DiceAction;
    type View = DiceBidView;
    const KIND: GameKind = GameKind::DiceBid;
    const MOVES: &'static [&'static str] = &["bid", "challenge", "exact"];

    fn default_settings() -> GameSettings {
        GameSettings::new(2, 6).with_turn_time_limit(60)
    }

    fn on_start(&mut self, core: &mut GameCore) -> Result<(), EngineError> {
        if self.config.dice_per_player == 0 {
            return Err(EngineError::InvalidConfig(
                "dice_per_player must be at least 1".into(),
            ));
        }
        let first = core
            .active_players()
            .next()
            .map(|p| p.user_id.clone())
            .ok_or(EngineError::NotEnoughPlayers { needed: 2, active: 0 })?;

        let n = self.config.dice_per_player;
        self.hands = core
            .players()
            .iter()
            .map(|p| (p.user_id.clone(), vec![WILD; n]))
            .collect();
        self.round = 0;
        self.start_round(core, first);
        Ok(())
    }

    fn validate(
        &self,
        _core: &GameCore,
        _player: &PlayerId,
        action: &DiceAction,
    ) -> Result<(), Rejection> {
        match action {
            DiceAction::Bid {
                quantity,
                face_value,
            } => {
                if !(MIN_FACE..=MAX_FACE).contains(face_value) {
                    return Err(Rejection::Illegal("face value must be between 1 and 6"));
                }
                if *quantity < 1 {
                    return Err(Rejection::Illegal("quantity must be at least 1"));
                }
                if let Some(current) = &self.current_bid {
                    let raises = *quantity > current.quantity
                        || (*quantity == current.quantity && *face_value > current.face_value);
                    if !raises {
                        return Err(Rejection::Illegal("bid must raise the current bid"));
                    }
                }
                Ok(())
            }
            DiceAction::Challenge | DiceAction::Exact => {
                if self.current_bid.is_none() {
                    return Err(Rejection::Illegal("there is no bid to call"));
                }
                Ok(())
            }
        }
    }

    fn apply(&mut self, core: &mut GameCore, player: &PlayerId, action: DiceAction) {
        match action {
            DiceAction::Bid {
                quantity,
                face_value,
            } => {
                self.current_bid = Some(Bid {
                    quantity,
                    face_value,
                    bidder: player.clone(),
                });
                if let Some(next) = core.next_player() {
                    core.set_turn(next);
                }
                let next_player = core.current_turn().cloned();
                core.notice(GameNotice::BidMade {
                    player_id: player.clone(),
                    quantity,
                    face_value,
                    next_player,
                });
            }

            DiceAction::Challenge => {
                let Some(bid) = self.current_bid.take() else {
                    return;
                };
                let actual_count = self.count_matching(core, bid.face_value);
                let success = actual_count < bid.quantity;
                let loser = if success {
                    bid.bidder.clone()
                } else {
                    player.clone()
                };

                tracing::debug!(
                    room = %core.room_code(),
                    challenger = %player,
                    actual_count,
                    success,
                    "challenge resolved"
                );
                core.notice(GameNotice::ChallengeResolved {
                    challenger: player.clone(),
                    bidder: bid.bidder,
                    quantity: bid.quantity,
                    face_value: bid.face_value,
                    actual_count,
                    success,
                    loser: loser.clone(),
                });
                self.take_die(core, &loser);
                self.next_round(core, &loser);
            }

            DiceAction::Exact => {
                let Some(bid) = self.current_bid.take() else {
                    return;
                };
                let actual_count = self.count_matching(core, bid.face_value);
                let success = actual_count == bid.quantity;
                let losers: Vec<PlayerId> = if success {
                    core.active_players()
                        .map(|p| p.user_id.clone())
                        .filter(|id| id != player)
                        .collect()
                } else {
                    vec![player.clone()]
                };

                tracing::debug!(
                    room = %core.room_code(),
                    caller = %player,
                    actual_count,
                    success,
                    "exact call resolved"
                );
                core.notice(GameNotice::ExactResolved {
                    caller: player.clone(),
                    quantity: bid.quantity,
                    face_value: bid.face_value,
                    actual_count,
                    success,
                    losers: losers.clone(),
                });
                for loser in &losers {
                    self.take_die(core, loser);
                }
                self.next_round(core, player);
            }
        }
    }

    fn is_game_over(&self, core: &GameCore) -> bool {
        core.active_count() <= 1
    }

    fn calculate_result(&self, core: &GameCore) -> Option<GameResult> {
        let mut active = core.active_players();
        let winner = active.next()?;
        if active.next().is_some() {
            return None;
        }

        let scores = core
            .players()
            .iter()
            .map(|p| {
                let dice = self.hands.get(&p.user_id).map_or(0, Vec::len);
                (p.user_id.clone(), dice as i64)
            })
            .collect();
        Some(GameResult {
            winner: Winner::Player {
                player_id: winner.user_id.clone(),
            },
            scores,
            stats: Some(json!({ "rounds": self.round })),
        })
    }

    fn project(&self, core: &GameCore, viewer: Option<&PlayerId>) -> DiceBidView {
        let player_dice_count = core
            .players()
            .iter()
            .map(|p| DiceCount {
                player_id: p.user_id.clone(),
                count: self.hands.get(&p.user_id).map_or(0, Vec::len),
            })
            .collect();

        let (my_dice, hands) = match viewer {
            Some(id) => (self.hands.get(id).cloned(), None),
            None => (
                None,
                Some(
                    self.hands
                        .iter()
                        .map(|(id, hand)| (id.clone(), hand.clone()))
                        .collect(),
                ),
            ),
        };

        DiceBidView {
            round: self.round,
            current_bid: self.current_bid.clone(),
            total_dice: self.total_dice(core),
            player_dice_count,
            my_dice,
            hands,
        }
    }
}
