//! `GameCore`: the state every game shares, and the only handle a rule
//! set gets for changing it.
//!
//! Rule sets own their private data (dice, boards, wires). Everything the
//! engine itself reasons about (status, roster, turn pointer, outbox)
//! lives here, so the lifecycle rules are enforced in one place.

use partyroom_protocol::{GameKind, PlayerId, RoomCode};

use crate::{
    EndReason, GameEvent, GameId, GameNotice, GameResult, GameSettings, GameStatus, Player,
    PlayerStatus, Winner,
};

/// Shared state of one game instance.
#[derive(Debug)]
pub struct GameCore {
    pub(crate) id: GameId,
    pub(crate) room_code: RoomCode,
    pub(crate) kind: GameKind,
    pub(crate) status: GameStatus,
    pub(crate) initialized: bool,
    pub(crate) players: Vec<Player>,
    pub(crate) current_turn: Option<PlayerId>,
    pub(crate) winner: Option<Winner>,
    pub(crate) started_at: Option<u64>,
    pub(crate) finished_at: Option<u64>,
    pub(crate) settings: GameSettings,
    pub(crate) end_reason: Option<EndReason>,
    pub(crate) result: Option<GameResult>,
    pub(crate) outbox: Vec<GameEvent>,
}

impl GameCore {
    pub(crate) fn new(room_code: RoomCode, kind: GameKind, settings: GameSettings) -> Self {
        Self {
            id: GameId::next(),
            room_code,
            kind,
            status: GameStatus::Waiting,
            initialized: false,
            players: Vec::new(),
            current_turn: None,
            winner: None,
            started_at: None,
            finished_at: None,
            settings,
            end_reason: None,
            result: None,
            outbox: Vec::new(),
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// The roster, in seating order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.user_id == id)
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.user_id == id)
    }

    pub fn current_turn(&self) -> Option<&PlayerId> {
        self.current_turn.as_ref()
    }

    pub fn winner(&self) -> Option<&Winner> {
        self.winner.as_ref()
    }

    pub fn end_reason(&self) -> Option<&EndReason> {
        self.end_reason.as_ref()
    }

    pub fn is_active(&self, id: &PlayerId) -> bool {
        self.player(id).is_some_and(Player::is_active)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    pub fn display_name(&self, id: &PlayerId) -> String {
        self.player(id)
            .map(|p| p.display_name.clone())
            .unwrap_or_default()
    }

    // -- turn order --

    /// The next active player strictly after `from` in seating order,
    /// wrapping around. `from` itself is returned only when it is the sole
    /// active player. A `from` that is not seated yields the first active
    /// player.
    pub fn next_active_after(&self, from: &PlayerId) -> Option<PlayerId> {
        let n = self.players.len();
        let Some(start) = self.players.iter().position(|p| &p.user_id == from) else {
            return self.active_players().next().map(|p| p.user_id.clone());
        };
        (1..=n)
            .map(|step| &self.players[(start + step) % n])
            .find(|p| p.is_active())
            .map(|p| p.user_id.clone())
    }

    /// Shared turn-advancement rule: the active player after the current
    /// turn holder, or the first active player when nobody holds the turn.
    pub fn next_player(&self) -> Option<PlayerId> {
        match &self.current_turn {
            Some(current) => self.next_active_after(current),
            None => self.active_players().next().map(|p| p.user_id.clone()),
        }
    }

    /// Hands the turn to `player`, recording a `TurnChanged` event when
    /// the holder actually changes.
    ///
    /// Only active players can hold the turn; handing it to anyone else is
    /// ignored and logged.
    pub fn set_turn(&mut self, player: PlayerId) {
        if !self.is_active(&player) {
            tracing::warn!(
                room = %self.room_code,
                %player,
                "refusing to hand the turn to an inactive player"
            );
            return;
        }
        if self.current_turn.as_ref() == Some(&player) {
            return;
        }
        self.current_turn = Some(player.clone());
        self.emit(GameEvent::TurnChanged { player_id: player });
    }

    pub(crate) fn clear_turn(&mut self) {
        self.current_turn = None;
    }

    // -- roster effects --

    /// Marks a player eliminated. Their seat and data stay in place.
    pub fn eliminate(&mut self, id: &PlayerId) {
        let Some(player) = self.player_mut(id) else {
            return;
        };
        if player.status == PlayerStatus::Eliminated {
            return;
        }
        player.status = PlayerStatus::Eliminated;
        tracing::debug!(room = %self.room_code, player = %id, "player eliminated");
        self.emit(GameEvent::PlayerEliminated { player_id: id.clone() });
    }

    // -- outbox --

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.outbox.push(event);
    }

    /// Records a rule-set-specific notice.
    pub fn notice(&mut self, notice: GameNotice) {
        self.emit(GameEvent::Notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use partyroom_protocol::ConnectionId;

    use super::*;

    fn core_with(ids: &[&str]) -> GameCore {
        let mut core = GameCore::new(
            RoomCode::parse("TEST").unwrap(),
            GameKind::DiceBid,
            GameSettings::new(2, 6),
        );
        core.players = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Player::new(*id, id.to_uppercase(), ConnectionId(i as u64)))
            .collect();
        core
    }

    #[test]
    fn test_next_active_after_wraps_and_skips_inactive() {
        let mut core = core_with(&["a", "b", "c", "d"]);
        core.players[1].status = PlayerStatus::Eliminated;
        core.players[2].status = PlayerStatus::Disconnected;

        assert_eq!(core.next_active_after(&"a".into()), Some("d".into()));
        assert_eq!(core.next_active_after(&"d".into()), Some("a".into()));
        // An inactive starting point still moves forward from its seat.
        assert_eq!(core.next_active_after(&"b".into()), Some("d".into()));
    }

    #[test]
    fn test_next_active_after_sole_survivor_is_self() {
        let mut core = core_with(&["a", "b"]);
        core.players[1].status = PlayerStatus::Eliminated;
        assert_eq!(core.next_active_after(&"a".into()), Some("a".into()));
    }

    #[test]
    fn test_next_player_without_turn_is_first_active() {
        let mut core = core_with(&["a", "b", "c"]);
        core.players[0].status = PlayerStatus::Disconnected;
        assert_eq!(core.next_player(), Some("b".into()));
    }

    #[test]
    fn test_set_turn_emits_only_on_change() {
        let mut core = core_with(&["a", "b"]);
        core.set_turn("a".into());
        core.set_turn("a".into());
        core.set_turn("b".into());
        let turns = core
            .outbox
            .iter()
            .filter(|e| matches!(e, GameEvent::TurnChanged { .. }))
            .count();
        assert_eq!(turns, 2);
    }

    #[test]
    fn test_set_turn_ignores_inactive_player() {
        let mut core = core_with(&["a", "b"]);
        core.set_turn("a".into());
        core.players[1].status = PlayerStatus::Eliminated;
        core.set_turn("b".into());
        assert_eq!(core.current_turn(), Some(&"a".into()));
    }

    #[test]
    fn test_eliminate_is_recorded_once() {
        let mut core = core_with(&["a", "b"]);
        core.eliminate(&"b".into());
        core.eliminate(&"b".into());
        assert_eq!(core.players[1].status, PlayerStatus::Eliminated);
        assert_eq!(core.outbox.len(), 1);
        assert_eq!(core.active_count(), 1);
    }
}
