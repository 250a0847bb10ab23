//! Room actor: an isolated Tokio task that owns one game engine.
//!
//! Every room runs in its own task and is reached only through an mpsc
//! channel, so moves for one room are applied strictly one at a time in
//! arrival order while different rooms proceed in parallel. The actor
//! drains the engine's outbox after each command and turns every domain
//! event into per-recipient [`ServerEvent`]s.

use std::collections::HashMap;
use std::ops::ControlFlow;

use partyroom_engine::{
    EndReason, EngineError, GameEngine, GameEvent, GameStatus, Move, Rejection,
};
use partyroom_protocol::{ConnectionId, GameKind, PlayerId, Recipient, RoomCode, ServerEvent};
use partyroom_timer::{Countdown, Expiry};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use crate::{ManagerConfig, RoomError};

/// Channel sender for delivering outbound events to one player's
/// connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in most variants is the reply channel.
pub(crate) enum RoomCommand {
    SubmitMove {
        mv: Move,
        reply: oneshot::Sender<Result<(), Rejection>>,
    },
    Pause {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Resume {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    End {
        reason: EndReason,
        reply: oneshot::Sender<()>,
    },
    GetState {
        viewer: Option<PlayerId>,
        reply: oneshot::Sender<Value>,
    },
    /// Replies `false` if the player is not seated.
    Disconnect {
        player_id: PlayerId,
        reply: oneshot::Sender<bool>,
    },
    /// Replies `false` if the player was not disconnected.
    Reconnect {
        player_id: PlayerId,
        connection: ConnectionId,
        sender: PlayerSender,
        reply: oneshot::Sender<bool>,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SubmitMove { .. } => "SubmitMove",
            Self::Pause { .. } => "Pause",
            Self::Resume { .. } => "Resume",
            Self::End { .. } => "End",
            Self::GetState { .. } => "GetState",
            Self::Disconnect { .. } => "Disconnect",
            Self::Reconnect { .. } => "Reconnect",
            Self::Info { .. } => "Info",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

/// A snapshot of room metadata (not the game projection itself).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub kind: GameKind,
    pub status: GameStatus,
    /// Seated players, whatever their status.
    pub player_count: usize,
    /// Players with a live outbound channel.
    pub connected: usize,
    pub current_turn: Option<PlayerId>,
    pub moves: usize,
    /// `true` once the game has finished and teardown is scheduled.
    pub closing: bool,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it wraps an `mpsc::Sender`. The
/// [`GameManager`](crate::GameManager) holds one per room code.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    kind: GameKind,
    player_count: usize,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn kind(&self) -> GameKind {
        self.kind
    }

    /// Seats bound at creation. Rosters never grow once a room exists.
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// `true` once the actor has stopped (shutdown or cleanup).
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Routes a move through the engine's pipeline.
    ///
    /// A refused move comes back as [`RoomError::Rejected`]; the submitter
    /// has already been sent a `move_rejected` event by then.
    pub async fn submit_move(&self, mv: Move) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SubmitMove { mv, reply })
            .await?
            .map_err(RoomError::from)
    }

    pub async fn pause(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Pause { reply })
            .await?
            .map_err(RoomError::from)
    }

    pub async fn resume(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Resume { reply })
            .await?
            .map_err(RoomError::from)
    }

    /// Ends the game. Ending a finished game changes nothing.
    pub async fn end(&self, reason: EndReason) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::End { reason, reply }).await
    }

    /// The projection for `viewer`, or the full observer view for `None`.
    pub async fn state(&self, viewer: Option<PlayerId>) -> Result<Value, RoomError> {
        self.request(|reply| RoomCommand::GetState { viewer, reply })
            .await
    }

    /// Marks a player's connection as gone. Their seat is kept.
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), RoomError> {
        let seated = self
            .request(|reply| RoomCommand::Disconnect {
                player_id: player_id.clone(),
                reply,
            })
            .await?;
        if seated {
            Ok(())
        } else {
            Err(RoomError::NotInRoom(player_id, self.code.clone()))
        }
    }

    /// Restores a disconnected player on a new connection. Returns `false`
    /// when the player was not disconnected, in which case nothing changes.
    pub async fn reconnect(
        &self,
        player_id: PlayerId,
        connection: ConnectionId,
        sender: PlayerSender,
    ) -> Result<bool, RoomError> {
        self.request(|reply| RoomCommand::Reconnect {
            player_id,
            connection,
            sender,
            reply,
        })
        .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Tells the room to stop immediately, skipping the grace period.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Sends a command and waits on its reply channel.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    code: RoomCode,
    engine: Box<dyn GameEngine>,
    /// Per-player outbound channels. Absent while disconnected.
    senders: HashMap<PlayerId, PlayerSender>,
    config: ManagerConfig,
    turn_timer: Countdown,
    cleanup: Countdown,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown, cleanup, or every handle is
    /// dropped.
    async fn run(mut self) {
        info!(room = %self.code, kind = %self.engine.kind(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => {
                        if self.handle(cmd).is_break() {
                            info!(room = %self.code, "room shutting down");
                            break;
                        }
                    }
                    None => break,
                },
                expiry = self.turn_timer.wait() => self.on_turn_timeout(expiry),
                _ = self.cleanup.wait() => {
                    info!(room = %self.code, "finished game cleaned up");
                    break;
                }
            }
        }

        info!(room = %self.code, "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) -> ControlFlow<()> {
        trace!(room = %self.code, command = ?cmd, "room command");
        match cmd {
            RoomCommand::SubmitMove { mv, reply } => {
                let result = self.handle_move(mv);
                let _ = reply.send(result);
            }
            RoomCommand::Pause { reply } => {
                let result = self.engine.pause();
                self.flush();
                let _ = reply.send(result);
            }
            RoomCommand::Resume { reply } => {
                let result = self.engine.resume();
                self.flush();
                let _ = reply.send(result);
            }
            RoomCommand::End { reason, reply } => {
                self.engine.end(reason);
                self.flush();
                let _ = reply.send(());
            }
            RoomCommand::GetState { viewer, reply } => {
                let _ = reply.send(self.engine.public_state(viewer.as_ref()));
            }
            RoomCommand::Disconnect { player_id, reply } => {
                let _ = reply.send(self.handle_disconnect(&player_id));
            }
            RoomCommand::Reconnect {
                player_id,
                connection,
                sender,
                reply,
            } => {
                let _ = reply.send(self.handle_reconnect(player_id, connection, sender));
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn handle_move(&mut self, mv: Move) -> Result<(), Rejection> {
        let player_id = mv.player_id.clone();
        let move_type = mv.move_type.clone();

        if let Err(rejection) = self.engine.process_move(mv) {
            debug!(
                room = %self.code,
                player = %player_id,
                %move_type,
                reason = %rejection,
                "move rejected"
            );
            let reason = rejection.to_string();
            self.broadcast(&Recipient::Player(player_id), |_| ServerEvent::MoveRejected {
                room: self.code.clone(),
                move_type: move_type.clone(),
                reason: reason.clone(),
            });
            return Err(rejection);
        }

        self.flush();
        Ok(())
    }

    fn handle_disconnect(&mut self, player_id: &PlayerId) -> bool {
        if !self.engine.players().iter().any(|p| &p.user_id == player_id) {
            return false;
        }
        self.senders.remove(player_id);
        self.engine.remove_player(player_id);
        self.flush();
        true
    }

    fn handle_reconnect(
        &mut self,
        player_id: PlayerId,
        connection: ConnectionId,
        sender: PlayerSender,
    ) -> bool {
        if !self.engine.reconnect_player(&player_id, connection) {
            debug!(room = %self.code, player = %player_id, "reconnect ignored");
            return false;
        }
        self.senders.insert(player_id, sender);
        self.flush();
        true
    }

    fn on_turn_timeout(&mut self, expiry: Expiry) {
        let Some(holder) = self.engine.current_turn().cloned() else {
            return;
        };
        info!(
            room = %self.code,
            player = %holder,
            late_ms = expiry.late_by.as_millis() as u64,
            "turn timed out"
        );
        self.broadcast(&Recipient::All, |_| ServerEvent::TurnTimedOut {
            room: self.code.clone(),
            player_id: holder.clone(),
        });
    }

    /// Drains the engine's outbox and publishes every event.
    ///
    /// Projections are computed once the whole command has been applied,
    /// so every event of one batch carries the same post-command state.
    fn flush(&mut self) {
        for event in self.engine.take_events() {
            self.publish(event);
        }
    }

    fn publish(&mut self, event: GameEvent) {
        let room = self.code.clone();
        match event {
            GameEvent::Initialized { players } => {
                info!(room = %room, kind = %self.engine.kind(), players, "game created");
                let kind = self.engine.kind();
                self.broadcast(&Recipient::All, |pid| ServerEvent::GameCreated {
                    room: room.clone(),
                    kind,
                    state: self.state_for(pid),
                });
            }
            GameEvent::Started => {
                self.broadcast(&Recipient::All, |pid| ServerEvent::GameStarted {
                    room: room.clone(),
                    state: self.state_for(pid),
                });
            }
            GameEvent::Paused => {
                self.turn_timer.pause();
                self.broadcast(&Recipient::All, |pid| ServerEvent::GamePaused {
                    room: room.clone(),
                    state: self.state_for(pid),
                });
            }
            GameEvent::Resumed => {
                self.turn_timer.resume();
                self.broadcast(&Recipient::All, |pid| ServerEvent::GameResumed {
                    room: room.clone(),
                    state: self.state_for(pid),
                });
            }
            GameEvent::PlayerAdded { player_id } | GameEvent::PlayerRemoved { player_id } => {
                // Rosters are bound before the room exists.
                trace!(room = %room, player = %player_id, "roster change ignored");
            }
            GameEvent::PlayerDisconnected { player_id } => {
                self.broadcast(&Recipient::AllExcept(player_id.clone()), |pid| {
                    ServerEvent::PlayerDisconnected {
                        room: room.clone(),
                        player_id: player_id.clone(),
                        state: self.state_for(pid),
                    }
                });
            }
            GameEvent::PlayerReconnected { player_id } => {
                self.broadcast(&Recipient::All, |pid| ServerEvent::PlayerReconnected {
                    room: room.clone(),
                    player_id: player_id.clone(),
                    state: self.state_for(pid),
                });
            }
            GameEvent::MoveApplied { mv } => {
                self.broadcast(&Recipient::All, |pid| ServerEvent::GameStateUpdated {
                    room: room.clone(),
                    player_id: mv.player_id.clone(),
                    move_type: mv.move_type.clone(),
                    state: self.state_for(pid),
                });
            }
            GameEvent::TurnChanged { player_id } => {
                self.arm_turn_timer();
                self.broadcast(&Recipient::All, |pid| ServerEvent::TurnChanged {
                    room: room.clone(),
                    player_id: player_id.clone(),
                    state: self.state_for(pid),
                });
            }
            GameEvent::PlayerEliminated { player_id } => {
                self.broadcast(&Recipient::All, |_| ServerEvent::PlayerEliminated {
                    room: room.clone(),
                    player_id: player_id.clone(),
                });
            }
            GameEvent::Ended { reason, result } => {
                self.turn_timer.cancel();
                self.cleanup.arm(self.config.cleanup_delay);
                let result = serde_json::to_value(&result).unwrap_or_default();
                let reason = reason.to_string();
                self.broadcast(&Recipient::All, |pid| ServerEvent::GameEnded {
                    room: room.clone(),
                    reason: reason.clone(),
                    result: result.clone(),
                    state: self.state_for(pid),
                });
            }
            GameEvent::Notice(notice) => {
                let notice = serde_json::to_value(&notice).unwrap_or_default();
                self.broadcast(&Recipient::All, |_| ServerEvent::GameNotice {
                    room: room.clone(),
                    notice: notice.clone(),
                });
            }
        }
    }

    /// Restarts the turn countdown for a new turn holder. A countdown
    /// armed while the game is paused starts out frozen.
    fn arm_turn_timer(&mut self) {
        if !self.config.turn_timers || !self.engine.status().is_live() {
            return;
        }
        match self.engine.settings().turn_time_limit() {
            Some(limit) => {
                self.turn_timer.arm(limit);
                if self.engine.status() == GameStatus::Paused {
                    self.turn_timer.pause();
                }
            }
            None => self.turn_timer.cancel(),
        }
    }

    fn state_for(&self, player: &PlayerId) -> Value {
        self.engine.public_state(Some(player))
    }

    /// Sends one event per connected recipient, in seating order. Events
    /// for a player whose receiver is gone are dropped.
    fn broadcast(&self, to: &Recipient, make: impl Fn(&PlayerId) -> ServerEvent) {
        for player in self.engine.players() {
            let pid = &player.user_id;
            if !to.includes(pid) {
                continue;
            }
            if let Some(sender) = self.senders.get(pid) {
                let _ = sender.send(make(pid));
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            kind: self.engine.kind(),
            status: self.engine.status(),
            player_count: self.engine.players().len(),
            connected: self.senders.len(),
            current_turn: self.engine.current_turn().cloned(),
            moves: self.engine.move_log().len(),
            closing: self.cleanup.is_armed(),
        }
    }
}

/// Spawns a room actor for an engine that has already been initialized
/// and started, and returns a handle to it.
///
/// The events produced by that setup are published before the actor task
/// is spawned, so every roster member has `game_created` and
/// `game_started` queued by the time this returns.
pub(crate) fn spawn_room(
    engine: Box<dyn GameEngine>,
    senders: HashMap<PlayerId, PlayerSender>,
    config: ManagerConfig,
) -> RoomHandle {
    let code = engine.room_code().clone();
    let kind = engine.kind();
    let player_count = engine.players().len();
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let mut actor = RoomActor {
        code: code.clone(),
        engine,
        senders,
        config,
        turn_timer: Countdown::new("turn"),
        cleanup: Countdown::new("cleanup"),
        receiver: rx,
    };
    actor.flush();

    tokio::spawn(actor.run());

    RoomHandle {
        code,
        kind,
        player_count,
        sender: tx,
    }
}
