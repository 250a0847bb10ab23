//! End-to-end tests through `PartyServer`, the way a dispatch layer uses it.

use std::time::Duration;

use partyroom::prelude::*;
use partyroom::room::RoomError;
use serde_json::{Value, json};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

fn roster(n: usize) -> (Vec<RosterEntry>, Vec<Inbox>) {
    (0..n)
        .map(|i| {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                RosterEntry::new(format!("p{i}"), format!("Player {i}"), ConnectionId(i as u64), tx),
                rx,
            )
        })
        .unzip()
}

fn drain(rx: &mut Inbox) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// The member of `team` holding `role`, read from the observer view.
fn member(game: &Value, team: &str, role: &str) -> String {
    game[format!("{team}_team")]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["role"] == role)
        .and_then(|m| m["player_id"].as_str())
        .unwrap()
        .to_string()
}

// =========================================================================
// Addressing
// =========================================================================

#[tokio::test]
async fn test_room_codes_are_case_insensitive() {
    let server = PartyServer::default();
    let (entries, _inboxes) = roster(2);
    let handle = server.create_game("xy9z", GameKind::DiceBid, entries).await.unwrap();
    assert_eq!(handle.code().as_str(), "XY9Z");

    assert!(server.has_game("XY9Z").await);
    assert!(server.has_game(" xy9z ").await);
    let state = server.get_state("Xy9Z", Some("p0")).await.unwrap();
    assert_eq!(state["room_code"], "XY9Z");
}

#[tokio::test]
async fn test_malformed_room_code_is_a_protocol_error() {
    let server = PartyServer::default();
    let err = server.pause_game("toolong").await.unwrap_err();
    assert!(matches!(err, PartyError::Protocol(_)));
    assert!(!server.has_game("??").await);
}

#[tokio::test]
async fn test_missing_room_is_a_room_error() {
    let server = PartyServer::default();
    let err = server
        .submit_move("GONE", "p0", "bid", Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, PartyError::Room(RoomError::NotFound(_))));
}

#[tokio::test]
async fn test_open_room_draws_a_code() {
    let server = PartyServer::default();
    let (entries, _inboxes) = roster(4);
    let handle = server.open_room(GameKind::WireCut, entries).await.unwrap();
    assert!(server.has_game(handle.code().as_str()).await);

    let stats = server.stats().await;
    assert_eq!(stats.active_games, 1);
    assert_eq!(stats.total_players, 4);
}

// =========================================================================
// Moves
// =========================================================================

#[tokio::test]
async fn test_submit_move_reports_acceptance_as_bool() {
    let server = PartyServer::default();
    let (entries, mut inboxes) = roster(2);
    server.create_game("BOOL", GameKind::DiceBid, entries).await.unwrap();
    drain(&mut inboxes[1]);

    let first = json!({ "quantity": 2, "faceValue": 3 });
    assert!(!server.submit_move("BOOL", "p1", "bid", first.clone()).await.unwrap());
    assert_eq!(drain(&mut inboxes[1])[0].name(), "move_rejected");

    assert!(server.submit_move("BOOL", "p0", "bid", first.clone()).await.unwrap());
    // Same bid again is not a raise.
    assert!(!server.submit_move("BOOL", "p1", "bid", first).await.unwrap());
    assert!(
        server
            .submit_move("BOOL", "p1", "bid", json!({ "quantity": 2, "dieValue": 4 }))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_clue_team_game_played_to_quota() {
    let server = PartyServer::default();
    let (entries, mut inboxes) = roster(4);
    server.create_game("WORD", GameKind::ClueTeam, entries).await.unwrap();

    let observer = server.get_state("WORD", None).await.unwrap();
    let game = &observer["game"];
    let team = game["current_team"].as_str().unwrap().to_string();
    assert_eq!(game["starting_team"], team.as_str());
    let spymaster = member(game, &team, "spymaster");
    let agent = member(game, &team, "agent");
    let targets: Vec<u64> = game["board"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["kind"] == team.as_str())
        .map(|c| c["position"].as_u64().unwrap())
        .collect();
    assert_eq!(targets.len(), 9);

    // Agents see no key; the spymaster sees all of it.
    let agent_view = server.get_state("WORD", Some(&agent)).await.unwrap();
    assert!(
        agent_view["game"]["board"]
            .as_array()
            .unwrap()
            .iter()
            .all(|c| c["kind"] == "hidden")
    );
    let spy_view = server.get_state("WORD", Some(&spymaster)).await.unwrap();
    assert_eq!(spy_view["game"]["is_spymaster"], true);

    // Only the spymaster gives clues.
    let clue = json!({ "word": "ocean", "number": 9 });
    assert!(!server.submit_move("WORD", &agent, "give_clue", clue.clone()).await.unwrap());
    assert!(server.submit_move("WORD", &spymaster, "give_clue", clue).await.unwrap());

    // Spymasters never guess.
    let first = json!({ "position": targets[0] });
    assert!(!server.submit_move("WORD", &spymaster, "guess_word", first).await.unwrap());

    for position in &targets {
        let guess = json!({ "position": position });
        assert!(server.submit_move("WORD", &agent, "guess_word", guess).await.unwrap());
    }

    let final_state = server.get_state("WORD", None).await.unwrap();
    assert_eq!(final_state["status"], "finished");
    assert_eq!(final_state["winner"]["kind"], "team");
    assert_eq!(final_state["winner"]["team"], team.as_str());

    for inbox in &mut inboxes {
        let events = drain(inbox);
        let Some(ServerEvent::GameEnded { reason, result, .. }) = events.last() else {
            panic!("every player should see game_ended last");
        };
        assert_eq!(reason, "game_over");
        assert_eq!(result["winner"]["team"], team.as_str());
    }
}

#[tokio::test]
async fn test_wire_cut_reveal_then_own_wires_only() {
    let server = PartyServer::default();
    let (entries, mut inboxes) = roster(4);
    server.create_game("WIRE", GameKind::WireCut, entries).await.unwrap();

    for (i, id) in ["p0", "p1", "p2", "p3"].iter().enumerate() {
        let phase = server.get_state("WIRE", None).await.unwrap()["game"]["phase"].clone();
        assert_eq!(phase, "role-reveal", "before ack {i}");
        assert!(server.submit_move("WIRE", id, "acknowledge_role", Value::Null).await.unwrap());
    }
    let observer = server.get_state("WIRE", None).await.unwrap();
    assert_eq!(observer["game"]["phase"], "playing");

    let holder = observer["current_turn"].as_str().unwrap().to_string();
    let seat = observer["game"]["seats"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["player_id"] == holder.as_str())
        .unwrap()
        .clone();
    let other = if holder == "p0" { "p1" } else { "p0" };

    // Even the turn holder may not cut someone else's wire.
    let foreign = json!({ "playerId": other, "wireIndex": 0 });
    assert!(!server.submit_move("WIRE", &holder, "cut_wire", foreign).await.unwrap());

    let safe = seat["wires"]
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["kind"] == "safe")
        .and_then(|w| w["index"].as_u64())
        .unwrap();
    let own = json!({ "playerId": holder, "wireIndex": safe });
    assert!(server.submit_move("WIRE", &holder, "cut_wire", own).await.unwrap());

    let after = server.get_state("WIRE", None).await.unwrap();
    assert_eq!(after["game"]["cuts"], 1);
    assert_eq!(after["status"], "in_progress");
    assert_ne!(after["current_turn"], holder.as_str());

    // Nobody learns another player's role from the broadcast.
    for (i, inbox) in inboxes.iter_mut().enumerate() {
        for event in drain(inbox) {
            if let ServerEvent::GameStateUpdated { state, .. } = event {
                for (j, s) in state["game"]["seats"].as_array().unwrap().iter().enumerate() {
                    assert_eq!(s["role"].is_null(), i != j);
                }
            }
        }
    }
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_end_game_then_cleanup_with_configured_delay() {
    let server = PartyServer::builder()
        .cleanup_delay(Duration::from_secs(2))
        .build();
    let (entries, _inboxes) = roster(2);
    server.create_game("BYE1", GameKind::DiceBid, entries).await.unwrap();

    server.end_game("BYE1", "host_left").await.unwrap();
    let info = server.room_info("BYE1").await.unwrap();
    assert_eq!(info.status, GameStatus::Finished);
    assert!(info.closing);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!server.has_game("BYE1").await);
    assert_eq!(server.stats().await.active_games, 0);
}

#[tokio::test]
async fn test_pause_and_resume_through_server() {
    let server = PartyServer::default();
    let (entries, _inboxes) = roster(3);
    server.create_game("HOLD", GameKind::DiceBid, entries).await.unwrap();

    server.pause_game("HOLD").await.unwrap();
    assert!(matches!(
        server.resume_game("HOLD").await,
        Ok(())
    ));
    assert!(matches!(
        server.resume_game("HOLD").await,
        Err(PartyError::Room(RoomError::Engine(_)))
    ));
}

#[tokio::test]
async fn test_reconnect_through_server() {
    let server = PartyServer::default();
    let (entries, _inboxes) = roster(3);
    server.create_game("BACK", GameKind::DiceBid, entries).await.unwrap();

    server.player_disconnected("BACK", "p1").await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    assert!(server.player_reconnected("BACK", "p1", ConnectionId(77), tx).await.unwrap());
    assert_eq!(rx.recv().await.unwrap().name(), "player_reconnected");
}

#[tokio::test]
async fn test_encode_uses_json_with_type_tag() {
    let server = PartyServer::default();
    let event = ServerEvent::TurnTimedOut {
        room: RoomCode::parse("ABCD").unwrap(),
        player_id: PlayerId::from("p0"),
    };
    let bytes = server.encode(&event).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value, json!({ "type": "turn_timed_out", "room": "ABCD", "player_id": "p0" }));
}
