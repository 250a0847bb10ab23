//! Three bots play a dice-bidding game through `PartyServer`.
//!
//! Every bot only looks at its own projection: its own dice plus the
//! public counts. Ann's outbound feed is printed as JSON lines, which is
//! what a transport would put on that socket.
//!
//! Run with `RUST_LOG=debug cargo run -p dice-duel` to see the engine and
//! room logs as well.

use std::time::Duration;

use partyroom::prelude::*;
use serde_json::{Value, json};
use tokio::sync::mpsc;

const ROOM: &str = "DUEL";
const PLAYERS: [(&str, &str); 3] = [("ann", "Ann"), ("bob", "Bob"), ("cat", "Cat")];
const MAX_MOVES: usize = 500;

#[tokio::main]
async fn main() -> Result<(), PartyError> {
    init_tracing();

    let server = PartyServer::builder()
        .cleanup_delay(Duration::from_millis(200))
        .turn_timers(false)
        .build();

    let mut roster = Vec::new();
    let mut silent = Vec::new();
    let mut feed = None;
    for (i, (id, name)) in PLAYERS.iter().enumerate() {
        let (tx, rx) = mpsc::unbounded_channel();
        roster.push(RosterEntry::new(*id, *name, ConnectionId(i as u64), tx));
        if feed.is_none() {
            feed = Some(tokio::spawn(print_feed(server.clone(), rx)));
        } else {
            silent.push(rx);
        }
    }

    server.create_game(ROOM, GameKind::DiceBid, roster).await?;

    for _ in 0..MAX_MOVES {
        let observer = server.get_state(ROOM, None).await?;
        if observer["status"] == "finished" {
            break;
        }
        let Some(turn) = observer["current_turn"].as_str() else {
            break;
        };

        let view = server.get_state(ROOM, Some(turn)).await?;
        let (move_type, payload) = decide(&view);
        if !server.submit_move(ROOM, turn, move_type, payload).await? {
            server.submit_move(ROOM, turn, "challenge", Value::Null).await?;
        }
    }

    let final_state = server.get_state(ROOM, None).await?;
    if final_state["status"] != "finished" {
        server.end_game(ROOM, "move_limit").await?;
    }
    tracing::info!(winner = %final_state["winner"], "dice duel over");

    // The feed ends once the room is cleaned up and drops the feed sender.
    if let Some(feed) = feed {
        let _ = feed.await;
    }
    drop(silent);
    Ok(())
}

/// Prints every event on one player's channel until the room goes away.
async fn print_feed(server: PartyServer, mut rx: mpsc::UnboundedReceiver<ServerEvent>) {
    while let Some(event) = rx.recv().await {
        match server.encode(&event) {
            Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
            Err(e) => tracing::warn!(error = %e, "could not encode event"),
        }
    }
}

/// A cautious bidder: trusts its own dice plus a third of everyone
/// else's, challenges anything far above that, and calls exact when the
/// standing bid matches its estimate on its best face.
fn decide(view: &Value) -> (&'static str, Value) {
    let game = &view["game"];
    let dice: Vec<u64> = game["my_dice"]
        .as_array()
        .map(|d| d.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default();
    let total = game["total_dice"].as_u64().unwrap_or(0);

    let (face, mine) = (2..=6u64)
        .map(|f| (f, dice.iter().filter(|&&d| d == f || d == 1).count() as u64))
        .max_by_key(|&(_, count)| count)
        .unwrap_or((2, 0));
    let expected = mine + total.saturating_sub(dice.len() as u64) / 3;

    let bid = &game["current_bid"];
    if bid.is_null() {
        return ("bid", json!({ "quantity": expected.max(1), "faceValue": face }));
    }

    let quantity = bid["quantity"].as_u64().unwrap_or(0);
    let current_face = bid["face_value"].as_u64().unwrap_or(0);
    if quantity > expected + 1 {
        ("challenge", Value::Null)
    } else if quantity == expected && current_face == face {
        ("exact", Value::Null)
    } else if face > current_face {
        ("bid", json!({ "quantity": quantity, "faceValue": face }))
    } else {
        ("bid", json!({ "quantity": quantity + 1, "faceValue": face }))
    }
}
