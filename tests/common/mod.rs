//! Scripted Arbiter for session and driver tests.

#![allow(dead_code)]

use expanding_nim::protocol::Frame;
use expanding_nim::{PlayerOrder, Session, Transport};
use serde_json::{Value, json};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;

/// Builds a frame from a `json!` object literal.
pub fn frame(value: Value) -> Frame {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

/// Connected pair: (client transport, Arbiter transport).
pub fn transport_pair() -> (Transport<DuplexStream>, Transport<DuplexStream>) {
    let (client, arbiter) = tokio::io::duplex(64 * 1024);
    (Transport::new(client), Transport::new(arbiter))
}

/// Default handshake reply used by most tests.
pub fn standard_params() -> Frame {
    frame(json!({
        "init_stones": 10,
        "init_resets": 2,
        "init_max": 3,
        "game_time": 60
    }))
}

/// Status after a move in a running game.
pub fn running(stones_left: u32, current_max: u32, reset_used: bool, stones_removed: u32) -> Frame {
    frame(json!({
        "finished": false,
        "stones_left": stones_left,
        "current_max": current_max,
        "reset_used": reset_used,
        "stones_removed": stones_removed
    }))
}

/// Terminal status.
pub fn finished(stones_left: u32, winner: u8, reason: &str) -> Frame {
    frame(json!({
        "finished": true,
        "stones_left": stones_left,
        "winner": winner,
        "reason": reason
    }))
}

/// Performs the handshake against an Arbiter that answers `params`, and
/// hands back the Arbiter end for further scripting.
pub async fn handshake(
    name: &str,
    order: PlayerOrder,
    params: Frame,
) -> (Session<DuplexStream>, Transport<DuplexStream>, Frame) {
    let (client, mut arbiter) = transport_pair();
    let script = tokio::spawn(async move {
        let hello = arbiter.receive().await.expect("hello frame");
        arbiter.send(&params).await.expect("send params");
        (arbiter, hello)
    });
    let session = Session::handshake(client, name, order)
        .await
        .expect("handshake succeeds");
    let (arbiter, hello) = script.await.expect("arbiter task");
    (session, arbiter, hello)
}

/// Runs an Arbiter script in the background: for each step, optionally
/// read one frame, then write the reply. Returns every frame read.
pub fn script(
    mut arbiter: Transport<DuplexStream>,
    steps: Vec<(bool, Frame)>,
) -> JoinHandle<Vec<Frame>> {
    tokio::spawn(async move {
        let mut received = Vec::new();
        for (expect_request, reply) in steps {
            if expect_request {
                received.push(arbiter.receive().await.expect("request frame"));
            }
            arbiter.send(&reply).await.expect("reply frame");
        }
        received
    })
}
