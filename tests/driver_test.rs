//! Tests for the game loop.

mod common;

use common::{finished, frame, handshake, running, script, standard_params};
use expanding_nim::{
    AlwaysOne, ConnectionErrorKind, Driver, DriverError, GameEvent, Greedy, HumanStrategy, Mover,
    PlayerOrder, SessionError,
};
use serde_json::json;
use std::io::Cursor;
use tokio::sync::mpsc;

fn drain(mut event_rx: mpsc::UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_second_player_full_game() {
    let (session, arbiter, _) = handshake("B", PlayerOrder::Second, standard_params()).await;
    let arbiter = script(
        arbiter,
        vec![
            (false, running(9, 3, false, 1)),
            (true, running(8, 3, false, 1)),
            (false, running(5, 4, false, 3)),
            (true, finished(4, 1, "opponent ran out of time")),
        ],
    );

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let outcome = Driver::new(session, Box::new(AlwaysOne::new()))
        .with_events(event_tx)
        .run()
        .await
        .expect("game completes");

    assert_eq!(outcome.outcome.winner, PlayerOrder::Second);
    assert_eq!(outcome.outcome.reason, "opponent ran out of time");
    assert_eq!(outcome.me, PlayerOrder::Second);
    assert!(outcome.won());

    let requests = arbiter.await.expect("arbiter task");
    assert_eq!(
        requests,
        vec![
            frame(json!({"order": 1, "num_stones": 1, "reset": false})),
            frame(json!({"order": 1, "num_stones": 1, "reset": false})),
        ]
    );

    let events = drain(event_rx);
    assert!(matches!(events.first(), Some(GameEvent::Started { order: PlayerOrder::Second, .. })));
    let movers: Vec<Mover> = events
        .iter()
        .filter_map(|event| match event {
            GameEvent::MovePlayed { mover, .. } => Some(*mover),
            _ => None,
        })
        .collect();
    assert_eq!(
        movers,
        vec![Mover::Opponent, Mover::Me, Mover::Opponent, Mover::Me]
    );
    assert!(matches!(events.last(), Some(GameEvent::GameOver(o)) if o.won()));
}

#[tokio::test]
async fn test_first_player_loses_on_opponent_move() {
    let (session, arbiter, _) = handshake("A", PlayerOrder::First, standard_params()).await;
    let arbiter = script(
        arbiter,
        vec![
            (true, running(7, 3, false, 3)),
            (false, finished(0, 1, "took the last stone")),
        ],
    );

    let outcome = Driver::new(session, Box::new(Greedy::new()))
        .run()
        .await
        .expect("game completes");

    assert_eq!(outcome.outcome.winner, PlayerOrder::Second);
    assert!(!outcome.won());

    let requests = arbiter.await.expect("arbiter task");
    // Greedy opens with init_max from the handshake.
    assert_eq!(
        requests,
        vec![frame(json!({"order": 0, "num_stones": 3, "reset": false}))]
    );
}

#[tokio::test]
async fn test_strategy_sees_latest_status() {
    let (session, arbiter, _) = handshake("A", PlayerOrder::First, standard_params()).await;
    let arbiter = script(
        arbiter,
        vec![
            (true, running(7, 3, false, 3)),
            (false, running(2, 5, true, 5)),
            (true, finished(0, 0, "took the last stone")),
        ],
    );

    let outcome = Driver::new(session, Box::new(Greedy::new()))
        .run()
        .await
        .expect("game completes");
    assert!(outcome.won());

    let requests = arbiter.await.expect("arbiter task");
    assert_eq!(
        requests[1],
        frame(json!({"order": 0, "num_stones": 2, "reset": false}))
    );
}

#[tokio::test]
async fn test_connection_loss_aborts_game() {
    let (session, mut arbiter, _) = handshake("B", PlayerOrder::Second, standard_params()).await;
    let task = tokio::spawn(async move {
        arbiter.close().await;
    });

    let err = Driver::new(session, Box::new(AlwaysOne::new()))
        .run()
        .await
        .expect_err("arbiter hung up");
    match err {
        DriverError::Session(SessionError::Connection(e)) => {
            assert!(matches!(e.kind(), ConnectionErrorKind::Closed));
        }
        other => panic!("unexpected error: {other}"),
    }
    task.await.expect("arbiter task");
}

#[tokio::test]
async fn test_strategy_failure_aborts_game() {
    let (session, mut arbiter, _) = handshake("A", PlayerOrder::First, standard_params()).await;
    let human = HumanStrategy::new(Cursor::new(b"zero\n".to_vec()), Vec::new(), 1);

    let err = Driver::new(session, Box::new(human))
        .run()
        .await
        .expect_err("no valid move");
    assert!(matches!(err, DriverError::Strategy(_)));

    // The driver closed the session: the Arbiter sees EOF, not a move.
    let err = arbiter.receive().await.expect_err("session closed");
    assert!(matches!(err.kind(), ConnectionErrorKind::Closed));
}

#[tokio::test]
async fn test_finished_status_without_winner_aborts_game() {
    let (session, arbiter, _) = handshake("A", PlayerOrder::First, standard_params()).await;
    let arbiter = script(
        arbiter,
        vec![(true, frame(json!({"finished": true, "reason": "no verdict"})))],
    );

    let err = Driver::new(session, Box::new(AlwaysOne::new()))
        .run()
        .await
        .expect_err("status without a winner");
    match err {
        DriverError::Session(SessionError::Connection(e)) => {
            assert!(matches!(e.kind(), ConnectionErrorKind::Json(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    arbiter.await.expect("arbiter task");
}
