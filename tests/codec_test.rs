//! Tests for frame encoding and the framed transport.

mod common;

use common::{frame, transport_pair};
use expanding_nim::protocol::codec;
use expanding_nim::{ConnectionErrorKind, PlayerOrder, Transport, TurnStatus};
use serde_json::json;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

#[test]
fn test_round_trip_preserves_scalar_fields() {
    let original = frame(json!({
        "name": "Alice \"the\" player\nwith newline",
        "order": 1,
        "ratio": 0.5,
        "negative": -4,
        "reset": true,
        "nothing": null
    }));

    let bytes = codec::encode(&original).expect("encode");
    let decoded = codec::decode(&bytes).expect("decode");
    assert_eq!(decoded, original);
}

#[test]
fn test_encoding_is_deterministic_and_single_line() {
    let a = frame(json!({"order": 0, "num_stones": 2, "reset": false}));
    let b = frame(json!({"reset": false, "num_stones": 2, "order": 0}));

    let bytes_a = codec::encode(&a).expect("encode");
    let bytes_b = codec::encode(&b).expect("encode");
    assert_eq!(bytes_a, bytes_b);
    assert!(!bytes_a.contains(&b'\n'));

    let with_newline = frame(json!({"reason": "line one\nline two"}));
    let bytes = codec::encode(&with_newline).expect("encode");
    assert!(!bytes.contains(&b'\n'));
}

#[test]
fn test_garbage_is_rejected() {
    for input in [&b"not json"[..], b"{\"finished\": tru", b"", b"\xff\xfe"] {
        let err = codec::decode(input).expect_err("garbage must not decode");
        assert!(
            matches!(err.kind(), ConnectionErrorKind::Json(_)),
            "unexpected error for {input:?}: {err}"
        );
    }
}

#[test]
fn test_non_object_is_rejected() {
    for input in [&b"[1, 2]"[..], b"42", b"\"text\"", b"null"] {
        let err = codec::decode(input).expect_err("not a mapping");
        assert!(matches!(err.kind(), ConnectionErrorKind::NotAnObject));
    }
}

#[test]
fn test_nested_values_are_rejected() {
    let err = codec::decode(br#"{"finished": false, "history": [1, 2]}"#)
        .expect_err("nested array");
    assert!(matches!(
        err.kind(),
        ConnectionErrorKind::NestedField { field } if field == "history"
    ));

    let nested = frame(json!({"inner": {"a": 1}}));
    let err = codec::encode(&nested).expect_err("nested object");
    assert!(matches!(err.kind(), ConnectionErrorKind::NestedField { .. }));
}

#[test]
fn test_turn_status_frames() {
    let status: TurnStatus = codec::from_frame(frame(json!({
        "finished": false,
        "stones_left": 5,
        "current_max": 2,
        "reset_used": false,
        "stones_removed": 2,
        "winner": 0
    })))
    .expect("running status");
    assert_eq!(status, TurnStatus::in_progress(5, 2, false, 2));
    assert_eq!(status.winner, None);

    let over: TurnStatus = codec::from_frame(frame(json!({
        "finished": true,
        "stones_left": 0,
        "winner": 0,
        "reason": "opponent has no legal move"
    })))
    .expect("finished status");
    assert_eq!(
        over,
        TurnStatus::game_over(0, PlayerOrder::First, "opponent has no legal move")
    );

    let bad_winner = codec::from_frame::<TurnStatus>(frame(json!({
        "finished": true,
        "winner": 2,
        "reason": "?"
    })));
    assert!(bad_winner.is_err());
}

#[tokio::test]
async fn test_back_to_back_frames_stay_separate() {
    let (mut client, mut arbiter) = transport_pair();
    let first = frame(json!({"n": 1}));
    let second = frame(json!({"n": 2}));
    arbiter.send(&first).await.expect("send");
    arbiter.send(&second).await.expect("send");

    assert_eq!(client.receive().await.expect("first"), first);
    assert_eq!(client.receive().await.expect("second"), second);
}

#[tokio::test]
async fn test_bare_frame_is_read_while_writer_stays_open() {
    let (client, mut raw) = tokio::io::duplex(1024);
    let mut client = Transport::new(client);
    raw.write_all(br#"{"init_stones": 7, "init_resets": 1}"#)
        .await
        .expect("write");

    let received = tokio::time::timeout(Duration::from_secs(2), client.receive())
        .await
        .expect("frame ends at its closing brace")
        .expect("frame");
    assert_eq!(received, frame(json!({"init_stones": 7, "init_resets": 1})));
    drop(raw);
}

#[tokio::test]
async fn test_concatenated_bare_frames_are_split() {
    let (client, mut raw) = tokio::io::duplex(1024);
    let mut client = Transport::new(client);
    raw.write_all(br#"{"n": 1}{"n": 2}  {"n": 3}"#)
        .await
        .expect("write");

    for n in 1..=3 {
        let received = tokio::time::timeout(Duration::from_secs(2), client.receive())
            .await
            .expect("frame is buffered")
            .expect("frame");
        assert_eq!(received, frame(json!({"n": n})));
    }

    drop(raw);
    let err = client.receive().await.expect_err("closed");
    assert!(matches!(err.kind(), ConnectionErrorKind::Closed));
}

#[tokio::test]
async fn test_frame_split_across_writes_is_reassembled() {
    let (client, mut raw) = tokio::io::duplex(1024);
    let mut client = Transport::new(client);
    let reader = tokio::spawn(async move { client.receive().await });

    raw.write_all(br#"{"finished": fa"#).await.expect("write");
    raw.flush().await.expect("flush");
    tokio::task::yield_now().await;
    raw.write_all(br#"lse, "stones_left": 4}"#).await.expect("write");

    let received = reader.await.expect("reader task").expect("frame");
    assert_eq!(received, frame(json!({"finished": false, "stones_left": 4})));
}

#[tokio::test]
async fn test_crlf_delimiter_is_accepted() {
    let (client, mut raw) = tokio::io::duplex(1024);
    let mut client = Transport::new(client);
    raw.write_all(b"{\"n\": 7}\r\n").await.expect("write");

    assert_eq!(client.receive().await.expect("frame"), frame(json!({"n": 7})));
}

#[tokio::test]
async fn test_oversize_frame_is_rejected() {
    let (client, mut raw) = tokio::io::duplex(4096);
    let mut client = Transport::new(client).with_max_frame_len(16);
    raw.write_all(br#"{"reason": "this is far longer than sixteen bytes"}"#)
        .await
        .expect("write");
    raw.write_all(b"\n").await.expect("write");

    let err = client.receive().await.expect_err("too large");
    assert!(matches!(
        err.kind(),
        ConnectionErrorKind::FrameTooLarge { limit: 16 }
    ));
}

#[tokio::test]
async fn test_oversize_send_is_refused() {
    let (client, _raw) = tokio::io::duplex(4096);
    let mut client = Transport::new(client).with_max_frame_len(8);

    let err = client
        .send(&frame(json!({"name": "much too long"})))
        .await
        .expect_err("too large");
    assert!(matches!(
        err.kind(),
        ConnectionErrorKind::FrameTooLarge { limit: 8 }
    ));
}

#[tokio::test]
async fn test_frame_cut_by_eof_is_truncated() {
    let (client, mut raw) = tokio::io::duplex(1024);
    let mut client = Transport::new(client);
    raw.write_all(br#"{"finished": fal"#).await.expect("write");
    drop(raw);

    let err = client.receive().await.expect_err("partial frame");
    assert!(matches!(
        err.kind(),
        ConnectionErrorKind::Truncated { bytes: 16 }
    ));
}

#[tokio::test]
async fn test_eof_between_frames_is_closed() {
    let (mut client, arbiter) = transport_pair();
    drop(arbiter);

    let err = client.receive().await.expect_err("closed");
    assert!(matches!(err.kind(), ConnectionErrorKind::Closed));
}

#[tokio::test]
async fn test_transport_close_is_idempotent() {
    let (mut client, _arbiter) = transport_pair();
    assert!(!client.is_closed());
    client.close().await;
    client.close().await;
    assert!(client.is_closed());

    let err = client
        .send(&frame(json!({"n": 1})))
        .await
        .expect_err("closed");
    assert!(matches!(err.kind(), ConnectionErrorKind::Closed));
}
