//! Integration tests for the async runner: decoding, pacing, shutdown.

mod common;

use std::time::Duration;

use common::{from_peer, load, subscribe, words, Device, TOPIC};
use rtb::prelude::*;
use tokio::sync::mpsc;

fn json<T: serde::Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_handle_rejects_malformed_payload() {
    let dev = Device::new("dev-1");
    let mut runner = Runner::new(dev.driver);

    let err = runner
        .handle(Inbound::AppFeed(b"{not json".to_vec()))
        .unwrap_err();

    assert!(matches!(err, RtbError::Protocol(_)));
    assert!(!runner.driver().is_battle_active());
}

#[tokio::test(start_paused = true)]
async fn test_handle_decodes_app_feed_and_exit() {
    let Device {
        driver,
        mut outbound,
        ..
    } = Device::new("dev-1");
    let mut runner = Runner::new(driver);

    runner
        .handle(Inbound::AppFeed(json(&subscribe("legendz", "guest"))))
        .unwrap();
    assert!(runner.driver().is_battle_active());

    runner.handle(Inbound::Exit).unwrap();
    assert!(!runner.driver().is_battle_active());

    assert_eq!(outbound.try_recv().ok(), Some(Outbound::Subscribe(TOPIC.into())));
    assert_eq!(outbound.try_recv().ok(), Some(Outbound::Unsubscribe(TOPIC.into())));
}

#[tokio::test(start_paused = true)]
async fn test_run_plays_a_round_and_leaves_on_close() {
    let Device {
        driver,
        toy,
        mut outbound,
        ..
    } = Device::new("dev-2");
    toy.answer(words(9));

    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(Runner::new(driver).run(rx));

    tx.send(Inbound::AppFeed(json(&subscribe("digimon-penx-battle", "guest"))))
        .await
        .unwrap();
    tx.send(Inbound::BattleFeed(json(&from_peer(
        "host",
        "X2-1000-1002-1004-@4^3^F9",
    ))))
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    drop(tx);

    let driver = task.await.unwrap();
    assert!(!driver.is_battle_active());

    let mut published = Vec::new();
    while let Ok(item) = outbound.try_recv() {
        published.push(item);
    }
    assert_eq!(published.first(), Some(&Outbound::Subscribe(TOPIC.into())));
    assert!(published.iter().any(|o| matches!(
        o,
        Outbound::Battle { message, .. } if message.output == "X1-1000-1002-1004-1006"
    )));
    assert_eq!(published.last(), Some(&Outbound::Unsubscribe(TOPIC.into())));
    assert_eq!(toy.commands(), vec!["X2-1000-1002-1004-@4^3^F9"]);
}

#[tokio::test(start_paused = true)]
async fn test_ticking_follows_driver_activity() {
    let dev = Device::new("dev-1");
    let mut runner = Runner::new(dev.driver);
    assert!(!runner.is_ticking());

    runner.handle(Inbound::AppFeed(json(&load("V1-FC03")))).unwrap();
    assert!(runner.is_ticking());

    runner.handle(Inbound::AppFeed(json(&load("V1-ZZ")))).unwrap();
    assert!(!runner.is_ticking());

    runner
        .handle(Inbound::AppFeed(json(&subscribe("legendz", "guest"))))
        .unwrap();
    assert!(runner.is_ticking());

    runner.handle(Inbound::Exit).unwrap();
    assert!(!runner.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn test_run_repeats_loaded_digirom() {
    let Device {
        driver,
        toy,
        mut outbound,
        ..
    } = Device::new("dev-1");
    toy.answer(vec![
        ResultSegment::sent([0xFC, 0x03]),
        ResultSegment::received([0xFD, 0x02]),
    ]);

    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(Runner::new(driver).run(rx));

    tx.send(Inbound::AppFeed(json(&load("V1-FC03")))).await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;
    drop(tx);
    task.await.unwrap();

    assert_eq!(toy.commands(), vec!["V1-FC03", "V1-FC03"]);
    let mut outputs = Vec::new();
    while let Ok(item) = outbound.try_recv() {
        if let Outbound::Output(output) = item {
            outputs.push(output.output);
        }
    }
    assert_eq!(outputs, vec!["s:FC03 r:FD02".to_string(), String::new()]);
}
