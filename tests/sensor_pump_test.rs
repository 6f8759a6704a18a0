// ABOUTME: Tests that sensor and connectivity pumps deliver into a running coordinator
// ABOUTME: Uses channel-backed sources and a watch channel for connectivity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{pulse, quiet_config, reading, Harness};
use ruck_tracker::models::LocationReading;
use ruck_tracker::sensors::{
    channel_source, forward_connectivity, forward_heart_rate, forward_locations, HeartRateSignal,
};
use ruck_tracker::tracking::SyncStatus;
use tokio::sync::watch;

#[tokio::test(start_paused = true)]
async fn test_location_and_connectivity_pumps() {
    let h = Harness::start(&quiet_config()).await;

    let (tx, source) = channel_source::<LocationReading>(8);
    let pump = forward_locations(source, h.active.handle.clone());
    tx.send(reading(0.0, None, 0)).await.unwrap();
    tx.send(reading(0.001, None, 10)).await.unwrap();
    drop(tx);
    pump.await.unwrap();

    let (online_tx, online_rx) = watch::channel(true);
    let connectivity = forward_connectivity(online_rx, h.active.handle.clone());
    online_tx.send(false).unwrap();
    drop(online_tx);
    connectivity.await.unwrap();

    let snapshot = h.active.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.accepted_points, 2);
    assert_eq!(snapshot.sync_status, SyncStatus::Offline);
}

#[tokio::test(start_paused = true)]
async fn test_heart_rate_pump_relays_link_changes() {
    let h = Harness::start(&quiet_config()).await;

    let (tx, source) = channel_source::<HeartRateSignal>(8);
    let pump = forward_heart_rate(source, h.active.handle.clone());
    tx.send(HeartRateSignal::Sample(pulse(90, 0))).await.unwrap();
    tx.send(HeartRateSignal::Disconnected).await.unwrap();
    tx.send(HeartRateSignal::Sample(pulse(95, 5))).await.unwrap();
    tx.send(HeartRateSignal::Reconnected).await.unwrap();
    tx.send(HeartRateSignal::Sample(pulse(100, 10))).await.unwrap();
    drop(tx);
    pump.await.unwrap();

    let snapshot = h.active.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.heart_rate.sample_count, 2);
    assert_eq!(snapshot.heart_rate.min_bpm, Some(90));
    assert_eq!(snapshot.heart_rate.max_bpm, Some(100));
}

#[tokio::test(start_paused = true)]
async fn test_pump_stops_when_coordinator_is_gone() {
    let h = Harness::start(&quiet_config()).await;
    let handle = h.active.handle.clone();
    assert!(handle.delete().await.unwrap());
    h.active.task.await.unwrap();

    let (tx, source) = channel_source::<LocationReading>(8);
    let pump = forward_locations(source, handle);
    tx.send(reading(0.0, None, 0)).await.unwrap();
    pump.await.unwrap();
    assert!(tx.is_closed());
}
