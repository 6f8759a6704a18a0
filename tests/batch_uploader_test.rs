// ABOUTME: Integration tests for the batch uploader against the recording in-memory backend
// ABOUTME: Covers size triggers, identical retries, backoff gating, offline buffering, and discard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::reading;
use ruck_tracker::api::InMemoryRuckApi;
use ruck_tracker::models::{LocationPoint, SessionId};
use ruck_tracker::tracking::{BackoffPolicy, BatchUploader, FlushOutcome, SyncStatus, UploaderConfig};
use std::time::Duration;
use tokio::time::Instant;

fn uploader(batch_size: usize) -> BatchUploader<LocationPoint> {
    BatchUploader::new(
        "location",
        SessionId::from("ruck-1"),
        UploaderConfig {
            batch_size,
            flush_interval: Duration::from_secs(30),
            backoff: BackoffPolicy::fixed(Duration::from_secs(1), Duration::from_secs(60)),
        },
    )
}

fn points(count: usize) -> Vec<LocationPoint> {
    (0..count)
        .map(|i| LocationPoint::from_reading(&reading(i as f64 * 0.001, None, i as i64)))
        .collect()
}

#[tokio::test]
async fn test_size_trigger_sends_one_full_batch() {
    let api = InMemoryRuckApi::new();
    let mut up = uploader(2);
    let triggers: Vec<bool> = points(3).into_iter().map(|p| up.push(p)).collect();
    assert_eq!(triggers, vec![false, true, true]);

    let outcome = up.flush_once(&api, Instant::now()).await;
    assert_eq!(outcome, FlushOutcome::Uploaded { items: 2 });
    assert_eq!(up.len(), 1);
    assert_eq!(api.calls().locations, points(2));

    let summary = up.flush_all(&api, Instant::now()).await;
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.last, FlushOutcome::Empty);
    assert_eq!(api.calls().locations, points(3));
}

#[tokio::test]
async fn test_failed_batch_is_resent_identically_after_backoff() {
    let api = InMemoryRuckApi::new();
    api.fail_next(2);
    let mut up = uploader(10);
    for p in points(3) {
        up.push(p);
    }
    let start = Instant::now();

    let first = up.flush_once(&api, start).await;
    assert!(matches!(
        first,
        FlushOutcome::Failed { retry_in, .. } if retry_in == Duration::from_secs(1)
    ));
    let batch_id = up.pending_payload().unwrap().batch_id;

    let gated = up.flush_once(&api, start).await;
    assert!(matches!(gated, FlushOutcome::BackingOff { .. }));

    let second = up.flush_once(&api, start + Duration::from_secs(1)).await;
    assert!(matches!(
        second,
        FlushOutcome::Failed { retry_in, .. } if retry_in == Duration::from_secs(2)
    ));
    assert_eq!(up.consecutive_failures(), 2);

    let third = up.flush_once(&api, start + Duration::from_secs(3)).await;
    assert_eq!(third, FlushOutcome::Uploaded { items: 3 });
    assert_eq!(up.consecutive_failures(), 0);
    assert!(up.pending_payload().is_none());

    let calls = api.calls();
    assert_eq!(calls.location_attempts.len(), 3);
    assert!(calls
        .location_attempts
        .iter()
        .all(|attempt| attempt.batch_id == batch_id && attempt.items == points(3)));
    assert_eq!(calls.locations.len(), 3);
}

#[tokio::test]
async fn test_items_pushed_during_backoff_wait_for_next_batch() {
    let api = InMemoryRuckApi::new();
    api.fail_next(1);
    let mut up = uploader(5);
    let mut all = points(3).into_iter();
    up.push(all.next().unwrap());
    up.push(all.next().unwrap());
    let start = Instant::now();

    assert!(matches!(
        up.flush_once(&api, start).await,
        FlushOutcome::Failed { .. }
    ));
    up.push(all.next().unwrap());

    let retried = up.flush_once(&api, start + Duration::from_secs(1)).await;
    assert_eq!(retried, FlushOutcome::Uploaded { items: 2 });
    assert_eq!(up.len(), 1);
    assert_eq!(up.sync_status(), SyncStatus::Pending);
}

#[tokio::test]
async fn test_offline_buffers_without_requests() {
    let api = InMemoryRuckApi::new();
    let mut up = uploader(2);
    up.set_online(false);
    for p in points(5) {
        up.push(p);
    }

    assert_eq!(up.flush_once(&api, Instant::now()).await, FlushOutcome::Offline);
    assert_eq!(up.sync_status(), SyncStatus::Offline);
    assert!(api.calls().location_attempts.is_empty());

    assert!(up.set_online(true));
    assert_eq!(up.sync_status(), SyncStatus::Pending);
    let summary = up.sync_pending(&api, Instant::now()).await;
    assert_eq!(summary.uploaded, 5);
    assert_eq!(up.sync_status(), SyncStatus::Synced);
    assert_eq!(api.calls().location_attempts.len(), 3);
}

#[tokio::test]
async fn test_reconnect_skips_remaining_backoff() {
    let api = InMemoryRuckApi::new();
    api.fail_next(1);
    let mut up = uploader(10);
    for p in points(2) {
        up.push(p);
    }
    let start = Instant::now();
    assert!(matches!(
        up.flush_once(&api, start).await,
        FlushOutcome::Failed { .. }
    ));
    assert!(!up.is_due(start));

    up.set_online(false);
    up.set_online(true);
    assert!(up.is_due(start));
    assert_eq!(
        up.flush_once(&api, start).await,
        FlushOutcome::Uploaded { items: 2 }
    );
}

#[tokio::test]
async fn test_discard_drops_buffer_and_pending_batch() {
    let api = InMemoryRuckApi::new();
    api.fail_next(1);
    let mut up = uploader(10);
    for p in points(4) {
        up.push(p);
    }
    up.flush_once(&api, Instant::now()).await;
    assert!(up.pending_payload().is_some());

    assert_eq!(up.discard(), 4);
    assert!(up.is_empty());
    assert!(up.pending_payload().is_none());
    assert_eq!(up.sync_status(), SyncStatus::Synced);
    assert_eq!(
        up.flush_once(&api, Instant::now()).await,
        FlushOutcome::Empty
    );
}
