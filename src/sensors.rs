// ABOUTME: Capability traits for location and heart-rate sources plus channel-backed implementations
// ABOUTME: Pump tasks forward source output and connectivity changes into a session coordinator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Sensor Sources
//!
//! Platform callbacks are adapted to [`LocationSource`] and [`HeartRateSource`].
//! [`ChannelSource`] implements both over an mpsc receiver so tests and the
//! replay CLI can inject synthetic readings.

use async_trait::async_trait;
use ruck_core::models::{HeartRateSample, LocationReading};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::tracking::coordinator::CoordinatorHandle;

/// Stream of raw location fixes
#[async_trait]
pub trait LocationSource: Send {
    /// Next reading, `None` when the source has ended
    async fn next_reading(&mut self) -> Option<LocationReading>;
}

/// Output of a paired heart-rate sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartRateSignal {
    /// New measurement
    Sample(HeartRateSample),
    /// Link to the sensor lost
    Disconnected,
    /// Link to the sensor restored
    Reconnected,
}

/// Stream of heart-rate sensor output
#[async_trait]
pub trait HeartRateSource: Send {
    /// Next signal, `None` when the source has ended
    async fn next_signal(&mut self) -> Option<HeartRateSignal>;
}

/// Source fed through an mpsc channel
#[derive(Debug)]
pub struct ChannelSource<T> {
    rx: mpsc::Receiver<T>,
}

/// Sender and source pair with the given buffer capacity
#[must_use]
pub fn channel_source<T>(capacity: usize) -> (mpsc::Sender<T>, ChannelSource<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, ChannelSource { rx })
}

#[async_trait]
impl LocationSource for ChannelSource<LocationReading> {
    async fn next_reading(&mut self) -> Option<LocationReading> {
        self.rx.recv().await
    }
}

#[async_trait]
impl HeartRateSource for ChannelSource<HeartRateSignal> {
    async fn next_signal(&mut self) -> Option<HeartRateSignal> {
        self.rx.recv().await
    }
}

/// Forward every reading to the coordinator until either side ends
pub fn forward_locations<S>(mut source: S, handle: CoordinatorHandle) -> JoinHandle<()>
where
    S: LocationSource + 'static,
{
    tokio::spawn(async move {
        while let Some(reading) = source.next_reading().await {
            if handle.location(reading).await.is_err() {
                break;
            }
        }
        debug!(session_id = %handle.session_id(), "Location pump finished");
    })
}

/// Forward heart-rate samples and link changes until either side ends
pub fn forward_heart_rate<S>(mut source: S, handle: CoordinatorHandle) -> JoinHandle<()>
where
    S: HeartRateSource + 'static,
{
    tokio::spawn(async move {
        while let Some(signal) = source.next_signal().await {
            let sent = match signal {
                HeartRateSignal::Sample(sample) => handle.heart_rate(sample).await,
                HeartRateSignal::Disconnected => handle.heart_rate_sensor(false).await,
                HeartRateSignal::Reconnected => handle.heart_rate_sensor(true).await,
            };
            if sent.is_err() {
                break;
            }
        }
        debug!(session_id = %handle.session_id(), "Heart-rate pump finished");
    })
}

/// Forward the current connectivity and every change after it
pub fn forward_connectivity(
    mut online: watch::Receiver<bool>,
    handle: CoordinatorHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let initial = *online.borrow_and_update();
        if handle.connectivity(initial).await.is_err() {
            return;
        }
        while online.changed().await.is_ok() {
            let value = *online.borrow_and_update();
            if handle.connectivity(value).await.is_err() {
                break;
            }
        }
    })
}
