// ABOUTME: Session tracking engine: sampling, lifecycle, batching, timers, and the coordinator
// ABOUTME: All mutable session state lives inside one coordinator task per session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

/// Retry backoff policy
pub mod backoff;
/// Wall-clock abstraction
pub mod clock;
/// Per-session state bundle
pub mod context;
/// Event loop owning one session
pub mod coordinator;
/// Heart-rate buffering and summary
pub mod heart_rate;
/// Accuracy filter and track
pub mod sampler;
/// Lifecycle state machine and stat accumulation
pub mod session;
/// Cancellable flush and retry timers
pub mod timers;
/// Generic batched uploader
pub mod uploader;

pub use backoff::BackoffPolicy;
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{SessionContext, SessionSnapshot};
pub use coordinator::{
    ActiveSession, CompletionReport, CoordinatorDeps, CoordinatorHandle, SessionCoordinator,
    TrackingEvent,
};
pub use heart_rate::HeartRateAggregator;
pub use sampler::LocationSampler;
pub use session::SessionStateMachine;
pub use timers::{TimerKind, TimerRegistry};
pub use uploader::{
    BatchSink, BatchUploader, FlushOutcome, FlushSummary, SyncStatus, UploaderConfig,
};
