// ABOUTME: Remote API client for the ruck session tracker
// ABOUTME: Session lifecycle calls, batched telemetry uploads, and the shared HTTP client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! Remote API client for the ruck session tracker.
//!
//! The backend is the system of record; this crate only moves data to it.

/// `RuckApi` trait and HTTP implementation
pub mod client;
/// Shared HTTP client for API calls
pub mod http_client;
/// Recording in-process backend for dry runs and tests
pub mod memory;
/// Request and response bodies
pub mod payloads;

pub use client::{HttpRuckApi, RuckApi};
pub use http_client::{build_client, initialize_shared_client, shared_client};
pub use memory::{InMemoryRuckApi, RecordedCalls};
pub use payloads::{Batch, CompletionPayload, RemoteSession};
