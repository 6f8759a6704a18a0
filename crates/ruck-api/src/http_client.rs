// ABOUTME: Shared HTTP client with connection pooling for remote API calls
// ABOUTME: Singleton pattern with configurable timeouts initialized at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use reqwest::{Client, ClientBuilder};
use std::sync::OnceLock;
use std::time::Duration;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configured timeout values for the shared client
static CLIENT_TIMEOUTS: OnceLock<(u64, u64)> = OnceLock::new();

/// Global shared HTTP client with configured timeouts
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Initialize the shared HTTP client timeout configuration
///
/// Must be called once at startup before the first upload. Later calls are
/// ignored. If never called, 30s request / 10s connect timeouts are used.
pub fn initialize_shared_client(timeout_secs: u64, connect_timeout_secs: u64) {
    let _ = CLIENT_TIMEOUTS.set((timeout_secs, connect_timeout_secs));
}

/// Build a client with explicit timeouts, outside the shared pool
#[must_use]
pub fn build_client(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .user_agent(concat!("ruck-tracker/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Get the shared HTTP client for API calls
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let (timeout, connect_timeout) = CLIENT_TIMEOUTS
            .get()
            .copied()
            .unwrap_or((DEFAULT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS));
        build_client(timeout, connect_timeout)
    })
}
