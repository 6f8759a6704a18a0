// ABOUTME: Picks up the session a previous run left in the active-session record
// ABOUTME: Retries outstanding sync against the configured backend and optionally completes it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use anyhow::Result;
use ruck_tracker::api::HttpRuckApi;
use ruck_tracker::config::RuckConfig;
use ruck_tracker::errors::TrackingError;
use ruck_tracker::models::{SessionReview, SessionStatus};
use ruck_tracker::persistence::JsonFileStore;
use ruck_tracker::tracking::{CoordinatorDeps, SessionCoordinator, SyncStatus, SystemClock};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Resume the stored session; `None` when nothing was in progress
///
/// A completed session has its completion retried while resuming. With a
/// `review`, a session that is still open is completed before returning.
///
/// # Errors
///
/// Fails when the record cannot be read or the session cannot be rebuilt.
pub async fn run(config: &RuckConfig, review: Option<SessionReview>) -> Result<Option<Value>> {
    let deps = CoordinatorDeps {
        api: Arc::new(HttpRuckApi::new(
            config.api.base_url.clone(),
            config.api.token.clone(),
        )),
        store: Arc::new(JsonFileStore::new(
            config.storage.active_session_path.clone(),
        )),
        clock: Arc::new(SystemClock),
    };
    let Some(active) = SessionCoordinator::resume_stored(deps, &config.tracking).await? else {
        return Ok(None);
    };
    let handle = active.handle;
    let status = match handle.retry_sync().await {
        Ok(status) => status,
        // Completed sessions stop as soon as the retried completion lands
        Err(TrackingError::CoordinatorClosed) => {
            info!(session_id = %handle.session_id(), "Stored session finished syncing");
            return Ok(Some(json!({
                "session_id": handle.session_id(),
                "sync_status": SyncStatus::Synced,
            })));
        }
        Err(error) => return Err(error.into()),
    };
    info!(session_id = %handle.session_id(), %status, "Resumed stored session");

    let open = handle.snapshot().await?.session.status != SessionStatus::Completed;
    let output = match review {
        Some(review) if open => serde_json::to_value(handle.complete(review).await?)?,
        _ => serde_json::to_value(handle.snapshot().await?)?,
    };
    Ok(Some(output))
}
