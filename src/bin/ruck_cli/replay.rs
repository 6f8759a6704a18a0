// ABOUTME: Replays a recorded ruck from a JSON-lines file through a live session coordinator
// ABOUTME: A manual clock follows the recorded timestamps so durations match the recording
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use ruck_tracker::api::{HttpRuckApi, InMemoryRuckApi, RuckApi};
use ruck_tracker::config::RuckConfig;
use ruck_tracker::models::{HeartRateSample, LocationReading, NewSession, SessionReview};
use ruck_tracker::persistence::{ActiveSessionStore, JsonFileStore, MemoryStore};
use ruck_tracker::tracking::{
    CompletionReport, CoordinatorDeps, CoordinatorHandle, ManualClock, SessionCoordinator,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

/// One line of a replay file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayLine {
    /// Raw location fix
    Location(LocationReading),
    /// Heart-rate measurement
    HeartRate(HeartRateSample),
    /// User paused
    Pause { at: DateTime<Utc> },
    /// User resumed
    Resume { at: DateTime<Utc> },
    /// Connectivity changed
    Online { value: bool },
    /// Heart-rate sensor link changed
    Sensor { connected: bool },
}

impl ReplayLine {
    fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Location(reading) => Some(reading.timestamp),
            Self::HeartRate(sample) => Some(sample.timestamp),
            Self::Pause { at } | Self::Resume { at } => Some(*at),
            Self::Online { .. } | Self::Sensor { .. } => None,
        }
    }
}

/// Parse a JSON-lines replay; blank lines and `#` comments are skipped
///
/// # Errors
///
/// Fails on the first malformed line, naming its line number.
pub fn parse_replay(content: &str) -> Result<Vec<ReplayLine>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| anyhow!("line {}: {e}", index + 1))
        })
        .collect()
}

/// Options for one replay run
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Session parameters
    pub session: NewSession,
    /// Review submitted at completion
    pub review: SessionReview,
    /// Use an in-memory backend and store
    pub dry_run: bool,
}

/// Run the whole file through a coordinator and complete the session
///
/// # Errors
///
/// Fails when the file cannot be read or parsed, or the session cannot be started.
pub async fn run(path: &Path, options: ReplayOptions, config: &RuckConfig) -> Result<CompletionReport> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| anyhow!("reading {}: {e}", path.display()))?;
    let lines = parse_replay(&content)?;
    let Some(start) = lines.iter().find_map(ReplayLine::at) else {
        bail!("{} contains no timestamped lines", path.display());
    };

    let clock = ManualClock::new(start);
    let memory_api = options.dry_run.then(|| Arc::new(InMemoryRuckApi::new()));
    let api: Arc<dyn RuckApi> = match &memory_api {
        Some(api) => Arc::clone(api) as Arc<dyn RuckApi>,
        None => Arc::new(HttpRuckApi::new(
            config.api.base_url.clone(),
            config.api.token.clone(),
        )),
    };
    let store: Arc<dyn ActiveSessionStore> = if options.dry_run {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::new(config.storage.active_session_path.clone()))
    };

    let deps = CoordinatorDeps {
        api,
        store,
        clock: Arc::new(clock.clone()),
    };
    let active = SessionCoordinator::start(deps, &config.tracking, &options.session).await?;
    info!(
        session_id = %active.handle.session_id(),
        lines = lines.len(),
        dry_run = options.dry_run,
        "Replaying recorded ruck"
    );

    for line in lines {
        if let Some(at) = line.at() {
            clock.advance_to(at);
        }
        if let ReplayLine::Online { value } = line {
            if let Some(api) = &memory_api {
                api.set_offline(!value);
            }
        }
        apply(&active.handle, line).await?;
    }

    let report = active.handle.complete(options.review).await?;
    if let Some(api) = &memory_api {
        let calls = api.calls();
        info!(
            locations = calls.locations.len(),
            heart_rate = calls.heart_rate.len(),
            completions = calls.completions.len(),
            "Dry-run backend received"
        );
    }
    if !report.fully_synced() {
        warn!(
            status = %report.snapshot.sync_status,
            "Replay finished with data still waiting for the backend"
        );
    }
    Ok(report)
}

async fn apply(handle: &CoordinatorHandle, line: ReplayLine) -> Result<()> {
    match line {
        ReplayLine::Location(reading) => handle.location(reading).await?,
        ReplayLine::HeartRate(sample) => handle.heart_rate(sample).await?,
        ReplayLine::Pause { at } => {
            if let Err(error) = handle.pause().await {
                warn!(%at, %error, "Pause rejected");
            }
        }
        ReplayLine::Resume { at } => {
            if let Err(error) = handle.resume().await {
                warn!(%at, %error, "Resume rejected");
            }
        }
        ReplayLine::Online { value } => handle.connectivity(value).await?,
        ReplayLine::Sensor { connected } => handle.heart_rate_sensor(connected).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_lines() {
        let content = r#"
# warm-up
{"type":"location","latitude":40.0,"longitude":-75.0,"elevation":100.0,"accuracy":5.0,"timestamp":"2025-06-01T08:00:00Z"}
{"type":"heart_rate","bpm":120,"timestamp":"2025-06-01T08:00:05Z"}
{"type":"pause","at":"2025-06-01T08:10:00Z"}
{"type":"online","value":false}
{"type":"sensor","connected":false}
"#;
        let lines = parse_replay(content).unwrap();
        assert_eq!(lines.len(), 5);
        assert!(matches!(lines[0], ReplayLine::Location(_)));
        assert!(matches!(lines[1], ReplayLine::HeartRate(HeartRateSample { bpm: 120, .. })));
        assert_eq!(lines[3], ReplayLine::Online { value: false });
        assert!(lines[4].at().is_none());
    }

    #[test]
    fn test_parse_reports_line_number() {
        let content = "{\"type\":\"online\",\"value\":true}\n{\"type\":\"teleport\"}\n";
        let error = parse_replay(content).unwrap_err();
        assert!(error.to_string().contains("line 2"));
    }
}
