// ABOUTME: Durable record of the active session so a restart knows a ruck is in progress
// ABOUTME: ActiveSessionStore trait with an atomic JSON-file implementation and an in-memory one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ruck_core::errors::{AppError, AppResult};
use ruck_core::models::{
    Gender, NewSession, RuckSession, RuckSessionStats, SessionId, SessionReview, SessionStatus,
};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::fs;
use tracing::debug;

const fn default_terrain_multiplier() -> f64 {
    1.0
}

/// What survives a restart about the active session
///
/// Enough to rebuild the session without asking the backend: identity,
/// lifecycle timestamps, calorie inputs, and the totals reached so far.
/// Fields added after the first release default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSessionRecord {
    /// Session identifier
    pub session_id: SessionId,
    /// Last known status
    pub status: SessionStatus,
    /// When tracking started
    pub started_at: Option<DateTime<Utc>>,
    /// Weight carried
    pub ruck_weight_kg: f64,
    /// Body weight
    pub user_weight_kg: Option<f64>,
    /// Self-reported sex for the calorie estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Surface energy multiplier
    #[serde(default = "default_terrain_multiplier")]
    pub terrain_multiplier: f64,
    /// Planned length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_duration_minutes: Option<u32>,
    /// Start of the pause in effect when the record was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    /// When the session completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Totals at the time of writing; final once completed
    #[serde(default)]
    pub stats: RuckSessionStats,
    /// Review captured at completion, or notes entered before starting
    #[serde(default)]
    pub review: SessionReview,
}

impl From<&RuckSession> for ActiveSessionRecord {
    fn from(session: &RuckSession) -> Self {
        Self {
            session_id: session.id.clone(),
            status: session.status,
            started_at: session.started_at,
            ruck_weight_kg: session.ruck_weight_kg,
            user_weight_kg: session.user_weight_kg,
            gender: session.gender,
            terrain_multiplier: session.terrain_multiplier,
            planned_duration_minutes: session.planned_duration_minutes,
            paused_at: session.paused_at,
            completed_at: session.completed_at,
            stats: session.stats,
            review: session.review.clone(),
        }
    }
}

impl ActiveSessionRecord {
    /// Parameters the session was created with, for re-validation on load
    #[must_use]
    pub fn params(&self) -> NewSession {
        NewSession {
            ruck_weight_kg: self.ruck_weight_kg,
            user_weight_kg: self.user_weight_kg,
            gender: self.gender,
            terrain_multiplier: self.terrain_multiplier,
            planned_duration_minutes: self.planned_duration_minutes,
            notes: self.review.notes.clone(),
        }
    }

    /// Rebuild the session; `created_at` falls back to `now` when never started
    #[must_use]
    pub fn to_session(&self, now: DateTime<Utc>) -> RuckSession {
        RuckSession {
            id: self.session_id.clone(),
            status: self.status,
            ruck_weight_kg: self.ruck_weight_kg,
            user_weight_kg: self.user_weight_kg,
            gender: self.gender,
            terrain_multiplier: self.terrain_multiplier,
            planned_duration_minutes: self.planned_duration_minutes,
            review: self.review.clone(),
            created_at: self.started_at.unwrap_or(now),
            started_at: self.started_at,
            paused_at: self.paused_at,
            completed_at: self.completed_at,
            stats: self.stats,
        }
    }
}

/// Storage for the single active-session record
#[async_trait]
pub trait ActiveSessionStore: Send + Sync {
    /// Write or replace the record
    async fn save(&self, record: &ActiveSessionRecord) -> AppResult<()>;

    /// Read the record, `None` when no session is active
    async fn load(&self) -> AppResult<Option<ActiveSessionRecord>>;

    /// Remove the record; succeeds when nothing was stored
    async fn clear(&self) -> AppResult<()>;
}

/// Record kept as a JSON file, replaced atomically through a sibling temp file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`; parent directories are created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_atomically(&self, record: &ActiveSessionRecord) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(record)?;
        let temp = self.temp_path();
        fs::write(&temp, json).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ActiveSessionStore for JsonFileStore {
    async fn save(&self, record: &ActiveSessionRecord) -> AppResult<()> {
        self.write_atomically(record)
            .await
            .map_err(|e| e.with_session_id(record.session_id.as_str()))?;
        debug!(
            session_id = %record.session_id,
            status = %record.status,
            path = %self.path.display(),
            "Saved active session record"
        );
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<ActiveSessionRecord>> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                AppError::serialization(format!(
                    "corrupt active session record at {}",
                    self.path.display()
                ))
                .with_source(e)
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared active session record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Record kept in memory, for dry runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<ActiveSessionRecord>>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActiveSessionStore for MemoryStore {
    async fn save(&self, record: &ActiveSessionRecord) -> AppResult<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<ActiveSessionRecord>> {
        Ok(self
            .record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
