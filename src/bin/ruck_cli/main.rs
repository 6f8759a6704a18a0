// ABOUTME: ruck-tracker CLI - replays recorded rucks and manages the active-session record
// ABOUTME: Drives the same coordinator the app embeds, against the real backend or a dry-run one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors
//!
//! Usage:
//! ```bash
//! # Replay a recorded ruck without touching the backend
//! ruck-tracker replay walk.jsonl --ruck-weight 20 --dry-run
//!
//! # Replay against the configured backend and rate the session
//! ruck-tracker replay walk.jsonl --ruck-weight 20 --user-weight 80 --rating 4
//!
//! # Show the session a restart would find in progress
//! ruck-tracker status
//!
//! # Pick that session up again, retrying anything unsent, and complete it
//! ruck-tracker resume --complete --rating 4
//!
//! # Forget the stored active session
//! ruck-tracker clear
//! ```

mod replay;
mod resume;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ruck_tracker::api::initialize_shared_client;
use ruck_tracker::config::RuckConfig;
use ruck_tracker::logging::LoggingConfig;
use ruck_tracker::models::{Gender, NewSession, SessionReview};
use ruck_tracker::persistence::{ActiveSessionStore, JsonFileStore};
use std::path::PathBuf;
use tracing::info;

use replay::ReplayOptions;

#[derive(Parser)]
#[command(
    name = "ruck-tracker",
    about = "Ruck session tracker",
    long_about = "Replay recorded rucks through the tracking core and manage the stored active session."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Gender {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Self::Male,
            SexArg::Female => Self::Female,
        }
    }
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Replay a JSON-lines recording and complete the session
    Replay {
        /// Recording with one tagged event per line
        file: PathBuf,

        /// Weight carried in kilograms
        #[arg(long)]
        ruck_weight: f64,

        /// Body weight in kilograms, used for calories
        #[arg(long)]
        user_weight: Option<f64>,

        /// Sex for the calorie estimate; omitted uses the midpoint factor
        #[arg(long, value_enum)]
        sex: Option<SexArg>,

        /// Surface energy multiplier, 1.0 for pavement
        #[arg(long, default_value_t = 1.0)]
        terrain: f64,

        /// Planned duration in minutes
        #[arg(long)]
        planned_minutes: Option<u32>,

        /// Rating from 1 to 5 submitted at completion
        #[arg(long)]
        rating: Option<u8>,

        /// Perceived exertion from 1 to 10
        #[arg(long)]
        exertion: Option<u8>,

        /// Completion notes
        #[arg(long)]
        notes: Option<String>,

        /// Use an in-memory backend and store instead of the configured ones
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the stored active-session record
    Status,

    /// Resume the stored session against the configured backend
    Resume {
        /// Complete the session once outstanding data is synced
        #[arg(long)]
        complete: bool,

        /// Rating from 1 to 5 submitted with --complete
        #[arg(long, requires = "complete")]
        rating: Option<u8>,
    },

    /// Remove the stored active-session record
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging = logging.with_level("debug");
    }
    logging.init()?;

    let config = RuckConfig::from_env()?;
    initialize_shared_client(config.api.timeout_secs, config.api.connect_timeout_secs);

    match cli.command {
        Command::Replay {
            file,
            ruck_weight,
            user_weight,
            sex,
            terrain,
            planned_minutes,
            rating,
            exertion,
            notes,
            dry_run,
        } => {
            let options = ReplayOptions {
                session: NewSession {
                    user_weight_kg: user_weight,
                    gender: sex.map(Gender::from),
                    terrain_multiplier: terrain,
                    planned_duration_minutes: planned_minutes,
                    ..NewSession::with_ruck_weight(ruck_weight)
                },
                review: SessionReview {
                    rating,
                    perceived_exertion: exertion,
                    notes,
                    ..SessionReview::default()
                },
                dry_run,
            };
            let report = replay::run(&file, options, &config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Status => {
            let store = JsonFileStore::new(config.storage.active_session_path.clone());
            match store.load().await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("No active session"),
            }
        }
        Command::Resume { complete, rating } => {
            let review = complete.then(|| SessionReview {
                rating,
                ..SessionReview::default()
            });
            match resume::run(&config, review).await? {
                Some(output) => println!("{}", serde_json::to_string_pretty(&output)?),
                None => println!("No active session"),
            }
        }
        Command::Clear => {
            let store = JsonFileStore::new(config.storage.active_session_path.clone());
            store.clear().await?;
            info!(path = %store.path().display(), "Active session record cleared");
        }
    }

    Ok(())
}
