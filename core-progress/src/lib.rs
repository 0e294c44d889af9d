//! # Progress Synchronization
//!
//! Reports playback progress to the server, or stores it on the device when
//! offline.
//!
//! ## Components
//!
//! - [`ProgressSynchronizer`]: per-session tick handling, online and offline
//! - [`Watermark`]: the shared report throttle
//! - [`TokenState`]: playback token lifecycle (`Missing`, `Valid`, `Invalid`)
//! - [`record`]: percent and finished computation for offline records
//! - `HttpPlaybackApi` (feature `http-api`): [`bridge_traits::PlaybackApi`]
//!   over the host's HTTP client
//!
//! ## Usage
//!
//! ```ignore
//! use core_progress::{PlaybackTarget, ProgressSynchronizer, TickOutcome};
//!
//! let sync = ProgressSynchronizer::from_config(&config, events.clone());
//! sync.begin(PlaybackTarget::new("c1").with_duration(600));
//!
//! match sync.record_tick(network_up, position_millis, clock.now()).await? {
//!     TickOutcome::TokenInvalid => { sync.resume_playback().await; }
//!     TickOutcome::Reported { server_ahead_seconds: Some(s), .. } => offer_jump(s),
//!     _ => {}
//! }
//! ```

#[cfg(feature = "http-api")]
pub mod api;
pub mod error;
pub mod record;
pub mod synchronizer;
pub mod token;
pub mod watermark;

#[cfg(feature = "http-api")]
pub use api::HttpPlaybackApi;
pub use error::{ProgressError, Result};
pub use record::{is_finished, offline_record, percent_complete, progression_resource};
pub use synchronizer::{PlaybackTarget, ProgressSynchronizer, ResumeOutcome, TickOutcome};
pub use token::TokenState;
pub use watermark::Watermark;
