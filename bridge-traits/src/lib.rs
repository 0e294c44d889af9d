//! # Host Bridge Traits
//!
//! Contracts between the course client core and the host application.
//!
//! ## Overview
//!
//! The core never talks to the network, the database or the OS scheduler
//! directly. Each capability it needs is expressed as a trait here and
//! implemented by the host (Android, iOS, desktop).
//!
//! ## Traits
//!
//! ### Remote
//! - [`PlaybackApi`](playback::PlaybackApi) - Playback token and progress reporting
//! - [`HttpClient`](http::HttpClient) - Raw HTTP for HTTP-backed adapters
//!
//! ### Local
//! - [`LocalProgressStore`](storage::LocalProgressStore) - Offline progression records and watch stats
//! - [`SyncScheduler`](background::SyncScheduler) - Deferred push of offline progress
//!
//! ### Platform Integration
//! - [`NetworkMonitor`](network::NetworkMonitor) - Online/offline detection
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! must keep "the server answered with an error status" (`Http`) separate from
//! "no answer at all" (`Transport`): the core reacts to the two differently.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared across async
//! tasks behind `Arc`.

pub mod background;
pub mod error;
pub mod http;
pub mod network;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use background::{SyncScheduler, TaskConstraints};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use network::{NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType};
pub use playback::{PlaybackApi, PlaybackToken, ProgressUpdateRequest, ProgressUpdateResponse};
pub use storage::{LocalProgressStore, ProgressionRecord};
pub use time::{Clock, ConsoleLogger, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
