//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the course client core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! its validated [`CoreConfig`](config::CoreConfig) and the
//! [`EventBus`](events::EventBus) used to notify the host.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
