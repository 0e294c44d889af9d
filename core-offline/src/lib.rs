//! # Offline State
//!
//! Aggregates per-episode download state into collection state.
//!
//! - [`DownloadAggregator`]: pure roll-up of leaf states
//! - [`CollectionRollup`]: applies the roll-up to a resolved collection

pub mod aggregator;
pub mod rollup;

pub use aggregator::{aggregate, DownloadAggregator};
pub use rollup::CollectionRollup;
