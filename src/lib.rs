//! Workspace umbrella crate.
//!
//! Host applications can depend on `course-client` and enable the documented
//! features instead of wiring each workspace crate individually. The pure
//! graph and offline crates are always available; the `service` feature adds
//! the progress synchronizer and the [`CourseService`] façade.

pub use core_graph as graph;
pub use core_offline as offline;

#[cfg(feature = "service")]
pub use core_progress as progress;
#[cfg(feature = "service")]
pub use core_service::{CourseService, CourseServiceBuilder};
