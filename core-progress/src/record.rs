//! Offline progression records.

use bridge_traits::ProgressionRecord;
use chrono::{DateTime, Utc};
use core_graph::{Attributes, Resource, ResourceKind};

/// Whole percent watched, rounded down and clamped to 0..=100.
///
/// 0 when the duration is unknown or not positive.
pub fn percent_complete(progress_seconds: i64, duration_seconds: Option<i64>) -> u8 {
    match duration_seconds {
        Some(duration) if duration > 0 => {
            let percent = progress_seconds.max(0).saturating_mul(100) / duration;
            percent.min(100) as u8
        }
        _ => 0,
    }
}

/// Finished once `percent` reaches `threshold` (inclusive).
pub fn is_finished(percent: u8, threshold: u8) -> bool {
    percent >= threshold
}

/// Record produced while offline, not yet pushed to the server.
pub fn offline_record(
    content_id: &str,
    progression_id: Option<String>,
    progress_seconds: i64,
    duration_seconds: Option<i64>,
    finished_threshold: u8,
    updated_at: DateTime<Utc>,
) -> ProgressionRecord {
    let percent = percent_complete(progress_seconds, duration_seconds);
    ProgressionRecord {
        content_id: content_id.to_string(),
        progression_id,
        percent_complete: percent,
        progress_seconds,
        finished: is_finished(percent, finished_threshold),
        updated_at,
        synced: false,
    }
}

/// Progression resource mirroring `record`, for applying it to a graph.
pub fn progression_resource(record: &ProgressionRecord) -> Resource {
    Resource {
        id: record.progression_id.clone(),
        kind: Some(ResourceKind::Progression),
        attributes: Some(Attributes {
            content_id: Some(record.content_id.clone()),
            percent_complete: Some(record.percent_complete),
            finished: Some(record.finished),
            progress_seconds: Some(record.progress_seconds),
            updated_at: Some(record.updated_at),
            ..Default::default()
        }),
        ..Default::default()
    }
}
