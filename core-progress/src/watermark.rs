//! Throttling watermark for progress reports.

/// Last progress value already reported, in seconds.
///
/// A new report is allowed only once progress has moved at least
/// `throttle_seconds` past the watermark. Online and offline reporting share
/// one watermark so the two paths never count the same seconds twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    last_reported_seconds: i64,
    throttle_seconds: i64,
}

impl Watermark {
    pub fn new(throttle_seconds: i64) -> Self {
        Self {
            last_reported_seconds: 0,
            throttle_seconds,
        }
    }

    pub fn last_reported_seconds(&self) -> i64 {
        self.last_reported_seconds
    }

    /// Whether `progress_seconds` is far enough ahead to be reported.
    pub fn would_advance(&self, progress_seconds: i64) -> bool {
        progress_seconds - self.last_reported_seconds >= self.throttle_seconds
    }

    /// Advance to `progress_seconds` and return the delta, or `None`
    /// without touching the watermark when the advance is below the throttle.
    pub fn advance(&mut self, progress_seconds: i64) -> Option<i64> {
        if !self.would_advance(progress_seconds) {
            return None;
        }
        let delta = progress_seconds - self.last_reported_seconds;
        self.last_reported_seconds = progress_seconds;
        Some(delta)
    }

    pub fn reset(&mut self) {
        self.last_reported_seconds = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_advance_is_throttled() {
        let mut watermark = Watermark::new(5);
        assert_eq!(watermark.advance(3), None);
        assert_eq!(watermark.last_reported_seconds(), 0);
        assert_eq!(watermark.advance(4), None);
    }

    #[test]
    fn test_advance_at_threshold() {
        let mut watermark = Watermark::new(5);
        assert_eq!(watermark.advance(5), Some(5));
        assert_eq!(watermark.last_reported_seconds(), 5);
    }

    #[test]
    fn test_ticks_three_seconds_apart() {
        let mut watermark = Watermark::new(5);
        assert_eq!(watermark.advance(10), Some(10));
        assert_eq!(watermark.advance(13), None);
        assert_eq!(watermark.last_reported_seconds(), 10);
    }

    #[test]
    fn test_ticks_six_seconds_apart() {
        let mut watermark = Watermark::new(5);
        assert_eq!(watermark.advance(10), Some(10));
        assert_eq!(watermark.advance(16), Some(6));
        assert_eq!(watermark.last_reported_seconds(), 16);
    }

    #[test]
    fn test_seeking_back_waits_for_watermark() {
        let mut watermark = Watermark::new(5);
        watermark.advance(60);
        assert_eq!(watermark.advance(20), None);
        assert_eq!(watermark.advance(65), Some(5));

        watermark.reset();
        assert_eq!(watermark.last_reported_seconds(), 0);
    }
}
