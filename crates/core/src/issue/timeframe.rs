use chrono::{DateTime, Utc};
use std::fmt;

/// The half-open time window `(start, end]` bounding which issues a
/// registry considers updated for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeframe {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Timeframe {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Render the window as a JQL fragment using epoch-millisecond bounds.
    pub fn jql_fragment(&self) -> String {
        format!(
            "updated > {} AND updated <= {}",
            self.start.timestamp_millis(),
            self.end.timestamp_millis()
        )
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_jql_fragment_uses_millis() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 15, 10, 1, 0).unwrap();
        let timeframe = Timeframe::new(start, end);

        assert_eq!(
            timeframe.jql_fragment(),
            format!(
                "updated > {} AND updated <= {}",
                start.timestamp_millis(),
                end.timestamp_millis()
            )
        );
    }

    #[test]
    fn test_display() {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 15, 10, 1, 0).unwrap();
        let rendered = Timeframe::new(start, end).to_string();
        assert!(rendered.starts_with('('));
        assert!(rendered.ends_with(']'));
    }
}
