use super::ReportError;

/// Inclusive `[start, end]` unix-second range; `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimeWindow {
    start: i64,
    end: i64,
}

impl TimeWindow {
    pub(crate) fn new(start: i64, end: i64) -> Result<Self, ReportError> {
        if start >= end {
            return Err(ReportError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Missing or zero bounds default to the `default_span_secs` ending at `now`.
    pub(crate) fn resolve(
        start: Option<i64>,
        end: Option<i64>,
        now: i64,
        default_span_secs: i64,
    ) -> Result<Self, ReportError> {
        let start = start
            .filter(|v| *v != 0)
            .unwrap_or_else(|| now.saturating_sub(default_span_secs));
        let end = end.filter(|v| *v != 0).unwrap_or(now);
        Self::new(start, end)
    }

    pub(crate) fn start(&self) -> i64 {
        self.start
    }

    pub(crate) fn end(&self) -> i64 {
        self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_empty_and_inverted_ranges() {
        assert!(matches!(
            TimeWindow::new(10, 10),
            Err(ReportError::InvalidTimeRange { start: 10, end: 10 })
        ));
        assert!(matches!(
            TimeWindow::new(20, 10),
            Err(ReportError::InvalidTimeRange { .. })
        ));
        assert!(TimeWindow::new(10, 11).is_ok());
    }

    #[test]
    fn resolve_defaults_to_trailing_span() {
        let window = TimeWindow::resolve(None, None, 100_000, 86_400).expect("resolve");
        assert_eq!(window.start(), 13_600);
        assert_eq!(window.end(), 100_000);
    }

    #[test]
    fn resolve_treats_zero_as_unset() {
        let window = TimeWindow::resolve(Some(0), Some(950), 1_000, 100).expect("resolve");
        assert_eq!(window.start(), 900);
        assert_eq!(window.end(), 950);
    }

    #[test]
    fn resolve_validates_after_defaulting() {
        assert!(matches!(
            TimeWindow::resolve(None, Some(500), 1_000, 100),
            Err(ReportError::InvalidTimeRange { start: 900, end: 500 })
        ));
    }
}
