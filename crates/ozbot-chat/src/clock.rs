//! Clock collaborator for time-of-day replies and report formatting.

use chrono::{DateTime, FixedOffset, Utc};

/// Source of the current time in the assistant's configured zone.
pub trait Clock: Send + Sync {
    /// Current instant, expressed in the configured offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Label appended to clock times in replies, e.g. "IST".
    fn zone_label(&self) -> &str;
}

/// Wall clock pinned to a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct SystemClock {
    offset: FixedOffset,
    label: String,
}

impl SystemClock {
    pub fn new(offset: FixedOffset, label: impl Into<String>) -> Self {
        Self {
            offset,
            label: label.into(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn zone_label(&self) -> &str {
        &self.label
    }
}

/// Clock frozen at one instant. Used for deterministic replies in tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    at: DateTime<FixedOffset>,
    label: String,
}

impl FixedClock {
    pub fn new(at: DateTime<FixedOffset>, label: impl Into<String>) -> Self {
        Self {
            at,
            label: label.into(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.at
    }

    fn zone_label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_returns_pinned_instant() {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let at = ist.with_ymd_and_hms(2025, 7, 10, 9, 5, 0).unwrap();
        let clock = FixedClock::new(at, "IST");
        assert_eq!(clock.now(), at);
        assert_eq!(clock.zone_label(), "IST");
    }

    #[test]
    fn test_system_clock_uses_offset() {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let clock = SystemClock::new(ist, "IST");
        assert_eq!(clock.now().offset().local_minus_utc(), 330 * 60);
    }
}
