use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ACTIVITY_LOG_CAPACITY: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub customer_name: String,
    pub action: String,
    pub stage: String,
    pub timestamp: DateTime<Utc>,
}

/// Most-recent-first feed of user-facing actions, bounded at
/// [`ACTIVITY_LOG_CAPACITY`]. Evicted entries are dropped, not archived.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLog(Vec<ActivityEntry>);

impl ActivityLog {
    /// Prepends `entry` and returns how many old entries fell off the end.
    pub fn record(&mut self, entry: ActivityEntry) -> usize {
        self.0.insert(0, entry);
        let evicted = self.0.len().saturating_sub(ACTIVITY_LOG_CAPACITY);
        self.0.truncate(ACTIVITY_LOG_CAPACITY);
        evicted
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn latest(&self) -> Option<&ActivityEntry> {
        self.0.first()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{ActivityEntry, ActivityLog, ACTIVITY_LOG_CAPACITY};

    fn entry(customer: &str, minute: i64) -> ActivityEntry {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().expect("valid timestamp");
        ActivityEntry {
            customer_name: customer.to_string(),
            action: "Updated in Make PO".to_string(),
            stage: "Make PO".to_string(),
            timestamp: base + Duration::minutes(minute),
        }
    }

    #[test]
    fn newest_entry_comes_first() {
        let mut log = ActivityLog::default();
        log.record(entry("C1", 0));
        log.record(entry("C2", 1));

        assert_eq!(log.latest().map(|e| e.customer_name.as_str()), Some("C2"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn oldest_entry_is_evicted_past_capacity() {
        let mut log = ActivityLog::default();
        let mut evicted = 0;
        for (minute, customer) in ["C1", "C2", "C3", "C4", "C5", "C6"].iter().enumerate() {
            evicted += log.record(entry(customer, minute as i64));
        }

        let names: Vec<&str> =
            log.entries().iter().map(|entry| entry.customer_name.as_str()).collect();
        assert_eq!(names, vec!["C6", "C5", "C4", "C3", "C2"]);
        assert_eq!(log.len(), ACTIVITY_LOG_CAPACITY);
        assert_eq!(evicted, 1);
    }

    #[test]
    fn serializes_as_a_plain_array() {
        let mut log = ActivityLog::default();
        log.record(entry("Rohan Mehta", 0));

        let value = serde_json::to_value(&log).expect("serialize log");
        assert!(value.is_array());
        assert_eq!(value[0]["customerName"], "Rohan Mehta");
    }
}
