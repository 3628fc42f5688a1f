//! Daily energy-counter baseline.
//!
//! AC meter boards report cumulative energy per channel. The first energy record of
//! each UTC day is preceded by a synthetic zero record so dashboards can show daily
//! consumption from the cumulative series. The tracker remembers, per channel, the
//! last day such a reset was inserted.
//!
//! This is the only state shared between decode calls. It is owned by the caller
//! and guarded by a mutex so a multi-threaded server cannot insert a reset twice.

use chrono::{DateTime, NaiveDate};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Identifies one metering channel of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub device_id: String,
    pub node_address: u8,
    pub channel: u8,
}

impl ChannelKey {
    pub fn new(device_id: &str, node_address: u8, channel: u8) -> Self {
        Self {
            device_id: device_id.to_string(),
            node_address,
            channel,
        }
    }
}

/// Last reset day per channel; channels never seen read as 1970-01-01.
#[derive(Debug, Default)]
pub struct EnergyResetTracker {
    last_reset: Mutex<HashMap<ChannelKey, NaiveDate>>,
}

impl EnergyResetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<ChannelKey, NaiveDate>> {
        // The map stays consistent even if a holder panicked: every write is a single insert.
        self.last_reset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Day of the last inserted reset for `key`.
    pub fn last_reset(&self, key: &ChannelKey) -> NaiveDate {
        self.table().get(key).copied().unwrap_or_default()
    }

    /// Record an energy reading at `timestamp`.
    ///
    /// Returns `true` if it is the first reading of a later UTC day than the last
    /// reset, in which case the caller must insert the synthetic zero record.
    pub fn observe(&self, key: &ChannelKey, timestamp: i64) -> bool {
        let Some(day) = DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive()) else {
            warn!("energy reading at out-of-range timestamp {timestamp}; no daily reset");
            return false;
        };

        let mut table = self.table();
        let last = table.get(key).copied().unwrap_or_default();
        if day > last {
            debug!(
                "new energy day {day} for {}/{}/{} (previous {last})",
                key.device_id, key.node_address, key.channel
            );
            table.insert(key.clone(), day);
            true
        } else {
            false
        }
    }

    /// Forget every channel.
    pub fn clear(&self) {
        self.table().clear();
    }
}
