use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Value wrapped with the moment it entered the store, used by escrow
/// buckets for TTL expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestamped<T> {
    pub timestamp: DateTime<Local>,
    pub event: T,
}

impl<T> Timestamped<T> {
    pub fn new(event: T) -> Self {
        Self {
            timestamp: Local::now(),
            event,
        }
    }

    pub fn is_stale(&self, duration: Duration) -> bool {
        match chrono::Duration::from_std(duration) {
            Ok(duration) => Local::now() - self.timestamp > duration,
            Err(_) => false,
        }
    }
}

// timestamps are ignored when comparing escrowed values
impl<T: PartialEq> PartialEq for Timestamped<T> {
    fn eq(&self, other: &Self) -> bool {
        self.event == other.event
    }
}

impl<T> From<T> for Timestamped<T> {
    fn from(event: T) -> Self {
        Self::new(event)
    }
}
