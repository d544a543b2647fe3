use chrono::{NaiveDate, Utc};
use std::cell::Cell;

pub trait IdGenerator {
    fn next_id(&self) -> String;

    /// Make sure ids already in use are never handed out again.
    fn reserve(&self, _existing: &str) {}
}

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Millisecond-timestamp ids, bumped past the previous id when two calls land
/// in the same millisecond, so they are strictly increasing within a process.
///
/// The counter is wider than any id `reserve` accepts, so stepping past a
/// stored `i64::MAX` cannot overflow.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: Cell<i128>,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_after(&self, now: i64) -> i128 {
        let id = i128::from(now).max(self.last.get().saturating_add(1));
        self.last.set(id);
        id
    }
}

impl IdGenerator for TimestampIds {
    fn next_id(&self) -> String {
        self.next_after(Utc::now().timestamp_millis()).to_string()
    }

    fn reserve(&self, existing: &str) {
        if let Ok(n) = existing.parse::<i64>() {
            self.last.set(self.last.get().max(i128::from(n)));
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}
