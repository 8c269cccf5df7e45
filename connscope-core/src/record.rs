use chrono::{NaiveDateTime, TimeDelta};

/// One logged connection, active over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub ip: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Record {
    pub fn new(ip: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            ip: ip.into(),
            start,
            end,
        }
    }

    /// `start = end - time_taken`; `None` if the subtraction leaves chrono's range
    pub fn from_end(ip: impl Into<String>, end: NaiveDateTime, time_taken: TimeDelta) -> Option<Self> {
        let start = end.checked_sub_signed(time_taken)?;
        Some(Self::new(ip, start, end))
    }

    /// start inclusive, end exclusive
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.end > instant && instant >= self.start
    }

    /// zero or negative duration: never active, but still part of range discovery
    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }
}
