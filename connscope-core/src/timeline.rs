use crate::record::Record;
use crate::timestamp::{ceil_seconds, nanos_between};
use chrono::{NaiveDateTime, TimeDelta};
use connscope_common::{ConnScopeError, Result};
use serde::{Deserialize, Serialize};

/// `[start, end)` spanned by a set of records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// min start / max end; `None` for an empty set
    pub fn of(records: &[Record]) -> Option<Self> {
        let start = records.iter().map(|r| r.start).min()?;
        let end = records.iter().map(|r| r.end).max()?;
        Some(Self { start, end })
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn union_opt(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// One-second spaced instants `origin + k s` for `k in 0..len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub origin: NaiveDateTime,
    pub len: usize,
}

impl TimeAxis {
    /// Every point `origin + k s` strictly before `range.end`. An exact N second span has N points.
    pub fn covering(range: TimeRange) -> Self {
        let len = ceil_seconds(nanos_between(range.start, range.end)).max(0);
        Self {
            origin: range.start,
            len: usize::try_from(len).unwrap_or(usize::MAX),
        }
    }

    pub fn point(&self, k: usize) -> NaiveDateTime {
        self.origin + TimeDelta::seconds(k as i64)
    }

    pub fn points(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.len).map(|k| self.point(k))
    }

    /// first axis index at or after `t`, may fall outside `0..=len`
    fn index_at_or_after(&self, t: NaiveDateTime) -> i128 {
        ceil_seconds(nanos_between(self.origin, t))
    }
}

/// Active-connection count per second along a `TimeAxis`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerSecondSeries {
    pub axis: TimeAxis,
    pub counts: Vec<u64>,
}

impl PerSecondSeries {
    pub fn zeros(axis: TimeAxis) -> Self {
        Self {
            axis,
            counts: vec![0; axis.len],
        }
    }

    pub fn from_counts(axis: TimeAxis, counts: Vec<u64>) -> Result<Self> {
        if counts.len() != axis.len {
            return Err(ConnScopeError::AxisMismatch(format!(
                "{} counts for an axis of {} points",
                counts.len(),
                axis.len
            )));
        }
        Ok(Self { axis, counts })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map(|(k, &c)| (self.axis.point(k), c))
    }
}

/// Count, for every axis point, the records containing it.
///
/// A record covers the contiguous index run `[ceil(start), ceil(end))` relative to the
/// origin, so each one is a +1/-1 pair in a difference array; the prefix sum is the series.
pub fn partial_series(records: &[Record], axis: &TimeAxis) -> PerSecondSeries {
    let len = axis.len as i128;
    let mut diff = vec![0i64; axis.len + 1];
    for r in records {
        let lo = axis.index_at_or_after(r.start).max(0);
        let hi = axis.index_at_or_after(r.end).min(len);
        if lo >= hi {
            continue;
        }
        diff[lo as usize] += 1;
        diff[hi as usize] -= 1;
    }
    let mut counts = Vec::with_capacity(axis.len);
    let mut running = 0i64;
    for d in &diff[..axis.len] {
        running += d;
        counts.push(running as u64);
    }
    PerSecondSeries {
        axis: *axis,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::count_active;
    use crate::timestamp::parse_query;

    fn at(s: &str) -> NaiveDateTime {
        parse_query(&format!("2019-10-31 {s}")).unwrap()
    }

    #[test]
    fn range_of_records() {
        let rs = vec![
            Record::new("a", at("10:00:02.0"), at("10:00:05.0")),
            Record::new("b", at("10:00:01.0"), at("10:00:03.0")),
        ];
        let r = TimeRange::of(&rs).unwrap();
        assert_eq!(r.start, at("10:00:01.0"));
        assert_eq!(r.end, at("10:00:05.0"));
        assert_eq!(TimeRange::of(&[]), None);
    }

    #[test]
    fn union_is_symmetric() {
        let a = TimeRange { start: at("10:00:01.0"), end: at("10:00:03.0") };
        let b = TimeRange { start: at("10:00:02.0"), end: at("10:00:09.0") };
        assert_eq!(a.union(b), b.union(a));
        assert_eq!(TimeRange::union_opt(None, Some(a)), Some(a));
        assert_eq!(TimeRange::union_opt(Some(a), None), Some(a));
        assert_eq!(TimeRange::union_opt(None, None), None);
    }

    #[test]
    fn exact_span_is_half_open() {
        let axis = TimeAxis::covering(TimeRange { start: at("10:00:00.0"), end: at("10:00:05.0") });
        assert_eq!(axis.len, 5);
        let pts: Vec<_> = axis.points().collect();
        assert_eq!(pts.first(), Some(&at("10:00:00.0")));
        assert_eq!(pts.last(), Some(&at("10:00:04.0")));
    }

    #[test]
    fn fractional_span_rounds_up() {
        let axis = TimeAxis::covering(TimeRange { start: at("10:00:00.5"), end: at("10:00:03.0") });
        assert_eq!(axis.len, 3); // .5, 1.5, 2.5
        assert_eq!(axis.point(2), at("10:00:02.5"));
    }

    #[test]
    fn inverted_range_is_empty() {
        let axis = TimeAxis::covering(TimeRange { start: at("10:00:05.0"), end: at("10:00:01.0") });
        assert_eq!(axis.len, 0);
    }

    #[test]
    fn series_is_gapless_and_increasing() {
        let axis = TimeAxis::covering(TimeRange { start: at("10:00:00.0"), end: at("10:01:00.0") });
        let s = PerSecondSeries::zeros(axis);
        assert_eq!(s.len(), 60);
        let pts: Vec<_> = s.iter().map(|(t, _)| t).collect();
        for w in pts.windows(2) {
            assert_eq!(w[1] - w[0], TimeDelta::seconds(1));
        }
    }

    #[test]
    fn partial_series_matches_direct_counting() {
        let rs = vec![
            Record::new("a", at("10:00:00.0"), at("10:00:05.0")),
            Record::new("b", at("10:00:01.5"), at("10:00:03.0")),
            Record::new("c", at("10:00:02.0"), at("10:00:02.0")), // zero length
            Record::new("d", at("10:00:04.0"), at("10:00:01.0")), // negative length
            Record::new("e", at("10:00:03.0"), at("10:00:07.25")),
        ];
        let axis = TimeAxis::covering(TimeRange::of(&rs).unwrap());
        assert_eq!(axis.len, 8);
        let s = partial_series(&rs, &axis);
        for (t, c) in s.iter() {
            assert_eq!(c, count_active(&rs, t), "at {t}");
        }
        assert_eq!(s.counts, vec![1, 1, 2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn records_outside_axis_clamped() {
        let axis = TimeAxis { origin: at("10:00:02.0"), len: 2 };
        let rs = vec![Record::new("a", at("10:00:00.0"), at("10:00:09.0"))];
        assert_eq!(partial_series(&rs, &axis).counts, vec![1, 1]);
    }

    #[test]
    fn from_counts_checks_length() {
        let axis = TimeAxis { origin: at("10:00:00.0"), len: 3 };
        assert!(PerSecondSeries::from_counts(axis, vec![1, 2]).is_err());
        assert!(PerSecondSeries::from_counts(axis, vec![1, 2, 1]).is_ok());
    }
}
