use crate::record::Record;
use crate::timestamp::parse_queries;
use chrono::NaiveDateTime;
use connscope_common::Result;
use std::collections::BTreeMap;

/// query instant -> active connection count
pub type QueryCountMap = BTreeMap<NaiveDateTime, u64>;

pub fn count_active(records: &[Record], instant: NaiveDateTime) -> u64 {
    records.iter().filter(|r| r.contains(instant)).count() as u64
}

pub fn query_map(records: &[Record], instants: &[NaiveDateTime]) -> QueryCountMap {
    let mut out = QueryCountMap::new();
    for &instant in instants {
        out.entry(instant)
            .or_insert_with(|| count_active(records, instant));
    }
    out
}

/// same as `query_map` for raw `YYYY-MM-DD HH:MM:SS.ffffff` strings; any bad string fails the whole call
pub fn query_map_str<S: AsRef<str>>(records: &[Record], instants: &[S]) -> Result<QueryCountMap> {
    let parsed = parse_queries(instants)?;
    Ok(query_map(records, &parsed))
}
