use crate::engine::QueryCountMap;
use crate::timeline::{PerSecondSeries, TimeAxis};
use crate::timestamp::format_instant;
use connscope_common::{ConnScopeError, Result};

/// Element-wise sum of two partials on the same axis origin. A shorter partial counts as
/// zero past its end.
pub fn merge_series_pair(a: PerSecondSeries, b: PerSecondSeries) -> Result<PerSecondSeries> {
    if a.axis.origin != b.axis.origin {
        return Err(ConnScopeError::AxisMismatch(format!(
            "origins {} and {}",
            format_instant(&a.axis.origin),
            format_instant(&b.axis.origin)
        )));
    }
    let (mut long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    for (acc, c) in long.counts.iter_mut().zip(short.counts) {
        *acc += c;
    }
    Ok(long)
}

/// Sum every partial onto `axis`. The result always spans the full axis.
pub fn merge_series<I>(axis: TimeAxis, partials: I) -> Result<PerSecondSeries>
where
    I: IntoIterator<Item = PerSecondSeries>,
{
    let mut total = PerSecondSeries::zeros(axis);
    for partial in partials {
        if partial.len() > axis.len {
            return Err(ConnScopeError::AxisMismatch(format!(
                "partial of {} points exceeds axis of {}",
                partial.len(),
                axis.len
            )));
        }
        total = merge_series_pair(total, partial)?;
    }
    Ok(total)
}

pub fn merge_query_map_pair(mut a: QueryCountMap, b: QueryCountMap) -> QueryCountMap {
    for (instant, count) in b {
        *a.entry(instant).or_insert(0) += count;
    }
    a
}

/// key union, values summed where keys collide
pub fn merge_query_maps<I>(partials: I) -> QueryCountMap
where
    I: IntoIterator<Item = QueryCountMap>,
{
    partials
        .into_iter()
        .fold(QueryCountMap::new(), merge_query_map_pair)
}
