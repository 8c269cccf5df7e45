use crate::engine::{query_map, QueryCountMap};
use crate::merge::{merge_query_map_pair, merge_series_pair};
use crate::record::Record;
use crate::source::ChunkSource;
use crate::stats::VolumeStats;
use crate::timeline::{partial_series, PerSecondSeries, TimeAxis, TimeRange};
use chrono::NaiveDateTime;
use connscope_common::{ConnScopeError, Result};
use rayon::prelude::*;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub parallel: bool, // one rayon task per chunk when true
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { parallel: true }
    }
}

/// First-pass result: the global time range plus the query counts, both merged over chunks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkSummary {
    pub range: Option<TimeRange>,
    pub query_counts: QueryCountMap,
    pub records: u64,
}

impl ChunkSummary {
    pub fn of(records: &[Record], queries: &[NaiveDateTime]) -> Self {
        Self {
            range: TimeRange::of(records),
            query_counts: query_map(records, queries),
            records: records.len() as u64,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            range: TimeRange::union_opt(self.range, other.range),
            query_counts: merge_query_map_pair(self.query_counts, other.query_counts),
            records: self.records + other.records,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub query_counts: QueryCountMap,
    pub range: Option<TimeRange>,
    pub series: Option<PerSecondSeries>, // None when no chunk had a record
    pub records: u64,
}

impl Analysis {
    pub fn stats(&self) -> Result<VolumeStats> {
        match &self.series {
            Some(series) => VolumeStats::from_series(series),
            None => Err(ConnScopeError::NoData),
        }
    }
}

fn load_chunk_logged<S: ChunkSource + ?Sized>(source: &S, index: usize) -> Result<Vec<Record>> {
    source.load(index).inspect_err(|e| {
        error!(chunk = %source.label(index), "failed to load chunk: {e}");
    })
}

/// Load every chunk, map it to a partial, and reduce the partials. Records are dropped as soon
/// as their chunk's partial exists.
fn map_reduce_chunks<S, T, M, R>(
    source: &S,
    options: PipelineOptions,
    identity: impl Fn() -> T + Sync + Send,
    map: M,
    reduce: R,
) -> Result<T>
where
    S: ChunkSource + ?Sized,
    T: Send,
    M: Fn(Vec<Record>) -> T + Sync + Send,
    R: Fn(T, T) -> Result<T> + Sync + Send,
{
    let n = source.chunk_count();
    if options.parallel {
        (0..n)
            .into_par_iter()
            .map(|i| load_chunk_logged(source, i).map(&map))
            .try_reduce(&identity, &reduce)
    } else {
        let mut acc = identity();
        for i in 0..n {
            let part = map(load_chunk_logged(source, i)?);
            acc = reduce(acc, part)?;
        }
        Ok(acc)
    }
}

/// Phase one: range discovery and per-query counts.
pub fn summarize<S: ChunkSource + ?Sized>(
    source: &S,
    queries: &[NaiveDateTime],
    options: PipelineOptions,
) -> Result<ChunkSummary> {
    let summary = map_reduce_chunks(
        source,
        options,
        ChunkSummary::default,
        |records| ChunkSummary::of(&records, queries),
        |a, b| Ok(a.merge(b)),
    )?;
    info!(
        chunks = source.chunk_count(),
        records = summary.records,
        "range discovery complete"
    );
    Ok(summary)
}

/// Phase two: every chunk counted on the shared axis, then summed.
pub fn build_series<S: ChunkSource + ?Sized>(
    source: &S,
    axis: TimeAxis,
    options: PipelineOptions,
) -> Result<PerSecondSeries> {
    debug!(points = axis.len, "building per-second series");
    map_reduce_chunks(
        source,
        options,
        || PerSecondSeries::zeros(axis),
        |records| partial_series(&records, &axis),
        merge_series_pair,
    )
}

pub fn analyze<S: ChunkSource + ?Sized>(
    source: &S,
    queries: &[NaiveDateTime],
    options: PipelineOptions,
) -> Result<Analysis> {
    let summary = summarize(source, queries, options)?;
    let series = match summary.range {
        Some(range) => Some(build_series(source, TimeAxis::covering(range), options)?),
        None => None,
    };
    Ok(Analysis {
        query_counts: summary.query_counts,
        range: summary.range,
        series,
        records: summary.records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::count_active;
    use crate::source::MemoryChunks;
    use crate::timestamp::parse_query;

    fn at(s: &str) -> NaiveDateTime {
        parse_query(&format!("2019-10-31 {s}")).unwrap()
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new("a", at("10:00:00.0"), at("10:00:05.0")),
            Record::new("b", at("10:00:01.5"), at("10:00:03.0")),
            Record::new("c", at("10:00:04.0"), at("10:00:09.0")),
            Record::new("d", at("10:00:02.0"), at("10:00:02.0")),
            Record::new("e", at("10:00:07.0"), at("10:00:03.0")),
            Record::new("f", at("10:00:03.0"), at("10:00:12.5")),
        ]
    }

    fn queries() -> Vec<NaiveDateTime> {
        ["10:00:00.0", "10:00:03.0", "10:00:05.0", "10:00:12.499999", "10:00:20.0"]
            .iter()
            .map(|s| at(s))
            .collect()
    }

    #[test]
    fn chunking_does_not_change_result() {
        let rs = records();
        let qs = queries();
        let whole = analyze(&MemoryChunks::new(vec![rs.clone()]), &qs, PipelineOptions::default()).unwrap();
        for size in 1..=rs.len() {
            for parallel in [true, false] {
                let split = MemoryChunks::split(&rs, size);
                let got = analyze(&split, &qs, PipelineOptions { parallel }).unwrap();
                assert_eq!(got.query_counts, whole.query_counts, "size {size}");
                assert_eq!(got.series, whole.series, "size {size}");
                assert_eq!(got.range, whole.range);
                assert_eq!(got.records, rs.len() as u64);
            }
        }
    }

    #[test]
    fn series_agrees_with_count_active() {
        let rs = records();
        let a = analyze(&MemoryChunks::split(&rs, 2), &[], PipelineOptions::default()).unwrap();
        let series = a.series.unwrap();
        assert_eq!(series.axis.origin, at("10:00:00.0"));
        assert_eq!(series.len(), 13);
        for (t, c) in series.iter() {
            assert_eq!(c, count_active(&rs, t), "at {t}");
        }
    }

    #[test]
    fn empty_chunks_do_not_shift_range() {
        let rs = records();
        let chunks = MemoryChunks::new(vec![Vec::new(), rs.clone(), Vec::new()]);
        let a = analyze(&chunks, &queries(), PipelineOptions::default()).unwrap();
        assert_eq!(a.range, TimeRange::of(&rs));
    }

    #[test]
    fn no_records_is_no_data() {
        let qs = queries();
        let a = analyze(&MemoryChunks::new(vec![Vec::new()]), &qs, PipelineOptions::default()).unwrap();
        assert!(a.series.is_none());
        assert!(a.query_counts.values().all(|&c| c == 0));
        assert_eq!(a.query_counts.len(), qs.len());
        assert!(matches!(a.stats(), Err(ConnScopeError::NoData)));
    }

    #[test]
    fn no_chunks_gives_empty_map() {
        let a = analyze(&MemoryChunks::default(), &queries(), PipelineOptions::default()).unwrap();
        assert!(a.query_counts.is_empty());
        assert!(a.stats().is_err());
    }

    #[test]
    fn two_chunk_statistics() {
        // chunk A yields [1,2,1], chunk B yields [0,1,1] over seconds 0..3
        let a = vec![
            Record::new("a1", at("10:00:00.0"), at("10:00:03.0")),
            Record::new("a2", at("10:00:01.0"), at("10:00:02.0")),
        ];
        let b = vec![Record::new("b1", at("10:00:01.0"), at("10:00:03.0"))];
        let analysis = analyze(&MemoryChunks::new(vec![a, b]), &[], PipelineOptions::default()).unwrap();
        assert_eq!(analysis.series.as_ref().unwrap().counts, vec![1, 3, 2]);
        let st = analysis.stats().unwrap();
        assert_eq!(st.max_volume, 3);
        assert_eq!(st.min_volume, 1);
        assert!((st.mean_volume - 2.0).abs() < 1e-12);
        assert_eq!(st.peak_instants, vec![at("10:00:01.0")]);
    }
}
