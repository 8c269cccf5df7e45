use crate::record::Record;
use crate::timestamp::{parse_log_instant, seconds_to_delta};
use connscope_common::{ConnScopeError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub const REQUIRED_COLUMNS: [&str; 3] = ["ip", "endTs", "timeTaken"];

// pandas' default NA markers; a field holding one of these counts as missing
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Deserialize)]
struct RawRecord {
    ip: Option<String>,
    #[serde(rename = "endTs")]
    end_ts: Option<String>,
    #[serde(rename = "timeTaken")]
    time_taken: Option<String>,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !NA_VALUES.contains(&v.as_str()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub rows: u64,
    pub kept: u64,
    pub dropped: u64, // rows missing a required field
}

#[derive(Debug, Clone)]
pub struct LoadedChunk {
    pub records: Vec<Record>,
    pub stats: LoadStats,
}

pub fn load_chunk(path: &Path) -> Result<LoadedChunk> {
    let file = std::fs::File::open(path)?;
    let loaded = read_records(file, path)?;
    debug!(
        chunk = %path.display(),
        rows = loaded.stats.rows,
        kept = loaded.stats.kept,
        dropped = loaded.stats.dropped,
        "loaded chunk"
    );
    if loaded.records.is_empty() {
        warn!(chunk = %path.display(), "chunk has no complete connection records");
    }
    Ok(loaded)
}

/// Parse delimited log data with a header row. `origin` only labels errors.
pub fn read_records<R: Read>(reader: R, origin: &Path) -> Result<LoadedChunk> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // short rows leave trailing fields missing
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ConnScopeError::MissingColumn {
                path: origin.to_path_buf(),
                column,
            });
        }
    }
    let mut records = Vec::new();
    let mut stats = LoadStats::default();
    for row in rdr.records() {
        let row = row?;
        stats.rows += 1;
        let line = row.position().map(|p| p.line()).unwrap_or(stats.rows + 1);
        let raw: RawRecord = row.deserialize(Some(&headers))?;
        let (Some(ip), Some(end_ts), Some(time_taken)) =
            (present(raw.ip), present(raw.end_ts), present(raw.time_taken))
        else {
            stats.dropped += 1;
            debug!(line, "dropping incomplete record");
            continue;
        };
        let field_err = |field: &'static str, value: &str| ConnScopeError::RecordField {
            path: origin.to_path_buf(),
            row: line,
            field,
            value: value.to_owned(),
        };
        let end = parse_log_instant(&end_ts).ok_or_else(|| field_err("endTs", &end_ts))?;
        let taken = time_taken
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(seconds_to_delta)
            .ok_or_else(|| field_err("timeTaken", &time_taken))?;
        let record = Record::from_end(ip, end, taken).ok_or_else(|| field_err("timeTaken", &time_taken))?;
        records.push(record);
        stats.kept += 1;
    }
    Ok(LoadedChunk { records, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_query;

    fn load(data: &str) -> Result<LoadedChunk> {
        read_records(data.as_bytes(), Path::new("mem.csv"))
    }

    #[test]
    fn computes_start_from_duration() {
        let chunk = load("ip,endTs,timeTaken\n10.0.0.1,2019-10-31 10:00:05.000,5\n").unwrap();
        assert_eq!(chunk.records.len(), 1);
        let r = &chunk.records[0];
        assert_eq!(r.ip, "10.0.0.1");
        assert_eq!(r.start, parse_query("2019-10-31 10:00:00.0").unwrap());
        assert_eq!(r.end, parse_query("2019-10-31 10:00:05.0").unwrap());
    }

    #[test]
    fn extra_columns_and_order_ignored() {
        let chunk = load("timeTaken,status,endTs,ip\n1.5,200,2019-10-31 10:00:05,a\n").unwrap();
        assert_eq!(chunk.records[0].start, parse_query("2019-10-31 10:00:03.5").unwrap());
    }

    #[test]
    fn incomplete_rows_dropped() {
        let data = "ip,endTs,timeTaken\n\
                    a,2019-10-31 10:00:05,\n\
                    ,2019-10-31 10:00:05,1\n\
                    c,NaN,1\n\
                    d,2019-10-31 10:00:05\n\
                    e,2019-10-31 10:00:05,1\n";
        let chunk = load(data).unwrap();
        assert_eq!(chunk.stats, LoadStats { rows: 5, kept: 1, dropped: 4 });
        assert_eq!(chunk.records[0].ip, "e");
    }

    #[test]
    fn negative_duration_kept() {
        let chunk = load("ip,endTs,timeTaken\na,2019-10-31 10:00:05,-2\n").unwrap();
        assert!(chunk.records[0].is_degenerate());
    }

    #[test]
    fn missing_column_is_error() {
        let err = load("ip,endTs\na,2019-10-31 10:00:05\n").unwrap_err();
        assert!(matches!(err, ConnScopeError::MissingColumn { column: "timeTaken", .. }));
    }

    #[test]
    fn unparseable_end_is_error() {
        let err = load("ip,endTs,timeTaken\na,2019-10-31 10:00:05,1\nb,tomorrow,1\n").unwrap_err();
        match err {
            ConnScopeError::RecordField { row, field, value, .. } => {
                assert_eq!(row, 3);
                assert_eq!(field, "endTs");
                assert_eq!(value, "tomorrow");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unparseable_duration_is_error() {
        let err = load("ip,endTs,timeTaken\na,2019-10-31 10:00:05,slow\n").unwrap_err();
        assert!(matches!(err, ConnScopeError::RecordField { field: "timeTaken", .. }));
    }

    #[test]
    fn header_only_is_empty() {
        let chunk = load("ip,endTs,timeTaken\n").unwrap();
        assert!(chunk.records.is_empty());
        assert_eq!(chunk.stats.rows, 0);
    }
}
