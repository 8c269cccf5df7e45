use crate::engine::QueryCountMap;
use crate::pipeline::Analysis;
use crate::splitter::ChunkPlan;
use crate::stats::VolumeStats;
use crate::timeline::PerSecondSeries;
use crate::timestamp::format_instant;
use connscope_common::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

// --- headless text output ---

pub fn write_plan<W: Write>(out: &mut W, plan: &ChunkPlan, queries: &[String]) -> Result<()> {
    if plan.split {
        writeln!(out, "SPLIT THE BIG FILE TO CHUNKS")?;
    } else {
        writeln!(out, "NO NEED TO SPLIT THE FILE TO CHUNKS")?;
    }
    writeln!(out, "{:<20} {} byte(s)", "Size of file:", plan.file_size)?;
    writeln!(out, "{:<20} {}", "Query timestamps:", queries.join(", "))?;
    writeln!(out, "{:<20} {}", "Chunk files:", plan.chunks.len())?;
    for path in &plan.chunks {
        if plan.split {
            writeln!(out, "make file: {}", path.display())?;
        } else {
            writeln!(out, "  {}", path.display())?;
        }
    }
    Ok(())
}

pub fn write_query_counts<W: Write>(out: &mut W, counts: &QueryCountMap) -> Result<()> {
    writeln!(out, "--- Open connections ---")?;
    for (instant, count) in counts {
        writeln!(out, "{}  {}", format_instant(instant), count)?;
    }
    Ok(())
}

pub fn write_stats<W: Write>(out: &mut W, source: &Path, stats: &VolumeStats) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "--- Volume statistics: {} ---", source.display())?;
    writeln!(out, "Peak volume timestamps:")?;
    for t in &stats.peak_instants {
        writeln!(out, "  {}", format_instant(t))?;
    }
    writeln!(out, "{:<20} {}", "Max volume/sec:", stats.max_volume)?;
    writeln!(out, "{:<20} {}", "Min volume/sec:", stats.min_volume)?;
    writeln!(out, "{:<20} {}", "Mean volume/sec:", stats.mean_volume)?;
    Ok(())
}

// --- JSON export ---

#[derive(Debug, Serialize)]
struct SeriesPoint {
    timestamp: String,
    volume: u64,
}

#[derive(Debug, Serialize)]
struct StatsDoc {
    max_volume: u64,
    min_volume: u64,
    mean_volume: f64,
    peak_timestamps: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReportDoc<'a> {
    source: &'a Path,
    file_size: u64,
    split: bool,
    chunks: &'a [std::path::PathBuf],
    records: u64,
    query_counts: BTreeMap<String, u64>,
    statistics: Option<StatsDoc>,
    series: Vec<SeriesPoint>,
}

fn series_points(series: Option<&PerSecondSeries>) -> Vec<SeriesPoint> {
    series
        .map(|s| {
            s.iter()
                .map(|(t, volume)| SeriesPoint {
                    timestamp: format_instant(&t),
                    volume,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// `statistics` is null when there were no records
pub fn export_json(output_path: &Path, plan: &ChunkPlan, analysis: &Analysis) -> Result<()> {
    let statistics = analysis.stats().ok().map(|st| StatsDoc {
        max_volume: st.max_volume,
        min_volume: st.min_volume,
        mean_volume: st.mean_volume,
        peak_timestamps: st.peak_instants.iter().map(format_instant).collect(),
    });
    let doc = ReportDoc {
        source: &plan.source,
        file_size: plan.file_size,
        split: plan.split,
        chunks: &plan.chunks,
        records: analysis.records,
        query_counts: analysis
            .query_counts
            .iter()
            .map(|(t, c)| (format_instant(t), *c))
            .collect(),
        statistics,
        series: series_points(analysis.series.as_ref()),
    };
    let mut writer = std::io::BufWriter::new(std::fs::File::create(output_path)?);
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writer.flush()?;
    Ok(())
}

// --- CSV export ---

/// `timestamp,volume` per second
pub fn export_csv(output_path: &Path, series: Option<&PerSecondSeries>) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record(["timestamp", "volume"])?;
    for point in series_points(series) {
        writer.serialize((point.timestamp, point.volume))?;
    }
    writer.flush()?;
    Ok(())
}
