use connscope_common::{Result, SplitConfig};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Which files make up one logical log, and whether they came from a split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPlan {
    pub source: PathBuf,
    pub file_size: u64,
    pub split: bool,
    pub chunks: Vec<PathBuf>,
}

pub fn needs_split(file_size: u64, cfg: &SplitConfig) -> bool {
    file_size >= cfg.threshold_bytes
}

/// `<dir>/<stem>_<n><.ext>`
pub fn chunk_path(source: &Path, n: usize) -> PathBuf {
    let mut name: OsString = source.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!("_{n}"));
    if let Some(ext) = source.extension() {
        name.push(".");
        name.push(ext);
    }
    source.with_file_name(name)
}

/// Stat the log and split it when it reaches the size threshold; otherwise the log is its only chunk.
pub fn plan_chunks(source: &Path, cfg: &SplitConfig) -> Result<ChunkPlan> {
    let file_size = std::fs::metadata(source)?.len();
    let split = needs_split(file_size, cfg);
    let chunks = if split {
        info!(path = %source.display(), file_size, "splitting large log into chunks");
        split_by_line_count(source, cfg.chunk_rows)?
    } else {
        vec![source.to_path_buf()]
    };
    Ok(ChunkPlan {
        source: source.to_path_buf(),
        file_size,
        split,
        chunks,
    })
}

/// Copy the header plus up to `rows` data lines into each chunk file, in order. A header-only
/// input yields no chunks. Lines are split on `\n` only; quoted newlines are not recognized.
pub fn split_by_line_count(source: &Path, rows: usize) -> Result<Vec<PathBuf>> {
    let rows = rows.max(1);
    let mut reader = BufReader::new(File::open(source)?);
    let mut header = Vec::new();
    if reader.read_until(b'\n', &mut header)? == 0 {
        return Ok(Vec::new());
    }
    let mut chunks = Vec::new();
    let mut current: Option<BufWriter<File>> = None;
    let mut in_chunk = 0usize;
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let mut out = match current.take() {
            Some(out) => out,
            None => {
                let path = chunk_path(source, chunks.len() + 1);
                info!(chunk = %path.display(), "make file");
                let mut out = BufWriter::new(File::create(&path)?);
                out.write_all(&header)?;
                chunks.push(path);
                out
            }
        };
        out.write_all(&line)?;
        in_chunk += 1;
        if in_chunk == rows {
            out.flush()?;
            in_chunk = 0;
        } else {
            current = Some(out);
        }
    }
    if let Some(mut done) = current.take() {
        done.flush()?;
    }
    Ok(chunks)
}
