pub mod engine;
pub mod loader;
pub mod merge;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod source;
pub mod splitter;
pub mod stats;
pub mod timeline;
pub mod timestamp;

pub use connscope_common::{ConnScopeError, Result};
pub use engine::{count_active, query_map, query_map_str, QueryCountMap};
pub use loader::{load_chunk, read_records, LoadStats, LoadedChunk};
pub use merge::{merge_query_map_pair, merge_query_maps, merge_series, merge_series_pair};
pub use pipeline::{analyze, build_series, summarize, Analysis, ChunkSummary, PipelineOptions};
pub use record::Record;
pub use report::{export_csv, export_json, write_plan, write_query_counts, write_stats};
pub use source::{ChunkSource, FileChunks, MemoryChunks};
pub use splitter::{chunk_path, needs_split, plan_chunks, split_by_line_count, ChunkPlan};
pub use stats::VolumeStats;
pub use timeline::{partial_series, PerSecondSeries, TimeAxis, TimeRange};
pub use timestamp::{format_instant, parse_queries, parse_query};
