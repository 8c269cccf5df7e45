use crate::loader::load_chunk;
use crate::record::Record;
use connscope_common::Result;
use std::path::PathBuf;

/// An ordered, disjoint set of chunks that together hold every record of one log.
pub trait ChunkSource: Sync {
    fn chunk_count(&self) -> usize;
    /// human-readable name for logs and errors
    fn label(&self, index: usize) -> String;
    fn load(&self, index: usize) -> Result<Vec<Record>>;
}

/// Chunk files on disk, loaded on demand.
#[derive(Debug, Clone)]
pub struct FileChunks {
    paths: Vec<PathBuf>,
}

impl FileChunks {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl ChunkSource for FileChunks {
    fn chunk_count(&self) -> usize {
        self.paths.len()
    }

    fn label(&self, index: usize) -> String {
        self.paths[index].display().to_string()
    }

    fn load(&self, index: usize) -> Result<Vec<Record>> {
        load_chunk(&self.paths[index]).map(|c| c.records)
    }
}

/// Pre-parsed record sets, for driving the pipeline without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryChunks {
    chunks: Vec<Vec<Record>>,
}

impl MemoryChunks {
    pub fn new(chunks: Vec<Vec<Record>>) -> Self {
        Self { chunks }
    }

    /// cut one record set into consecutive chunks of at most `size` records
    pub fn split(records: &[Record], size: usize) -> Self {
        Self::new(records.chunks(size.max(1)).map(<[Record]>::to_vec).collect())
    }
}

impl ChunkSource for MemoryChunks {
    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn label(&self, index: usize) -> String {
        format!("memory chunk {}", index + 1)
    }

    fn load(&self, index: usize) -> Result<Vec<Record>> {
        Ok(self.chunks[index].clone())
    }
}
