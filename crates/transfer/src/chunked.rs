use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use handin_protocol::constants::DEFAULT_CHUNK_SIZE;

use crate::TransferError;

/// Number of chunks needed to cover `file_size` bytes.
///
/// Always at least 1: a zero-byte file still yields one empty chunk.
/// Rejecting empty submissions is the caller's job.
pub fn chunk_count(file_size: u64, chunk_size: usize) -> u32 {
    if file_size == 0 {
        return 1;
    }
    file_size.div_ceil(chunk_size as u64) as u32
}

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// A local file selected for submission, with its declared media type.
///
/// Read-only: the transfer pipeline never mutates the source.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    mime_type: String,
    size: u64,
}

impl SourceFile {
    /// Records `path` and its current byte length.
    pub fn open(path: impl Into<PathBuf>, mime_type: &str) -> Result<Self, TransferError> {
        let path = path.into();
        let size = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            mime_type: mime_type.to_string(),
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Byte length at the time the file was selected.
    pub fn size(&self) -> u64 {
        self.size
    }
}

// ---------------------------------------------------------------------------
// ChunkLayout
// ---------------------------------------------------------------------------

/// Half-open byte span `[start, end)` of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub index: u32,
    pub start: u64,
    pub end: u64,
}

/// Pure partition of `[0, file_size)` into fixed-size spans.
///
/// Spans are contiguous and non-overlapping; the final span ends exactly at
/// `file_size` regardless of rounding. Iterating consumes nothing external,
/// so a fresh layout restarts the sequence.
#[derive(Debug, Clone)]
pub struct ChunkLayout {
    file_size: u64,
    chunk_size: u64,
    total: u32,
    next: u32,
}

impl ChunkLayout {
    /// Lays out `file_size` bytes in `chunk_size` steps.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn new(file_size: u64, chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self {
            file_size,
            chunk_size: chunk_size as u64,
            total: chunk_count(file_size, chunk_size),
            next: 0,
        }
    }

    pub fn total_chunks(&self) -> u32 {
        self.total
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size as usize
    }
}

impl Iterator for ChunkLayout {
    type Item = ChunkSpan;

    fn next(&mut self) -> Option<ChunkSpan> {
        if self.next >= self.total {
            return None;
        }
        let index = self.next;
        let start = u64::from(index) * self.chunk_size;
        let end = (start + self.chunk_size).min(self.file_size);
        self.next += 1;
        Some(ChunkSpan { index, start, end })
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// One chunk of file data, ready for encoding.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Zero-based position within the session.
    pub index: u32,
    pub total_chunks: u32,
    /// Byte offset of the first byte.
    pub start: u64,
    /// Byte offset one past the last byte.
    pub end: u64,
    pub data: Vec<u8>,
}

/// Reads a [`SourceFile`] chunk by chunk, in ascending index order.
pub struct ChunkReader {
    file: File,
    source_size: u64,
    layout: ChunkLayout,
}

impl ChunkReader {
    /// Opens `source` for chunked reading.
    pub fn open(source: &SourceFile, chunk_size: usize) -> Result<Self, TransferError> {
        let file = File::open(source.path())?;
        Ok(Self {
            file,
            source_size: source.size(),
            layout: ChunkLayout::new(source.size(), chunk_size),
        })
    }

    pub fn total_chunks(&self) -> u32 {
        self.layout.total_chunks()
    }

    /// Restarts the sequence from chunk 0.
    pub fn rewind(&mut self) -> Result<(), TransferError> {
        self.file.seek(SeekFrom::Start(0))?;
        self.layout = ChunkLayout::new(self.source_size, self.layout.chunk_size());
        Ok(())
    }

    /// Reads the next chunk. Returns `None` after the final chunk.
    ///
    /// A file that shrank since it was selected surfaces as
    /// [`TransferError::SourceTruncated`].
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, TransferError> {
        let Some(span) = self.layout.next() else {
            return Ok(None);
        };

        let wanted = (span.end - span.start) as usize;
        let mut data = vec![0u8; wanted];
        self.file.seek(SeekFrom::Start(span.start))?;
        self.file.read_exact(&mut data).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                TransferError::SourceTruncated {
                    offset: span.start,
                    wanted,
                }
            } else {
                TransferError::Io(e)
            }
        })?;

        Ok(Some(Chunk {
            index: span.index,
            total_chunks: self.layout.total_chunks(),
            start: span.start,
            end: span.end,
            data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const MIB: u64 = 1024 * 1024;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> SourceFile {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        SourceFile::open(path, "video/mp4").unwrap()
    }

    #[test]
    fn chunk_count_rounds_up() {
        assert_eq!(chunk_count(10, 4), 3);
        assert_eq!(chunk_count(8, 4), 2);
        assert_eq!(chunk_count(1, 4), 1);
        assert_eq!(chunk_count(4, 4), 1);
    }

    #[test]
    fn chunk_count_zero_byte_file_is_one() {
        assert_eq!(chunk_count(0, 4), 1);
    }

    #[test]
    fn layout_partitions_exactly() {
        for (file_size, chunk_size) in [
            (10u64, 4usize),
            (8, 4),
            (1, 4),
            (4, 4),
            (1000, 7),
            (54 * MIB, (20 * MIB) as usize),
        ] {
            let spans: Vec<ChunkSpan> = ChunkLayout::new(file_size, chunk_size).collect();
            assert_eq!(spans.len() as u32, chunk_count(file_size, chunk_size));
            assert_eq!(spans[0].start, 0);
            assert_eq!(spans.last().unwrap().end, file_size);
            for pair in spans.windows(2) {
                assert_eq!(pair[0].end, pair[1].start, "gap or overlap at {pair:?}");
                assert_eq!(pair[0].index + 1, pair[1].index);
            }
        }
    }

    #[test]
    fn layout_54_mib_in_20_mib_chunks() {
        let spans: Vec<ChunkSpan> = ChunkLayout::new(54 * MIB, (20 * MIB) as usize).collect();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].end - spans[0].start, 20 * MIB);
        assert_eq!(spans[1].end - spans[1].start, 20 * MIB);
        assert_eq!(spans[2].end - spans[2].start, 14 * MIB);
    }

    #[test]
    fn layout_zero_byte_file_single_empty_span() {
        let spans: Vec<ChunkSpan> = ChunkLayout::new(0, 4).collect();
        assert_eq!(
            spans,
            vec![ChunkSpan {
                index: 0,
                start: 0,
                end: 0
            }]
        );
    }

    #[test]
    fn layout_zero_chunk_size_uses_default() {
        let layout = ChunkLayout::new(1, 0);
        assert_eq!(layout.chunk_size(), DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn reader_reconstructs_source() {
        let dir = TempDir::new().unwrap();
        let data = b"The quick brown fox jumps over the lazy dog";
        let source = create_test_file(dir.path(), "clip.mp4", data);

        let mut reader = ChunkReader::open(&source, 10).unwrap();
        assert_eq!(reader.total_chunks(), 5);

        let mut rebuilt = Vec::new();
        let mut expected_index = 0;
        while let Some(chunk) = reader.next_chunk().unwrap() {
            assert_eq!(chunk.index, expected_index);
            assert_eq!(chunk.total_chunks, 5);
            assert_eq!(chunk.start, rebuilt.len() as u64);
            assert_eq!(chunk.end - chunk.start, chunk.data.len() as u64);
            rebuilt.extend_from_slice(&chunk.data);
            expected_index += 1;
        }
        assert_eq!(&rebuilt, data);
    }

    #[test]
    fn reader_final_chunk_is_remainder() {
        let dir = TempDir::new().unwrap();
        let source = create_test_file(dir.path(), "clip.mp4", b"AABBCCDDEE");

        let mut reader = ChunkReader::open(&source, 4).unwrap();
        let c1 = reader.next_chunk().unwrap().unwrap();
        assert_eq!(&c1.data, b"AABB");
        let c2 = reader.next_chunk().unwrap().unwrap();
        assert_eq!(&c2.data, b"CCDD");
        let c3 = reader.next_chunk().unwrap().unwrap();
        assert_eq!(&c3.data, b"EE");
        assert_eq!(c3.end, 10);
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn reader_rewind_restarts_sequence() {
        let dir = TempDir::new().unwrap();
        let source = create_test_file(dir.path(), "clip.mp4", b"0123456789");

        let mut reader = ChunkReader::open(&source, 4).unwrap();
        let first = reader.next_chunk().unwrap().unwrap();
        let _ = reader.next_chunk().unwrap().unwrap();

        reader.rewind().unwrap();
        let again = reader.next_chunk().unwrap().unwrap();
        assert_eq!(first.index, again.index);
        assert_eq!(first.data, again.data);
    }

    #[test]
    fn reader_zero_byte_file_single_empty_chunk() {
        let dir = TempDir::new().unwrap();
        let source = create_test_file(dir.path(), "empty.mp4", b"");

        let mut reader = ChunkReader::open(&source, 4).unwrap();
        assert_eq!(reader.total_chunks(), 1);
        let chunk = reader.next_chunk().unwrap().unwrap();
        assert!(chunk.data.is_empty());
        assert_eq!(chunk.end, 0);
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn reader_detects_truncated_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"0123456789").unwrap();
        let source = SourceFile::open(&path, "video/mp4").unwrap();

        // Shrink the file after it was selected.
        std::fs::write(&path, b"01").unwrap();

        let mut reader = ChunkReader::open(&source, 4).unwrap();
        let first = reader.next_chunk();
        assert!(matches!(
            first,
            Err(TransferError::SourceTruncated { .. })
        ));
    }

    #[test]
    fn source_file_records_metadata() {
        let dir = TempDir::new().unwrap();
        let source = create_test_file(dir.path(), "clip.webm", b"abc");
        assert_eq!(source.size(), 3);
        assert_eq!(source.mime_type(), "video/mp4");
        assert!(source.path().ends_with("clip.webm"));
    }

    #[test]
    fn source_file_missing_path_errors() {
        assert!(SourceFile::open("/nonexistent/clip.mp4", "video/mp4").is_err());
    }
}
