//! On-disk formats of the precomputed artifacts
//!
//! Movie table: JSON array of `MovieRecord`, in matrix row order.
//!
//! Similarity matrix: gzip stream of
//!   [4B magic "SIMM"][4B dimension N, LE][N*N f32 LE, row-major]

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::similarity::SimilarityMatrix;
use crate::{
    error::{CorpusError, CorpusResult},
    models::MovieRecord,
};

const MAGIC: &[u8; 4] = b"SIMM";
/// Upper bound on the up-front allocation for a matrix being decoded
const MAX_PREALLOCATED_CELLS: usize = 1 << 24;
/// Values decoded per read from the gzip stream
const READ_CHUNK_CELLS: usize = 16 * 1024;

pub fn save_movie_table(path: &Path, movies: &[MovieRecord]) -> CorpusResult<()> {
    let file = File::create(path).map_err(|e| CorpusError::io(path, e))?;
    serde_json::to_writer(BufWriter::new(file), movies)?;
    Ok(())
}

pub fn load_movie_table(path: &Path) -> CorpusResult<Vec<MovieRecord>> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn save_similarity(path: &Path, matrix: &SimilarityMatrix) -> CorpusResult<()> {
    let file = File::create(path).map_err(|e| CorpusError::io(path, e))?;
    write_similarity(BufWriter::new(file), matrix).map_err(|e| CorpusError::io(path, e))
}

pub fn load_similarity(path: &Path) -> CorpusResult<SimilarityMatrix> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    read_similarity(BufReader::new(file), &name)
}

pub fn write_similarity<W: Write>(writer: W, matrix: &SimilarityMatrix) -> std::io::Result<()> {
    let mut encoder = GzEncoder::new(writer, Compression::new(6));
    encoder.write_all(MAGIC)?;
    encoder.write_all(&(matrix.len() as u32).to_le_bytes())?;
    for value in matrix.values() {
        encoder.write_all(&value.to_le_bytes())?;
    }
    encoder.finish()?.flush()
}

/// Decodes a matrix artifact in fixed-size chunks, straight from the gzip stream.
///
/// The payload must hold exactly the `N*N` values its header announces.
pub fn read_similarity<R: Read>(reader: R, name: &str) -> CorpusResult<SimilarityMatrix> {
    let corrupt = |reason: String| CorpusError::Corrupt {
        name: name.to_string(),
        reason,
    };
    let unreadable = |e: std::io::Error| match e.kind() {
        ErrorKind::UnexpectedEof => None,
        _ => Some(corrupt(format!("gzip stream unreadable: {}", e))),
    };

    let mut decoder = GzDecoder::new(reader);

    let mut header = [0u8; 8];
    if let Err(e) = decoder.read_exact(&mut header) {
        return Err(unreadable(e).unwrap_or_else(|| corrupt("missing header".to_string())));
    }
    if &header[..4] != MAGIC {
        return Err(corrupt("missing header".to_string()));
    }
    let dimension = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

    let cells = dimension
        .checked_mul(dimension)
        .filter(|cells| cells.checked_mul(4).is_some())
        .ok_or_else(|| corrupt("dimension overflow".to_string()))?;

    // The header is untrusted, so memory grows with the values actually read
    let mut values: Vec<f32> = Vec::with_capacity(cells.min(MAX_PREALLOCATED_CELLS));
    let mut buffer = vec![0u8; cells.min(READ_CHUNK_CELLS) * 4];
    while values.len() < cells {
        let take = (cells - values.len()).min(READ_CHUNK_CELLS);
        let bytes = &mut buffer[..take * 4];
        if let Err(e) = decoder.read_exact(bytes) {
            return Err(unreadable(e).unwrap_or_else(|| {
                corrupt(format!(
                    "truncated after {} of {} values for {}x{} matrix",
                    values.len(),
                    cells,
                    dimension,
                    dimension
                ))
            }));
        }
        values.extend(
            bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
        );
    }

    let mut extra = [0u8; 1];
    match decoder.read(&mut extra) {
        Ok(0) => {}
        Ok(_) => {
            return Err(corrupt(format!(
                "trailing bytes after {}x{} matrix",
                dimension, dimension
            )))
        }
        Err(e) => return Err(corrupt(format!("gzip stream unreadable: {}", e))),
    }

    SimilarityMatrix::from_raw(dimension, values).ok_or_else(|| corrupt("not square".to_string()))
}
