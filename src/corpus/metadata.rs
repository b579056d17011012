use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{
    error::{CorpusError, CorpusResult},
    models::{release_year, try_parse_names, MetadataRecord, RawMovieRow},
};

/// Read-only `movie_id -> MetadataRecord` lookup built from the raw movies table.
///
/// Independent of the similarity artifacts: it is always built from the raw
/// CSV, whether the movie table was rebuilt or loaded precomputed.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    records: HashMap<i64, MetadataRecord>,
    empty: MetadataRecord,
}

impl MetadataIndex {
    pub fn from_path(path: &Path) -> CorpusResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| CorpusError::io(path, e))?;
        Self::from_reader(file)
    }

    /// Scans the movies table. A row whose fields cannot be parsed, or whose
    /// field count is off, is stored as an empty record under its id; rows
    /// without a readable id are skipped.
    pub fn from_reader<R: Read>(reader: R) -> CorpusResult<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers()?.clone();
        let id_column = headers.iter().position(|h| h == "id");

        let mut records = HashMap::new();
        let mut defaulted = 0usize;

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable metadata record");
                    continue;
                }
            };

            let parsed = record
                .deserialize::<RawMovieRow>(Some(&headers))
                .ok()
                .and_then(|row| Some((row.id?, metadata_from_row(&row))));

            match parsed {
                Some((id, Some(metadata))) => {
                    records.insert(id, metadata);
                }
                Some((id, None)) => {
                    defaulted += 1;
                    records.insert(id, MetadataRecord::default());
                }
                None => {
                    let id = id_column
                        .and_then(|column| record.get(column))
                        .and_then(|raw| raw.trim().parse::<i64>().ok());
                    if let Some(id) = id {
                        defaulted += 1;
                        records.insert(id, MetadataRecord::default());
                    }
                }
            }
        }

        tracing::info!(
            entries = records.len(),
            defaulted,
            "Built metadata index"
        );

        Ok(Self {
            records,
            empty: MetadataRecord::default(),
        })
    }

    /// Metadata for a movie id; an all-empty record for unknown ids
    pub fn get(&self, movie_id: i64) -> &MetadataRecord {
        self.records.get(&movie_id).unwrap_or(&self.empty)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(i64, MetadataRecord)> for MetadataIndex {
    fn from_iter<I: IntoIterator<Item = (i64, MetadataRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
            empty: MetadataRecord::default(),
        }
    }
}

fn metadata_from_row(row: &RawMovieRow) -> Option<MetadataRecord> {
    let genres = try_parse_names(row.genres.as_deref()?)?;
    Some(MetadataRecord {
        genres,
        release_year: release_year(row.release_date.as_deref()),
        overview: row.overview.clone().unwrap_or_default(),
        tagline: row.tagline.clone().unwrap_or_default(),
    })
}
