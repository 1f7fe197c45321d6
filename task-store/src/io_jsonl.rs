//! JSONL helpers: extractor output reader and flat-index persistence.
//!
//! - [`read_fragments`] → strict parsing of [`IngestRow`]s, flattened into fragments.
//! - [`read_stored`] / [`write_stored`] → `(text, contract_id, embedding)` rows of the flat index.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::TaskStoreError;
use crate::record::{IngestRow, StoredVector, TaskFragment};

/// Reads extractor JSONL and flattens every row into fragments.
///
/// Empty lines are ignored. Blank task texts are dropped.
///
/// # Errors
/// - [`TaskStoreError::Io`] if the file cannot be read.
/// - [`TaskStoreError::Parse`] if any line is neither a fragment nor a bundle.
pub fn read_fragments(path: impl AsRef<Path>) -> Result<Vec<TaskFragment>, TaskStoreError> {
    info!(path = ?path.as_ref(), "reading task JSONL");
    let rows: Vec<IngestRow> = read_lines(path)?;
    let out: Vec<TaskFragment> = rows.into_iter().flat_map(IngestRow::into_fragments).collect();
    debug!(fragments = out.len(), "task JSONL flattened");
    Ok(out)
}

pub(crate) fn read_stored(path: impl AsRef<Path>) -> Result<Vec<StoredVector>, TaskStoreError> {
    read_lines(path)
}

pub(crate) fn write_stored(
    path: impl AsRef<Path>,
    rows: &[StoredVector],
) -> Result<(), TaskStoreError> {
    write_lines(path, rows)
}

fn read_lines<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>, TaskStoreError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str::<T>(&line).map_err(|source| TaskStoreError::Parse {
            line: i + 1,
            source,
        })?;
        out.push(row);
    }
    Ok(out)
}

fn write_lines<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> Result<(), TaskStoreError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut w = BufWriter::new(File::create(path)?);
    for row in rows {
        serde_json::to_writer(&mut w, row)?;
        w.write_all(b"\n")?;
    }
    w.flush()?;

    debug!(path = ?path, rows = rows.len(), "JSONL written");
    Ok(())
}
