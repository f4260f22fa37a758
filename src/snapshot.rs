use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use serde::Deserialize;
use tempfile::Builder;
use tracing::{info, warn};

use crate::domain::{NOT_REVEALED, Record, parse_int};
use crate::error::CensusError;

pub const COLUMNS: [&str; 11] = [
    "tokenId",
    "image",
    "age",
    "body",
    "disposition",
    "health",
    "isAwake",
    "isBuried",
    "generation",
    "mitosisCredits",
    "parentID",
];

pub fn snapshot_file_name(date: NaiveDate, bound: u64) -> String {
    format!("{}-metadata-upto-{bound}.csv", date.format("%Y-%m-%d"))
}

/// Sorts `records` by token id and writes them to `dir`.
///
/// The file only appears once every row has been written.
pub fn write_snapshot(
    dir: &Utf8Path,
    date: NaiveDate,
    bound: u64,
    mut records: Vec<Record>,
) -> Result<Utf8PathBuf, CensusError> {
    records.sort_by_key(|record| record.token_id);

    fs::create_dir_all(dir.as_std_path()).map_err(|err| CensusError::Filesystem(err.to_string()))?;
    let path = dir.join(snapshot_file_name(date, bound));
    let temp = Builder::new()
        .prefix("gobbler-census-snapshot")
        .tempfile_in(dir.as_std_path())
        .map_err(|err| CensusError::Filesystem(err.to_string()))?;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(temp.as_file());
        writer
            .write_record(COLUMNS)
            .map_err(|err| CensusError::SnapshotWrite(err.to_string()))?;
        for record in &records {
            writer
                .serialize(record)
                .map_err(|err| CensusError::SnapshotWrite(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| CensusError::SnapshotWrite(err.to_string()))?;
    }

    temp.persist(path.as_std_path())
        .map_err(|err| CensusError::Filesystem(err.to_string()))?;
    info!(path = %path, rows = records.len(), "snapshot written");
    Ok(path)
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    #[serde(rename = "tokenId")]
    token_id: String,
    image: Option<String>,
    age: Option<String>,
    body: Option<String>,
    disposition: Option<String>,
    health: Option<String>,
    #[serde(rename = "isAwake")]
    is_awake: Option<String>,
    #[serde(rename = "isBuried")]
    is_buried: Option<String>,
    generation: Option<String>,
    #[serde(rename = "mitosisCredits")]
    mitosis_credits: Option<String>,
    #[serde(rename = "parentID")]
    parent_id: Option<String>,
}

impl SnapshotRow {
    fn into_record(self) -> Option<Record> {
        let token_id = u64::try_from(parse_int(Some(self.token_id.as_str()))?).ok()?;
        Some(Record {
            token_id,
            image: self.image,
            age: self.age,
            body: self.body.unwrap_or_else(|| NOT_REVEALED.to_string()),
            disposition: self.disposition,
            health: self.health,
            is_awake: self.is_awake,
            is_buried: self.is_buried,
            generation: self.generation,
            mitosis_credits: self.mitosis_credits,
            parent_id: self.parent_id,
        })
    }
}

/// Loads a snapshot in file order. Rows whose `tokenId` is not a number are
/// skipped.
///
/// Empty cells read back as absent fields, and an empty `body` reads back as
/// [`NOT_REVEALED`], so a record written with `Some("")` or an empty body is
/// normalised on the way in. Every query treats those two forms alike.
pub fn read_snapshot(path: &Utf8Path) -> Result<Vec<Record>, CensusError> {
    let read_error = |message: String| CensusError::SnapshotRead {
        path: path.to_string(),
        message,
    };
    let mut reader =
        csv::Reader::from_path(path.as_std_path()).map_err(|err| read_error(err.to_string()))?;

    let mut records = Vec::new();
    for row in reader.deserialize::<SnapshotRow>() {
        let row = row.map_err(|err| read_error(err.to_string()))?;
        let raw_id = row.token_id.clone();
        match row.into_record() {
            Some(record) => records.push(record),
            None => warn!(token_id = %raw_id, "row with non-numeric tokenId skipped"),
        }
    }
    info!(path = %path, rows = records.len(), "snapshot loaded");
    Ok(records)
}
