// src/store/csv_table.rs
// Flat-file goal table (CSV with the fixed seven-column header)
//
// The file is the only source of truth. Every mutation reads the whole file,
// applies one change and rewrites the whole file through a temp file + rename,
// so a failed write leaves the previous contents in place. One process owns
// the file; concurrent writers are not coordinated.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{GoalTable, Row, RowChange};
use crate::error::{GoalError, Result};
use crate::goals::{GoalField, GoalRecord};

pub struct CsvTable {
    path: PathBuf,
}

impl CsvTable {
    /// Open (creating if needed) the goal file at `path`. A leading `~` is
    /// expanded and missing parent directories are created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = expand_home(path.as_ref());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        if !tokio::fs::try_exists(&path).await? {
            let header = encode(&[])?;
            tokio::fs::write(&path, header).await?;
            info!(path = %path.display(), "Created goal file");
        }

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self, records: &[GoalRecord]) -> Result<()> {
        let bytes = encode(records)?;
        let tmp = self.path.with_extension("csv.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), rows = records.len(), "Goal file written");
        Ok(())
    }
}

#[async_trait]
impl GoalTable for CsvTable {
    fn name(&self) -> &'static str {
        "flat_file"
    }

    async fn load(&self) -> Result<Vec<Row>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let records = decode(&bytes)?;
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(position, record)| Row { position, record })
            .collect())
    }

    async fn apply(&self, rows: Vec<Row>, change: RowChange) -> Result<()> {
        let mut records: Vec<GoalRecord> = rows.into_iter().map(|r| r.record).collect();

        match change {
            RowChange::Append(record) => records.push(record),
            RowChange::Replace { position, record } => {
                let slot = records
                    .get_mut(position)
                    .ok_or_else(|| stale_position(position))?;
                *slot = record;
            }
            RowChange::Remove { position } => {
                if position >= records.len() {
                    return Err(stale_position(position));
                }
                records.remove(position);
            }
        }

        self.save(&records).await
    }
}

fn stale_position(position: usize) -> GoalError {
    GoalError::Schema(format!("row {position} no longer exists"))
}

/// Parse file contents, insisting on the exact header row.
fn decode(bytes: &[u8]) -> Result<Vec<GoalRecord>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let found: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if found != GoalField::headers() {
        return Err(GoalError::Schema(format!(
            "expected header [{}], found [{}]",
            GoalField::headers().join(", "),
            found.join(", ")
        )));
    }

    reader
        .deserialize::<GoalRecord>()
        .map(|r| r.map_err(GoalError::from))
        .collect()
}

/// Header row plus one row per record.
fn encode(records: &[GoalRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(GoalField::headers())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| GoalError::Io(e.into_error()))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().unwrap_or_default().join(rest),
        Err(_) => path.to_path_buf(),
    }
}
