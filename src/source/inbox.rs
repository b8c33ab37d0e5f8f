//! Inbox directory source
//!
//! Recognized files:
//!
//! | Extension | Contents |
//! |-----------|----------|
//! | `.json`   | search results, `statuses`, headless arrays, NDJSON (incl. replay output) |
//! | `.gz`     | any of the above, gzipped |
//! | `.csv`    | a `tweet_id` header column |
//!
//! Every file that was read is moved to `<inbox>/processed/`. CSV files without
//! a `tweet_id` column are left in place.

use flate2::read::GzDecoder;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{IdentifierSource, SourceError, SourceResult};
use crate::{IdentifierSet, TweetId};

const PROCESSED_DIR: &str = "processed";
const CSV_ID_COLUMN: &str = "tweet_id";

/// Reads identifiers from files dropped into a directory
#[derive(Debug, Clone)]
pub struct InboxSource {
    dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Json,
    Gzip,
    Csv,
}

impl FileKind {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(FileKind::Json),
            "gz" => Some(FileKind::Gzip),
            "csv" => Some(FileKind::Csv),
            _ => None,
        }
    }
}

impl InboxSource {
    /// Create a source over `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Inbox directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory consumed files are moved to
    pub fn processed_dir(&self) -> PathBuf {
        self.dir.join(PROCESSED_DIR)
    }

    /// Recognized files waiting in the inbox, sorted by name
    pub fn pending_files(&self) -> SourceResult<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            SourceError::IoError(format!("Failed to read inbox {}: {}", self.dir.display(), e))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && FileKind::of(path).is_some())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Whether any recognized file is waiting
    pub fn has_files(&self) -> SourceResult<bool> {
        Ok(!self.pending_files()?.is_empty())
    }

    fn archive(&self, path: &Path) -> SourceResult<()> {
        let processed = self.processed_dir();
        fs::create_dir_all(&processed)
            .map_err(|e| SourceError::IoError(format!("Failed to create directory: {}", e)))?;

        let Some(file_name) = path.file_name() else {
            return Ok(());
        };
        let target = processed.join(file_name);
        fs::rename(path, &target).map_err(|e| {
            SourceError::IoError(format!("Failed to move {}: {}", path.display(), e))
        })?;
        debug!("Moved {} to {}", path.display(), target.display());
        Ok(())
    }
}

impl IdentifierSource for InboxSource {
    fn load_identifiers(&mut self) -> SourceResult<IdentifierSet> {
        info!("Checking inbox for files to process...");
        let files = self.pending_files()?;
        info!("Have {} files to process...", files.len());

        let mut ids = Vec::new();
        let mut consumed = Vec::new();
        for path in files {
            let Some(kind) = FileKind::of(&path) else {
                continue;
            };
            let file = path.display().to_string();

            let parsed = match kind {
                FileKind::Json => read_text(&path).and_then(|text| parse_json_document(&text, &file)),
                FileKind::Gzip => read_gzip(&path).and_then(|text| parse_json_document(&text, &file)),
                FileKind::Csv => read_text(&path).and_then(|text| parse_csv(&text)),
            };

            match parsed {
                Ok(Some(found)) => {
                    if found.is_empty() {
                        info!("No Tweets found in file {}...", file);
                    }
                    ids.extend(found);
                    consumed.push(path);
                }
                Ok(None) => warn!("No '{}' column in {}, leaving it in place", CSV_ID_COLUMN, file),
                Err(e) => warn!("Skipping {}: {}", file, e),
            }
        }

        for path in &consumed {
            if let Err(e) = self.archive(path) {
                warn!("{}, leaving it in the inbox", e);
            }
        }

        info!("Parsed {} Tweet IDs...", ids.len());
        let set: IdentifierSet = ids.into_iter().collect();
        info!("Have {} unique Tweet IDs...", set.len());
        Ok(set)
    }
}

fn read_text(path: &Path) -> SourceResult<String> {
    fs::read_to_string(path)
        .map_err(|e| SourceError::IoError(format!("Failed to read {}: {}", path.display(), e)))
}

fn read_gzip(path: &Path) -> SourceResult<String> {
    let file = fs::File::open(path)
        .map_err(|e| SourceError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
    let mut text = String::new();
    GzDecoder::new(file)
        .read_to_string(&mut text)
        .map_err(|e| SourceError::GzipError(format!("{}: {}", path.display(), e)))?;
    Ok(text)
}

/// Extract Tweet identifiers from one JSON or NDJSON document
///
/// Returns `Some(vec![])` for documents that carry only user ids.
pub fn parse_json_document(text: &str, file: &str) -> SourceResult<Option<Vec<TweetId>>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Some(Vec::new()));
    }

    let activities: Vec<Value> = match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(root)) => {
            if let Some(results) = root.get("results") {
                array_items(results)
            } else if let Some(statuses) = root.get("statuses") {
                array_items(statuses)
            } else if root.contains_key("ids") {
                info!("{} holds user ids, no Tweet IDs to load", file);
                Vec::new()
            } else if root.contains_key("next") {
                Vec::new()
            } else {
                vec![Value::Object(root)]
            }
        }
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            return Err(SourceError::ParseError {
                file: file.to_string(),
                message: "expected an object or array".to_string(),
            })
        }
        Err(_) => parse_ndjson(trimmed, file)?,
    };

    Ok(Some(activities.iter().filter_map(activity_id).collect()))
}

fn array_items(value: &Value) -> Vec<Value> {
    value.as_array().cloned().unwrap_or_default()
}

fn parse_ndjson(text: &str, file: &str) -> SourceResult<Vec<Value>> {
    let mut activities = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| SourceError::ParseError {
            file: file.to_string(),
            message: format!("line {}: {}", line_no + 1, e),
        })?;
        // replay output ends with an info record
        if value.get("info").is_some() {
            continue;
        }
        activities.push(value);
    }
    Ok(activities)
}

/// Tweet identifier of one activity
///
/// Accepts `id_str`, numeric `id`, numeric strings, and `tag:...:<id>` forms.
pub fn activity_id(activity: &Value) -> Option<TweetId> {
    let id = activity.get("id_str").or_else(|| activity.get("id"))?;
    match id {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.rsplit(':').next()?.trim().parse().ok(),
        _ => None,
    }
}

/// Identifiers from a CSV with a `tweet_id` column; `None` when the column is absent
pub fn parse_csv(text: &str) -> SourceResult<Option<Vec<TweetId>>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SourceError::CsvError(e.to_string()))?
        .clone();
    let Some(column) = headers.iter().position(|h| h.contains(CSV_ID_COLUMN)) else {
        return Ok(None);
    };

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SourceError::CsvError(e.to_string()))?;
        match record.get(column) {
            Some("") | None => {}
            Some(value) => match value.parse::<TweetId>() {
                Ok(id) => ids.push(id),
                Err(_) => warn!("Ignoring non-numeric tweet_id: {}", value),
            },
        }
    }
    Ok(Some(ids))
}
