//! Time-series reformatting
//!
//! Converts the nested time-series groupings of a saved API response into one
//! CSV per Tweet with a `date` column followed by one column per metric type.
//!
//! Grouping shapes read from the response:
//!
//! ```text
//! timeseries_hourly: { <id>: { <type>: { <day>: { <hour>: <count> } } } }
//! timeseries_daily:  { <id>: { <type>: { <day>: <count> } } }
//! hour_of_day:       { <id>: { <type>: { <hour>: <count> } } }
//! ```

use csv::Writer;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{OutputError, OutputResult};

/// Supported time-series groupings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    /// Day and hour
    Hourly,
    /// Day only
    Daily,
    /// Hour of day, across days
    HourOfDay,
}

impl SeriesKind {
    /// All kinds, in output order
    pub const ALL: [SeriesKind; 3] = [SeriesKind::Hourly, SeriesKind::Daily, SeriesKind::HourOfDay];

    /// Grouping name in the response
    pub fn grouping(&self) -> &'static str {
        match self {
            SeriesKind::Hourly => "timeseries_hourly",
            SeriesKind::Daily => "timeseries_daily",
            SeriesKind::HourOfDay => "hour_of_day",
        }
    }

    /// Output filename for a Tweet
    pub fn file_name(&self, tweet_id: &str) -> String {
        match self {
            SeriesKind::Hourly => format!("{tweet_id}_hourly_timeseries.csv"),
            SeriesKind::Daily => format!("{tweet_id}_daily_timeseries.csv"),
            SeriesKind::HourOfDay => format!("{tweet_id}_hour_of_day.csv"),
        }
    }
}

/// One Tweet's time series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetSeries {
    /// Tweet identifier as it appears in the response
    pub tweet_id: String,
    /// `(time step, counts in header order)` in first-seen order
    pub rows: Vec<(String, Vec<u64>)>,
}

/// Time series for every Tweet in one grouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesTable {
    /// Grouping these series came from
    pub kind: SeriesKind,
    /// Metric type columns
    pub metric_types: Vec<String>,
    /// Per-Tweet series
    pub tweets: Vec<TweetSeries>,
}

impl SeriesTable {
    /// Extract one grouping; `Ok(None)` when the response does not carry it
    ///
    /// The metric columns come from the first Tweet in the grouping.
    pub fn from_response(body: &Value, kind: SeriesKind) -> OutputResult<Option<Self>> {
        let Some(grouping) = body.get(kind.grouping()) else {
            return Ok(None);
        };
        let grouping = as_object(grouping, kind.grouping())?;

        let metric_types: Vec<String> = match grouping.values().next() {
            Some(first) => as_object(first, kind.grouping())?.keys().cloned().collect(),
            None => Vec::new(),
        };

        let mut tweets = Vec::with_capacity(grouping.len());
        for (tweet_id, by_type) in grouping {
            let by_type = as_object(by_type, tweet_id)?;
            let mut rows: Vec<(String, Vec<u64>)> = Vec::new();
            let mut index: HashMap<String, usize> = HashMap::new();

            for (column, metric_type) in metric_types.iter().enumerate() {
                let Some(steps) = by_type.get(metric_type) else {
                    warn!(tweet_id = %tweet_id, metric_type = %metric_type, "Metric type missing from time series");
                    continue;
                };
                for (step, count) in flatten_steps(kind, steps, tweet_id)? {
                    let row = *index.entry(step.clone()).or_insert_with(|| {
                        rows.push((step, vec![0; metric_types.len()]));
                        rows.len() - 1
                    });
                    rows[row].1[column] = count;
                }
            }

            tweets.push(TweetSeries {
                tweet_id: tweet_id.clone(),
                rows,
            });
        }

        Ok(Some(Self {
            kind,
            metric_types,
            tweets,
        }))
    }

    /// Write one CSV per Tweet into `dir`
    pub fn write_csv(&self, dir: &Path) -> OutputResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;

        let mut header = Vec::with_capacity(self.metric_types.len() + 1);
        header.push("date");
        header.extend(self.metric_types.iter().map(String::as_str));

        let mut written = Vec::with_capacity(self.tweets.len());
        for tweet in &self.tweets {
            let path = dir.join(self.kind.file_name(&tweet.tweet_id));
            let mut writer = Writer::from_path(&path)
                .map_err(|e| OutputError::CsvError(format!("Failed to create file: {}", e)))?;

            writer
                .write_record(&header)
                .map_err(|e| OutputError::CsvError(e.to_string()))?;
            for (step, counts) in &tweet.rows {
                let mut record = Vec::with_capacity(counts.len() + 1);
                record.push(step.clone());
                record.extend(counts.iter().map(u64::to_string));
                writer
                    .write_record(&record)
                    .map_err(|e| OutputError::CsvError(e.to_string()))?;
            }
            writer
                .flush()
                .map_err(|e| OutputError::IoError(format!("Failed to flush: {}", e)))?;

            debug!(rows = tweet.rows.len(), "Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Reformat every time-series grouping in a saved response
pub fn reformat_file(input: &Path, output_dir: &Path) -> OutputResult<Vec<PathBuf>> {
    let text = fs::read_to_string(input)
        .map_err(|e| OutputError::IoError(format!("Failed to read {}: {}", input.display(), e)))?;
    let body: Value =
        serde_json::from_str(&text).map_err(|e| OutputError::SerializationError(e.to_string()))?;

    let mut written = Vec::new();
    for kind in SeriesKind::ALL {
        match SeriesTable::from_response(&body, kind)? {
            Some(table) => written.extend(table.write_csv(output_dir)?),
            None => info!("No {} grouping in {}", kind.grouping(), input.display()),
        }
    }
    Ok(written)
}

fn flatten_steps(kind: SeriesKind, steps: &Value, context: &str) -> OutputResult<Vec<(String, u64)>> {
    let steps = as_object(steps, context)?;
    let mut flat = Vec::new();
    match kind {
        SeriesKind::Hourly => {
            for (day, hours) in steps {
                for (hour, count) in as_object(hours, day)? {
                    flat.push((format!("{day} {hour}:00"), parse_count(count)));
                }
            }
        }
        SeriesKind::Daily => {
            for (day, count) in steps {
                flat.push((day.clone(), parse_count(count)));
            }
        }
        SeriesKind::HourOfDay => {
            for (hour, count) in steps {
                flat.push((format!("{hour}:00"), parse_count(count)));
            }
        }
    }
    Ok(flat)
}

fn as_object<'a>(value: &'a Value, context: &str) -> OutputResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| OutputError::InvalidInput(format!("expected an object under '{context}'")))
}

fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
