//! Human-readable session report
//!
//! Columns are tab-separated; [`MetricsStore::write_report`](super::MetricsStore::write_report)
//! turns them into commas on disk.

use std::fmt::Write;

use crate::session::SessionReport;

const PAD: &str = "          ";

/// Permalink for a Tweet identifier
pub fn permalink(id: u64) -> String {
    format!("https://twitter.com/lookup/status/{id}")
}

/// Render totals, top Tweets and the request summary
pub fn render_report(report: &SessionReport, name: Option<&str>) -> String {
    let endpoint = report.endpoint;
    let aggregator = &report.aggregator;
    let mut out = String::from("Engagement API Results ");

    if let Some(name) = name {
        let _ = write!(out, "for {name} dataset.");
    }
    let _ = write!(out, "\n \nNumber of Tweets: \t {} \n \n", report.identifiers);
    let _ = writeln!(out, "Engagement Type {PAD} \t Total ");

    for (metric_type, total) in aggregator.totals().iter() {
        if endpoint.allows_metric_type(metric_type) {
            let _ = writeln!(out, "{} {PAD}\t {PAD} {total} ", capitalize(metric_type));
        }
    }

    if aggregator.top_n() > 0 {
        out.push_str("\n \nTop Tweets \n \n");

        for (metric_type, board) in aggregator.boards() {
            if !endpoint.allows_metric_type(metric_type) {
                continue;
            }
            let _ = writeln!(
                out,
                "Top Tweets for {metric_type}: \t {} \t Tweet links:",
                capitalize(metric_type)
            );
            for entry in board.entries().iter().filter(|e| e.count > 0) {
                let _ = writeln!(
                    out,
                    "{}{PAD} \t {} {PAD}\t {}",
                    entry.id,
                    entry.count,
                    permalink(entry.id)
                );
            }
            out.push('\n');
        }
    }

    let minutes = report.stats.elapsed.as_secs_f64() / 60.0;
    let _ = write!(
        out,
        "\n \nNumber of requests: {} \nProcess took {minutes:.1} minutes.",
        report.stats.requests
    );
    out
}

/// Upper-case the first character and lower-case the rest
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
