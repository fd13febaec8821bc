//! Analyze event logs.

use anyhow::{Context, Result};
use bench_core::{AnalysisReport, LogAnalyzer, TimedRecord};
use bench_types::EventRecord;
use std::path::PathBuf;

use crate::logging;

/// Run the analyze command.
pub fn run(files: &[PathBuf], nodes: Option<usize>, json: bool) -> Result<AnalysisReport> {
    let mut analyzer = LogAnalyzer::new();
    let mut skipped = 0usize;

    for path in files {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read log file {}", path.display()))?;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match parse_record(line) {
                Some(timed) => analyzer.ingest(timed),
                None => {
                    skipped += 1;
                    tracing::debug!(line, "skipping unrecognized line");
                }
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "some lines were not event records");
    }

    let report = analyzer.report(nodes);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(report)
}

fn parse_record(line: &str) -> Option<TimedRecord> {
    let (at_ms, message) = logging::parse_line(line)?;
    let record = message.parse::<EventRecord>().ok()?;
    Some(TimedRecord { at_ms, record })
}

fn print_report(report: &AnalysisReport) {
    println!("Nodes:               {}", report.nodes);
    println!("Publishing nodes:    {}", report.publishing_nodes);
    println!("Published:           {}", report.published);
    println!("Receipts:            {}", report.receipts);
    println!("Unmatched receipts:  {}", report.unmatched_receipts);
    println!("State notifications: {}", report.state_notifications);
    println!("Delivery ratio:      {:.4}", report.delivery_ratio);
    match &report.latency {
        Some(latency) => {
            println!();
            println!("Latency ({} samples):", latency.samples);
            println!("  min:    {} ms", latency.min_ms);
            println!("  median: {:.1} ms", latency.median_ms);
            println!("  mean:   {:.1} ms", latency.mean_ms);
            println!("  p95:    {} ms", latency.p95_ms);
            println!("  max:    {} ms", latency.max_ms);
        }
        None => println!("Latency:             no samples"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn report_over_two_node_log() {
        let file = log(&[
            r#""1000", "1", "a", "NODE_INIT::a""#,
            r#""1000", "1", "b", "NODE_INIT::b""#,
            r#""2000", "1", "a", "PUBL_MSG::a::a=1""#,
            r#""2100", "1", "b", "RECV_STATE::a::1""#,
            r#""2150", "1", "b", "RECV_MSG::b::a=1""#,
            "not an event line",
        ]);

        let report = run(&[file.path().to_path_buf()], None, false).unwrap();

        assert_eq!(report.nodes, 2);
        assert_eq!(report.published, 1);
        assert_eq!(report.receipts, 1);
        assert_eq!(report.state_notifications, 1);
        assert_eq!(report.delivery_ratio, 1.0);
        assert_eq!(report.latency.unwrap().max_ms, 150);
    }

    #[test]
    fn node_count_override() {
        let file = log(&[
            r#""2000", "1", "a", "PUBL_MSG::a::a=1""#,
            r#""2150", "1", "b", "RECV_MSG::b::a=1""#,
        ]);

        let report = run(&[file.path().to_path_buf()], Some(3), true).unwrap();

        assert_eq!(report.nodes, 3);
        assert_eq!(report.delivery_ratio, 0.5);
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = PathBuf::from("/nonexistent/bench.log");
        assert!(run(&[missing], None, false).is_err());
    }
}
