//! Reassembling per-dataset records from concatenated driver output.
//!
//! A driver prints, per dataset, the name on its own line followed by six
//! numeric lines: five stage durations (`  0.0123 seconds`, or `-1` for a
//! timed-out predict) and the accuracy. Logs from many runs are simply
//! concatenated, so the parser only relies on that block shape.

use std::collections::BTreeMap;
use std::collections::btree_map::Values;
use std::io::{self, BufRead, BufReader, Read};

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::ReportError;

/// Marker line printed after a driver's warm-up run.
const WARMUP_MARKER: &str = "Precompilation done.";

/// Numeric lines following each name line.
const VALUES_PER_RECORD: usize = 6;

/// One dataset's timings and accuracy as read back from a log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchRecord {
    /// Dataset name.
    pub name: String,
    /// Seconds spent selecting datasets.
    pub filter_datasets: f64,
    /// Seconds spent loading both splits.
    pub load_data: f64,
    /// Seconds spent constructing the model.
    pub create_model: f64,
    /// Seconds spent fitting.
    pub fit: f64,
    /// Seconds spent in inference, `-1` if it timed out.
    pub predict: f64,
    /// Test accuracy, `0` if not applicable or timed out.
    pub accuracy: f64,
}

impl BenchRecord {
    fn from_values(name: String, v: [f64; VALUES_PER_RECORD]) -> Self {
        let [filter_datasets, load_data, create_model, fit, predict, accuracy] = v;
        Self {
            name,
            filter_datasets,
            load_data,
            create_model,
            fit,
            predict,
            accuracy,
        }
    }

    /// True if the record carries the timeout sentinel.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.predict < 0.0
    }
}

enum ParseState {
    AwaitingName,
    Accumulating { name: String, values: Vec<f64> },
}

/// Records keyed by dataset name. Iteration is in name order.
#[derive(Debug, Default, Clone)]
pub struct Report {
    records: BTreeMap<String, BenchRecord>,
}

impl Report {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse several logs as one stream, as if joined with `cat`, and merge
    /// the records into this report.
    ///
    /// Parser state carries across input boundaries, so a block cut short
    /// at the end of one input is continued by the next one.
    ///
    /// # Errors
    ///
    /// As [`ingest`][Self::ingest], with line numbers counted across the
    /// joined stream.
    #[instrument(skip_all)]
    pub fn ingest_concatenated<I>(&mut self, inputs: I) -> Result<(), ReportError>
    where
        I: IntoIterator,
        I::Item: Read + 'static,
    {
        let joined = inputs
            .into_iter()
            .fold(Box::new(io::empty()) as Box<dyn Read>, |joined, input| {
                Box::new(joined.chain(input)) as Box<dyn Read>
            });
        self.ingest(BufReader::new(joined))
    }

    /// Parse a log stream and merge its records into this report.
    ///
    /// Blank lines and warm-up markers are skipped. A record is complete on
    /// its sixth value line; each value is the first whitespace-separated
    /// token of its line. A later record for the same name replaces the
    /// earlier one. An incomplete block at end of input is dropped.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ReportError::ReadLine`] | a line cannot be read |
    /// | [`ReportError::InvalidNumber`] | a value line does not start with a number |
    pub fn ingest<R: BufRead>(&mut self, reader: R) -> Result<(), ReportError> {
        let mut state = ParseState::AwaitingName;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| ReportError::ReadLine {
                line: line_no,
                source: e,
            })?;
            let line = line.trim();
            if line.is_empty() || line.contains(WARMUP_MARKER) {
                continue;
            }

            state = match state {
                ParseState::AwaitingName => ParseState::Accumulating {
                    name: line.to_string(),
                    values: Vec::with_capacity(VALUES_PER_RECORD),
                },
                ParseState::Accumulating { name, mut values } => {
                    values.push(leading_number(line, line_no)?);
                    match <[f64; VALUES_PER_RECORD]>::try_from(values) {
                        Ok(complete) => {
                            self.insert(BenchRecord::from_values(name, complete));
                            ParseState::AwaitingName
                        }
                        Err(values) => ParseState::Accumulating { name, values },
                    }
                }
            };
        }

        if let ParseState::Accumulating { name, values } = state {
            warn!(dataset = %name, n_values = values.len(), "dropping incomplete trailing record");
        }
        Ok(())
    }

    fn insert(&mut self, record: BenchRecord) {
        debug!(dataset = %record.name, "record parsed");
        if let Some(previous) = self.records.insert(record.name.clone(), record) {
            warn!(dataset = %previous.name, "duplicate record replaced");
        }
    }

    /// Look up a record by dataset name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BenchRecord> {
        self.records.get(name)
    }

    /// Records in ascending name order.
    pub fn records(&self) -> Values<'_, String, BenchRecord> {
        self.records.values()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no records were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn leading_number(line: &str, line_no: usize) -> Result<f64, ReportError> {
    let token = line.split_whitespace().next().unwrap_or(line);
    token.parse().map_err(|_| ReportError::InvalidNumber {
        line: line_no,
        raw: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Report, ReportError> {
        let mut report = Report::new();
        report.ingest(text.as_bytes())?;
        Ok(report)
    }

    const COFFEE: &str = "Coffee\n  0.001 seconds\n  0.25 seconds\n  0.0001 seconds\n  0.5 seconds\n  1.75 seconds\n1.0\n";

    #[test]
    fn single_block_yields_one_record() {
        let report = parse(COFFEE).unwrap();
        assert_eq!(report.len(), 1);
        let rec = report.get("Coffee").unwrap();
        assert_eq!(rec.filter_datasets, 0.001);
        assert_eq!(rec.load_data, 0.25);
        assert_eq!(rec.create_model, 0.0001);
        assert_eq!(rec.fit, 0.5);
        assert_eq!(rec.predict, 1.75);
        assert_eq!(rec.accuracy, 1.0);
        assert!(!rec.timed_out());
    }

    #[test]
    fn records_iterate_sorted_by_name() {
        let log = "Wine\n1\n2\n3\n4\n5\n0.5\n\nAdiac\n1\n2\n3\n4\n5\n0.6\n";
        let report = parse(log).unwrap();
        let names: Vec<&str> = report.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Adiac", "Wine"]);
    }

    #[test]
    fn warmup_marker_creates_no_record() {
        let log = format!("Precompilation done.\n{COFFEE}");
        let report = parse(&log).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.get("Precompilation done.").is_none());
    }

    #[test]
    fn timeout_sentinel_parsed() {
        let log = "Beef\n  0.0 seconds\n  0.1 seconds\n  0.0 seconds\n  0.2 seconds\n-1\n0.0\n";
        let rec = parse(log).unwrap().get("Beef").cloned().unwrap();
        assert_eq!(rec.predict, -1.0);
        assert_eq!(rec.accuracy, 0.0);
        assert!(rec.timed_out());
    }

    #[test]
    fn incomplete_trailing_block_dropped() {
        let log = format!("{COFFEE}Beef\n  0.1 seconds\n  0.2 seconds\n");
        let report = parse(&log).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.get("Beef").is_none());
    }

    #[test]
    fn duplicate_name_keeps_latest() {
        let log = format!("{COFFEE}Coffee\n9\n9\n9\n9\n9\n0.25\n");
        let report = parse(&log).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.get("Coffee").unwrap().accuracy, 0.25);
    }

    #[test]
    fn non_numeric_value_reports_line() {
        let log = "Coffee\n  0.1 seconds\nGunPoint\n";
        match parse(log) {
            Err(ReportError::InvalidNumber { line, raw }) => {
                assert_eq!(line, 3);
                assert_eq!(raw, "GunPoint");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn concatenated_inputs_share_parser_state() {
        // A shard that died after its first stage, followed by a complete log.
        let crashed = "Adiac\n  0.002 seconds\n";
        let complete = format!("{COFFEE}Ham\n1\n1\n1\n1\n1\n0.7\n");

        let mut joined = Report::new();
        let err = joined
            .ingest_concatenated(
                [crashed.to_string(), complete.clone()].map(|log| io::Cursor::new(log.into_bytes())),
            )
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidNumber { line: 3, ref raw } if raw == "Coffee"));

        let mut piped = Report::new();
        let cat = format!("{crashed}{complete}");
        assert!(matches!(
            piped.ingest(cat.as_bytes()),
            Err(ReportError::InvalidNumber { line: 3, .. })
        ));
    }

    #[test]
    fn concatenated_complete_logs_merge() {
        let mut report = Report::new();
        let logs = [COFFEE.to_string(), "Ham\n1\n1\n1\n1\n1\n0.7\n".to_string()];
        report
            .ingest_concatenated(logs.map(|log| io::Cursor::new(log.into_bytes())))
            .unwrap();
        let names: Vec<&str> = report.records().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Coffee", "Ham"]);
    }

    #[test]
    fn ingest_merges_multiple_streams() {
        let mut report = Report::new();
        report.ingest(COFFEE.as_bytes()).unwrap();
        report.ingest("Ham\n1\n1\n1\n1\n1\n0.7\n".as_bytes()).unwrap();
        assert_eq!(report.len(), 2);
    }
}
