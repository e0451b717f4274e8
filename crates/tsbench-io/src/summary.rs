//! Summary table output for a parsed [`Report`].

use std::io::Write;

use crate::error::ReportError;
use crate::report::Report;

/// Header of the CSV summary.
const CSV_HEADER: &str = "name, filter_datasets, load_data, create_model, fit, predict, accuracy";

/// Output format of [`write_summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    /// Comma-and-space separated table with a header row.
    #[default]
    Csv,
    /// JSON array of records.
    Json,
}

/// Write every record of `report` in name order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ReportError::WriteSummary`] | writing to `out` failed |
/// | [`ReportError::SerializeSummary`] | JSON encoding failed |
pub fn write_summary<W: Write>(
    report: &Report,
    format: SummaryFormat,
    mut out: W,
) -> Result<(), ReportError> {
    let io_err = |e| ReportError::WriteSummary { source: e };
    match format {
        SummaryFormat::Csv => {
            writeln!(out, "{CSV_HEADER}").map_err(io_err)?;
            for r in report.records() {
                writeln!(
                    out,
                    "{}, {:?}, {:?}, {:?}, {:?}, {:?}, {:?}",
                    r.name, r.filter_datasets, r.load_data, r.create_model, r.fit, r.predict, r.accuracy
                )
                .map_err(io_err)?;
            }
        }
        SummaryFormat::Json => {
            let records: Vec<_> = report.records().collect();
            serde_json::to_writer_pretty(&mut out, &records)
                .map_err(|e| ReportError::SerializeSummary { source: e })?;
            writeln!(out).map_err(io_err)?;
        }
    }
    out.flush().map_err(io_err)
}
