//! I/O error types for tsbench-io.

use std::path::PathBuf;

use tsbench_models::ModelError;

/// Errors from the dataset catalog, archive reader and split cache.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a dataset name is not in the catalog.
    #[error("unknown dataset \"{name}\"")]
    UnknownDataset {
        /// The name that was looked up.
        name: String,
    },

    /// Returned when an archive file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the TSV parser encounters a malformed record.
    #[error("TSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the TSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a split file contains no rows.
    #[error("empty split (no data rows) in {path}")]
    EmptySplit {
        /// Path to the TSV file.
        path: PathBuf,
    },

    /// Returned when a row holds a label but no values.
    #[error("row {row_index} in {path} has no values")]
    EmptyRow {
        /// Path to the TSV file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
    },

    /// Returned when rows in one split differ in length.
    #[error("inconsistent row length in {path}: row {row_index} has {got} values, expected {expected}")]
    InconsistentRowLength {
        /// Path to the TSV file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of this row.
        got: usize,
    },

    /// Returned when a cell is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the TSV file.
        path: PathBuf,
        /// Zero-based row index.
        row_index: usize,
        /// Zero-based column index (excluding the label column).
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a `.ts` data line cannot be split into values and label.
    #[error("malformed row {row_index} in {path}: {reason}")]
    MalformedRow {
        /// Path to the `.ts` file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
        /// What is wrong with the row.
        reason: &'static str,
    },

    /// Returned when the HTTP client cannot be constructed.
    #[error("cannot build HTTP client")]
    HttpClient {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },

    /// Returned when a dataset download fails in transit.
    #[error("download failed: {url}")]
    Download {
        /// URL that was requested.
        url: String,
        /// Underlying reqwest error.
        source: reqwest::Error,
    },

    /// Returned when the server answers a download with a non-success status.
    #[error("download of {url} returned HTTP {status}")]
    DownloadStatus {
        /// URL that was requested.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Returned when a fetched archive is not a readable zip.
    #[error("cannot unpack archive for \"{dataset}\"")]
    Unzip {
        /// Dataset whose archive was fetched.
        dataset: String,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },

    /// Returned when an unpacked split cannot be written to the archive directory.
    #[error("cannot write extracted file {path}")]
    ExtractWrite {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a fetched archive does not contain the requested split.
    #[error("fetched archive for \"{dataset}\" has no {split} split")]
    MissingSplit {
        /// Dataset whose archive was fetched.
        dataset: String,
        /// `TRAIN` or `TEST`.
        split: &'static str,
    },

    /// Returned when the cache directory cannot be created.
    #[error("cannot create cache directory {path}")]
    CacheDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a split cannot be encoded for the cache.
    #[error("failed to serialize cached split")]
    SerializeCache {
        /// Underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when a cache entry cannot be written.
    #[error("cannot write cache file {path}")]
    WriteCache {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loaded rows do not form a valid labelled split.
    #[error("invalid split in {path}")]
    InvalidSplit {
        /// Path the split was read from.
        path: PathBuf,
        /// Underlying validation error.
        source: ModelError,
    },
}

/// Errors from parsing driver logs and writing the summary.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Returned when reading a log line fails.
    #[error("failed to read log line {line}")]
    ReadLine {
        /// 1-based line number.
        line: usize,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a line expected to carry a number does not start with one.
    #[error("line {line}: expected a number, found \"{raw}\"")]
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// The offending leading token.
        raw: String,
    },

    /// Returned when the summary cannot be written.
    #[error("failed to write summary")]
    WriteSummary {
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the JSON summary cannot be encoded.
    #[error("failed to serialize summary")]
    SerializeSummary {
        /// Underlying serde_json error.
        source: serde_json::Error,
    },
}
