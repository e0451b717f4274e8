//! Dataset access and result-log handling for the tsbench drivers.
//!
//! - [`DatasetName`] and [`UCR_DATASETS`]: the fixed catalog of equal-length
//!   UCR classification datasets, in benchmark order.
//! - [`CorpusProvider`] and [`UcrArchive`]: loading labelled train/test
//!   splits from a local archive, with an on-disk bincode cache.
//! - [`ArchiveSource`] and [`HttpSource`]: fetching zipped datasets that
//!   are missing from the archive.
//! - [`Report`]: reassembling per-dataset records from concatenated driver
//!   output, and writing the sorted summary.

mod archive;
mod cache;
mod catalog;
mod error;
mod fetch;
mod report;
mod summary;

pub use archive::{CorpusProvider, Split, UcrArchive, default_cache_dir};
pub use catalog::{DatasetName, UCR_DATASETS};
pub use error::{IoError, ReportError};
pub use fetch::{ArchiveSource, DEFAULT_DOWNLOAD_URL, HttpSource};
pub use report::{BenchRecord, Report};
pub use summary::{SummaryFormat, write_summary};
