//! Loading labelled UCR splits from a local archive, fetching on first use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use tsbench_dtw::TimeSeries;
use tsbench_models::{ClassLabel, LabeledSplit};

use crate::cache::{self, CacheLookup};
use crate::catalog::DatasetName;
use crate::error::IoError;
use crate::fetch::{ArchiveSource, extract_dataset};

/// Which half of a dataset to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// The training split.
    Train,
    /// The test split.
    Test,
}

impl Split {
    /// Suffix used in archive and cache file names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "TRAIN",
            Self::Test => "TEST",
        }
    }
}

/// Source of labelled dataset splits.
pub trait CorpusProvider {
    /// Load one split of a dataset.
    ///
    /// # Errors
    ///
    /// Any [`IoError`] raised while locating, reading or validating the split.
    fn load(&self, name: DatasetName, split: Split) -> Result<LabeledSplit, IoError>;

    /// Load the training and test splits, in that order.
    ///
    /// # Errors
    ///
    /// The first error from either [`load`][Self::load] call.
    fn load_pair(&self, name: DatasetName) -> Result<(LabeledSplit, LabeledSplit), IoError> {
        Ok((self.load(name, Split::Train)?, self.load(name, Split::Test)?))
    }
}

/// Default split cache location: `$HOME/.tsbench_ucr`.
#[must_use]
pub fn default_cache_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".tsbench_ucr"))
}

/// File extensions recognised for a split, in lookup order.
pub(crate) const SPLIT_EXTENSIONS: [&str; 2] = ["tsv", "ts"];

/// Reads splits from a UCR archive laid out as
/// `{archive}/{Name}/{Name}_TRAIN.tsv` and `{Name}_TEST.tsv`.
///
/// Each TSV row is one series: the class label followed by the values,
/// tab separated, no header. `.ts` files (header lines, then `@data` rows
/// of comma-separated values ending in `:label`) are read when no TSV is
/// present. With an [`ArchiveSource`] configured, a dataset missing from
/// the archive is fetched as `{Name}.zip` and unpacked in place first.
///
/// With a cache directory configured, decoded splits are stored as
/// `{cache}/{Name}_{TRAIN|TEST}.bin` and served from there on later loads.
/// Stale or unreadable cache entries are re-read from the archive and
/// overwritten.
#[derive(Debug, Clone)]
pub struct UcrArchive {
    archive_dir: PathBuf,
    cache_dir: Option<PathBuf>,
    source: Option<Arc<dyn ArchiveSource>>,
}

impl UcrArchive {
    /// Create a provider over `archive_dir` with caching and fetching disabled.
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            cache_dir: None,
            source: None,
        }
    }

    /// Enable the split cache in `cache_dir`. The directory is created on
    /// first write.
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Fetch datasets missing from the archive directory from `source`.
    #[must_use]
    pub fn with_source(mut self, source: impl ArchiveSource + 'static) -> Self {
        let source: Arc<dyn ArchiveSource> = Arc::new(source);
        self.source = Some(source);
        self
    }

    /// Path of the archive TSV file for a split.
    #[must_use]
    pub fn split_path(&self, name: DatasetName, split: Split) -> PathBuf {
        self.split_file(name, split, SPLIT_EXTENSIONS[0])
    }

    fn split_file(&self, name: DatasetName, split: Split, ext: &str) -> PathBuf {
        self.archive_dir
            .join(name.as_str())
            .join(format!("{name}_{}.{ext}", split.as_str()))
    }

    /// First existing split file, TSV before `.ts`.
    fn local_split(&self, name: DatasetName, split: Split) -> Option<PathBuf> {
        SPLIT_EXTENSIONS
            .iter()
            .map(|ext| self.split_file(name, split, ext))
            .find(|path| path.is_file())
    }

    fn cache_path(&self, name: DatasetName, split: Split) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{name}_{}.bin", split.as_str())))
    }

    /// Download and unpack `name`, then locate the requested split.
    fn fetch(&self, name: DatasetName, split: Split) -> Result<PathBuf, IoError> {
        let Some(source) = &self.source else {
            return Err(IoError::FileNotFound {
                path: self.split_path(name, split),
                source: std::io::ErrorKind::NotFound.into(),
            });
        };

        let bytes = source.fetch(name)?;
        extract_dataset(&bytes, name, &self.archive_dir)?;
        self.local_split(name, split).ok_or_else(|| IoError::MissingSplit {
            dataset: name.to_string(),
            split: split.as_str(),
        })
    }
}

impl CorpusProvider for UcrArchive {
    #[instrument(skip(self), fields(dataset = %name, split = split.as_str()))]
    fn load(&self, name: DatasetName, split: Split) -> Result<LabeledSplit, IoError> {
        let local = self.local_split(name, split);
        let cache_path = self.cache_path(name, split);

        if let Some(cache_path) = &cache_path {
            match cache::read(cache_path, name, split, local.as_deref()) {
                CacheLookup::Hit(data) => {
                    debug!(path = %cache_path.display(), "cache hit");
                    return Ok(data);
                }
                CacheLookup::Miss => debug!(path = %cache_path.display(), "cache miss"),
                CacheLookup::Stale(reason) => {
                    warn!(path = %cache_path.display(), %reason, "discarding stale cache entry");
                }
            }
        }

        let path = match local {
            Some(path) => path,
            None => self.fetch(name, split)?,
        };
        let data = read_split(&path)?;
        if let Some(cache_path) = &cache_path {
            cache::write(cache_path, name, split, &data)?;
        }
        Ok(data)
    }
}

/// Read a split file, choosing the parser by extension.
fn read_split(path: &Path) -> Result<LabeledSplit, IoError> {
    if path.extension().is_some_and(|ext| ext == "ts") {
        read_ts(path)
    } else {
        read_tsv(path)
    }
}

/// Validated rows of one split under construction.
struct SplitRows<'p> {
    path: &'p Path,
    series: Vec<TimeSeries>,
    labels: Vec<ClassLabel>,
    expected_len: Option<usize>,
}

impl<'p> SplitRows<'p> {
    fn new(path: &'p Path) -> Self {
        Self {
            path,
            series: Vec::new(),
            labels: Vec::new(),
            expected_len: None,
        }
    }

    /// Validate and append one row. Trailing empty cells are ignored.
    fn push(&mut self, row_index: usize, label: &str, cells: &[&str]) -> Result<(), IoError> {
        let path = self.path;
        let n_values = cells.iter().rposition(|c| !c.is_empty()).map_or(0, |p| p + 1);
        if n_values == 0 {
            return Err(IoError::EmptyRow {
                path: path.to_path_buf(),
                row_index,
            });
        }

        let expected = *self.expected_len.get_or_insert(n_values);
        if n_values != expected {
            return Err(IoError::InconsistentRowLength {
                path: path.to_path_buf(),
                row_index,
                expected,
                got: n_values,
            });
        }

        let mut values = Vec::with_capacity(n_values);
        for (col_index, raw) in cells[..n_values].iter().enumerate() {
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| IoError::NonFiniteValue {
                    path: path.to_path_buf(),
                    row_index,
                    col_index,
                    raw: (*raw).to_string(),
                })?;
            values.push(value);
        }

        let ts = TimeSeries::new(values).map_err(|e| IoError::InvalidSplit {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        self.series.push(ts);
        self.labels.push(ClassLabel::new(label));
        Ok(())
    }

    fn finish(self) -> Result<LabeledSplit, IoError> {
        let path = self.path;
        if self.series.is_empty() {
            return Err(IoError::EmptySplit {
                path: path.to_path_buf(),
            });
        }

        info!(
            n_series = self.series.len(),
            series_len = self.expected_len.unwrap_or(0),
            "split loaded"
        );

        LabeledSplit::new(self.series, self.labels).map_err(|e| IoError::InvalidSplit {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Read and validate one UCR TSV split.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed record |
/// | [`IoError::EmptySplit`] | Zero rows |
/// | [`IoError::EmptyRow`] | A row has a label but no values |
/// | [`IoError::InconsistentRowLength`] | Row length differs from the first row |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
#[instrument(fields(path = %path.display()))]
pub(crate) fn read_tsv(path: &Path) -> Result<LabeledSplit, IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = SplitRows::new(path);
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| IoError::CsvParse {
            path: path.to_path_buf(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;

        let label = record.get(0).unwrap_or("");
        let cells: Vec<&str> = record.iter().skip(1).collect();
        rows.push(row_index, label, &cells)?;
    }
    rows.finish()
}

/// Read and validate one univariate `.ts` split.
///
/// Lines before `@data` are header and skipped, as are blank lines and
/// `#` comments. Each data line is `v1,v2,...,vn:label`.
///
/// # Errors
///
/// As [`read_tsv`], plus [`IoError::MalformedRow`] for a data line with no
/// label or with more than one dimension.
#[instrument(fields(path = %path.display()))]
pub(crate) fn read_ts(path: &Path) -> Result<LabeledSplit, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut rows = SplitRows::new(path);
    let mut in_data = false;
    let mut row_index = 0;
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !in_data {
            in_data = line.eq_ignore_ascii_case("@data");
            continue;
        }

        let malformed = |reason| IoError::MalformedRow {
            path: path.to_path_buf(),
            row_index,
            reason,
        };
        let (values, label) = line.rsplit_once(':').ok_or_else(|| malformed("no class label"))?;
        if values.contains(':') {
            return Err(malformed("more than one dimension"));
        }

        let cells: Vec<&str> = values.split(',').map(str::trim).collect();
        rows.push(row_index, label.trim(), &cells)?;
        row_index += 1;
    }
    rows.finish()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_tsv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_labels_and_values() {
        let f = write_tsv("1\t0.5\t1.5\t2.5\n2\t-1.0\t0.0\t1.0\n");
        let split = read_tsv(f.path()).unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split.labels()[1].as_str(), "2");
        assert_eq!(split.series()[0].as_ref(), &[0.5, 1.5, 2.5]);
    }

    #[test]
    fn trailing_separator_ignored() {
        let f = write_tsv("a\t1.0\t2.0\t\nb\t3.0\t4.0\n");
        let split = read_tsv(f.path()).unwrap();
        assert_eq!(split.series()[0].len(), 2);
    }

    #[test]
    fn unequal_rows_rejected() {
        let f = write_tsv("1\t1.0\t2.0\t3.0\n1\t1.0\t2.0\n");
        assert!(matches!(
            read_tsv(f.path()),
            Err(IoError::InconsistentRowLength { row_index: 1, expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn nan_rejected_with_position() {
        let f = write_tsv("1\t1.0\tNaN\n");
        match read_tsv(f.path()) {
            Err(IoError::NonFiniteValue { row_index, col_index, raw, .. }) => {
                assert_eq!((row_index, col_index, raw.as_str()), (0, 1, "NaN"));
            }
            other => panic!("expected NonFiniteValue, got {other:?}"),
        }
    }

    #[test]
    fn ts_rows_after_data_marker() {
        let f = write_tsv(
            "# comment\n@problemName Coffee\n@univariate true\n@classLabel true 0 1\n@data\n\
             0.5,1.5,2.5:0\n-1.0, 0.0, 1.0:1\n",
        );
        let split = read_ts(f.path()).unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split.labels()[1].as_str(), "1");
        assert_eq!(split.series()[1].as_ref(), &[-1.0, 0.0, 1.0]);
    }

    #[test]
    fn ts_multivariate_row_rejected() {
        let f = write_tsv("@data\n1.0,2.0:3.0,4.0:a\n");
        assert!(matches!(
            read_ts(f.path()),
            Err(IoError::MalformedRow { row_index: 0, .. })
        ));
    }

    #[test]
    fn ts_missing_value_rejected() {
        let f = write_tsv("@data\n1.0,?,3.0:a\n");
        assert!(matches!(
            read_ts(f.path()),
            Err(IoError::NonFiniteValue { col_index: 1, .. })
        ));
    }

    #[test]
    fn empty_file_rejected() {
        let f = write_tsv("");
        assert!(matches!(read_tsv(f.path()), Err(IoError::EmptySplit { .. })));
    }

    #[test]
    fn missing_file_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let archive = UcrArchive::new(dir.path());
        let name = DatasetName::new("Coffee").unwrap();
        assert!(matches!(
            archive.load(name, Split::Train),
            Err(IoError::FileNotFound { .. })
        ));
        assert!(archive.split_path(name, Split::Test).ends_with("Coffee/Coffee_TEST.tsv"));
    }
}
