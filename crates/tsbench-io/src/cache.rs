//! On-disk bincode cache of decoded splits.

use std::fs;
use std::path::Path;

use tracing::{debug, instrument};
use tsbench_dtw::TimeSeries;
use tsbench_models::{ClassLabel, LabeledSplit};

use crate::archive::Split;
use crate::catalog::DatasetName;
use crate::error::IoError;

/// Current cache format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for a cached split.
#[derive(serde::Serialize, serde::Deserialize)]
struct SplitEnvelope {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Dataset the split belongs to.
    dataset: String,
    /// `TRAIN` or `TEST`.
    split: String,
    /// Class labels, parallel to `series`.
    labels: Vec<String>,
    /// Raw series values.
    series: Vec<Vec<f64>>,
}

/// Outcome of a cache lookup.
pub(crate) enum CacheLookup {
    /// A valid entry.
    Hit(LabeledSplit),
    /// No entry on disk.
    Miss,
    /// An entry exists but cannot be used.
    Stale(String),
}

/// Look up a cached split. Entries older than `source` (when given),
/// from another format version, for another dataset, or that fail to
/// decode or validate are reported as [`CacheLookup::Stale`].
pub(crate) fn read(
    path: &Path,
    name: DatasetName,
    split: Split,
    source: Option<&Path>,
) -> CacheLookup {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheLookup::Miss,
        Err(e) => return CacheLookup::Stale(format!("unreadable: {e}")),
    };

    if let Some(source) = source
        && let (Ok(cached), Ok(archived)) = (modified(path), modified(source))
        && archived > cached
    {
        return CacheLookup::Stale("archive file is newer".to_string());
    }

    let envelope: SplitEnvelope = match bincode::deserialize(&bytes) {
        Ok(envelope) => envelope,
        Err(e) => return CacheLookup::Stale(format!("corrupt: {e}")),
    };

    if envelope.format_version != FORMAT_VERSION {
        return CacheLookup::Stale(format!(
            "format version {} (expected {FORMAT_VERSION})",
            envelope.format_version
        ));
    }
    if envelope.dataset != name.as_str() || envelope.split != split.as_str() {
        return CacheLookup::Stale(format!(
            "holds {}_{} instead",
            envelope.dataset, envelope.split
        ));
    }

    let series: Result<Vec<TimeSeries>, _> =
        envelope.series.into_iter().map(TimeSeries::new).collect();
    let labels = envelope.labels.into_iter().map(ClassLabel::new).collect();
    match series.map_err(Into::into).and_then(|s| LabeledSplit::new(s, labels)) {
        Ok(data) if !data.is_empty() => CacheLookup::Hit(data),
        Ok(_) => CacheLookup::Stale("empty split".to_string()),
        Err(e) => CacheLookup::Stale(format!("invalid contents: {e}")),
    }
}

/// Write `data` to the cache, creating the cache directory if needed.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::CacheDirCreate`] | the parent directory cannot be created |
/// | [`IoError::SerializeCache`] | bincode encoding failed |
/// | [`IoError::WriteCache`] | file write failed |
#[instrument(skip(data), fields(path = %path.display()))]
pub(crate) fn write(
    path: &Path,
    name: DatasetName,
    split: Split,
    data: &LabeledSplit,
) -> Result<(), IoError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| IoError::CacheDirCreate {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    let envelope = SplitEnvelope {
        format_version: FORMAT_VERSION,
        dataset: name.as_str().to_string(),
        split: split.as_str().to_string(),
        labels: data.labels().iter().map(|l| l.as_str().to_string()).collect(),
        series: data.series().iter().map(|s| s.as_ref().to_vec()).collect(),
    };

    let bytes = bincode::serialize(&envelope).map_err(|e| IoError::SerializeCache { source: e })?;
    fs::write(path, &bytes).map_err(|e| IoError::WriteCache {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(size_bytes = bytes.len(), "split cached");
    Ok(())
}

fn modified(path: &Path) -> std::io::Result<std::time::SystemTime> {
    fs::metadata(path)?.modified()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample() -> LabeledSplit {
        LabeledSplit::new(
            vec![
                TimeSeries::new(vec![1.0, 2.0, 3.0]).unwrap(),
                TimeSeries::new(vec![4.0, 5.0, 6.0]).unwrap(),
            ],
            vec![ClassLabel::new("a"), ClassLabel::new("b")],
        )
        .unwrap()
    }

    fn coffee() -> DatasetName {
        DatasetName::new("Coffee").unwrap()
    }

    #[test]
    fn written_entry_is_a_hit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("Coffee_TRAIN.bin");
        write(&path, coffee(), Split::Train, &sample()).unwrap();

        match read(&path, coffee(), Split::Train, None) {
            CacheLookup::Hit(data) => {
                assert_eq!(data.len(), 2);
                assert_eq!(data.labels()[1].as_str(), "b");
                assert_eq!(data.series()[1].as_ref(), &[4.0, 5.0, 6.0]);
            }
            _ => panic!("expected a cache hit"),
        }
    }

    #[test]
    fn absent_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Coffee_TRAIN.bin");
        assert!(matches!(read(&path, coffee(), Split::Train, None), CacheLookup::Miss));
    }

    #[test]
    fn garbage_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Coffee_TRAIN.bin");
        fs::write(&path, b"not bincode").unwrap();
        let source = dir.path().join("absent.tsv");
        assert!(matches!(read(&path, coffee(), Split::Train, Some(source.as_path())), CacheLookup::Stale(_)));
    }

    #[test]
    fn entry_for_other_split_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Coffee_TRAIN.bin");
        let source = dir.path().join("absent.tsv");
        write(&path, coffee(), Split::Test, &sample()).unwrap();
        assert!(matches!(read(&path, coffee(), Split::Train, Some(source.as_path())), CacheLookup::Stale(_)));
    }
}
