//! Fetching zipped datasets into the local archive on first use.

use std::fmt;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::archive::{SPLIT_EXTENSIONS, Split};
use crate::catalog::DatasetName;
use crate::error::IoError;

/// Default location of per-dataset `{Name}.zip` files.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://timeseriesclassification.com/aeon-toolkit";

/// Remote origin of zipped datasets.
pub trait ArchiveSource: fmt::Debug + Send + Sync {
    /// Return the raw bytes of the zip archive holding `name`.
    ///
    /// # Errors
    ///
    /// Any [`IoError`] raised while retrieving the archive.
    fn fetch(&self, name: DatasetName) -> Result<Vec<u8>, IoError>;
}

/// Downloads `{base_url}/{Name}.zip` over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// Create a source rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::HttpClient`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, IoError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|e| IoError::HttpClient { source: e })?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// URL of the zip archive for `name`.
    #[must_use]
    pub fn url(&self, name: DatasetName) -> String {
        format!("{}/{name}.zip", self.base_url.trim_end_matches('/'))
    }
}

impl ArchiveSource for HttpSource {
    #[instrument(skip(self), fields(dataset = %name))]
    fn fetch(&self, name: DatasetName) -> Result<Vec<u8>, IoError> {
        let url = self.url(name);
        info!(%url, "downloading dataset");

        let response = self.client.get(&url).send().map_err(|e| IoError::Download {
            url: url.clone(),
            source: e,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(IoError::DownloadStatus {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| IoError::Download {
            url: url.clone(),
            source: e,
        })?;
        debug!(n_bytes = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }
}

/// Unpack the split files of `name` from a zip archive into
/// `{archive_dir}/{Name}/`, returning how many were written.
///
/// Only entries whose file name is `{Name}_{TRAIN|TEST}.{tsv|ts}` are
/// extracted, whatever directory they sit under in the zip. Everything
/// else is ignored.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::Unzip`] | `bytes` is not a readable zip archive |
/// | [`IoError::ExtractWrite`] | the destination cannot be written |
#[instrument(skip(bytes), fields(dataset = %name, n_bytes = bytes.len()))]
pub(crate) fn extract_dataset(
    bytes: &[u8],
    name: DatasetName,
    archive_dir: &Path,
) -> Result<usize, IoError> {
    let unzip = |e| IoError::Unzip {
        dataset: name.to_string(),
        source: e,
    };
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).map_err(unzip)?;

    let dest = archive_dir.join(name.as_str());
    fs::create_dir_all(&dest).map_err(|e| IoError::ExtractWrite {
        path: dest.clone(),
        source: e,
    })?;

    let mut extracted = 0;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(unzip)?;
        if entry.is_dir() {
            continue;
        }
        let Some(file_name) = Path::new(entry.name())
            .file_name()
            .and_then(|f| f.to_str())
            .map(str::to_owned)
        else {
            continue;
        };
        if !is_split_file(name, &file_name) {
            continue;
        }

        let path = dest.join(&file_name);
        let write_err = |e| IoError::ExtractWrite {
            path: path.clone(),
            source: e,
        };
        let mut out = fs::File::create(&path).map_err(write_err)?;
        io::copy(&mut entry, &mut out).map_err(write_err)?;
        debug!(file = %file_name, "extracted");
        extracted += 1;
    }

    info!(extracted, dest = %dest.display(), "dataset unpacked");
    Ok(extracted)
}

fn is_split_file(name: DatasetName, file_name: &str) -> bool {
    [Split::Train, Split::Test].iter().any(|split| {
        SPLIT_EXTENSIONS
            .iter()
            .any(|ext| file_name == format!("{name}_{}.{ext}", split.as_str()))
    })
}
