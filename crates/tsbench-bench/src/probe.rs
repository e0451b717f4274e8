//! Allocation counts of MiniRocket fit and transform across input shapes.

use std::io::Write;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use tracing::{debug, info, instrument};
use tsbench_dtw::TimeSeries;
use tsbench_models::{CancelFlag, MiniRocket, MiniRocketConfig, ModelError};

use crate::alloc::{AllocDelta, AllocSnapshot, CountingAllocator};
use crate::error::BenchError;
use crate::pipeline::emit;

/// Default number of series per probe shape.
pub const DEFAULT_ROWS: [usize; 25] = [
    1, 2, 3, 4, 7, 11, 18, 29, 46, 75, 121, 196, 316, 511, 825, 1334, 2154, 3481, 5623, 9085,
    14678, 23714, 38312, 61897, 100_000,
];

/// Default series lengths per probe shape.
pub const DEFAULT_COLS: [usize; 14] = [
    9, 11, 18, 29, 46, 75, 121, 196, 316, 511, 825, 1334, 2154, 3481,
];

/// Shortest series MiniRocket accepts.
const MIN_COLS: usize = 9;

/// Configuration for [`run_probe`].
///
/// # Defaults
///
/// | Parameter     | Default          |
/// |---------------|------------------|
/// | `rows`        | [`DEFAULT_ROWS`] |
/// | `cols`        | [`DEFAULT_COLS`] |
/// | `num_kernels` | 336 (84 x 4)     |
/// | `seed`        | 42               |
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    rows: Vec<usize>,
    cols: Vec<usize>,
    num_kernels: usize,
    seed: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS.to_vec(),
            cols: DEFAULT_COLS.to_vec(),
            num_kernels: 84 * 4,
            seed: 42,
        }
    }
}

impl ProbeConfig {
    /// Sweep the given row counts and series lengths instead of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidProbeShape`] if any row count is zero or
    /// any length is below 9.
    pub fn with_shapes(mut self, rows: Vec<usize>, cols: Vec<usize>) -> Result<Self, BenchError> {
        let bad_row = rows.iter().any(|&n| n == 0);
        let bad_col = cols.iter().find(|&&m| m < MIN_COLS);
        if bad_row || bad_col.is_some() {
            return Err(BenchError::InvalidProbeShape {
                rows: if bad_row { 0 } else { rows.first().copied().unwrap_or(0) },
                cols: bad_col.copied().unwrap_or(MIN_COLS),
                min_cols: MIN_COLS,
            });
        }
        self.rows = rows;
        self.cols = cols;
        Ok(self)
    }

    /// Set the seed of the random input data.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Allocation activity measured for one shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRow {
    /// Number of series.
    pub rows: usize,
    /// Series length.
    pub cols: usize,
    /// Constructing the transformer.
    pub construct: AllocDelta,
    /// Fitting it.
    pub fit: AllocDelta,
    /// Transforming the same data.
    pub transform: AllocDelta,
}

/// Sweep every `(rows, cols)` shape and print `N,M,fit,transform`
/// allocation counts, one line per shape.
///
/// Each shape gets fresh standard-normal data and an unmeasured warm-up fit
/// and transform before the measured one.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`BenchError::AllocatorNotInstalled`] | [`CountingAllocator`] is not the global allocator |
/// | [`BenchError::Model`] | fit or transform failed |
/// | [`BenchError::Output`] | writing to `out` failed |
#[instrument(skip_all, fields(n_rows = config.rows.len(), n_cols = config.cols.len()))]
pub fn run_probe(config: &ProbeConfig, out: &mut dyn Write) -> Result<Vec<ProbeRow>, BenchError> {
    if !CountingAllocator::is_installed() {
        return Err(BenchError::AllocatorNotInstalled);
    }

    let mr_config = MiniRocketConfig::new(config.num_kernels)?.with_seed(config.seed);
    let cancel = CancelFlag::new();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut rows = Vec::with_capacity(config.rows.len() * config.cols.len());

    emit(out, format_args!("N,M,fit,transform"))?;
    for &n in &config.rows {
        for &m in &config.cols {
            let data = standard_normal(&mut rng, n, m)?;

            let mut warm = MiniRocket::new(mr_config.clone());
            warm.fit(&data)?;
            warm.transform(&data, &cancel)?;
            drop(warm);

            let s1 = AllocSnapshot::now();
            let mut mr = MiniRocket::new(mr_config.clone());
            let s2 = AllocSnapshot::now();
            mr.fit(&data)?;
            let s3 = AllocSnapshot::now();
            let features = mr.transform(&data, &cancel)?;
            let s4 = AllocSnapshot::now();
            drop(features);

            let row = ProbeRow {
                rows: n,
                cols: m,
                construct: s1.until(&s2),
                fit: s2.until(&s3),
                transform: s3.until(&s4),
            };
            debug!(n, m, fit_bytes = row.fit.bytes, transform_bytes = row.transform.bytes, "shape probed");
            emit(
                out,
                format_args!("{n},{m},{},{}", row.fit.allocations, row.transform.allocations),
            )?;
            rows.push(row);
        }
    }

    info!(n_shapes = rows.len(), "allocation probe complete");
    Ok(rows)
}

fn standard_normal(rng: &mut ChaCha8Rng, n: usize, m: usize) -> Result<Vec<TimeSeries>, ModelError> {
    (0..n)
        .map(|_| {
            let values: Vec<f64> = (0..m).map(|_| rng.sample(StandardNormal)).collect();
            TimeSeries::new(values).map_err(ModelError::from)
        })
        .collect()
}
