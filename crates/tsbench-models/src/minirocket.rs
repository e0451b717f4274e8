//! MiniRocket: random-convolutional-kernel transform for univariate series.
//!
//! Uses the fixed set of 84 length-9 kernels with weights in {-1, 2} (three
//! taps at 2, six at -1), a log-spaced set of dilations derived from the
//! input length, and biases drawn from quantiles of the convolution output
//! of randomly chosen training series. Each (dilation, kernel, bias) triple
//! yields one PPV feature: the proportion of convolution outputs above the
//! bias. Kernels alternate between padded and unpadded evaluation.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use tsbench_dtw::TimeSeries;

use crate::cancel::CancelFlag;
use crate::error::ModelError;
use crate::model::{Inference, Model};
use crate::split::LabeledSplit;

const KERNEL_LENGTH: usize = 9;
const CENTRE: usize = KERNEL_LENGTH / 2;
const NUM_BASE_KERNELS: usize = 84;

/// Configuration for [`MiniRocket`].
///
/// # Defaults
///
/// | Parameter                  | Default |
/// |----------------------------|---------|
/// | `num_kernels`              | 10 000  |
/// | `max_dilations_per_kernel` | 32      |
/// | `seed`                     | 42      |
#[derive(Debug, Clone)]
pub struct MiniRocketConfig {
    num_kernels: usize,
    max_dilations_per_kernel: usize,
    seed: u64,
}

impl Default for MiniRocketConfig {
    fn default() -> Self {
        Self {
            num_kernels: 10_000,
            max_dilations_per_kernel: 32,
            seed: 42,
        }
    }
}

impl MiniRocketConfig {
    /// Create a config producing roughly `num_kernels` features (rounded
    /// down to a multiple of 84).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidKernelCount`] if `num_kernels` < 84.
    pub fn new(num_kernels: usize) -> Result<Self, ModelError> {
        if num_kernels < NUM_BASE_KERNELS {
            return Err(ModelError::InvalidKernelCount {
                num_kernels,
                min: NUM_BASE_KERNELS,
            });
        }
        Ok(Self {
            num_kernels,
            ..Self::default()
        })
    }

    /// Cap the number of distinct dilations per base kernel.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidMaxDilations`] if `max` is zero.
    pub fn with_max_dilations_per_kernel(mut self, max: usize) -> Result<Self, ModelError> {
        if max == 0 {
            return Err(ModelError::InvalidMaxDilations);
        }
        self.max_dilations_per_kernel = max;
        Ok(self)
    }

    /// Set the seed used to pick the series each bias is estimated from.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Parameters learnt by [`MiniRocket::fit`].
#[derive(Debug, Clone)]
struct Parameters {
    dilations: Vec<usize>,
    features_per_dilation: Vec<usize>,
    biases: Vec<f64>,
}

/// The MiniRocket transformer.
#[derive(Debug)]
pub struct MiniRocket {
    config: MiniRocketConfig,
    kernels: Vec<[usize; 3]>,
    params: Option<Parameters>,
}

impl MiniRocket {
    /// Create an unfitted transformer.
    #[must_use]
    pub fn new(config: MiniRocketConfig) -> Self {
        Self {
            config,
            kernels: base_kernels(),
            params: None,
        }
    }

    /// Number of output features, once fitted.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.params.as_ref().map(|p| p.biases.len())
    }

    /// Learn dilations and biases from `series`. All series must be at
    /// least 9 steps long; the first series fixes the input length.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::EmptyTrainingSet`] | `series` is empty |
    /// | [`ModelError::SeriesTooShort`] | any series is shorter than 9 |
    #[instrument(skip_all, fields(n = series.len()))]
    pub fn fit(&mut self, series: &[TimeSeries]) -> Result<(), ModelError> {
        let input_length = series.first().ok_or(ModelError::EmptyTrainingSet)?.len();
        check_lengths(series)?;

        let (dilations, features_per_dilation) = fit_dilations(
            input_length,
            self.config.num_kernels,
            self.config.max_dilations_per_kernel,
        );
        let n_features = NUM_BASE_KERNELS * features_per_dilation.iter().sum::<usize>();
        let quantiles = low_discrepancy_quantiles(n_features);

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut biases = Vec::with_capacity(n_features);

        for (&dilation, &n_dil_features) in dilations.iter().zip(&features_per_dilation) {
            for kernel in &self.kernels {
                let example = &series[rng.gen_range(0..series.len())];
                let conv = Convolution::new(example.as_ref(), dilation);
                let mut out = conv.kernel_output(kernel);
                out.sort_by(f64::total_cmp);
                let start = biases.len();
                biases.extend(
                    quantiles[start..start + n_dil_features]
                        .iter()
                        .map(|&q| sorted_quantile(&out, q)),
                );
            }
        }

        info!(
            input_length,
            n_dilations = dilations.len(),
            n_features,
            "MiniRocket fitted"
        );
        self.params = Some(Parameters {
            dilations,
            features_per_dilation,
            biases,
        });
        Ok(())
    }

    /// Transform each series into its PPV feature vector, in parallel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ModelError::NotFitted`] | called before [`fit`][Self::fit] |
    /// | [`ModelError::SeriesTooShort`] | any series is shorter than 9 |
    /// | [`ModelError::Cancelled`] | `cancel` raised before all series were transformed |
    #[instrument(skip_all, fields(n = series.len()))]
    pub fn transform(
        &self,
        series: &[TimeSeries],
        cancel: &CancelFlag,
    ) -> Result<Vec<Vec<f64>>, ModelError> {
        let params = self.params.as_ref().ok_or(ModelError::NotFitted)?;
        check_lengths(series)?;

        let rows = series
            .par_iter()
            .map(|s| {
                cancel.check()?;
                Ok(self.transform_one(params, s.as_ref()))
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        debug!(n_rows = rows.len(), "transform complete");
        Ok(rows)
    }

    fn transform_one(&self, params: &Parameters, x: &[f64]) -> Vec<f64> {
        let mut features = Vec::with_capacity(params.biases.len());

        for (dilation_index, (&dilation, &n_dil_features)) in params
            .dilations
            .iter()
            .zip(&params.features_per_dilation)
            .enumerate()
        {
            let conv = Convolution::new(x, dilation);
            let padding = (KERNEL_LENGTH - 1) * dilation / 2;

            for (kernel_index, kernel) in self.kernels.iter().enumerate() {
                let out = conv.kernel_output(kernel);
                // Alternate padded / unpadded outputs across kernels and dilations.
                let window = if (dilation_index + kernel_index) % 2 == 0 {
                    &out[..]
                } else {
                    // Inputs shorter than the fitted length may not have an interior.
                    out.get(padding..out.len().saturating_sub(padding))
                        .filter(|w| !w.is_empty())
                        .unwrap_or(&out[..])
                };
                let start = features.len();
                features.extend(
                    params.biases[start..start + n_dil_features]
                        .iter()
                        .map(|&bias| ppv(window, bias)),
                );
            }
        }

        features
    }
}

impl Model for MiniRocket {
    fn name(&self) -> &'static str {
        "minirocket"
    }

    fn fit(&mut self, train: &LabeledSplit) -> Result<(), ModelError> {
        MiniRocket::fit(self, train.series())
    }

    fn infer(
        &self,
        train: &LabeledSplit,
        test: &LabeledSplit,
        cancel: &CancelFlag,
    ) -> Result<Inference, ModelError> {
        let train = self.transform(train.series(), cancel)?;
        let test = self.transform(test.series(), cancel)?;
        Ok(Inference::Features { train, test })
    }
}

fn check_lengths(series: &[TimeSeries]) -> Result<(), ModelError> {
    match series.iter().position(|s| s.len() < KERNEL_LENGTH) {
        Some(index) => Err(ModelError::SeriesTooShort {
            index,
            len: series[index].len(),
            min: KERNEL_LENGTH,
        }),
        None => Ok(()),
    }
}

/// The 84 ways to choose the three taps with weight 2, in lexicographic order.
fn base_kernels() -> Vec<[usize; 3]> {
    let mut kernels = Vec::with_capacity(NUM_BASE_KERNELS);
    for a in 0..KERNEL_LENGTH {
        for b in a + 1..KERNEL_LENGTH {
            for c in b + 1..KERNEL_LENGTH {
                kernels.push([a, b, c]);
            }
        }
    }
    kernels
}

/// Distinct dilations (powers of two, log-spaced up to the input length)
/// and how many features each contributes per base kernel.
fn fit_dilations(
    input_length: usize,
    num_features: usize,
    max_dilations_per_kernel: usize,
) -> (Vec<usize>, Vec<usize>) {
    let features_per_kernel = num_features / NUM_BASE_KERNELS;
    let true_max = features_per_kernel.min(max_dilations_per_kernel);
    let multiplier = features_per_kernel as f64 / true_max as f64;
    let max_exponent = ((input_length - 1) as f64 / (KERNEL_LENGTH - 1) as f64).log2();

    let mut dilations: Vec<usize> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for k in 0..true_max {
        let exponent = if true_max > 1 {
            max_exponent * k as f64 / (true_max - 1) as f64
        } else {
            0.0
        };
        let dilation = 2f64.powf(exponent).floor() as usize;
        match dilations.last() {
            Some(&last) if last == dilation => {
                if let Some(c) = counts.last_mut() {
                    *c += 1;
                }
            }
            _ => {
                dilations.push(dilation);
                counts.push(1);
            }
        }
    }

    let mut per_dilation: Vec<usize> = counts
        .iter()
        .map(|&c| (c as f64 * multiplier) as usize)
        .collect();
    let mut remainder = features_per_kernel - per_dilation.iter().sum::<usize>();
    let mut i = 0;
    while remainder > 0 {
        per_dilation[i] += 1;
        remainder -= 1;
        i = (i + 1) % per_dilation.len();
    }

    (dilations, per_dilation)
}

/// Golden-ratio low-discrepancy sequence in (0, 1).
fn low_discrepancy_quantiles(n: usize) -> Vec<f64> {
    let phi = (5f64.sqrt() + 1.0) / 2.0;
    (1..=n).map(|k| (k as f64 * phi) % 1.0).collect()
}

/// Linear-interpolation quantile of an ascending slice.
fn sorted_quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Proportion of positive values: fraction of `out` strictly above `bias`.
fn ppv(out: &[f64], bias: f64) -> f64 {
    out.iter().filter(|&&v| v > bias).count() as f64 / out.len() as f64
}

/// Per-dilation building blocks of every base kernel's output.
///
/// With every weight written as `-1 + 3 * [tap is a 2-tap]`, a kernel's
/// output is `alpha + gamma[i0] + gamma[i1] + gamma[i2]`, where `alpha` is
/// the all-(-1) convolution and `gamma[j]` is three times the input shifted
/// to tap `j`. Out-of-range taps contribute zero.
struct Convolution {
    alpha: Vec<f64>,
    gamma: [Vec<f64>; KERNEL_LENGTH],
}

impl Convolution {
    fn new(x: &[f64], dilation: usize) -> Self {
        let n = x.len();
        let mut alpha = vec![0.0; n];
        let gamma: [Vec<f64>; KERNEL_LENGTH] = std::array::from_fn(|tap| {
            let mut g = vec![0.0; n];
            for (t, slot) in g.iter_mut().enumerate() {
                let src = (t + tap * dilation).checked_sub(CENTRE * dilation);
                if let Some(v) = src.and_then(|s| x.get(s)) {
                    *slot = 3.0 * v;
                }
            }
            g
        });
        for (t, a) in alpha.iter_mut().enumerate() {
            for tap in 0..KERNEL_LENGTH {
                let src = (t + tap * dilation).checked_sub(CENTRE * dilation);
                if let Some(v) = src.and_then(|s| x.get(s)) {
                    *a -= v;
                }
            }
        }
        Self { alpha, gamma }
    }

    fn kernel_output(&self, kernel: &[usize; 3]) -> Vec<f64> {
        let [i0, i1, i2] = *kernel;
        self.alpha
            .iter()
            .zip(&self.gamma[i0])
            .zip(&self.gamma[i1])
            .zip(&self.gamma[i2])
            .map(|(((a, g0), g1), g2)| a + g0 + g1 + g2)
            .collect()
    }
}
