//! Reproducible random sampling.
//!
//! [`RandomState`] turns a seed (or fresh entropy) into a
//! [`rand::rngs::StdRng`]; [`InverseCdfSampler`] draws fractional bin
//! indices from a batch of discrete distributions.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Initialisation of a random number generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomState {
    /// Deterministic stream from a fixed seed
    Seed(u64),
    /// Seed drawn from the thread-local generator
    Entropy,
}

impl Default for RandomState {
    fn default() -> Self {
        RandomState::Seed(0)
    }
}

/// Create a generator for the given random state.
///
/// A fixed seed always yields the same stream, which is what makes event
/// sampling reproducible.
pub fn get_random_state(state: RandomState) -> StdRng {
    let seed = match state {
        RandomState::Seed(seed) => seed,
        RandomState::Entropy => {
            let seed = rand::rng().next_u64();
            log::debug!("seeding random state from entropy: {seed}");
            seed
        }
    };
    StdRng::seed_from_u64(seed)
}

/// Inverse-CDF sampler over the last axis of a batch of discrete PDFs.
///
/// Each row of the input is an unnormalised probability mass function.
/// The cumulative sum of each row is normalised by its last element, so
/// rows only need to be non-negative.
#[derive(Debug, Clone)]
pub struct InverseCdfSampler {
    cdf: Array2<f64>,
}

impl InverseCdfSampler {
    pub fn new(pdf: &Array2<f64>) -> Self {
        let mut cdf = pdf.clone();
        for mut row in cdf.rows_mut() {
            let mut acc = 0.0;
            for v in row.iter_mut() {
                acc += *v;
                *v = acc;
            }
            row.mapv_inplace(|v| v / acc);
        }
        Self { cdf }
    }

    /// Normalised cumulative distribution, one row per distribution
    pub fn cdf(&self) -> &Array2<f64> {
        &self.cdf
    }

    /// Draw one fractional bin index per row.
    ///
    /// For each row a uniform variate `u` in `[0, 1)` selects the first bin
    /// whose CDF value exceeds `u`; a uniform jitter in `[-0.5, 0.5)` then
    /// spreads the sample across the bin. All selection variates are drawn
    /// before all jitter variates. Rows without probability mass yield NaN.
    pub fn sample_axis<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        let choices: Vec<f64> = (0..self.cdf.nrows()).map(|_| rng.random::<f64>()).collect();

        let indices: Vec<Option<usize>> = choices
            .iter()
            .zip(self.cdf.rows())
            .map(|(&u, row)| row.iter().position(|&c| u < c))
            .collect();

        indices
            .into_iter()
            .map(|idx| {
                let jitter = rng.random_range(-0.5..0.5);
                match idx {
                    Some(idx) => idx as f64 + jitter,
                    None => f64::NAN,
                }
            })
            .collect()
    }
}
