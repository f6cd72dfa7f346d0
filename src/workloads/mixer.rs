//! Workload mixer: dispatches driver iterations across the four categories
//! according to configured ratios.

use crate::catalog::Catalog;
use crate::common::statistics::LocalStatistics;
use crate::database::Connection;
use crate::workloads::driver;
use crate::workloads::paramgen::ParameterGenerator;
use crate::workloads::Category;

use config::Config;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::warn;

/// Category weights for a mixed run.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMix {
    pub ap: f64,
    pub tp: f64,
    pub at: f64,
    pub iq: f64,
}

impl CategoryMix {
    pub fn new(ap: f64, tp: f64, at: f64, iq: f64) -> CategoryMix {
        CategoryMix { ap, tp, at, iq }
    }

    /// Ratios from configuration, falling back to the default mix.
    pub fn from_config(config: &Config) -> CategoryMix {
        let ratio = |key: &str, default: f64| config.get_float(key).unwrap_or(default);

        CategoryMix {
            ap: ratio("ap_ratio", 0.25),
            tp: ratio("tp_ratio", 0.25),
            at: ratio("at_ratio", 0.25),
            iq: ratio("iq_ratio", 0.25),
        }
    }

    fn sum(&self) -> f64 {
        self.ap + self.tp + self.at + self.iq
    }

    /// Rescale the weights to sum to 1 if they deviate by more than 0.01.
    /// A deviation is a configuration slip, not an error; warn and continue.
    /// A non-positive sum cannot be rescaled and falls back to the uniform
    /// mix.
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if (sum - 1.0).abs() <= 0.01 {
            return;
        }

        if sum <= 0.0 {
            warn!("category ratios sum to {}, using uniform mix", sum);
            self.ap = 0.25;
            self.tp = 0.25;
            self.at = 0.25;
            self.iq = 0.25;
            return;
        }

        warn!("category ratios sum to {}, rescaling", sum);
        self.ap /= sum;
        self.tp /= sum;
        self.at /= sum;
        self.iq /= sum;
    }

    /// Category whose cumulative bucket contains `sample` in `[0, 1)`.
    pub fn pick(&self, sample: f64) -> Category {
        let mut bound = self.ap;
        if sample < bound {
            return Category::Ap;
        }
        bound += self.tp;
        if sample < bound {
            return Category::Tp;
        }
        bound += self.at;
        if sample < bound {
            return Category::At;
        }
        Category::Iq
    }
}

/// Run `total` mixed iterations against one connection.
pub fn run(
    catalog: &Catalog,
    total: u64,
    mix: &CategoryMix,
    conn: &mut dyn Connection,
    gen: &mut ParameterGenerator,
    rng: &mut StdRng,
    stats: &mut LocalStatistics,
) {
    for _ in 0..total {
        let sample: f64 = rng.gen();
        let category = mix.pick(sample);
        driver::run_iteration(catalog, category, conn, gen, rng, stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn normalize_test() {
        let mut mix = CategoryMix::new(0.4, 0.4, 0.4, 0.4);
        mix.normalize();

        assert!((mix.ap - 0.25).abs() < 1e-9);
        assert!((mix.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_within_tolerance_test() {
        let mut mix = CategoryMix::new(0.3, 0.3, 0.2, 0.195);
        let before = mix.clone();
        mix.normalize();

        // Sum within 0.01 of 1 is left alone.
        assert_eq!(mix, before);
    }

    #[test]
    fn normalize_zero_sum_test() {
        let mut mix = CategoryMix::new(0.0, 0.0, 0.0, 0.0);
        mix.normalize();

        assert_eq!(mix, CategoryMix::new(0.25, 0.25, 0.25, 0.25));
    }

    #[test]
    fn pick_boundaries_test() {
        let mix = CategoryMix::new(0.3, 0.3, 0.2, 0.2);

        assert_eq!(mix.pick(0.0), Category::Ap);
        assert_eq!(mix.pick(0.29), Category::Ap);
        assert_eq!(mix.pick(0.3), Category::Tp);
        assert_eq!(mix.pick(0.59), Category::Tp);
        assert_eq!(mix.pick(0.6), Category::At);
        assert_eq!(mix.pick(0.79), Category::At);
        assert_eq!(mix.pick(0.8), Category::Iq);
        assert_eq!(mix.pick(0.999), Category::Iq);
    }

    #[test]
    fn sampling_converges_test() {
        let mut mix = CategoryMix::new(1.0, 1.0, 1.0, 1.0);
        mix.normalize();

        let mut rng = StdRng::seed_from_u64(99);
        let mut counts = [0u32; 4];
        let n = 40_000;
        for _ in 0..n {
            let sample: f64 = rng.gen();
            match mix.pick(sample) {
                Category::Ap => counts[0] += 1,
                Category::Tp => counts[1] += 1,
                Category::At => counts[2] += 1,
                Category::Iq => counts[3] += 1,
            }
        }

        for &count in &counts {
            let share = count as f64 / n as f64;
            assert!((share - 0.25).abs() < 0.02, "share {}", share);
        }
    }
}
