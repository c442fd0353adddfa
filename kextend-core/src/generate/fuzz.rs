//! Seeded random instance generation.
//!
//! Every case is a pure function of its seed and the [`FuzzConfig`]: the
//! generator owns a fresh [`SmallRng`] per case and threads it explicitly,
//! so parallel workers never share random state.

use std::ops::RangeInclusive;

use rand::{
    Rng, SeedableRng,
    distributions::Standard,
    rngs::SmallRng,
    seq::index::sample,
};
use tracing::debug;

use crate::{
    case::binomial,
    generate::{GenerateError, GeneratedCase, plant},
    graph::Graph,
};

/// Golden-ratio increment used to spread iteration seeds.
const SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

/// Derives the seed of fuzz iteration `iteration` from a campaign seed.
#[must_use]
pub fn iteration_seed(base_seed: u64, iteration: u64) -> u64 {
    splitmix64(base_seed ^ iteration.wrapping_add(1).wrapping_mul(SEED_SPACING))
}

/// Parameters of the random instance distribution.
///
/// Defaults: `n1` in `3..=8`, `n2` in `n1..=15`, at most five copies,
/// entries up to 10 with a one-in-five chance of allowing up to 100.
#[derive(Clone, Debug, PartialEq)]
pub struct FuzzConfig {
    pattern_order: RangeInclusive<usize>,
    max_target_order: usize,
    max_copies: usize,
    light_max_weight: u32,
    heavy_max_weight: u32,
    heavy_probability: f64,
    impossible_probability: f64,
    planted_probability: f64,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            pattern_order: 3..=8,
            max_target_order: 15,
            max_copies: 5,
            light_max_weight: 10,
            heavy_max_weight: 100,
            heavy_probability: 0.2,
            impossible_probability: 0.0,
            planted_probability: 0.0,
        }
    }
}

impl FuzzConfig {
    /// Range the pattern order is drawn from.
    #[must_use]
    pub fn with_pattern_order(mut self, range: RangeInclusive<usize>) -> Self {
        self.pattern_order = range;
        self
    }

    /// Largest target order. The target is never smaller than the pattern.
    #[must_use]
    pub fn with_max_target_order(mut self, order: usize) -> Self {
        self.max_target_order = order;
        self
    }

    /// Upper bound on the requested copy count for satisfiable draws.
    #[must_use]
    pub fn with_max_copies(mut self, copies: usize) -> Self {
        self.max_copies = copies;
        self
    }

    /// Probability of forcing `k = C(n2, n1) + 1`, an instance with no
    /// answer.
    #[must_use]
    pub fn with_impossible_probability(mut self, probability: f64) -> Self {
        self.impossible_probability = probability;
        self
    }

    /// Probability of planting the pattern into the target, so a zero-cost
    /// single copy exists.
    #[must_use]
    pub fn with_planted_probability(mut self, probability: f64) -> Self {
        self.planted_probability = probability;
        self
    }

    /// Checks that every range and probability is usable.
    ///
    /// # Errors
    /// Returns [`GenerateError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<(), GenerateError> {
        let invalid = |reason: String| Err(GenerateError::InvalidConfig { reason });
        if *self.pattern_order.start() == 0 || self.pattern_order.is_empty() {
            return invalid(format!(
                "pattern order range {:?} must be non-empty and start at 1 or more",
                self.pattern_order
            ));
        }
        if self.max_copies == 0 {
            return invalid("max copies must be at least 1".into());
        }
        if self.light_max_weight == 0 || self.heavy_max_weight == 0 {
            return invalid("maximum weights must be at least 1".into());
        }
        for (name, p) in [
            ("heavy", self.heavy_probability),
            ("impossible", self.impossible_probability),
            ("planted", self.planted_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} probability {p} is outside [0, 1]"));
            }
        }
        Ok(())
    }
}

/// Draws random test cases from seeds.
#[derive(Clone, Debug)]
pub struct Fuzzer {
    config: FuzzConfig,
}

impl Fuzzer {
    /// Creates a fuzzer after validating `config`.
    ///
    /// # Errors
    /// Returns [`GenerateError::InvalidConfig`] for an unusable configuration.
    pub fn new(config: FuzzConfig) -> Result<Self, GenerateError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    /// Generates the case for `seed`. Identical seeds yield identical cases.
    ///
    /// # Errors
    /// Returns [`GenerateError`] if the drawn instance fails validation.
    ///
    /// # Examples
    /// ```
    /// use kextend_core::{FuzzConfig, Fuzzer};
    ///
    /// let fuzzer = Fuzzer::new(FuzzConfig::default())?;
    /// let a = fuzzer.generate(42)?;
    /// let b = fuzzer.generate(42)?;
    /// assert_eq!(a.case.to_input_string(), b.case.to_input_string());
    /// assert_eq!(a.name, "fuzz_42");
    /// # Ok::<(), kextend_core::GenerateError>(())
    /// ```
    pub fn generate(&self, seed: u64) -> Result<GeneratedCase, GenerateError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let case = self.generate_with(&mut rng, format!("fuzz_{seed}"))?;
        Ok(case.with_seed(seed))
    }

    /// Generates a case from a caller-owned RNG.
    ///
    /// # Errors
    /// Returns [`GenerateError`] if the drawn instance fails validation.
    pub fn generate_with(
        &self,
        rng: &mut SmallRng,
        name: String,
    ) -> Result<GeneratedCase, GenerateError> {
        let config = &self.config;
        let n1 = rng.gen_range(config.pattern_order.clone());
        let n2 = rng.gen_range(n1..=config.max_target_order.max(n1));
        let images = binomial(n2, n1);

        let copies = if rng.gen_bool(config.impossible_probability) {
            usize::try_from(images.saturating_add(1)).unwrap_or(usize::MAX)
        } else {
            let limit = images
                .saturating_add(2)
                .min(config.max_copies as u128);
            rng.gen_range(1..=usize::try_from(limit).unwrap_or(config.max_copies))
        };

        let pattern = random_graph(rng, n1, config);
        let mut target = random_graph(rng, n2, config);
        let planted = rng.gen_bool(config.planted_probability);
        if planted {
            let mut positions = sample(rng, n2, n1).into_vec();
            positions.sort_unstable();
            target = plant(&pattern, &target, &positions);
        }

        debug!(%name, n1, n2, copies, planted, "generated fuzz case");
        GeneratedCase::new(name, "fuzz", pattern, target, copies)
    }

    /// Generates `count` cases whose seeds derive from `base_seed`.
    pub fn campaign(
        &self,
        base_seed: u64,
        count: u64,
    ) -> impl Iterator<Item = Result<GeneratedCase, GenerateError>> + '_ {
        (0..count).map(move |iteration| self.generate(iteration_seed(base_seed, iteration)))
    }
}

fn random_graph(rng: &mut SmallRng, order: usize, config: &FuzzConfig) -> Graph {
    let density: f64 = rng.sample(Standard);
    let max_weight = if rng.gen_bool(config.heavy_probability) {
        config.heavy_max_weight
    } else {
        config.light_max_weight
    };
    Graph::from_fn(order, |_, _| {
        if rng.gen_bool(density) {
            rng.gen_range(1..=max_weight)
        } else {
            0
        }
    })
}
