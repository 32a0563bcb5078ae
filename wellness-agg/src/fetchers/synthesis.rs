//! Value production for catalog-driven fetchers
//!
//! Contract: country x year x metric -> value. No upstream integration exists,
//! so the shipped sources synthesize values inside the metric's declared range.

use crate::types::{FetchError, MetricDefinition};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Produces the raw value for one (country, year, metric)
#[async_trait]
pub trait ValueSource: Send + Sync {
    /// Value for `metric` in `country` during `year`
    ///
    /// Callers clamp the result into the metric's range.
    async fn sample(
        &self,
        country: &str,
        year: i32,
        metric: &MetricDefinition,
    ) -> Result<f64, FetchError>;

    /// Whether values come from an upstream source rather than synthesis
    fn is_real_data(&self) -> bool {
        false
    }
}

/// Uniform draw from `[min, max]`
pub struct UniformSynthesis {
    seeded: Option<Mutex<StdRng>>,
}

impl UniformSynthesis {
    /// Draw from the thread-local generator
    pub fn new() -> Self {
        Self { seeded: None }
    }

    /// Draw from a generator seeded with `seed`
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }

    fn draw(&self, metric: &MetricDefinition) -> f64 {
        match &self.seeded {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                rng.gen_range(metric.min..=metric.max)
            }
            None => rand::thread_rng().gen_range(metric.min..=metric.max),
        }
    }
}

impl Default for UniformSynthesis {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ValueSource for UniformSynthesis {
    async fn sample(
        &self,
        _country: &str,
        _year: i32,
        metric: &MetricDefinition,
    ) -> Result<f64, FetchError> {
        Ok(self.draw(metric))
    }
}

/// Deterministic synthesis: the midpoint of the declared range
#[derive(Debug, Default, Clone, Copy)]
pub struct MidpointSynthesis;

#[async_trait]
impl ValueSource for MidpointSynthesis {
    async fn sample(
        &self,
        _country: &str,
        _year: i32,
        metric: &MetricDefinition,
    ) -> Result<f64, FetchError> {
        Ok(metric.min + (metric.max - metric.min) / 2.0)
    }
}
