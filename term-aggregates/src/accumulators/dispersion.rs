//! Dispersion family: variances, standard deviations, standard error,
//! confidence half-width, range and root-mean-square.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::config::VarianceConfig;
use crate::error::AggregateResult;
use crate::traits::{impl_unparameterized, unary, Accumulator, Configure};
use crate::value::AggregateValue;

/// z-score of a two-sided 95% normal interval.
pub const Z_95: f64 = 1.96;

/// Welford running moments: count, mean and sum of squared deviations.
///
/// Avoids the cancellation error of the naive `Σx² - (Σx)²/n` formula.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningMoments {
    pub count: u64,
    pub mean: f64,
    /// Sum of squared deviations from the running mean.
    pub m2: f64,
}

impl RunningMoments {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.mean = value;
            self.m2 = 0.0;
        } else {
            let old_mean = self.mean;
            self.mean = old_mean + (value - old_mean) / self.count as f64;
            self.m2 += (value - old_mean) * (value - self.mean);
        }
    }

    /// `S / (n - 1)`, undefined below two observations.
    pub fn sample_variance(&self) -> Option<f64> {
        if self.count < 2 {
            None
        } else {
            Some(self.m2 / (self.count - 1) as f64)
        }
    }

    /// `S / n`; zero for one observation.
    pub fn population_variance(&self) -> Option<f64> {
        match self.count {
            0 => None,
            1 => Some(0.0),
            n => Some(self.m2 / n as f64),
        }
    }

    pub fn sample_stdev(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }

    pub fn population_stdev(&self) -> Option<f64> {
        self.population_variance().map(f64::sqrt)
    }

    /// Standard error of the mean.
    pub fn std_error(&self) -> Option<f64> {
        self.sample_stdev()
            .map(|stdev| stdev / (self.count as f64).sqrt())
    }

    /// Half-width of the 95% confidence interval of the mean.
    pub fn confidence_half_width(&self) -> Option<f64> {
        self.std_error().map(|sem| Z_95 * sem)
    }
}

macro_rules! moment_accumulator {
    ($(#[$doc:meta])* $ty:ident, $name:literal, $statistic:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $ty {
            moments: RunningMoments,
        }

        impl $ty {
            pub fn moments(&self) -> &RunningMoments {
                &self.moments
            }
        }

        impl Accumulator for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
                if let Some(value) = unary(self.name(), args)?.numeric() {
                    self.moments.push(value);
                }
                Ok(())
            }

            fn finalize(&mut self) -> AggregateValue {
                self.moments.$statistic().into()
            }

            fn count(&self) -> u64 {
                self.moments.count
            }
        }
    };
}

moment_accumulator!(
    /// Sample variance (`var`).
    SampleVariance,
    "var",
    sample_variance
);
moment_accumulator!(
    /// Population variance (`varp`).
    PopulationVariance,
    "varp",
    population_variance
);
moment_accumulator!(
    /// Sample standard deviation (`stdev`).
    SampleStdDev,
    "stdev",
    sample_stdev
);
moment_accumulator!(
    /// Population standard deviation (`stdevp`).
    PopulationStdDev,
    "stdevp",
    population_stdev
);
moment_accumulator!(
    /// Standard error of the mean (`sem`).
    StdError,
    "sem",
    std_error
);
moment_accumulator!(
    /// 95% confidence half-width of the mean, `1.96 · sem` (`ci`).
    ConfidenceInterval,
    "ci",
    confidence_half_width
);

/// Variance with a sample/population modifier (`variance`).
#[derive(Debug, Clone, Default)]
pub struct Variance {
    config: VarianceConfig,
    moments: RunningMoments,
}

impl Variance {
    pub fn new(config: VarianceConfig) -> Self {
        Self {
            config,
            moments: RunningMoments::default(),
        }
    }
}

impl Configure for Variance {
    fn configure(params: &[Cell<'_>]) -> AggregateResult<Self> {
        VarianceConfig::from_params("variance", params).map(Self::new)
    }
}

impl Accumulator for Variance {
    fn name(&self) -> &'static str {
        "variance"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.moments.push(value);
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        if self.config.population {
            self.moments.population_variance().into()
        } else {
            self.moments.sample_variance().into()
        }
    }

    fn count(&self) -> u64 {
        self.moments.count
    }
}

/// Standard deviation with a sample/population modifier (`sdev`).
#[derive(Debug, Clone, Default)]
pub struct StdDev {
    config: VarianceConfig,
    moments: RunningMoments,
}

impl StdDev {
    pub fn new(config: VarianceConfig) -> Self {
        Self {
            config,
            moments: RunningMoments::default(),
        }
    }
}

impl Configure for StdDev {
    fn configure(params: &[Cell<'_>]) -> AggregateResult<Self> {
        VarianceConfig::from_params("sdev", params).map(Self::new)
    }
}

impl Accumulator for StdDev {
    fn name(&self) -> &'static str {
        "sdev"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.moments.push(value);
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        if self.config.population {
            self.moments.population_stdev().into()
        } else {
            self.moments.sample_stdev().into()
        }
    }

    fn count(&self) -> u64 {
        self.moments.count
    }
}

/// Tracked extremes of the accepted values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMaxState {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: u64,
}

impl MinMaxState {
    pub fn push(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |min| min.min(value)));
        self.max = Some(self.max.map_or(value, |max| max.max(value)));
        self.count += 1;
    }

    pub fn range(&self) -> Option<f64> {
        Some(self.max? - self.min?)
    }
}

/// `max - min` over the accepted values (`datarange`).
#[derive(Debug, Clone, Default)]
pub struct DataRange {
    state: MinMaxState,
}

impl Accumulator for DataRange {
    fn name(&self) -> &'static str {
        "datarange"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.state.push(value);
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        self.state.range().into()
    }

    fn count(&self) -> u64 {
        self.state.count
    }
}

/// Root mean square, `sqrt(Σx² / n)` (`rms`).
#[derive(Debug, Clone, Default)]
pub struct RootMeanSquare {
    sum_squares: f64,
    count: u64,
}

impl Accumulator for RootMeanSquare {
    fn name(&self) -> &'static str {
        "rms"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.sum_squares += value * value;
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        if self.count == 0 {
            AggregateValue::NoData
        } else {
            AggregateValue::from_float((self.sum_squares / self.count as f64).sqrt())
        }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl_unparameterized! {
    SampleVariance => "var",
    PopulationVariance => "varp",
    SampleStdDev => "stdev",
    PopulationStdDev => "stdevp",
    StdError => "sem",
    ConfidenceInterval => "ci",
    DataRange => "datarange",
    RootMeanSquare => "rms",
}
