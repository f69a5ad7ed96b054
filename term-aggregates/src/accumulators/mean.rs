//! Mean family: arithmetic, absolute, geometric, weighted and power means.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::config::PowerMeanConfig;
use crate::error::{AggregateError, AggregateResult};
use crate::traits::{binary, impl_unparameterized, unary, Accumulator, Configure};
use crate::value::AggregateValue;

/// Running sum and count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanState {
    /// Sum of all accepted values.
    pub sum: f64,
    /// Count of accepted values.
    pub count: u64,
}

impl MeanState {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Calculates the mean value.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Arithmetic mean (`amean`).
#[derive(Debug, Clone, Default)]
pub struct Mean {
    state: MeanState,
}

impl Mean {
    pub fn state(&self) -> &MeanState {
        &self.state
    }
}

impl Accumulator for Mean {
    fn name(&self) -> &'static str {
        "amean"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.state.push(value);
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        self.state.mean().into()
    }

    fn count(&self) -> u64 {
        self.state.count
    }
}

/// Mean of absolute values (`abs_mean`).
#[derive(Debug, Clone, Default)]
pub struct AbsMean {
    state: MeanState,
}

impl Accumulator for AbsMean {
    fn name(&self) -> &'static str {
        "abs_mean"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.state.push(value.abs());
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        self.state.mean().into()
    }

    fn count(&self) -> u64 {
        self.state.count
    }
}

/// Terminal condition reached by a geometric mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometricMarker {
    /// A zero was seen; the result is `+inf`.
    Infinite,
    /// A negative value was seen; the result is undefined.
    Undefined,
}

/// Running sum of base-10 logarithms of the positive values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSumState {
    pub log_sum: f64,
    /// Positive values behind `log_sum`.
    pub log_count: u64,
    /// Every accepted value, zeros and negatives included.
    pub count: u64,
    pub marker: Option<GeometricMarker>,
}

impl LogSumState {
    /// Folds one accepted value.
    ///
    /// Undefined wins over infinite: once a negative value was seen no later
    /// zero can turn the result into `+inf`.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if value == 0.0 {
            if self.marker.is_none() {
                self.marker = Some(GeometricMarker::Infinite);
            }
        } else if value < 0.0 {
            self.marker = Some(GeometricMarker::Undefined);
        } else {
            self.log_sum += value.log10();
            self.log_count += 1;
        }
    }

    pub fn geometric_mean(&self) -> AggregateValue {
        match self.marker {
            Some(GeometricMarker::Undefined) => AggregateValue::NoData,
            Some(GeometricMarker::Infinite) => AggregateValue::Float(f64::INFINITY),
            None if self.log_count == 0 => AggregateValue::NoData,
            None => AggregateValue::from_float(10f64.powf(self.log_sum / self.log_count as f64)),
        }
    }
}

/// Geometric mean through a log-sum (`geometric_mean`).
#[derive(Debug, Clone, Default)]
pub struct GeometricMean {
    state: LogSumState,
}

impl GeometricMean {
    pub fn marker(&self) -> Option<GeometricMarker> {
        self.state.marker
    }
}

impl Accumulator for GeometricMean {
    fn name(&self) -> &'static str {
        "geometric_mean"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.state.push(value);
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        self.state.geometric_mean()
    }

    fn count(&self) -> u64 {
        self.state.count
    }
}

/// Weighted arithmetic mean over `(weight, value)` rows (`wamean`).
#[derive(Debug, Clone, Default)]
pub struct WeightedMean {
    weighted_sum: f64,
    total_weight: f64,
    count: u64,
}

impl Accumulator for WeightedMean {
    fn name(&self) -> &'static str {
        "wamean"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        let (weight, value) = binary(self.name(), args)?;
        if let (Some(weight), Some(value)) = (weight.numeric(), value.numeric()) {
            self.weighted_sum += weight * value;
            self.total_weight += weight;
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        if self.total_weight == 0.0 {
            AggregateValue::NoData
        } else {
            AggregateValue::from_float(self.weighted_sum / self.total_weight)
        }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// Generalized (power, Hölder) mean with exponent `p` (`gmean`).
///
/// `p = 2` is the quadratic mean, `p = 1` the arithmetic mean, `p = 0` the
/// geometric mean and `p = -1` the harmonic mean. Exponents below 1 only
/// admit positive values.
#[derive(Debug, Clone)]
pub struct PowerMean {
    config: PowerMeanConfig,
    sum: f64,
    logs: LogSumState,
    count: u64,
}

impl PowerMean {
    pub fn new(config: PowerMeanConfig) -> Self {
        Self {
            config,
            sum: 0.0,
            logs: LogSumState::default(),
            count: 0,
        }
    }

    pub fn exponent(&self) -> f64 {
        self.config.exponent
    }
}

impl Default for PowerMean {
    fn default() -> Self {
        Self::new(PowerMeanConfig::default())
    }
}

impl Configure for PowerMean {
    fn configure(params: &[Cell<'_>]) -> AggregateResult<Self> {
        PowerMeanConfig::from_params(params).map(Self::new)
    }
}

impl Accumulator for PowerMean {
    fn name(&self) -> &'static str {
        "gmean"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        let Some(value) = unary(self.name(), args)?.numeric() else {
            return Ok(());
        };

        let p = self.config.exponent;
        if p < 1.0 && value <= 0.0 {
            return Err(AggregateError::domain(
                self.name(),
                value,
                format!("p = {p} applies only to positive numbers"),
            ));
        }
        if value < 0.0 && p.fract() != 0.0 {
            return Err(AggregateError::domain(
                self.name(),
                value,
                format!("negative values require an integer exponent, p = {p}"),
            ));
        }

        if p == 0.0 {
            self.logs.push(value);
        } else {
            self.sum += value.powf(p);
        }
        self.count += 1;
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        if self.count == 0 {
            return AggregateValue::NoData;
        }
        let p = self.config.exponent;
        if p == 0.0 {
            self.logs.geometric_mean()
        } else {
            AggregateValue::from_float((self.sum / self.count as f64).powf(1.0 / p))
        }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl_unparameterized! {
    Mean => "amean",
    AbsMean => "abs_mean",
    GeometricMean => "geometric_mean",
    WeightedMean => "wamean",
}
