//! Shape family: skewness and excess kurtosis from cumulants.
//!
//! The first four power sums are accumulated in one pass and turned into raw
//! moments and cumulants at finalize. Fourth powers lose precision quickly for
//! large-magnitude inputs; results for such columns are approximate.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::AggregateResult;
use crate::traits::{impl_unparameterized, unary, Accumulator};
use crate::value::AggregateValue;

/// Minimum number of values for any shape statistic.
pub const MIN_SHAPE_COUNT: u64 = 3;

/// Power sums `Σx`, `Σx²`, `Σx³`, `Σx⁴` and the count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerSums {
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub s4: f64,
    pub count: u64,
}

/// Second, third and fourth cumulants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cumulants {
    pub n: f64,
    pub k2: f64,
    pub k3: f64,
    pub k4: f64,
}

impl PowerSums {
    pub fn push(&mut self, value: f64) {
        let mut power = value;
        self.s1 += power;
        power *= value;
        self.s2 += power;
        power *= value;
        self.s3 += power;
        power *= value;
        self.s4 += power;
        self.count += 1;
    }

    /// Cumulants from the raw moments, `None` below three values.
    pub fn cumulants(&self) -> Option<Cumulants> {
        if self.count < MIN_SHAPE_COUNT {
            return None;
        }

        let n = self.count as f64;
        let m1 = self.s1 / n;
        let m2 = self.s2 / n;
        let m3 = self.s3 / n;
        let m4 = self.s4 / n;

        Some(Cumulants {
            n,
            k2: m2 - m1.powf(2.0),
            k3: 2.0 * m1.powf(3.0) - 3.0 * m1 * m2 + m3,
            k4: -6.0 * m1.powf(4.0) + 12.0 * m1.powf(2.0) * m2 - 3.0 * m2.powf(2.0)
                - 4.0 * m1 * m3
                + m4,
        })
    }
}

impl Cumulants {
    pub fn population_skewness(&self) -> f64 {
        self.k3 / self.k2.powf(1.5)
    }

    /// Bias-adjusted skewness.
    pub fn sample_skewness(&self) -> f64 {
        let n = self.n;
        (n * (n - 1.0)).sqrt() / (n - 2.0) * self.k3 / self.k2.powf(1.5)
    }

    pub fn population_kurtosis(&self) -> f64 {
        self.k4 / self.k2.powf(2.0)
    }

    /// Bias-adjusted excess kurtosis; undefined for exactly three values.
    pub fn sample_kurtosis(&self) -> Option<f64> {
        let n = self.n;
        if n <= 3.0 {
            return None;
        }
        let g2 = self.population_kurtosis();
        Some((n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0))
    }
}

macro_rules! shape_accumulator {
    ($(#[$doc:meta])* $ty:ident, $name:literal, |$c:ident| $statistic:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default)]
        pub struct $ty {
            sums: PowerSums,
        }

        impl Accumulator for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
                if let Some(value) = unary(self.name(), args)?.numeric() {
                    self.sums.push(value);
                }
                Ok(())
            }

            fn finalize(&mut self) -> AggregateValue {
                self.sums
                    .cumulants()
                    .and_then(|$c| $statistic)
                    .into()
            }

            fn count(&self) -> u64 {
                self.sums.count
            }
        }
    };
}

shape_accumulator!(
    /// Sample skewness (`skew`).
    SampleSkewness,
    "skew",
    |c| Some(c.sample_skewness())
);
shape_accumulator!(
    /// Population skewness (`skewp`).
    PopulationSkewness,
    "skewp",
    |c| Some(c.population_skewness())
);
shape_accumulator!(
    /// Sample excess kurtosis (`kurt`).
    SampleKurtosis,
    "kurt",
    |c| c.sample_kurtosis()
);
shape_accumulator!(
    /// Population excess kurtosis (`kurtp`).
    PopulationKurtosis,
    "kurtp",
    |c| Some(c.population_kurtosis())
);

impl_unparameterized! {
    SampleSkewness => "skew",
    PopulationSkewness => "skewp",
    SampleKurtosis => "kurt",
    PopulationKurtosis => "kurtp",
}
