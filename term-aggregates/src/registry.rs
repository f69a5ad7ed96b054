//! Static table of the bundled aggregates.
//!
//! Hosts consult the registry once, at setup, to bind each entry under its
//! name for every argument count it accepts. Lookups are case-sensitive.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulators::*;
use crate::cell::Cell;
use crate::error::{AggregateError, AggregateResult};
use crate::traits::{Accumulator, Configure};
use crate::value::{AggregateValue, OutputKind};

/// Builds an accumulator from the static parameters of the first row.
pub type AccumulatorFactory = fn(&[Cell<'_>]) -> AggregateResult<Box<dyn Accumulator>>;

/// Grouping used for documentation and catalogue export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFamily {
    Mean,
    Dispersion,
    Shape,
    OrderStatistic,
    Utility,
}

/// One bundled aggregate.
#[derive(Clone, Copy)]
pub struct AggregateEntry {
    name: &'static str,
    arity: usize,
    parameters: usize,
    output: OutputKind,
    family: AggregateFamily,
    description: &'static str,
    deterministic: bool,
    factory: AccumulatorFactory,
}

impl AggregateEntry {
    /// Registry name, unique and case-sensitive.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of per-row data arguments.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of optional trailing static parameters.
    pub fn parameters(&self) -> usize {
        self.parameters
    }

    /// Largest argument count a host call may carry.
    pub fn max_arity(&self) -> usize {
        self.arity + self.parameters
    }

    pub fn accepts_arity(&self, n_args: usize) -> bool {
        (self.arity..=self.max_arity()).contains(&n_args)
    }

    /// Every argument count a host should register.
    pub fn arities(&self) -> impl Iterator<Item = usize> {
        self.arity..=self.max_arity()
    }

    pub fn output(&self) -> OutputKind {
        self.output
    }

    pub fn family(&self) -> AggregateFamily {
        self.family
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// False when the result may depend on something other than the rows,
    /// such as the current time.
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    const fn time_dependent(mut self) -> Self {
        self.deterministic = false;
        self
    }

    /// Creates a fresh accumulator.
    ///
    /// `params` are the trailing static arguments, at most
    /// [`parameters`](Self::parameters) of them.
    pub fn create(&self, params: &[Cell<'_>]) -> AggregateResult<Box<dyn Accumulator>> {
        if params.len() > self.parameters {
            return Err(AggregateError::invalid_config(
                self.name,
                format!(
                    "accepts at most {} parameter(s), got {}",
                    self.parameters,
                    params.len()
                ),
            ));
        }
        (self.factory)(params)
    }

    /// Splits one host row into data arguments and static parameters.
    pub fn split_args<'c, 'a>(
        &self,
        args: &'c [Cell<'a>],
    ) -> AggregateResult<(&'c [Cell<'a>], &'c [Cell<'a>])> {
        if !self.accepts_arity(args.len()) {
            return Err(AggregateError::arity(self.name, self.arity, args.len()));
        }
        Ok(args.split_at(self.arity))
    }

    pub fn info(&self) -> AggregateInfo {
        AggregateInfo {
            name: self.name.to_string(),
            arity: self.arity,
            parameters: self.parameters,
            output: self.output,
            family: self.family,
            description: self.description.to_string(),
            deterministic: self.deterministic,
        }
    }
}

impl fmt::Debug for AggregateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateEntry")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("parameters", &self.parameters)
            .field("output", &self.output)
            .field("family", &self.family)
            .field("deterministic", &self.deterministic)
            .finish_non_exhaustive()
    }
}

/// Serializable description of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateInfo {
    pub name: String,
    pub arity: usize,
    pub parameters: usize,
    pub output: OutputKind,
    pub family: AggregateFamily,
    pub description: String,
    pub deterministic: bool,
}

fn build<T: Configure>(params: &[Cell<'_>]) -> AggregateResult<Box<dyn Accumulator>> {
    Ok(Box::new(T::configure(params)?))
}

const fn entry(
    name: &'static str,
    arity: usize,
    parameters: usize,
    output: OutputKind,
    family: AggregateFamily,
    description: &'static str,
    factory: AccumulatorFactory,
) -> AggregateEntry {
    AggregateEntry {
        name,
        arity,
        parameters,
        output,
        family,
        description,
        deterministic: true,
        factory,
    }
}

use AggregateFamily::{Dispersion, Mean as MeanFamily, OrderStatistic, Shape, Utility};
use OutputKind::{Boolean, Float};

static AGGREGATES: &[AggregateEntry] = &[
    // Mean family
    entry("amean", 1, 0, Float, MeanFamily, "Arithmetic mean", build::<Mean>),
    entry("abs_mean", 1, 0, Float, MeanFamily, "Mean of absolute values", build::<AbsMean>),
    entry(
        "geometric_mean",
        1,
        0,
        Float,
        MeanFamily,
        "Geometric mean; +inf after a zero, NULL after a negative value",
        build::<GeometricMean>,
    ),
    entry(
        "wamean",
        2,
        0,
        Float,
        MeanFamily,
        "Weighted arithmetic mean of (weight, value)",
        build::<WeightedMean>,
    ),
    entry(
        "gmean",
        1,
        1,
        Float,
        MeanFamily,
        "Generalized power mean with exponent p in [-1, 2], default 0",
        build::<PowerMean>,
    ),
    // Dispersion family
    entry("var", 1, 0, Float, Dispersion, "Sample variance", build::<SampleVariance>),
    entry("varp", 1, 0, Float, Dispersion, "Population variance", build::<PopulationVariance>),
    entry("stdev", 1, 0, Float, Dispersion, "Sample standard deviation", build::<SampleStdDev>),
    entry(
        "stdevp",
        1,
        0,
        Float,
        Dispersion,
        "Population standard deviation",
        build::<PopulationStdDev>,
    ),
    entry("sem", 1, 0, Float, Dispersion, "Standard error of the mean", build::<StdError>),
    entry(
        "ci",
        1,
        0,
        Float,
        Dispersion,
        "Half-width of the 95% confidence interval of the mean",
        build::<ConfidenceInterval>,
    ),
    entry(
        "variance",
        1,
        1,
        Float,
        Dispersion,
        "Variance; 'sample'/'false' (default) or 'population'/'true'",
        build::<Variance>,
    ),
    entry(
        "sdev",
        1,
        1,
        Float,
        Dispersion,
        "Standard deviation; 'sample'/'false' (default) or 'population'/'true'",
        build::<StdDev>,
    ),
    entry("datarange", 1, 0, Float, Dispersion, "Maximum minus minimum", build::<DataRange>),
    entry("rms", 1, 0, Float, Dispersion, "Root mean square", build::<RootMeanSquare>),
    // Shape family
    entry("skew", 1, 0, Float, Shape, "Sample skewness", build::<SampleSkewness>),
    entry("skewp", 1, 0, Float, Shape, "Population skewness", build::<PopulationSkewness>),
    entry("kurt", 1, 0, Float, Shape, "Sample excess kurtosis", build::<SampleKurtosis>),
    entry(
        "kurtp",
        1,
        0,
        Float,
        Shape,
        "Population excess kurtosis",
        build::<PopulationKurtosis>,
    ),
    // Order statistics
    entry("median", 1, 0, Float, OrderStatistic, "Median", build::<Median>),
    entry(
        "mode",
        1,
        0,
        Float,
        OrderStatistic,
        "Most frequent value; ties go to the smallest",
        build::<Mode>,
    ),
    // Utility
    entry("arbitrary", 1, 0, Float, Utility, "First numeric value", build::<Arbitrary>),
    entry("hasnan", 1, 0, Boolean, Utility, "True if any value is NaN", build::<HasNan>),
    entry("hasinf", 1, 0, Boolean, Utility, "True if any value is infinite", build::<HasInf>),
    entry("prod", 1, 0, Float, Utility, "Product", build::<Product>),
    entry(
        "pearson",
        2,
        0,
        Float,
        Utility,
        "Pearson correlation coefficient of (x, y)",
        build::<Pearson>,
    ),
    entry(
        "frecency",
        1,
        2,
        Float,
        Utility,
        "Time-decayed score of action dates; optional points and 'now:<date>'",
        build::<Frecency>,
    )
    .time_dependent(),
];

static INDEX: Lazy<HashMap<&'static str, &'static AggregateEntry>> =
    Lazy::new(|| AGGREGATES.iter().map(|entry| (entry.name, entry)).collect());

/// Every bundled aggregate.
pub fn list_aggregates() -> &'static [AggregateEntry] {
    AGGREGATES
}

/// Finds an aggregate by its exact name.
pub fn lookup(name: &str) -> Option<&'static AggregateEntry> {
    INDEX.get(name).copied()
}

/// Creates an accumulator for the named aggregate.
pub fn create(name: &str, params: &[Cell<'_>]) -> AggregateResult<Box<dyn Accumulator>> {
    match lookup(name) {
        Some(entry) => entry.create(params),
        None => {
            debug!(aggregate = name, "Unknown aggregate requested");
            Err(AggregateError::UnknownAggregate(name.to_string()))
        }
    }
}

/// Describes every bundled aggregate.
pub fn catalogue() -> Vec<AggregateInfo> {
    AGGREGATES.iter().map(AggregateEntry::info).collect()
}

/// The catalogue as pretty-printed JSON.
pub fn catalogue_json() -> AggregateResult<String> {
    Ok(serde_json::to_string_pretty(&catalogue())?)
}

/// Seeds, folds every row and finalizes the named aggregate.
///
/// # Examples
///
/// ```rust
/// use term_aggregates::{registry, AggregateValue, Cell};
///
/// let rows = [[Cell::Number(1.0)], [Cell::Text("3")], [Cell::Null]];
/// let mean = registry::aggregate("amean", &[], rows).unwrap();
/// assert_eq!(mean, AggregateValue::Float(2.0));
/// ```
pub fn aggregate<'a, I, R>(
    name: &str,
    params: &[Cell<'_>],
    rows: I,
) -> AggregateResult<AggregateValue>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[Cell<'a>]>,
{
    let mut accumulator = create(name, params)?;
    for row in rows {
        accumulator.fold(row.as_ref())?;
    }
    Ok(accumulator.finalize())
}
