//! Configuration resolved once per accumulator or per registration.
//!
//! Static parameters arrive as trailing cells of the first row. Each
//! parameterized aggregate turns them into one of the structs below before it
//! folds anything, so a malformed parameter fails the group up front.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accumulators::frecency::parse_date;
use crate::cell::Cell;
use crate::error::{AggregateError, AggregateResult};
use crate::logging::LogConfig;

/// Selects the sample or population flavour of `variance` and `sdev`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceConfig {
    /// Divide by `n` instead of `n - 1`.
    pub population: bool,
}

impl VarianceConfig {
    pub fn sample() -> Self {
        Self { population: false }
    }

    pub fn population() -> Self {
        Self { population: true }
    }

    /// Resolves the optional modifier parameter.
    ///
    /// Accepts `false`/`sample` and `true`/`population` in any case.
    pub fn from_params(aggregate: &str, params: &[Cell<'_>]) -> AggregateResult<Self> {
        let modifier = match params {
            [] => return Ok(Self::sample()),
            [modifier] => modifier,
            _ => {
                return Err(AggregateError::invalid_config(
                    aggregate,
                    format!("expected at most 1 parameter, got {}", params.len()),
                ))
            }
        };

        let config = match modifier.as_text().map(str::to_ascii_lowercase).as_deref() {
            Some("false") | Some("sample") => Self::sample(),
            Some("true") | Some("population") => Self::population(),
            _ => {
                return Err(AggregateError::invalid_config(
                    aggregate,
                    format!(
                        "wrong value {modifier} for the second argument, accepted values: \
                         'false' or 'sample', 'true' or 'population'"
                    ),
                ))
            }
        };

        debug!(aggregate, population = config.population, "Resolved variance modifier");
        Ok(config)
    }
}

/// Exponent of the generalized mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerMeanConfig {
    pub exponent: f64,
}

impl PowerMeanConfig {
    /// Smallest accepted exponent (harmonic mean).
    pub const MIN_EXPONENT: f64 = -1.0;
    /// Largest accepted exponent (quadratic mean).
    pub const MAX_EXPONENT: f64 = 2.0;

    pub fn new(exponent: f64) -> Self {
        Self { exponent }
    }

    /// Resolves the optional exponent parameter; defaults to the geometric
    /// mean (`p = 0`).
    pub fn from_params(params: &[Cell<'_>]) -> AggregateResult<Self> {
        let exponent = match params {
            [] => return Ok(Self::default()),
            [p] => p.to_f64(),
            _ => {
                return Err(AggregateError::invalid_config(
                    "gmean",
                    format!("expected at most 1 parameter, got {}", params.len()),
                ))
            }
        };

        match exponent {
            Some(p) if (Self::MIN_EXPONENT..=Self::MAX_EXPONENT).contains(&p) => {
                debug!(exponent = p, "Resolved power mean exponent");
                Ok(Self::new(p))
            }
            _ => Err(AggregateError::invalid_config(
                "gmean",
                format!(
                    "second argument takes values from {} to {}, got {}",
                    Self::MIN_EXPONENT,
                    Self::MAX_EXPONENT,
                    params[0]
                ),
            )),
        }
    }
}

impl Default for PowerMeanConfig {
    fn default() -> Self {
        Self { exponent: 0.0 }
    }
}

/// Matches the `now:<date>` parameter of `frecency`.
#[allow(clippy::expect_used)]
static NOW_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^now:(?P<now>.*)$").expect("Invalid now parameter regex"));

/// Points and reference instant of `frecency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrecencyConfig {
    /// Score of an action inside the most recent decay step.
    pub points: f64,
    /// Instant against which action dates are aged.
    pub now: DateTime<Utc>,
}

impl FrecencyConfig {
    pub const DEFAULT_POINTS: f64 = 100.0;

    pub fn new(points: f64, now: DateTime<Utc>) -> Self {
        Self { points, now }
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.points = points;
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Resolves up to two parameters, in any order: a number of points and a
    /// `now:<date>` reference instant.
    pub fn from_params(params: &[Cell<'_>]) -> AggregateResult<Self> {
        if params.len() > 2 {
            return Err(AggregateError::invalid_config(
                "frecency",
                format!("expected at most 2 parameters, got {}", params.len()),
            ));
        }

        let mut config = Self::default();
        for param in params {
            if let Some(captures) = param.as_text().and_then(|text| NOW_PARAM.captures(text)) {
                let raw = captures.name("now").map_or("", |m| m.as_str());
                config.now = parse_date(raw).ok_or_else(|| {
                    AggregateError::invalid_config(
                        "frecency",
                        format!("cannot parse reference date '{raw}'"),
                    )
                })?;
            } else {
                config.points = param.numeric().ok_or_else(|| {
                    AggregateError::invalid_config(
                        "frecency",
                        format!("expected a number of points or 'now:<date>', got {param}"),
                    )
                })?;
            }
        }

        debug!(points = config.points, now = %config.now, "Resolved frecency parameters");
        Ok(config)
    }
}

impl Default for FrecencyConfig {
    fn default() -> Self {
        Self {
            points: Self::DEFAULT_POINTS,
            now: Utc::now(),
        }
    }
}

/// Controls which aggregates a host adapter registers and how.
///
/// # Examples
///
/// ```rust
/// use term_aggregates::config::RegistrationConfig;
///
/// let config = RegistrationConfig::default()
///     .with_include(["median", "mode"])
///     .with_deterministic(false);
/// assert!(config.selects("median"));
/// assert!(!config.selects("var"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Only these names are registered when set.
    pub include: Option<Vec<String>>,
    /// Names that are never registered.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Declare the functions deterministic to the engine.
    #[serde(default = "default_deterministic")]
    pub deterministic: bool,
    #[serde(skip)]
    pub log: LogConfig,
}

fn default_deterministic() -> bool {
    true
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            include: None,
            exclude: Vec::new(),
            deterministic: default_deterministic(),
            log: LogConfig::default(),
        }
    }
}

impl RegistrationConfig {
    /// Restricts registration to the given names.
    pub fn with_include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Skips the given names.
    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Checks if an aggregate with this name should be registered.
    pub fn selects(&self, name: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| n == name));
        included && !self.exclude.iter().any(|n| n == name)
    }

    /// Fails on include or exclude names that the registry does not know.
    pub fn validate(&self) -> AggregateResult<()> {
        let named = self.include.iter().flatten().chain(self.exclude.iter());
        for name in named {
            if crate::registry::lookup(name).is_none() {
                return Err(AggregateError::UnknownAggregate(name.clone()));
            }
        }
        Ok(())
    }
}
