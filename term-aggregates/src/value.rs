//! Result values produced by finalizing an accumulator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of finalizing an aggregate.
///
/// `NoData` is reported when no qualifying value was seen or when there were
/// too few values for the statistic. It is distinct from any valid result and
/// is never conflated with `0.0` or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AggregateValue {
    /// A floating-point result (mean, variance, product, ...).
    Float(f64),

    /// A boolean result (presence flags).
    Boolean(bool),

    /// No data to aggregate.
    NoData,
}

impl AggregateValue {
    /// Wraps a float result. NaN cannot be handed to a host engine and is
    /// reported as `NoData`.
    pub fn from_float(value: f64) -> Self {
        if value.is_nan() {
            AggregateValue::NoData
        } else {
            AggregateValue::Float(value)
        }
    }

    /// Wraps an optional float result, see [`AggregateValue::from_float`].
    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(AggregateValue::NoData, Self::from_float)
    }

    /// Attempts to get the value as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AggregateValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to get the value as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AggregateValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Checks if this is the no-data sentinel.
    pub fn is_no_data(&self) -> bool {
        matches!(self, AggregateValue::NoData)
    }

    /// Returns a human-readable string representation of the value.
    pub fn to_string_pretty(&self) -> String {
        match self {
            AggregateValue::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 {
                    format!("{v:.0}")
                } else if v.is_finite() {
                    format!("{v:.4}")
                } else {
                    v.to_string()
                }
            }
            AggregateValue::Boolean(b) => b.to_string(),
            AggregateValue::NoData => "NULL".to_string(),
        }
    }
}

impl fmt::Display for AggregateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_pretty())
    }
}

impl From<f64> for AggregateValue {
    fn from(value: f64) -> Self {
        AggregateValue::from_float(value)
    }
}

impl From<bool> for AggregateValue {
    fn from(value: bool) -> Self {
        AggregateValue::Boolean(value)
    }
}

impl From<Option<f64>> for AggregateValue {
    fn from(value: Option<f64>) -> Self {
        AggregateValue::from_option(value)
    }
}

/// The SQL type an aggregate returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// 64-bit float, `NULL` when there is no data.
    Float,
    /// Boolean flag.
    Boolean,
}
