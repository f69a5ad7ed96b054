//! Loosely typed input cells and the classifier every accumulator uses.
//!
//! Host engines hand rows over as numbers, text or nulls. Before a value can
//! take part in an aggregate it is classified:
//!
//! - numbers and numeric text that are not NaN are accepted (infinities too),
//! - NaN is rejected, except by the aggregates that look for it,
//! - non-numeric text and nulls are silently skipped.

use std::fmt;

/// One raw input cell as supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// SQL `NULL` or any value the host cannot express as number or text.
    Null,
    /// An integer or floating-point value.
    Number(f64),
    /// A text value; it is accepted when it parses as a float.
    Text(&'a str),
}

/// Outcome of classifying a [`Cell`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classified {
    /// A finite number.
    Finite(f64),
    /// Positive or negative infinity.
    Infinite(f64),
    /// Converts to a float, but the float is NaN.
    Nan,
    /// Text that does not parse as a number.
    Text,
    /// A null cell.
    Null,
}

impl Classified {
    /// The accepted numeric value, if any.
    pub fn numeric(self) -> Option<f64> {
        match self {
            Classified::Finite(v) | Classified::Infinite(v) => Some(v),
            _ => None,
        }
    }
}

impl<'a> Cell<'a> {
    /// Converts the cell to a float, keeping NaN and infinities.
    ///
    /// Returns `None` for nulls and for text that is not a number.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Number(v) => Some(*v),
            Cell::Text(text) => parse_float(text),
        }
    }

    /// Classifies the cell.
    pub fn classify(&self) -> Classified {
        match self {
            Cell::Null => Classified::Null,
            _ => match self.to_f64() {
                None => Classified::Text,
                Some(v) if v.is_nan() => Classified::Nan,
                Some(v) if v.is_infinite() => Classified::Infinite(v),
                Some(v) => Classified::Finite(v),
            },
        }
    }

    /// The value this cell contributes to a generic aggregate, or `None` when
    /// the cell must be skipped.
    pub fn numeric(&self) -> Option<f64> {
        self.classify().numeric()
    }

    /// The text payload, if the cell is text.
    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            Cell::Text(text) => Some(*text),
            _ => None,
        }
    }

    /// Checks if the cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(text) => write!(f, "'{text}'"),
        }
    }
}

impl From<f64> for Cell<'static> {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell<'static> {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl<'a> From<&'a str> for Cell<'a> {
    fn from(value: &'a str) -> Self {
        Cell::Text(value)
    }
}

impl<'a, T> From<Option<T>> for Cell<'a>
where
    T: Into<Cell<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

/// Parses text the way a lenient float conversion does: surrounding
/// whitespace is ignored and `nan`, `inf` and `infinity` are accepted in any
/// case with an optional sign.
pub fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    if body.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
        return Some(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    trimmed.parse::<f64>().ok()
}
