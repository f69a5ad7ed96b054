//! Utility aggregates: arbitrary value, NaN/infinity flags, product and
//! Pearson correlation.

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, Classified};
use crate::error::AggregateResult;
use crate::traits::{binary, impl_unparameterized, unary, Accumulator};
use crate::value::AggregateValue;

/// First accepted value (`arbitrary`).
#[derive(Debug, Clone, Default)]
pub struct Arbitrary {
    value: Option<f64>,
    count: u64,
}

impl Accumulator for Arbitrary {
    fn name(&self) -> &'static str {
        "arbitrary"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.value.get_or_insert(value);
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        self.value.into()
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// Latches to true on the first NaN cell (`hasnan`).
#[derive(Debug, Clone, Default)]
pub struct HasNan {
    seen: bool,
    count: u64,
}

impl Accumulator for HasNan {
    fn name(&self) -> &'static str {
        "hasnan"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        match unary(self.name(), args)?.classify() {
            Classified::Nan => {
                self.seen = true;
                self.count += 1;
            }
            Classified::Finite(_) | Classified::Infinite(_) => self.count += 1,
            Classified::Text | Classified::Null => {}
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        AggregateValue::Boolean(self.seen)
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// Latches to true on the first infinite cell (`hasinf`).
#[derive(Debug, Clone, Default)]
pub struct HasInf {
    seen: bool,
    count: u64,
}

impl Accumulator for HasInf {
    fn name(&self) -> &'static str {
        "hasinf"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        match unary(self.name(), args)?.classify() {
            Classified::Infinite(_) => {
                self.seen = true;
                self.count += 1;
            }
            Classified::Finite(_) | Classified::Nan => self.count += 1,
            Classified::Text | Classified::Null => {}
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        AggregateValue::Boolean(self.seen)
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// Product of the accepted values (`prod`).
#[derive(Debug, Clone)]
pub struct Product {
    product: f64,
    count: u64,
}

impl Default for Product {
    fn default() -> Self {
        Self {
            product: 1.0,
            count: 0,
        }
    }
}

impl Accumulator for Product {
    fn name(&self) -> &'static str {
        "prod"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.product *= value;
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        if self.count == 0 {
            AggregateValue::NoData
        } else {
            AggregateValue::from_float(self.product)
        }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// Running co-moments of paired values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoMoments {
    pub count: u64,
    pub mean_x: f64,
    pub mean_y: f64,
    /// Σ(x - x̄)²
    pub m2_x: f64,
    /// Σ(y - ȳ)²
    pub m2_y: f64,
    /// Σ(x - x̄)(y - ȳ)
    pub c_xy: f64,
}

impl CoMoments {
    pub fn push(&mut self, x: f64, y: f64) {
        self.count += 1;
        let n = self.count as f64;
        let dx = x - self.mean_x;
        let dy = y - self.mean_y;
        self.mean_x += dx / n;
        self.mean_y += dy / n;
        self.m2_x += dx * (x - self.mean_x);
        self.m2_y += dy * (y - self.mean_y);
        self.c_xy += dx * (y - self.mean_y);
    }

    /// Pearson's r, `None` with fewer than two pairs or a constant variable.
    pub fn correlation(&self) -> Option<f64> {
        if self.count < 2 || self.m2_x == 0.0 || self.m2_y == 0.0 {
            return None;
        }
        Some(self.c_xy / (self.m2_x * self.m2_y).sqrt())
    }
}

/// Pearson correlation coefficient over `(x, y)` rows (`pearson`).
#[derive(Debug, Clone, Default)]
pub struct Pearson {
    moments: CoMoments,
}

impl Pearson {
    pub fn moments(&self) -> &CoMoments {
        &self.moments
    }
}

impl Accumulator for Pearson {
    fn name(&self) -> &'static str {
        "pearson"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        let (x, y) = binary(self.name(), args)?;
        if let (Some(x), Some(y)) = (x.numeric(), y.numeric()) {
            self.moments.push(x, y);
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        self.moments.correlation().into()
    }

    fn count(&self) -> u64 {
        self.moments.count
    }
}

impl_unparameterized! {
    Arbitrary => "arbitrary",
    HasNan => "hasnan",
    HasInf => "hasinf",
    Product => "prod",
    Pearson => "pearson",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arbitrary_keeps_first_accepted() {
        let mut acc = Arbitrary::default();
        for cell in [Cell::Null, Cell::Text("a"), Cell::Text("2.5"), Cell::Number(7.0)] {
            acc.fold(&[cell]).unwrap();
        }
        assert_eq!(acc.count(), 2);
        assert_eq!(acc.finalize(), AggregateValue::Float(2.5));
    }

    #[test]
    fn test_flags() {
        let mut nan = HasNan::default();
        let mut inf = HasInf::default();
        assert_eq!(nan.finalize(), AggregateValue::Boolean(false));

        for cell in [Cell::Number(1.0), Cell::Text("nan"), Cell::Text("-Inf")] {
            nan.fold(&[cell]).unwrap();
            inf.fold(&[cell]).unwrap();
        }
        assert_eq!(nan.finalize(), AggregateValue::Boolean(true));
        assert_eq!(inf.finalize(), AggregateValue::Boolean(true));
        assert_eq!(nan.count(), 3);

        let mut inf = HasInf::default();
        inf.fold(&[Cell::Text("NaN")]).unwrap();
        assert_eq!(inf.finalize(), AggregateValue::Boolean(false));
    }

    #[test]
    fn test_product() {
        let mut acc = Product::default();
        assert_eq!(acc.finalize(), AggregateValue::NoData);
        for value in [2.0, -3.0, 0.5] {
            acc.fold(&[Cell::Number(value)]).unwrap();
        }
        assert_eq!(acc.finalize(), AggregateValue::Float(-3.0));
    }

    #[test]
    fn test_pearson_linear() {
        let mut moments = CoMoments::default();
        for x in 1..=90 {
            let x = x as f64;
            moments.push(x, 17.0 * x + 5.0);
        }
        assert!((moments.correlation().unwrap() - 1.0).abs() < 1e-12);

        let mut moments = CoMoments::default();
        for x in 1..=10 {
            let x = x as f64;
            moments.push(x, -2.0 * x);
        }
        assert!((moments.correlation().unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        let mut pearson = Pearson::default();
        pearson.fold(&[Cell::Number(1.0), Cell::Number(2.0)]).unwrap();
        assert_eq!(pearson.finalize(), AggregateValue::NoData);

        let mut pearson = Pearson::default();
        for x in [1.0, 2.0, 3.0] {
            pearson.fold(&[Cell::Number(x), Cell::Number(4.0)]).unwrap();
        }
        assert_eq!(pearson.finalize(), AggregateValue::NoData);

        let mut pearson = Pearson::default();
        pearson.fold(&[Cell::Number(1.0), Cell::Null]).unwrap();
        assert_eq!(pearson.count(), 0);
    }
}
