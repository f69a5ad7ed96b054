//! Order statistics: median and mode.
//!
//! Unlike every other aggregate these keep memory proportional to the number
//! of accepted rows: the median retains every value and the mode one entry
//! per distinct value.

use std::collections::HashMap;

use crate::cell::Cell;
use crate::error::AggregateResult;
use crate::traits::{impl_unparameterized, unary, Accumulator};
use crate::value::AggregateValue;

/// Median of the accepted values (`median`).
#[derive(Debug, Clone, Default)]
pub struct Median {
    values: Vec<f64>,
}

impl Median {
    /// Sorts the retained values and returns the middle one, or the mean of
    /// the two central values for an even count.
    pub fn median(&mut self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        self.values.sort_by(f64::total_cmp);

        let mid = self.values.len() / 2;
        if self.values.len() % 2 == 1 {
            Some(self.values[mid])
        } else {
            Some((self.values[mid - 1] + self.values[mid]) / 2.0)
        }
    }
}

impl Accumulator for Median {
    fn name(&self) -> &'static str {
        "median"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.values.push(value);
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        self.median().into()
    }

    fn count(&self) -> u64 {
        self.values.len() as u64
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.values.capacity() * std::mem::size_of::<f64>()
    }
}

/// Frequency of every distinct accepted value.
#[derive(Debug, Clone, Default)]
pub struct ModeState {
    /// Keyed by bit pattern; `-0.0` is folded into `0.0`.
    frequencies: HashMap<u64, u64>,
    count: u64,
}

impl ModeState {
    pub fn push(&mut self, value: f64) {
        let key = (value + 0.0).to_bits();
        *self.frequencies.entry(key).or_insert(0) += 1;
        self.count += 1;
    }

    /// Highest frequency seen so far.
    pub fn max_frequency(&self) -> u64 {
        self.frequencies.values().copied().max().unwrap_or(0)
    }

    /// Every value sharing the highest frequency, ascending.
    pub fn modes(&self) -> Vec<f64> {
        let max = self.max_frequency();
        let mut modes: Vec<f64> = self
            .frequencies
            .iter()
            .filter(|(_, &frequency)| frequency == max)
            .map(|(&bits, _)| f64::from_bits(bits))
            .collect();
        modes.sort_by(f64::total_cmp);
        modes
    }

    pub fn distinct(&self) -> usize {
        self.frequencies.len()
    }
}

/// Most frequent accepted value; ties go to the smallest value (`mode`).
#[derive(Debug, Clone, Default)]
pub struct Mode {
    state: ModeState,
}

impl Mode {
    pub fn state(&self) -> &ModeState {
        &self.state
    }
}

impl Accumulator for Mode {
    fn name(&self) -> &'static str {
        "mode"
    }

    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()> {
        if let Some(value) = unary(self.name(), args)?.numeric() {
            self.state.push(value);
        }
        Ok(())
    }

    fn finalize(&mut self) -> AggregateValue {
        self.state.modes().first().copied().into()
    }

    fn count(&self) -> u64 {
        self.state.count
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.state.frequencies.capacity() * 2 * std::mem::size_of::<u64>()
    }
}

impl_unparameterized! {
    Median => "median",
    Mode => "mode",
}
