//! Core accumulator traits.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

use crate::cell::Cell;
use crate::error::{AggregateError, AggregateResult};
use crate::value::AggregateValue;

/// Core trait for streaming aggregate accumulators.
///
/// An accumulator is seeded once per aggregation group, receives zero or more
/// rows through [`fold`](Accumulator::fold) and is finalized exactly once.
/// Instances are never shared between groups and never merged.
///
/// # Example
///
/// ```rust
/// use term_aggregates::accumulators::Mean;
/// use term_aggregates::{Accumulator, AggregateValue, Cell};
///
/// let mut mean = Mean::default();
/// for value in [1.0, 2.0, 3.0, 4.0] {
///     mean.fold(&[Cell::Number(value)]).unwrap();
/// }
/// mean.fold(&[Cell::Text("not a number")]).unwrap();
///
/// assert_eq!(mean.finalize(), AggregateValue::Float(2.5));
/// ```
pub trait Accumulator: Debug + Send + Sync + UnwindSafe + RefUnwindSafe {
    /// Returns the registry name of the aggregate this accumulator computes.
    fn name(&self) -> &'static str;

    /// Folds one row into the state.
    ///
    /// `args` holds exactly the per-row data arguments; static parameters
    /// were consumed at construction. Rows whose cells fail classification
    /// are skipped without error.
    fn fold(&mut self, args: &[Cell<'_>]) -> AggregateResult<()>;

    /// Produces the final result.
    ///
    /// Always well-defined, even after zero folds.
    fn finalize(&mut self) -> AggregateValue;

    /// Number of rows that were accepted into the state.
    fn count(&self) -> u64;

    /// Approximate memory usage in bytes.
    fn size_bytes(&self) -> usize {
        std::mem::size_of_val(self)
    }

    /// Checks if no row has been accepted yet.
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Construction of an accumulator from its static parameters.
///
/// Parameters are the trailing arguments of the first row (for example the
/// exponent of `gmean(X, p)`); they are resolved once and never re-read.
pub trait Configure: Accumulator + Sized + 'static {
    /// Builds the accumulator, validating the parameters.
    fn configure(params: &[Cell<'_>]) -> AggregateResult<Self>;
}

/// Implements [`Configure`] for accumulators that take no parameters.
macro_rules! impl_unparameterized {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl $crate::traits::Configure for $ty {
                fn configure(params: &[$crate::cell::Cell<'_>]) -> $crate::error::AggregateResult<Self> {
                    $crate::traits::no_parameters($name, params)?;
                    Ok(Self::default())
                }
            }
        )*
    };
}
pub(crate) use impl_unparameterized;

/// Rejects any parameter for aggregates that take none.
pub(crate) fn no_parameters(aggregate: &str, params: &[Cell<'_>]) -> AggregateResult<()> {
    if params.is_empty() {
        Ok(())
    } else {
        Err(AggregateError::invalid_config(
            aggregate,
            format!("takes no parameters, got {}", params.len()),
        ))
    }
}

/// Extracts the single argument of a unary aggregate.
pub(crate) fn unary<'c, 'a>(
    aggregate: &str,
    args: &'c [Cell<'a>],
) -> AggregateResult<&'c Cell<'a>> {
    match args {
        [cell] => Ok(cell),
        _ => Err(AggregateError::arity(aggregate, 1, args.len())),
    }
}

/// Extracts both arguments of a binary aggregate.
pub(crate) fn binary<'c, 'a>(
    aggregate: &str,
    args: &'c [Cell<'a>],
) -> AggregateResult<(&'c Cell<'a>, &'c Cell<'a>)> {
    match args {
        [first, second] => Ok((first, second)),
        _ => Err(AggregateError::arity(aggregate, 2, args.len())),
    }
}
