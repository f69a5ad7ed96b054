//! Apache DataFusion binding through `AggregateUDFImpl`.
//!
//! Each registry entry becomes one user-defined aggregate whose signature
//! accepts any value types for every supported argument count. Rows are
//! converted cell by cell; static parameters are read from the first row of
//! the first batch.
//!
//! Partial aggregation is not supported: `state` and `merge_batch` return
//! `NotImplemented`. Registration therefore requires a single-partition
//! session (`SessionConfig::with_target_partitions(1)`), whose plans
//! aggregate in one stage and never call them.

use std::any::Any;

use arrow::array::ArrayRef;
use arrow::datatypes::DataType;
use datafusion::common::ScalarValue;
use datafusion::error::{DataFusionError, Result};
use datafusion::logical_expr::function::AccumulatorArgs;
use datafusion::logical_expr::{
    Accumulator as DfAccumulator, AggregateUDF, AggregateUDFImpl, Signature, TypeSignature,
    Volatility,
};
use datafusion::prelude::SessionContext;
use tracing::{info, instrument};

use crate::cell::Cell;
use crate::config::RegistrationConfig;
use crate::error::{AggregateError, AggregateResult};
use crate::logging::{truncate_field, LogConfig};
use crate::registry::{self, AggregateEntry};
use crate::traits::Accumulator;
use crate::value::{AggregateValue, OutputKind};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Converts a DataFusion scalar to a cell.
///
/// Integers, floats, decimals and booleans become numbers, dates and
/// timestamps become Unix seconds, strings become text and everything else is
/// null.
pub fn scalar_to_cell(scalar: &ScalarValue) -> Cell<'_> {
    match scalar {
        ScalarValue::Float64(Some(v)) => Cell::Number(*v),
        ScalarValue::Float32(Some(v)) => Cell::Number(f64::from(*v)),
        ScalarValue::Int64(Some(v)) => Cell::Number(*v as f64),
        ScalarValue::Int32(Some(v)) => Cell::Number(f64::from(*v)),
        ScalarValue::Int16(Some(v)) => Cell::Number(f64::from(*v)),
        ScalarValue::Int8(Some(v)) => Cell::Number(f64::from(*v)),
        ScalarValue::UInt64(Some(v)) => Cell::Number(*v as f64),
        ScalarValue::UInt32(Some(v)) => Cell::Number(f64::from(*v)),
        ScalarValue::UInt16(Some(v)) => Cell::Number(f64::from(*v)),
        ScalarValue::UInt8(Some(v)) => Cell::Number(f64::from(*v)),
        ScalarValue::Boolean(Some(b)) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        ScalarValue::Decimal128(Some(v), _, scale) => {
            Cell::Number(*v as f64 / 10f64.powi(i32::from(*scale)))
        }
        ScalarValue::Date32(Some(days)) => Cell::Number(f64::from(*days) * SECONDS_PER_DAY),
        ScalarValue::Date64(Some(millis)) => Cell::Number(*millis as f64 / 1e3),
        ScalarValue::TimestampSecond(Some(v), _) => Cell::Number(*v as f64),
        ScalarValue::TimestampMillisecond(Some(v), _) => Cell::Number(*v as f64 / 1e3),
        ScalarValue::TimestampMicrosecond(Some(v), _) => Cell::Number(*v as f64 / 1e6),
        ScalarValue::TimestampNanosecond(Some(v), _) => Cell::Number(*v as f64 / 1e9),
        ScalarValue::Utf8(Some(s))
        | ScalarValue::LargeUtf8(Some(s))
        | ScalarValue::Utf8View(Some(s)) => Cell::Text(s.as_str()),
        _ => Cell::Null,
    }
}

/// Converts a finalized value to a scalar of the declared output type.
pub fn value_to_scalar(value: AggregateValue, output: OutputKind) -> ScalarValue {
    match output {
        OutputKind::Float => ScalarValue::Float64(value.as_f64()),
        OutputKind::Boolean => ScalarValue::Boolean(value.as_bool()),
    }
}

fn output_type(output: OutputKind) -> DataType {
    match output {
        OutputKind::Float => DataType::Float64,
        OutputKind::Boolean => DataType::Boolean,
    }
}

fn external(err: AggregateError) -> DataFusionError {
    DataFusionError::External(Box::new(err))
}

/// A registry entry exposed as a DataFusion aggregate UDF.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlAggregateUdf {
    name: String,
    signature: Signature,
    output: OutputKind,
}

impl SqlAggregateUdf {
    pub fn new(entry: &AggregateEntry, volatility: Volatility) -> Self {
        let variants = entry.arities().map(TypeSignature::Any).collect();
        Self {
            name: entry.name().to_string(),
            signature: Signature::one_of(variants, volatility),
            output: entry.output(),
        }
    }
}

impl AggregateUDFImpl for SqlAggregateUdf {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn return_type(&self, _arg_types: &[DataType]) -> Result<DataType> {
        Ok(output_type(self.output))
    }

    fn accumulator(&self, _acc_args: AccumulatorArgs) -> Result<Box<dyn DfAccumulator>> {
        let entry = registry::lookup(&self.name)
            .ok_or_else(|| external(AggregateError::UnknownAggregate(self.name.clone())))?;
        Ok(Box::new(SqlAccumulator::new(entry, LogConfig::default())))
    }
}

/// Drives one of our accumulators from DataFusion record batches.
#[derive(Debug)]
pub struct SqlAccumulator {
    entry: &'static AggregateEntry,
    inner: Option<Box<dyn Accumulator>>,
    log: LogConfig,
}

impl SqlAccumulator {
    pub fn new(entry: &'static AggregateEntry, log: LogConfig) -> Self {
        Self {
            entry,
            inner: None,
            log,
        }
    }

    fn host_error(&self, err: AggregateError) -> DataFusionError {
        crate::log_host_error!(
            self.log,
            aggregate = self.entry.name(),
            error = %truncate_field(&err.to_string(), self.log.max_field_length),
            "Aggregate failed, aborting group"
        );
        external(err)
    }

    fn fold_row(&mut self, cells: &[Cell<'_>]) -> Result<()> {
        let (data, params) = self
            .entry
            .split_args(cells)
            .map_err(|e| self.host_error(e))?;

        if self.inner.is_none() {
            let created = self.entry.create(params).map_err(|e| self.host_error(e))?;
            self.inner = Some(created);
        }

        let folded = match self.inner.as_mut() {
            Some(acc) => acc.fold(data),
            None => Ok(()),
        };
        folded.map_err(|e| self.host_error(e))
    }
}

impl DfAccumulator for SqlAccumulator {
    fn update_batch(&mut self, values: &[ArrayRef]) -> Result<()> {
        let num_rows = values.first().map_or(0, |array| array.len());
        for row in 0..num_rows {
            let scalars = values
                .iter()
                .map(|array| ScalarValue::try_from_array(array.as_ref(), row))
                .collect::<Result<Vec<_>>>()?;
            let cells: Vec<Cell<'_>> = scalars.iter().map(scalar_to_cell).collect();
            self.fold_row(&cells)?;
        }
        Ok(())
    }

    fn evaluate(&mut self) -> Result<ScalarValue> {
        let value = match self.inner.as_mut() {
            Some(acc) => acc.finalize(),
            None => self
                .entry
                .create(&[])
                .map_err(|e| self.host_error(e))?
                .finalize(),
        };
        Ok(value_to_scalar(value, self.entry.output()))
    }

    fn size(&self) -> usize {
        std::mem::size_of_val(self) + self.inner.as_ref().map_or(0, |acc| acc.size_bytes())
    }

    fn state(&mut self) -> Result<Vec<ScalarValue>> {
        Err(DataFusionError::NotImplemented(format!(
            "{} does not support partial aggregation",
            self.entry.name()
        )))
    }

    fn merge_batch(&mut self, _states: &[ArrayRef]) -> Result<()> {
        Err(DataFusionError::NotImplemented(format!(
            "{} does not support merging partial states",
            self.entry.name()
        )))
    }
}

fn volatility(entry: &AggregateEntry, config: &RegistrationConfig) -> Volatility {
    if config.deterministic && entry.is_deterministic() {
        Volatility::Immutable
    } else {
        Volatility::Volatile
    }
}

/// Registers the selected aggregates on a session context.
///
/// Fails with a configuration error when the session plans more than one
/// partition, since every query would then need partial aggregation.
#[instrument(skip(ctx, config))]
pub fn register_aggregates(
    ctx: &SessionContext,
    config: &RegistrationConfig,
) -> AggregateResult<usize> {
    config.validate()?;

    let partitions = ctx.copied_config().target_partitions();
    if partitions > 1 {
        return Err(AggregateError::invalid_config(
            "datafusion",
            format!(
                "session has target_partitions = {partitions}, partial aggregation is not \
                 supported; use SessionConfig::with_target_partitions(1)"
            ),
        ));
    }

    let mut registered = 0;
    for entry in registry::list_aggregates()
        .iter()
        .filter(|entry| config.selects(entry.name()))
    {
        let udf = SqlAggregateUdf::new(entry, volatility(entry, config));
        ctx.register_udaf(AggregateUDF::new_from_impl(udf));
        crate::log_registration!(
            config.log,
            aggregate = entry.name(),
            arity = entry.arity(),
            "Registered DataFusion aggregate"
        );
        registered += 1;
    }

    info!(registered, "Registered aggregates with DataFusion");
    Ok(registered)
}

/// Registers every bundled aggregate with the default configuration.
pub fn register_all(ctx: &SessionContext) -> AggregateResult<usize> {
    register_aggregates(ctx, &RegistrationConfig::default())
}
