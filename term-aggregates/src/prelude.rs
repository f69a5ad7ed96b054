//! Prelude for commonly used types and traits in term-aggregates.

pub use crate::cell::{Cell, Classified};
pub use crate::config::{FrecencyConfig, PowerMeanConfig, RegistrationConfig, VarianceConfig};
pub use crate::error::{AggregateError, AggregateResult};
pub use crate::logging::LogConfig;
pub use crate::registry::{list_aggregates, lookup, AggregateEntry, AggregateFamily};
pub use crate::traits::{Accumulator, Configure};
pub use crate::value::{AggregateValue, OutputKind};
