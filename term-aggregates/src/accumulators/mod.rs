//! Streaming accumulators, grouped by family.
//!
//! Every accumulator classifies its input cells, skips what it cannot use and
//! keeps O(1) state, except the order statistics which retain values.

pub mod dispersion;
pub mod frecency;
pub mod mean;
pub mod order;
pub mod shape;
pub mod utility;

pub use dispersion::{
    ConfidenceInterval, DataRange, PopulationStdDev, PopulationVariance, RootMeanSquare,
    RunningMoments, SampleStdDev, SampleVariance, StdDev, StdError, Variance,
};
pub use frecency::Frecency;
pub use mean::{AbsMean, GeometricMean, Mean, MeanState, PowerMean, WeightedMean};
pub use order::{Median, Mode, ModeState};
pub use shape::{
    PopulationKurtosis, PopulationSkewness, PowerSums, SampleKurtosis, SampleSkewness,
};
pub use utility::{Arbitrary, CoMoments, HasInf, HasNan, Pearson, Product};
