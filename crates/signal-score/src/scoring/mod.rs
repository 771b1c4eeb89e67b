//! Signal trees, the three aggregation formulas, and the resolution walk that ties
//! them together.
//!
//! [`evaluate`] is the pure entry point: it takes a formula kind and an ordered list
//! of signals and returns the score. [`SignalTree`] is an editable arena that
//! callers mutate and then [`SignalTree::recompute`] after every change.

pub mod aggregation;
mod evaluate;
pub mod kind;
pub mod router;
pub mod signal;
pub mod tree;

#[cfg(test)]
mod tests;

pub use aggregation::{Aggregation, ArithmeticMean, HarmonicMean, ProbabilisticOr, Weighted};
pub use evaluate::{evaluate, resolve, Resolution, ResolvedFormula, ResolvedSignal};
pub use kind::{formula_catalog, AggregationKind, FormulaInfo};
pub use router::scoring_router;
pub use signal::{Signal, SignalBody, SignalId};
pub use tree::{Direction, EditPolicy, NodeView, SignalTree, TreeError};

/// Failures raised while decoding formula kinds and signal records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("unknown aggregation kind '{0}'")]
    UnknownAggregationKind(String),
    #[error("signal '{0}' mixes both leaf and formula fields")]
    MixedSignal(SignalId),
    #[error("formula signal '{0}' is missing its formula type")]
    MissingFormulaType(SignalId),
    #[error("leaf signal '{0}' is missing a value")]
    MissingValue(SignalId),
}
