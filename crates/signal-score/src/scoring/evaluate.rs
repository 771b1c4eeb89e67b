use std::slice;

use serde::Serialize;
use tracing::debug;

use super::aggregation::Weighted;
use super::kind::AggregationKind;
use super::signal::{Signal, SignalBody, SignalId};

/// Score of a signal list together with the resolved tree behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub formula_type: AggregationKind,
    pub score: f64,
    pub signals: Vec<ResolvedSignal>,
}

/// A signal after resolution, kept for per-node breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSignal {
    pub id: SignalId,
    pub name: String,
    pub weight: f64,
    /// `weight` over the sibling weight total, or 0 when the siblings weigh nothing.
    pub share: f64,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<ResolvedFormula>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedFormula {
    pub formula_type: AggregationKind,
    pub signals: Vec<ResolvedSignal>,
}

impl Drop for ResolvedFormula {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.signals);
        while let Some(mut signal) = pending.pop() {
            if let Some(formula) = signal.formula.as_mut() {
                pending.append(&mut formula.signals);
            }
        }
    }
}

impl ResolvedSignal {
    fn leaf(signal: &Signal, value: f64) -> Self {
        Self {
            id: signal.id.clone(),
            name: signal.name.clone(),
            weight: signal.weight,
            share: 0.0,
            value,
            formula: None,
        }
    }

    fn formula(
        signal: &Signal,
        kind: AggregationKind,
        score: f64,
        signals: Vec<ResolvedSignal>,
    ) -> Self {
        Self {
            id: signal.id.clone(),
            name: signal.name.clone(),
            weight: signal.weight,
            share: 0.0,
            value: score,
            formula: Some(ResolvedFormula {
                formula_type: kind,
                signals,
            }),
        }
    }
}

/// One formula level whose children are still being resolved.
struct Frame<'a> {
    kind: AggregationKind,
    pending: slice::Iter<'a, Signal>,
    resolved: Vec<ResolvedSignal>,
}

impl<'a> Frame<'a> {
    fn new(kind: AggregationKind, signals: &'a [Signal]) -> Self {
        Self {
            kind,
            pending: signals.iter(),
            resolved: Vec::with_capacity(signals.len()),
        }
    }

    fn finish(self) -> (AggregationKind, f64, Vec<ResolvedSignal>) {
        let Frame {
            kind, mut resolved, ..
        } = self;

        let inputs: Vec<Weighted> = resolved
            .iter()
            .map(|signal| Weighted::new(signal.value, signal.weight))
            .collect();
        let score = kind.strategy().aggregate(&inputs);

        let total: f64 = inputs.iter().map(|input| input.weight).sum();
        for signal in &mut resolved {
            signal.share = if total == 0.0 {
                0.0
            } else {
                signal.weight / total
            };
        }

        (kind, score, resolved)
    }
}

/// Score `signals` under `kind`, resolving every nested formula first.
pub fn evaluate(kind: AggregationKind, signals: &[Signal]) -> f64 {
    resolve(kind, signals).score
}

/// Resolve the whole tree bottom-up and aggregate at every level.
///
/// The walk is post-order over an explicit stack, so nesting depth is bounded by
/// heap rather than call-stack size. Leaves contribute their stored value; formula
/// nodes contribute the score of their own children. An empty list scores 0.
pub fn resolve(kind: AggregationKind, signals: &[Signal]) -> Resolution {
    let mut parents: Vec<(Frame<'_>, &Signal)> = Vec::new();
    let mut current = Frame::new(kind, signals);
    let mut visited = 0usize;

    loop {
        match current.pending.next() {
            Some(signal) => {
                visited += 1;
                match &signal.body {
                    SignalBody::Leaf { value } => {
                        current.resolved.push(ResolvedSignal::leaf(signal, *value));
                    }
                    SignalBody::Formula { kind, signals } => {
                        let child = Frame::new(*kind, signals);
                        parents.push((std::mem::replace(&mut current, child), signal));
                    }
                }
            }
            None => {
                let (kind, score, resolved) = current.finish();
                match parents.pop() {
                    Some((parent, owner)) => {
                        current = parent;
                        current
                            .resolved
                            .push(ResolvedSignal::formula(owner, kind, score, resolved));
                    }
                    None => {
                        debug!(formula = %kind, nodes = visited, score, "signal tree resolved");
                        return Resolution {
                            formula_type: kind,
                            score,
                            signals: resolved,
                        };
                    }
                }
            }
        }
    }
}
