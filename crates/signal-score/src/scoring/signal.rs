use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

use super::kind::AggregationKind;
use super::ScoringError;

/// Opaque identifier for a signal. Only used for lookup and presentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub String);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SignalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A node in a signal tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SignalRecord", into = "SignalRecord")]
pub struct Signal {
    pub id: SignalId,
    pub name: String,
    /// Relative contribution within the parent aggregation.
    pub weight: f64,
    pub body: SignalBody,
}

/// What a signal contributes: a stored value, or the result of a nested formula.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalBody {
    Leaf {
        value: f64,
    },
    Formula {
        kind: AggregationKind,
        signals: Vec<Signal>,
    },
}

pub const DEFAULT_WEIGHT: f64 = 1.0;

impl Signal {
    pub fn leaf(id: impl Into<SignalId>, name: impl Into<String>, value: f64, weight: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
            body: SignalBody::Leaf { value },
        }
    }

    pub fn formula(
        id: impl Into<SignalId>,
        name: impl Into<String>,
        weight: f64,
        kind: AggregationKind,
        signals: Vec<Signal>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            weight,
            body: SignalBody::Formula { kind, signals },
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.body, SignalBody::Formula { .. })
    }

    /// The stored value of a leaf. Formula nodes have no trusted value.
    pub fn value(&self) -> Option<f64> {
        match self.body {
            SignalBody::Leaf { value } => Some(value),
            SignalBody::Formula { .. } => None,
        }
    }

    pub fn kind(&self) -> Option<AggregationKind> {
        match self.body {
            SignalBody::Leaf { .. } => None,
            SignalBody::Formula { kind, .. } => Some(kind),
        }
    }

    pub fn children(&self) -> &[Signal] {
        match &self.body {
            SignalBody::Leaf { .. } => &[],
            SignalBody::Formula { signals, .. } => signals,
        }
    }
}

// Nested children are flattened onto a worklist so that dropping a deep tree
// never recurses.
impl Drop for Signal {
    fn drop(&mut self) {
        let SignalBody::Formula { signals, .. } = &mut self.body else {
            return;
        };
        let mut pending = mem::take(signals);
        while let Some(mut signal) = pending.pop() {
            if let SignalBody::Formula { signals, .. } = &mut signal.body {
                pending.append(signals);
            }
        }
    }
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

/// Flat record exchanged with editing surfaces: `isFormula` discriminates, and
/// `formulaType`/`signals` are present only on formula nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignalRecord {
    id: SignalId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default)]
    is_formula: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula_type: Option<AggregationKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signals: Option<Vec<Signal>>,
}

impl TryFrom<SignalRecord> for Signal {
    type Error = ScoringError;

    fn try_from(record: SignalRecord) -> Result<Self, Self::Error> {
        let SignalRecord {
            id,
            name,
            value,
            weight,
            is_formula,
            formula_type,
            signals,
        } = record;

        let body = if is_formula {
            let kind = formula_type.ok_or_else(|| ScoringError::MissingFormulaType(id.clone()))?;
            SignalBody::Formula {
                kind,
                signals: signals.unwrap_or_default(),
            }
        } else {
            if formula_type.is_some() || signals.is_some() {
                return Err(ScoringError::MixedSignal(id));
            }
            let value = value.ok_or_else(|| ScoringError::MissingValue(id.clone()))?;
            SignalBody::Leaf { value }
        };

        Ok(Signal {
            id,
            name,
            weight,
            body,
        })
    }
}

impl From<Signal> for SignalRecord {
    fn from(mut signal: Signal) -> Self {
        let id = SignalId(mem::take(&mut signal.id.0));
        let name = mem::take(&mut signal.name);
        let weight = signal.weight;
        let body = mem::replace(&mut signal.body, SignalBody::Leaf { value: 0.0 });

        match body {
            SignalBody::Leaf { value } => SignalRecord {
                id,
                name,
                value: Some(value),
                weight,
                is_formula: false,
                formula_type: None,
                signals: None,
            },
            SignalBody::Formula { kind, signals } => SignalRecord {
                id,
                name,
                value: Some(0.0),
                weight,
                is_formula: true,
                formula_type: Some(kind),
                signals: Some(signals),
            },
        }
    }
}
