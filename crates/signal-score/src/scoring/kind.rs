use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::aggregation::{Aggregation, ArithmeticMean, HarmonicMean, ProbabilisticOr};
use super::ScoringError;

/// The closed set of formulas a formula node (or the root) can aggregate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum AggregationKind {
    ArithmeticMean,
    HarmonicMean,
    ProbabilisticOr,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 3] = [
        AggregationKind::ArithmeticMean,
        AggregationKind::HarmonicMean,
        AggregationKind::ProbabilisticOr,
    ];

    /// Wire identifier used by the editing surface.
    pub fn as_str(self) -> &'static str {
        match self {
            AggregationKind::ArithmeticMean => "arithmeticMean",
            AggregationKind::HarmonicMean => "harmonicMean",
            AggregationKind::ProbabilisticOr => "probabilisticOr",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AggregationKind::ArithmeticMean => "Arithmetic Mean",
            AggregationKind::HarmonicMean => "Harmonic Mean",
            AggregationKind::ProbabilisticOr => "Probabilistic OR",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AggregationKind::ArithmeticMean => {
                "The arithmetic mean is calculated by adding all values together and dividing by \
                 the number of values. It's useful when all signals should contribute equally."
            }
            AggregationKind::HarmonicMean => {
                "The harmonic mean is calculated as the reciprocal of the arithmetic mean of the \
                 reciprocals. It gives greater weight to smaller values and is useful when \
                 averaging rates."
            }
            AggregationKind::ProbabilisticOr => {
                "The probabilistic OR combines signals as if they were independent probabilities. \
                 It's calculated as 1 minus the product of (1 minus each signal value)."
            }
        }
    }

    /// One-line blurb shown next to the formula picker.
    pub fn summary(self) -> &'static str {
        match self {
            AggregationKind::ArithmeticMean => "Simple average of all signals",
            AggregationKind::HarmonicMean => "Reciprocal of the arithmetic mean of reciprocals",
            AggregationKind::ProbabilisticOr => "1 - ((1-a) * (1-b) * ...)",
        }
    }

    pub fn strategy(self) -> &'static dyn Aggregation {
        match self {
            AggregationKind::ArithmeticMean => &ArithmeticMean,
            AggregationKind::HarmonicMean => &HarmonicMean,
            AggregationKind::ProbabilisticOr => &ProbabilisticOr,
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationKind {
    type Err = ScoringError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        AggregationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| ScoringError::UnknownAggregationKind(raw.to_string()))
    }
}

impl TryFrom<String> for AggregationKind {
    type Error = ScoringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Display metadata for a single formula, as served to pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaInfo {
    pub formula_type: AggregationKind,
    pub label: &'static str,
    pub description: &'static str,
    pub summary: &'static str,
}

impl From<AggregationKind> for FormulaInfo {
    fn from(kind: AggregationKind) -> Self {
        Self {
            formula_type: kind,
            label: kind.label(),
            description: kind.description(),
            summary: kind.summary(),
        }
    }
}

pub fn formula_catalog() -> Vec<FormulaInfo> {
    AggregationKind::ALL.into_iter().map(FormulaInfo::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_name() {
        for kind in AggregationKind::ALL {
            assert_eq!(kind.as_str().parse::<AggregationKind>().expect("known"), kind);
        }
    }

    #[test]
    fn unknown_name_is_an_error_not_a_default() {
        match "geometricMean".parse::<AggregationKind>() {
            Err(ScoringError::UnknownAggregationKind(name)) => assert_eq!(name, "geometricMean"),
            other => panic!("expected unknown kind error, got {other:?}"),
        }
    }

    #[test]
    fn deserializes_from_camel_case_and_rejects_unknown() {
        let kind: AggregationKind =
            serde_json::from_str("\"harmonicMean\"").expect("known kind decodes");
        assert_eq!(kind, AggregationKind::HarmonicMean);

        let err = serde_json::from_str::<AggregationKind>("\"median\"")
            .expect_err("unknown kind rejected");
        assert!(err.to_string().contains("unknown aggregation kind"));
    }

    #[test]
    fn serializes_to_wire_name() {
        let json = serde_json::to_string(&AggregationKind::ProbabilisticOr).expect("encodes");
        assert_eq!(json, "\"probabilisticOr\"");
    }

    #[test]
    fn catalog_lists_labels_in_declaration_order() {
        let labels: Vec<_> = formula_catalog().iter().map(|info| info.label).collect();
        assert_eq!(
            labels,
            vec!["Arithmetic Mean", "Harmonic Mean", "Probabilistic OR"]
        );
    }
}
