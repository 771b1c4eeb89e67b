//! Weighted aggregation formulas applied once every child has a concrete value.
//!
//! None of these return NaN or an infinity for well-formed weights: empty input,
//! a zero weight total and (for the harmonic mean) non-positive values all fold to
//! a defined score of 0 or are excluded.

use serde::{Deserialize, Serialize};

/// A resolved child: its concrete value and its weight within the parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weighted {
    pub value: f64,
    pub weight: f64,
}

impl Weighted {
    pub fn new(value: f64, weight: f64) -> Self {
        Self { value, weight }
    }
}

/// Shared calling contract for the three formulas.
pub trait Aggregation: Send + Sync {
    fn aggregate(&self, inputs: &[Weighted]) -> f64;
}

fn total_weight(inputs: &[Weighted]) -> f64 {
    inputs.iter().map(|input| input.weight).sum()
}

/// `Σ(vᵢ·wᵢ) / Σwᵢ`
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticMean;

impl Aggregation for ArithmeticMean {
    fn aggregate(&self, inputs: &[Weighted]) -> f64 {
        let total = total_weight(inputs);
        if total == 0.0 {
            return 0.0;
        }

        let weighted_sum: f64 = inputs.iter().map(|input| input.value * input.weight).sum();
        weighted_sum / total
    }
}

/// `Σwᵢ / Σ(wᵢ / vᵢ)` over the entries with a positive value.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarmonicMean;

impl Aggregation for HarmonicMean {
    fn aggregate(&self, inputs: &[Weighted]) -> f64 {
        let (total, reciprocal_sum) = inputs
            .iter()
            .filter(|input| input.value > 0.0)
            .fold((0.0, 0.0), |(total, reciprocals), input| {
                (total + input.weight, reciprocals + input.weight / input.value)
            });

        if total == 0.0 {
            return 0.0;
        }
        total / reciprocal_sum
    }
}

/// `1 − Π(1 − vᵢ)^(wᵢ / Σw)`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbabilisticOr;

impl Aggregation for ProbabilisticOr {
    fn aggregate(&self, inputs: &[Weighted]) -> f64 {
        let total = total_weight(inputs);
        if total == 0.0 {
            return 0.0;
        }

        let miss = inputs.iter().fold(1.0, |product: f64, input| {
            product * (1.0 - input.value).powf(input.weight / total)
        });
        1.0 - miss
    }
}
