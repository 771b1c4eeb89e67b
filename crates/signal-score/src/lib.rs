//! Weighted signal trees and the engine that folds them into a single score.
//!
//! A tree is made of leaf values and nested formula nodes. Each formula node
//! aggregates its children with one of three weighted formulas (arithmetic mean,
//! harmonic mean, probabilistic OR); the root does the same over the top-level
//! signals. Evaluation is a pure function of the tree snapshot.

pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
