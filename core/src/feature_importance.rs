//! Simulated feature importance for the dashboard's "risk drivers" panel.
//!
//! THIS IS PLACEHOLDER DATA. The weights are drawn at random from the
//! feature-importance RNG stream; they are not computed from the input
//! rows, the risk scores, or any model. Consumers must label the panel
//! as illustrative.

use crate::{
    rng::StageRng,
    tables::{ImpactDirection, SimulatedFeatureImportance},
};

pub const SIMULATED_FACTORS: [&str; 8] = [
    "Transaction Amount",
    "Agency Type",
    "Recipient Type",
    "Time of Day",
    "Day of Week",
    "Historical Pattern",
    "Seasonal Factor",
    "Entity Risk Profile",
];

const MIN_WEIGHT: f64 = 0.1;
const MAX_WEIGHT: f64 = 1.0;

/// Draw a weight and a direction per factor, then normalise the
/// weights to percentages. Sorted by weight, heaviest first.
pub fn simulate_feature_importance(rng: &mut StageRng) -> Vec<SimulatedFeatureImportance> {
    // All weights first, then all directions: a fixed draw order keeps
    // the table stable for a given seed.
    let weights: Vec<f64> = SIMULATED_FACTORS
        .iter()
        .map(|_| rng.uniform(MIN_WEIGHT, MAX_WEIGHT))
        .collect();
    let directions: Vec<ImpactDirection> = SIMULATED_FACTORS
        .iter()
        .map(|_| if rng.chance(0.5) { ImpactDirection::Positive } else { ImpactDirection::Negative })
        .collect();

    let total: f64 = weights.iter().sum();

    let mut rows: Vec<SimulatedFeatureImportance> = SIMULATED_FACTORS
        .iter()
        .zip(weights)
        .zip(directions)
        .map(|((feature, importance), impact_direction)| SimulatedFeatureImportance {
            feature: *feature,
            importance,
            impact_direction,
            importance_percentage: importance / total * 100.0,
        })
        .collect();

    rows.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    rows
}
