//! Edge cost and heuristic models

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Estimate of the remaining cost to the goal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Straight-line distance. Admissible and consistent with distance costs.
    #[default]
    Euclidean,
    /// Sum of axis distances. Overestimates on diagonal moves, trading
    /// optimality for fewer expansions.
    Manhattan,
}

impl Heuristic {
    pub fn estimate(&self, from: Vec3, to: Vec3) -> f32 {
        match self {
            Heuristic::Euclidean => from.distance(to),
            Heuristic::Manhattan => (to - from).abs().element_sum(),
        }
    }
}

/// Cost of moving between two adjacent cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalCost {
    /// Distance between cell centres
    #[default]
    Distance,
    /// Same cost for every edge regardless of cell size; favours large cells
    Fixed(f32),
}

impl TraversalCost {
    pub fn cost(&self, from: Vec3, to: Vec3) -> f32 {
        match self {
            TraversalCost::Distance => from.distance(to),
            TraversalCost::Fixed(cost) => *cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristics() {
        let a = Vec3::ZERO;
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(Heuristic::Euclidean.estimate(a, b), 5.0);
        assert_eq!(Heuristic::Manhattan.estimate(a, b), 7.0);
        assert_eq!(Heuristic::Manhattan.estimate(b, a), 7.0);
    }

    #[test]
    fn test_costs() {
        let a = Vec3::ZERO;
        let b = Vec3::new(0.0, 0.0, 2.0);
        assert_eq!(TraversalCost::Distance.cost(a, b), 2.0);
        assert_eq!(TraversalCost::Fixed(1.5).cost(a, b), 1.5);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Heuristic::Manhattan).unwrap(), "\"manhattan\"");
        let fixed: TraversalCost = serde_json::from_str(r#"{"fixed": 2.0}"#).unwrap();
        assert_eq!(fixed, TraversalCost::Fixed(2.0));
    }
}
