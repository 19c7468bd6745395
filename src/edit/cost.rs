//! Plan cost comparison.

use serde::Serialize;
use tracing::info;

use super::error::{CostError, PlanSide};
use crate::plan::PlanNode;

/// Root costs of two plans and their difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostComparison {
    pub original_cost: f64,
    pub modified_cost: f64,
    /// `modified_cost - original_cost`, rounded to two decimals.
    /// Negative when the alternative is cheaper.
    pub difference: f64,
}

/// Compare the root costs of an original and an alternative plan.
pub fn compare_costs(original: &PlanNode, alternative: &PlanNode) -> Result<CostComparison, CostError> {
    let original_cost = root_cost(original, PlanSide::Original)?;
    let modified_cost = root_cost(alternative, PlanSide::Alternative)?;
    let difference = round_cents(modified_cost - original_cost);

    info!(original_cost, modified_cost, difference, "compared plan costs");

    Ok(CostComparison {
        original_cost,
        modified_cost,
        difference,
    })
}

fn root_cost(plan: &PlanNode, side: PlanSide) -> Result<f64, CostError> {
    plan.total_cost
        .filter(|c| c.is_finite() && *c >= 0.0)
        .ok_or_else(|| CostError {
            side,
            node_type: plan.node_type.clone(),
        })
}

// Halves go to the even cent, as decimal rounding of the difference does.
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(cost: f64) -> PlanNode {
        PlanNode::new("Aggregate")
            .with_cost(cost)
            .with_child(PlanNode::new("Seq Scan").with_cost(cost / 2.0))
    }

    #[test]
    fn test_compare_costs() {
        let comparison = compare_costs(&plan(100.0), &plan(85.5)).unwrap();
        assert_eq!(
            comparison,
            CostComparison {
                original_cost: 100.0,
                modified_cost: 85.5,
                difference: -14.5,
            }
        );
    }

    #[test]
    fn test_difference_is_rounded() {
        let comparison = compare_costs(&plan(10.0), &plan(12.3456)).unwrap();
        assert_eq!(comparison.difference, 2.35);

        let comparison = compare_costs(&plan(0.1), &plan(0.3)).unwrap();
        assert_eq!(comparison.difference, 0.2);
    }

    #[test]
    fn test_halves_round_to_even() {
        let comparison = compare_costs(&plan(10.0), &plan(10.125)).unwrap();
        assert_eq!(comparison.difference, 0.12);

        let comparison = compare_costs(&plan(10.125), &plan(10.0)).unwrap();
        assert_eq!(comparison.difference, -0.12);

        let comparison = compare_costs(&plan(10.0), &plan(10.375)).unwrap();
        assert_eq!(comparison.difference, 0.38);
    }

    #[test]
    fn test_antisymmetric() {
        let pairs = [(100.0, 85.5), (1234.567, 1000.001), (0.0, 0.005), (42.0, 42.0)];
        for (a, b) in pairs {
            let forward = compare_costs(&plan(a), &plan(b)).unwrap();
            let backward = compare_costs(&plan(b), &plan(a)).unwrap();
            assert!((forward.difference + backward.difference).abs() < 1e-9);
        }
    }

    #[test]
    fn test_only_root_cost_counts() {
        let original = PlanNode::new("Limit")
            .with_cost(50.0)
            .with_child(PlanNode::new("Sort").with_cost(900.0));
        let alternative = PlanNode::new("Limit").with_cost(60.0);

        assert_eq!(compare_costs(&original, &alternative).unwrap().difference, 10.0);
    }

    #[test]
    fn test_missing_cost() {
        let costless = PlanNode::new("Result");

        let err = compare_costs(&costless, &plan(1.0)).unwrap_err();
        assert_eq!(err.side, PlanSide::Original);

        let err = compare_costs(&plan(1.0), &costless).unwrap_err();
        assert_eq!(err.side, PlanSide::Alternative);
        assert!(err.to_string().contains("alternative plan has no usable total cost"));

        let negative = PlanNode::new("Result").with_cost(-1.0);
        assert!(compare_costs(&negative, &plan(1.0)).is_err());
    }
}
