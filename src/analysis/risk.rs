//! Rule-based risk flags and the revenue estimate

use crate::models::FactorSet;

/// Base monthly revenue potential before score and demand scaling
pub const BASE_REVENUE: f64 = 75_000.0;

pub const LOW_COVERAGE_RISK: &str =
    "Low existing cell coverage may require significant infrastructure investment";
pub const LIMITED_FIBER_RISK: &str =
    "Limited fiber connectivity may increase deployment costs by 20-30%";
pub const NO_TOWERS_RISK: &str = "No existing towers in area - consider phased deployment approach";
pub const HIGH_RISK: &str = "Overall location score indicates high investment risk";
pub const MODERATE_RISK: &str = "Moderate risk profile - conduct detailed feasibility study";
pub const COMPETITION_RISK: &str = "High competition density may impact market share";

/// Risk strings for an analysed location, in rule order
#[must_use]
pub fn identify_risks(factors: &FactorSet, score: f64, nearby_towers: usize) -> Vec<String> {
    let mut risks = Vec::new();

    if factors.cell_coverage < 0.3 {
        risks.push(LOW_COVERAGE_RISK);
    }
    if factors.fiber_proximity < 0.2 {
        risks.push(LIMITED_FIBER_RISK);
    }
    if nearby_towers == 0 {
        risks.push(NO_TOWERS_RISK);
    }
    if score < 0.4 {
        risks.push(HIGH_RISK);
    } else if score < 0.6 {
        risks.push(MODERATE_RISK);
    }
    if factors.cell_coverage > 0.8 && nearby_towers > 5 {
        risks.push(COMPETITION_RISK);
    }

    risks.into_iter().map(str::to_string).collect()
}

/// `BASE_REVENUE × score × populationDensity × businessPotential`, rounded
#[must_use]
pub fn estimate_revenue(score: f64, factors: &FactorSet) -> u64 {
    let revenue = BASE_REVENUE * score * factors.population_density * factors.business_potential;
    revenue.round().max(0.0) as u64
}
