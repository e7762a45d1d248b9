//! Risk analysis, profit margin and taxes

use crate::domain::{CostSummary, RiskAnalysis, RiskComponent, RiskLevel, TaxEstimate, TaxRegime};

use super::{EngineVersion, EstimateContext, EstimateError};

pub const MIN_MARGIN: f64 = 0.15;
pub const MAX_MARGIN: f64 = 0.45;
const BASE_MARGIN: f64 = 0.30;

/// Weights for complexity, location, quality, finishing and urgency
const V1_WEIGHTS: [f64; 5] = [0.2; 5];
const V2_WEIGHTS: [f64; 5] = [0.25, 0.20, 0.15, 0.15, 0.25];

#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub risk: RiskAnalysis,
    pub profit_margin: f64,
    pub profit: f64,
    pub final_price: f64,
}

pub fn compute_risk_and_price(
    costs: &CostSummary,
    ctx: &EstimateContext<'_>,
) -> Result<Pricing, EstimateError> {
    let risk = analyze_risk(ctx)?;
    let complexity = ctx.factors.complexity;

    let margin = match ctx.engine {
        EngineVersion::V1 => BASE_MARGIN * (1.0 + (risk.factor - 1.0) * 0.5),
        EngineVersion::V2 => {
            BASE_MARGIN
                + (risk.factor - 1.0) * 0.1
                + size_adjustment(costs.total)
                + (complexity - 1.0) * 0.05
        }
    };
    let profit_margin = margin.clamp(MIN_MARGIN, MAX_MARGIN);

    Ok(Pricing {
        risk,
        profit_margin,
        profit: costs.total * profit_margin,
        final_price: costs.total * (1.0 + profit_margin),
    })
}

/// Small jobs carry a larger margin, large ones a smaller one.
fn size_adjustment(total_cost: f64) -> f64 {
    if total_cost <= 0.0 {
        return 0.05;
    }
    (0.05 - (total_cost / 10_000.0).log10() * 0.02).clamp(-0.05, 0.05)
}

fn analyze_risk(ctx: &EstimateContext<'_>) -> Result<RiskAnalysis, EstimateError> {
    let input = ctx.input;
    let data = ctx.data;
    let weights = match ctx.engine {
        EngineVersion::V1 => V1_WEIGHTS,
        EngineVersion::V2 => V2_WEIGHTS,
    };

    let entries = [
        ("complexity", data.complexity(input.complexity)?),
        ("location", data.location(input.location)?),
        ("quality", data.quality(input.quality)?),
        ("finishing", data.finishing(input.finishing)?),
        ("urgency", data.urgency(input.urgency)?),
    ];

    let components: Vec<RiskComponent> = entries
        .into_iter()
        .zip(weights)
        .map(|((category, risk), weight)| RiskComponent {
            category: category.to_string(),
            factor: risk.factor,
            weight,
            level: RiskLevel::classify(risk.factor),
            description: risk.description.clone(),
        })
        .collect();

    let factor: f64 = components.iter().map(|c| c.factor * c.weight).sum();

    Ok(RiskAnalysis {
        factor,
        level: RiskLevel::classify(factor),
        components,
    })
}

pub fn compute_taxes(final_price: f64, tax: &TaxRegime) -> TaxEstimate {
    let amount = final_price * tax.rate_percent / 100.0;
    TaxEstimate {
        regime: tax.regime.clone(),
        rate_percent: tax.rate_percent,
        amount,
        price_with_taxes: final_price + amount,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::{Complexity, ReferenceData, Urgency};

    fn costs(total: f64) -> CostSummary {
        CostSummary {
            materials: total * 0.6,
            labor: total * 0.4,
            additional: 0.0,
            total,
        }
    }

    #[test]
    fn v1_uses_equal_weights() {
        let data = ReferenceData::default();
        let input = gate();
        let pricing =
            compute_risk_and_price(&costs(1000.0), &context(&input, &data, EngineVersion::V1))
                .unwrap();
        assert!((pricing.risk.factor - 1.04).abs() < 1e-9);
        assert!((pricing.profit_margin - 0.306).abs() < 1e-9);
        assert!((pricing.final_price - 1306.0).abs() < 1e-6);
        assert!((pricing.profit - 306.0).abs() < 1e-6);
        assert_eq!(pricing.risk.components.len(), 5);
        assert_eq!(pricing.risk.components[0].category, "complexity");
    }

    #[test]
    fn v2_weights_urgency_and_complexity_heavier() {
        let data = ReferenceData::default();
        let input = gate();
        let pricing =
            compute_risk_and_price(&costs(10_000.0), &context(&input, &data, EngineVersion::V2))
                .unwrap();
        assert!((pricing.risk.factor - 1.05).abs() < 1e-9);
        // 0.30 + 0.005 + 0.05 + 0.01
        assert!((pricing.profit_margin - 0.365).abs() < 1e-9);
    }

    #[test]
    fn size_adjustment_is_clamped() {
        assert_eq!(size_adjustment(100.0), 0.05);
        assert!((size_adjustment(100_000.0) - 0.03).abs() < 1e-12);
        assert_eq!(size_adjustment(1e12), -0.05);
        assert_eq!(size_adjustment(0.0), 0.05);
    }

    #[test]
    fn margin_is_capped_for_worst_case_factors() {
        let data = ReferenceData::default();
        let input = crate::domain::ProjectInput {
            complexity: Complexity::VeryHigh,
            urgency: Urgency::Urgent,
            location: crate::domain::InstallationLocation::HighElevation,
            quality: crate::domain::MaterialQuality::Premium,
            finishing: crate::domain::FinishingType::Stainless,
            ..gate()
        };
        let v2 = compute_risk_and_price(&costs(500.0), &context(&input, &data, EngineVersion::V2))
            .unwrap();
        assert_eq!(v2.profit_margin, MAX_MARGIN);
        assert_eq!(v2.risk.level, RiskLevel::High);

        // mean risk 1.88 keeps the v1 margin just under the cap
        let v1 = compute_risk_and_price(&costs(500.0), &context(&input, &data, EngineVersion::V1))
            .unwrap();
        assert!((v1.profit_margin - 0.432).abs() < 1e-9);
    }

    #[test]
    fn taxes_follow_regime_rate() {
        let tax = TaxRegime {
            regime: "Lucro Presumido".to_string(),
            rate_percent: 11.33,
        };
        let estimate = compute_taxes(1000.0, &tax);
        assert!((estimate.amount - 113.3).abs() < 1e-9);
        assert!((estimate.price_with_taxes - 1113.3).abs() < 1e-9);
        assert_eq!(estimate.regime, "Lucro Presumido");
    }
}
