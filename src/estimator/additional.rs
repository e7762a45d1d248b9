//! Costs outside materials and labor

use crate::domain::{names, AdditionalCost, AdditionalCostKind, AdditionalCosts};

use super::{EstimateContext, EstimateError};

const DESIGN_RATE_PER_M2: f64 = 50.0;
const TRANSPORT_BASE: f64 = 200.0;
const TRANSPORT_PER_M2: f64 = 10.0;
const ART_FEE: f64 = 350.0;
/// Above this area a technical responsibility filing is always required
const ART_AREA_THRESHOLD: f64 = 20.0;

pub fn estimate_additional_costs(
    ctx: &EstimateContext<'_>,
) -> Result<AdditionalCosts, EstimateError> {
    let area = ctx.area();
    let features = &ctx.input.features;
    let mut items = Vec::new();

    if features.automation {
        let motor = ctx.data.material(names::AUTOMATION_MOTOR)?;
        // one motor per 10 m² of moving panel
        let motors = (area / 10.0).ceil();
        items.push(AdditionalCost {
            kind: AdditionalCostKind::Automation,
            description: format!("{} motor(es) para automação", motors),
            cost: motors * motor.unit_price,
        });
    }

    if features.custom_design {
        items.push(AdditionalCost {
            kind: AdditionalCostKind::CustomDesign,
            description: "Projeto personalizado".to_string(),
            cost: area * DESIGN_RATE_PER_M2 * ctx.factors.finishing,
        });
    }

    items.push(AdditionalCost {
        kind: AdditionalCostKind::Transport,
        description: "Transporte de materiais".to_string(),
        cost: TRANSPORT_BASE + area * TRANSPORT_PER_M2,
    });

    if area > ART_AREA_THRESHOLD || features.installation_included {
        items.push(AdditionalCost {
            kind: AdditionalCostKind::RegulatoryFiling,
            description: "ART - Anotação de Responsabilidade Técnica".to_string(),
            cost: ART_FEE,
        });
    }

    Ok(AdditionalCosts {
        total_cost: items.iter().map(|i| i.cost).sum(),
        items,
    })
}
