//! Labor hours and cost calculator

use crate::domain::{LaborEstimate, LaborLine, LaborRole};

use super::{EngineVersion, EstimateContext, EstimateError};

const SPLIT_WORKSHOP: [(LaborRole, f64); 4] = [
    (LaborRole::Fabricator, 0.4),
    (LaborRole::Welder, 0.3),
    (LaborRole::Painter, 0.1),
    (LaborRole::Helper, 0.2),
];

const SPLIT_WITH_INSTALLATION: [(LaborRole, f64); 5] = [
    (LaborRole::Fabricator, 0.3),
    (LaborRole::Welder, 0.2),
    (LaborRole::Painter, 0.1),
    (LaborRole::Helper, 0.2),
    (LaborRole::Installer, 0.2),
];

const CUSTOM_DESIGN_FACTOR: f64 = 1.3;

pub fn estimate_labor(ctx: &EstimateContext<'_>) -> Result<LaborEstimate, EstimateError> {
    let hours = match ctx.engine {
        EngineVersion::V1 => basic_hours(ctx),
        EngineVersion::V2 => refined_hours(ctx),
    };

    let mut lines = Vec::with_capacity(hours.len());
    for (role, role_hours) in hours {
        let hourly_rate = ctx.data.labor_rate(role)?;
        lines.push(LaborLine {
            role,
            hours: role_hours,
            hourly_rate,
            cost: role_hours * hourly_rate,
        });
    }

    let (efficiency_factor, soil_factor) = match ctx.engine {
        EngineVersion::V1 => (1.0, 1.0),
        EngineVersion::V2 => (
            1.0 / ctx.input.advanced.labor_efficiency,
            ctx.input.advanced.soil.factor(),
        ),
    };

    Ok(LaborEstimate {
        total_hours: lines.iter().map(|l| l.hours).sum(),
        total_cost: lines.iter().map(|l| l.cost).sum(),
        lines,
        efficiency_factor,
        soil_factor,
    })
}

/// Scale shared by every role; large jobs get cheaper per m².
pub fn size_factor(area: f64) -> f64 {
    (1.0 - (area + 1.0).log10() * 0.1).clamp(0.7, 1.0)
}

fn basic_hours(ctx: &EstimateContext<'_>) -> Vec<(LaborRole, f64)> {
    let area = ctx.area();
    let base = ctx.template.base_labor_factor;
    let size = size_factor(area);
    let f = &ctx.factors;

    let mut fabricator = area * 1.5 * base * size * f.complexity;
    if ctx.input.features.custom_design {
        fabricator *= CUSTOM_DESIGN_FACTOR;
    }
    let welder = area * 0.8 * base * size * f.complexity;
    let painter = area * 0.5 * base * size;
    let helper = (fabricator + welder) * 0.7;

    let mut hours = vec![
        (LaborRole::Fabricator, fabricator),
        (LaborRole::Welder, welder),
        (LaborRole::Painter, painter),
        (LaborRole::Helper, helper),
    ];
    if ctx.input.features.installation_included {
        hours.push((LaborRole::Installer, area * 0.7 * base * f.location));
    }
    hours
}

fn refined_hours(ctx: &EstimateContext<'_>) -> Vec<(LaborRole, f64)> {
    let adv = &ctx.input.advanced;
    let volume = ctx.volume();

    let mut total = if volume > 0.0 {
        volume.sqrt() * 8.0
    } else {
        ctx.area().sqrt() * 5.0
    };
    total *= ctx.template.base_labor_factor * ctx.factors.complexity * ctx.factors.location
        / adv.labor_efficiency;
    if ctx.input.features.custom_design {
        total *= CUSTOM_DESIGN_FACTOR;
    }

    if ctx.input.features.installation_included {
        total *= 1.3 * adv.soil.factor();
        SPLIT_WITH_INSTALLATION
            .iter()
            .map(|&(role, share)| (role, total * share))
            .collect()
    } else {
        SPLIT_WORKSHOP
            .iter()
            .map(|&(role, share)| (role, total * share))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::{ReferenceData, SoilType};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn size_factor_is_bounded() {
        assert_eq!(size_factor(0.0), 1.0);
        assert_eq!(size_factor(1e6), 0.7);
        let mid = size_factor(6.0);
        assert!(mid > 0.7 && mid < 1.0);
    }

    #[test]
    fn v1_gate_roles() {
        let data = ReferenceData::default();
        let input = gate();
        let labor = estimate_labor(&context(&input, &data, EngineVersion::V1)).unwrap();

        let size = size_factor(6.0);
        let fabricator = 6.0 * 1.5 * size * 1.2;
        let welder = 6.0 * 0.8 * size * 1.2;
        assert!(close(labor.hours_for(LaborRole::Fabricator).unwrap(), fabricator));
        assert!(close(labor.hours_for(LaborRole::Welder).unwrap(), welder));
        assert!(close(labor.hours_for(LaborRole::Painter).unwrap(), 6.0 * 0.5 * size));
        assert!(close(
            labor.hours_for(LaborRole::Helper).unwrap(),
            (fabricator + welder) * 0.7
        ));
        assert_eq!(labor.hours_for(LaborRole::Installer), None);

        let fabricator_line = &labor.lines[0];
        assert_eq!(fabricator_line.hourly_rate, 35.0);
        assert!(close(fabricator_line.cost, fabricator * 35.0));
    }

    #[test]
    fn v2_splits_workshop_hours() {
        let data = ReferenceData::default();
        let input = gate();
        let labor = estimate_labor(&context(&input, &data, EngineVersion::V2)).unwrap();

        let total = 6f64.sqrt() * 5.0 * 1.2 / 0.85;
        assert!(close(labor.total_hours, total));
        assert!(close(labor.hours_for(LaborRole::Fabricator).unwrap(), total * 0.4));
        assert!(close(labor.hours_for(LaborRole::Welder).unwrap(), total * 0.3));
        assert_eq!(labor.hours_for(LaborRole::Installer), None);
        assert!(close(labor.efficiency_factor, 1.0 / 0.85));
    }

    #[test]
    fn v2_installation_uses_volume_and_soil() {
        let data = ReferenceData::default();
        let mut input = roof();
        input.features.installation_included = true;
        input.advanced.soil = SoilType::Rocky;
        let labor = estimate_labor(&context(&input, &data, EngineVersion::V2)).unwrap();

        let volume: f64 = 10.0 * 4.0 * 20.0;
        let total = volume.sqrt() * 8.0 * 1.4 * 1.2 / 0.85 * 1.3 * 1.5;
        assert!(close(labor.total_hours, total));
        assert!(close(labor.hours_for(LaborRole::Installer).unwrap(), total * 0.2));
        assert!(close(labor.hours_for(LaborRole::Fabricator).unwrap(), total * 0.3));
        assert_eq!(labor.soil_factor, 1.5);
    }

    #[test]
    fn lower_efficiency_means_more_hours() {
        let data = ReferenceData::default();
        let efficient = gate();
        let mut sluggish = gate();
        sluggish.advanced.labor_efficiency = 0.5;

        let a = estimate_labor(&context(&efficient, &data, EngineVersion::V2)).unwrap();
        let b = estimate_labor(&context(&sluggish, &data, EngineVersion::V2)).unwrap();
        assert!(b.total_hours > a.total_hours);
    }

    #[test]
    fn missing_rate_is_reported() {
        let mut data = ReferenceData::default();
        data.labor_rates.remove(&LaborRole::Painter);
        let input = gate();
        let err = estimate_labor(&context(&input, &data, EngineVersion::V2)).unwrap_err();
        assert_eq!(err, EstimateError::UnknownLaborRole(LaborRole::Painter));
    }
}
