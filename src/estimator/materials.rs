//! Materials quantity and cost calculator

use crate::domain::{
    names, MaterialEstimate, MaterialLine, MaterialUnit, ProjectType, ReferenceData,
};

use super::{EngineVersion, EstimateContext, EstimateError};

/// Running bill of materials; weight accumulates so consumables can be
/// derived from it.
struct Bill<'a> {
    data: &'a ReferenceData,
    lines: Vec<MaterialLine>,
    total_cost: f64,
    total_weight: f64,
}

impl<'a> Bill<'a> {
    fn new(data: &'a ReferenceData) -> Self {
        Self {
            data,
            lines: Vec::new(),
            total_cost: 0.0,
            total_weight: 0.0,
        }
    }

    fn add(&mut self, name: &str, quantity: f64) -> Result<(), EstimateError> {
        let entry = self.data.material(name)?;
        let total_price = quantity * entry.unit_price;
        let weight = quantity * entry.unit_weight;

        self.lines.push(MaterialLine {
            name: entry.name.clone(),
            quantity,
            unit: entry.unit,
            unit_price: entry.unit_price,
            total_price,
            weight,
        });
        self.total_cost += total_price;
        self.total_weight += weight;
        Ok(())
    }

    fn unit_of(&self, name: &str) -> Result<MaterialUnit, EstimateError> {
        Ok(self.data.material(name)?.unit)
    }
}

/// Extra material per unit for large jobs, between 1.0 and 1.5.
pub fn dimension_factor(area: f64) -> f64 {
    ((area + 1.0).log10() * 0.5 + 1.0).clamp(1.0, 1.5)
}

/// Most trusses or purlins a single framed roof may carry
pub const MAX_FRAMING_MEMBERS: u32 = 10_000;

/// Truss and purlin counts for a framed roof.
///
/// Trusses repeat along the length; purlins run along each slope, with
/// the ridge purlin shared by both.
pub fn framing_counts(
    width: f64,
    length: f64,
    truss_spacing: f64,
    purlin_spacing: f64,
    pitch: f64,
) -> Result<(u32, u32), EstimateError> {
    let trusses = member_count("truss_spacing", length / truss_spacing)?;

    let half_span = width / 2.0;
    let rise = half_span * pitch;
    let slope_length = (half_span * half_span + rise * rise).sqrt();
    let purlins_per_side = member_count("purlin_spacing", slope_length / purlin_spacing)?;

    let purlins = purlins_per_side
        .checked_mul(2)
        .and_then(|n| n.checked_sub(1))
        .filter(|&n| n <= MAX_FRAMING_MEMBERS)
        .ok_or_else(|| too_many("purlin_spacing"))?;

    Ok((trusses, purlins))
}

/// Members needed to cover `bays` spacings, counting both ends.
fn member_count(field: &'static str, bays: f64) -> Result<u32, EstimateError> {
    let bays = bays.ceil();
    if !bays.is_finite() || bays < 0.0 || bays >= f64::from(MAX_FRAMING_MEMBERS) {
        return Err(too_many(field));
    }
    // In range, so the cast is exact
    Ok(bays as u32 + 1)
}

fn too_many(field: &'static str) -> EstimateError {
    EstimateError::InvalidValue {
        field,
        reason: format!("needs more than {} framing members", MAX_FRAMING_MEMBERS),
    }
}

pub fn estimate_materials(ctx: &EstimateContext<'_>) -> Result<MaterialEstimate, EstimateError> {
    match ctx.engine {
        EngineVersion::V1 => basic(ctx),
        EngineVersion::V2 => refined(ctx),
    }
}

fn basic(ctx: &EstimateContext<'_>) -> Result<MaterialEstimate, EstimateError> {
    let t = ctx.template;
    let area = ctx.area();
    let perimeter = ctx.perimeter();
    let length = ctx.length();
    let base = t.base_material_factor;
    let dim = dimension_factor(area);
    let quality = ctx.factors.quality;

    let mut bill = Bill::new(ctx.data);

    let primary = if t.needs_length {
        (perimeter * 1.5 + length * 2.0) * base * dim
    } else {
        perimeter * 1.5 * base * dim
    };
    bill.add(&t.primary_material, primary * quality)?;

    let secondary = if t.needs_length && length > 0.0 {
        (area * 0.5 + length * 1.2) * base * dim
    } else {
        area * 0.7 * base * dim
    };
    bill.add(&t.secondary_material, secondary * quality)?;

    let closing = match bill.unit_of(&t.closing_material)? {
        MaterialUnit::SquareMeter => area * 0.8 * base,
        MaterialUnit::Meter => perimeter * 0.8 * base,
        _ => (area * 2.0 * base).ceil(),
    };
    bill.add(&t.closing_material, closing * quality)?;

    if ctx.input.features.glass {
        bill.add(names::GLASS, area * 0.6)?;
    }

    // One gallon covers about 15 m²
    bill.add(names::PAINT, (area / 15.0).ceil())?;
    bill.add(names::ELECTRODE, bill.total_weight * 0.05)?;
    bill.add(names::CUTTING_DISC, (bill.total_weight / 50.0).ceil())?;
    bill.add(names::FASTENERS, (perimeter * 2.0).ceil())?;

    Ok(MaterialEstimate {
        lines: bill.lines,
        total_cost: bill.total_cost,
        total_weight: bill.total_weight,
        truss_count: 0,
        purlin_count: 0,
        waste_factor: 1.0,
        wind_factor: 1.0,
        inclination_factor: 1.0,
    })
}

fn refined(ctx: &EstimateContext<'_>) -> Result<MaterialEstimate, EstimateError> {
    let t = ctx.template;
    let adv = &ctx.input.advanced;
    let project_type = ctx.input.project_type;
    let framed = project_type.is_framed();

    let width = ctx.input.width;
    let area = ctx.area();
    let perimeter = ctx.perimeter();
    let length = ctx.length();
    let base = t.base_material_factor;
    let dim = dimension_factor(area);
    let quality = ctx.factors.quality;

    let waste_factor = 1.0 + adv.material_waste;
    let wind_factor = 1.0 + adv.wind_region.steps() * 0.1;
    let inclination_factor = 1.0 + adv.roof_pitch * 2.0;

    let (truss_count, purlin_count) = if framed {
        framing_counts(
            width,
            length,
            adv.truss_spacing,
            adv.purlin_spacing,
            adv.roof_pitch,
        )?
    } else {
        (0, 0)
    };

    let mut bill = Bill::new(ctx.data);

    let mut primary = if framed {
        f64::from(truss_count) * width * 1.5 * base * dim
    } else if t.needs_length && length > 0.0 {
        (perimeter * 1.5 + length * 2.0) * base * dim
    } else {
        perimeter * 1.5 * base * dim
    };
    primary *= quality * waste_factor;
    if framed {
        primary *= wind_factor;
    }
    bill.add(&t.primary_material, primary)?;

    let secondary = if framed {
        f64::from(purlin_count) * length * base * dim
    } else if t.needs_length && length > 0.0 {
        (area * 0.5 + length * 1.2) * base * dim
    } else {
        area * 0.7 * base * dim
    };
    bill.add(&t.secondary_material, secondary * quality * waste_factor)?;

    let (closing_name, closing) = if project_type == ProjectType::Roof {
        (names::ROOF_TILE, area * inclination_factor * waste_factor)
    } else if ctx.input.features.glass {
        (names::GLASS, area * 0.7 * waste_factor)
    } else if bill.unit_of(&t.closing_material)? == MaterialUnit::SquareMeter {
        (t.closing_material.as_str(), area * 0.9 * waste_factor)
    } else {
        (t.closing_material.as_str(), area * 0.5 * waste_factor)
    };
    bill.add(closing_name, closing * quality)?;

    for (name, ratio) in [
        (names::ELECTRODE, 0.05),
        (names::CUTTING_DISC, 0.02),
        (names::FASTENERS, 0.1),
    ] {
        bill.add(name, bill.total_weight * ratio * waste_factor)?;
    }

    if framed {
        bill.add(names::GUTTERS, length * 2.0)?;
        // six self-drilling screws per m² of roofing
        bill.add(names::SELF_DRILLING_SCREW, (area * 6.0).ceil())?;
    }

    if project_type != ProjectType::Structure {
        // about one litre per 10 kg of steel, 3.6 l gallons
        let litres = bill.total_weight / 10.0;
        bill.add(names::PAINT, (litres / 3.6).ceil())?;
    }

    Ok(MaterialEstimate {
        lines: bill.lines,
        total_cost: bill.total_cost,
        total_weight: bill.total_weight,
        truss_count,
        purlin_count,
        waste_factor,
        wind_factor,
        inclination_factor,
    })
}
