//! Estimation engine
//!
//! Pure calculation pipeline: a validated [`ProjectInput`] plus a
//! [`ReferenceData`] snapshot plus [`EstimateOptions`] yields an
//! [`EstimateResult`]. No I/O happens here; the schedule date is an
//! explicit option so the same inputs always give the same result.
//!
//! Two calculator generations exist. [`EngineVersion::V1`] is the
//! basic calculator with equal risk weights; [`EngineVersion::V2`] is
//! the refined calculator (structural spacing, waste, efficiency, soil
//! and wind) and is the default.

pub mod additional;
pub mod calendar;
pub mod error;
pub mod labor;
pub mod materials;
pub mod pricing;
pub mod timeline;

pub use error::EstimateError;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    CostSummary, Dimensions, EstimateResult, ProjectInput, ProjectTemplate, ReferenceData,
    MIN_MEMBER_SPACING,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineVersion {
    V1,
    #[default]
    V2,
}

impl EngineVersion {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "v1" | "1" | "1.0" | "basic" => Some(Self::V1),
            "v2" | "2" | "2.0" | "refined" => Some(Self::V2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl std::fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateOptions {
    pub engine: EngineVersion,
    /// Day the schedule is computed from; work starts the next business day
    pub today: NaiveDate,
}

/// Risk factors resolved from the reference tables for one input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFactors {
    pub complexity: f64,
    pub location: f64,
    pub quality: f64,
    pub finishing: f64,
    pub urgency: f64,
}

impl ResolvedFactors {
    pub fn resolve(input: &ProjectInput, data: &ReferenceData) -> Result<Self, EstimateError> {
        Ok(Self {
            complexity: data.complexity(input.complexity)?.factor,
            location: data.location(input.location)?.factor,
            quality: data.quality(input.quality)?.factor,
            finishing: data.finishing(input.finishing)?.factor,
            urgency: data.urgency(input.urgency)?.factor,
        })
    }
}

/// Everything a sub-calculator needs about the job
pub struct EstimateContext<'a> {
    pub input: &'a ProjectInput,
    pub template: &'a ProjectTemplate,
    pub factors: ResolvedFactors,
    pub data: &'a ReferenceData,
    pub engine: EngineVersion,
}

impl EstimateContext<'_> {
    pub fn area(&self) -> f64 {
        self.input.area()
    }

    pub fn perimeter(&self) -> f64 {
        self.input.perimeter()
    }

    /// Length in metres; zero for flat project types.
    pub fn length(&self) -> f64 {
        if self.template.needs_length {
            self.input.length_or_zero()
        } else {
            0.0
        }
    }

    pub fn volume(&self) -> f64 {
        if self.template.needs_length {
            self.input.volume()
        } else {
            0.0
        }
    }
}

fn check(field: &'static str, value: f64, ok: bool, expected: &str) -> Result<(), EstimateError> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(EstimateError::InvalidValue {
            field,
            reason: format!("must be {}, got {}", expected, value),
        })
    }
}

/// Reject inputs the calculators cannot price.
pub fn validate(input: &ProjectInput, template: &ProjectTemplate) -> Result<(), EstimateError> {
    check("width", input.width, input.width > 0.0, "a positive number")?;
    check("height", input.height, input.height > 0.0, "a positive number")?;
    if template.needs_length {
        let length = input.length.ok_or(EstimateError::MissingField("length"))?;
        check("length", length, length > 0.0, "a positive number")?;
    }

    let adv = &input.advanced;
    let min_spacing = format!("at least {} m", MIN_MEMBER_SPACING);
    check(
        "truss_spacing",
        adv.truss_spacing,
        adv.truss_spacing >= MIN_MEMBER_SPACING,
        &min_spacing,
    )?;
    check(
        "purlin_spacing",
        adv.purlin_spacing,
        adv.purlin_spacing >= MIN_MEMBER_SPACING,
        &min_spacing,
    )?;
    check(
        "material_waste",
        adv.material_waste,
        (0.0..=1.0).contains(&adv.material_waste),
        "between 0 and 1",
    )?;
    check(
        "labor_efficiency",
        adv.labor_efficiency,
        adv.labor_efficiency >= 0.01 && adv.labor_efficiency <= 1.0,
        "between 0.01 and 1",
    )?;
    check(
        "roof_pitch",
        adv.roof_pitch,
        (0.0..=1.0).contains(&adv.roof_pitch),
        "between 0 and 1",
    )
}

/// Run the full pipeline for one project.
pub fn calculate_estimate(
    input: &ProjectInput,
    data: &ReferenceData,
    options: EstimateOptions,
) -> Result<EstimateResult, EstimateError> {
    let template = data.template(input.project_type)?;
    validate(input, template)?;

    let ctx = EstimateContext {
        input,
        template,
        factors: ResolvedFactors::resolve(input, data)?,
        data,
        engine: options.engine,
    };

    let materials = materials::estimate_materials(&ctx)?;
    let labor = labor::estimate_labor(&ctx)?;
    let additional_costs = additional::estimate_additional_costs(&ctx)?;
    let timeline = timeline::estimate_timeline(&ctx, options.today);

    let costs = CostSummary {
        materials: materials.total_cost,
        labor: labor.total_cost,
        additional: additional_costs.total_cost,
        total: materials.total_cost + labor.total_cost + additional_costs.total_cost,
    };
    let pricing = pricing::compute_risk_and_price(&costs, &ctx)?;
    let taxes = pricing::compute_taxes(pricing.final_price, &data.tax);

    tracing::debug!(
        engine = %options.engine,
        project_type = %input.project_type,
        area = input.area(),
        materials_cost = costs.materials,
        labor_cost = costs.labor,
        risk_factor = pricing.risk.factor,
        profit_margin = pricing.profit_margin,
        final_price = pricing.final_price,
        total_days = timeline.total_days,
        "Estimate calculated"
    );

    Ok(EstimateResult {
        engine: options.engine,
        project_type: input.project_type,
        project_name: input.name.clone(),
        client_name: input.client_name.clone(),
        schedule_date: options.today,
        dimensions: Dimensions::from(input),
        materials,
        labor,
        additional_costs,
        risk: pricing.risk,
        costs,
        profit_margin: pricing.profit_margin,
        profit: pricing.profit,
        final_price: pricing.final_price,
        taxes,
        timeline,
    })
}
