//! Project input domain types
//!
//! The parameters of a metalwork job as the estimator consumes them, plus
//! the loosely-typed request DTO they are validated from.

use serde::{Deserialize, Serialize};

use crate::estimator::EstimateError;

/// Kind of metalwork project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[serde(alias = "portao")]
    Gate,
    #[serde(alias = "grade")]
    Fence,
    #[serde(alias = "escada")]
    Stairs,
    #[serde(alias = "guarda-corpo")]
    Railing,
    #[serde(alias = "mezanino")]
    Mezzanine,
    #[serde(alias = "cobertura")]
    Roof,
    #[serde(alias = "estrutura")]
    Structure,
    #[serde(alias = "outro")]
    Other,
}

impl ProjectType {
    pub const ALL: [ProjectType; 8] = [
        ProjectType::Gate,
        ProjectType::Fence,
        ProjectType::Stairs,
        ProjectType::Railing,
        ProjectType::Mezzanine,
        ProjectType::Roof,
        ProjectType::Structure,
        ProjectType::Other,
    ];

    /// Roofs and steel structures are sized from trusses and purlins.
    pub fn is_framed(&self) -> bool {
        matches!(self, Self::Roof | Self::Structure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gate => "gate",
            Self::Fence => "fence",
            Self::Stairs => "stairs",
            Self::Railing => "railing",
            Self::Mezzanine => "mezzanine",
            Self::Roof => "roof",
            Self::Structure => "structure",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    #[serde(alias = "baixa")]
    Low,
    #[default]
    #[serde(alias = "media")]
    Medium,
    #[serde(alias = "alta")]
    High,
    #[serde(alias = "muito-alta")]
    VeryHigh,
}

impl Complexity {
    pub const ALL: [Complexity; 4] = [
        Complexity::Low,
        Complexity::Medium,
        Complexity::High,
        Complexity::VeryHigh,
    ];
}

/// Elevation of the installation site
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstallationLocation {
    #[default]
    #[serde(alias = "terreo")]
    Ground,
    #[serde(alias = "altura-baixa")]
    LowElevation,
    #[serde(alias = "altura-media")]
    MediumElevation,
    #[serde(alias = "altura-alta")]
    HighElevation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaterialQuality {
    #[default]
    #[serde(alias = "padrao")]
    Standard,
    Superior,
    Premium,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinishingType {
    #[default]
    #[serde(alias = "pintura-simples")]
    SimplePaint,
    #[serde(alias = "pintura-eletrostatica")]
    ElectrostaticPaint,
    #[serde(alias = "galvanizado")]
    Galvanized,
    #[serde(alias = "inox")]
    Stainless,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Normal,
    #[serde(alias = "rapido")]
    Fast,
    #[serde(alias = "urgente")]
    Urgent,
}

/// Terrain roughness category (NBR 6123)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TerrainCategory {
    A,
    #[default]
    B,
    C,
    D,
    E,
}

/// Soil at the installation site, affects anchoring work
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    #[serde(alias = "rochoso")]
    Rocky,
    #[default]
    #[serde(alias = "firme")]
    Firm,
    Normal,
    #[serde(alias = "mole")]
    Soft,
    #[serde(alias = "arenoso")]
    Sandy,
}

impl SoilType {
    pub fn factor(&self) -> f64 {
        match self {
            Self::Rocky => 1.5,
            Self::Firm => 1.0,
            Self::Normal => 1.2,
            Self::Soft => 1.3,
            Self::Sandy => 1.4,
        }
    }
}

/// Basic wind speed region (NBR 6123), 1 through 5
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct WindRegion(u8);

impl WindRegion {
    pub fn new(region: u8) -> Option<Self> {
        (1..=5).contains(&region).then_some(Self(region))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Steps above region I, the unit the wind multipliers scale by.
    pub fn steps(&self) -> f64 {
        f64::from(self.0 - 1)
    }
}

impl Default for WindRegion {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for WindRegion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("wind region must be between 1 and 5, got {}", value))
    }
}

impl From<WindRegion> for u8 {
    fn from(region: WindRegion) -> Self {
        region.0
    }
}

/// Optional feature flags
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProjectFeatures {
    #[serde(default)]
    pub automation: bool,
    #[serde(default)]
    pub glass: bool,
    #[serde(default)]
    pub custom_design: bool,
    #[serde(default)]
    pub installation_included: bool,
}

/// Closest truss or purlin spacing accepted, in metres
pub const MIN_MEMBER_SPACING: f64 = 0.1;

/// Structural parameters, stored as fractions (0.10 = 10%)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AdvancedParams {
    pub truss_spacing: f64,
    pub purlin_spacing: f64,
    pub material_waste: f64,
    pub labor_efficiency: f64,
    pub roof_pitch: f64,
    pub wind_region: WindRegion,
    pub terrain: TerrainCategory,
    pub soil: SoilType,
}

impl Default for AdvancedParams {
    fn default() -> Self {
        Self {
            truss_spacing: 4.5,
            purlin_spacing: 1.8,
            material_waste: 0.10,
            labor_efficiency: 0.85,
            roof_pitch: 0.10,
            wind_region: WindRegion::default(),
            terrain: TerrainCategory::default(),
            soil: SoilType::default(),
        }
    }
}

/// Validated project parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectInput {
    pub project_type: ProjectType,
    pub name: String,
    pub client_name: Option<String>,
    pub width: f64,
    pub height: f64,
    pub length: Option<f64>,
    pub complexity: Complexity,
    pub location: InstallationLocation,
    pub quality: MaterialQuality,
    pub finishing: FinishingType,
    pub urgency: Urgency,
    pub features: ProjectFeatures,
    pub notes: Option<String>,
    pub advanced: AdvancedParams,
}

impl ProjectInput {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width + self.height)
    }

    pub fn length_or_zero(&self) -> f64 {
        self.length.unwrap_or(0.0)
    }

    pub fn volume(&self) -> f64 {
        match self.length {
            Some(length) if length > 0.0 => self.width * self.height * length,
            _ => 0.0,
        }
    }
}

/// Advanced parameters as sent by clients, percentages as whole numbers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvancedParamsRequest {
    #[serde(default)]
    pub truss_spacing: Option<f64>,
    #[serde(default)]
    pub purlin_spacing: Option<f64>,
    #[serde(default)]
    pub material_waste_percent: Option<f64>,
    #[serde(default)]
    pub labor_efficiency_percent: Option<f64>,
    #[serde(default)]
    pub roof_pitch_percent: Option<f64>,
    #[serde(default)]
    pub wind_region: Option<WindRegion>,
    #[serde(default)]
    pub terrain: Option<TerrainCategory>,
    #[serde(default)]
    pub soil: Option<SoilType>,
}

/// Request DTO for an estimate
///
/// Every field is optional on the wire so a missing value surfaces as a
/// named validation error instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub project_type: Option<ProjectType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub complexity: Option<Complexity>,
    #[serde(default)]
    pub location: Option<InstallationLocation>,
    #[serde(default)]
    pub quality: Option<MaterialQuality>,
    #[serde(default)]
    pub finishing: Option<FinishingType>,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub features: ProjectFeatures,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub advanced: AdvancedParamsRequest,
}

impl EstimateRequest {
    /// Check required fields and ranges, producing a `ProjectInput`.
    ///
    /// `needs_length` comes from the project-type template in the
    /// reference data.
    pub fn validate(
        self,
        needs_length: impl Fn(ProjectType) -> bool,
    ) -> Result<ProjectInput, EstimateError> {
        let project_type = self
            .project_type
            .ok_or(EstimateError::MissingField("project_type"))?;

        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(EstimateError::MissingField("name"))?;

        let width = positive("width", self.width)?;
        let height = positive("height", self.height)?;

        // Flat types have no depth; a stray length is dropped.
        let length = if needs_length(project_type) {
            Some(positive("length", self.length)?)
        } else {
            None
        };

        let defaults = AdvancedParams::default();
        let adv = self.advanced;
        let advanced = AdvancedParams {
            truss_spacing: spacing("truss_spacing", adv.truss_spacing, defaults.truss_spacing)?,
            purlin_spacing: spacing(
                "purlin_spacing",
                adv.purlin_spacing,
                defaults.purlin_spacing,
            )?,
            material_waste: percent_in_range(
                "material_waste_percent",
                adv.material_waste_percent,
                defaults.material_waste,
                0.0..=100.0,
            )?,
            labor_efficiency: percent_in_range(
                "labor_efficiency_percent",
                adv.labor_efficiency_percent,
                defaults.labor_efficiency,
                1.0..=100.0,
            )?,
            roof_pitch: percent_in_range(
                "roof_pitch_percent",
                adv.roof_pitch_percent,
                defaults.roof_pitch,
                0.0..=100.0,
            )?,
            wind_region: adv.wind_region.unwrap_or(defaults.wind_region),
            terrain: adv.terrain.unwrap_or(defaults.terrain),
            soil: adv.soil.unwrap_or(defaults.soil),
        };

        Ok(ProjectInput {
            project_type,
            name,
            client_name: self.client_name.filter(|c| !c.trim().is_empty()),
            width,
            height,
            length,
            complexity: self.complexity.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            quality: self.quality.unwrap_or_default(),
            finishing: self.finishing.unwrap_or_default(),
            urgency: self.urgency.unwrap_or_default(),
            features: self.features,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            advanced,
        })
    }
}

fn positive(field: &'static str, value: Option<f64>) -> Result<f64, EstimateError> {
    let value = value.ok_or(EstimateError::MissingField(field))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(EstimateError::InvalidValue {
            field,
            reason: format!("must be a positive number, got {}", value),
        });
    }
    Ok(value)
}

fn spacing(field: &'static str, value: Option<f64>, default: f64) -> Result<f64, EstimateError> {
    let Some(value) = value else {
        return Ok(default);
    };
    if !value.is_finite() || value < MIN_MEMBER_SPACING {
        return Err(EstimateError::InvalidValue {
            field,
            reason: format!("must be at least {} m, got {}", MIN_MEMBER_SPACING, value),
        });
    }
    Ok(value)
}

fn percent_in_range(
    field: &'static str,
    value: Option<f64>,
    default: f64,
    range: std::ops::RangeInclusive<f64>,
) -> Result<f64, EstimateError> {
    let Some(percent) = value else {
        return Ok(default);
    };
    if !percent.is_finite() || !range.contains(&percent) {
        return Err(EstimateError::InvalidValue {
            field,
            reason: format!(
                "must be between {} and {}, got {}",
                range.start(),
                range.end(),
                percent
            ),
        });
    }
    Ok(percent / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_request() -> EstimateRequest {
        EstimateRequest {
            project_type: Some(ProjectType::Gate),
            name: Some("Portão Residencial".to_string()),
            width: Some(3.0),
            height: Some(2.0),
            ..Default::default()
        }
    }

    fn needs_length(t: ProjectType) -> bool {
        !matches!(t, ProjectType::Gate | ProjectType::Fence)
    }

    #[test]
    fn validate_applies_defaults() {
        let input = gate_request().validate(needs_length).unwrap();
        assert_eq!(input.complexity, Complexity::Medium);
        assert_eq!(input.location, InstallationLocation::Ground);
        assert_eq!(input.length, None);
        assert_eq!(input.advanced, AdvancedParams::default());
        assert_eq!(input.area(), 6.0);
        assert_eq!(input.perimeter(), 10.0);
        assert_eq!(input.volume(), 0.0);
    }

    #[test]
    fn validate_rejects_zero_width() {
        let mut req = gate_request();
        req.width = Some(0.0);
        let err = req.validate(needs_length).unwrap_err();
        assert!(matches!(err, EstimateError::InvalidValue { field: "width", .. }));
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut req = gate_request();
        req.project_type = None;
        assert!(matches!(
            req.validate(needs_length),
            Err(EstimateError::MissingField("project_type"))
        ));

        let mut req = gate_request();
        req.height = None;
        assert!(matches!(
            req.validate(needs_length),
            Err(EstimateError::MissingField("height"))
        ));

        let mut req = gate_request();
        req.name = Some("   ".to_string());
        assert!(matches!(
            req.validate(needs_length),
            Err(EstimateError::MissingField("name"))
        ));
    }

    #[test]
    fn validate_requires_length_for_roofs() {
        let mut req = gate_request();
        req.project_type = Some(ProjectType::Roof);
        assert!(matches!(
            req.clone().validate(needs_length),
            Err(EstimateError::MissingField("length"))
        ));

        req.length = Some(20.0);
        let input = req.validate(needs_length).unwrap();
        assert_eq!(input.length, Some(20.0));
        assert_eq!(input.volume(), 120.0);
    }

    #[test]
    fn validate_rejects_tiny_member_spacing() {
        let mut req = gate_request();
        req.project_type = Some(ProjectType::Roof);
        req.width = Some(10.0);
        req.length = Some(20.0);

        let mut trusses = req.clone();
        trusses.advanced.truss_spacing = Some(1e-9);
        assert!(matches!(
            trusses.validate(needs_length),
            Err(EstimateError::InvalidValue { field: "truss_spacing", .. })
        ));

        let mut purlins = req.clone();
        purlins.advanced.purlin_spacing = Some(1e-9);
        assert!(matches!(
            purlins.validate(needs_length),
            Err(EstimateError::InvalidValue { field: "purlin_spacing", .. })
        ));

        req.advanced.truss_spacing = Some(MIN_MEMBER_SPACING);
        assert!(req.validate(needs_length).is_ok());
    }

    #[test]
    fn validate_converts_percentages() {
        let mut req = gate_request();
        req.advanced.material_waste_percent = Some(15.0);
        req.advanced.labor_efficiency_percent = Some(70.0);
        let input = req.validate(needs_length).unwrap();
        assert!((input.advanced.material_waste - 0.15).abs() < 1e-12);
        assert!((input.advanced.labor_efficiency - 0.70).abs() < 1e-12);

        let mut req = gate_request();
        req.advanced.labor_efficiency_percent = Some(0.0);
        assert!(req.validate(needs_length).is_err());
    }

    #[test]
    fn legacy_values_deserialize() {
        let req: EstimateRequest = serde_json::from_value(serde_json::json!({
            "project_type": "cobertura",
            "name": "Galpão",
            "width": 10.0,
            "height": 4.0,
            "length": 20.0,
            "complexity": "muito-alta",
            "location": "altura-media",
            "finishing": "galvanizado",
            "urgency": "urgente",
            "advanced": { "wind_region": 5, "soil": "arenoso", "terrain": "C" }
        }))
        .unwrap();

        let input = req.validate(needs_length).unwrap();
        assert_eq!(input.project_type, ProjectType::Roof);
        assert_eq!(input.complexity, Complexity::VeryHigh);
        assert_eq!(input.location, InstallationLocation::MediumElevation);
        assert_eq!(input.advanced.wind_region.get(), 5);
        assert_eq!(input.advanced.soil, SoilType::Sandy);
        assert_eq!(input.advanced.terrain, TerrainCategory::C);
    }

    #[test]
    fn wind_region_out_of_range_is_rejected() {
        let parsed: Result<EstimateRequest, _> = serde_json::from_value(serde_json::json!({
            "advanced": { "wind_region": 6 }
        }));
        assert!(parsed.is_err());
    }
}
