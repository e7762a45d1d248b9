//! Reference data for the estimator
//!
//! Material prices, labor rates, risk-factor tables, project-type
//! templates and the tax regime. The engine only reads this data; every
//! lookup of an absent key fails with a descriptive error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::project::{
    Complexity, FinishingType, InstallationLocation, MaterialQuality, ProjectType, Urgency,
};
use crate::estimator::EstimateError;

/// Catalog names the engine refers to directly
pub mod names {
    pub const GLASS: &str = "Vidro Temperado 8mm";
    pub const ROOF_TILE: &str = "Telha Trapezoidal TP40";
    pub const PAINT: &str = "Tinta (Galão)";
    pub const ELECTRODE: &str = "Eletrodo (kg)";
    pub const CUTTING_DISC: &str = "Disco de Corte";
    pub const FASTENERS: &str = "Parafusos e Fixadores";
    pub const SELF_DRILLING_SCREW: &str = "Parafuso Autobrocante";
    pub const GUTTERS: &str = "Calhas e Rufos";
    pub const AUTOMATION_MOTOR: &str = "Motor para Automação";
}

/// Unit of measure for a catalog material
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MaterialUnit {
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "m²", alias = "m2")]
    SquareMeter,
    #[serde(rename = "un")]
    Unit,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "l")]
    Liter,
}

impl MaterialUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::SquareMeter => "m²",
            Self::Unit => "un",
            Self::Kilogram => "kg",
            Self::Liter => "l",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "m" => Some(Self::Meter),
            "m²" | "m2" => Some(Self::SquareMeter),
            "un" => Some(Self::Unit),
            "kg" => Some(Self::Kilogram),
            "l" => Some(Self::Liter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialCatalogEntry {
    pub name: String,
    pub unit_price: f64,
    pub unit: MaterialUnit,
    /// Weight in kg per unit of measure
    pub unit_weight: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LaborRole {
    #[serde(alias = "serralheiro")]
    Fabricator,
    #[serde(alias = "soldador")]
    Welder,
    #[serde(alias = "pintor")]
    Painter,
    #[serde(alias = "ajudante")]
    Helper,
    #[serde(alias = "instalador")]
    Installer,
}

impl LaborRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fabricator => "fabricator",
            Self::Welder => "welder",
            Self::Painter => "painter",
            Self::Helper => "helper",
            Self::Installer => "installer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fabricator" => Some(Self::Fabricator),
            "welder" => Some(Self::Welder),
            "painter" => Some(Self::Painter),
            "helper" => Some(Self::Helper),
            "installer" => Some(Self::Installer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactor {
    pub factor: f64,
    pub description: String,
}

impl RiskFactor {
    fn new(factor: f64, description: &str) -> Self {
        Self {
            factor,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactorTable {
    pub complexity: BTreeMap<Complexity, RiskFactor>,
    pub location: BTreeMap<InstallationLocation, RiskFactor>,
    pub quality: BTreeMap<MaterialQuality, RiskFactor>,
    pub finishing: BTreeMap<FinishingType, RiskFactor>,
    pub urgency: BTreeMap<Urgency, RiskFactor>,
}

/// Per-type sizing constants and default materials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectTemplate {
    pub display_name: String,
    pub base_material_factor: f64,
    pub base_labor_factor: f64,
    pub base_timeline_days: f64,
    pub needs_length: bool,
    pub primary_material: String,
    pub secondary_material: String,
    pub closing_material: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxRegime {
    pub regime: String,
    pub rate_percent: f64,
}

impl Default for TaxRegime {
    fn default() -> Self {
        Self {
            regime: "ME - Simples Nacional".to_string(),
            rate_percent: 6.0,
        }
    }
}

/// Snapshot of everything the estimator looks up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceData {
    pub project_types: BTreeMap<ProjectType, ProjectTemplate>,
    pub materials: BTreeMap<String, MaterialCatalogEntry>,
    pub labor_rates: BTreeMap<LaborRole, f64>,
    pub risk_factors: RiskFactorTable,
    pub tax: TaxRegime,
}

fn lookup<'a, K, V>(
    map: &'a BTreeMap<K, V>,
    key: &K,
    category: &'static str,
) -> Result<&'a V, EstimateError>
where
    K: Ord + std::fmt::Debug,
{
    map.get(key).ok_or_else(|| EstimateError::UnknownRiskFactor {
        category,
        key: format!("{:?}", key),
    })
}

impl ReferenceData {
    pub fn material(&self, name: &str) -> Result<&MaterialCatalogEntry, EstimateError> {
        self.materials
            .get(name)
            .ok_or_else(|| EstimateError::UnknownMaterial(name.to_string()))
    }

    pub fn labor_rate(&self, role: LaborRole) -> Result<f64, EstimateError> {
        self.labor_rates
            .get(&role)
            .copied()
            .ok_or(EstimateError::UnknownLaborRole(role))
    }

    pub fn template(&self, project_type: ProjectType) -> Result<&ProjectTemplate, EstimateError> {
        self.project_types
            .get(&project_type)
            .ok_or(EstimateError::UnknownProjectType(project_type))
    }

    /// Whether the project type needs a length; unknown types are treated
    /// as needing one so validation stays strict.
    pub fn needs_length(&self, project_type: ProjectType) -> bool {
        self.project_types
            .get(&project_type)
            .map_or(true, |t| t.needs_length)
    }

    pub fn complexity(&self, key: Complexity) -> Result<&RiskFactor, EstimateError> {
        lookup(&self.risk_factors.complexity, &key, "complexity")
    }

    pub fn location(&self, key: InstallationLocation) -> Result<&RiskFactor, EstimateError> {
        lookup(&self.risk_factors.location, &key, "location")
    }

    pub fn quality(&self, key: MaterialQuality) -> Result<&RiskFactor, EstimateError> {
        lookup(&self.risk_factors.quality, &key, "quality")
    }

    pub fn finishing(&self, key: FinishingType) -> Result<&RiskFactor, EstimateError> {
        lookup(&self.risk_factors.finishing, &key, "finishing")
    }

    pub fn urgency(&self, key: Urgency) -> Result<&RiskFactor, EstimateError> {
        lookup(&self.risk_factors.urgency, &key, "urgency")
    }

    /// Insert or replace a material entry
    pub fn upsert_material(&mut self, entry: MaterialCatalogEntry) {
        self.materials.insert(entry.name.clone(), entry);
    }

    pub fn set_labor_rate(&mut self, role: LaborRole, hourly_rate: f64) {
        self.labor_rates.insert(role, hourly_rate);
    }
}

fn template(
    display_name: &str,
    base_material_factor: f64,
    base_labor_factor: f64,
    base_timeline_days: f64,
    needs_length: bool,
    materials: [&str; 3],
) -> ProjectTemplate {
    ProjectTemplate {
        display_name: display_name.to_string(),
        base_material_factor,
        base_labor_factor,
        base_timeline_days,
        needs_length,
        primary_material: materials[0].to_string(),
        secondary_material: materials[1].to_string(),
        closing_material: materials[2].to_string(),
    }
}

fn material(name: &str, unit_price: f64, unit: MaterialUnit, unit_weight: f64) -> MaterialCatalogEntry {
    MaterialCatalogEntry {
        name: name.to_string(),
        unit_price,
        unit,
        unit_weight,
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        use MaterialUnit::*;

        let project_types = BTreeMap::from([
            (
                ProjectType::Gate,
                template("Portão", 1.0, 1.0, 5.0, false, ["Metalon 30x30", "Metalon 20x20", "Chapa #18"]),
            ),
            (
                ProjectType::Fence,
                template(
                    "Grade",
                    0.8,
                    0.9,
                    3.0,
                    false,
                    ["Metalon 20x20", "Barra Chata 1\"x1/8\"", "Tubo Redondo 1/2\""],
                ),
            ),
            (
                ProjectType::Stairs,
                template(
                    "Escada",
                    1.2,
                    1.5,
                    7.0,
                    true,
                    ["Perfil U 100x40", "Chapa Xadrez 1/8\"", "Tubo Redondo 1.1/2\""],
                ),
            ),
            (
                ProjectType::Railing,
                template(
                    "Guarda-corpo",
                    1.1,
                    1.2,
                    4.0,
                    true,
                    ["Tubo Redondo 2\"", "Tubo Redondo 1\"", "Barra Chata 1\"x1/8\""],
                ),
            ),
            (
                ProjectType::Mezzanine,
                template(
                    "Mezanino",
                    1.5,
                    1.8,
                    12.0,
                    true,
                    ["Perfil I 150x15", "Chapa Xadrez 3/16\"", "Perfil U 100x40"],
                ),
            ),
            (
                ProjectType::Roof,
                template(
                    "Cobertura",
                    1.3,
                    1.4,
                    8.0,
                    true,
                    ["Metalon 40x60", "Metalon 30x30", "Telha Galvanizada"],
                ),
            ),
            (
                ProjectType::Structure,
                template(
                    "Estrutura Metálica",
                    1.4,
                    1.6,
                    15.0,
                    true,
                    ["Perfil I 150x15", "Perfil U 100x40", "Cantoneira 2\"x1/4\""],
                ),
            ),
            (
                ProjectType::Other,
                template(
                    "Outro",
                    1.2,
                    1.3,
                    10.0,
                    true,
                    ["Metalon 30x30", "Chapa #18", "Barra Chata 1\"x1/8\""],
                ),
            ),
        ]);

        let materials = [
            material("Metalon 20x20", 15.0, Meter, 0.8),
            material("Metalon 30x30", 25.0, Meter, 1.2),
            material("Metalon 40x40", 35.0, Meter, 1.6),
            material("Metalon 40x60", 48.0, Meter, 2.0),
            material("Tubo Redondo 1/2\"", 12.0, Meter, 0.6),
            material("Tubo Redondo 1\"", 18.0, Meter, 1.0),
            material("Tubo Redondo 1.1/2\"", 28.0, Meter, 1.5),
            material("Tubo Redondo 2\"", 42.0, Meter, 2.2),
            material("Barra Chata 1\"x1/8\"", 10.0, Meter, 0.7),
            material("Cantoneira 1\"x1/8\"", 14.0, Meter, 0.9),
            material("Cantoneira 2\"x1/4\"", 35.0, Meter, 2.5),
            material("Perfil U 100x40", 52.0, Meter, 3.0),
            material("Perfil I 150x15", 92.0, Meter, 5.0),
            material("Perfil Z 150x60x20", 55.0, Meter, 3.2),
            material("Perfil Z 200x75x20", 68.0, Meter, 4.0),
            material("Perfil U Enrijecido 100x40x17", 52.0, Meter, 3.2),
            material("Perfil U Enrijecido 150x60x20", 65.0, Meter, 4.5),
            material("Chapa #18", 195.0, SquareMeter, 12.0),
            material("Chapa #16", 235.0, SquareMeter, 15.0),
            material("Chapa Xadrez 1/8\"", 280.0, SquareMeter, 18.0),
            material("Chapa Xadrez 3/16\"", 380.0, SquareMeter, 25.0),
            material("Telha Galvanizada", 52.0, SquareMeter, 4.0),
            material(names::ROOF_TILE, 55.0, SquareMeter, 5.2),
            material("Telha Trapezoidal TP25", 48.0, SquareMeter, 4.3),
            material("Telha Termoacústica 30mm", 120.0, SquareMeter, 10.5),
            material("Telha Zipada", 85.0, SquareMeter, 6.2),
            material(names::GLASS, 320.0, SquareMeter, 20.0),
            material(names::PAINT, 120.0, Unit, 3.6),
            material("Primer Anticorrosivo", 85.0, Liter, 1.0),
            material("Tinta Esmalte Industrial", 95.0, Liter, 1.2),
            material(names::ELECTRODE, 25.0, Kilogram, 1.0),
            material(names::CUTTING_DISC, 12.0, Unit, 0.2),
            material(names::FASTENERS, 5.0, Unit, 0.1),
            material(names::SELF_DRILLING_SCREW, 0.8, Unit, 0.01),
            material("Parafuso Estrutural", 3.5, Unit, 0.05),
            material("Chumbador Mecânico", 8.5, Unit, 0.15),
            material("Chumbador Químico", 45.0, Unit, 0.5),
            material(names::GUTTERS, 35.0, Meter, 2.0),
            material(names::AUTOMATION_MOTOR, 850.0, Unit, 8.0),
        ]
        .into_iter()
        .map(|m| (m.name.clone(), m))
        .collect();

        let labor_rates = BTreeMap::from([
            (LaborRole::Fabricator, 35.0),
            (LaborRole::Welder, 45.0),
            (LaborRole::Painter, 30.0),
            (LaborRole::Installer, 40.0),
            (LaborRole::Helper, 20.0),
        ]);

        let risk_factors = RiskFactorTable {
            complexity: BTreeMap::from([
                (Complexity::Low, RiskFactor::new(1.0, "Projeto simples com baixa complexidade")),
                (Complexity::Medium, RiskFactor::new(1.2, "Projeto com complexidade moderada")),
                (Complexity::High, RiskFactor::new(1.5, "Projeto complexo com muitos detalhes")),
                (
                    Complexity::VeryHigh,
                    RiskFactor::new(2.0, "Projeto altamente complexo e personalizado"),
                ),
            ]),
            location: BTreeMap::from([
                (
                    InstallationLocation::Ground,
                    RiskFactor::new(1.0, "Instalação no térreo, fácil acesso"),
                ),
                (
                    InstallationLocation::LowElevation,
                    RiskFactor::new(1.2, "Instalação em altura baixa (até 3m)"),
                ),
                (
                    InstallationLocation::MediumElevation,
                    RiskFactor::new(1.5, "Instalação em altura média (3-6m)"),
                ),
                (
                    InstallationLocation::HighElevation,
                    RiskFactor::new(2.0, "Instalação em altura elevada (acima de 6m)"),
                ),
            ]),
            quality: BTreeMap::from([
                (MaterialQuality::Standard, RiskFactor::new(1.0, "Materiais de qualidade padrão")),
                (MaterialQuality::Superior, RiskFactor::new(1.3, "Materiais de qualidade superior")),
                (MaterialQuality::Premium, RiskFactor::new(1.6, "Materiais de qualidade premium")),
            ]),
            finishing: BTreeMap::from([
                (FinishingType::SimplePaint, RiskFactor::new(1.0, "Acabamento com pintura simples")),
                (
                    FinishingType::ElectrostaticPaint,
                    RiskFactor::new(1.3, "Acabamento com pintura eletrostática"),
                ),
                (FinishingType::Galvanized, RiskFactor::new(1.5, "Acabamento galvanizado")),
                (FinishingType::Stainless, RiskFactor::new(2.0, "Acabamento em aço inox")),
            ]),
            urgency: BTreeMap::from([
                (Urgency::Normal, RiskFactor::new(1.0, "Prazo normal de entrega")),
                (Urgency::Fast, RiskFactor::new(1.3, "Prazo reduzido (urgência moderada)")),
                (Urgency::Urgent, RiskFactor::new(1.8, "Prazo mínimo (urgência máxima)")),
            ]),
        };

        Self {
            project_types,
            materials,
            labor_rates,
            risk_factors,
            tax: TaxRegime::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_templates_reference_known_materials() {
        let data = ReferenceData::default();
        for (project_type, template) in &data.project_types {
            for name in [
                &template.primary_material,
                &template.secondary_material,
                &template.closing_material,
            ] {
                assert!(
                    data.material(name).is_ok(),
                    "{} template refers to missing material {}",
                    project_type,
                    name
                );
            }
        }
    }

    #[test]
    fn every_project_type_has_a_template() {
        let data = ReferenceData::default();
        for project_type in ProjectType::ALL {
            assert!(data.template(project_type).is_ok());
        }
        assert!(!data.needs_length(ProjectType::Gate));
        assert!(!data.needs_length(ProjectType::Fence));
        assert!(data.needs_length(ProjectType::Roof));
    }

    #[test]
    fn risk_factors_are_never_below_one() {
        let table = ReferenceData::default().risk_factors;
        let all = table
            .complexity
            .values()
            .chain(table.location.values())
            .chain(table.quality.values())
            .chain(table.finishing.values())
            .chain(table.urgency.values());
        for risk in all {
            assert!(risk.factor >= 1.0);
        }
    }

    #[test]
    fn missing_keys_fail_with_descriptive_errors() {
        let mut data = ReferenceData::default();
        let err = data.material("Unobtainium").unwrap_err();
        assert_eq!(err.to_string(), "unknown material: Unobtainium");

        data.labor_rates.remove(&LaborRole::Installer);
        assert!(matches!(
            data.labor_rate(LaborRole::Installer),
            Err(EstimateError::UnknownLaborRole(LaborRole::Installer))
        ));

        data.risk_factors.urgency.remove(&Urgency::Urgent);
        assert!(matches!(
            data.urgency(Urgency::Urgent),
            Err(EstimateError::UnknownRiskFactor { category: "urgency", .. })
        ));
    }

    #[test]
    fn reference_data_round_trips_through_json() {
        let data = ReferenceData::default();
        let json = serde_json::to_string(&data).unwrap();
        let back: ReferenceData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
