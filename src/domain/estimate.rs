//! Estimate result and saved-estimate types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{LaborRole, MaterialUnit};
use super::project::{EstimateRequest, ProjectInput, ProjectType};
use crate::estimator::EngineVersion;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub length: Option<f64>,
    pub area: f64,
    pub perimeter: f64,
    pub volume: f64,
}

impl From<&ProjectInput> for Dimensions {
    fn from(input: &ProjectInput) -> Self {
        Self {
            width: input.width,
            height: input.height,
            length: input.length,
            area: input.area(),
            perimeter: input.perimeter(),
            volume: input.volume(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialLine {
    pub name: String,
    pub quantity: f64,
    pub unit: MaterialUnit,
    pub unit_price: f64,
    pub total_price: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialEstimate {
    pub lines: Vec<MaterialLine>,
    pub total_cost: f64,
    pub total_weight: f64,
    pub truss_count: u32,
    pub purlin_count: u32,
    pub waste_factor: f64,
    pub wind_factor: f64,
    pub inclination_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaborLine {
    pub role: LaborRole,
    pub hours: f64,
    pub hourly_rate: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaborEstimate {
    pub lines: Vec<LaborLine>,
    pub total_hours: f64,
    pub total_cost: f64,
    pub efficiency_factor: f64,
    pub soil_factor: f64,
}

impl LaborEstimate {
    pub fn hours_for(&self, role: LaborRole) -> Option<f64> {
        self.lines.iter().find(|l| l.role == role).map(|l| l.hours)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdditionalCostKind {
    Automation,
    CustomDesign,
    Transport,
    /// ART, the technical responsibility filing
    RegulatoryFiling,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdditionalCost {
    pub kind: AdditionalCostKind,
    pub description: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdditionalCosts {
    pub items: Vec<AdditionalCost>,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn classify(factor: f64) -> Self {
        if factor < 1.2 {
            Self::Low
        } else if factor < 1.5 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskComponent {
    pub category: String,
    pub factor: f64,
    pub weight: f64,
    pub level: RiskLevel,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAnalysis {
    pub factor: f64,
    pub level: RiskLevel,
    pub components: Vec<RiskComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostSummary {
    pub materials: f64,
    pub labor: f64,
    pub additional: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaxEstimate {
    pub regime: String,
    pub rate_percent: f64,
    pub amount: f64,
    pub price_with_taxes: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    ProjectStart,
    MaterialPreparation,
    Fabrication,
    ProductionComplete,
    InstallationStart,
    InstallationComplete,
    Completion,
}

impl MilestoneKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProjectStart => "Início do Projeto",
            Self::MaterialPreparation => "Preparação de Materiais",
            Self::Fabrication => "Fabricação",
            Self::ProductionComplete => "Produção Concluída",
            Self::InstallationStart => "Início da Instalação",
            Self::InstallationComplete => "Instalação Concluída",
            Self::Completion => "Conclusão do Projeto",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Milestone {
    pub kind: MilestoneKind,
    pub name: String,
    pub date: NaiveDate,
    pub percentage: u8,
}

impl Milestone {
    pub fn new(kind: MilestoneKind, date: NaiveDate, percentage: u8) -> Self {
        Self {
            kind,
            name: kind.label().to_string(),
            date,
            percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    pub production_days: u32,
    pub installation_days: u32,
    pub total_days: u32,
    pub start_date: NaiveDate,
    pub production_end_date: NaiveDate,
    pub installation_end_date: Option<NaiveDate>,
    pub delivery_date: NaiveDate,
    pub milestones: Vec<Milestone>,
}

/// Computed estimate; never mutated after construction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimateResult {
    pub engine: EngineVersion,
    pub project_type: ProjectType,
    pub project_name: String,
    pub client_name: Option<String>,
    pub schedule_date: NaiveDate,
    pub dimensions: Dimensions,
    pub materials: MaterialEstimate,
    pub labor: LaborEstimate,
    pub additional_costs: AdditionalCosts,
    pub risk: RiskAnalysis,
    pub costs: CostSummary,
    pub profit_margin: f64,
    pub profit: f64,
    pub final_price: f64,
    pub taxes: TaxEstimate,
    pub timeline: Timeline,
}

/// Request DTO for calculating (and optionally saving) an estimate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalculateEstimateRequest {
    #[serde(default)]
    pub engine: Option<EngineVersion>,
    #[serde(flatten)]
    pub project: EstimateRequest,
}

/// Response DTO for a stored estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEstimateResponse {
    pub id: Uuid,
    pub project_name: String,
    pub client_name: Option<String>,
    pub project_type: ProjectType,
    pub engine: EngineVersion,
    pub final_price: f64,
    pub input: ProjectInput,
    pub estimate: EstimateResult,
    pub created_at: DateTime<Utc>,
}

/// List item DTO, without the full breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEstimateSummary {
    pub id: Uuid,
    pub project_name: String,
    pub client_name: Option<String>,
    pub project_type: ProjectType,
    pub engine: EngineVersion,
    pub final_price: f64,
    pub created_at: DateTime<Utc>,
}
