//! Shared reference data with persisted price overrides.
//!
//! Built-in reference data is the baseline; rows in `material_prices` and
//! `labor_rates` replace individual entries. Readers hold the read lock
//! for a whole calculation, so an update is seen entirely or not at all.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{LaborRole, MaterialCatalogEntry, MaterialUnit, ReferenceData};

#[derive(Debug, sqlx::FromRow)]
pub struct MaterialPriceRow {
    pub name: String,
    pub unit: String,
    pub unit_price: Decimal,
    pub unit_weight: f64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct LaborRateRow {
    pub role: String,
    pub hourly_rate: Decimal,
}

pub struct CatalogStore {
    data: RwLock<ReferenceData>,
    revision: AtomicU64,
}

impl CatalogStore {
    pub fn new(data: ReferenceData) -> Self {
        Self {
            data: RwLock::new(data),
            revision: AtomicU64::new(0),
        }
    }

    /// Built-in reference data plus every override stored in the database
    pub async fn load(pool: &PgPool, mut base: ReferenceData) -> Result<Self> {
        let materials = sqlx::query_as::<_, MaterialPriceRow>(
            "SELECT name, unit, unit_price, unit_weight FROM material_prices",
        )
        .fetch_all(pool)
        .await
        .context("Failed to load material price overrides")?;

        let labor = sqlx::query_as::<_, LaborRateRow>("SELECT role, hourly_rate FROM labor_rates")
            .fetch_all(pool)
            .await
            .context("Failed to load labor rate overrides")?;

        let applied = apply_overrides(&mut base, materials, labor);
        tracing::info!(overrides = applied, "Reference data loaded");

        Ok(Self::new(base))
    }

    /// Run `f` against a consistent snapshot and its revision.
    pub fn read<R>(&self, f: impl FnOnce(&ReferenceData, u64) -> R) -> R {
        let guard = self.data.read();
        f(&guard, self.revision.load(Ordering::Acquire))
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Apply a change under the write lock; returns the new revision.
    pub fn update(&self, f: impl FnOnce(&mut ReferenceData)) -> u64 {
        let mut guard = self.data.write();
        f(&mut guard);
        self.revision.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn upsert_material(&self, entry: MaterialCatalogEntry) -> u64 {
        self.update(|data| data.upsert_material(entry))
    }

    pub fn set_labor_rate(&self, role: LaborRole, hourly_rate: f64) -> u64 {
        self.update(|data| data.set_labor_rate(role, hourly_rate))
    }
}

/// Merge stored overrides into `data`, skipping rows that no longer parse.
/// Returns how many rows were applied.
pub fn apply_overrides(
    data: &mut ReferenceData,
    materials: Vec<MaterialPriceRow>,
    labor: Vec<LaborRateRow>,
) -> usize {
    let mut applied = 0;

    for row in materials {
        let (Some(unit), Some(unit_price)) = (MaterialUnit::parse(&row.unit), row.unit_price.to_f64())
        else {
            tracing::warn!(material = %row.name, unit = %row.unit, "Skipping unreadable material override");
            continue;
        };
        data.upsert_material(MaterialCatalogEntry {
            name: row.name,
            unit_price,
            unit,
            unit_weight: row.unit_weight,
        });
        applied += 1;
    }

    for row in labor {
        let (Some(role), Some(rate)) = (LaborRole::parse(&row.role), row.hourly_rate.to_f64()) else {
            tracing::warn!(role = %row.role, "Skipping unreadable labor rate override");
            continue;
        };
        data.set_labor_rate(role, rate);
        applied += 1;
    }

    applied
}
