//! Database queries for the tariff catalog.
//!
//! Loads a read-only [`TariffCatalog`] snapshot for one energy type. The admin
//! backoffice owns writes to these tables; rows that break catalog invariants
//! are skipped with a warning so a single bad entry does not block every study.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::{AppError, EngineResult};

use super::catalog::TariffCatalog;
use super::models::{Commission, EnergyType, Margin, RateType};
use super::rows::{CommissionRow, EnergyCostRow, MarginRow, RateRow, RateTypeRow};

/// Get non-deleted rate types of an energy type
pub async fn get_rate_types(
    pool: &PgPool,
    energy_type: EnergyType,
) -> Result<Vec<RateTypeRow>, AppError> {
    let rows = sqlx::query_as::<_, RateTypeRow>(
        r#"
        SELECT
            id, name, energy_type,
            min_power, max_power, min_consumption, max_consumption,
            enabled, is_deleted
        FROM tariffs_ratetype
        WHERE energy_type = $1
          AND is_deleted = false
        ORDER BY id
        "#,
    )
    .bind(energy_type.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get non-deleted rates whose rate type belongs to an energy type
pub async fn get_rates(pool: &PgPool, energy_type: EnergyType) -> Result<Vec<RateRow>, AppError> {
    let rows = sqlx::query_as::<_, RateRow>(
        r#"
        SELECT
            r.id, r.name, r.rate_type_id, r.marketer_id,
            r.energy_price_1, r.energy_price_2, r.energy_price_3,
            r.energy_price_4, r.energy_price_5, r.energy_price_6,
            r.power_price_1, r.power_price_2, r.power_price_3,
            r.power_price_4, r.power_price_5, r.power_price_6,
            r.fixed_term_price, r.is_full_renewable, r.has_net_metering,
            r.is_active, r.is_deleted, r.valid_from, r.valid_to
        FROM tariffs_rate r
        JOIN tariffs_ratetype rt ON rt.id = r.rate_type_id
        WHERE rt.energy_type = $1
          AND r.is_deleted = false
        ORDER BY r.id
        "#,
    )
    .bind(energy_type.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get global margins and margins of rate types of an energy type
pub async fn get_margins(
    pool: &PgPool,
    energy_type: EnergyType,
) -> Result<Vec<MarginRow>, AppError> {
    let rows = sqlx::query_as::<_, MarginRow>(
        r#"
        SELECT
            m.id, m.rate_type_id, m.margin_type,
            m.min_value, m.max_value, m.min_margin, m.max_margin,
            m.is_deleted
        FROM tariffs_margin m
        LEFT JOIN tariffs_ratetype rt ON rt.id = m.rate_type_id
        WHERE m.is_deleted = false
          AND (m.rate_type_id IS NULL OR rt.energy_type = $1)
        ORDER BY m.id
        "#,
    )
    .bind(energy_type.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get commissions linked to at least one rate of an energy type
pub async fn get_commissions(
    pool: &PgPool,
    energy_type: EnergyType,
) -> Result<Vec<CommissionRow>, AppError> {
    let rows = sqlx::query_as::<_, CommissionRow>(
        r#"
        SELECT
            c.id, c.name, c.rate_type_id, c.rate_type_segmentation,
            c.min_consumption, c.max_consumption, c.min_power, c.max_power,
            c.amount, c.percentage, c.is_deleted,
            ARRAY(
                SELECT cr.rate_id
                FROM tariffs_commission_rates cr
                WHERE cr.commission_id = c.id
                ORDER BY cr.rate_id
            ) AS rate_ids
        FROM tariffs_commission c
        WHERE c.is_deleted = false
          AND EXISTS (
              SELECT 1
              FROM tariffs_commission_rates cr
              JOIN tariffs_rate r ON r.id = cr.rate_id
              JOIN tariffs_ratetype rt ON rt.id = r.rate_type_id
              WHERE cr.commission_id = c.id
                AND rt.energy_type = $1
          )
        ORDER BY c.id
        "#,
    )
    .bind(energy_type.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get active cost concepts from one of the cost tables
async fn get_costs(pool: &PgPool, table: CostTable) -> Result<Vec<EnergyCostRow>, AppError> {
    let sql = match table {
        CostTable::Energy => {
            r#"
            SELECT id, concept, amount, user_id, is_active, is_deleted
            FROM tariffs_energycost
            WHERE is_deleted = false
            ORDER BY id
            "#
        }
        CostTable::Other => {
            r#"
            SELECT id, concept, amount, user_id, is_active, is_deleted
            FROM tariffs_othercost
            WHERE is_deleted = false
            ORDER BY id
            "#
        }
    };

    let rows = sqlx::query_as::<_, EnergyCostRow>(sql).fetch_all(pool).await?;
    Ok(rows)
}

#[derive(Debug, Clone, Copy)]
enum CostTable {
    Energy,
    Other,
}

/// Load the full catalog snapshot for an energy type.
pub async fn load_catalog(pool: &PgPool, energy_type: EnergyType) -> Result<TariffCatalog, AppError> {
    let mut catalog = TariffCatalog::new();

    for row in get_rate_types(pool, energy_type).await? {
        let id = row.id;
        absorb("rate type", id, RateType::try_from(row).and_then(|rt| catalog.insert_rate_type(rt)));
    }

    for row in get_rates(pool, energy_type).await? {
        let id = row.id;
        absorb("rate", id, catalog.insert_rate(row.into()));
    }

    for row in get_margins(pool, energy_type).await? {
        let id = row.id;
        absorb("margin", id, Margin::try_from(row).and_then(|m| catalog.insert_margin(m)));
    }

    for row in get_commissions(pool, energy_type).await? {
        let id = row.id;
        absorb(
            "commission",
            id,
            Commission::try_from(row).and_then(|c| catalog.insert_commission(c)),
        );
    }

    for row in get_costs(pool, CostTable::Energy).await? {
        catalog.insert_energy_cost(row.into());
    }
    for row in get_costs(pool, CostTable::Other).await? {
        catalog.insert_other_cost(row.into());
    }

    info!(
        "Loaded {} catalog: {} rate types, {} rates, {} margins, {} commissions",
        energy_type,
        catalog.rate_types().len(),
        catalog.rates().len(),
        catalog.margins().len(),
        catalog.commissions().len()
    );

    Ok(catalog)
}

fn absorb(entity: &str, id: i64, result: EngineResult<()>) {
    if let Err(e) = result {
        warn!("Skipping {} {}: {}", entity, id, e);
    }
}
