//! Database rows for the tariff catalog tables.
//!
//! These models use sqlx's FromRow derive for direct database deserialization
//! and convert into the catalog entities with `TryFrom`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::error::EngineError;

use super::models::{
    Commission, CommissionAmount, DecimalRange, EnergyCost, Lifecycle, Margin, MarginType, Rate,
    RateType,
};

/// Rate type from tariffs_ratetype
#[derive(Debug, Clone, FromRow)]
pub struct RateTypeRow {
    pub id: i64,
    pub name: String,
    pub energy_type: String,
    pub min_power: Option<Decimal>,
    pub max_power: Option<Decimal>,
    pub min_consumption: Option<Decimal>,
    pub max_consumption: Option<Decimal>,
    pub enabled: bool,
    pub is_deleted: bool,
}

impl TryFrom<RateTypeRow> for RateType {
    type Error = EngineError;

    fn try_from(row: RateTypeRow) -> Result<Self, Self::Error> {
        Ok(RateType {
            id: row.id,
            energy_type: row.energy_type.parse()?,
            power_range: DecimalRange::from_bounds("rate_type", "power", row.min_power, row.max_power)?,
            consumption_range: DecimalRange::from_bounds(
                "rate_type",
                "consumption",
                row.min_consumption,
                row.max_consumption,
            )?,
            name: row.name,
            is_active: row.enabled,
            lifecycle: Lifecycle::from_deleted_flag(row.is_deleted),
        })
    }
}

/// Rate from tariffs_rate (one column per time-of-use period)
#[derive(Debug, Clone, FromRow)]
pub struct RateRow {
    pub id: i64,
    pub name: String,
    pub rate_type_id: i64,
    pub marketer_id: i64,
    pub energy_price_1: Option<Decimal>,
    pub energy_price_2: Option<Decimal>,
    pub energy_price_3: Option<Decimal>,
    pub energy_price_4: Option<Decimal>,
    pub energy_price_5: Option<Decimal>,
    pub energy_price_6: Option<Decimal>,
    pub power_price_1: Option<Decimal>,
    pub power_price_2: Option<Decimal>,
    pub power_price_3: Option<Decimal>,
    pub power_price_4: Option<Decimal>,
    pub power_price_5: Option<Decimal>,
    pub power_price_6: Option<Decimal>,
    pub fixed_term_price: Option<Decimal>,
    pub is_full_renewable: bool,
    pub has_net_metering: bool,
    pub is_active: bool,
    pub is_deleted: bool,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
}

impl From<RateRow> for Rate {
    fn from(row: RateRow) -> Self {
        // Periods are stored left-aligned; the first NULL ends the schedule
        let energy_prices = [
            row.energy_price_1,
            row.energy_price_2,
            row.energy_price_3,
            row.energy_price_4,
            row.energy_price_5,
            row.energy_price_6,
        ]
        .into_iter()
        .map_while(|price| price)
        .collect();
        let power_prices = [
            row.power_price_1,
            row.power_price_2,
            row.power_price_3,
            row.power_price_4,
            row.power_price_5,
            row.power_price_6,
        ]
        .into_iter()
        .map_while(|price| price)
        .collect();

        Rate {
            id: row.id,
            name: row.name,
            rate_type_id: row.rate_type_id,
            marketer_id: row.marketer_id,
            energy_prices,
            power_prices,
            fixed_term_price: row.fixed_term_price.unwrap_or(Decimal::ZERO),
            is_full_renewable: row.is_full_renewable,
            has_net_metering: row.has_net_metering,
            is_active: row.is_active,
            lifecycle: Lifecycle::from_deleted_flag(row.is_deleted),
            valid_from: row.valid_from,
            valid_to: row.valid_to,
        }
    }
}

/// Margin from tariffs_margin
#[derive(Debug, Clone, FromRow)]
pub struct MarginRow {
    pub id: i64,
    pub rate_type_id: Option<i64>,
    pub margin_type: String,
    pub min_value: Decimal,
    pub max_value: Decimal,
    pub min_margin: Decimal,
    pub max_margin: Decimal,
    pub is_deleted: bool,
}

impl TryFrom<MarginRow> for Margin {
    type Error = EngineError;

    fn try_from(row: MarginRow) -> Result<Self, Self::Error> {
        let margin_type: MarginType = row.margin_type.parse()?;
        let field = match margin_type {
            MarginType::Consumption => "consumption",
            MarginType::Power => "power",
        };
        let range = DecimalRange::new("margin", field, row.min_value, row.max_value)?;
        let mut margin = Margin::new(
            row.id,
            row.rate_type_id,
            margin_type,
            range,
            row.min_margin,
            row.max_margin,
        )?;
        margin.lifecycle = Lifecycle::from_deleted_flag(row.is_deleted);
        Ok(margin)
    }
}

/// Commission from tariffs_commission, with its linked rate ids aggregated
#[derive(Debug, Clone, FromRow)]
pub struct CommissionRow {
    pub id: i64,
    pub name: String,
    pub rate_type_id: Option<i64>,
    pub rate_type_segmentation: bool,
    pub min_consumption: Option<Decimal>,
    pub max_consumption: Option<Decimal>,
    pub min_power: Option<Decimal>,
    pub max_power: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub is_deleted: bool,
    pub rate_ids: Vec<i64>,
}

impl TryFrom<CommissionRow> for Commission {
    type Error = EngineError;

    fn try_from(row: CommissionRow) -> Result<Self, Self::Error> {
        let amount = match row.percentage {
            Some(percentage) => CommissionAmount::Percentage(percentage),
            None => CommissionAmount::Flat(row.amount.unwrap_or(Decimal::ZERO)),
        };

        Ok(Commission {
            id: row.id,
            name: row.name,
            rate_ids: row.rate_ids,
            consumption_range: DecimalRange::from_bounds(
                "commission",
                "consumption",
                row.min_consumption,
                row.max_consumption,
            )?,
            power_range: DecimalRange::from_bounds("commission", "power", row.min_power, row.max_power)?,
            rate_type_segmentation: row.rate_type_segmentation,
            rate_type_id: row.rate_type_id,
            amount,
            lifecycle: Lifecycle::from_deleted_flag(row.is_deleted),
        })
    }
}

/// Cost concept from tariffs_energycost / tariffs_othercost
#[derive(Debug, Clone, FromRow)]
pub struct EnergyCostRow {
    pub id: i64,
    pub concept: String,
    pub amount: Decimal,
    pub user_id: Option<i64>,
    pub is_active: bool,
    pub is_deleted: bool,
}

impl From<EnergyCostRow> for EnergyCost {
    fn from(row: EnergyCostRow) -> Self {
        EnergyCost {
            id: row.id,
            concept: row.concept,
            amount: row.amount,
            user_id: row.user_id,
            is_active: row.is_active,
            lifecycle: Lifecycle::from_deleted_flag(row.is_deleted),
        }
    }
}
