//! Tariff catalog entities.
//!
//! Plain value types: validation of cross-entity rules (uniqueness, overlapping
//! ranges) happens when entries are inserted into a [`TariffCatalog`].
//!
//! [`TariffCatalog`]: super::catalog::TariffCatalog

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// Kind of supply a tariff applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    Electricity,
    Gas,
}

impl EnergyType {
    /// Number of time-of-use periods billed for this energy type.
    pub const fn periods(self) -> usize {
        match self {
            EnergyType::Electricity => 6,
            EnergyType::Gas => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EnergyType::Electricity => "electricity",
            EnergyType::Gas => "gas",
        }
    }
}

impl fmt::Display for EnergyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "electricity" => Ok(EnergyType::Electricity),
            "gas" => Ok(EnergyType::Gas),
            _ => Err(EngineError::UnknownValue {
                field: "energy_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Soft-deletion state of a catalog entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted,
}

impl Lifecycle {
    pub fn from_deleted_flag(is_deleted: bool) -> Self {
        if is_deleted {
            Lifecycle::Deleted
        } else {
            Lifecycle::Active
        }
    }

    pub fn is_deleted(self) -> bool {
        self == Lifecycle::Deleted
    }
}

/// Closed interval `[min, max]` over decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl DecimalRange {
    /// Build a range, rejecting `min > max` and negative bounds. Ranges are
    /// never clamped.
    pub fn new(
        entity: &'static str,
        field: &'static str,
        min: Decimal,
        max: Decimal,
    ) -> EngineResult<Self> {
        if min > max || min < Decimal::ZERO {
            return Err(EngineError::InvalidRange {
                entity,
                field,
                min,
                max,
            });
        }
        Ok(Self { min, max })
    }

    /// Build an optional range from nullable bounds.
    ///
    /// A missing lower bound means zero, a missing upper bound means unbounded.
    /// Both missing means no range at all.
    pub fn from_bounds(
        entity: &'static str,
        field: &'static str,
        min: Option<Decimal>,
        max: Option<Decimal>,
    ) -> EngineResult<Option<Self>> {
        match (min, max) {
            (None, None) => Ok(None),
            (min, max) => Self::new(
                entity,
                field,
                min.unwrap_or(Decimal::ZERO),
                max.unwrap_or(Decimal::MAX),
            )
            .map(Some),
        }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        self.min <= value && value <= self.max
    }

    /// True when the interiors intersect. Ranges that only share an endpoint
    /// do not overlap.
    pub fn overlaps(&self, other: &DecimalRange) -> bool {
        self.min < other.max && other.min < self.max
    }

    /// Open-ended ranges saturate at `Decimal::MAX`.
    pub fn width(&self) -> Decimal {
        self.max.checked_sub(self.min).unwrap_or(Decimal::MAX)
    }
}

/// Tariff template: structure and eligibility ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateType {
    pub id: i64,
    pub name: String,
    pub energy_type: EnergyType,
    pub power_range: Option<DecimalRange>,
    pub consumption_range: Option<DecimalRange>,
    pub is_active: bool,
    pub lifecycle: Lifecycle,
}

impl RateType {
    pub fn is_available(&self) -> bool {
        self.is_active && !self.lifecycle.is_deleted()
    }
}

/// Priced tariff offered by a marketer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub id: i64,
    pub name: String,
    pub rate_type_id: i64,
    pub marketer_id: i64,
    /// €/kWh per time-of-use period.
    pub energy_prices: Vec<Decimal>,
    /// €/kW·day per time-of-use period. Empty when the tariff has no power term.
    pub power_prices: Vec<Decimal>,
    /// € per billing period.
    pub fixed_term_price: Decimal,
    pub is_full_renewable: bool,
    pub has_net_metering: bool,
    pub is_active: bool,
    pub lifecycle: Lifecycle,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
}

impl Rate {
    pub fn is_available(&self) -> bool {
        self.is_active && !self.lifecycle.is_deleted()
    }

    /// Check if the rate is offered on the given day (both bounds inclusive).
    pub fn is_valid_at(&self, day: NaiveDate) -> bool {
        if let Some(start) = self.valid_from {
            if start > day {
                return false;
            }
        }
        match self.valid_to {
            Some(end) => day <= end,
            None => true,
        }
    }
}

/// Metric a margin range is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginType {
    Consumption,
    Power,
}

impl FromStr for MarginType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "consumption" => Ok(MarginType::Consumption),
            "power" => Ok(MarginType::Power),
            _ => Err(EngineError::UnknownValue {
                field: "margin_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Profit-margin rule, global (`rate_type_id == None`) or rate-type specific.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub id: i64,
    pub rate_type_id: Option<i64>,
    pub margin_type: MarginType,
    pub range: DecimalRange,
    /// €/kWh
    pub min_margin: Decimal,
    /// €/kWh
    pub max_margin: Decimal,
    pub lifecycle: Lifecycle,
}

impl Margin {
    pub fn new(
        id: i64,
        rate_type_id: Option<i64>,
        margin_type: MarginType,
        range: DecimalRange,
        min_margin: Decimal,
        max_margin: Decimal,
    ) -> EngineResult<Self> {
        DecimalRange::new("margin", "margin", min_margin, max_margin)?;
        Ok(Self {
            id,
            rate_type_id,
            margin_type,
            range,
            min_margin,
            max_margin,
            lifecycle: Lifecycle::Active,
        })
    }
}

/// How a commission is paid to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CommissionAmount {
    /// € per year.
    Flat(Decimal),
    /// Percentage of the energy term.
    Percentage(Decimal),
}

/// Broker fee rule keyed by consumption/power range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commission {
    pub id: i64,
    pub name: String,
    pub rate_ids: Vec<i64>,
    pub consumption_range: Option<DecimalRange>,
    pub power_range: Option<DecimalRange>,
    pub rate_type_segmentation: bool,
    pub rate_type_id: Option<i64>,
    pub amount: CommissionAmount,
    pub lifecycle: Lifecycle,
}

impl Commission {
    pub fn applies_to_rate(&self, rate_id: i64) -> bool {
        self.rate_ids.contains(&rate_id)
    }
}

/// Regulated or operating cost concept added to every priced offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyCost {
    pub id: i64,
    pub concept: String,
    /// € per year.
    pub amount: Decimal,
    pub user_id: Option<i64>,
    pub is_active: bool,
    pub lifecycle: Lifecycle,
}

impl EnergyCost {
    /// Global costs apply to everyone; user costs only to their owner.
    pub fn applies_to(&self, user_id: Option<i64>) -> bool {
        if !self.is_active || self.lifecycle.is_deleted() {
            return false;
        }
        match self.user_id {
            None => true,
            Some(owner) => Some(owner) == user_id,
        }
    }
}

/// Adjustable operating costs share the energy cost shape.
pub type OtherCost = EnergyCost;
