//! Saving-study entities: supply points, studies and their suggested rates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::tariffs::models::EnergyType;

use super::profile::ConsumptionProfile;

/// Physical point of consumption identified by its CUPS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplyPoint {
    pub cups: String,
    pub energy_type: EnergyType,
    pub contracted_power: Vec<Decimal>,
    pub max_available_power: Option<Decimal>,
    pub is_renewable: bool,
    pub counter_type: Option<String>,
    pub counter_is_owned: bool,
}

impl SupplyPoint {
    /// Build a supply point, normalizing and validating the CUPS.
    ///
    /// A CUPS is 20 to 22 ASCII alphanumeric characters.
    pub fn new(
        cups: &str,
        energy_type: EnergyType,
        contracted_power: Vec<Decimal>,
        is_renewable: bool,
    ) -> EngineResult<Self> {
        let cups = cups.trim().to_ascii_uppercase();
        if !(20..=22).contains(&cups.len()) {
            return Err(EngineError::InvalidCups {
                cups,
                reason: "must be 20 to 22 characters long",
            });
        }
        if !cups.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(EngineError::InvalidCups {
                cups,
                reason: "must be alphanumeric",
            });
        }

        Ok(Self {
            cups,
            energy_type,
            contracted_power,
            max_available_power: None,
            is_renewable,
            counter_type: None,
            counter_is_owned: false,
        })
    }

    /// Declared maximum power, or the largest contracted period power.
    pub fn max_available_power(&self) -> Decimal {
        self.max_available_power.unwrap_or_else(|| {
            self.contracted_power
                .iter()
                .copied()
                .max()
                .unwrap_or(Decimal::ZERO)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Particular,
    Company,
}

/// Prices on the client's current bill, used to compute savings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentPrices {
    pub energy_prices: Vec<Decimal>,
    #[serde(default)]
    pub power_prices: Vec<Decimal>,
    #[serde(default)]
    pub fixed_term_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyState {
    Draft,
    RatesGenerated,
    Finished,
}

/// Input for a new saving study.
#[derive(Debug, Clone)]
pub struct NewStudy {
    pub user_id: Option<i64>,
    pub client_type: ClientType,
    pub supply_point: SupplyPoint,
    pub consumption: Vec<Decimal>,
    pub analyzed_days: i64,
    pub annual_consumption: Option<Decimal>,
    pub current_rate_type_id: Option<i64>,
    pub current_prices: Option<CurrentPrices>,
    pub profit_margin: Option<Decimal>,
}

/// Comparative cost analysis for one supply point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingStudy {
    pub id: Uuid,
    pub user_id: Option<i64>,
    pub client_type: ClientType,
    pub supply_point: SupplyPoint,
    pub profile: ConsumptionProfile,
    /// Overrides the profile's projected annual consumption when set.
    pub declared_annual_consumption: Option<Decimal>,
    /// Rate type on the client's current bill. Recorded for the backoffice
    /// and echoed in responses; pricing never reads it, since the current
    /// cost comes from `current_prices`.
    pub current_rate_type_id: Option<i64>,
    pub current_prices: Option<CurrentPrices>,
    /// Requested margin in €/kWh, clamped to each margin's band.
    pub profit_margin: Option<Decimal>,
    pub current_cost: Option<Decimal>,
    pub state: StudyState,
    pub suggested_rates: Vec<SuggestedRate>,
    pub suggested_rate_id: Option<Uuid>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SavingStudy {
    pub fn energy_type(&self) -> EnergyType {
        self.supply_point.energy_type
    }

    pub fn annual_consumption(&self) -> Decimal {
        self.declared_annual_consumption
            .unwrap_or_else(|| self.profile.annual_consumption())
    }

    /// The suggestion accepted when the study was finished.
    pub fn suggested_rate(&self) -> Option<&SuggestedRate> {
        let id = self.suggested_rate_id?;
        self.suggested_rates.iter().find(|s| s.id == id)
    }
}

/// A priced candidate rate produced for a study.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedRate {
    pub id: Uuid,
    pub study_id: Uuid,
    pub rate_id: i64,
    pub rate_name: String,
    pub rate_type_id: i64,
    pub marketer_id: i64,
    pub energy_cost: Decimal,
    pub power_cost: Decimal,
    pub fixed_cost: Decimal,
    pub extra_costs: Decimal,
    pub margin_id: i64,
    pub min_margin: Decimal,
    pub max_margin: Decimal,
    pub applied_margin: Decimal,
    pub margin_amount: Decimal,
    pub commission_id: Option<i64>,
    pub total_commission: Decimal,
    pub total_cost: Decimal,
    pub saving: Option<Decimal>,
    pub saving_percentage: Option<Decimal>,
    pub is_full_renewable: bool,
    pub has_net_metering: bool,
}
