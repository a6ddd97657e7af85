//! Request DTOs for saving-study API endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::tariffs::models::EnergyType;

use super::models::{ClientType, CurrentPrices, NewStudy, SupplyPoint};
use super::services::SuggestedRateFilter;

/// Request to open a saving study
#[derive(Debug, Deserialize)]
pub struct CreateStudyRequest {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub client_type: ClientType,
    pub cups: String,
    pub energy_type: EnergyType,
    /// kW per period
    #[serde(default)]
    pub contracted_power: Vec<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub max_available_power: Option<Decimal>,
    #[serde(default)]
    pub is_renewable: bool,
    #[serde(default)]
    pub counter_type: Option<String>,
    #[serde(default)]
    pub counter_is_owned: bool,
    /// kWh per period over the analyzed window
    pub consumption: Vec<Decimal>,
    pub analyzed_days: i64,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub annual_consumption: Option<Decimal>,
    #[serde(default)]
    pub current_rate_type_id: Option<i64>,
    #[serde(default)]
    pub current_prices: Option<CurrentPrices>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub profit_margin: Option<Decimal>,
}

impl CreateStudyRequest {
    pub fn into_new_study(self) -> EngineResult<NewStudy> {
        let mut supply_point = SupplyPoint::new(
            &self.cups,
            self.energy_type,
            self.contracted_power,
            self.is_renewable,
        )?;
        supply_point.max_available_power = self.max_available_power;
        supply_point.counter_type = self.counter_type;
        supply_point.counter_is_owned = self.counter_is_owned;

        Ok(NewStudy {
            user_id: self.user_id,
            client_type: self.client_type,
            supply_point,
            consumption: self.consumption,
            analyzed_days: self.analyzed_days,
            annual_consumption: self.annual_consumption,
            current_rate_type_id: self.current_rate_type_id,
            current_prices: self.current_prices,
            profit_margin: self.profit_margin,
        })
    }
}

/// Request to close a study on one of its suggestions
#[derive(Debug, Deserialize)]
pub struct FinishStudyRequest {
    pub suggested_rate_id: Uuid,
}

/// Query string for listing suggestions
#[derive(Debug, Default, Deserialize)]
pub struct ListSuggestedRatesQuery {
    pub marketer_id: Option<i64>,
    pub renewable: Option<bool>,
    pub rate_type_id: Option<i64>,
    pub limit: Option<usize>,
}

impl From<ListSuggestedRatesQuery> for SuggestedRateFilter {
    fn from(query: ListSuggestedRatesQuery) -> Self {
        Self {
            marketer_id: query.marketer_id,
            renewable: query.renewable,
            rate_type_id: query.rate_type_id,
            limit: query.limit,
        }
    }
}
