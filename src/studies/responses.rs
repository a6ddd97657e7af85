//! Response DTOs for saving-study API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::tariffs::models::EnergyType;

use super::models::{ClientType, SavingStudy, StudyState, SuggestedRate};

const CURRENCY: &str = "EUR";

/// Money value for JSON responses
#[derive(Debug, Clone, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn eur(amount: Decimal) -> Self {
        Self {
            amount,
            currency: CURRENCY.to_string(),
        }
    }
}

/// A priced suggestion
#[derive(Debug, Serialize)]
pub struct SuggestedRateResponse {
    pub id: Uuid,
    pub rate_id: i64,
    pub rate_name: String,
    pub rate_type_id: i64,
    pub marketer_id: i64,
    pub energy_cost: MoneyResponse,
    pub power_cost: MoneyResponse,
    pub fixed_cost: MoneyResponse,
    pub extra_costs: MoneyResponse,
    pub margin_id: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub applied_margin: Decimal,
    pub margin_amount: MoneyResponse,
    pub commission_id: Option<i64>,
    pub total_commission: MoneyResponse,
    pub total_cost: MoneyResponse,
    pub saving: Option<MoneyResponse>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub saving_percentage: Option<Decimal>,
    pub is_full_renewable: bool,
    pub has_net_metering: bool,
}

impl From<&SuggestedRate> for SuggestedRateResponse {
    fn from(s: &SuggestedRate) -> Self {
        Self {
            id: s.id,
            rate_id: s.rate_id,
            rate_name: s.rate_name.clone(),
            rate_type_id: s.rate_type_id,
            marketer_id: s.marketer_id,
            energy_cost: MoneyResponse::eur(s.energy_cost),
            power_cost: MoneyResponse::eur(s.power_cost),
            fixed_cost: MoneyResponse::eur(s.fixed_cost),
            extra_costs: MoneyResponse::eur(s.extra_costs),
            margin_id: s.margin_id,
            applied_margin: s.applied_margin,
            margin_amount: MoneyResponse::eur(s.margin_amount),
            commission_id: s.commission_id,
            total_commission: MoneyResponse::eur(s.total_commission),
            total_cost: MoneyResponse::eur(s.total_cost),
            saving: s.saving.map(MoneyResponse::eur),
            saving_percentage: s.saving_percentage,
            is_full_renewable: s.is_full_renewable,
            has_net_metering: s.has_net_metering,
        }
    }
}

/// Response for a saving study
#[derive(Debug, Serialize)]
pub struct StudyResponse {
    pub id: Uuid,
    pub user_id: Option<i64>,
    pub client_type: ClientType,
    pub cups: String,
    pub energy_type: EnergyType,
    pub state: StudyState,
    #[serde(with = "rust_decimal::serde::str")]
    pub annual_consumption: Decimal,
    pub analyzed_days: i64,
    pub current_rate_type_id: Option<i64>,
    pub current_cost: Option<MoneyResponse>,
    pub suggested_rate_id: Option<Uuid>,
    pub suggested_rates_count: usize,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SavingStudy> for StudyResponse {
    fn from(study: &SavingStudy) -> Self {
        Self {
            id: study.id,
            user_id: study.user_id,
            client_type: study.client_type,
            cups: study.supply_point.cups.clone(),
            energy_type: study.energy_type(),
            state: study.state,
            annual_consumption: study.annual_consumption(),
            analyzed_days: study.profile.analyzed_days(),
            current_rate_type_id: study.current_rate_type_id,
            current_cost: study.current_cost.map(MoneyResponse::eur),
            suggested_rate_id: study.suggested_rate_id,
            suggested_rates_count: study.suggested_rates.len(),
            version: study.version,
            created_at: study.created_at,
            updated_at: study.updated_at,
        }
    }
}

/// Response for listing or generating suggestions
#[derive(Debug, Serialize)]
pub struct SuggestedRatesResponse {
    pub study_id: Uuid,
    pub suggested_rates: Vec<SuggestedRateResponse>,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
