//! Saving-study orchestration.
//!
//! The free functions are the pure state machine over a [`SavingStudy`]
//! (`Draft → RatesGenerated → Finished`). [`StudyService`] wraps them with the
//! versioned store for the API layer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::tariffs::catalog::TariffCatalog;
use crate::tariffs::models::Rate;

use super::calculators::{calculate_cost, calculate_saving, round_money, CostParameters};
use super::eligibility::filter_eligible;
use super::models::{NewStudy, SavingStudy, StudyState, SuggestedRate};
use super::profile::ConsumptionProfile;
use super::resolver::{commission_amount, resolve_commission, resolve_margin, ClientMetrics};
use super::store::StudyStore;

/// Engine-wide knobs for generating suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    pub cost: CostParameters,
    /// Upper bound on priced candidates per study.
    pub max_candidate_rates: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            cost: CostParameters::default(),
            max_candidate_rates: 500,
        }
    }
}

/// Filter over a study's suggestions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestedRateFilter {
    pub marketer_id: Option<i64>,
    pub renewable: Option<bool>,
    pub rate_type_id: Option<i64>,
    pub limit: Option<usize>,
}

/// Create a draft study, validating the supply point and consumption data.
pub fn create_study(input: NewStudy, id: Uuid, now: DateTime<Utc>) -> EngineResult<SavingStudy> {
    let profile = ConsumptionProfile::new(
        input.supply_point.energy_type,
        &input.consumption,
        &input.supply_point.contracted_power,
        input.analyzed_days,
    )?;

    if let Some(annual) = input.annual_consumption {
        if annual <= Decimal::ZERO {
            return Err(EngineError::InvalidConsumptionRange {
                reason: "declared annual consumption must be positive".to_string(),
            });
        }
    }
    if let Some(margin) = input.profit_margin {
        if margin < Decimal::ZERO {
            return Err(EngineError::InvalidAmount {
                entity: "study",
                id: 0,
                reason: "profit margin must not be negative".to_string(),
            });
        }
    }
    if let Some(prices) = &input.current_prices {
        let periods = profile.periods();
        if prices.energy_prices.len() != periods {
            return Err(EngineError::PeriodMismatch {
                what: "current energy prices",
                expected: periods,
                actual: prices.energy_prices.len(),
            });
        }
        if !prices.power_prices.is_empty() && prices.power_prices.len() != periods {
            return Err(EngineError::PeriodMismatch {
                what: "current power prices",
                expected: periods,
                actual: prices.power_prices.len(),
            });
        }
        let negative = prices
            .energy_prices
            .iter()
            .chain(prices.power_prices.iter())
            .chain(std::iter::once(&prices.fixed_term_price))
            .any(|price| *price < Decimal::ZERO);
        if negative {
            return Err(EngineError::InvalidAmount {
                entity: "study",
                id: 0,
                reason: "current prices must not be negative".to_string(),
            });
        }
    }

    Ok(SavingStudy {
        id,
        user_id: input.user_id,
        client_type: input.client_type,
        supply_point: input.supply_point,
        profile,
        declared_annual_consumption: input.annual_consumption,
        current_rate_type_id: input.current_rate_type_id,
        current_prices: input.current_prices,
        profit_margin: input.profit_margin,
        current_cost: None,
        state: StudyState::Draft,
        suggested_rates: Vec::new(),
        suggested_rate_id: None,
        version: 0,
        created_at: now,
        updated_at: now,
    })
}

/// Price every eligible rate and replace the study's suggestions.
///
/// The new set is built completely before it is swapped in; on any error the
/// study is left untouched. Returns the suggestions ranked.
pub fn generate_suggested_rates(
    study: &mut SavingStudy,
    catalog: &TariffCatalog,
    params: &EngineParams,
    as_of: NaiveDate,
) -> EngineResult<Vec<SuggestedRate>> {
    if study.state == StudyState::Finished {
        return Err(EngineError::AlreadyFinished(study.id));
    }

    let metrics = ClientMetrics {
        annual_consumption: study.annual_consumption(),
        max_power: study.supply_point.max_available_power(),
    };

    let report = filter_eligible(catalog, &study.supply_point, metrics.annual_consumption, as_of)?;
    for (rate_id, reason) in &report.excluded {
        debug!("Study {}: rate {} excluded ({})", study.id, rate_id, reason);
    }
    if report.eligible.is_empty() {
        return Err(EngineError::StudyNotEligible {
            study_id: study.id,
            energy_type: study.energy_type(),
        });
    }

    let mut candidates = report.eligible;
    if candidates.len() > params.max_candidate_rates {
        warn!(
            "Study {}: {} eligible rates, pricing only the first {}",
            study.id,
            candidates.len(),
            params.max_candidate_rates
        );
        candidates.truncate(params.max_candidate_rates);
    }

    let extra_costs = catalog.extra_costs_total(study.user_id);
    let current_cost = match &study.current_prices {
        Some(prices) => {
            let cost = calculate_cost(prices, &study.profile, &params.cost)?;
            Some(round_money(cost.subtotal() + extra_costs, 2))
        }
        None => None,
    };

    let mut suggestions = candidates
        .into_iter()
        .map(|rate| price_candidate(study, catalog, rate, &metrics, extra_costs, current_cost, params))
        .collect::<EngineResult<Vec<_>>>()?;
    suggestions.sort_by(compare_suggestions);

    info!(
        "Study {}: generated {} suggested rates",
        study.id,
        suggestions.len()
    );

    study.suggested_rates = suggestions.clone();
    study.current_cost = current_cost;
    study.state = StudyState::RatesGenerated;
    Ok(suggestions)
}

fn price_candidate(
    study: &SavingStudy,
    catalog: &TariffCatalog,
    rate: &Rate,
    metrics: &ClientMetrics,
    extra_costs: Decimal,
    current_cost: Option<Decimal>,
    params: &EngineParams,
) -> EngineResult<SuggestedRate> {
    let rate_type = catalog
        .rate_type(rate.rate_type_id)
        .ok_or(EngineError::RateTypeNotFound(rate.rate_type_id))?;

    let cost = calculate_cost(rate, &study.profile, &params.cost)?;
    let margin = resolve_margin(catalog, rate_type, metrics, study.profit_margin)?;
    let commission = commission_amount(resolve_commission(catalog, rate, metrics), &cost);

    let total_cost = round_money(cost.subtotal() + margin.amount + extra_costs, 2);
    let (saving, saving_percentage) = match current_cost {
        Some(current) => {
            let (saving, percentage) = calculate_saving(current, total_cost);
            (Some(saving), percentage)
        }
        None => (None, None),
    };

    Ok(SuggestedRate {
        id: Uuid::new_v4(),
        study_id: study.id,
        rate_id: rate.id,
        rate_name: rate.name.clone(),
        rate_type_id: rate.rate_type_id,
        marketer_id: rate.marketer_id,
        energy_cost: round_money(cost.energy, 2),
        power_cost: round_money(cost.power, 2),
        fixed_cost: round_money(cost.fixed, 2),
        extra_costs: round_money(extra_costs, 2),
        margin_id: margin.margin_id,
        min_margin: margin.min_margin,
        max_margin: margin.max_margin,
        applied_margin: margin.applied,
        margin_amount: round_money(margin.amount, 2),
        commission_id: commission.commission_id,
        total_commission: commission.total,
        total_cost,
        saving,
        saving_percentage,
        is_full_renewable: rate.is_full_renewable,
        has_net_metering: rate.has_net_metering,
    })
}

/// Accept one of the study's suggestions and close the study.
pub fn finish(
    study: &mut SavingStudy,
    suggested_rate_id: Uuid,
    now: DateTime<Utc>,
) -> EngineResult<()> {
    if study.state == StudyState::Finished {
        return Err(EngineError::AlreadyFinished(study.id));
    }
    if !study.suggested_rates.iter().any(|s| s.id == suggested_rate_id) {
        return Err(EngineError::SuggestedRateNotFound {
            study_id: study.id,
            suggested_rate_id,
        });
    }

    study.suggested_rate_id = Some(suggested_rate_id);
    study.state = StudyState::Finished;
    study.updated_at = now;
    Ok(())
}

/// Copy a study's inputs into a fresh draft. Suggestions are not copied.
pub fn duplicate(study: &SavingStudy, id: Uuid, now: DateTime<Utc>) -> SavingStudy {
    SavingStudy {
        id,
        user_id: study.user_id,
        client_type: study.client_type,
        supply_point: study.supply_point.clone(),
        profile: study.profile.clone(),
        declared_annual_consumption: study.declared_annual_consumption,
        current_rate_type_id: study.current_rate_type_id,
        current_prices: study.current_prices.clone(),
        profit_margin: study.profit_margin,
        current_cost: None,
        state: StudyState::Draft,
        suggested_rates: Vec::new(),
        suggested_rate_id: None,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

fn compare_suggestions(a: &SuggestedRate, b: &SuggestedRate) -> Ordering {
    a.total_cost
        .cmp(&b.total_cost)
        .then_with(|| a.rate_id.cmp(&b.rate_id))
}

/// Suggestions by ascending total cost, ties by rate id.
pub fn rank(suggestions: &[SuggestedRate]) -> Vec<&SuggestedRate> {
    let mut ranked: Vec<&SuggestedRate> = suggestions.iter().collect();
    ranked.sort_by(|a, b| compare_suggestions(a, b));
    ranked
}

/// Ranked suggestions of a study that pass the filter.
pub fn list_suggested_rates<'a>(
    study: &'a SavingStudy,
    filter: &SuggestedRateFilter,
) -> Vec<&'a SuggestedRate> {
    let matching = rank(&study.suggested_rates).into_iter().filter(|s| {
        filter.marketer_id.map_or(true, |id| s.marketer_id == id)
            && filter.renewable.map_or(true, |flag| s.is_full_renewable == flag)
            && filter.rate_type_id.map_or(true, |id| s.rate_type_id == id)
    });

    match filter.limit {
        Some(limit) => matching.take(limit).collect(),
        None => matching.collect(),
    }
}

/// Study operations exposed to the API layer.
///
/// Every mutation reads the study, runs the pure transition on a copy, and
/// commits it with a version check.
#[derive(Debug, Clone)]
pub struct StudyService {
    store: StudyStore,
    params: EngineParams,
}

impl StudyService {
    pub fn new(store: StudyStore, params: EngineParams) -> Self {
        Self { store, params }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub async fn create_study(&self, input: NewStudy) -> EngineResult<SavingStudy> {
        let study = create_study(input, Uuid::new_v4(), Utc::now())?;
        let study = self.store.insert(study).await;
        info!("Created saving study {} for {}", study.id, study.supply_point.cups);
        Ok(study)
    }

    pub async fn get_study(&self, study_id: Uuid) -> EngineResult<SavingStudy> {
        self.store.get(study_id).await
    }

    pub async fn generate_suggested_rates(
        &self,
        study_id: Uuid,
        catalog: &TariffCatalog,
    ) -> EngineResult<Vec<SuggestedRate>> {
        let mut study = self.store.get(study_id).await?;
        let now = Utc::now();
        let suggestions = generate_suggested_rates(&mut study, catalog, &self.params, now.date_naive())?;
        study.updated_at = now;
        self.store.compare_and_swap(study).await?;
        Ok(suggestions)
    }

    pub async fn list_suggested_rates(
        &self,
        study_id: Uuid,
        filter: &SuggestedRateFilter,
    ) -> EngineResult<Vec<SuggestedRate>> {
        let study = self.store.get(study_id).await?;
        Ok(list_suggested_rates(&study, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn finish_study(
        &self,
        study_id: Uuid,
        suggested_rate_id: Uuid,
    ) -> EngineResult<SavingStudy> {
        let mut study = self.store.get(study_id).await?;
        finish(&mut study, suggested_rate_id, Utc::now())?;
        let study = self.store.compare_and_swap(study).await?;
        info!("Finished saving study {} with {}", study.id, suggested_rate_id);
        Ok(study)
    }

    pub async fn duplicate_study(&self, study_id: Uuid) -> EngineResult<SavingStudy> {
        let source = self.store.get(study_id).await?;
        let copy = duplicate(&source, Uuid::new_v4(), Utc::now());
        let copy = self.store.insert(copy).await;
        info!("Duplicated saving study {} into {}", source.id, copy.id);
        Ok(copy)
    }
}
