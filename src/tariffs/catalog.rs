//! In-memory tariff catalog snapshot.
//!
//! The catalog keeps entries in insertion order. Invariants that span several
//! entries (unique rate type names, non-overlapping margin and commission
//! ranges, one margin type per scope) are enforced by the `insert_*` methods,
//! so resolution code can assume a consistent snapshot.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};

use super::models::{
    Commission, CommissionAmount, DecimalRange, EnergyCost, EnergyType, Lifecycle, Margin,
    OtherCost, Rate, RateType,
};

/// Snapshot of rate types, rates, margins, commissions and cost concepts.
#[derive(Debug, Clone, Default)]
pub struct TariffCatalog {
    rate_types: Vec<RateType>,
    rates: Vec<Rate>,
    margins: Vec<Margin>,
    commissions: Vec<Commission>,
    energy_costs: Vec<EnergyCost>,
    other_costs: Vec<OtherCost>,
}

impl TariffCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== reads ====================

    pub fn rate_types(&self) -> &[RateType] {
        &self.rate_types
    }

    /// Every rate, in insertion order, including deleted and inactive ones.
    pub fn rates(&self) -> &[Rate] {
        &self.rates
    }

    pub fn margins(&self) -> &[Margin] {
        &self.margins
    }

    pub fn commissions(&self) -> &[Commission] {
        &self.commissions
    }

    pub fn rate_type(&self, id: i64) -> Option<&RateType> {
        self.rate_types.iter().find(|rt| rt.id == id)
    }

    pub fn rate(&self, id: i64) -> Option<&Rate> {
        self.rates.iter().find(|r| r.id == id)
    }

    /// Available rates whose rate type is available and of the given energy type.
    pub fn rates_for(&self, energy_type: EnergyType) -> Vec<&Rate> {
        self.rates
            .iter()
            .filter(|rate| rate.is_available())
            .filter(|rate| {
                self.rate_type(rate.rate_type_id)
                    .map(|rt| rt.is_available() && rt.energy_type == energy_type)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Non-deleted margins of exactly the given scope (`None` = global margins).
    pub fn margin_for(&self, rate_type_id: Option<i64>) -> EngineResult<Vec<&Margin>> {
        let margins: Vec<&Margin> = self
            .margins
            .iter()
            .filter(|m| !m.lifecycle.is_deleted() && m.rate_type_id == rate_type_id)
            .collect();

        if margins.is_empty() {
            return Err(EngineError::MarginNotFound { rate_type_id });
        }
        Ok(margins)
    }

    /// Non-deleted commissions linked to the rate.
    pub fn commissions_for(&self, rate: &Rate) -> Vec<&Commission> {
        self.commissions
            .iter()
            .filter(|c| !c.lifecycle.is_deleted() && c.applies_to_rate(rate.id))
            .collect()
    }

    /// Energy and other cost concepts that apply to a user.
    pub fn energy_costs_for(&self, user_id: Option<i64>) -> impl Iterator<Item = &EnergyCost> {
        self.energy_costs
            .iter()
            .chain(self.other_costs.iter())
            .filter(move |cost| cost.applies_to(user_id))
    }

    /// Sum of the annual cost concepts that apply to a user.
    pub fn extra_costs_total(&self, user_id: Option<i64>) -> Decimal {
        self.energy_costs_for(user_id).map(|cost| cost.amount).sum()
    }

    // ==================== mutations ====================

    pub fn insert_rate_type(&mut self, rate_type: RateType) -> EngineResult<()> {
        if rate_type.energy_type == EnergyType::Electricity && rate_type.power_range.is_none() {
            return Err(EngineError::PowerRangeMissing {
                rate_type_id: rate_type.id,
            });
        }

        let name = rate_type.name.trim();
        let duplicate = self.rate_types.iter().any(|existing| {
            !existing.lifecycle.is_deleted()
                && existing.energy_type == rate_type.energy_type
                && existing.name.trim().eq_ignore_ascii_case(name)
        });
        if duplicate && !rate_type.lifecycle.is_deleted() {
            return Err(EngineError::DuplicateRateType {
                name: name.to_string(),
                energy_type: rate_type.energy_type,
            });
        }

        self.rate_types.push(rate_type);
        Ok(())
    }

    pub fn insert_rate(&mut self, rate: Rate) -> EngineResult<()> {
        let rate_type = self
            .rate_type(rate.rate_type_id)
            .ok_or(EngineError::RateTypeNotFound(rate.rate_type_id))?;
        let periods = rate_type.energy_type.periods();

        let invalid = |reason: String| EngineError::InvalidAmount {
            entity: "rate",
            id: rate.id,
            reason,
        };

        if rate.energy_prices.len() != periods {
            return Err(invalid(format!(
                "expected {} energy prices, got {}",
                periods,
                rate.energy_prices.len()
            )));
        }
        if !rate.power_prices.is_empty() && rate.power_prices.len() != periods {
            return Err(invalid(format!(
                "expected {} power prices or none, got {}",
                periods,
                rate.power_prices.len()
            )));
        }
        let negative = rate
            .energy_prices
            .iter()
            .chain(rate.power_prices.iter())
            .chain(std::iter::once(&rate.fixed_term_price))
            .any(|price| price.is_sign_negative() && !price.is_zero());
        if negative {
            return Err(invalid("prices must not be negative".to_string()));
        }

        self.rates.push(rate);
        Ok(())
    }

    pub fn insert_margin(&mut self, margin: Margin) -> EngineResult<()> {
        DecimalRange::new("margin", "margin", margin.min_margin, margin.max_margin)?;

        if let Some(rate_type_id) = margin.rate_type_id {
            if self.rate_type(rate_type_id).is_none() {
                return Err(EngineError::RateTypeNotFound(rate_type_id));
            }
        }

        for existing in self
            .margins
            .iter()
            .filter(|m| !m.lifecycle.is_deleted() && m.rate_type_id == margin.rate_type_id)
        {
            if existing.margin_type != margin.margin_type {
                return Err(EngineError::MarginTypeConflict {
                    rate_type_id: margin.rate_type_id,
                });
            }
            if existing.range.overlaps(&margin.range) {
                return Err(EngineError::RangeOverlapDetected {
                    entity: "margin",
                    existing_id: existing.id,
                    new_id: margin.id,
                });
            }
        }

        self.margins.push(margin);
        Ok(())
    }

    pub fn insert_commission(&mut self, commission: Commission) -> EngineResult<()> {
        let invalid = |reason: &str| EngineError::InvalidAmount {
            entity: "commission",
            id: commission.id,
            reason: reason.to_string(),
        };
        match commission.amount {
            CommissionAmount::Flat(value) if value < Decimal::ZERO => {
                return Err(invalid("flat amount must not be negative"));
            }
            CommissionAmount::Percentage(value)
                if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED =>
            {
                return Err(invalid("percentage must be between 0 and 100"));
            }
            _ => {}
        }

        let clash = self
            .commissions
            .iter()
            .filter(|c| !c.lifecycle.is_deleted())
            .filter(|c| c.rate_ids.iter().any(|id| commission.applies_to_rate(*id)))
            .find(|c| commissions_collide(c, &commission));
        if let Some(existing) = clash {
            return Err(EngineError::RangeOverlapDetected {
                entity: "commission",
                existing_id: existing.id,
                new_id: commission.id,
            });
        }

        self.commissions.push(commission);
        Ok(())
    }

    pub fn insert_energy_cost(&mut self, cost: EnergyCost) {
        self.energy_costs.push(cost);
    }

    pub fn insert_other_cost(&mut self, cost: OtherCost) {
        self.other_costs.push(cost);
    }

    /// Soft-delete a rate type. Rates referencing it stay but become ineligible.
    pub fn delete_rate_type(&mut self, id: i64) -> EngineResult<()> {
        let rate_type = self
            .rate_types
            .iter_mut()
            .find(|rt| rt.id == id)
            .ok_or(EngineError::RateTypeNotFound(id))?;
        rate_type.lifecycle = Lifecycle::Deleted;
        Ok(())
    }

    pub fn delete_rate(&mut self, id: i64) -> EngineResult<()> {
        let rate = self
            .rates
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(EngineError::RateNotFound(id))?;
        rate.lifecycle = Lifecycle::Deleted;
        Ok(())
    }
}

/// Two commissions on a shared rate collide when they would both match the
/// same client with the same kind of rule.
fn commissions_collide(a: &Commission, b: &Commission) -> bool {
    if a.rate_type_segmentation != b.rate_type_segmentation {
        return false;
    }
    if a.rate_type_segmentation {
        return a.rate_type_id == b.rate_type_id;
    }
    optional_overlap(a.consumption_range.as_ref(), b.consumption_range.as_ref())
        && optional_overlap(a.power_range.as_ref(), b.power_range.as_ref())
}

// Absent range = unbounded
fn optional_overlap(a: Option<&DecimalRange>, b: Option<&DecimalRange>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.overlaps(b),
        _ => true,
    }
}
