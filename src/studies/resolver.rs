//! Margin and commission resolution for a candidate rate.
//!
//! Margins resolve in priority order:
//! 1. Rate-type specific
//! 2. Global
//!
//! Within a scope, and for commissions, the narrowest matching range wins and
//! equal widths fall back to the lowest id.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::tariffs::catalog::TariffCatalog;
use crate::tariffs::models::{Commission, CommissionAmount, Margin, MarginType, Rate, RateType};

use super::calculators::{round_money, CostBreakdown};

/// Client figures matched against margin and commission ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMetrics {
    /// kWh per year
    pub annual_consumption: Decimal,
    /// kW
    pub max_power: Decimal,
}

impl ClientMetrics {
    fn for_margin(&self, margin_type: MarginType) -> Decimal {
        match margin_type {
            MarginType::Consumption => self.annual_consumption,
            MarginType::Power => self.max_power,
        }
    }
}

/// Margin selected for a rate and the amount it adds to the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppliedMargin {
    pub margin_id: i64,
    pub min_margin: Decimal,
    pub max_margin: Decimal,
    /// €/kWh actually applied
    pub applied: Decimal,
    /// € per year
    pub amount: Decimal,
}

/// Commission selected for a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppliedCommission {
    pub commission_id: Option<i64>,
    /// € per year, rounded to cents
    pub total: Decimal,
}

/// Clamp a requested margin to the band. No request means the band minimum.
pub fn clamp_margin(requested: Option<Decimal>, min_margin: Decimal, max_margin: Decimal) -> Decimal {
    match requested {
        Some(value) => value.clamp(min_margin, max_margin),
        None => min_margin,
    }
}

/// Resolve the margin for a rate type and apply the requested profit margin.
pub fn resolve_margin(
    catalog: &TariffCatalog,
    rate_type: &RateType,
    metrics: &ClientMetrics,
    requested: Option<Decimal>,
) -> EngineResult<AppliedMargin> {
    let margin = catalog
        .margin_for(Some(rate_type.id))
        .ok()
        .and_then(|margins| pick_margin(margins, metrics))
        .or_else(|| {
            catalog
                .margin_for(None)
                .ok()
                .and_then(|margins| pick_margin(margins, metrics))
        })
        .ok_or(EngineError::MarginNotFound {
            rate_type_id: Some(rate_type.id),
        })?;

    let applied = clamp_margin(requested, margin.min_margin, margin.max_margin);

    Ok(AppliedMargin {
        margin_id: margin.id,
        min_margin: margin.min_margin,
        max_margin: margin.max_margin,
        applied,
        amount: applied * metrics.annual_consumption,
    })
}

fn pick_margin<'a>(margins: Vec<&'a Margin>, metrics: &ClientMetrics) -> Option<&'a Margin> {
    margins
        .into_iter()
        .filter(|m| m.range.contains(metrics.for_margin(m.margin_type)))
        .min_by(|a, b| {
            a.range
                .width()
                .cmp(&b.range.width())
                .then_with(|| a.id.cmp(&b.id))
        })
}

/// Find the commission that applies to a client on a rate, if any.
///
/// A commission matches when it is segmented by the rate's rate type, or when
/// both its consumption and power ranges contain the client's figures (a
/// missing range matches everything).
pub fn resolve_commission<'a>(
    catalog: &'a TariffCatalog,
    rate: &Rate,
    metrics: &ClientMetrics,
) -> Option<&'a Commission> {
    catalog
        .commissions_for(rate)
        .into_iter()
        .filter(|c| commission_matches(c, rate, metrics))
        .min_by(|a, b| {
            consumption_width(a)
                .cmp(&consumption_width(b))
                .then_with(|| a.id.cmp(&b.id))
        })
}

fn commission_matches(commission: &Commission, rate: &Rate, metrics: &ClientMetrics) -> bool {
    if commission.rate_type_segmentation && commission.rate_type_id == Some(rate.rate_type_id) {
        return true;
    }
    let consumption_ok = commission
        .consumption_range
        .map_or(true, |r| r.contains(metrics.annual_consumption));
    let power_ok = commission
        .power_range
        .map_or(true, |r| r.contains(metrics.max_power));
    !commission.rate_type_segmentation && consumption_ok && power_ok
}

// Unbounded sorts last
fn consumption_width(commission: &Commission) -> Decimal {
    commission
        .consumption_range
        .map_or(Decimal::MAX, |r| r.width())
}

/// Annual commission of a resolved rule over an offer's cost terms.
pub fn commission_amount(commission: Option<&Commission>, cost: &CostBreakdown) -> AppliedCommission {
    let Some(commission) = commission else {
        return AppliedCommission {
            commission_id: None,
            total: Decimal::ZERO,
        };
    };

    let total = match commission.amount {
        CommissionAmount::Flat(value) => value,
        CommissionAmount::Percentage(percentage) => {
            cost.energy * percentage / Decimal::ONE_HUNDRED
        }
    };

    AppliedCommission {
        commission_id: Some(commission.id),
        total: round_money(total, 2),
    }
}
