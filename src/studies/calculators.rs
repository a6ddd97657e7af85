//! Core tariff calculation functions.
//!
//! Pure functions for tariff math - no database access.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::tariffs::models::Rate;

use super::models::CurrentPrices;
use super::profile::ConsumptionProfile;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use energy_broker::studies::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Anything that can be priced against a consumption profile.
pub trait PriceSchedule {
    /// €/kWh per period.
    fn energy_prices(&self) -> &[Decimal];
    /// €/kW·day per period; empty when there is no power term.
    fn power_prices(&self) -> &[Decimal];
    /// € per billing period.
    fn fixed_term_price(&self) -> Decimal;
}

impl PriceSchedule for Rate {
    fn energy_prices(&self) -> &[Decimal] {
        &self.energy_prices
    }

    fn power_prices(&self) -> &[Decimal] {
        &self.power_prices
    }

    fn fixed_term_price(&self) -> Decimal {
        self.fixed_term_price
    }
}

impl PriceSchedule for CurrentPrices {
    fn energy_prices(&self) -> &[Decimal] {
        &self.energy_prices
    }

    fn power_prices(&self) -> &[Decimal] {
        &self.power_prices
    }

    fn fixed_term_price(&self) -> Decimal {
        self.fixed_term_price
    }
}

/// Billing conventions used to annualize power and fixed terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostParameters {
    /// Days of power billed per year (power prices are per kW·day).
    pub power_billing_days: Decimal,
    /// Bills per year (fixed term is charged once per bill).
    pub billing_periods_per_year: Decimal,
}

impl Default for CostParameters {
    fn default() -> Self {
        Self {
            power_billing_days: dec!(365),
            billing_periods_per_year: dec!(12),
        }
    }
}

/// Annual cost terms, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostBreakdown {
    pub energy: Decimal,
    pub power: Decimal,
    pub fixed: Decimal,
}

impl CostBreakdown {
    pub fn subtotal(&self) -> Decimal {
        self.energy + self.power + self.fixed
    }

    /// Reported total, rounded to cents.
    pub fn total(&self) -> Decimal {
        round_money(self.subtotal(), 2)
    }
}

/// Price a schedule against a consumption profile.
///
/// energy = Σ energy_price[p] × consumption[p]
/// power  = Σ power_price[p] × contracted_power[p] × power_billing_days
/// fixed  = fixed_term_price × billing_periods_per_year
///
/// Energy prices must cover exactly the profile's periods. Power prices must
/// too, unless the schedule has no power term at all.
pub fn calculate_cost<S>(
    schedule: &S,
    profile: &ConsumptionProfile,
    params: &CostParameters,
) -> EngineResult<CostBreakdown>
where
    S: PriceSchedule + ?Sized,
{
    let periods = profile.periods();
    let energy_prices = schedule.energy_prices();
    let power_prices = schedule.power_prices();

    if energy_prices.len() != periods {
        return Err(EngineError::PeriodMismatch {
            what: "energy prices",
            expected: periods,
            actual: energy_prices.len(),
        });
    }
    if !power_prices.is_empty() && power_prices.len() != periods {
        return Err(EngineError::PeriodMismatch {
            what: "power prices",
            expected: periods,
            actual: power_prices.len(),
        });
    }

    let energy = energy_prices
        .iter()
        .zip(profile.consumption())
        .map(|(price, kwh)| *price * *kwh)
        .sum();

    let power = power_prices
        .iter()
        .zip(profile.contracted_power())
        .map(|(price, kw)| *price * *kw * params.power_billing_days)
        .sum();

    let fixed = schedule.fixed_term_price() * params.billing_periods_per_year;

    Ok(CostBreakdown {
        energy,
        power,
        fixed,
    })
}

/// Saving of an offer against the current cost, with its percentage.
///
/// The percentage is `None` when the current cost is zero.
pub fn calculate_saving(current_cost: Decimal, offer_cost: Decimal) -> (Decimal, Option<Decimal>) {
    let saving = current_cost - offer_cost;
    let percentage = if current_cost > Decimal::ZERO {
        Some(round_money(saving / current_cost * Decimal::ONE_HUNDRED, 2))
    } else {
        None
    };
    (saving, percentage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariffs::catalog::fixtures::rate;
    use crate::tariffs::models::EnergyType;

    fn flat_profile(kwh: Decimal, kw: Decimal) -> ConsumptionProfile {
        ConsumptionProfile::new(EnergyType::Electricity, &[kwh; 6], &[kw; 6], 365).unwrap()
    }

    fn energy_only(prices: Vec<Decimal>) -> CurrentPrices {
        CurrentPrices {
            energy_prices: prices,
            power_prices: vec![],
            fixed_term_price: Decimal::ZERO,
        }
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_bankers_rounding_to_even() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(2.345), 2), dec!(2.34));
        assert_eq!(round_money(dec!(2.355), 2), dec!(2.36));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
        assert_eq!(round_money(dec!(1.236), 2), dec!(1.24));
        assert_eq!(round_money(dec!(999999.995), 2), dec!(1000000.00));
    }

    // ==================== calculate_cost tests ====================

    #[test]
    fn test_energy_term_six_periods() {
        let prices = energy_only(vec![
            dec!(0.10),
            dec!(0.12),
            dec!(0.08),
            dec!(0.09),
            dec!(0.11),
            dec!(0.07),
        ]);
        let profile = flat_profile(dec!(100), dec!(0));

        let cost = calculate_cost(&prices, &profile, &CostParameters::default()).unwrap();
        assert_eq!(cost.energy, dec!(57.00));
        assert_eq!(cost.power, dec!(0));
        assert_eq!(cost.total(), dec!(57.00));
    }

    #[test]
    fn test_power_and_fixed_terms() {
        let schedule = CurrentPrices {
            energy_prices: vec![dec!(0); 6],
            power_prices: vec![dec!(0.1), dec!(0.05), dec!(0), dec!(0), dec!(0), dec!(0)],
            fixed_term_price: dec!(2.5),
        };
        let profile = flat_profile(dec!(10), dec!(4));

        let cost = calculate_cost(&schedule, &profile, &CostParameters::default()).unwrap();
        // (0.1 + 0.05) * 4 kW * 365 days
        assert_eq!(cost.power, dec!(219));
        // 2.5 * 12 bills
        assert_eq!(cost.fixed, dec!(30));
        assert_eq!(cost.total(), dec!(249.00));
    }

    #[test]
    fn test_custom_billing_parameters() {
        let schedule = CurrentPrices {
            energy_prices: vec![dec!(0); 6],
            power_prices: vec![dec!(1); 6],
            fixed_term_price: dec!(1),
        };
        let profile = flat_profile(dec!(1), dec!(1));
        let params = CostParameters {
            power_billing_days: dec!(366),
            billing_periods_per_year: dec!(6),
        };

        let cost = calculate_cost(&schedule, &profile, &params).unwrap();
        assert_eq!(cost.power, dec!(2196));
        assert_eq!(cost.fixed, dec!(6));
    }

    #[test]
    fn test_intermediate_precision_is_kept() {
        let prices = energy_only(vec![dec!(0.123456); 6]);
        let profile = flat_profile(dec!(1), dec!(0));

        let cost = calculate_cost(&prices, &profile, &CostParameters::default()).unwrap();
        assert_eq!(cost.energy, dec!(0.740736));
        assert_eq!(cost.total(), dec!(0.74));
    }

    #[test]
    fn test_period_mismatch() {
        let prices = energy_only(vec![dec!(0.1); 3]);
        let profile = flat_profile(dec!(100), dec!(0));
        assert_eq!(
            calculate_cost(&prices, &profile, &CostParameters::default()).unwrap_err(),
            EngineError::PeriodMismatch {
                what: "energy prices",
                expected: 6,
                actual: 3,
            }
        );

        let schedule = CurrentPrices {
            energy_prices: vec![dec!(0.1); 6],
            power_prices: vec![dec!(0.1); 2],
            fixed_term_price: dec!(0),
        };
        assert!(matches!(
            calculate_cost(&schedule, &profile, &CostParameters::default()).unwrap_err(),
            EngineError::PeriodMismatch { what: "power prices", .. }
        ));
    }

    #[test]
    fn test_gas_without_power_term() {
        let schedule = rate(1, 1, vec![dec!(0.06), dec!(0.05)]);
        let schedule = Rate {
            power_prices: vec![],
            ..schedule
        };
        let profile =
            ConsumptionProfile::new(EnergyType::Gas, &[dec!(8000), dec!(2000)], &[], 365).unwrap();

        let cost = calculate_cost(&schedule, &profile, &CostParameters::default()).unwrap();
        assert_eq!(cost.energy, dec!(580));
        assert_eq!(cost.power, dec!(0));
        assert_eq!(cost.fixed, dec!(60));
    }

    #[test]
    fn test_cost_is_never_negative() {
        let profiles = [
            flat_profile(dec!(0.001), dec!(0)),
            flat_profile(dec!(12000), dec!(15)),
        ];
        let rates = [
            rate(1, 1, vec![dec!(0); 6]),
            rate(2, 1, vec![dec!(0.3); 6]),
        ];
        for profile in &profiles {
            for rate in &rates {
                let cost = calculate_cost(rate, profile, &CostParameters::default()).unwrap();
                assert!(cost.total() >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_cost_invariant_under_matched_permutation() {
        let energy = vec![dec!(0.10), dec!(0.12), dec!(0.08), dec!(0.09), dec!(0.11), dec!(0.07)];
        let power = vec![dec!(0.09), dec!(0.04), dec!(0.02), dec!(0.02), dec!(0.01), dec!(0.01)];
        let consumption = [dec!(120), dec!(80), dec!(300), dec!(10), dec!(55), dec!(7)];
        let contracted = [dec!(5), dec!(5), dec!(6), dec!(6), dec!(6), dec!(9)];
        let order = [3, 0, 5, 1, 4, 2];

        let permute = |values: &[Decimal]| -> Vec<Decimal> { order.iter().map(|i| values[*i]).collect() };

        let original = CurrentPrices {
            energy_prices: energy.clone(),
            power_prices: power.clone(),
            fixed_term_price: dec!(3),
        };
        let permuted = CurrentPrices {
            energy_prices: permute(&energy),
            power_prices: permute(&power),
            fixed_term_price: dec!(3),
        };
        let profile =
            ConsumptionProfile::new(EnergyType::Electricity, &consumption, &contracted, 200).unwrap();
        let permuted_profile = ConsumptionProfile::new(
            EnergyType::Electricity,
            &permute(&consumption),
            &permute(&contracted),
            200,
        )
        .unwrap();

        let params = CostParameters::default();
        let a = calculate_cost(&original, &profile, &params).unwrap();
        let b = calculate_cost(&permuted, &permuted_profile, &params).unwrap();
        assert_eq!(a.total(), b.total());
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let schedule = rate(1, 1, vec![dec!(0.1337); 6]);
        let profile = flat_profile(dec!(321.5), dec!(4.4));
        let params = CostParameters::default();
        assert_eq!(
            calculate_cost(&schedule, &profile, &params).unwrap(),
            calculate_cost(&schedule, &profile, &params).unwrap()
        );
    }

    // ==================== calculate_saving tests ====================

    #[test]
    fn test_saving_against_current_cost() {
        let (saving, percentage) = calculate_saving(dec!(1200), dec!(900));
        assert_eq!(saving, dec!(300));
        assert_eq!(percentage, Some(dec!(25.00)));

        let (saving, percentage) = calculate_saving(dec!(900), dec!(1200));
        assert_eq!(saving, dec!(-300));
        assert_eq!(percentage, Some(dec!(-33.33)));

        let (_, percentage) = calculate_saving(dec!(0), dec!(10));
        assert_eq!(percentage, None);
    }
}
