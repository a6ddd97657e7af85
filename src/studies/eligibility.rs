//! Narrow the rate catalog to rates a supply point can legally contract.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use crate::error::{EngineError, EngineResult};
use crate::tariffs::catalog::TariffCatalog;
use crate::tariffs::models::{EnergyType, Rate, RateType};

use super::models::SupplyPoint;

/// Why a rate was left out of a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    Deleted,
    Inactive,
    UnknownRateType,
    EnergyTypeMismatch,
    PowerOutOfRange,
    ConsumptionOutOfRange,
    RenewableOnly,
    OutsideValidity,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Exclusion::Deleted => "deleted",
            Exclusion::Inactive => "inactive",
            Exclusion::UnknownRateType => "unknown rate type",
            Exclusion::EnergyTypeMismatch => "energy type mismatch",
            Exclusion::PowerOutOfRange => "power out of range",
            Exclusion::ConsumptionOutOfRange => "consumption out of range",
            Exclusion::RenewableOnly => "renewable supply points only",
            Exclusion::OutsideValidity => "not offered on this date",
        };
        f.write_str(text)
    }
}

/// Outcome of filtering a catalog for one supply point.
#[derive(Debug, Clone)]
pub struct EligibilityReport<'a> {
    /// Eligible rates in catalog insertion order.
    pub eligible: Vec<&'a Rate>,
    pub excluded: Vec<(i64, Exclusion)>,
}

/// Filter every catalog rate against a supply point and its annual consumption.
///
/// Fails with `PowerRangeMissing` when an electricity rate type of the right
/// energy type has no power range to check against.
pub fn filter_eligible<'a>(
    catalog: &'a TariffCatalog,
    supply_point: &SupplyPoint,
    annual_consumption: Decimal,
    as_of: NaiveDate,
) -> EngineResult<EligibilityReport<'a>> {
    let mut report = EligibilityReport {
        eligible: Vec::new(),
        excluded: Vec::new(),
    };

    for rate in catalog.rates() {
        let verdict = match catalog.rate_type(rate.rate_type_id) {
            Some(rate_type) => check_rate(rate, rate_type, supply_point, annual_consumption, as_of)?,
            None => Some(Exclusion::UnknownRateType),
        };
        match verdict {
            None => report.eligible.push(rate),
            Some(reason) => report.excluded.push((rate.id, reason)),
        }
    }

    Ok(report)
}

fn check_rate(
    rate: &Rate,
    rate_type: &RateType,
    supply_point: &SupplyPoint,
    annual_consumption: Decimal,
    as_of: NaiveDate,
) -> EngineResult<Option<Exclusion>> {
    if rate.lifecycle.is_deleted() || rate_type.lifecycle.is_deleted() {
        return Ok(Some(Exclusion::Deleted));
    }
    if !rate.is_active || !rate_type.is_active {
        return Ok(Some(Exclusion::Inactive));
    }
    if rate_type.energy_type != supply_point.energy_type {
        return Ok(Some(Exclusion::EnergyTypeMismatch));
    }

    match rate_type.power_range {
        Some(range) => {
            if !range.contains(supply_point.max_available_power()) {
                return Ok(Some(Exclusion::PowerOutOfRange));
            }
        }
        None if rate_type.energy_type == EnergyType::Electricity => {
            return Err(EngineError::PowerRangeMissing {
                rate_type_id: rate_type.id,
            });
        }
        None => {}
    }

    if let Some(range) = rate_type.consumption_range {
        if !range.contains(annual_consumption) {
            return Ok(Some(Exclusion::ConsumptionOutOfRange));
        }
    }
    if rate.is_full_renewable && !supply_point.is_renewable {
        return Ok(Some(Exclusion::RenewableOnly));
    }
    if !rate.is_valid_at(as_of) {
        return Ok(Some(Exclusion::OutsideValidity));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariffs::catalog::fixtures::*;
    use crate::tariffs::models::Lifecycle;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn supply_point(energy_type: EnergyType, max_power: Decimal) -> SupplyPoint {
        let mut point =
            SupplyPoint::new("ES0021000000000001AB", energy_type, vec![dec!(4.6); 6], false)
                .unwrap();
        point.max_available_power = Some(max_power);
        point
    }

    fn eligible_ids(report: &EligibilityReport<'_>) -> Vec<i64> {
        report.eligible.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_rate_in_power_and_consumption_range_is_eligible() {
        let catalog = electricity_catalog();
        let report = filter_eligible(
            &catalog,
            &supply_point(EnergyType::Electricity, dec!(10)),
            dec!(3000),
            today(),
        )
        .unwrap();
        assert_eq!(eligible_ids(&report), vec![10]);
        assert!(report.excluded.is_empty());
    }

    #[test]
    fn test_consumption_out_of_range_is_excluded() {
        let catalog = electricity_catalog();
        let report = filter_eligible(
            &catalog,
            &supply_point(EnergyType::Electricity, dec!(10)),
            dec!(6000),
            today(),
        )
        .unwrap();
        assert!(report.eligible.is_empty());
        assert_eq!(report.excluded, vec![(10, Exclusion::ConsumptionOutOfRange)]);
        assert_eq!(Exclusion::ConsumptionOutOfRange.to_string(), "consumption out of range");
    }

    #[test]
    fn test_power_out_of_range_is_excluded() {
        let catalog = electricity_catalog();
        let report = filter_eligible(
            &catalog,
            &supply_point(EnergyType::Electricity, dec!(20)),
            dec!(3000),
            today(),
        )
        .unwrap();
        assert_eq!(report.excluded, vec![(10, Exclusion::PowerOutOfRange)]);
    }

    #[test]
    fn test_energy_type_mismatch_always_excluded() {
        // Gas rate type with no ranges at all would match anything else
        let mut catalog = TariffCatalog::new();
        catalog.insert_rate_type(gas_rate_type(2, "RL.1")).unwrap();
        catalog
            .insert_rate(rate(20, 2, vec![dec!(0.05), dec!(0.04)]))
            .unwrap();

        let report = filter_eligible(
            &catalog,
            &supply_point(EnergyType::Electricity, dec!(10)),
            dec!(3000),
            today(),
        )
        .unwrap();
        assert!(report.eligible.is_empty());
        assert_eq!(report.excluded, vec![(20, Exclusion::EnergyTypeMismatch)]);
    }

    #[test]
    fn test_renewable_only_rates_need_renewable_supply() {
        let mut catalog = electricity_catalog();
        catalog
            .insert_rate(Rate {
                is_full_renewable: true,
                ..rate(11, 1, vec![dec!(0.1); 6])
            })
            .unwrap();

        let mut point = supply_point(EnergyType::Electricity, dec!(10));
        let report = filter_eligible(&catalog, &point, dec!(3000), today()).unwrap();
        assert_eq!(eligible_ids(&report), vec![10]);
        assert_eq!(report.excluded, vec![(11, Exclusion::RenewableOnly)]);

        point.is_renewable = true;
        let report = filter_eligible(&catalog, &point, dec!(3000), today()).unwrap();
        assert_eq!(eligible_ids(&report), vec![10, 11]);
    }

    #[test]
    fn test_deleted_and_inactive_are_excluded() {
        let mut catalog = electricity_catalog();
        catalog
            .insert_rate(Rate {
                is_active: false,
                ..rate(11, 1, vec![dec!(0.1); 6])
            })
            .unwrap();
        catalog
            .insert_rate(Rate {
                lifecycle: Lifecycle::Deleted,
                ..rate(12, 1, vec![dec!(0.1); 6])
            })
            .unwrap();

        let point = supply_point(EnergyType::Electricity, dec!(10));
        let report = filter_eligible(&catalog, &point, dec!(3000), today()).unwrap();
        assert_eq!(eligible_ids(&report), vec![10]);
        assert_eq!(
            report.excluded,
            vec![(11, Exclusion::Inactive), (12, Exclusion::Deleted)]
        );

        catalog.delete_rate_type(1).unwrap();
        let report = filter_eligible(&catalog, &point, dec!(3000), today()).unwrap();
        assert!(report.eligible.is_empty());
    }

    #[test]
    fn test_validity_window() {
        let mut catalog = electricity_catalog();
        catalog
            .insert_rate(Rate {
                valid_to: NaiveDate::from_ymd_opt(2024, 5, 31),
                ..rate(11, 1, vec![dec!(0.1); 6])
            })
            .unwrap();

        let point = supply_point(EnergyType::Electricity, dec!(10));
        let report = filter_eligible(&catalog, &point, dec!(3000), today()).unwrap();
        assert_eq!(report.excluded, vec![(11, Exclusion::OutsideValidity)]);
    }

    #[test]
    fn test_order_follows_catalog_insertion() {
        let mut catalog = electricity_catalog();
        catalog.insert_rate(rate(3, 1, vec![dec!(0.5); 6])).unwrap();
        catalog.insert_rate(rate(7, 1, vec![dec!(0.01); 6])).unwrap();

        let point = supply_point(EnergyType::Electricity, dec!(10));
        let report = filter_eligible(&catalog, &point, dec!(3000), today()).unwrap();
        assert_eq!(eligible_ids(&report), vec![10, 3, 7]);
    }

    #[test]
    fn test_electricity_rate_type_without_power_range_fails() {
        let rate_type = RateType {
            power_range: None,
            ..electricity_rate_type(1, "2.0TD")
        };
        let point = supply_point(EnergyType::Electricity, dec!(10));
        let err = check_rate(
            &rate(10, 1, vec![dec!(0.1); 6]),
            &rate_type,
            &point,
            dec!(3000),
            today(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::PowerRangeMissing { rate_type_id: 1 });
    }

    #[test]
    fn test_gas_rate_type_without_power_range_is_fine() {
        let mut catalog = TariffCatalog::new();
        catalog.insert_rate_type(gas_rate_type(2, "RL.1")).unwrap();
        catalog
            .insert_rate(rate(20, 2, vec![dec!(0.05), dec!(0.04)]))
            .unwrap();

        let point = SupplyPoint::new("ES0021000000000001AB", EnergyType::Gas, vec![], false).unwrap();
        let report = filter_eligible(&catalog, &point, dec!(9000), today()).unwrap();
        assert_eq!(eligible_ids(&report), vec![20]);
    }
}
