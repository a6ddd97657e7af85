//! Normalized consumption profile of a supply point.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::tariffs::models::EnergyType;

pub const DAYS_PER_YEAR: i64 = 365;

/// Per-period consumption projected to a full year, plus contracted power.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionProfile {
    energy_type: EnergyType,
    raw_consumption: Vec<Decimal>,
    consumption: Vec<Decimal>,
    contracted_power: Vec<Decimal>,
    analyzed_days: i64,
}

impl ConsumptionProfile {
    /// Validate and normalize raw readings taken over `analyzed_days`.
    ///
    /// `raw_consumption` (kWh) must have one entry per period of the energy
    /// type. `contracted_power` (kW) must too, or be empty when the supply has
    /// no power term, in which case every period is billed at zero kW.
    pub fn new(
        energy_type: EnergyType,
        raw_consumption: &[Decimal],
        contracted_power: &[Decimal],
        analyzed_days: i64,
    ) -> EngineResult<Self> {
        let periods = energy_type.periods();

        if analyzed_days <= 0 {
            return Err(EngineError::NonPositiveAnalyzedDays(analyzed_days));
        }
        if raw_consumption.len() != periods {
            return Err(EngineError::PeriodMismatch {
                what: "consumption",
                expected: periods,
                actual: raw_consumption.len(),
            });
        }
        if !contracted_power.is_empty() && contracted_power.len() != periods {
            return Err(EngineError::PeriodMismatch {
                what: "contracted power",
                expected: periods,
                actual: contracted_power.len(),
            });
        }
        if raw_consumption.iter().any(|kwh| *kwh < Decimal::ZERO) {
            return Err(EngineError::InvalidConsumptionRange {
                reason: "period consumption must not be negative".to_string(),
            });
        }
        if contracted_power.iter().any(|kw| *kw < Decimal::ZERO) {
            return Err(EngineError::InvalidConsumptionRange {
                reason: "contracted power must not be negative".to_string(),
            });
        }
        if raw_consumption.iter().all(|kwh| kwh.is_zero()) {
            return Err(EngineError::InvalidConsumptionRange {
                reason: "annual consumption is zero".to_string(),
            });
        }

        let scale = Decimal::from(DAYS_PER_YEAR) / Decimal::from(analyzed_days);
        let consumption = raw_consumption.iter().map(|kwh| *kwh * scale).collect();
        let contracted_power = if contracted_power.is_empty() {
            vec![Decimal::ZERO; periods]
        } else {
            contracted_power.to_vec()
        };

        Ok(Self {
            energy_type,
            raw_consumption: raw_consumption.to_vec(),
            consumption,
            contracted_power,
            analyzed_days,
        })
    }

    pub fn energy_type(&self) -> EnergyType {
        self.energy_type
    }

    pub fn periods(&self) -> usize {
        self.consumption.len()
    }

    /// Readings as supplied, before projection to a year.
    pub fn raw_consumption(&self) -> &[Decimal] {
        &self.raw_consumption
    }

    /// Yearly kWh per period.
    pub fn consumption(&self) -> &[Decimal] {
        &self.consumption
    }

    pub fn contracted_power(&self) -> &[Decimal] {
        &self.contracted_power
    }

    pub fn analyzed_days(&self) -> i64 {
        self.analyzed_days
    }

    pub fn annual_consumption(&self) -> Decimal {
        self.consumption.iter().copied().sum()
    }

    pub fn max_power(&self) -> Decimal {
        self.contracted_power
            .iter()
            .copied()
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}
