//! Brokerage and regulatory rate schedule

use super::money::{format_percentage, round_money};
use super::transaction::InvestorClass;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RateScheduleError {
    #[error("commission schedule has no tiers")]
    NoCommissionTiers,
    #[error("commission tier bounds must be strictly ascending: {previous} then {next}")]
    UnorderedTiers { previous: Decimal, next: Decimal },
    #[error("only the last commission tier may be unbounded")]
    UnboundedTierNotLast,
    #[error("negative rate in schedule: {0}")]
    NegativeRate(String),
}

/// Failure to load a rate schedule file
#[derive(Debug, thiserror::Error)]
pub enum RatesFileError {
    #[error("malformed rate schedule JSON")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] RateScheduleError),
}

/// A capital gains rate that cannot be used for a sale
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TaxRateError {
    #[error("{rate} is not a capital gains rate for {class} investors (choose from {options})")]
    NotOffered {
        rate: String,
        class: String,
        options: String,
    },
    #[error("a holding period or an explicit capital gains rate is needed for an individual investor")]
    NoHoldingPeriod,
}

/// One broker commission bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CommissionTier {
    /// Largest gross amount (inclusive) charged at this rate; none for the open-ended top tier
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub up_to: Option<Decimal>,
    /// Commission as a fraction of the gross amount (0.0036 = 0.36%)
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

impl CommissionTier {
    fn covers(&self, amount: Decimal) -> bool {
        self.up_to.is_none_or(|bound| amount <= bound)
    }
}

/// Capital gains tax rates keyed by investor class and holding period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CapitalGainsRates {
    /// Individual investor holding at least `long_term_days`
    #[schemars(with = "f64")]
    pub individual_long_term: Decimal,
    /// Individual investor holding fewer than `long_term_days`
    #[schemars(with = "f64")]
    pub individual_short_term: Decimal,
    /// Institutional investor, regardless of holding period
    #[schemars(with = "f64")]
    pub institutional: Decimal,
    /// Holding period in days from which a holding counts as long term
    pub long_term_days: u32,
}

/// Rate schedule for a share transaction.
///
/// Built once and passed by reference to the calculation; nothing mutates it
/// after construction. `RateSchedule::default()` is the NEPSE schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RateSchedule {
    /// Commission brackets, ordered by ascending upper bound
    pub commission_tiers: Vec<CommissionTier>,
    /// SEBON fee as a fraction of the gross amount, charged on every leg
    #[schemars(with = "f64")]
    pub regulatory_fee_rate: Decimal,
    /// Flat DP charge per transaction leg
    #[schemars(with = "f64")]
    pub depository_charge: Decimal,
    pub capital_gains: CapitalGainsRates,
}

impl Default for RateSchedule {
    fn default() -> Self {
        RateSchedule::nepse()
    }
}

impl RateSchedule {
    pub fn nepse() -> Self {
        RateSchedule {
            commission_tiers: vec![
                CommissionTier { up_to: Some(dec!(50000)), rate: dec!(0.0036) },
                CommissionTier { up_to: Some(dec!(500000)), rate: dec!(0.0033) },
                CommissionTier { up_to: Some(dec!(2000000)), rate: dec!(0.0031) },
                CommissionTier { up_to: Some(dec!(10000000)), rate: dec!(0.0027) },
                CommissionTier { up_to: None, rate: dec!(0.0024) },
            ],
            regulatory_fee_rate: dec!(0.00015),
            depository_charge: dec!(25),
            capital_gains: CapitalGainsRates {
                individual_long_term: dec!(0.05),
                individual_short_term: dec!(0.075),
                institutional: dec!(0.10),
                long_term_days: 365,
            },
        }
    }

    /// Read a schedule from JSON and validate it
    pub fn read_json<R: Read>(reader: R) -> Result<Self, RatesFileError> {
        let schedule: RateSchedule = serde_json::from_reader(reader)?;
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> Result<(), RateScheduleError> {
        let last = self
            .commission_tiers
            .len()
            .checked_sub(1)
            .ok_or(RateScheduleError::NoCommissionTiers)?;

        let mut previous: Option<Decimal> = None;
        for (i, tier) in self.commission_tiers.iter().enumerate() {
            if tier.rate.is_sign_negative() {
                return Err(RateScheduleError::NegativeRate(format!("commission tier {}", i + 1)));
            }
            match (previous, tier.up_to) {
                (_, None) if i != last => return Err(RateScheduleError::UnboundedTierNotLast),
                (Some(prev), Some(next)) if next <= prev => {
                    return Err(RateScheduleError::UnorderedTiers { previous: prev, next })
                }
                _ => {}
            }
            previous = tier.up_to;
        }

        let flat = [
            ("regulatory_fee_rate", self.regulatory_fee_rate),
            ("depository_charge", self.depository_charge),
            ("individual_long_term", self.capital_gains.individual_long_term),
            ("individual_short_term", self.capital_gains.individual_short_term),
            ("institutional", self.capital_gains.institutional),
        ];
        if let Some((name, _)) = flat.iter().find(|(_, rate)| rate.is_sign_negative()) {
            return Err(RateScheduleError::NegativeRate(name.to_string()));
        }
        Ok(())
    }

    /// The bracket a gross amount falls into: the first whose bound is at
    /// least the amount, or the last bracket above every bound. `None` only
    /// for a schedule without tiers.
    pub fn commission_tier(&self, gross_amount: Decimal) -> Option<&CommissionTier> {
        self.commission_tiers
            .iter()
            .find(|tier| tier.covers(gross_amount))
            .or_else(|| self.commission_tiers.last())
    }

    /// `None` without a commission tier or when the amount overflows
    pub fn broker_commission(&self, gross_amount: Decimal) -> Option<Decimal> {
        let tier = self.commission_tier(gross_amount)?;
        gross_amount.checked_mul(tier.rate).map(round_money)
    }

    pub fn regulatory_fee(&self, gross_amount: Decimal) -> Option<Decimal> {
        gross_amount
            .checked_mul(self.regulatory_fee_rate)
            .map(round_money)
    }

    pub fn depository_charge(&self, include: bool) -> Decimal {
        if include {
            round_money(self.depository_charge)
        } else {
            round_money(Decimal::ZERO)
        }
    }

    /// Capital gains rates an investor of this class may select
    pub fn cgt_rate_options(&self, class: InvestorClass) -> Vec<Decimal> {
        let cgt = &self.capital_gains;
        match class {
            InvestorClass::Individual => vec![cgt.individual_long_term, cgt.individual_short_term],
            InvestorClass::Institutional => vec![cgt.institutional],
        }
    }

    /// Rate pre-selected for an investor class and holding period
    pub fn default_cgt_rate(&self, class: InvestorClass, holding_period_days: u32) -> Decimal {
        let cgt = &self.capital_gains;
        match class {
            InvestorClass::Institutional => cgt.institutional,
            InvestorClass::Individual if holding_period_days >= cgt.long_term_days => {
                cgt.individual_long_term
            }
            InvestorClass::Individual => cgt.individual_short_term,
        }
    }

    /// Capital gains rate for a sale: the explicit rate when it is offered for
    /// the class, otherwise the class and holding period default. An
    /// individual needs one or the other.
    pub fn select_cgt_rate(
        &self,
        class: InvestorClass,
        explicit: Option<Decimal>,
        holding_period_days: Option<u32>,
    ) -> Result<Decimal, TaxRateError> {
        let options = self.cgt_rate_options(class);
        let percent = |rate: Decimal| format_percentage(rate * Decimal::ONE_HUNDRED);

        match (explicit, class, holding_period_days) {
            (Some(rate), _, _) if options.contains(&rate) => Ok(rate),
            (Some(rate), _, _) => Err(TaxRateError::NotOffered {
                rate: percent(rate),
                class: class.display().to_lowercase(),
                options: options
                    .iter()
                    .map(|r| percent(*r))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
            (None, InvestorClass::Institutional, days) => {
                Ok(self.default_cgt_rate(class, days.unwrap_or_default()))
            }
            (None, InvestorClass::Individual, Some(days)) => Ok(self.default_cgt_rate(class, days)),
            (None, InvestorClass::Individual, None) => Err(TaxRateError::NoHoldingPeriod),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nepse_schedule_is_valid() {
        assert_eq!(RateSchedule::nepse().validate(), Ok(()));
    }

    #[test]
    fn tier_bounds_are_inclusive() {
        let rates = RateSchedule::nepse();
        let rate = |amount: Decimal| rates.commission_tier(amount).map(|tier| tier.rate);
        assert_eq!(rate(dec!(50000)), Some(dec!(0.0036)));
        assert_eq!(rate(dec!(50000.01)), Some(dec!(0.0033)));
        assert_eq!(rate(dec!(500000)), Some(dec!(0.0033)));
        assert_eq!(rate(dec!(2000000)), Some(dec!(0.0031)));
        assert_eq!(rate(dec!(10000000)), Some(dec!(0.0027)));
        assert_eq!(rate(dec!(10000000.01)), Some(dec!(0.0024)));
    }

    #[test]
    fn commission_is_rounded() {
        let rates = RateSchedule::nepse();
        assert_eq!(rates.broker_commission(dec!(1000)), Some(dec!(3.60)));
        assert_eq!(rates.broker_commission(dec!(50000)), Some(dec!(180.00)));
        assert_eq!(rates.broker_commission(dec!(100000)), Some(dec!(330.00)));
        assert_eq!(rates.broker_commission(dec!(20000000)), Some(dec!(48000.00)));
        assert_eq!(rates.broker_commission(dec!(1234.56)), Some(dec!(4.44)));
    }

    #[test]
    fn amounts_above_bounded_tiers_use_last_rate() {
        let rates = RateSchedule {
            commission_tiers: vec![
                CommissionTier { up_to: Some(dec!(100)), rate: dec!(0.01) },
                CommissionTier { up_to: Some(dec!(1000)), rate: dec!(0.005) },
            ],
            ..RateSchedule::nepse()
        };
        assert_eq!(rates.validate(), Ok(()));
        assert_eq!(rates.commission_tier(dec!(5000)).map(|t| t.rate), Some(dec!(0.005)));
    }

    #[test]
    fn empty_schedule_has_no_tier() {
        let rates = RateSchedule {
            commission_tiers: vec![],
            ..RateSchedule::nepse()
        };
        assert_eq!(rates.commission_tier(dec!(1000)), None);
        assert_eq!(rates.broker_commission(dec!(1000)), None);
    }

    #[test]
    fn overflowing_fee_is_none() {
        let mut rates = RateSchedule::nepse();
        rates.regulatory_fee_rate = dec!(1000);
        assert_eq!(rates.regulatory_fee(Decimal::MAX), None);
    }

    #[test]
    fn regulatory_fee_and_dp_charge() {
        let rates = RateSchedule::nepse();
        assert_eq!(rates.regulatory_fee(dec!(1000)), Some(dec!(0.15)));
        assert_eq!(rates.regulatory_fee(dec!(1100)), Some(dec!(0.17)));
        assert_eq!(rates.depository_charge(true), dec!(25.00));
        assert_eq!(rates.depository_charge(false), Decimal::ZERO);
    }

    #[test]
    fn default_cgt_rate_by_class_and_holding() {
        let rates = RateSchedule::nepse();
        assert_eq!(rates.default_cgt_rate(InvestorClass::Individual, 365), dec!(0.05));
        assert_eq!(rates.default_cgt_rate(InvestorClass::Individual, 364), dec!(0.075));
        assert_eq!(rates.default_cgt_rate(InvestorClass::Institutional, 0), dec!(0.10));
        assert_eq!(rates.default_cgt_rate(InvestorClass::Institutional, 1000), dec!(0.10));
    }

    #[test]
    fn cgt_options_per_class() {
        let rates = RateSchedule::nepse();
        assert_eq!(
            rates.cgt_rate_options(InvestorClass::Individual),
            vec![dec!(0.05), dec!(0.075)]
        );
        assert_eq!(rates.cgt_rate_options(InvestorClass::Institutional), vec![dec!(0.10)]);
    }

    #[test]
    fn explicit_cgt_rate_must_be_offered_for_class() {
        let rates = RateSchedule::nepse();
        assert_eq!(
            rates.select_cgt_rate(InvestorClass::Individual, Some(dec!(0.05)), Some(10)),
            Ok(dec!(0.05))
        );
        let err = rates
            .select_cgt_rate(InvestorClass::Institutional, Some(dec!(0.05)), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "5.00% is not a capital gains rate for institutional investors (choose from 10.00%)"
        );
    }

    #[test]
    fn cgt_rate_defaults_need_holding_period_for_individual() {
        let rates = RateSchedule::nepse();
        assert_eq!(
            rates.select_cgt_rate(InvestorClass::Individual, None, Some(400)),
            Ok(dec!(0.05))
        );
        assert_eq!(
            rates.select_cgt_rate(InvestorClass::Institutional, None, None),
            Ok(dec!(0.10))
        );
        assert_eq!(
            rates.select_cgt_rate(InvestorClass::Individual, None, None),
            Err(TaxRateError::NoHoldingPeriod)
        );
    }

    #[test]
    fn rejects_empty_schedule() {
        let rates = RateSchedule {
            commission_tiers: vec![],
            ..RateSchedule::nepse()
        };
        assert_eq!(rates.validate(), Err(RateScheduleError::NoCommissionTiers));
    }

    #[test]
    fn rejects_unordered_tiers() {
        let rates = RateSchedule {
            commission_tiers: vec![
                CommissionTier { up_to: Some(dec!(1000)), rate: dec!(0.01) },
                CommissionTier { up_to: Some(dec!(500)), rate: dec!(0.005) },
            ],
            ..RateSchedule::nepse()
        };
        assert_eq!(
            rates.validate(),
            Err(RateScheduleError::UnorderedTiers {
                previous: dec!(1000),
                next: dec!(500)
            })
        );
    }

    #[test]
    fn rejects_unbounded_tier_in_middle() {
        let rates = RateSchedule {
            commission_tiers: vec![
                CommissionTier { up_to: None, rate: dec!(0.01) },
                CommissionTier { up_to: Some(dec!(500)), rate: dec!(0.005) },
            ],
            ..RateSchedule::nepse()
        };
        assert_eq!(rates.validate(), Err(RateScheduleError::UnboundedTierNotLast));
    }

    #[test]
    fn rejects_negative_rate() {
        let mut rates = RateSchedule::nepse();
        rates.regulatory_fee_rate = dec!(-0.1);
        assert_eq!(
            rates.validate(),
            Err(RateScheduleError::NegativeRate("regulatory_fee_rate".to_string()))
        );
    }

    #[test]
    fn reads_json_schedule() {
        let json = r#"{
            "commission_tiers": [
                { "up_to": 10000, "rate": 0.004 },
                { "rate": 0.002 }
            ],
            "regulatory_fee_rate": 0.0001,
            "depository_charge": 10,
            "capital_gains": {
                "individual_long_term": 0.05,
                "individual_short_term": 0.075,
                "institutional": 0.1,
                "long_term_days": 365
            }
        }"#;
        let rates = RateSchedule::read_json(json.as_bytes()).unwrap();
        assert_eq!(rates.commission_tiers.len(), 2);
        assert_eq!(rates.broker_commission(dec!(20000)), Some(dec!(40.00)));
        assert_eq!(rates.depository_charge(true), dec!(10.00));
    }

    #[test]
    fn json_schedule_is_validated() {
        let json = r#"{
            "commission_tiers": [],
            "regulatory_fee_rate": 0.0001,
            "depository_charge": 10,
            "capital_gains": {
                "individual_long_term": 0.05,
                "individual_short_term": 0.075,
                "institutional": 0.1,
                "long_term_days": 365
            }
        }"#;
        assert!(matches!(
            RateSchedule::read_json(json.as_bytes()),
            Err(RatesFileError::Invalid(RateScheduleError::NoCommissionTiers))
        ));
    }

    #[test]
    fn malformed_json_schedule() {
        assert!(matches!(
            RateSchedule::read_json("{".as_bytes()),
            Err(RatesFileError::Json(_))
        ));
    }
}
