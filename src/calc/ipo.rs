//! IPO listing return: price path of a newly listed share hitting its daily
//! upper circuit

use super::money::{round_money, round_percent};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Largest price rise allowed in one trading day
pub const DAILY_CIRCUIT_LIMIT: Decimal = dec!(0.10);

/// Upper bound on simulated trading days
pub const MAX_CIRCUIT_DAYS: u32 = 200;

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum IpoError {
    #[error("number of shares allotted must be positive")]
    MissingShares,
    #[error("issue price per share must be positive")]
    MissingIssuePrice,
    #[error("listed price per share must be positive")]
    MissingListedPrice,
    #[error("enter a positive number of circuits or a positive return percentage")]
    MissingTarget,
    #[error("target needs more than {MAX_CIRCUIT_DAYS} trading days")]
    TooManyDays,
    #[error("investment amount is too large to calculate")]
    AmountOverflow,
}

/// How far the listed price is expected to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IpoTarget {
    /// Consecutive days closing at the upper circuit
    Circuits(u32),
    /// Total rise over the listed price, in percent
    ReturnPercent(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpoInput {
    pub shares_allotted: u64,
    pub issue_price: Option<Decimal>,
    pub listed_price: Option<Decimal>,
    pub target: IpoTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CircuitDay {
    pub day: u32,
    pub open_price: Decimal,
    pub increase: Decimal,
    pub close_price: Decimal,
    /// Close minus the listed price
    pub cumulative_increase: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpoResult {
    pub total_investment: Decimal,
    pub total_return_amount: Decimal,
    pub total_profit: Decimal,
    pub final_share_price: Decimal,
    pub return_pct: Decimal,
    pub days: Vec<CircuitDay>,
}

pub fn calculate_ipo(input: &IpoInput) -> Result<IpoResult, IpoError> {
    if input.shares_allotted == 0 {
        return Err(IpoError::MissingShares);
    }
    let issue_price = positive(input.issue_price).ok_or(IpoError::MissingIssuePrice)?;
    let listed_price = positive(input.listed_price).ok_or(IpoError::MissingListedPrice)?;

    let (final_price, days) = match input.target {
        IpoTarget::Circuits(0) => return Err(IpoError::MissingTarget),
        IpoTarget::Circuits(n) if n > MAX_CIRCUIT_DAYS => return Err(IpoError::TooManyDays),
        IpoTarget::Circuits(n) => circuit_path(listed_price, n)?,
        IpoTarget::ReturnPercent(pct) if pct <= Decimal::ZERO => {
            return Err(IpoError::MissingTarget)
        }
        IpoTarget::ReturnPercent(pct) => {
            let target = listed_price
                .checked_mul(Decimal::ONE + pct / Decimal::ONE_HUNDRED)
                .ok_or(IpoError::AmountOverflow)?;
            (target, path_to_target(listed_price, target)?)
        }
    };
    log::debug!(
        "IPO listed at {} reaches {} after {} day(s)",
        listed_price,
        final_price,
        days.len()
    );

    let shares = Decimal::from(input.shares_allotted);
    let total_investment = shares
        .checked_mul(issue_price)
        .map(round_money)
        .ok_or(IpoError::AmountOverflow)?;
    let total_return_amount = shares
        .checked_mul(final_price)
        .map(round_money)
        .ok_or(IpoError::AmountOverflow)?;

    let return_pct = (final_price - listed_price)
        .checked_div(listed_price)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round_percent)
        .ok_or(IpoError::AmountOverflow)?;

    Ok(IpoResult {
        total_investment,
        total_return_amount,
        total_profit: round_money(total_return_amount - total_investment),
        final_share_price: round_money(final_price),
        return_pct,
        days,
    })
}

/// `n` consecutive upper-circuit days from the listed price
fn circuit_path(listed_price: Decimal, n: u32) -> Result<(Decimal, Vec<CircuitDay>), IpoError> {
    let mut price = listed_price;
    let mut days = Vec::with_capacity(n as usize);
    for day in 1..=n {
        let increase = circuit_increase(price)?;
        let day = circuit_day(day, price, increase, listed_price)?;
        price = day.close;
        days.push(day.rounded);
    }
    Ok((price, days))
}

/// Upper-circuit days until the target is within one day's limit; the last
/// day closes exactly at the target.
fn path_to_target(listed_price: Decimal, target: Decimal) -> Result<Vec<CircuitDay>, IpoError> {
    let mut price = listed_price;
    let mut days = Vec::new();
    let mut day = 1;
    loop {
        let increase = circuit_increase(price)?;
        let next = circuit_day(day, price, increase, listed_price)?;
        if next.close >= target {
            break;
        }
        if day >= MAX_CIRCUIT_DAYS {
            return Err(IpoError::TooManyDays);
        }
        price = next.close;
        days.push(next.rounded);
        day += 1;
    }
    days.push(circuit_day(day, price, target - price, listed_price)?.rounded);
    Ok(days)
}

fn circuit_increase(price: Decimal) -> Result<Decimal, IpoError> {
    price
        .checked_mul(DAILY_CIRCUIT_LIMIT)
        .ok_or(IpoError::AmountOverflow)
}

/// A trading day with its unrounded close, which the next day opens at
struct StepDay {
    close: Decimal,
    rounded: CircuitDay,
}

fn circuit_day(
    day: u32,
    open: Decimal,
    increase: Decimal,
    listed_price: Decimal,
) -> Result<StepDay, IpoError> {
    let close = open.checked_add(increase).ok_or(IpoError::AmountOverflow)?;
    Ok(StepDay {
        close,
        rounded: CircuitDay {
            day,
            open_price: round_money(open),
            increase: round_money(increase),
            close_price: round_money(close),
            cumulative_increase: round_money(close - listed_price),
        },
    })
}

fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}

impl IpoResult {
    /// Trading days needed, as a whole number for display
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Average daily rise over the path, in percent
    pub fn average_daily_pct(&self) -> Option<Decimal> {
        let count = Decimal::from(self.day_count());
        if count.is_zero() {
            return None;
        }
        Some(round_percent(self.return_pct / count))
    }

    /// Profit per share held
    pub fn profit_per_share(&self, shares_allotted: u64) -> Option<Decimal> {
        (shares_allotted > 0)
            .then(|| round_money(self.total_profit / Decimal::from(shares_allotted)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(target: IpoTarget) -> IpoInput {
        IpoInput {
            shares_allotted: 10,
            issue_price: Some(dec!(100)),
            listed_price: Some(dec!(100)),
            target,
        }
    }

    #[test]
    fn three_circuits() {
        let result = calculate_ipo(&input(IpoTarget::Circuits(3))).unwrap();
        assert_eq!(result.days.len(), 3);
        assert_eq!(result.days[0].close_price, dec!(110.00));
        assert_eq!(result.days[1].increase, dec!(11.00));
        assert_eq!(result.days[1].close_price, dec!(121.00));
        assert_eq!(result.days[2].increase, dec!(12.10));
        assert_eq!(result.days[2].cumulative_increase, dec!(33.10));
        assert_eq!(result.final_share_price, dec!(133.10));
        assert_eq!(result.return_pct, dec!(33.10));
        assert_eq!(result.total_investment, dec!(1000.00));
        assert_eq!(result.total_return_amount, dec!(1331.00));
        assert_eq!(result.total_profit, dec!(331.00));
    }

    #[test]
    fn listed_above_issue_price() {
        let mut ipo = input(IpoTarget::Circuits(1));
        ipo.listed_price = Some(dec!(200));
        let result = calculate_ipo(&ipo).unwrap();
        assert_eq!(result.final_share_price, dec!(220.00));
        assert_eq!(result.return_pct, dec!(10.00));
        assert_eq!(result.total_profit, dec!(1200.00));
        assert_eq!(result.profit_per_share(10), Some(dec!(120.00)));
    }

    #[test]
    fn return_percent_ends_at_target() {
        let mut ipo = input(IpoTarget::ReturnPercent(dec!(25)));
        ipo.listed_price = Some(dec!(200));
        let result = calculate_ipo(&ipo).unwrap();
        assert_eq!(result.final_share_price, dec!(250.00));
        assert_eq!(result.return_pct, dec!(25.00));
        assert_eq!(result.days.len(), 3);
        assert_eq!(result.days[0].close_price, dec!(220.00));
        assert_eq!(result.days[1].close_price, dec!(242.00));
        assert_eq!(result.days[2].increase, dec!(8.00));
        assert_eq!(result.days[2].close_price, dec!(250.00));
        assert_eq!(result.days[2].cumulative_increase, dec!(50.00));
    }

    #[test]
    fn return_percent_of_one_circuit() {
        let result = calculate_ipo(&input(IpoTarget::ReturnPercent(dec!(10)))).unwrap();
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].increase, dec!(10.00));
        assert_eq!(result.average_daily_pct(), Some(dec!(10.00)));
    }

    #[test]
    fn small_return_percent_takes_one_day() {
        let result = calculate_ipo(&input(IpoTarget::ReturnPercent(dec!(4.5)))).unwrap();
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.final_share_price, dec!(104.50));
    }

    #[test]
    fn incomplete_input_has_no_result() {
        let mut ipo = input(IpoTarget::Circuits(3));
        ipo.shares_allotted = 0;
        assert_eq!(calculate_ipo(&ipo), Err(IpoError::MissingShares));

        let mut ipo = input(IpoTarget::Circuits(3));
        ipo.issue_price = None;
        assert_eq!(calculate_ipo(&ipo), Err(IpoError::MissingIssuePrice));

        let mut ipo = input(IpoTarget::Circuits(3));
        ipo.listed_price = Some(Decimal::ZERO);
        assert_eq!(calculate_ipo(&ipo), Err(IpoError::MissingListedPrice));

        assert_eq!(calculate_ipo(&input(IpoTarget::Circuits(0))), Err(IpoError::MissingTarget));
        assert_eq!(
            calculate_ipo(&input(IpoTarget::ReturnPercent(dec!(-5)))),
            Err(IpoError::MissingTarget)
        );
    }

    #[test]
    fn huge_listed_price_has_no_result() {
        let mut ipo = input(IpoTarget::Circuits(MAX_CIRCUIT_DAYS));
        ipo.shares_allotted = 1;
        ipo.listed_price = Some(dec!(1000000000000000000000));
        assert_eq!(calculate_ipo(&ipo), Err(IpoError::AmountOverflow));

        let mut ipo = input(IpoTarget::ReturnPercent(dec!(1000000000000000000000)));
        ipo.listed_price = Some(dec!(1000000));
        assert!(calculate_ipo(&ipo).is_err());
    }

    #[test]
    fn huge_investment_has_no_result() {
        let mut ipo = input(IpoTarget::Circuits(1));
        ipo.shares_allotted = u64::MAX;
        ipo.issue_price = Some(dec!(100000000000));
        assert_eq!(calculate_ipo(&ipo), Err(IpoError::AmountOverflow));
    }

    #[test]
    fn too_many_circuits() {
        assert_eq!(
            calculate_ipo(&input(IpoTarget::Circuits(MAX_CIRCUIT_DAYS + 1))),
            Err(IpoError::TooManyDays)
        );
    }
}
