//! Share transaction cost, tax and return calculation

use super::money::{round_money, round_percent};
use super::rates::RateSchedule;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a transaction produced no result
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("quantity must be a positive whole number of shares")]
    MissingQuantity,
    #[error("buy price per share must be positive")]
    MissingBuyPrice,
    #[error("sell price per share must be positive")]
    MissingSellPrice,
    #[error("capital gains tax rate is required to calculate a sale")]
    MissingTaxRate,
    #[error("extra transaction fees cannot be negative")]
    NegativeExtraFees,
    #[error("transaction amount is too large to calculate")]
    AmountOverflow,
    #[error("total cost of acquisition is zero, return cannot be calculated")]
    ZeroAcquisitionCost,
    #[error("rate schedule has no commission tiers")]
    NoCommissionTiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestorClass {
    #[default]
    Individual,
    Institutional,
}

impl InvestorClass {
    pub fn display(&self) -> &'static str {
        match self {
            InvestorClass::Individual => "Individual",
            InvestorClass::Institutional => "Institutional",
        }
    }
}

impl std::fmt::Display for InvestorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Snapshot of a transaction as entered.
///
/// Prices and the tax rate are optional so that an incomplete entry can be
/// represented; `compute_transaction` rejects it instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub direction: Direction,
    pub quantity: u64,
    pub buy_price: Option<Decimal>,
    /// Only read for a sale
    pub sell_price: Option<Decimal>,
    pub investor_class: InvestorClass,
    /// Informational for a sale; the tax rate below is what gets applied
    pub holding_period_days: u32,
    /// Fraction, e.g. 0.05 for 5%. Only read for a sale.
    pub capital_gains_tax_rate: Option<Decimal>,
    pub include_depository_charge: bool,
    /// Bank or payment gateway charges, counted once per transaction
    pub extra_fees: Decimal,
}

impl TransactionInput {
    pub fn buy(quantity: u64, price: Decimal) -> Self {
        TransactionInput {
            direction: Direction::Buy,
            quantity,
            buy_price: Some(price),
            sell_price: None,
            investor_class: InvestorClass::Individual,
            holding_period_days: 0,
            capital_gains_tax_rate: None,
            include_depository_charge: true,
            extra_fees: Decimal::ZERO,
        }
    }

    pub fn sell(
        quantity: u64,
        buy_price: Decimal,
        sell_price: Decimal,
        investor_class: InvestorClass,
        capital_gains_tax_rate: Decimal,
    ) -> Self {
        TransactionInput {
            direction: Direction::Sell,
            quantity,
            buy_price: Some(buy_price),
            sell_price: Some(sell_price),
            investor_class,
            holding_period_days: 0,
            capital_gains_tax_rate: Some(capital_gains_tax_rate),
            include_depository_charge: true,
            extra_fees: Decimal::ZERO,
        }
    }

    pub fn with_depository_charge(self, include: bool) -> Self {
        TransactionInput {
            include_depository_charge: include,
            ..self
        }
    }

    pub fn with_extra_fees(self, extra_fees: Decimal) -> Self {
        TransactionInput { extra_fees, ..self }
    }

    pub fn with_holding_period(self, days: u32) -> Self {
        TransactionInput {
            holding_period_days: days,
            ..self
        }
    }
}

/// Fees charged on one leg (purchase or sale) of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LegBreakdown {
    pub gross_amount: Decimal,
    pub commission_rate: Decimal,
    pub broker_commission: Decimal,
    pub regulatory_fee: Decimal,
    pub depository_charge: Decimal,
}

impl LegBreakdown {
    fn compute(
        quantity: u64,
        price: Decimal,
        include_depository_charge: bool,
        rates: &RateSchedule,
    ) -> Result<Self, InputError> {
        let gross_amount = Decimal::from(quantity)
            .checked_mul(price)
            .map(round_money)
            .ok_or(InputError::AmountOverflow)?;
        let commission_rate = rates
            .commission_tier(gross_amount)
            .ok_or(InputError::NoCommissionTiers)?
            .rate;
        let leg = LegBreakdown {
            gross_amount,
            commission_rate,
            broker_commission: rates
                .broker_commission(gross_amount)
                .ok_or(InputError::AmountOverflow)?,
            regulatory_fee: rates
                .regulatory_fee(gross_amount)
                .ok_or(InputError::AmountOverflow)?,
            depository_charge: rates.depository_charge(include_depository_charge),
        };
        // total_fees() and the totals built on it are plain sums from here on
        checked_sum(&[
            leg.gross_amount,
            leg.broker_commission,
            leg.regulatory_fee,
            leg.depository_charge,
        ])?;
        log::debug!(
            "Leg: qty={}, price={}, gross={}, commission={} @ {}, regulatory={}, dp={}",
            quantity,
            price,
            leg.gross_amount,
            leg.broker_commission,
            leg.commission_rate,
            leg.regulatory_fee,
            leg.depository_charge
        );
        Ok(leg)
    }

    /// Commission + regulatory fee + DP charge
    pub fn total_fees(&self) -> Decimal {
        round_money(self.broker_commission + self.regulatory_fee + self.depository_charge)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyResult {
    #[serde(flatten)]
    pub leg: LegBreakdown,
    pub extra_fees: Decimal,
    pub total_cost: Decimal,
    pub cost_per_share: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SellResult {
    pub buy_leg: LegBreakdown,
    pub sell_leg: LegBreakdown,
    /// Counted once, as part of the cost of acquisition
    pub extra_fees: Decimal,
    pub total_cost_of_acquisition: Decimal,
    pub net_selling_proceeds: Decimal,
    pub capital_gain_before_tax: Decimal,
    pub capital_gains_tax_rate: Decimal,
    pub capital_gains_tax: Decimal,
    pub net_receivable: Decimal,
    pub net_profit_after_tax: Decimal,
    pub return_on_investment_pct: Decimal,
}

impl SellResult {
    /// All fees across both legs, including extra fees
    pub fn total_fees(&self) -> Decimal {
        round_money(self.buy_leg.total_fees() + self.sell_leg.total_fees() + self.extra_fees)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum TransactionResult {
    Buy(BuyResult),
    Sell(SellResult),
}

impl TransactionResult {
    /// The leg the transaction is named after: the purchase for a buy, the sale for a sell
    pub fn leg(&self) -> &LegBreakdown {
        match self {
            TransactionResult::Buy(buy) => &buy.leg,
            TransactionResult::Sell(sell) => &sell.sell_leg,
        }
    }

    pub fn as_buy(&self) -> Option<&BuyResult> {
        match self {
            TransactionResult::Buy(buy) => Some(buy),
            TransactionResult::Sell(_) => None,
        }
    }

    pub fn as_sell(&self) -> Option<&SellResult> {
        match self {
            TransactionResult::Sell(sell) => Some(sell),
            TransactionResult::Buy(_) => None,
        }
    }
}

/// Calculate the full cost and return breakdown of a share transaction.
///
/// Every currency value is rounded half-up to 2 decimals as soon as it is
/// produced, and later steps work from the rounded figures. An incomplete
/// input yields an `InputError` and never a partial result.
pub fn compute_transaction(
    input: &TransactionInput,
    rates: &RateSchedule,
) -> Result<TransactionResult, InputError> {
    if input.quantity == 0 {
        return Err(InputError::MissingQuantity);
    }
    let buy_price = positive(input.buy_price).ok_or(InputError::MissingBuyPrice)?;
    if input.extra_fees.is_sign_negative() && !input.extra_fees.is_zero() {
        return Err(InputError::NegativeExtraFees);
    }

    match input.direction {
        Direction::Buy => compute_buy(input, buy_price, rates).map(TransactionResult::Buy),
        Direction::Sell => {
            let sell_price = positive(input.sell_price).ok_or(InputError::MissingSellPrice)?;
            let tax_rate = input
                .capital_gains_tax_rate
                .ok_or(InputError::MissingTaxRate)?;
            compute_sell(input, buy_price, sell_price, tax_rate, rates).map(TransactionResult::Sell)
        }
    }
}

fn compute_buy(
    input: &TransactionInput,
    price: Decimal,
    rates: &RateSchedule,
) -> Result<BuyResult, InputError> {
    let leg = LegBreakdown::compute(input.quantity, price, input.include_depository_charge, rates)?;
    let extra_fees = round_money(input.extra_fees);
    let total_cost = round_money(checked_sum(&[leg.gross_amount, leg.total_fees(), extra_fees])?);
    let cost_per_share = round_money(total_cost / Decimal::from(input.quantity));

    Ok(BuyResult {
        leg,
        extra_fees,
        total_cost,
        cost_per_share,
    })
}

fn compute_sell(
    input: &TransactionInput,
    buy_price: Decimal,
    sell_price: Decimal,
    tax_rate: Decimal,
    rates: &RateSchedule,
) -> Result<SellResult, InputError> {
    let include_dp = input.include_depository_charge;
    let buy_leg = LegBreakdown::compute(input.quantity, buy_price, include_dp, rates)?;
    let sell_leg = LegBreakdown::compute(input.quantity, sell_price, include_dp, rates)?;
    let extra_fees = round_money(input.extra_fees);

    let total_cost_of_acquisition = round_money(checked_sum(&[
        buy_leg.gross_amount,
        buy_leg.total_fees(),
        extra_fees,
    ])?);
    checked_sum(&[buy_leg.total_fees(), sell_leg.total_fees(), extra_fees])?;
    if total_cost_of_acquisition.is_zero() {
        return Err(InputError::ZeroAcquisitionCost);
    }

    let net_selling_proceeds = round_money(sell_leg.gross_amount - sell_leg.total_fees());
    let capital_gain_before_tax = round_money(net_selling_proceeds - total_cost_of_acquisition);
    let capital_gains_tax =
        capital_gains_tax(capital_gain_before_tax, tax_rate).ok_or(InputError::AmountOverflow)?;
    log::debug!(
        "Gain {} taxed at {}: tax={}",
        capital_gain_before_tax,
        tax_rate,
        capital_gains_tax
    );

    let net_receivable = round_money(net_selling_proceeds - capital_gains_tax);
    let net_profit_after_tax = round_money(capital_gain_before_tax - capital_gains_tax);
    let return_on_investment_pct = net_profit_after_tax
        .checked_div(total_cost_of_acquisition)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round_percent)
        .ok_or(InputError::AmountOverflow)?;

    Ok(SellResult {
        buy_leg,
        sell_leg,
        extra_fees,
        total_cost_of_acquisition,
        net_selling_proceeds,
        capital_gain_before_tax,
        capital_gains_tax_rate: tax_rate,
        capital_gains_tax,
        net_receivable,
        net_profit_after_tax,
        return_on_investment_pct,
    })
}

/// Tax on a gain; a loss or break-even is neither taxed nor refunded.
/// `None` when the tax overflows.
pub fn capital_gains_tax(gain: Decimal, rate: Decimal) -> Option<Decimal> {
    if gain > Decimal::ZERO {
        gain.checked_mul(rate).map(round_money)
    } else {
        Some(round_money(Decimal::ZERO))
    }
}

fn checked_sum(values: &[Decimal]) -> Result<Decimal, InputError> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(*value))
        .ok_or(InputError::AmountOverflow)
}

fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| *v > Decimal::ZERO)
}
