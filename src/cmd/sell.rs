//! Sell command - fees on both legs, capital gains tax and return

use super::display::{
    leg_rows, percent_or_placeholder, print_json, print_section, signed_currency, LegRow, LineRow,
};
use super::{InvestorArg, RatesArgs};
use crate::calc::{
    compute_transaction, format_currency, format_optional, format_percentage, holding_period_days,
    InvestorClass, RateSchedule, SellResult, TransactionInput, TransactionResult,
};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct SellCommand {
    /// Number of shares
    #[arg(short, long)]
    quantity: u64,

    /// Price per share paid when buying
    #[arg(short, long)]
    buy_price: Decimal,

    /// Price per share received when selling
    #[arg(short, long)]
    sell_price: Decimal,

    /// Investor class, decides which capital gains rates apply
    #[arg(short, long, value_enum, default_value_t = InvestorArg::Individual)]
    investor: InvestorArg,

    /// Days the shares were held
    #[arg(long, conflicts_with_all = ["bought_on", "sold_on"])]
    holding_days: Option<u32>,

    /// Purchase date (YYYY-MM-DD), used with --sold-on instead of --holding-days
    #[arg(long, requires = "sold_on")]
    bought_on: Option<NaiveDate>,

    /// Sale date (YYYY-MM-DD)
    #[arg(long, requires = "bought_on")]
    sold_on: Option<NaiveDate>,

    /// Capital gains tax rate in percent, e.g. 5, 7.5 or 10. Picked from the
    /// investor class and holding period when not given.
    #[arg(long)]
    cgt_rate: Option<Decimal>,

    /// Leave out the DP charge
    #[arg(long)]
    no_dp: bool,

    /// Bank or payment gateway charges
    #[arg(long, default_value_t = Decimal::ZERO)]
    extra_fees: Decimal,

    #[command(flatten)]
    rates: RatesArgs,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

impl SellCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let rates = self.rates.load()?;
        let investor: InvestorClass = self.investor.into();
        let holding_days = self.holding_days()?;
        let tax_rate = self.tax_rate(&rates, investor, holding_days)?;

        let input = TransactionInput::sell(
            self.quantity,
            self.buy_price,
            self.sell_price,
            investor,
            tax_rate,
        )
        .with_holding_period(holding_days.unwrap_or_default())
        .with_depository_charge(!self.no_dp)
        .with_extra_fees(self.extra_fees);
        let outcome = compute_transaction(&input, &rates);

        if self.json {
            print_json(&input, &outcome)?;
        } else {
            let result = outcome.as_ref().ok().and_then(TransactionResult::as_sell);
            self.print_tables(result, investor, holding_days, tax_rate);
        }
        outcome.map(|_| ()).map_err(Into::into)
    }

    fn holding_days(&self) -> anyhow::Result<Option<u32>> {
        match (self.holding_days, self.bought_on, self.sold_on) {
            (Some(days), _, _) => Ok(Some(days)),
            (None, Some(bought_on), Some(sold_on)) => {
                let days = holding_period_days(bought_on, sold_on)?;
                log::info!("Held from {} to {}: {} days", bought_on, sold_on, days);
                Ok(Some(days))
            }
            _ => Ok(None),
        }
    }

    fn tax_rate(
        &self,
        rates: &RateSchedule,
        investor: InvestorClass,
        holding_days: Option<u32>,
    ) -> anyhow::Result<Decimal> {
        let explicit = self.cgt_rate.map(|pct| pct / Decimal::ONE_HUNDRED);
        rates
            .select_cgt_rate(investor, explicit, holding_days)
            .context("give --holding-days, --bought-on/--sold-on or an offered --cgt-rate")
    }

    fn print_tables(
        &self,
        result: Option<&SellResult>,
        investor: InvestorClass,
        holding_days: Option<u32>,
        tax_rate: Decimal,
    ) {
        println!();
        println!(
            "SELL {} shares: bought @ {}, sold @ {}",
            self.quantity,
            format_currency(self.buy_price),
            format_currency(self.sell_price)
        );
        match holding_days {
            Some(days) => println!("{} investor, held {} days", investor, days),
            None => println!("{} investor", investor),
        }
        println!();

        let mut fees = leg_rows(result.map(|r| (&r.buy_leg, &r.sell_leg)));
        if !self.extra_fees.is_zero() {
            fees.push(LegRow {
                item: "Extra Fees".to_string(),
                buy: format_optional(result.map(|r| r.extra_fees)),
                sell: String::new(),
            });
        }
        print_section("Fee Breakdown", fees);

        print_section(
            "Tax Calculation",
            vec![
                LineRow::currency(
                    "Total Cost of Acquisition",
                    result.map(|r| r.total_cost_of_acquisition),
                ),
                LineRow::currency("Net Selling Price", result.map(|r| r.net_selling_proceeds)),
                LineRow::new(
                    "Capital Gain/Loss",
                    signed_currency(result.map(|r| r.capital_gain_before_tax)),
                ),
                LineRow::currency(
                    format!(
                        "Capital Gains Tax ({})",
                        format_percentage(tax_rate * Decimal::ONE_HUNDRED)
                    ),
                    result.map(|r| r.capital_gains_tax),
                ),
            ],
        );

        print_section(
            "Final Result",
            vec![
                LineRow::currency("Net Receivable", result.map(|r| r.net_receivable)),
                LineRow::new(
                    "Profit/Loss",
                    signed_currency(result.map(|r| r.net_profit_after_tax)),
                ),
                LineRow::new(
                    "ROI",
                    percent_or_placeholder(result.map(|r| r.return_on_investment_pct)),
                ),
                LineRow::currency("Total Fees", result.map(SellResult::total_fees)),
            ],
        );
    }
}
