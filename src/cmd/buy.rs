//! Buy command - cost of purchasing shares

use super::display::{fee_rows, print_json, print_section, LineRow};
use super::RatesArgs;
use crate::calc::{compute_transaction, format_currency, BuyResult, TransactionInput, TransactionResult};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct BuyCommand {
    /// Number of shares
    #[arg(short, long)]
    quantity: u64,

    /// Price per share
    #[arg(short, long)]
    price: Decimal,

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

impl BuyCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let rates = self.rates.load()?;
        let input = TransactionInput::buy(self.quantity, self.price)
            .with_depository_charge(!self.no_dp)
            .with_extra_fees(self.extra_fees);
        let outcome = compute_transaction(&input, &rates);

        if self.json {
            print_json(&input, &outcome)?;
        } else {
            let result = outcome.as_ref().ok().and_then(TransactionResult::as_buy);
            self.print_tables(result);
        }
        outcome.map(|_| ()).map_err(Into::into)
    }

    fn print_tables(&self, result: Option<&BuyResult>) {
        println!();
        println!(
            "BUY {} shares @ {}",
            self.quantity,
            format_currency(self.price)
        );
        println!();

        let mut fees = fee_rows(result.map(|r| &r.leg));
        if !self.extra_fees.is_zero() {
            fees.push(LineRow::currency("Extra Fees", result.map(|r| r.extra_fees)));
        }
        print_section("Fee Breakdown", fees);

        print_section(
            "Final Result",
            vec![
                LineRow::currency("Total Cost", result.map(|r| r.total_cost)),
                LineRow::currency("Cost Per Share", result.map(|r| r.cost_per_share)),
            ],
        );
    }
}
