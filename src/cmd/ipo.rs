//! IPO command - listing return of allotted shares

use super::display::{percent_or_placeholder, print_json, print_section, signed_currency, LineRow};
use crate::calc::{
    calculate_ipo, format_currency, CircuitDay, IpoInput, IpoResult, IpoTarget, PLACEHOLDER,
};
use clap::Args;
use rust_decimal::Decimal;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct IpoCommand {
    /// Number of shares allotted
    #[arg(short, long)]
    shares: u64,

    /// Issue price per share
    #[arg(short, long, default_value_t = Decimal::ONE_HUNDRED)]
    issue_price: Decimal,

    /// First listed price per share
    #[arg(short, long)]
    listed_price: Decimal,

    /// Consecutive days at the upper circuit
    #[arg(short, long, conflicts_with = "return_pct", required_unless_present = "return_pct")]
    circuits: Option<u32>,

    /// Total rise over the listed price, in percent
    #[arg(short, long)]
    return_pct: Option<Decimal>,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Tabled)]
struct DayRow {
    #[tabled(rename = "Day")]
    day: u32,
    #[tabled(rename = "Open")]
    open: String,
    #[tabled(rename = "Increase")]
    increase: String,
    #[tabled(rename = "Close")]
    close: String,
    #[tabled(rename = "Total Increase")]
    total_increase: String,
}

impl From<&CircuitDay> for DayRow {
    fn from(day: &CircuitDay) -> Self {
        DayRow {
            day: day.day,
            open: format_currency(day.open_price),
            increase: format_currency(day.increase),
            close: format_currency(day.close_price),
            total_increase: format_currency(day.cumulative_increase),
        }
    }
}

impl IpoCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let target = match (self.circuits, self.return_pct) {
            (Some(n), _) => IpoTarget::Circuits(n),
            (None, Some(pct)) => IpoTarget::ReturnPercent(pct),
            (None, None) => anyhow::bail!("give --circuits or --return-pct"),
        };
        let input = IpoInput {
            shares_allotted: self.shares,
            issue_price: Some(self.issue_price),
            listed_price: Some(self.listed_price),
            target,
        };
        let outcome = calculate_ipo(&input);

        if self.json {
            print_json(&input, &outcome)?;
        } else {
            self.print_tables(outcome.as_ref().ok());
        }
        outcome.map(|_| ()).map_err(Into::into)
    }

    fn print_tables(&self, result: Option<&IpoResult>) {
        println!();
        println!(
            "IPO {} shares issued @ {}, listed @ {}",
            self.shares,
            format_currency(self.issue_price),
            format_currency(self.listed_price)
        );
        println!();

        print_section(
            "Summary",
            vec![
                LineRow::currency("Total Investment", result.map(|r| r.total_investment)),
                LineRow::currency("Final Share Price", result.map(|r| r.final_share_price)),
                LineRow::currency("Total Return Amount", result.map(|r| r.total_return_amount)),
                LineRow::new("Total Profit", signed_currency(result.map(|r| r.total_profit))),
                LineRow::currency(
                    "Profit Per Share",
                    result.and_then(|r| r.profit_per_share(self.shares)),
                ),
                LineRow::new("Return", percent_or_placeholder(result.map(|r| r.return_pct))),
                LineRow::new(
                    "Trading Days",
                    result.map_or(PLACEHOLDER.to_string(), |r| r.day_count().to_string()),
                ),
                LineRow::new(
                    "Average Daily Rise",
                    percent_or_placeholder(result.and_then(IpoResult::average_daily_pct)),
                ),
            ],
        );

        if let Some(result) = result {
            let rows: Vec<DayRow> = result.days.iter().map(DayRow::from).collect();
            print_section("Daily Breakdown", rows);
        }
    }
}
