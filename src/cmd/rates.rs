//! Rates command - print the active rate schedule

use super::display::{print_section, LineRow};
use super::RatesArgs;
use crate::calc::{format_currency, RateSchedule};
use clap::Args;
use rust_decimal::Decimal;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct RatesCommand {
    #[command(flatten)]
    rates: RatesArgs,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Tabled)]
struct TierRow {
    #[tabled(rename = "Gross Amount")]
    range: String,
    #[tabled(rename = "Commission")]
    rate: String,
}

impl RatesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schedule = self.rates.load()?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        } else {
            print_schedule(&schedule);
        }
        Ok(())
    }
}

fn print_schedule(schedule: &RateSchedule) {
    println!();
    print_section("Broker Commission", tier_rows(schedule));

    print_section(
        "Per Leg Charges",
        vec![
            LineRow::new("SEBON Fee", pct(schedule.regulatory_fee_rate)),
            LineRow::new("DP Charge", format_currency(schedule.depository_charge)),
        ],
    );

    let cgt = &schedule.capital_gains;
    print_section(
        "Capital Gains Tax",
        vec![
            LineRow::new(
                format!("Individual, held {}+ days", cgt.long_term_days),
                pct(cgt.individual_long_term),
            ),
            LineRow::new(
                format!("Individual, held under {} days", cgt.long_term_days),
                pct(cgt.individual_short_term),
            ),
            LineRow::new("Institutional", pct(cgt.institutional)),
            LineRow::new("Capital loss", "no tax"),
        ],
    );
}

fn tier_rows(schedule: &RateSchedule) -> Vec<TierRow> {
    let mut lower: Option<Decimal> = None;
    schedule
        .commission_tiers
        .iter()
        .map(|tier| {
            let range = match (lower, tier.up_to) {
                (None, Some(upper)) => format!("up to {}", format_currency(upper)),
                (Some(low), Some(upper)) => {
                    format!("{} - {}", format_currency(low), format_currency(upper))
                }
                (Some(low), None) => format!("above {}", format_currency(low)),
                (None, None) => "any amount".to_string(),
            };
            lower = tier.up_to;
            TierRow {
                range,
                rate: pct(tier.rate),
            }
        })
        .collect()
}

// Rates print at full precision, the SEBON fee is 0.015%
fn pct(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}
