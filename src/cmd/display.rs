//! Table and JSON rendering shared by the commands

use crate::calc::{format_currency, format_optional, format_percentage, LegBreakdown, PLACEHOLDER};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Label and value
#[derive(Debug, Clone, Tabled)]
pub struct LineRow {
    #[tabled(rename = "Item")]
    pub item: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
}

impl LineRow {
    pub fn new(item: impl Into<String>, amount: impl Into<String>) -> Self {
        LineRow {
            item: item.into(),
            amount: amount.into(),
        }
    }

    pub fn currency(item: impl Into<String>, amount: Option<Decimal>) -> Self {
        LineRow::new(item, format_optional(amount))
    }
}

/// Fee line for both legs of a sale
#[derive(Debug, Clone, Tabled)]
pub struct LegRow {
    #[tabled(rename = "Item")]
    pub item: String,
    #[tabled(rename = "Buy Leg")]
    pub buy: String,
    #[tabled(rename = "Sell Leg")]
    pub sell: String,
}

/// JSON envelope: `result` is null when the input gave no result
#[derive(Debug, Serialize)]
pub struct Output<'a, I: Serialize, R: Serialize> {
    pub input: &'a I,
    pub result: Option<&'a R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn print_json<I: Serialize, R: Serialize, E: std::fmt::Display>(
    input: &I,
    outcome: &Result<R, E>,
) -> anyhow::Result<()> {
    let output = Output {
        input,
        result: outcome.as_ref().ok(),
        error: outcome.as_ref().err().map(|e| e.to_string()),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn print_section<R: Tabled>(title: &str, rows: Vec<R>) {
    println!("{}", title);
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    println!();
}

pub fn commission_label(leg: Option<&LegBreakdown>) -> String {
    match leg {
        Some(leg) => format!(
            "Broker Commission ({})",
            format_percentage(leg.commission_rate * Decimal::ONE_HUNDRED)
        ),
        None => "Broker Commission".to_string(),
    }
}

/// Fee breakdown of one leg; every amount is a placeholder without a result
pub fn fee_rows(leg: Option<&LegBreakdown>) -> Vec<LineRow> {
    vec![
        LineRow::currency("Total Amount", leg.map(|l| l.gross_amount)),
        LineRow::currency(commission_label(leg), leg.map(|l| l.broker_commission)),
        LineRow::currency("SEBON Fee", leg.map(|l| l.regulatory_fee)),
        LineRow::currency("DP Charge", leg.map(|l| l.depository_charge)),
        LineRow::currency("Total Fees", leg.map(|l| l.total_fees())),
    ]
}

/// Fee breakdown of both legs side by side
pub fn leg_rows(legs: Option<(&LegBreakdown, &LegBreakdown)>) -> Vec<LegRow> {
    let row = |item: &str, value: fn(&LegBreakdown) -> Decimal| LegRow {
        item: item.to_string(),
        buy: format_optional(legs.map(|(buy, _)| value(buy))),
        sell: format_optional(legs.map(|(_, sell)| value(sell))),
    };
    let rate = |leg: &LegBreakdown| format_percentage(leg.commission_rate * Decimal::ONE_HUNDRED);

    vec![
        row("Total Amount", |l| l.gross_amount),
        LegRow {
            item: "Commission Rate".to_string(),
            buy: legs.map_or(PLACEHOLDER.to_string(), |(buy, _)| rate(buy)),
            sell: legs.map_or(PLACEHOLDER.to_string(), |(_, sell)| rate(sell)),
        },
        row("Broker Commission", |l| l.broker_commission),
        row("SEBON Fee", |l| l.regulatory_fee),
        row("DP Charge", |l| l.depository_charge),
        row("Total Fees", |l| l.total_fees()),
    ]
}

pub fn percent_or_placeholder(value: Option<Decimal>) -> String {
    value.map_or(PLACEHOLDER.to_string(), format_percentage)
}

pub fn signed_currency(value: Option<Decimal>) -> String {
    match value {
        Some(v) if v > Decimal::ZERO => format!("+{}", format_currency(v)),
        other => format_optional(other),
    }
}
