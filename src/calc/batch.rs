//! CSV batch format: one transaction per row in, one result per row out

use super::rates::{RateSchedule, TaxRateError};
use super::transaction::{
    compute_transaction, Direction, InputError, InvestorClass, TransactionInput, TransactionResult,
};
use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sharecalc_derive::CsvSchema;
use std::io::{Read, Write};

/// Description of one CSV column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
    pub example: &'static str,
}

/// Why a batch row has no result
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BatchRowError {
    #[error(transparent)]
    TaxRate(#[from] TaxRateError),
    #[error(transparent)]
    Input(#[from] InputError),
}

/// One transaction row of a batch file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, CsvSchema)]
pub struct BatchRecord {
    /// Identifier copied to the result row
    #[csv(example = "t1")]
    pub id: Option<String>,
    /// buy or sell
    #[csv(example = "sell")]
    pub direction: Direction,
    /// Number of shares (rows without it have no result)
    #[csv(example = "10")]
    pub quantity: Option<u64>,
    /// Purchase price per share
    #[csv(example = "100")]
    pub buy_price: Option<Decimal>,
    /// Sale price per share (sell rows)
    #[csv(example = "110")]
    pub sell_price: Option<Decimal>,
    /// individual or institutional, individual when empty
    #[csv(example = "individual")]
    pub investor: Option<InvestorClass>,
    /// Days between purchase and sale (sell rows)
    #[csv(example = "400")]
    pub holding_days: Option<u32>,
    /// Capital gains tax rate in percent, one the investor class is offered; picked from
    /// investor and holding days when empty
    #[csv(example = "5")]
    pub cgt_rate: Option<Decimal>,
    /// Charge the DP fee on each leg, true when empty
    #[csv(example = "true")]
    pub include_dp: Option<bool>,
    /// Bank or gateway charges
    #[csv(example = "0")]
    pub extra_fees: Option<Decimal>,
}

impl BatchRecord {
    /// The transaction this row describes, with the capital gains rate of a
    /// sale checked and defaulted the same way the `sell` command does
    pub fn to_input(&self, rates: &RateSchedule) -> Result<TransactionInput, TaxRateError> {
        let investor_class = self.investor.unwrap_or_default();
        let capital_gains_tax_rate = match self.direction {
            Direction::Buy => None,
            Direction::Sell => Some(rates.select_cgt_rate(
                investor_class,
                self.cgt_rate.map(|pct| pct / Decimal::ONE_HUNDRED),
                self.holding_days,
            )?),
        };

        Ok(TransactionInput {
            direction: self.direction,
            quantity: self.quantity.unwrap_or(0),
            buy_price: self.buy_price,
            sell_price: self.sell_price,
            investor_class,
            holding_period_days: self.holding_days.unwrap_or(0),
            capital_gains_tax_rate,
            include_depository_charge: self.include_dp.unwrap_or(true),
            extra_fees: self.extra_fees.unwrap_or(Decimal::ZERO),
        })
    }
}

/// Result row of a batch; every value is empty when the row had no result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResultRow {
    pub id: String,
    pub status: String,
    pub gross_amount: Option<Decimal>,
    pub broker_commission: Option<Decimal>,
    pub regulatory_fee: Option<Decimal>,
    pub depository_charge: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub cost_per_share: Option<Decimal>,
    pub net_selling_proceeds: Option<Decimal>,
    pub capital_gain: Option<Decimal>,
    pub capital_gains_tax: Option<Decimal>,
    pub net_receivable: Option<Decimal>,
    pub roi_pct: Option<Decimal>,
    pub error: Option<String>,
}

impl BatchResultRow {
    pub fn new(id: String, outcome: &Result<TransactionResult, BatchRowError>) -> Self {
        match outcome {
            Ok(result) => {
                let leg = result.leg();
                let mut row = BatchResultRow {
                    id,
                    status: "ok".to_string(),
                    gross_amount: Some(leg.gross_amount),
                    broker_commission: Some(leg.broker_commission),
                    regulatory_fee: Some(leg.regulatory_fee),
                    depository_charge: Some(leg.depository_charge),
                    ..Default::default()
                };
                match result {
                    TransactionResult::Buy(buy) => {
                        row.total_cost = Some(buy.total_cost);
                        row.cost_per_share = Some(buy.cost_per_share);
                    }
                    TransactionResult::Sell(sell) => {
                        row.total_cost = Some(sell.total_cost_of_acquisition);
                        row.net_selling_proceeds = Some(sell.net_selling_proceeds);
                        row.capital_gain = Some(sell.capital_gain_before_tax);
                        row.capital_gains_tax = Some(sell.capital_gains_tax);
                        row.net_receivable = Some(sell.net_receivable);
                        row.roi_pct = Some(sell.return_on_investment_pct);
                    }
                }
                row
            }
            Err(err) => BatchResultRow {
                id,
                status: "no result".to_string(),
                error: Some(err.to_string()),
                ..Default::default()
            },
        }
    }
}

/// Read batch rows, numbering ids from 1 where the file has none
pub fn read_batch<R: Read>(reader: R) -> anyhow::Result<Vec<BatchRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        let mut record: BatchRecord =
            result.with_context(|| format!("invalid batch row {}", i + 1))?;
        if record.id.as_deref().is_none_or(str::is_empty) {
            record.id = Some((i + 1).to_string());
        }
        records.push(record);
    }
    Ok(records)
}

/// Compute every row; a row without a result never stops the batch
pub fn compute_batch(records: &[BatchRecord], rates: &RateSchedule) -> Vec<BatchResultRow> {
    records
        .iter()
        .map(|record| {
            let id = record.id.clone().unwrap_or_default();
            let outcome = record
                .to_input(rates)
                .map_err(BatchRowError::from)
                .and_then(|input| compute_transaction(&input, rates).map_err(BatchRowError::from));
            if let Err(err) = &outcome {
                log::warn!("Batch row {}: {}", id, err);
            }
            BatchResultRow::new(id, &outcome)
        })
        .collect()
}

pub fn write_csv<I, R, W>(records: I, writer: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = R>,
    R: Serialize,
    W: Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records.into_iter() {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const BATCH: &str = "\
id,direction,quantity,buy_price,sell_price,investor,holding_days,cgt_rate,include_dp,extra_fees
a,buy,10,100,,,,,,
b,sell,10,100,110,individual,400,,true,0
c,sell,10,100,110,individual,100,,,
d,sell,1000,100,150,institutional,,,,
,buy,0,100,,,,,,
f,sell,10,100,110,institutional,,5,,
g,sell,10,100,110,individual,,,,
";

    fn results() -> Vec<BatchResultRow> {
        let records = read_batch(BATCH.as_bytes()).unwrap();
        compute_batch(&records, &RateSchedule::nepse())
    }

    #[test]
    fn reads_all_rows() {
        let records = read_batch(BATCH.as_bytes()).unwrap();
        assert_eq!(records.len(), 7);
        assert_eq!(records[0].direction, Direction::Buy);
        assert_eq!(records[0].sell_price, None);
        assert_eq!(records[3].investor, Some(InvestorClass::Institutional));
        assert_eq!(records[4].id.as_deref(), Some("5"));
    }

    #[test]
    fn buy_row() {
        let rows = results();
        assert_eq!(rows[0].status, "ok");
        assert_eq!(rows[0].total_cost, Some(dec!(1028.75)));
        assert_eq!(rows[0].cost_per_share, Some(dec!(102.88)));
        assert_eq!(rows[0].net_receivable, None);
    }

    #[test]
    fn sell_row_defaults_rate_from_holding_period() {
        let rows = results();
        // long term individual: 5%
        assert_eq!(rows[1].capital_gains_tax, Some(dec!(2.11)));
        assert_eq!(rows[1].net_receivable, Some(dec!(1068.76)));
        assert_eq!(rows[1].roi_pct, Some(dec!(3.89)));
        // short term individual: 7.5% of 42.12
        assert_eq!(rows[2].capital_gains_tax, Some(dec!(3.16)));
        // institutional: 10%
        assert_eq!(rows[3].capital_gains_tax, Some(dec!(4908.75)));
    }

    #[test]
    fn explicit_rate_is_percent() {
        let record = BatchRecord {
            id: None,
            direction: Direction::Sell,
            quantity: Some(10),
            buy_price: Some(dec!(100)),
            sell_price: Some(dec!(110)),
            investor: None,
            holding_days: Some(10),
            cgt_rate: Some(dec!(5)),
            include_dp: None,
            extra_fees: None,
        };
        let input = record.to_input(&RateSchedule::nepse()).unwrap();
        assert_eq!(input.capital_gains_tax_rate, Some(dec!(0.05)));
        assert!(input.include_depository_charge);
    }

    #[test]
    fn invalid_row_has_no_result() {
        let rows = results();
        assert_eq!(rows[4].status, "no result");
        assert_eq!(rows[4].gross_amount, None);
        assert_eq!(
            rows[4].error.as_deref(),
            Some("quantity must be a positive whole number of shares")
        );
    }

    #[test]
    fn rate_not_offered_for_class_has_no_result() {
        let rows = results();
        assert_eq!(rows[5].id, "f");
        assert_eq!(rows[5].status, "no result");
        assert_eq!(rows[5].capital_gains_tax, None);
        assert_eq!(
            rows[5].error.as_deref(),
            Some("5.00% is not a capital gains rate for institutional investors (choose from 10.00%)")
        );
    }

    #[test]
    fn individual_sale_without_holding_period_has_no_result() {
        let rows = results();
        assert_eq!(rows[6].status, "no result");
        assert_eq!(rows[6].net_receivable, None);
        assert!(rows[6].error.as_deref().is_some_and(|e| e.contains("holding period")));
    }

    #[test]
    fn writes_empty_cells_for_missing_values() {
        let mut out = Vec::new();
        write_csv(results(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("id,status,gross_amount"));
        assert!(lines.next().unwrap().starts_with("a,ok,1000.00,3.60,0.15,25.00,1028.75,102.88,,"));
    }

    #[test]
    fn malformed_row_is_an_error() {
        let csv = "direction,quantity\nhold,10\n";
        assert!(read_batch(csv.as_bytes()).is_err());
    }

    #[test]
    fn schema_lists_every_column() {
        let columns = BatchRecord::csv_schema();
        assert_eq!(columns.len(), 10);
        assert_eq!(columns[1].name, "direction");
        assert!(columns[1].required);
        assert!(!columns[0].required);
        assert_eq!(columns[2].example, "10");
        assert_eq!(columns[3].description, "Purchase price per share");
    }
}
