//! Batch command - calculate every transaction in a CSV file

use super::{open_input, RatesArgs};
use crate::calc::batch::{compute_batch, read_batch, write_csv};
use clap::Args;
use std::io;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BatchCommand {
    /// Transactions CSV file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    #[command(flatten)]
    rates: RatesArgs,
}

impl BatchCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let rates = self.rates.load()?;
        let records = read_batch(open_input(&self.file)?)?;
        log::info!("Read {} batch rows", records.len());

        let rows = compute_batch(&records, &rates);
        let failed = rows.iter().filter(|r| r.error.is_some()).count();
        if failed > 0 {
            log::warn!("{} of {} rows had no result", failed, rows.len());
        }
        write_csv(rows, io::stdout())
    }
}
