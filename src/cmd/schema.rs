//! Schema command - print expected input formats

use crate::calc::{BatchRecord, RateSchedule};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Which format to describe
    #[arg(value_enum, default_value = "rates-json")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema of the --rates file
    RatesJson,
    /// Header row of the batch CSV
    CsvHeader,
    /// Batch CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::RatesJson => self.print_rates_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_rates_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(RateSchedule);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        let names: Vec<_> = BatchRecord::csv_schema().iter().map(|f| f.name).collect();
        println!("{}", names.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("Batch CSV Format");
        println!("================");
        println!();
        for field in BatchRecord::csv_schema() {
            let req = if field.required { "required" } else { "optional" };
            println!(
                "{:14} ({:8})  {}  [e.g. {}]",
                field.name, req, field.description, field.example
            );
        }
        println!();
        println!("Rates are percentages (5 = 5%). Prices and fees are in rupees.");
        Ok(())
    }
}
