pub mod batch;
pub mod buy;
pub mod display;
pub mod ipo;
pub mod rates;
pub mod schema;
pub mod sell;

use crate::calc::{InvestorClass, RateSchedule};
use anyhow::Context;
use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Rate schedule selection shared by the calculating commands
#[derive(Args, Debug)]
pub struct RatesArgs {
    /// JSON rate schedule to use instead of the built-in NEPSE rates
    #[arg(long = "rates", value_name = "FILE")]
    path: Option<PathBuf>,
}

impl RatesArgs {
    pub fn load(&self) -> anyhow::Result<RateSchedule> {
        let Some(path) = &self.path else {
            return Ok(RateSchedule::default());
        };
        let file = File::open(path)
            .with_context(|| format!("cannot open rate schedule {}", path.display()))?;
        let schedule = RateSchedule::read_json(BufReader::new(file))
            .with_context(|| format!("invalid rate schedule {}", path.display()))?;
        log::info!("Loaded rate schedule from {}", path.display());
        Ok(schedule)
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum InvestorArg {
    #[default]
    Individual,
    Institutional,
}

impl From<InvestorArg> for InvestorClass {
    fn from(arg: InvestorArg) -> Self {
        match arg {
            InvestorArg::Individual => InvestorClass::Individual,
            InvestorArg::Institutional => InvestorClass::Institutional,
        }
    }
}

/// Open a file for reading, or stdin for "-"
pub fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::stdin().lock().read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        Ok(Box::new(io::Cursor::new(buffer)))
    } else {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        Ok(Box::new(BufReader::new(file)))
    }
}
