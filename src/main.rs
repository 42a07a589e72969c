use clap::{Parser, Subcommand};

mod calc;
mod cmd;

/// Share transaction calculator for the Nepal Stock Exchange
#[derive(Parser, Debug)]
#[command(name = "sharecalc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cost of buying shares: commission, SEBON fee, DP charge, cost per share
    Buy(cmd::buy::BuyCommand),
    /// Fees on both legs, capital gains tax, net receivable and ROI of a sale
    Sell(cmd::sell::SellCommand),
    /// Listing return of IPO shares over upper-circuit days
    Ipo(cmd::ipo::IpoCommand),
    /// Calculate a CSV of transactions
    Batch(cmd::batch::BatchCommand),
    /// Print the rate schedule
    Rates(cmd::rates::RatesCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_env("RUST_LOG")
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Buy(cmd) => cmd.exec(),
        Command::Sell(cmd) => cmd.exec(),
        Command::Ipo(cmd) => cmd.exec(),
        Command::Batch(cmd) => cmd.exec(),
        Command::Rates(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
