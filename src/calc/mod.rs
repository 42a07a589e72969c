pub mod batch;
pub mod holding;
pub mod ipo;
pub mod money;
pub mod rates;
pub mod transaction;

// Flat public surface for the commands.
pub use batch::BatchRecord;
pub use holding::holding_period_days;
pub use ipo::{calculate_ipo, CircuitDay, IpoInput, IpoResult, IpoTarget};
pub use money::{format_currency, format_optional, format_percentage, PLACEHOLDER};
pub use rates::RateSchedule;
pub use transaction::{
    compute_transaction, BuyResult, InvestorClass, LegBreakdown, SellResult, TransactionInput,
    TransactionResult,
};
