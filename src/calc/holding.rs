use chrono::NaiveDate;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HoldingError {
    #[error("sale date {sold_on} is before purchase date {bought_on}")]
    SoldBeforeBought {
        bought_on: NaiveDate,
        sold_on: NaiveDate,
    },
    #[error("holding period of {0} days is too long")]
    TooLong(i64),
}

/// Calendar days between purchase and sale
pub fn holding_period_days(bought_on: NaiveDate, sold_on: NaiveDate) -> Result<u32, HoldingError> {
    let days = (sold_on - bought_on).num_days();
    if days < 0 {
        return Err(HoldingError::SoldBeforeBought { bought_on, sold_on });
    }
    u32::try_from(days).map_err(|_| HoldingError::TooLong(days))
}
