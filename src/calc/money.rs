use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol used for display
pub const CURRENCY_SYMBOL: &str = "Rs.";

/// Rendered in place of a value that could not be calculated
pub const PLACEHOLDER: &str = "-";

/// Round a currency amount half-up to 2 decimal places.
///
/// The result always carries a scale of 2 so that serialized values read as
/// `25.00` rather than `25`.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Round a percentage for display, same convention as currency amounts.
pub fn round_percent(value: Decimal) -> Decimal {
    round_money(value)
}

/// Format as currency with Indian digit grouping, e.g. `Rs. 12,34,567.89`
pub fn format_currency(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    format!("{}{} {}.{}", sign, CURRENCY_SYMBOL, group_indian(whole), fraction)
}

/// Format as a percentage with 2 decimals, e.g. `3.89%`
pub fn format_percentage(value: Decimal) -> String {
    format!("{:.2}%", round_percent(value))
}

/// Currency formatting that renders a missing value as the placeholder
pub fn format_optional(amount: Option<Decimal>) -> String {
    amount.map_or(PLACEHOLDER.to_string(), format_currency)
}

// Last three digits form one group, every group before that has two.
fn group_indian(whole: &str) -> String {
    if whole.len() <= 3 {
        return whole.to_string();
    }
    let (head, tail) = whole.split_at(whole.len() - 3);
    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}
