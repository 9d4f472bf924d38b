//! Per-token prices for known models (USD).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// (input, output) cost per token for `model`. Unknown models cost zero.
pub fn model_cost(model: &str) -> (Decimal, Decimal) {
    let per_million = match model {
        m if m.starts_with("gpt-4o-mini") => (dec!(0.15), dec!(0.60)),
        m if m.starts_with("gpt-4o") => (dec!(2.50), dec!(10.00)),
        m if m.starts_with("gpt-4.1-mini") => (dec!(0.40), dec!(1.60)),
        m if m.starts_with("gpt-4.1") => (dec!(2.00), dec!(8.00)),
        m if m.starts_with("claude-3-5-haiku") => (dec!(0.80), dec!(4.00)),
        m if m.starts_with("claude-sonnet-4") || m.starts_with("claude-3-5-sonnet") => {
            (dec!(3.00), dec!(15.00))
        }
        _ => (Decimal::ZERO, Decimal::ZERO),
    };
    let million = dec!(1000000);
    (per_million.0 / million, per_million.1 / million)
}
