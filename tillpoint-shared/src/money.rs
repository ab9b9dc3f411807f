//! Integer-cents money arithmetic
//!
//! Every monetary value in the system is an `i64` number of cents. Floating
//! point never touches money: `0.1 + 0.2` style drift is unacceptable in a
//! till, and integer cents make totals reproducible across the database,
//! the API, and receipts.
//!
//! Percentages (tax, discounts) are expressed in basis points: 1250 bps is
//! 12.5%. Rounding is round-half-up via the `+ 5000` trick on the bps scale,
//! with intermediate math widened to `i128` so large subtotals cannot
//! overflow.

/// Sales tax applied at checkout, in basis points (1250 = 12.5%).
pub const TAX_RATE_BPS: u32 = 1250;

/// Applies a basis-point percentage to an amount of cents, rounding half up.
///
/// # Example
///
/// ```
/// use tillpoint_shared::money::percentage_cents;
///
/// // $10.00 at 8.25% = $0.825 → rounds to $0.83
/// assert_eq!(percentage_cents(1000, 825), 83);
/// ```
pub fn percentage_cents(amount_cents: i64, rate_bps: u32) -> i64 {
    ((amount_cents as i128 * rate_bps as i128 + 5_000) / 10_000) as i64
}

/// Tax owed on a subtotal at the fixed checkout rate.
pub fn tax_cents(subtotal_cents: i64) -> i64 {
    percentage_cents(subtotal_cents, TAX_RATE_BPS)
}

/// Line total for a quantity of units at a unit price.
pub fn line_total_cents(unit_price_cents: i64, quantity: i32) -> i64 {
    unit_price_cents * quantity as i64
}

/// Formats cents as a dollar string for logs and receipts, e.g. `$10.99`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, (cents / 100).abs(), (cents % 100).abs())
}
