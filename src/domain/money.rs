use bigdecimal::BigDecimal;

/// Platform cut expressed in basis points (2%).
pub const PLATFORM_FEE_BASIS_POINTS: u32 = 200;

pub const DEFAULT_CURRENCY: &str = "INR";

/// Round to standard currency precision (two decimal places).
pub fn round_currency(value: &BigDecimal) -> BigDecimal {
    value.round(2).with_scale(2)
}

pub fn platform_fee(amount: &BigDecimal) -> BigDecimal {
    let fee = amount.clone() * BigDecimal::from(PLATFORM_FEE_BASIS_POINTS)
        / BigDecimal::from(10_000u32);
    round_currency(&fee)
}
