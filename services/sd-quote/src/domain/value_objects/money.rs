//! 金额与利润率计算

use rust_decimal::{Decimal, RoundingStrategy};

/// 金额保留到分
pub const CURRENCY_SCALE: u32 = 2;

/// 四舍五入到 2 位小数（半数远离零）
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `cost × (1 + margin% / 100)`，结果按金额精度取整
pub fn apply_margin(cost_price: Decimal, margin_percent: Decimal) -> Decimal {
    round_currency(cost_price + cost_price * margin_percent / Decimal::ONE_HUNDRED)
}
