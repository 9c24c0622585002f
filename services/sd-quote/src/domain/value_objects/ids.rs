//! 强类型 ID 定义
//!
//! 业务表使用 BIGSERIAL 主键，ID 在插入时由数据库生成。

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
        )]
        #[serde(transparent)]
        #[display("{_0}")]
        pub struct $name(pub i64);

        impl $name {
            pub fn value(&self) -> i64 {
                self.0
            }
        }
    };
}

define_id!(
    /// 经销商 ID
    DealerId
);
define_id!(
    /// 客户类型 ID
    AccountTypeId
);
define_id!(
    /// 产品 ID
    ProductId
);
define_id!(
    /// 产品规格（变体）ID
    AttributeId
);
define_id!(
    /// 阶梯价 ID
    PricingTierId
);
define_id!(
    /// 报价单 ID
    QuoteId
);
define_id!(
    /// 报价行 ID
    QuoteItemId
);
define_id!(
    /// 订单 ID
    OrderId
);
define_id!(
    /// 跟进记录 ID
    FollowUpId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_number() {
        let json = serde_json::to_string(&QuoteId(42)).unwrap();
        assert_eq!(json, "42");

        let parsed: OrderId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, OrderId(7));
        assert_eq!(parsed.to_string(), "7");
    }
}
