//! 手工改价校验
//!
//! 只有开启改价的行需要校验，系统价的行总是有效。

use std::collections::HashMap;
use std::sync::Arc;

use cpq_common::TenantId;
use metrics::counter;
use tracing::warn;

use crate::application::PriceBandLookup;
use crate::domain::{AttributeId, DealerId, LineDraft, PriceBand};
use crate::error::{OverrideViolation, QuoteError, QuoteResult};

pub struct OverrideValidator {
    lookup: Arc<dyn PriceBandLookup>,
}

impl OverrideValidator {
    pub fn new(lookup: Arc<dyn PriceBandLookup>) -> Self {
        Self { lookup }
    }

    /// 校验单行，闭区间
    pub fn check(line: &LineDraft, band: &PriceBand) -> Result<(), OverrideViolation> {
        if !line.is_override {
            return Ok(());
        }
        match line.unit_price {
            Some(price) if band.contains(price) => Ok(()),
            manual_price => Err(OverrideViolation {
                quote_item_id: line.quote_item_id,
                manual_price,
                min_allowed_price: band.min_allowed_price,
                max_allowed_price: band.max_allowed_price,
            }),
        }
    }

    /// 校验整批，返回全部不合规的行
    pub async fn validate_batch(
        &self,
        tenant_id: &TenantId,
        dealer_id: DealerId,
        lines: &[LineDraft],
    ) -> QuoteResult<()> {
        let mut bands: HashMap<AttributeId, PriceBand> = HashMap::new();
        let mut violations = Vec::new();

        for line in lines.iter().filter(|l| l.is_override) {
            let band = match bands.get(&line.attribute_id) {
                Some(band) => *band,
                None => {
                    let band = self
                        .lookup
                        .lookup(tenant_id, line.attribute_id, dealer_id)
                        .await?;
                    bands.insert(line.attribute_id, band);
                    band
                }
            };
            if let Err(violation) = Self::check(line, &band) {
                violations.push(violation);
            }
        }

        if violations.is_empty() {
            return Ok(());
        }

        counter!("cpq_override_rejected_total").increment(violations.len() as u64);
        warn!(
            %dealer_id,
            rejected = violations.len(),
            "Manual prices outside the allowed range"
        );
        Err(QuoteError::InvalidOverrides(violations))
    }

    /// 切换改价开关
    ///
    /// 打开时重新获取区间并以最低允许价作为默认手工价；关闭时恢复系统价。
    pub async fn toggle_override(
        &self,
        tenant_id: &TenantId,
        dealer_id: DealerId,
        mut line: LineDraft,
        enable: bool,
    ) -> QuoteResult<LineDraft> {
        if line.is_override == enable {
            return Ok(line);
        }

        let band = self
            .lookup
            .lookup(tenant_id, line.attribute_id, dealer_id)
            .await?;

        line.is_override = enable;
        line.unit_price = Some(if enable {
            band.min_allowed_price
        } else {
            band.price
        });
        Ok(line)
    }

    /// 切换规格并重算系统价，改价开启时拒绝
    pub async fn change_attribute(
        &self,
        tenant_id: &TenantId,
        dealer_id: DealerId,
        mut line: LineDraft,
        attribute_id: AttributeId,
    ) -> QuoteResult<LineDraft> {
        if line.is_override {
            return Err(QuoteError::InvalidState {
                quote_item_id: line.quote_item_id,
                reason: "attribute cannot change while a manual price override is active"
                    .to_string(),
            });
        }

        let band = self.lookup.lookup(tenant_id, attribute_id, dealer_id).await?;

        line.attribute_id = attribute_id;
        line.unit_price = Some(band.price);
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::MockPriceBandLookup;
    use crate::domain::QuoteItemId;
    use cpq_errors::AppError;
    use mockall::predicate::eq;
    use rust_decimal::Decimal;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// cost 1000, margins 10%..25%
    fn band() -> PriceBand {
        PriceBand {
            cost_price: d("1000"),
            price: d("1300"),
            min_margin_percent: d("10"),
            max_margin_percent: d("25"),
            min_allowed_price: d("1100.00"),
            max_allowed_price: d("1250.00"),
        }
    }

    fn line(id: i64, price: Option<&str>, is_override: bool) -> LineDraft {
        LineDraft {
            quote_item_id: QuoteItemId(id),
            attribute_id: AttributeId(11),
            unit_price: price.map(d),
            is_selected: true,
            is_override,
        }
    }

    fn validator_with(lookup: MockPriceBandLookup) -> OverrideValidator {
        OverrideValidator::new(Arc::new(lookup))
    }

    #[test]
    fn test_check_inclusive_bounds() {
        let band = band();
        assert!(OverrideValidator::check(&line(1, Some("1199.99"), true), &band).is_ok());
        assert!(OverrideValidator::check(&line(1, Some("1100.00"), true), &band).is_ok());
        assert!(OverrideValidator::check(&line(1, Some("1250.00"), true), &band).is_ok());
        assert!(OverrideValidator::check(&line(1, Some("1099.99"), true), &band).is_err());
        assert!(OverrideValidator::check(&line(1, Some("1250.01"), true), &band).is_err());
    }

    #[test]
    fn test_missing_manual_price_is_invalid() {
        let violation = OverrideValidator::check(&line(4, None, true), &band()).unwrap_err();
        assert_eq!(violation.quote_item_id, QuoteItemId(4));
        assert_eq!(violation.manual_price, None);
    }

    #[test]
    fn test_system_priced_line_always_valid() {
        assert!(OverrideValidator::check(&line(1, Some("1"), false), &band()).is_ok());
    }

    #[tokio::test]
    async fn test_batch_reports_every_offending_item() {
        let mut lookup = MockPriceBandLookup::new();
        // 同一规格只查询一次
        lookup
            .expect_lookup()
            .with(mockall::predicate::always(), eq(AttributeId(11)), eq(DealerId(5)))
            .times(1)
            .returning(|_, _, _| Ok(band()));

        let lines = vec![
            line(1, Some("1199.99"), true),
            line(2, Some("1099.99"), true),
            line(3, Some("900"), false),
            line(4, Some("1250.01"), true),
        ];

        let err = validator_with(lookup)
            .validate_batch(&TenantId::new(), DealerId(5), &lines)
            .await
            .unwrap_err();

        match err {
            QuoteError::InvalidOverrides(violations) => {
                let ids: Vec<_> = violations.iter().map(|v| v.quote_item_id).collect();
                assert_eq!(ids, vec![QuoteItemId(2), QuoteItemId(4)]);
                assert_eq!(violations[0].min_allowed_price, d("1100.00"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_batch_without_overrides_skips_lookup() {
        let mut lookup = MockPriceBandLookup::new();
        lookup.expect_lookup().never();

        let lines = vec![line(1, Some("10"), false)];
        assert!(
            validator_with(lookup)
                .validate_batch(&TenantId::new(), DealerId(5), &lines)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_toggle_on_seeds_fresh_minimum() {
        let mut lookup = MockPriceBandLookup::new();
        lookup.expect_lookup().times(1).returning(|_, _, _| Ok(band()));

        let toggled = validator_with(lookup)
            .toggle_override(&TenantId::new(), DealerId(5), line(1, Some("1300"), false), true)
            .await
            .unwrap();

        assert!(toggled.is_override);
        assert_eq!(toggled.unit_price, Some(d("1100.00")));
    }

    #[tokio::test]
    async fn test_toggle_off_restores_system_price() {
        let mut lookup = MockPriceBandLookup::new();
        lookup.expect_lookup().times(1).returning(|_, _, _| Ok(band()));

        let toggled = validator_with(lookup)
            .toggle_override(&TenantId::new(), DealerId(5), line(1, Some("1200"), true), false)
            .await
            .unwrap();

        assert!(!toggled.is_override);
        assert_eq!(toggled.unit_price, Some(d("1300")));
    }

    #[tokio::test]
    async fn test_change_attribute_recomputes_system_price() {
        let mut lookup = MockPriceBandLookup::new();
        lookup
            .expect_lookup()
            .with(mockall::predicate::always(), eq(AttributeId(12)), eq(DealerId(5)))
            .times(1)
            .returning(|_, _, _| {
                Ok(PriceBand {
                    price: "1450".parse().unwrap(),
                    ..band()
                })
            });

        let changed = validator_with(lookup)
            .change_attribute(&TenantId::new(), DealerId(5), line(1, Some("1300"), false), AttributeId(12))
            .await
            .unwrap();

        assert_eq!(changed.attribute_id, AttributeId(12));
        assert_eq!(changed.unit_price, Some(d("1450")));
        assert!(!changed.is_override);
    }

    #[tokio::test]
    async fn test_change_attribute_under_override_is_invalid_state() {
        let mut lookup = MockPriceBandLookup::new();
        lookup.expect_lookup().never();

        let err = validator_with(lookup)
            .change_attribute(&TenantId::new(), DealerId(5), line(9, Some("1200"), true), AttributeId(12))
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteError::InvalidState { quote_item_id, .. } if quote_item_id == QuoteItemId(9)));
    }

    #[tokio::test]
    async fn test_lookup_not_found_propagates() {
        let mut lookup = MockPriceBandLookup::new();
        lookup
            .expect_lookup()
            .returning(|_, attribute_id, _| {
                Err(AppError::not_found(format!("No pricing found for attribute {}", attribute_id)))
            });

        let err = validator_with(lookup)
            .toggle_override(&TenantId::new(), DealerId(5), line(1, None, false), true)
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteError::App(AppError::NotFound(_))));
    }
}
