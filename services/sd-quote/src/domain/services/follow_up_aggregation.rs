//! 跟进聚合
//!
//! 按经销商分组，再按对象类型分组，经销商按最大待办天数降序排列。

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::entities::{
    DealerFollowUps, EntityType, FollowUpEntry, FollowUpGroups, FollowUpSource,
    is_terminal_status,
};

/// 计算单行的待办天数和逾期标记
///
/// 跟进或业务对象处于终态时待办天数记 0，且不算逾期。
pub fn evaluate(source: &FollowUpSource, today: NaiveDate) -> FollowUpEntry {
    let terminal = is_terminal_status(&source.status) || is_terminal_status(&source.entity_status);
    let days_pending = if terminal {
        0
    } else {
        (today - source.due_date).num_days()
    };

    FollowUpEntry {
        follow_up_id: source.follow_up_id,
        entity_id: source.entity_id,
        due_date: source.due_date,
        status: source.status.clone(),
        entity_status: source.entity_status.clone(),
        origin: source.origin,
        days_pending,
        is_overdue: !terminal && source.due_date < today,
    }
}

pub fn aggregate(sources: Vec<FollowUpSource>, today: NaiveDate) -> Vec<DealerFollowUps> {
    let mut by_dealer: HashMap<_, DealerFollowUps> = HashMap::new();

    for source in sources {
        if source.entity_type == EntityType::Lr {
            continue;
        }

        let entry = evaluate(&source, today);
        let dealer = by_dealer
            .entry(source.dealer_id)
            .or_insert_with(|| DealerFollowUps {
                dealer_id: source.dealer_id,
                dealer_name: source.dealer_name.clone(),
                is_important: source.is_important,
                follow_ups: FollowUpGroups::default(),
                max_days_pending: 0,
            });

        dealer.max_days_pending = dealer.max_days_pending.max(entry.days_pending);
        match source.entity_type {
            EntityType::Quote => dealer.follow_ups.quote.push(entry),
            EntityType::Order => dealer.follow_ups.order.push(entry),
            EntityType::Sr => dealer.follow_ups.sr.push(entry),
            EntityType::Lr => {}
        }
    }

    let mut dealers: Vec<_> = by_dealer.into_values().collect();
    for dealer in &mut dealers {
        let groups = &mut dealer.follow_ups;
        for entries in [&mut groups.quote, &mut groups.order, &mut groups.sr] {
            entries.sort_by(|a, b| b.days_pending.cmp(&a.days_pending).then(a.entity_id.cmp(&b.entity_id)));
        }
    }
    dealers.sort_by(|a, b| {
        b.max_days_pending
            .cmp(&a.max_days_pending)
            .then_with(|| a.dealer_name.cmp(&b.dealer_name))
            .then_with(|| a.dealer_id.cmp(&b.dealer_id))
    });
    dealers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::FollowUpOrigin;
    use crate::domain::value_objects::{DealerId, FollowUpId};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn source(
        dealer: i64,
        name: &str,
        entity_type: EntityType,
        due: &str,
        status: &str,
        entity_status: &str,
    ) -> FollowUpSource {
        FollowUpSource {
            dealer_id: DealerId(dealer),
            dealer_name: name.to_string(),
            is_important: false,
            follow_up_id: Some(FollowUpId(dealer * 100)),
            entity_type,
            entity_id: dealer * 10,
            due_date: date(due),
            status: status.to_string(),
            entity_status: entity_status.to_string(),
            origin: FollowUpOrigin::Explicit,
        }
    }

    #[test]
    fn test_days_pending_and_overdue() {
        let today = date("2024-03-10");
        let entry = evaluate(
            &source(1, "Acme", EntityType::Quote, "2024-03-03", "Pending", "Draft"),
            today,
        );
        assert_eq!(entry.days_pending, 7);
        assert!(entry.is_overdue);

        let due_today = evaluate(
            &source(1, "Acme", EntityType::Quote, "2024-03-10", "Pending", "Draft"),
            today,
        );
        assert_eq!(due_today.days_pending, 0);
        assert!(!due_today.is_overdue);
    }

    #[test]
    fn test_terminal_status_is_never_overdue() {
        let today = date("2024-03-10");
        let by_follow_up = evaluate(
            &source(1, "Acme", EntityType::Order, "2024-01-01", "Completed", "For Dispatch"),
            today,
        );
        let by_entity = evaluate(
            &source(1, "Acme", EntityType::Order, "2024-01-01", "Pending", "Completed"),
            today,
        );

        for entry in [by_follow_up, by_entity] {
            assert!(!entry.is_overdue);
            assert_eq!(entry.days_pending, 0);
        }
    }

    #[test]
    fn test_lr_rows_are_excluded() {
        let rows = vec![source(1, "Acme", EntityType::Lr, "2024-01-01", "Pending", "Open")];
        assert!(aggregate(rows, date("2024-03-10")).is_empty());
    }

    #[test]
    fn test_dealers_sorted_by_max_days_pending() {
        let today = date("2024-03-10");
        let rows = vec![
            source(1, "Bravo", EntityType::Quote, "2024-03-08", "Pending", "Draft"),
            source(2, "Alpha", EntityType::Sr, "2024-02-10", "Pending", "Open"),
            source(2, "Alpha", EntityType::Order, "2024-03-09", "Pending", "For Dispatch"),
            source(3, "Charlie", EntityType::Quote, "2024-03-08", "Pending", "Draft"),
            source(4, "Delta", EntityType::Quote, "2024-03-20", "Pending", "Draft"),
        ];

        let dealers = aggregate(rows, today);
        let names: Vec<_> = dealers.iter().map(|d| d.dealer_name.as_str()).collect();

        assert_eq!(names, vec!["Alpha", "Bravo", "Charlie", "Delta"]);
        assert_eq!(dealers[0].max_days_pending, 29);
        assert_eq!(dealers[0].follow_ups.sr.len(), 1);
        assert_eq!(dealers[0].follow_ups.order.len(), 1);
        // 未到期的跟进不会让最大值变成负数
        assert_eq!(dealers[3].max_days_pending, 0);
        assert_eq!(dealers[3].follow_ups.quote[0].days_pending, -10);
    }
}
