use log::{debug, trace};
use serde::Serialize;
use urutte_msg::{RecordId, ThreadRecord};

/// How a set of sibling replies is ordered. The mode is picked for the whole
/// set, never per pair, so the ordering stays total. An empty set reports
/// `CreatedAt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplyOrder {
    /// Every reply, and at least one, carries a materialized path.
    Path,
    /// Some reply has no path, or there are no replies.
    CreatedAt,
}

pub fn reply_order(replies: &[&ThreadRecord]) -> ReplyOrder {
    if !replies.is_empty() && replies.iter().all(|reply| reply.path.is_some()) {
        ReplyOrder::Path
    } else {
        ReplyOrder::CreatedAt
    }
}

/// Replies whose parent is `target`, one level deep, in display order.
/// Grandchildren are left out; assemble again from a reply to go deeper.
pub fn direct_replies(records: &[ThreadRecord], target: RecordId) -> Vec<&ThreadRecord> {
    let mut replies: Vec<&ThreadRecord> = records
        .iter()
        .filter(|record| record.is_reply_to(target))
        .collect();

    let order = reply_order(&replies);
    trace!(
        "{} direct replies to {} ordered by {:?}",
        replies.len(),
        target,
        order
    );
    sort_replies(&mut replies, order);

    replies
}

pub fn reply_count(records: &[ThreadRecord], target: RecordId) -> usize {
    records
        .iter()
        .filter(|record| record.is_reply_to(target))
        .count()
}

fn sort_replies(replies: &mut [&ThreadRecord], order: ReplyOrder) {
    match order {
        ReplyOrder::Path => replies.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        }),
        ReplyOrder::CreatedAt => replies.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView<'r> {
    pub root: &'r ThreadRecord,
    pub replies: Vec<&'r ThreadRecord>,
    pub order: ReplyOrder,
}

impl<'r> ThreadView<'r> {
    pub fn assemble(records: &'r [ThreadRecord], root: RecordId) -> Option<Self> {
        let Some(root) = records.iter().find(|record| record.id == root) else {
            debug!("thread root {} not among {} records", root, records.len());
            return None;
        };
        let replies = direct_replies(records, root.id);
        let order = reply_order(&replies);

        Some(ThreadView {
            root,
            replies,
            order,
        })
    }

    pub fn reply_ids(&self) -> Vec<RecordId> {
        self.replies.iter().map(|reply| reply.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(
        id: RecordId,
        parent_id: Option<RecordId>,
        path: Option<&str>,
        minute: u32,
    ) -> ThreadRecord {
        ThreadRecord {
            id,
            content: format!("post {}", id),
            parent_id,
            path: path.map(String::from),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap(),
        }
    }

    fn ids(replies: &[&ThreadRecord]) -> Vec<RecordId> {
        replies.iter().map(|reply| reply.id).collect()
    }

    #[test]
    fn test_one_level_only() {
        let records = vec![
            record(1, None, None, 0),
            record(2, Some(1), None, 1),
            record(3, Some(2), None, 2),
        ];
        assert_eq!(ids(&direct_replies(&records, 1)), vec![2]);
        assert_eq!(ids(&direct_replies(&records, 2)), vec![3]);
    }

    #[test]
    fn test_no_replies_is_empty() {
        let records = vec![record(1, None, None, 0), record(2, Some(1), None, 1)];
        assert!(direct_replies(&records, 2).is_empty());
        assert!(direct_replies(&records, 99).is_empty());
        assert!(direct_replies(&[], 1).is_empty());
    }

    #[test]
    fn test_childless_node_orders_by_created_at() {
        let records = vec![record(1, None, Some("0001"), 0)];
        assert_eq!(reply_order(&[]), ReplyOrder::CreatedAt);

        let view = ThreadView::assemble(&records, 1).unwrap();
        assert!(view.replies.is_empty());
        assert_eq!(view.order, ReplyOrder::CreatedAt);
    }

    #[test]
    fn test_excludes_self_parented_record() {
        let records = vec![record(1, Some(1), None, 0), record(2, Some(1), None, 1)];
        assert_eq!(ids(&direct_replies(&records, 1)), vec![2]);
    }

    #[test]
    fn test_ordered_by_path() {
        let records = vec![
            record(1, None, Some("0001"), 0),
            record(3, Some(1), Some("0001.0002"), 1),
            record(2, Some(1), Some("0001.0001"), 5),
        ];
        let replies = direct_replies(&records, 1);
        assert_eq!(ids(&replies), vec![2, 3]);
        assert_eq!(reply_order(&replies), ReplyOrder::Path);
    }

    #[test]
    fn test_missing_path_falls_back_to_created_at() {
        let records = vec![
            record(1, None, None, 0),
            record(2, Some(1), Some("0002"), 1),
            record(3, Some(1), None, 2),
            record(4, Some(1), Some("0001"), 3),
        ];
        let replies = direct_replies(&records, 1);
        assert_eq!(ids(&replies), vec![2, 3, 4]);
        assert_eq!(reply_order(&replies), ReplyOrder::CreatedAt);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let records = vec![
            record(1, None, None, 0),
            record(5, Some(1), None, 1),
            record(4, Some(1), None, 1),
        ];
        assert_eq!(ids(&direct_replies(&records, 1)), vec![4, 5]);
    }

    #[test]
    fn test_input_left_untouched() {
        let records = vec![
            record(1, None, None, 0),
            record(3, Some(1), Some("0002"), 1),
            record(2, Some(1), Some("0001"), 2),
        ];
        let before = records.clone();
        let _ = direct_replies(&records, 1);
        assert_eq!(records, before);
    }

    #[test]
    fn test_reply_count() {
        let records = vec![
            record(1, None, None, 0),
            record(2, Some(1), None, 1),
            record(3, Some(1), None, 2),
            record(4, Some(2), None, 3),
        ];
        assert_eq!(reply_count(&records, 1), 2);
        assert_eq!(reply_count(&records, 2), 1);
        assert_eq!(reply_count(&records, 4), 0);
    }

    #[test]
    fn test_thread_view() {
        let records = vec![
            record(1, None, None, 0),
            record(2, Some(1), Some("0002"), 1),
            record(3, Some(1), Some("0001"), 2),
            record(4, Some(3), Some("0001.0001"), 3),
        ];

        let view = ThreadView::assemble(&records, 1).unwrap();
        assert_eq!(view.root.id, 1);
        assert_eq!(view.reply_ids(), vec![3, 2]);
        assert_eq!(view.order, ReplyOrder::Path);

        let view = ThreadView::assemble(&records, 3).unwrap();
        assert_eq!(view.reply_ids(), vec![4]);

        assert!(ThreadView::assemble(&records, 99).is_none());
    }
}
