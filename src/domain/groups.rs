//! Grouping of unposted rows into postable units

use std::collections::HashMap;
use std::fmt;

use super::rows::Row;

/// Key of one postable unit: an ordered thread or a standalone post.
///
/// Standalone rows are keyed by their scan position so two of them can
/// never fold into the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Thread(String),
    Single(usize),
}

impl GroupKey {
    pub fn is_thread(&self) -> bool {
        matches!(self, GroupKey::Thread(_))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Thread(id) => write!(f, "THREAD_{}", id),
            GroupKey::Single(pos) => write!(f, "SINGLE_{}", pos),
        }
    }
}

/// Partition the not-yet-posted rows into groups.
///
/// Rows whose `posted` flag is set are excluded entirely. Rows sharing a
/// non-empty `thread_id` accumulate under one `Thread` key in scan order;
/// everything else becomes its own `Single` group. No intra-group
/// ordering happens here — the caller sorts thread groups before posting.
pub fn group_unposted(rows: &[Row]) -> HashMap<GroupKey, Vec<Row>> {
    let mut groups: HashMap<GroupKey, Vec<Row>> = HashMap::new();

    for (position, row) in rows.iter().enumerate() {
        if row.posted {
            continue;
        }

        let key = match &row.thread_id {
            Some(id) => GroupKey::Thread(id.clone()),
            None => GroupKey::Single(position),
        };

        groups.entry(key).or_default().push(row.clone());
    }

    groups
}

/// Order a thread group for posting: ascending `thread_order`, ties keep
/// original row order. Missing or unparseable orders were already
/// defaulted to 0 at parse time.
pub fn sort_thread_rows(rows: &mut [Row]) {
    rows.sort_by_key(|row| row.thread_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(text: &str, posted: bool, thread_id: Option<&str>, thread_order: i64) -> Row {
        Row {
            text: text.to_string(),
            media_path: None,
            posted,
            thread_id: thread_id.map(str::to_string),
            thread_order,
            row_index: 0,
        }
    }

    #[test]
    fn posted_rows_are_excluded() {
        let rows = vec![
            row("a", true, None, 0),
            row("b", false, None, 0),
            row("c", true, Some("t"), 0),
        ];
        let groups = group_unposted(&rows);
        assert_eq!(groups.len(), 1);
        let only = groups.values().next().unwrap();
        assert_eq!(only[0].text, "b");
    }

    #[test]
    fn groups_partition_the_unposted_set() {
        let rows = vec![
            row("a", false, Some("t1"), 1),
            row("b", false, None, 0),
            row("c", false, Some("t1"), 2),
            row("d", false, Some("t2"), 0),
            row("e", true, None, 0),
        ];
        let groups = group_unposted(&rows);

        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, 4);

        let mut seen: Vec<&str> = groups
            .values()
            .flatten()
            .map(|r| r.text.as_str())
            .collect();
        seen.sort();
        assert_eq!(seen, ["a", "b", "c", "d"]);
    }

    #[test]
    fn shared_thread_id_lands_in_one_group() {
        let rows = vec![
            row("a", false, Some("abc"), 2),
            row("b", false, Some("abc"), 1),
        ];
        let groups = group_unposted(&rows);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[&GroupKey::Thread("abc".to_string())].len(),
            2
        );
    }

    #[test]
    fn standalone_rows_never_collide() {
        let rows = vec![
            row("a", false, None, 0),
            row("b", false, None, 0),
            row("c", false, None, 0),
        ];
        let groups = group_unposted(&rows);
        assert_eq!(groups.len(), 3);
        assert!(groups.keys().all(|k| !k.is_thread()));
    }

    #[test]
    fn thread_sort_is_ascending_and_stable() {
        let mut rows = vec![
            row("third", false, Some("t"), 2),
            row("first", false, Some("t"), 0),
            row("tie-a", false, Some("t"), 1),
            row("tie-b", false, Some("t"), 1),
        ];
        sort_thread_rows(&mut rows);
        let order: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(order, ["first", "tie-a", "tie-b", "third"]);
    }

    #[test]
    fn missing_order_sorts_as_zero() {
        // A row whose thread_order cell was blank parses as 0 and sorts
        // ahead of explicit positive orders.
        let mut rows = vec![
            row("explicit", false, Some("t"), 1),
            row("defaulted", false, Some("t"), 0),
        ];
        sort_thread_rows(&mut rows);
        assert_eq!(rows[0].text, "defaulted");
    }

    #[test]
    fn group_keys_render_like_the_sheet_convention() {
        assert_eq!(GroupKey::Thread("abc".into()).to_string(), "THREAD_abc");
        assert_eq!(GroupKey::Single(4).to_string(), "SINGLE_4");
    }
}
