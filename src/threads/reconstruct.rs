use crate::message::MessageRecord;
use std::collections::{HashMap, HashSet};

/// Longest `in_reply_to` chain followed before a record is treated as its own root
pub const MAX_THREAD_HOPS: u32 = 100;

/// Keeps the first record for every `message_id`, preserving order
///
/// Returns the surviving records and how many were dropped.
pub fn dedupe_by_message_id(records: Vec<MessageRecord>) -> (Vec<MessageRecord>, usize) {
    let before = records.len();
    let mut seen = HashSet::new();
    let kept: Vec<MessageRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.message_id.clone()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Sets `thread_root_id` and `thread_depth` on every record
pub fn reconstruct(mut records: Vec<MessageRecord>) -> Vec<MessageRecord> {
    let resolved: Vec<(String, u32)> = {
        let mut parents: HashMap<&str, Option<&str>> = HashMap::with_capacity(records.len());
        for record in &records {
            let parent = record
                .in_reply_to
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty());
            parents.entry(record.message_id.as_str()).or_insert(parent);
        }

        records
            .iter()
            .map(|record| resolve_root(&record.message_id, &parents))
            .collect()
    };

    for (record, (root, depth)) in records.iter_mut().zip(resolved) {
        record.thread_root_id = Some(root);
        record.thread_depth = depth;
    }

    records
}

/// Walks parent links from `start` to the first record without a known parent
fn resolve_root(start: &str, parents: &HashMap<&str, Option<&str>>) -> (String, u32) {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(start);

    let mut current = start;
    let mut hops = 0;

    loop {
        let parent = parents
            .get(current)
            .copied()
            .flatten()
            .filter(|parent| parents.contains_key(parent));

        match parent {
            None => return (current.to_string(), hops),
            Some(parent) => {
                if hops >= MAX_THREAD_HOPS || !visited.insert(parent) {
                    tracing::debug!(message_id = start, "Reply chain loops or is too long");
                    return (start.to_string(), 0);
                }
                current = parent;
                hops += 1;
            }
        }
    }
}
