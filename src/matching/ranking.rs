//! Result ordering. Pure comparator over candidate rows so the ordering is
//! unit-testable without a database.

use std::cmp::Ordering;

use crate::models::CandidateRow;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;
const RECENT_MILLIS: i64 = 3 * DAY_MILLIS;
const STALE_MILLIS: i64 = 30 * DAY_MILLIS;

/// 0 = used within 3 days, 1 = within 30 days, 2 = older or never.
fn recency_bucket(last_time_used: i64, now_millis: i64) -> u8 {
    if last_time_used <= 0 {
        return 2;
    }
    let age = now_millis.saturating_sub(last_time_used);
    if age <= RECENT_MILLIS {
        0
    } else if age <= STALE_MILLIS {
        1
    } else {
        2
    }
}

/// Total order over lookup candidates: starred first, then the contact's
/// designated super-primary number, then fresher and more frequently used
/// contacts, then visible-group membership, with display name and ids as
/// stable tie-breakers.
pub fn compare_candidates(a: &CandidateRow, b: &CandidateRow, now_millis: i64) -> Ordering {
    b.starred
        .cmp(&a.starred)
        .then_with(|| b.is_super_primary.cmp(&a.is_super_primary))
        .then_with(|| {
            recency_bucket(a.last_time_used, now_millis)
                .cmp(&recency_bucket(b.last_time_used, now_millis))
        })
        .then_with(|| b.times_used.cmp(&a.times_used))
        .then_with(|| b.in_visible_group.cmp(&a.in_visible_group))
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.contact_id.cmp(&b.contact_id))
        .then_with(|| b.is_primary.cmp(&a.is_primary))
}
