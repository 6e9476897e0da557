//! Assignment of ranked item ids to mining groups (shards).
//!
//! Groups are contiguous ranges of the id space, so the most frequent items
//! all land in the first groups. Every stage recomputes the assignment from
//! `(max_per_group, num_items)`; it is never stored.

use std::ops::Range;

/// Number of items per group needed to spread `num_items` over
/// `num_groups` groups. Never zero, so `group_of` is always defined.
pub fn max_per_group(num_items: usize, num_groups: usize) -> u32 {
    let num_groups = num_groups.max(1);
    let per_group = (num_items + num_groups - 1) / num_groups;
    per_group.max(1) as u32
}

pub fn group_of(item_id: u32, max_per_group: u32) -> u32 {
    item_id / max_per_group
}

pub fn members_of(group_id: u32, max_per_group: u32, num_items: u32) -> Range<u32> {
    let start = (group_id as u64 * max_per_group as u64).min(num_items as u64) as u32;
    let end = ((group_id as u64 + 1) * max_per_group as u64).min(num_items as u64) as u32;
    start..end
}
