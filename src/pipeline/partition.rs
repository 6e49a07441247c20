//! Greedy, order-preserving grouping of items into archive parts

use crate::types::ItemRef;
use crate::utils::archive_entry_name;

/// An item with its estimated size and final entry name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedItem {
    /// 0-based position in the collection
    pub index: usize,
    /// Remote URL
    pub url: String,
    /// Name shown to the user
    pub display_name: String,
    /// Name of the entry inside the archive
    pub entry_name: String,
    /// Estimated size in bytes
    pub size_bytes: u64,
}

impl ResolvedItem {
    /// Resolve `item` at `index` with the given size estimate
    pub fn new(index: usize, item: &ItemRef, size_bytes: u64) -> Self {
        Self {
            index,
            url: item.url.clone(),
            display_name: item.filename.clone(),
            entry_name: archive_entry_name(index, &item.filename),
            size_bytes,
        }
    }

    /// 1-based position, as reported in progress events
    pub fn position(&self) -> usize {
        self.index + 1
    }
}

/// A non-empty run of consecutive items destined for one archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartGroup {
    /// 1-based part number
    pub part_number: usize,
    /// Items in collection order
    pub items: Vec<ResolvedItem>,
    /// Sum of the members' estimated sizes
    pub estimated_bytes: u64,
}

impl PartGroup {
    /// First item of the group
    pub fn first(&self) -> Option<&ResolvedItem> {
        self.items.first()
    }

    /// Last item of the group
    pub fn last(&self) -> Option<&ResolvedItem> {
        self.items.last()
    }
}

/// Split `items` into consecutive groups whose estimated size stays within `ceiling`
///
/// A new group starts whenever adding the next item would exceed the ceiling
/// and the current group already holds something. An item larger than the
/// ceiling therefore ends up alone in its group. Items are never reordered.
pub fn partition(items: Vec<ResolvedItem>, ceiling: u64) -> Vec<PartGroup> {
    let mut groups: Vec<PartGroup> = Vec::new();
    let mut current: Vec<ResolvedItem> = Vec::new();
    let mut running: u64 = 0;

    for item in items {
        if !current.is_empty() && running.saturating_add(item.size_bytes) > ceiling {
            groups.push(PartGroup {
                part_number: groups.len() + 1,
                items: std::mem::take(&mut current),
                estimated_bytes: running,
            });
            running = 0;
        }
        running = running.saturating_add(item.size_bytes);
        current.push(item);
    }

    if !current.is_empty() {
        groups.push(PartGroup {
            part_number: groups.len() + 1,
            items: current,
            estimated_bytes: running,
        });
    }

    groups
}
