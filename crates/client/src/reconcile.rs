//! Reconciliation of a draft against remotely committed lines.
//!
//! Identity is the exact `(product_id, quantity)` pair. A draft line is
//! pending when no remote item carries the same pair; server item ids are
//! ignored. Matching is by existence, not multiplicity: one remote `(P, 5)`
//! covers every draft `(P, 5)` line. A changed quantity for the same product
//! shows up as a new line; the old remote line is left alone. Nothing here
//! ever updates or deletes remote items.

use std::collections::HashSet;

use aquaroute_core::ProductId;
use aquaroute_gateway::RemoteItemSnapshot;

use crate::draft::DraftLine;

/// Draft lines that still have to be created remotely, in draft order.
pub fn pending_lines(remote: &[RemoteItemSnapshot], draft: &[DraftLine]) -> Vec<DraftLine> {
    let committed: HashSet<(ProductId, u32)> = remote
        .iter()
        .map(|item| (item.product_id, item.quantity))
        .collect();

    draft
        .iter()
        .filter(|line| !committed.contains(&(line.product_id(), line.quantity())))
        .cloned()
        .collect()
}
