//! Gap finding inside a parent block.
//!
//! Identifies unused address ranges between allocated blocks and expresses
//! them as the fewest aligned CIDR blocks.

use super::overlap::contains_prefix;
use crate::error::Result;
use crate::models::{range_to_prefixes, NormalisedCidr};

/// Free space of `parent` not covered by any of `used`.
///
/// Blocks of `used` outside `parent` are ignored; overlapping or duplicate
/// entries are tolerated. The result is sorted ascending.
pub fn find_free_blocks(
    parent: &NormalisedCidr,
    used: &[NormalisedCidr],
) -> Result<Vec<NormalisedCidr>> {
    let mut inside: Vec<NormalisedCidr> = used
        .iter()
        .filter(|c| contains_prefix(parent, c))
        .copied()
        .collect();
    inside.sort();

    let mut gaps = Vec::new();
    // None once the walk has passed the end of the parent.
    let mut next_ip = Some(parent.network());

    for block in &inside {
        let Some(start) = next_ip else {
            break;
        };
        if start < block.network() {
            gaps.extend(range_to_prefixes(
                parent.version(),
                start,
                block.network() - 1,
            )?);
        }
        if block.last() >= start {
            next_ip = block.next_sibling().map(|n| n.network());
            if block.last() >= parent.last() {
                next_ip = None;
            }
        }
    }

    if let Some(start) = next_ip {
        gaps.extend(range_to_prefixes(parent.version(), start, parent.last())?);
    }

    log::debug!(
        "{parent}: {} used block(s), {} free block(s)",
        inside.len(),
        gaps.len()
    );
    Ok(gaps)
}
