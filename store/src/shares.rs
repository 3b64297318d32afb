//! Yes/no share arithmetic.

use symposium_types::{Proposal, Wei};

use crate::views::side_stakes;

/// Add `stake` to the proposal total and recompute both shares as
/// `round(side / total * 100)`, with each side summed from the opinions.
///
/// Call after the acting opinion's own `stake_total` already includes `stake`.
pub fn reweigh(proposal: &mut Proposal, stake: Wei) {
    let total = proposal.total_stake.saturating_add(stake);
    let (yes, no) = side_stakes(proposal);
    proposal.total_stake = total;
    proposal.yes_share = yes.share_of(total);
    proposal.no_share = no.share_of(total);
}
