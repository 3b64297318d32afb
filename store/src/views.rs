//! Derived views over proposals. Pure functions of their inputs.

use symposium_types::{Proposal, Timestamp, Wei};
use symposium_utils::format_remaining;

pub const EXPIRED: &str = "Expired";

/// `"Expired"` once `expires_at` is not in the future, else the largest
/// whole unit remaining among days, hours and minutes (`"1d"`, `"5h"`, `"50m"`).
pub fn expiry_label(expires_at: Timestamp, now: Timestamp) -> String {
    let remaining = expires_at.remaining_from(now);
    if remaining == 0 {
        EXPIRED.to_string()
    } else {
        format_remaining(remaining)
    }
}

/// Label for a proposal: computed from `expires_at` when known, else the
/// stored display string.
pub fn proposal_expiry(proposal: &Proposal, now: Timestamp) -> String {
    match proposal.expires_at {
        Some(at) => expiry_label(at, now),
        None => proposal.expiry.clone(),
    }
}

/// Reward is claimable once the chain reports the proposal finalized and
/// it has not been claimed in this session.
pub fn is_claimable(proposal: &Proposal) -> bool {
    proposal.is_finalized() && proposal.claimable != Some(false)
}

/// Proposals touched after `since`, in display order.
pub fn updated_since(proposals: &[Proposal], since: Timestamp) -> Vec<&Proposal> {
    proposals
        .iter()
        .filter(|p| p.last_updated > since)
        .collect()
}

/// Stake committed per side, summed from the opinions. `(yes, no)`.
pub fn side_stakes(proposal: &Proposal) -> (Wei, Wei) {
    proposal
        .opinions
        .iter()
        .fold((Wei::ZERO, Wei::ZERO), |(yes, no), o| {
            if o.stance.is_yes() {
                (yes.saturating_add(o.stake_total), no)
            } else {
                (yes, no.saturating_add(o.stake_total))
            }
        })
}
