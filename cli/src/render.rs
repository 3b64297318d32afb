//! Plain-text rendering of proposals for the terminal.

use symposium_store::views::{is_claimable, proposal_expiry};
use symposium_types::{Proposal, Timestamp};

fn state(p: &Proposal) -> &'static str {
    match (p.is_finalized(), p.winning_side_is_yes, is_claimable(p)) {
        (false, _, _) => "open",
        (true, _, true) => "claimable",
        (true, Some(true), false) => "yes won",
        (true, Some(false), false) => "no won",
        (true, None, false) => "finalized",
    }
}

/// One table row: id, title, expiry, stake, shares, state.
pub fn row(p: &Proposal, now: Timestamp) -> String {
    format!(
        "#{:<4} {:<40} {:>8} {:>8} yes {:>3}% no {:>3}%  {}",
        p.id.0,
        truncate(&p.title, 40),
        proposal_expiry(p, now),
        p.total_stake,
        p.yes_share,
        p.no_share,
        state(p),
    )
}

/// Full proposal with its opinions.
pub fn detail(p: &Proposal, now: Timestamp) -> String {
    let mut out = format!(
        "#{} {}\n{}\nproposed by {} | expires {} | stake {} | yes {}% no {}% | {}\n",
        p.id,
        p.title,
        p.description,
        p.proposed_by,
        proposal_expiry(p, now),
        p.total_stake,
        p.yes_share,
        p.no_share,
        state(p),
    );
    if p.opinions.is_empty() {
        out.push_str("  no opinions yet\n");
    }
    for o in &p.opinions {
        out.push_str(&format!(
            "  [{}] {} {} votes, {} staked, {} ({}): {}\n",
            o.id, o.stance, o.vote_count, o.stake_total, o.author, o.created_at, o.content
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max - 1).collect();
        cut.push('…');
        cut
    }
}
