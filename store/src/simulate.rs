//! Offline simulation: random drift for running without a chain.
//!
//! Randomness is drawn by [`perturb`] outside the reducer; the `Tick`
//! action only carries the drawn deltas, so reduction stays deterministic.

use rand::Rng;

use symposium_types::{
    Opinion, OpinionId, Proposal, ProposalId, Stance, Timestamp, Wei,
};
use symposium_utils::format_age;

/// 0.01 native units: the granularity of simulated stake drift.
const CENT: Wei = Wei::new(10_000_000_000_000_000);

/// Drift applied to one proposal by a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Perturbation {
    pub proposal: ProposalId,
    /// In `[-2, 2]`.
    pub yes_delta: i8,
    /// In `[-2, 2]`.
    pub no_delta: i8,
    /// In `[0, 0.1)`.
    pub stake_increase: Wei,
    pub opinions: Vec<OpinionPerturbation>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpinionPerturbation {
    pub opinion: OpinionId,
    /// In `[-1, 1]`.
    pub vote_delta: i8,
    /// In `[0, 0.05)`.
    pub stake_increase: Wei,
}

/// Draw one tick's drift for every proposal and opinion.
pub fn perturb<R: Rng + ?Sized>(proposals: &[Proposal], rng: &mut R) -> Vec<Perturbation> {
    proposals
        .iter()
        .map(|p| Perturbation {
            proposal: p.id,
            yes_delta: rng.gen_range(-2..=2),
            no_delta: rng.gen_range(-2..=2),
            stake_increase: Wei::new(CENT.raw() * rng.gen_range(0..10)),
            opinions: p
                .opinions
                .iter()
                .map(|o| OpinionPerturbation {
                    opinion: o.id,
                    vote_delta: rng.gen_range(-1..=1),
                    stake_increase: Wei::new(CENT.raw() * rng.gen_range(0..5)),
                })
                .collect(),
        })
        .collect()
}

fn nudge_share(share: u8, delta: i8) -> u8 {
    (share as i16 + delta as i16).clamp(0, 100) as u8
}

fn nudge_votes(votes: u32, delta: i8) -> u32 {
    if delta < 0 {
        votes.saturating_sub(delta.unsigned_abs() as u32).max(1)
    } else {
        votes.saturating_add(delta as u32)
    }
}

/// Apply drawn drift in place. Shares stay in `[0, 100]`, stakes only grow
/// and vote counts never drop below one. Touched proposals get `last_updated = now`.
pub fn apply(proposals: &mut [Proposal], perturbations: &[Perturbation], now: Timestamp) {
    for drift in perturbations {
        let Some(p) = proposals.iter_mut().find(|p| p.id == drift.proposal) else {
            continue;
        };
        p.yes_share = nudge_share(p.yes_share, drift.yes_delta);
        p.no_share = nudge_share(p.no_share, drift.no_delta);
        p.total_stake = p.total_stake.saturating_add(drift.stake_increase);
        p.last_updated = now;
        for od in &drift.opinions {
            if let Some(o) = p.opinion_mut(od.opinion) {
                o.vote_count = nudge_votes(o.vote_count, od.vote_delta);
                o.stake_total = o.stake_total.saturating_add(od.stake_increase);
            }
        }
    }
}

fn sample_opinion(
    id: u64,
    stance: Stance,
    author: &str,
    content: &str,
    votes: u32,
    stake_cents: u128,
    age_secs: u64,
) -> Opinion {
    Opinion {
        id: OpinionId(id),
        stance,
        content: content.to_string(),
        author: author.to_string(),
        vote_count: votes,
        stake_total: Wei::new(CENT.raw() * stake_cents),
        created_at: format_age(age_secs),
    }
}

/// Seed data for offline mode. `last_updated` is staggered a minute apart
/// so nothing reads as freshly changed on the first render.
pub fn sample_proposals(now: Timestamp) -> Vec<Proposal> {
    let ago = |secs: u64| Timestamp::new(now.as_secs().saturating_sub(secs));
    vec![
        Proposal {
            id: ProposalId(1),
            title: "Increase stake requirement".into(),
            description: "Increase stake requirement from 0.1 ETH to 0.5 ETH".into(),
            proposed_by: "@Alice".into(),
            expiry: "24h".into(),
            expires_at: Some(now.saturating_add_secs(24 * 3_600)),
            total_stake: Wei::new(CENT.raw() * 50),
            yes_share: 60,
            no_share: 40,
            last_updated: now,
            opinions: vec![
                sample_opinion(
                    1,
                    Stance::Support,
                    "Bob",
                    "I support this proposal because it will lead to more thoughtful participation.",
                    10,
                    50,
                    2 * 3_600,
                ),
                sample_opinion(
                    2,
                    Stance::Oppose,
                    "Carol",
                    "I disagree. This might exclude smaller participants.",
                    5,
                    30,
                    3_600,
                ),
            ],
            finalized: None,
            winning_side_is_yes: None,
            claimable: None,
        },
        Proposal {
            id: ProposalId(2),
            title: "Implement quadratic voting".into(),
            description:
                "Change the voting system to quadratic voting for more democratic results".into(),
            proposed_by: "@Bob".into(),
            expiry: "48h".into(),
            expires_at: Some(now.saturating_add_secs(48 * 3_600)),
            total_stake: Wei::new(CENT.raw() * 120),
            yes_share: 75,
            no_share: 25,
            last_updated: ago(60),
            opinions: vec![sample_opinion(
                1,
                Stance::Support,
                "Alice",
                "Quadratic voting could lead to more balanced outcomes.",
                15,
                70,
                3 * 3_600,
            )],
            finalized: None,
            winning_side_is_yes: None,
            claimable: None,
        },
    ]
}
