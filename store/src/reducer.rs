//! The pure transition function.

use tracing::debug;

use symposium_types::Timestamp;

use crate::action::{Action, Settlement, WriteId};
use crate::pending::{Change, PendingWrite};
use crate::simulate;
use crate::state::State;

/// Apply `action` to `state`, returning the next state.
///
/// Never mutates `state`. Every action except `SetLoading` and `SetError`
/// increments `version`, including mutations whose target does not exist:
/// those leave the records unchanged and are logged at debug level.
pub fn reduce(state: &State, action: Action, now: Timestamp) -> State {
    let mut next = state.clone();
    let bumps = action.bumps_version();

    match action {
        Action::ReplaceAll(proposals) => {
            next.replace_base(proposals);
            next.pending_mut().retain(|p| !p.confirmed);
            next.rebuild();
        }
        Action::Mutate(mutation) => {
            let kind = mutation.kind();
            let mut change = Change::resolve(mutation, &next.proposals, now);
            if change.apply(next.base_mut(), now) {
                next.rebuild();
            } else {
                debug!(kind, proposal = %change.proposal_id(), "mutation target not found");
            }
        }
        Action::Speculate { write, mutation } => {
            let kind = mutation.kind();
            let change = Change::resolve(mutation, &next.proposals, now);
            debug!(%write, kind, proposal = %change.proposal_id(), "speculative write recorded");
            next.pending_mut().push(PendingWrite {
                write,
                change,
                at: now,
                confirmed: false,
            });
            next.rebuild();
        }
        Action::Settle { write, outcome } => settle(&mut next, write, outcome),
        Action::Touch => {}
        Action::SetLoading(loading) => next.is_loading = loading,
        Action::SetError(error) => next.last_error = error,
        Action::Tick(perturbations) => {
            simulate::apply(next.base_mut(), &perturbations, now);
            next.rebuild();
        }
    }

    if bumps {
        next.version += 1;
    }
    next
}

fn settle(state: &mut State, write: WriteId, outcome: Settlement) {
    let Some(index) = state.pending().iter().position(|p| p.write == write) else {
        debug!(%write, "settle for unknown write");
        return;
    };

    match outcome {
        Settlement::Failed => {
            state.pending_mut().remove(index);
        }
        Settlement::Confirmed => {
            let mut entry = state.pending_mut().remove(index);
            if !entry.change.apply(state.base_mut(), entry.at) {
                // Target only exists in the pending ledger so far.
                entry.confirmed = true;
                state.pending_mut().insert(index, entry);
            }
        }
    }
    state.rebuild();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Mutation;
    use symposium_types::{
        DurationOption, OpinionDraft, OpinionId, Proposal, ProposalDraft, ProposalId,
        ProposalPatch, Stance, Wei, VOTE_COST,
    };

    const NOW: Timestamp = Timestamp::new(1_700_000_000);

    fn draft(title: &str) -> ProposalDraft {
        ProposalDraft {
            title: title.into(),
            description: format!("{title} details"),
            proposed_by: "@alice".into(),
            duration: DurationOption::OneWeek,
        }
    }

    fn opinion(stance: Stance, content: &str) -> OpinionDraft {
        OpinionDraft {
            stance,
            content: content.into(),
            author: "anon".into(),
        }
    }

    fn with_one_proposal() -> State {
        reduce(&State::default(), Action::create_proposal(draft("one")), NOW)
    }

    fn ids(state: &State) -> Vec<u64> {
        state.proposals.iter().map(|p| p.id.0).collect()
    }

    fn first(state: &State) -> &Proposal {
        &state.proposals[0]
    }

    #[test]
    fn create_on_empty_store_then_prepend() {
        let s = with_one_proposal();
        assert_eq!(ids(&s), vec![1]);
        let p = first(&s);
        assert_eq!(p.total_stake, Wei::ZERO);
        assert_eq!((p.yes_share, p.no_share), (0, 0));
        assert!(p.opinions.is_empty());
        assert_eq!(p.last_updated, NOW);

        let s = reduce(&s, Action::create_proposal(draft("two")), NOW);
        assert_eq!(ids(&s), vec![2, 1]);
        assert_eq!(s.version, 2);
    }

    #[test]
    fn add_opinion_commits_one_stake_unit() {
        let s = reduce(
            &with_one_proposal(),
            Action::add_opinion(ProposalId(1), opinion(Stance::Support, "x")),
            NOW,
        );
        let p = first(&s);
        let o = &p.opinions[0];
        assert_eq!(o.id, OpinionId(1));
        assert_eq!(o.vote_count, 1);
        assert_eq!(o.stake_total, VOTE_COST);
        assert_eq!(o.created_at, "just now");
        assert_eq!(p.total_stake, VOTE_COST);
        assert_eq!((p.yes_share, p.no_share), (100, 0));
    }

    #[test]
    fn vote_adds_exactly_the_stake() {
        let s = reduce(
            &with_one_proposal(),
            Action::add_opinion(ProposalId(1), opinion(Stance::Support, "x")),
            NOW,
        );
        let s = reduce(
            &s,
            Action::vote_for_opinion(ProposalId(1), OpinionId(1), VOTE_COST),
            NOW,
        );
        let p = first(&s);
        assert_eq!(p.opinions[0].vote_count, 2);
        assert_eq!(p.opinions[0].stake_total, Wei::new(200_000_000_000_000_000));
        assert_eq!(p.total_stake, Wei::new(200_000_000_000_000_000));
        assert_eq!((p.yes_share, p.no_share), (100, 0));
    }

    #[test]
    fn opposing_opinion_splits_the_shares() {
        let mut s = with_one_proposal();
        for stance in [Stance::Support, Stance::Oppose] {
            s = reduce(&s, Action::add_opinion(ProposalId(1), opinion(stance, "x")), NOW);
        }
        let p = first(&s);
        assert_eq!(p.opinions.iter().map(|o| o.id.0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!((p.yes_share, p.no_share), (50, 50));
        assert_eq!(p.total_stake, Wei::new(200_000_000_000_000_000));
    }

    #[test]
    fn unknown_proposal_bumps_only_the_version() {
        let s = with_one_proposal();
        let next = reduce(
            &s,
            Action::add_opinion(ProposalId(42), opinion(Stance::Support, "x")),
            Timestamp::new(NOW.as_secs() + 60),
        );
        assert_eq!(next.proposals, s.proposals);
        assert_eq!(next.version, s.version + 1);

        let next = reduce(
            &s,
            Action::vote_for_opinion(ProposalId(1), OpinionId(9), VOTE_COST),
            NOW,
        );
        assert_eq!(next.proposals, s.proposals);
        assert_eq!(next.version, s.version + 1);
    }

    #[test]
    fn loading_and_error_flags_leave_version_alone() {
        let s = with_one_proposal();
        let s2 = reduce(&s, Action::SetLoading(true), NOW);
        let s3 = reduce(&s2, Action::SetError(Some("boom".into())), NOW);
        assert!(s3.is_loading);
        assert_eq!(s3.last_error.as_deref(), Some("boom"));
        assert_eq!(s3.version, s.version);

        let s4 = reduce(&s3, Action::Touch, NOW);
        assert_eq!(s4.version, s.version + 1);
        assert_eq!(s4.proposals, s.proposals);
    }

    #[test]
    fn update_merges_patch_and_stamps_time() {
        let later = Timestamp::new(NOW.as_secs() + 5);
        let s = reduce(
            &with_one_proposal(),
            Action::update_proposal(
                ProposalPatch::new(ProposalId(1))
                    .finalized(true)
                    .winning_side_is_yes(true),
            ),
            later,
        );
        let p = first(&s);
        assert_eq!(p.finalized, Some(true));
        assert_eq!(p.winning_side_is_yes, Some(true));
        assert_eq!(p.claimable, None);
        assert_eq!(p.last_updated, later);
    }

    #[test]
    fn reduce_does_not_touch_its_input() {
        let s = with_one_proposal();
        let snapshot = s.clone();
        let _ = reduce(
            &s,
            Action::add_opinion(ProposalId(1), opinion(Stance::Oppose, "no")),
            NOW,
        );
        assert_eq!(s, snapshot);
    }

    #[test]
    fn failed_write_is_subtracted_exactly() {
        let s = with_one_proposal();
        let confirmed = s.proposals.clone();
        let s = reduce(
            &s,
            Action::Speculate {
                write: WriteId(1),
                mutation: Mutation::add_opinion(ProposalId(1), opinion(Stance::Support, "x")),
            },
            NOW,
        );
        assert_eq!(first(&s).total_stake, VOTE_COST);
        assert_eq!(s.base(), confirmed.as_slice());

        let s = reduce(
            &s,
            Action::Settle {
                write: WriteId(1),
                outcome: Settlement::Failed,
            },
            NOW,
        );
        assert_eq!(s.proposals, confirmed);
        assert!(s.pending().is_empty());
    }

    #[test]
    fn failed_write_keeps_later_writes() {
        let mut s = with_one_proposal();
        for (n, stance) in [(1, Stance::Support), (2, Stance::Oppose)] {
            s = reduce(
                &s,
                Action::Speculate {
                    write: WriteId(n),
                    mutation: Mutation::add_opinion(ProposalId(1), opinion(stance, "x")),
                },
                NOW,
            );
        }
        let s = reduce(
            &s,
            Action::Settle {
                write: WriteId(1),
                outcome: Settlement::Failed,
            },
            NOW,
        );
        let p = first(&s);
        assert_eq!(p.opinions.len(), 1);
        assert_eq!(p.opinions[0].stance, Stance::Oppose);
        assert_eq!(p.opinions[0].id, OpinionId(2));
        assert_eq!((p.yes_share, p.no_share), (0, 100));
    }

    #[test]
    fn confirmed_write_folds_into_base() {
        let s = with_one_proposal();
        let s = reduce(
            &s,
            Action::Speculate {
                write: WriteId(7),
                mutation: Mutation::add_opinion(ProposalId(1), opinion(Stance::Support, "x")),
            },
            NOW,
        );
        let view = s.proposals.clone();
        let s = reduce(
            &s,
            Action::Settle {
                write: WriteId(7),
                outcome: Settlement::Confirmed,
            },
            NOW,
        );
        assert!(s.pending().is_empty());
        assert_eq!(s.base(), view.as_slice());
        assert_eq!(s.proposals, view);
    }

    #[test]
    fn refresh_keeps_unsettled_writes_on_top() {
        let s = reduce(
            &State::default(),
            Action::Speculate {
                write: WriteId(1),
                mutation: Mutation::CreateProposal(draft("mine")),
            },
            NOW,
        );
        assert_eq!(ids(&s), vec![1]);

        // A full read lands that already holds someone else's proposal #1.
        let chain = reduce(&State::default(), Action::create_proposal(draft("theirs")), NOW);
        let s = reduce(&s, Action::ReplaceAll(chain.proposals.clone()), NOW);
        assert_eq!(ids(&s), vec![2, 1]);
        assert_eq!(first(&s).title, "mine");
        assert_eq!(s.base(), chain.proposals.as_slice());
    }

    #[test]
    fn writes_on_a_moved_proposal_follow_it() {
        let mut s = State::default();
        s = reduce(
            &s,
            Action::Speculate {
                write: WriteId(1),
                mutation: Mutation::CreateProposal(draft("mine")),
            },
            NOW,
        );
        s = reduce(
            &s,
            Action::Speculate {
                write: WriteId(2),
                mutation: Mutation::add_opinion(ProposalId(1), opinion(Stance::Support, "x")),
            },
            NOW,
        );

        let chain = reduce(&State::default(), Action::create_proposal(draft("theirs")), NOW);
        s = reduce(&s, Action::ReplaceAll(chain.proposals.clone()), NOW);

        assert_eq!(ids(&s), vec![2, 1]);
        let mine = s.proposal(ProposalId(2)).unwrap();
        assert_eq!(mine.title, "mine");
        assert_eq!(mine.opinions.len(), 1);
        assert_eq!(mine.total_stake, VOTE_COST);
        let theirs = s.proposal(ProposalId(1)).unwrap();
        assert!(theirs.opinions.is_empty());
        assert_eq!(theirs.total_stake, Wei::ZERO);
        assert_eq!(s.pending()[1].change.proposal_id(), ProposalId(2));

        // The move sticks across later rebuilds.
        let s = reduce(&s, Action::Touch, NOW);
        assert_eq!(s.proposal(ProposalId(2)).unwrap().opinions.len(), 1);
    }

    #[test]
    fn shares_follow_the_exact_stake_split() {
        let mut s = with_one_proposal();
        for stance in [Stance::Support, Stance::Oppose, Stance::Oppose] {
            s = reduce(&s, Action::add_opinion(ProposalId(1), opinion(stance, "x")), NOW);
        }
        for _ in 0..100 {
            for o in 1..=3 {
                s = reduce(
                    &s,
                    Action::vote_for_opinion(ProposalId(1), OpinionId(o), VOTE_COST),
                    NOW,
                );
            }
        }
        let p = first(&s);
        assert_eq!(p.total_stake, Wei::new(VOTE_COST.raw() * 303));
        assert_eq!((p.yes_share, p.no_share), (33, 67));
    }

    #[test]
    fn confirmed_change_on_speculative_proposal_waits_for_refresh() {
        let mut s = State::default();
        s = reduce(
            &s,
            Action::Speculate {
                write: WriteId(1),
                mutation: Mutation::CreateProposal(draft("mine")),
            },
            NOW,
        );
        s = reduce(
            &s,
            Action::Speculate {
                write: WriteId(2),
                mutation: Mutation::UpdateProposal(ProposalPatch::new(ProposalId(1)).finalized(true)),
            },
            NOW,
        );
        s = reduce(
            &s,
            Action::Settle {
                write: WriteId(2),
                outcome: Settlement::Confirmed,
            },
            NOW,
        );
        assert_eq!(s.pending().len(), 2);
        assert!(s.pending()[1].confirmed);
        assert_eq!(first(&s).finalized, Some(true));

        s = reduce(&s, Action::ReplaceAll(Vec::new()), NOW);
        assert_eq!(s.pending().len(), 1);
        assert_eq!(s.pending()[0].write, WriteId(1));
    }

    #[test]
    fn settle_for_unknown_write_is_a_version_bump() {
        let s = with_one_proposal();
        let next = reduce(
            &s,
            Action::Settle {
                write: WriteId(99),
                outcome: Settlement::Failed,
            },
            NOW,
        );
        assert_eq!(next.proposals, s.proposals);
        assert_eq!(next.version, s.version + 1);
    }
}
