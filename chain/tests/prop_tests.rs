use proptest::prelude::*;

use symposium_chain::abi::{encode, Decoder, Token};
use symposium_chain::contract::decode_proposal;
use symposium_types::ProposalId;

proptest! {
    /// Arbitrary return data is rejected or decoded, never a panic.
    #[test]
    fn proposal_decoding_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_proposal(ProposalId(1), &data);
    }

    /// Strings survive the head/tail layout next to static words.
    #[test]
    fn strings_read_back(title in ".{0,80}", details in ".{0,200}", expire in any::<u64>()) {
        let data = encode(&[
            Token::String(title.clone()),
            Token::String(details.clone()),
            Token::Uint(expire as u128),
            Token::Bool(true),
            Token::Bool(false),
        ]);
        prop_assert_eq!(data.len() % 32, 0);
        let p = decode_proposal(ProposalId(7), &data).unwrap();
        prop_assert_eq!(p.title, title);
        prop_assert_eq!(p.details, details);
        prop_assert_eq!(p.expires_at.as_secs(), expire);
        prop_assert!(p.finalized && !p.yes_wins);
    }

    /// Cutting into the string bytes makes the read fail cleanly.
    #[test]
    fn truncated_strings_fail(cut in 25usize..=64) {
        let data = encode(&[Token::String("x".repeat(40))]);
        let short = &data[..data.len() - cut];
        prop_assert!(Decoder::new(short).string(0).is_err());
    }
}
