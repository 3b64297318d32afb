use proptest::prelude::*;

use symposium_types::{Timestamp, Wei};

proptest! {
    /// Decimal rendering parses back to the same amount.
    #[test]
    fn wei_display_parses_back(raw in 0u128..1_000_000_000_000_000_000_000_000u128) {
        let amount = Wei::new(raw);
        let parsed: Wei = amount.to_string().parse().unwrap();
        prop_assert_eq!(parsed, amount);
    }

    /// A share is always a percentage.
    #[test]
    fn share_of_is_bounded(part in 0u128..u128::MAX / 2, total in 0u128..u128::MAX / 2) {
        let share = Wei::new(part).share_of(Wei::new(total));
        prop_assert!(share <= 100);
    }

    /// Complementary shares of a split total sum to 100 within one point of rounding.
    #[test]
    fn complementary_shares_sum_to_hundred(a in 1u128..10u128.pow(24), b in 1u128..10u128.pow(24)) {
        let total = Wei::new(a + b);
        let sum = Wei::new(a).share_of(total) as u32 + Wei::new(b).share_of(total) as u32;
        prop_assert!((99..=101).contains(&sum));
    }

    /// remaining_from and elapsed_since mirror each other.
    #[test]
    fn remaining_mirrors_elapsed(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let now = Timestamp::new(base);
        let later = Timestamp::new(base + offset);
        prop_assert_eq!(later.remaining_from(now), offset);
        prop_assert_eq!(now.elapsed_since(later), offset);
    }
}
