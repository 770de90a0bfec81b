//! Property-based test for signature determinism: `signatures(x, bs)` must
//! produce the same result across repeated invocations on the same input,
//! and its length must always be the ceiling division the spec promises.

use proptest::prelude::*;
use signature::signatures;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn signatures_are_deterministic_across_invocations(
        data in proptest::collection::vec(any::<u8>(), 0..4000),
        bs in 1u64..513,
    ) {
        prop_assert_eq!(signatures(&data, bs), signatures(&data, bs));
    }

    #[test]
    fn signature_count_is_ceiling_division(
        data in proptest::collection::vec(any::<u8>(), 1..4000),
        bs in 1u64..513,
    ) {
        let sigs = signatures(&data, bs);
        let expected = (data.len() as u64).div_ceil(bs);
        prop_assert_eq!(sigs.len() as u64, expected);
    }

    #[test]
    fn empty_basis_never_yields_signatures(bs in 0u64..1024) {
        prop_assert!(signatures(&[], bs).is_empty());
    }
}
