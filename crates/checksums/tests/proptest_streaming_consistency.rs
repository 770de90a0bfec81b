//! Property-based test confirming the incremental hashers agree with their
//! one-shot counterparts regardless of how the input is chunked.

use checksums::{strong, weak, StrongHasher, WeakHasher};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn weak_hasher_matches_one_shot_across_arbitrary_chunking(
        chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..16),
    ) {
        let mut hasher = WeakHasher::new();
        let mut whole = Vec::new();
        for chunk in &chunks {
            hasher.update(chunk);
            whole.extend_from_slice(chunk);
        }
        prop_assert_eq!(hasher.finalize(), weak(&whole));
    }

    #[test]
    fn strong_hasher_matches_one_shot_across_arbitrary_chunking(
        chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..16),
    ) {
        let mut hasher = StrongHasher::new();
        let mut whole = Vec::new();
        for chunk in &chunks {
            hasher.update(chunk);
            whole.extend_from_slice(chunk);
        }
        prop_assert_eq!(hasher.finalize(), strong(&whole));
    }
}
