//! Property tests for increment wraparound and the decrement emulation.

mod common;

use proptest::prelude::*;

use tally_core::prelude::*;

use common::{connected, MockLedger};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn increment_moves_one_step_around_the_ring(c in 0u64..=WRAP_CEILING) {
        let after = block_on(async {
            let ledger = MockLedger::with_count(c);
            let ctl = connected(&ledger).await;
            ctl.increment_counter().await.unwrap();
            ctl.state().count
        });
        let expected = if c < WRAP_CEILING { c + 1 } else { 0 };
        prop_assert_eq!(after, Some(expected));
    }

    #[test]
    fn decrement_issues_exactly_the_documented_number_of_increments(c in 1u64..=WRAP_CEILING) {
        let (issued, mirrored, on_chain) = block_on(async {
            let ledger = MockLedger::with_count(c);
            let ctl = connected(&ledger).await;
            ctl.decrement_counter().await.unwrap();
            (ledger.submitted_count(ix::INCREMENT), ctl.state().count, ledger.count())
        });
        prop_assert_eq!(issued as u64, WRAP_CEILING - c + 1);
        prop_assert_eq!(mirrored, on_chain);
    }
}
