use proptest::prelude::*;
use rust_decimal::Decimal;
use tickcache::{DataPoint, Tick, TimeInterval};
use tickcache_mock::fixtures::{random_walk_ticks, tick_points};

use crate::helpers::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]
    #[test]
    fn sequential_loads_never_refetch_and_cache_matches_store(
        loads in prop::collection::vec((-500i64..3_000, 0i64..600), 1..8)
    ) {
        tokio_test::block_on(async move {
            let h = harness().await;
            let k = tick_key();
            for (from, len) in loads {
                let iv = TimeInterval::new(from, from + len);
                let (c, mut rx) = channel();
                h.cache.caching().load_default(&k, iv.start(), iv.end(), c);
                let got = collect_until_covered(&mut rx, iv).await;
                assert_eq!(flatten(&got), expected_ticks(&h.ticks, iv));
            }

            let log: Vec<TimeInterval> =
                h.ctl.fetch_log().await.into_iter().map(|(_, iv)| iv).collect();
            for (i, a) in log.iter().enumerate() {
                for b in &log[i + 1..] {
                    assert!(!a.overlaps(b), "{a} fetched again as part of {b}");
                }
            }
            for r in h.cache.caching().cached_ranges(&k) {
                assert_eq!(h.cache.caching().snapshot(&k, r), expected_ticks(&h.ticks, r));
            }
        });
    }
}

#[derive(Debug, Clone)]
enum Step {
    Load { from: i64, len: i64 },
    Live(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (-500i64..12_000, 0i64..800).prop_map(|(from, len)| Step::Load { from, len }),
        (1usize..30).prop_map(Step::Live),
    ]
}

const BUDGET: usize = 40;
const LIVE_START: i64 = 10_000;
const LIVE_COUNT: i64 = 200;

fn live_ticks() -> Vec<Tick> {
    (0..LIVE_COUNT)
        .map(|i| Tick {
            timestamp: LIVE_START + i * 10,
            ask: Decimal::new(110_020, 5),
            bid: Decimal::new(110_000, 5),
            ask_volume: Decimal::ONE,
            bid_volume: Decimal::ONE,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]
    #[test]
    fn live_and_loads_under_small_budget_keep_cache_matching_store(
        steps in prop::collection::vec(step(), 1..12)
    ) {
        tokio_test::block_on(async move {
            let h = harness_with(random_walk_ticks(42, 0, 500, 10), &[], |b| {
                b.cache_point_budget(BUDGET)
            })
            .await;
            let k = tick_key();
            let live = live_ticks();
            h.ctl.insert(&k, tick_points(&live)).await.unwrap();
            let mut stored = h.ticks.clone();
            stored.extend(live.iter().cloned());

            let caching = h.cache.caching();
            let mut feed = live.into_iter();
            for step in steps {
                match step {
                    Step::Load { from, len } => {
                        let iv = TimeInterval::new(from, from + len);
                        let (c, mut rx) = channel();
                        caching.load_default(&k, iv.start(), iv.end(), c);
                        let got = collect_until_covered(&mut rx, iv).await;
                        assert_eq!(flatten(&got), expected_ticks(&stored, iv));
                    }
                    Step::Live(n) => {
                        for t in feed.by_ref().take(n) {
                            caching.absorb_live(&k, vec![DataPoint::Tick(t)]);
                        }
                    }
                }

                assert!(caching.cached_len(&k) <= BUDGET);
                for r in caching.cached_ranges(&k) {
                    assert_eq!(caching.snapshot(&k, r), expected_ticks(&stored, r), "range {r}");
                }
            }
        });
    }
}
