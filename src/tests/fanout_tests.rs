use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::fanout::RewardFanout;
use crate::test_utils::{amount, share_contract_for, test_address, MockChain};

#[tokio::test]
async fn test_resolves_each_validator_contract_exactly_once() {
    let chain = Arc::new(MockChain::default());
    let pairs: Vec<_> = (0..1000).map(|n| (7u64, test_address(n))).collect();

    RewardFanout::new(chain.clone(), 16)
        .total_unclaimed(&pairs)
        .await
        .unwrap();

    assert_eq!(
        chain.resolutions.load(Ordering::SeqCst),
        1,
        "1000 records of one validator must resolve its contract once"
    );
    assert_eq!(chain.liquid_calls.load(Ordering::SeqCst), 1000);
}

#[tokio::test]
async fn test_resolves_distinct_validators_separately() {
    let chain = Arc::new(MockChain::default());
    let pairs = vec![
        (1, test_address(1)),
        (2, test_address(2)),
        (1, test_address(3)),
        (3, test_address(4)),
        (2, test_address(5)),
    ];

    RewardFanout::new(chain.clone(), 4)
        .total_unclaimed(&pairs)
        .await
        .unwrap();

    assert_eq!(chain.resolutions.load(Ordering::SeqCst), 3);
    assert_eq!(chain.liquid_calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_sums_rewards_through_the_resolved_share_contract() {
    let mut chain = MockChain::default();
    chain
        .liquid_rewards
        .insert((share_contract_for(1), test_address(10)), 100);
    chain
        .liquid_rewards
        .insert((share_contract_for(2), test_address(11)), 250);
    let chain = Arc::new(chain);

    let pairs = vec![(1, test_address(10)), (2, test_address(11))];
    let total = RewardFanout::new(chain, 8)
        .total_unclaimed(&pairs)
        .await
        .unwrap();

    assert_eq!(total, amount(350));
}

#[tokio::test]
async fn test_single_failure_fails_the_whole_aggregate() {
    let chain = Arc::new(MockChain {
        fail_liquid_for: Some(test_address(5)),
        ..Default::default()
    });
    let pairs: Vec<_> = (0..10).map(|n| (1u64, test_address(n))).collect();

    let result = RewardFanout::new(chain, 4).total_unclaimed(&pairs).await;
    assert!(
        result.is_err(),
        "one failed reward call must fail the aggregate instead of counting zero"
    );
}

#[tokio::test]
async fn test_in_flight_calls_stay_under_the_cap() {
    let chain = Arc::new(MockChain {
        call_delay: Duration::from_millis(5),
        ..Default::default()
    });
    let pairs: Vec<_> = (0..64).map(|n| (1u64, test_address(n))).collect();

    RewardFanout::new(chain.clone(), 8)
        .total_unclaimed(&pairs)
        .await
        .unwrap();

    let peak = chain.peak_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 8, "peak in-flight {} exceeded the cap of 8", peak);
    assert!(peak > 1, "reward calls should overlap, got peak {}", peak);
}

#[tokio::test]
async fn test_no_delegators_means_zero_unclaimed() {
    let chain = Arc::new(MockChain::default());
    let total = RewardFanout::new(chain.clone(), 4)
        .total_unclaimed(&[])
        .await
        .unwrap();
    assert!(total.is_zero());
    assert_eq!(chain.resolutions.load(Ordering::SeqCst), 0);
}
