//! Unit tests for batch partitioning

use engagement_collector::session::partition;
use engagement_collector::{Endpoint, TweetId};

#[test]
fn test_partition_covers_every_identifier_in_order() {
    for len in [1usize, 24, 25, 26, 249, 250, 251, 1000] {
        let ids: Vec<TweetId> = (1..=len as TweetId).collect();
        for endpoint in [Endpoint::Totals, Endpoint::Window, Endpoint::Historical] {
            let limit = endpoint.max_batch_size();
            let batches = partition(&ids, limit).unwrap();

            assert_eq!(batches.len(), len.div_ceil(limit), "len {len} limit {limit}");
            assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= limit));
            assert!(batches[..batches.len() - 1].iter().all(|b| b.len() == limit));

            let flattened: Vec<TweetId> = batches.iter().flat_map(|b| b.ids.clone()).collect();
            assert_eq!(flattened, ids);
        }
    }
}

#[test]
fn test_partition_indexes_are_sequential() {
    let ids: Vec<TweetId> = (1..=60).collect();
    let batches = partition(&ids, 25).unwrap();
    let indexes: Vec<usize> = batches.iter().map(|b| b.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[test]
fn test_partition_of_nothing_is_empty() {
    assert!(partition(&[], 25).unwrap().is_empty());
}

#[test]
fn test_zero_limit_is_rejected() {
    assert!(partition(&[1, 2], 0).is_err());
}
