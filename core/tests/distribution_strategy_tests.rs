// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use mwfaas_core::distribution_strategy::{
    BatchDistributionStrategy, DistributionStrategy, ListDistributionStrategy,
    PartitionDistributionStrategy,
};

#[test]
fn test_equal_split_six_items_three_workers() {
    // Arrange
    let data = vec![1, 2, 3, 4, 5, 6];

    // Act
    let chunks = ListDistributionStrategy.split(data, 3).unwrap();

    // Assert
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].items, vec![1, 2]);
    assert_eq!(chunks[1].items, vec![3, 4]);
    assert_eq!(chunks[2].items, vec![5, 6]);
    assert_eq!(
        chunks.iter().map(|c| c.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn test_equal_split_hundred_items_four_workers() {
    // Arrange
    let data: Vec<i64> = (1..=100).collect();

    // Act
    let chunks = ListDistributionStrategy.split(data.clone(), 4).unwrap();

    // Assert: four chunks of 25, concatenating reproduces the input
    assert_eq!(chunks.len(), 4);
    assert!(chunks.iter().all(|c| c.len() == 25));
    let concatenated: Vec<i64> = chunks.into_iter().flat_map(|c| c.items).collect();
    assert_eq!(concatenated, data);
}

#[test]
fn test_equal_split_uneven_input_balances_sizes() {
    // Arrange
    let data: Vec<i32> = (0..10).collect();

    // Act
    let chunks = ListDistributionStrategy.split(data.clone(), 3).unwrap();

    // Assert: sizes differ by at most one and nothing is lost
    assert_eq!(
        chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
        vec![4, 3, 3]
    );
    assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), data.len());
    let concatenated: Vec<i32> = chunks.into_iter().flat_map(|c| c.items).collect();
    assert_eq!(concatenated, data);
}

#[test]
fn test_equal_split_empty_input_yields_no_chunks() {
    // Act
    let chunks = ListDistributionStrategy.split(Vec::<i32>::new(), 4).unwrap();

    // Assert
    assert!(chunks.is_empty());
}

#[test]
fn test_equal_split_rejects_zero_workers() {
    // Act
    let result = ListDistributionStrategy.split(vec![1, 2, 3], 0);

    // Assert
    assert!(result.is_err());
}

#[test]
fn test_equal_split_more_workers_than_items() {
    // Act
    let chunks = ListDistributionStrategy.split(vec![1, 2, 3], 8).unwrap();

    // Assert: one single-element chunk per item, never an empty chunk
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.len() == 1));
}

#[test]
fn test_batch_split_bounds_chunk_size() {
    // Arrange
    let data: Vec<i32> = (0..10).collect();
    let strategy = BatchDistributionStrategy { max_chunk_size: 4 };

    // Act: worker count is irrelevant for this strategy
    let chunks = strategy.split(data.clone(), 2).unwrap();

    // Assert
    assert_eq!(
        chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
        vec![4, 4, 2]
    );
    let concatenated: Vec<i32> = chunks.into_iter().flat_map(|c| c.items).collect();
    assert_eq!(concatenated, data);
}

#[test]
fn test_batch_split_rejects_zero_chunk_size() {
    // Arrange
    let strategy = BatchDistributionStrategy { max_chunk_size: 0 };

    // Act / Assert
    assert!(strategy.split(vec![1, 2, 3], 2).is_err());
}

#[test]
fn test_partition_split_groups_adjacent_equal_keys() {
    // Arrange
    let data = vec![(1, "a"), (1, "b"), (2, "c"), (2, "d"), (1, "e")];
    let strategy = PartitionDistributionStrategy::new(|item: &(i32, &str)| item.0);

    // Act
    let chunks = strategy.split(data.clone(), 4).unwrap();

    // Assert: three runs, order and contiguity preserved
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].items, vec![(1, "a"), (1, "b")]);
    assert_eq!(chunks[1].items, vec![(2, "c"), (2, "d")]);
    assert_eq!(chunks[2].items, vec![(1, "e")]);
    let concatenated: Vec<(i32, &str)> = chunks.into_iter().flat_map(|c| c.items).collect();
    assert_eq!(concatenated, data);
}

#[test]
fn test_partition_split_empty_input_yields_no_chunks() {
    // Arrange
    let strategy = PartitionDistributionStrategy::new(|item: &i32| *item);

    // Act / Assert
    assert!(strategy.split(Vec::<i32>::new(), 4).unwrap().is_empty());
}
