//! End-to-end engine behavior against the in-memory fixture directory.

mod common;

use common::{FailureMode, FixtureDirectory, partition_of, spread_keys};
use core::time::Duration;
use futures::StreamExt;
use scour::{Directory, Error, FetchConfig, Fetcher, PartitionSpec, RetryPolicy};
use std::collections::HashSet;

fn config(concurrency_level: usize, batch_size: usize, page_size: usize) -> FetchConfig {
    FetchConfig {
        concurrency_level,
        batch_size,
        page_size,
        // Keep retry delays negligible so failure tests stay fast.
        retry: RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
        ..FetchConfig::default()
    }
}

fn assert_exact_coverage(items: &[String], expected: &[String]) {
    let unique: HashSet<&String> = items.iter().collect();
    assert_eq!(unique.len(), items.len(), "duplicates emitted");
    assert_eq!(items.len(), expected.len(), "omissions or extras");
    for key in expected {
        assert!(unique.contains(key), "missing {key:?}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn coverage_is_exact_for_any_concurrency() {
    let keys = spread_keys(2_500);

    for concurrency in [1, 4, 16] {
        let fetcher = Fetcher::new(
            FixtureDirectory::new(keys.clone()),
            config(concurrency, 1, 100),
        )
        .unwrap();

        let (items, report) = fetcher
            .fetch(&PartitionSpec::new("name"))
            .unwrap()
            .collect()
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_exact_coverage(&items, &keys);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_run_matches_isolated_partition_runs() {
    let keys = spread_keys(1_000);

    // Isolation: page through one partition at a time, straight against the
    // directory, following continuations by hand.
    let directory = FixtureDirectory::new(keys.clone());
    let mut isolated: Vec<String> = Vec::new();
    for part in &PartitionSpec::new("name").partitions().unwrap() {
        let mut req = part.initial_request(64);
        loop {
            let page = directory.fetch_page(&req).await.unwrap();
            isolated.extend(page.entries);
            match page.cursor {
                Some(cursor) => req = req.continuation(cursor),
                None => break,
            }
        }
    }

    let fetcher = Fetcher::new(FixtureDirectory::new(keys.clone()), config(16, 1, 64)).unwrap();
    let (concurrent, _) = fetcher
        .fetch(&PartitionSpec::new("name"))
        .unwrap()
        .collect()
        .await
        .unwrap();

    let mut isolated_sorted = isolated;
    isolated_sorted.sort();
    let mut concurrent_sorted = concurrent;
    concurrent_sorted.sort();
    assert_eq!(isolated_sorted, concurrent_sorted);
}

#[tokio::test(flavor = "multi_thread")]
async fn pagination_issues_exactly_ceil_size_over_p_requests() {
    let keys = spread_keys(500);
    let page_size = 10;
    let directory = FixtureDirectory::new(keys.clone());

    // Expected requests per partition: ceil(count / P), and one probe even
    // for an empty range (emptiness is only learnable by asking).
    let mut expected: Vec<usize> = vec![0; 26];
    for key in &keys {
        expected[partition_of(key)] += 1;
    }
    let expected_calls: Vec<usize> = expected
        .iter()
        .map(|count| core::cmp::max(1, count.div_ceil(page_size)))
        .collect();

    let fetcher = Fetcher::new(directory, config(8, 1, page_size)).unwrap();
    let stream = fetcher.fetch(&PartitionSpec::new("name")).unwrap();
    let (items, report) = stream.collect().await.unwrap();

    assert!(report.is_complete());
    assert_eq!(items.len(), keys.len());

    let directory = fetcher.directory();
    for (partition, want) in expected_calls.iter().enumerate() {
        assert_eq!(
            directory.calls_for(partition),
            *want,
            "partition {partition} request count"
        );
    }
    assert_eq!(
        directory.calls_started(),
        expected_calls.iter().sum::<usize>(),
        "requests issued after a cursor-less page"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn first_item_arrives_before_the_fetch_finishes() {
    let keys = spread_keys(520);
    let directory = FixtureDirectory::new(keys).with_latency(Duration::from_millis(30));

    let fetcher = Fetcher::new(directory, config(2, 1, 10)).unwrap();
    let mut stream = fetcher.fetch(&PartitionSpec::new("name")).unwrap();

    let first = stream.next().await.expect("stream ended with no items");
    assert!(first.is_ok());

    // With 2 workers and 52 page requests outstanding, the first emission
    // must land while most calls have not completed yet.
    let done = fetcher.directory().calls_completed();
    assert!(done < 52, "first item only arrived after {done} calls");

    // Drain the rest; totals must still be exact.
    let (rest, report) = stream.collect().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(rest.len() + 1, 520);
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_partition_does_not_poison_the_rest() {
    let keys = spread_keys(1_300);
    let bad = partition_of("m000000");
    let directory = FixtureDirectory::new(keys.clone()).with_failure(bad, FailureMode::Permanent);

    let fetcher = Fetcher::new(directory, config(8, 1, 50)).unwrap();
    let stream = fetcher.fetch(&PartitionSpec::new("name")).unwrap();
    let (items, report) = stream.collect().await.unwrap();

    let expected: Vec<String> = keys
        .iter()
        .filter(|k| partition_of(k) != bad)
        .cloned()
        .collect();
    assert_exact_coverage(&items, &expected);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].partition, bad);
    assert!(!report.is_complete());
}

#[tokio::test(flavor = "multi_thread")]
async fn transient_failures_are_retried_to_success() {
    let keys = spread_keys(260);
    let flaky = partition_of("g000000");
    let directory =
        FixtureDirectory::new(keys.clone()).with_failure(flaky, FailureMode::TransientTimes(2));

    let fetcher = Fetcher::new(directory, config(4, 1, 100)).unwrap();
    let (items, report) = fetcher
        .fetch(&PartitionSpec::new("name"))
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert!(report.is_complete(), "retries should have recovered");
    assert_exact_coverage(&items, &keys);

    // First page of the flaky partition: 2 failed tries + 1 success.
    assert_eq!(fetcher.directory().calls_for(flaky), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_retries_escalate_to_partition_failure() {
    let keys = spread_keys(260);
    let dead = partition_of("q000000");
    let directory = FixtureDirectory::new(keys.clone()).with_failure(dead, FailureMode::Transient);

    let fetcher = Fetcher::new(directory, config(4, 1, 100)).unwrap();
    let (items, report) = fetcher
        .fetch(&PartitionSpec::new("name"))
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].partition, dead);
    let expected: Vec<String> = keys
        .iter()
        .filter(|k| partition_of(k) != dead)
        .cloned()
        .collect();
    assert_exact_coverage(&items, &expected);

    // max_attempts tries were burned on the first page of the partition.
    assert_eq!(fetcher.directory().calls_for(dead), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn terminates_across_the_tuning_matrix() {
    let keys = spread_keys(10_000);

    for concurrency in [1, 4, 16] {
        for batch_size in [1, 5] {
            let fetcher = Fetcher::new(
                FixtureDirectory::new(keys.clone()),
                config(concurrency, batch_size, 100),
            )
            .unwrap();

            let (items, report) = fetcher
                .fetch(&PartitionSpec::new("name"))
                .unwrap()
                .collect()
                .await
                .unwrap();

            assert!(report.is_complete());
            assert_exact_coverage(&items, &keys);
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_scenario_u1_to_u2500() {
    // 2500 users u1..u2500: every key lands in the 'u' partition, so one
    // partition pages through everything while 25 probes come back empty.
    let keys: Vec<String> = (1..=2_500).map(|i| format!("u{i}")).collect();
    let directory = FixtureDirectory::new(keys.clone());

    let fetcher = Fetcher::new(directory, config(16, 1, 999)).unwrap();
    let (items, report) = fetcher
        .fetch(&PartitionSpec::new("uid"))
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_exact_coverage(&items, &keys);

    let directory = fetcher.directory();
    let u = partition_of("u1");
    assert_eq!(directory.calls_for(u), 3, "ceil(2500 / 999) pages");
    for partition in (0..26).filter(|p| *p != u) {
        assert_eq!(directory.calls_for(partition), 1, "one probe per empty range");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_iterator_serves_synchronous_consumers() {
    let keys = spread_keys(780);
    let fetcher = Fetcher::new(FixtureDirectory::new(keys.clone()), config(8, 1, 64)).unwrap();
    let iter = fetcher
        .fetch(&PartitionSpec::new("name"))
        .unwrap()
        .blocking_iter();

    let items = tokio::task::spawn_blocking(move || {
        iter.collect::<Result<Vec<String>, Error>>().unwrap()
    })
    .await
    .unwrap();

    assert_exact_coverage(&items, &keys);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_abandons_promptly_without_hanging() {
    let keys = spread_keys(5_200);
    let directory = FixtureDirectory::new(keys).with_latency(Duration::from_millis(5));

    let fetcher = Fetcher::new(directory, config(4, 1, 10)).unwrap();
    let mut stream = fetcher.fetch(&PartitionSpec::new("name")).unwrap();

    let first = stream.next().await.expect("no first item");
    assert!(first.is_ok());
    stream.cancel();

    let (rest, _) = stream.collect().await.unwrap();
    assert!(
        rest.len() + 1 < 5_200,
        "cancellation should stop the fetch early"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_the_stream_stops_the_workers() {
    let keys = spread_keys(5_200);
    let directory = FixtureDirectory::new(keys).with_latency(Duration::from_millis(5));

    let fetcher = Fetcher::new(directory, config(4, 1, 10)).unwrap();
    {
        let mut stream = fetcher.fetch(&PartitionSpec::new("name")).unwrap();
        let _ = stream.next().await;
        // Consumer walks away mid-fetch.
    }

    // Give workers a moment to hit their next emission checkpoint.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let before = fetcher.directory().calls_started();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let after = fetcher.directory().calls_started();
    assert_eq!(before, after, "workers kept issuing calls after drop");
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_partition_spec_is_rejected_up_front() {
    let fetcher =
        Fetcher::new(FixtureDirectory::new(Vec::new()), FetchConfig::default()).unwrap();
    let err = fetcher.fetch(&PartitionSpec::new("")).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
}
