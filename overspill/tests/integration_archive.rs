//! Integration tests for archive accept, resize and query behavior.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use overspill::error::ArchiveError;
use overspill::sink::{self, CollectingSink};
use overspill::{Archive, MAX_CAPACITY, OverspillError, Sample};

fn timestamps<T>(samples: &[Sample<T>]) -> Vec<i64> {
    samples.iter().map(Sample::timestamp).collect()
}

#[test]
fn test_capacity_three_end_to_end() {
    let overspill = Arc::new(CollectingSink::<String>::new());
    let archive = Archive::with_shared_overspill(3, overspill.clone()).unwrap();

    for ts in 1..=5 {
        archive.accept(Sample::new(ts, format!("value-{ts}")));
    }

    assert_eq!(timestamps(&archive.get_archive()), vec![3, 4, 5]);
    assert_eq!(timestamps(&archive.get_archive_since(4)), vec![4, 5]);
    assert!(archive.get_archive_since(10).is_empty());

    let spilled = overspill.samples();
    assert_eq!(
        spilled,
        vec![
            Sample::new(1, "value-1".to_string()),
            Sample::new(2, "value-2".to_string()),
        ]
    );
}

#[test]
fn test_capacity_bound_and_order_hold_for_all_sizes() {
    for capacity in 0..8usize {
        let overspill = Arc::new(CollectingSink::<i64>::new());
        let archive = Archive::with_shared_overspill(capacity, overspill.clone()).unwrap();

        for ts in 0..20i64 {
            archive.accept(Sample::new(ts, ts * 2));

            let retained = archive.get_archive();
            assert!(retained.len() <= capacity, "capacity={capacity} ts={ts}");
            assert!(retained.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));

            // Retained plus spilled is exactly everything accepted, in order.
            let mut all = overspill.samples();
            all.extend(retained);
            assert_eq!(timestamps(&all), (0..=ts).collect::<Vec<_>>());
        }
    }
}

#[test]
fn test_since_is_suffix_of_full_snapshot() {
    let archive: Archive<()> = Archive::new(6).unwrap();
    for ts in [2, 4, 4, 7, 9, 9, 9, 12] {
        archive.accept(Sample::new(ts, ()));
    }

    let full = archive.get_archive();
    assert_eq!(archive.get_archive_since(i64::MIN), full);

    for since in -1..15 {
        let expected: Vec<_> = full
            .iter()
            .filter(|sample| sample.timestamp() >= since)
            .cloned()
            .collect();
        assert_eq!(archive.get_archive_since(since), expected, "since={since}");
    }
}

#[test]
fn test_resize_down_full_archive() {
    let overspill = Arc::new(CollectingSink::<()>::new());
    let archive = Archive::with_shared_overspill(8, overspill.clone()).unwrap();
    for ts in 1..=8 {
        archive.accept(Sample::new(ts, ()));
    }

    archive.set_capacity(3).unwrap();

    // M - N oldest forwarded in oldest-to-newest order, N newest kept
    assert_eq!(timestamps(&overspill.samples()), vec![1, 2, 3, 4, 5]);
    assert_eq!(timestamps(&archive.get_archive()), vec![6, 7, 8]);
}

#[test]
fn test_resize_up_then_down_again() {
    let overspill = Arc::new(CollectingSink::<()>::new());
    let archive = Archive::with_shared_overspill(2, overspill.clone()).unwrap();
    for ts in 1..=2 {
        archive.accept(Sample::new(ts, ()));
    }

    archive.set_capacity(4).unwrap();
    assert!(overspill.is_empty());
    for ts in 3..=4 {
        archive.accept(Sample::new(ts, ()));
    }
    assert_eq!(timestamps(&archive.get_archive()), vec![1, 2, 3, 4]);

    archive.set_capacity(1).unwrap();
    assert_eq!(timestamps(&overspill.samples()), vec![1, 2, 3]);
    assert_eq!(timestamps(&archive.get_archive()), vec![4]);
}

#[test]
fn test_clear_then_accept_starts_fresh() {
    let overspill = Arc::new(CollectingSink::<()>::new());
    let archive = Archive::with_shared_overspill(2, overspill.clone()).unwrap();
    for ts in 1..=3 {
        archive.accept(Sample::new(ts, ()));
    }
    assert_eq!(overspill.len(), 1);

    archive.clear();
    assert!(archive.get_archive().is_empty());
    assert!(archive.get_archive_since(i64::MIN).is_empty());

    archive.accept(Sample::new(10, ()));
    archive.accept(Sample::new(11, ()));
    assert_eq!(timestamps(&archive.get_archive()), vec![10, 11]);
    // Fresh buffer at capacity 2: nothing new spilled yet
    assert_eq!(overspill.len(), 1);
}

#[test]
fn test_invalid_capacity_leaves_state_unchanged() {
    let archive: Archive<u8> = Archive::new(2).unwrap();
    archive.accept(Sample::new(1, 1));

    match archive.set_capacity(MAX_CAPACITY + 1) {
        Err(OverspillError::Archive(ArchiveError::InvalidCapacity { capacity, max })) => {
            assert_eq!(capacity, MAX_CAPACITY + 1);
            assert_eq!(max, MAX_CAPACITY);
        }
        other => panic!("Expected InvalidCapacity error, got: {other:?}"),
    }

    assert_eq!(archive.capacity(), 2);
    assert_eq!(archive.get_archive(), vec![Sample::new(1, 1)]);
}

#[test]
fn test_closure_sink_sees_every_eviction() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let archive = Archive::with_overspill(
        1,
        sink::from_fn(move |sample: Sample<i64>| recorder.lock().unwrap().push(sample.timestamp())),
    )
    .unwrap();

    for ts in 0..5 {
        archive.accept(Sample::new(ts, ts));
    }

    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn test_concurrent_writers_lose_nothing() {
    const WRITERS: i64 = 4;
    const PER_WRITER: i64 = 500;

    let overspill = Arc::new(CollectingSink::<i64>::new());
    let archive = Archive::with_shared_overspill(64, overspill.clone()).unwrap();

    // Timestamps are shared so ordering across writers is not checked here;
    // only conservation of samples is.
    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let archive = &archive;
            scope.spawn(move || {
                for i in 0..PER_WRITER {
                    archive.accept(Sample::new(0, writer * PER_WRITER + i));
                }
            });
        }
    });

    let retained = archive.get_archive();
    let spilled = overspill.samples();
    assert_eq!(retained.len(), 64);
    assert_eq!(spilled.len() as i64 + 64, WRITERS * PER_WRITER);

    let mut values: Vec<i64> = retained
        .into_iter()
        .chain(spilled)
        .map(Sample::into_value)
        .collect();
    values.sort_unstable();
    assert_eq!(values, (0..WRITERS * PER_WRITER).collect::<Vec<_>>());
}

#[test]
fn test_readers_never_see_torn_snapshots() {
    let archive = Archive::<i64>::new(16).unwrap();
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let archive = &archive;
        let done = &done;

        scope.spawn(move || {
            for ts in 0..5_000 {
                archive.accept(Sample::new(ts, ts));
                if ts % 1_000 == 0 {
                    // Exercise migrations while readers are active.
                    archive.set_capacity(8 + usize::try_from(ts / 1_000).unwrap()).unwrap();
                }
            }
            done.store(true, Ordering::Release);
        });

        for _ in 0..3 {
            scope.spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let snapshot = archive.get_archive();
                    assert!(snapshot.len() <= 16);
                    // Contiguous run of timestamps, value mirrors timestamp.
                    for pair in snapshot.windows(2) {
                        assert_eq!(pair[0].timestamp() + 1, pair[1].timestamp());
                    }
                    assert!(snapshot.iter().all(|s| *s.value() == s.timestamp()));

                    let suffix = archive.get_archive_since(2_500);
                    assert!(suffix.iter().all(|s| s.timestamp() >= 2_500));
                }
            });
        }
    });

    assert_eq!(archive.newest_timestamp(), Some(4_999));
}
