//! Public API integration tests for tile-schedule.

mod support;

use support::histograms::{tight_total, uniform_histogram};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tile_schedule::timing::Stage;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use tile_schedule::{
    compute_schedule, compute_schedule_timed, compute_schedule_with, tile_capacity, ScanStrategy,
    ScheduleConfig, ScheduleError, TileRecord, ENCODING_LIMIT, SENTINEL,
};

#[test]
fn test_compute_example() {
    let schedule = compute_schedule(Some(&[3, 0, 5]), 8, 4).expect("compute should succeed");

    assert!(!schedule.is_unrouted());
    assert_eq!(schedule.num_groups(), 3);
    assert_eq!(schedule.capacity(), Some(4));
    assert_eq!(schedule.hist(), Some(&[3, 0, 5][..]));
    assert_eq!(schedule.tok_starts(), Some(&[0, 3, 3, 8][..]));
    assert_eq!(schedule.tile_starts(), Some(&[0, 1, 1, 3][..]));
    assert_eq!(
        schedule.tile_info(),
        Some(&[0x0000_0000, 0x0000_0002, 0x0001_0002, 0xFFFF_FFFF][..])
    );
    assert_eq!(schedule.total_tokens(), Some(8));
    assert_eq!(schedule.total_tiles(), Some(3));
}

#[test]
fn test_raw_buffer_layout() {
    let schedule = compute_schedule(Some(&[3, 0, 5]), 8, 4).unwrap();
    let raw = schedule.raw().unwrap();
    assert_eq!(
        raw,
        &[3, 0, 5, 0, 3, 3, 8, 0, 1, 1, 3, 0, 2, 0x0001_0002, SENTINEL]
    );
    let layout = schedule.layout().unwrap();
    assert_eq!(layout.total_len(), 3 * 3 + 2 + 4);
}

#[test]
fn test_unrouted() {
    let schedule = compute_schedule(None, 1000, 64).expect("absent histogram is not an error");
    assert!(schedule.is_unrouted());
    assert_eq!(schedule.raw(), None);
    assert_eq!(schedule.hist(), None);
    assert_eq!(schedule.tok_starts(), None);
    assert_eq!(schedule.tile_starts(), None);
    assert_eq!(schedule.tile_info(), None);
    assert_eq!(schedule.total_tokens(), None);
    assert_eq!(schedule.tiles().count(), 0);
}

#[test]
fn test_unrouted_ignores_sizing() {
    // Nothing is planned without a histogram, so a zero tile size is harmless.
    let schedule = compute_schedule(None, 10, 0).unwrap();
    assert!(schedule.is_unrouted());
}

#[test]
fn test_zero_groups() {
    let schedule = compute_schedule(Some(&[]), 0, 16).unwrap();
    assert_eq!(schedule.num_groups(), 0);
    assert_eq!(schedule.hist(), Some(&[][..]));
    assert_eq!(schedule.tok_starts(), Some(&[0][..]));
    assert_eq!(schedule.tile_starts(), Some(&[0][..]));
    assert_eq!(schedule.tile_info(), Some(&[][..]));
    assert_eq!(schedule.total_tokens(), Some(0));
}

#[test]
fn test_all_zero_histogram() {
    let schedule = compute_schedule(Some(&[0, 0, 0, 0]), 10, 4).unwrap();
    assert_eq!(schedule.tok_starts(), Some(&[0, 0, 0, 0, 0][..]));
    assert_eq!(schedule.tile_starts(), Some(&[0, 0, 0, 0, 0][..]));
    let capacity = schedule.capacity().unwrap();
    assert_eq!(capacity, tile_capacity(4, 10, 4).unwrap());
    assert!(schedule.tile_info().unwrap().iter().all(|&v| v == SENTINEL));
    assert_eq!(schedule.total_tokens(), Some(0));
}

#[test]
fn test_tile_capacity() {
    assert_eq!(tile_capacity(3, 8, 4).unwrap(), 4);
    assert_eq!(tile_capacity(128, 4096, 64).unwrap(), 190);
    // total <= G: one tile per item.
    assert_eq!(tile_capacity(8, 5, 64).unwrap(), 5);
    assert_eq!(tile_capacity(8, 8, 64).unwrap(), 8);
    assert_eq!(tile_capacity(0, 0, 64).unwrap(), 0);
    assert!(matches!(
        tile_capacity(4, 10, 0),
        Err(ScheduleError::InvalidConfig(_))
    ));
}

#[test]
fn test_zero_tile_dim_rejected() {
    let result = compute_schedule(Some(&[1, 2]), 3, 0);
    assert!(matches!(result, Err(ScheduleError::InvalidConfig(_))));
}

#[test]
fn test_too_many_groups() {
    let histogram = vec![0u32; ENCODING_LIMIT + 1];
    let result = compute_schedule(Some(&histogram), 0, 64);
    assert_eq!(
        result,
        Err(ScheduleError::EncodingOverflow {
            group: ENCODING_LIMIT,
            local_tile: 0
        })
    );
}

#[test]
fn test_max_groups_accepted() {
    let histogram = vec![1u32; ENCODING_LIMIT];
    let schedule = compute_schedule(Some(&histogram), ENCODING_LIMIT, 1).unwrap();
    let last = schedule.group_tiles(ENCODING_LIMIT - 1).unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].decode(), Some((0, u16::MAX)));
}

#[test]
fn test_too_many_groups_reported_before_sizing_errors() {
    // Sum exceeds total_work_items, which would otherwise be CapacityExceeded.
    let histogram = vec![1u32; ENCODING_LIMIT + 1];
    let result = compute_schedule(Some(&histogram), ENCODING_LIMIT, 1);
    assert_eq!(
        result,
        Err(ScheduleError::EncodingOverflow {
            group: ENCODING_LIMIT,
            local_tile: 0
        })
    );

    // Offsets would overflow u32 during the scan.
    let mut histogram = vec![0u32; ENCODING_LIMIT + 1];
    histogram[0] = u32::MAX;
    histogram[1] = 1;
    let result = compute_schedule(Some(&histogram), tight_total(&histogram), 1 << 20);
    assert_eq!(
        result,
        Err(ScheduleError::EncodingOverflow {
            group: ENCODING_LIMIT,
            local_tile: 0
        })
    );
}

#[test]
fn test_too_many_tiles_in_group() {
    let histogram = [0, ENCODING_LIMIT as u32 + 1];
    let result = compute_schedule(Some(&histogram), tight_total(&histogram), 1);
    assert_eq!(
        result,
        Err(ScheduleError::EncodingOverflow {
            group: 1,
            local_tile: ENCODING_LIMIT
        })
    );
}

#[test]
fn test_histogram_exceeding_total_items() {
    // 20 items but only sized for 8: the tile table cannot hold them.
    let result = compute_schedule(Some(&[10, 10]), 8, 4);
    assert!(matches!(
        result,
        Err(ScheduleError::CapacityExceeded { required: 6, .. })
    ));
}

#[test]
fn test_offset_overflow() {
    let histogram = [u32::MAX, 1];
    let result = compute_schedule(Some(&histogram), tight_total(&histogram), 1 << 20);
    assert_eq!(result, Err(ScheduleError::OffsetOverflow { group: 1 }));
}

#[test]
fn test_errors_display() {
    let err = ScheduleError::CapacityExceeded {
        required: 9,
        capacity: 4,
    };
    assert!(err.to_string().contains("9 tiles required"));
    let err = ScheduleError::OffsetOverflow { group: 3 };
    assert!(err.to_string().contains("group 3"));
}

#[test]
fn test_tile_record_api() {
    let record = TileRecord::new(1, 2).unwrap();
    assert_eq!(record.raw(), 0x0001_0002);
    assert_eq!(record.local_tile(), 1);
    assert_eq!(record.group(), 2);
    assert_eq!(record.decode(), Some((1, 2)));
    assert_eq!(u32::from(record), 0x0001_0002);

    assert!(TileRecord::SENTINEL.is_sentinel());
    assert_eq!(TileRecord::SENTINEL.decode(), None);
    assert!(TileRecord::new(ENCODING_LIMIT, 0).is_err());
    assert!(TileRecord::new(0, ENCODING_LIMIT).is_err());
}

#[test]
fn test_group_tiles_and_iteration() {
    let schedule = compute_schedule(Some(&[3, 0, 5]), 8, 4).unwrap();

    let g0: Vec<_> = schedule.group_tiles(0).unwrap().iter().map(|r| r.decode()).collect();
    assert_eq!(g0, vec![Some((0, 0))]);
    assert!(schedule.group_tiles(1).unwrap().is_empty());
    assert_eq!(schedule.group_tiles(2).unwrap().len(), 2);
    assert_eq!(schedule.group_tiles(3), None);
    assert_eq!(schedule.group_tiles(usize::MAX), None);

    let slots: Vec<usize> = schedule.tiles().map(|(slot, _)| slot).collect();
    assert_eq!(slots, vec![0, 1, 2]);
}

#[test]
fn test_into_raw() {
    let schedule = compute_schedule(Some(&[3, 0, 5]), 8, 4).unwrap();
    let expected = schedule.raw().unwrap().to_vec();
    let (layout, buffer) = schedule.into_raw().unwrap();
    assert_eq!(buffer, expected);
    assert_eq!(layout.num_groups(), 3);
    assert_eq!(layout.tile_dim(), 4);
    assert_eq!(layout.capacity(), 4);
}

#[test]
fn test_config_strategies_agree() {
    let histogram = uniform_histogram(3000, 200, 7);
    let total = tight_total(&histogram);
    let reference = compute_schedule(Some(&histogram), total, 64).unwrap();

    for scan in [ScanStrategy::Sequential, ScanStrategy::Blocked, ScanStrategy::Auto] {
        for scan_block in [1, 7, 256, 1024] {
            let config = ScheduleConfig {
                scan,
                scan_block,
                memset_block: 33,
                ..Default::default()
            };
            let schedule = compute_schedule_with(Some(&histogram), total, 64, &config).unwrap();
            assert_eq!(schedule, reference, "scan={scan:?} block={scan_block}");
        }
    }
}

#[test]
fn test_config_rejects_zero_blocks() {
    let config = ScheduleConfig {
        scan_block: 0,
        ..Default::default()
    };
    let result = compute_schedule_with(Some(&[1]), 1, 1, &config);
    assert!(matches!(result, Err(ScheduleError::InvalidConfig(_))));

    let config = ScheduleConfig {
        memset_block: 0,
        ..Default::default()
    };
    let result = compute_schedule_with(Some(&[1]), 1, 1, &config);
    assert!(matches!(result, Err(ScheduleError::InvalidConfig(_))));
}

#[test]
fn test_timed_matches_untimed() {
    let histogram = uniform_histogram(500, 100, 99);
    let total = tight_total(&histogram);
    let plain = compute_schedule(Some(&histogram), total, 32).unwrap();
    let (timed, timings) =
        compute_schedule_timed(Some(&histogram), total, 32, &ScheduleConfig::default()).unwrap();
    assert_eq!(plain, timed);

    #[cfg(not(feature = "timing"))]
    assert_eq!(timings.get(Stage::Scan), std::time::Duration::ZERO);
    #[cfg(feature = "timing")]
    assert!(timings.get(Stage::Scan) <= timings.total);
}

/// Counts `INFO`-and-above events seen by the subscriber.
struct InfoCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for InfoCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() <= Level::INFO {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[test]
fn test_compute_does_not_log_timings() {
    let histogram = uniform_histogram(200, 50, 5);
    let total = tight_total(&histogram);
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(InfoCounter(count.clone()));

    tracing::subscriber::with_default(subscriber, || {
        for _ in 0..10 {
            compute_schedule(Some(&histogram), total, 16).unwrap();
        }
    });
    assert_eq!(count.load(Ordering::Relaxed), 0);

    // Explicit reporting from the timed entry point emits one event with `timing`.
    let subscriber = tracing_subscriber::registry().with(InfoCounter(count.clone()));
    tracing::subscriber::with_default(subscriber, || {
        let (schedule, timings) =
            compute_schedule_timed(Some(&histogram), total, 16, &ScheduleConfig::default())
                .unwrap();
        timings.report(schedule.num_groups());
    });
    let expected = usize::from(cfg!(feature = "timing"));
    assert_eq!(count.load(Ordering::Relaxed), expected);
}
