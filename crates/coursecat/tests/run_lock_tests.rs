//! Run lock lease behaviour against the wall clock.
//!
//! Lock expiry is stamped with `Utc::now()`, so these tests run on real
//! time with short leases instead of a paused tokio clock.

mod common;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;

use common::harness::categorization;
use common::{numbered_courses, ScriptedService};
use coursecat::db::lock_repo;
use coursecat::pipeline::{NoopProgress, Pipeline, PipelineConfig, PipelineError, RUN_LOCK};
use coursecat::store::SqliteCourseStore;

fn seeded_store(count: usize) -> SqliteCourseStore {
    let store = SqliteCourseStore::open_in_memory().expect("Failed to open test store");
    for record in numbered_courses("lease", count) {
        store.upsert(&record).expect("Failed to seed record");
    }
    store
}

fn short_lease_config() -> PipelineConfig {
    PipelineConfig {
        rate_limit_delay: Duration::ZERO,
        progress_interval: 1,
        lock_ttl: Duration::from_secs(1),
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn test_lease_is_renewed_while_run_is_active() {
    let store = seeded_store(3);
    let contender = store.clone();
    let takeovers = Arc::new(Mutex::new(Vec::new()));
    let seen = takeovers.clone();

    // Each call outlasts a good part of the lease; together they outlast it.
    let service = ScriptedService::new(move |_| {
        thread::sleep(Duration::from_millis(400));
        let taken = lock_repo::try_acquire(
            contender.database(),
            RUN_LOCK,
            "second-run",
            Utc::now(),
            chrono::Duration::seconds(1),
        )
        .expect("Failed to contend for lock");
        seen.lock().unwrap().push(taken);
        Ok(categorization("Cardiology", "high"))
    });

    let pipeline = Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(service),
        Arc::new(short_lease_config()),
    );
    let result = pipeline.run(&NoopProgress).await.unwrap();

    assert_eq!(result.processed, 3);
    assert_eq!(result.categorized, 3);
    assert_eq!(*takeovers.lock().unwrap(), [false, false, false]);
    assert!(lock_repo::find(store.database(), RUN_LOCK).unwrap().is_none());
}

#[tokio::test]
async fn test_run_aborts_after_lease_is_taken_over() {
    let store = seeded_store(2);
    let contender = store.clone();

    // The first call stalls past the lease, and another run takes it over.
    let service = ScriptedService::new(move |payload| {
        if payload.title == "Course 0" {
            thread::sleep(Duration::from_millis(1200));
            let taken = lock_repo::try_acquire(
                contender.database(),
                RUN_LOCK,
                "second-run",
                Utc::now(),
                chrono::Duration::seconds(60),
            )
            .expect("Failed to contend for lock");
            assert!(taken, "expired lease should be taken over");
        }
        Ok(categorization("Cardiology", "high"))
    });

    let pipeline = Pipeline::new(
        Arc::new(store.clone()),
        Arc::new(service),
        Arc::new(short_lease_config()),
    );
    let err = pipeline.run(&NoopProgress).await.unwrap_err();

    assert!(matches!(err, PipelineError::RunInProgress { ref lock } if lock == RUN_LOCK));
    assert!(store.find("lease-0000").unwrap().unwrap().category.is_none());
    assert!(store.find("lease-0001").unwrap().unwrap().category.is_none());

    let holder = lock_repo::find(store.database(), RUN_LOCK).unwrap().unwrap();
    assert_eq!(holder.owner, "second-run");
}
