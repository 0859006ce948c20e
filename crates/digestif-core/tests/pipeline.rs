//! End-to-end pipeline behavior under deterministic (paused) time.

use digestif_core::{
    Digest, Error, HashPipeline, PipelineConfig, PipelineState, parse_id,
};
use futures::future::join_all;
use sha2::{Digest as _, Sha512};
use std::collections::HashSet;
use std::time::Duration;

const DELAY: Duration = Duration::from_secs(5);

fn test_pipeline() -> HashPipeline {
    HashPipeline::new(PipelineConfig {
        hash_delay: DELAY,
        queue_capacity: 100,
    })
}

fn sha512(payload: &[u8]) -> Digest {
    Sha512::digest(payload).into()
}

#[tokio::test(start_paused = true)]
async fn ids_are_sequential_from_one() {
    let pipeline = test_pipeline();
    for expected in 1..=10u64 {
        assert_eq!(pipeline.admit(b"foo".to_vec()).unwrap(), expected);
    }
}

#[tokio::test(start_paused = true)]
async fn digest_is_unavailable_until_delay_elapses() {
    let pipeline = test_pipeline();
    let id = pipeline.admit(b"foo".to_vec()).unwrap();
    assert_eq!(id, 1);

    assert_eq!(pipeline.lookup(id).unwrap_err(), Error::NotFound { id });

    // Let the timer task register its sleep before advancing the clock.
    tokio::task::yield_now().await;

    tokio::time::advance(DELAY - Duration::from_millis(1)).await;
    assert_eq!(pipeline.lookup(id).unwrap_err(), Error::NotFound { id });

    // Let the timer fire and the worker store the digest.
    tokio::time::sleep(Duration::from_millis(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(pipeline.lookup(id).unwrap(), sha512(b"foo"));
}

#[tokio::test(start_paused = true)]
async fn empty_payload_is_rejected_before_entering_the_pipeline() {
    let pipeline = test_pipeline();
    assert!(matches!(
        pipeline.admit(Vec::new()).unwrap_err(),
        Error::InvalidPayload { .. }
    ));
    assert_eq!(pipeline.stats().processed_count, 0);
}

#[tokio::test(start_paused = true)]
async fn stats_count_admissions_independent_of_completion() {
    let pipeline = test_pipeline();
    for _ in 0..3 {
        pipeline.admit(b"secret".to_vec()).unwrap();
    }
    // Nothing has hashed yet; the count reflects admissions.
    assert_eq!(pipeline.stats().processed_count, 3);
    assert_eq!(pipeline.lookup(1).unwrap_err(), Error::NotFound { id: 1 });
}

#[tokio::test(start_paused = true)]
async fn concurrent_admissions_yield_distinct_ids_and_digests() {
    const ADMISSIONS: u64 = 32;

    let pipeline = test_pipeline();
    let handles: Vec<_> = (0..ADMISSIONS)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                pipeline
                    .admit(format!("secret-{i}").into_bytes())
                    .unwrap()
            })
        })
        .collect();

    let ids: HashSet<u64> = join_all(handles)
        .await
        .into_iter()
        .map(|res| res.unwrap())
        .collect();
    assert_eq!(ids.len(), ADMISSIONS as usize);
    assert_eq!(ids.iter().max(), Some(&ADMISSIONS));

    tokio::time::sleep(DELAY + Duration::from_millis(10)).await;
    tokio::task::yield_now().await;

    let digests: HashSet<Digest> = (1..=ADMISSIONS)
        .map(|id| pipeline.lookup(id).unwrap())
        .collect();
    // Distinct payloads must produce distinct stored digests.
    assert_eq!(digests.len(), ADMISSIONS as usize);
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_pending_releases() {
    let pipeline = test_pipeline();
    let id = pipeline.admit(b"draining".to_vec()).unwrap();
    assert_eq!(pipeline.pending_count(), 1);

    pipeline.shutdown().await;

    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert_eq!(pipeline.pending_count(), 0);
    // The admitted request resolved even though shutdown began before its
    // delay elapsed.
    assert_eq!(pipeline.lookup(id).unwrap(), sha512(b"draining"));
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_idempotent() {
    let pipeline = test_pipeline();
    pipeline.admit(b"once".to_vec()).unwrap();

    pipeline.shutdown().await;
    let after_first = pipeline.state();
    pipeline.shutdown().await;
    pipeline.shutdown().await;

    assert_eq!(after_first, PipelineState::Stopped);
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    assert_eq!(pipeline.lookup(1).unwrap(), sha512(b"once"));
}

#[tokio::test(start_paused = true)]
async fn admissions_after_shutdown_are_refused() {
    let pipeline = test_pipeline();
    pipeline.shutdown().await;

    assert_eq!(
        pipeline.admit(b"late".to_vec()).unwrap_err(),
        Error::ServiceShutdown
    );
    assert_eq!(pipeline.stats().processed_count, 0);
}

#[tokio::test(start_paused = true)]
async fn admissions_racing_shutdown_never_lose_accepted_requests() {
    const ATTEMPTS: u64 = 16;

    let pipeline = test_pipeline();
    let admitters: Vec<_> = (0..ATTEMPTS)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.admit(format!("racer-{i}").into_bytes()) })
        })
        .collect();
    let shutdown = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.shutdown().await })
    };

    let admitted: Vec<u64> = join_all(admitters)
        .await
        .into_iter()
        .filter_map(|res| res.unwrap().ok())
        .collect();
    shutdown.await.unwrap();

    // Every id handed out before the shutdown won the state race must
    // resolve to a digest; an admission may be refused, but never accepted
    // and then dropped.
    assert_eq!(pipeline.state(), PipelineState::Stopped);
    for id in admitted {
        assert!(pipeline.lookup(id).is_ok(), "admitted id {id} was lost");
    }
}

#[tokio::test(start_paused = true)]
async fn lookups_and_stats_survive_shutdown() {
    let pipeline = test_pipeline();
    pipeline.admit(b"kept".to_vec()).unwrap();
    pipeline.shutdown().await;

    assert_eq!(pipeline.lookup(1).unwrap(), sha512(b"kept"));
    assert_eq!(pipeline.stats().processed_count, 1);
    assert_eq!(pipeline.lookup(999).unwrap_err(), Error::NotFound { id: 999 });
}

#[tokio::test(start_paused = true)]
async fn lookup_of_unknown_or_malformed_ids_fails_cleanly() {
    let pipeline = test_pipeline();
    assert_eq!(
        pipeline.lookup(999).unwrap_err(),
        Error::NotFound { id: 999 }
    );
    assert!(matches!(
        parse_id("abc").unwrap_err(),
        Error::InvalidId { .. }
    ));
}
