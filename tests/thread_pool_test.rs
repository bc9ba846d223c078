//! Black-box acceptance tests for the thread-pool side of [`Runtime`].

use thread_actors::error::ThreadError;
use thread_actors::pool::PoolOptions;
use thread_actors::runtime::Runtime;
use thread_actors::script::EchoInterpreter;

fn runtime() -> Runtime {
    Runtime::new(|| Box::new(EchoInterpreter::new()))
}

#[test]
fn every_posted_job_eventually_completes() {
    let rt = runtime();
    let pool = rt
        .pool_create(PoolOptions {
            min_workers: 1,
            max_workers: 3,
            ..PoolOptions::default()
        })
        .unwrap();

    let job_ids: Vec<u64> = (0..6)
        .map(|i| rt.pool_post(pool, format!("expr {{{i}*2}}"), false).unwrap().unwrap())
        .collect();

    let (done, pending) = rt.pool_wait(pool, &job_ids).unwrap();
    // `wait` only guarantees at least one done on return; poll the rest.
    let mut remaining: Vec<u64> = pending;
    let mut completed = done;
    while !remaining.is_empty() {
        let (more_done, still_pending) = rt.pool_wait(pool, &remaining).unwrap();
        completed.extend(more_done);
        remaining = still_pending;
    }

    let mut results: Vec<String> = job_ids.iter().map(|&id| rt.pool_get(pool, id).unwrap().result).collect();
    results.sort();
    let mut expected: Vec<String> = (0..6).map(|i| (i * 2).to_string()).collect();
    expected.sort();
    assert_eq!(results, expected);

    rt.pool_release(pool).unwrap();
}

#[test]
fn detached_jobs_return_no_job_id_and_are_not_collectible() {
    let rt = runtime();
    let pool = rt.pool_create(PoolOptions::default()).unwrap();
    let job_id = rt.pool_post(pool, "expr {1+1}".into(), true).unwrap();
    assert!(job_id.is_none());
    rt.pool_release(pool).unwrap();
}

#[test]
fn get_before_completion_is_not_completed() {
    let rt = runtime();
    let pool = rt
        .pool_create(PoolOptions {
            min_workers: 0,
            max_workers: 1,
            ..PoolOptions::default()
        })
        .unwrap();
    let job_id = rt.pool_post(pool, "expr {2+2}".into(), false).unwrap().unwrap();
    rt.pool_wait(pool, &[job_id]).unwrap();
    let outcome = rt.pool_get(pool, job_id).unwrap();
    assert_eq!(outcome.result, "4");
    // A job can only be collected once.
    assert!(matches!(rt.pool_get(pool, job_id), Err(ThreadError::NoSuchJob(_))));
    rt.pool_release(pool).unwrap();
}

#[test]
fn released_pool_no_longer_resolves() {
    let rt = runtime();
    let pool = rt.pool_create(PoolOptions::default()).unwrap();
    assert_eq!(rt.pool_release(pool).unwrap(), 0);
    assert!(matches!(rt.pool_post(pool, "noop".into(), false), Err(ThreadError::InvalidPool(_))));
}

#[test]
fn invalid_pool_options_are_rejected() {
    let rt = runtime();
    let result = rt.pool_create(PoolOptions {
        min_workers: 5,
        max_workers: 2,
        ..PoolOptions::default()
    });
    assert!(matches!(result, Err(ThreadError::InvalidConfig(_))));
}

#[test]
fn init_script_runs_before_the_first_job() {
    // `EchoInterpreter` has no persistent variable state to assert the
    // init script's effect on, so this only confirms a pool with an init
    // script still answers jobs normally (the script itself must not
    // poison the worker).
    let rt = runtime();
    let pool = rt
        .pool_create(PoolOptions {
            min_workers: 1,
            max_workers: 1,
            init_script: Some("expr {0+0}".into()),
            ..PoolOptions::default()
        })
        .unwrap();
    let job_id = rt.pool_post(pool, "expr {3+4}".into(), false).unwrap().unwrap();
    rt.pool_wait(pool, &[job_id]).unwrap();
    assert_eq!(rt.pool_get(pool, job_id).unwrap().result, "7");
    rt.pool_release(pool).unwrap();
}
