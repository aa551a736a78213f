// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for memoized functions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use recall::{CallOptions, Computed, FunctionId, Memoizer, MemoryStore, Namespace, Result, function_id};
use serde::{Deserialize, Serialize};

fn memoizer(namespace: &str) -> Memoizer {
    Memoizer::new(
        Namespace::builder(namespace)
            .store(Arc::new(MemoryStore::new()))
            .build()
            .expect("valid namespace"),
    )
}

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    (Arc::clone(&runs), runs)
}

#[test]
fn identical_arguments_compute_once() -> Result<()> {
    let memoizer = memoizer("once");
    let (runs, seen) = counter();
    let echo = memoizer.wrap(function_id!(echo), move |args: &Vec<i32>| {
        runs.fetch_add(1, Ordering::SeqCst);
        args.clone()
    });

    assert_eq!(echo.call(&vec![1])?, vec![1]);
    assert_eq!(echo.call(&vec![1])?, vec![1]);
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    assert_eq!(echo.call(&vec![2, 3])?, vec![2, 3]);
    assert_eq!(echo.call(&vec![2, 3])?, vec![2, 3]);
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    for _ in 0..3 {
        assert_eq!(echo.call(&vec![4, 5, 6])?, vec![4, 5, 6]);
    }
    assert_eq!(seen.load(Ordering::SeqCst), 3);
    assert_eq!(memoizer.namespace().keys("*")?.len(), 3);
    Ok(())
}

#[test]
fn refresh_always_computes_and_overwrites() -> Result<()> {
    let memoizer = memoizer("refresh");
    let (runs, seen) = counter();
    let tick = memoizer.wrap(function_id!(tick), move |(): &()| runs.fetch_add(1, Ordering::SeqCst));

    assert_eq!(tick.call(&())?, 0);
    assert_eq!(tick.call_with(&(), CallOptions::refresh())?, 1);
    assert_eq!(tick.call_with(&(), CallOptions::refresh())?, 2);
    assert_eq!(tick.call(&())?, 2);
    assert_eq!(seen.load(Ordering::SeqCst), 3);
    Ok(())
}

#[test]
fn uncached_results_are_never_stored() -> Result<()> {
    let memoizer = memoizer("uncached");
    let next = Arc::new(AtomicU64::new(0));
    let stamp = memoizer.wrap_computed(function_id!(stamp), move |cache: &bool| {
        let stamp = next.fetch_add(1, Ordering::SeqCst);
        if *cache {
            Computed::Cacheable(stamp)
        } else {
            Computed::Uncached(stamp)
        }
    });

    assert_ne!(stamp.call(&false)?, stamp.call(&false)?);
    assert_eq!(stamp.call(&true)?, stamp.call(&true)?);
    assert_eq!(memoizer.namespace().keys("*")?.len(), 1);
    Ok(())
}

#[test]
fn none_results_are_cached() -> Result<()> {
    let memoizer = memoizer("none");
    let (runs, seen) = counter();
    let nothing = memoizer.wrap(function_id!(nothing), move |(): &()| -> Option<String> {
        runs.fetch_add(1, Ordering::SeqCst);
        None
    });

    for _ in 0..3 {
        assert_eq!(nothing.call(&())?, None);
    }
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn false_results_are_cached() -> Result<()> {
    let memoizer = memoizer("falsy");
    let (runs, _) = counter();
    let first_time = memoizer.wrap(function_id!(first_time), move |(): &()| runs.fetch_add(1, Ordering::SeqCst) > 0);

    assert!(!first_time.call(&())?);
    assert!(!first_time.call(&())?);
    Ok(())
}

#[derive(Serialize)]
struct Query<'a> {
    table: &'a str,
    limit: u32,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Page {
    rows: Vec<String>,
}

#[test]
fn named_arguments_use_a_struct() -> Result<()> {
    let memoizer = memoizer("structs");
    let (runs, seen) = counter();
    let fetch = memoizer.wrap(function_id!(fetch), move |query: &Query<'static>| {
        runs.fetch_add(1, Ordering::SeqCst);
        Page {
            rows: (0..query.limit).map(|i| format!("{}:{i}", query.table)).collect(),
        }
    });

    let query = Query { table: "users", limit: 2 };
    let page = fetch.call(&query)?;
    assert_eq!(page.rows, vec!["users:0".to_string(), "users:1".to_string()]);
    assert_eq!(fetch.call(&query)?, page);
    assert_eq!(fetch.call(&Query { table: "users", limit: 3 })?.rows.len(), 3);
    assert_eq!(seen.load(Ordering::SeqCst), 2);

    let keys = memoizer.namespace().keys("*")?;
    assert!(keys.iter().any(|key| key.ends_with(r#":fetch:{"table":"users","limit":2}"#)), "{keys:?}");
    Ok(())
}

#[test]
fn functions_with_different_identities_do_not_share_entries() -> Result<()> {
    let memoizer = memoizer("identity");
    let double = memoizer.wrap(FunctionId::new("math", "double"), |x: &i64| x * 2);
    let triple = memoizer.wrap(FunctionId::new("math", "triple"), |x: &i64| x * 3);

    assert_eq!(double.call(&5)?, 10);
    assert_eq!(triple.call(&5)?, 15);
    assert_eq!(
        memoizer.wrapped(),
        vec![FunctionId::new("math", "double"), FunctionId::new("math", "triple")]
    );
    Ok(())
}

#[test]
fn computed_results_expire_with_default_expiry() -> Result<()> {
    let memoizer = Memoizer::new(
        Namespace::builder("expiring")
            .default_expiry(Duration::from_millis(50))
            .build()?,
    );
    let (runs, seen) = counter();
    let value = memoizer.wrap(function_id!(value), move |(): &()| runs.fetch_add(1, Ordering::SeqCst));

    value.call(&())?;
    value.call(&())?;
    thread::sleep(Duration::from_millis(120));
    value.call(&())?;
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn time_cost_average_reflects_computations() -> Result<()> {
    let memoizer = memoizer("costs");
    let slow = memoizer.wrap(function_id!(slow), |ms: &u64| {
        thread::sleep(Duration::from_millis(*ms));
        *ms
    });

    assert!(memoizer.time_cost_average()?.abs() < f64::EPSILON);
    slow.call(&10)?;
    slow.call(&30)?;
    slow.call(&30)?;

    let average = memoizer.time_cost_average()?;
    assert!(average >= 0.019, "average {average} is below the mean sleep");
    assert!(average < 1.0, "average {average} is implausibly high");
    Ok(())
}

#[test]
fn memoized_functions_are_shareable_across_threads() -> Result<()> {
    let memoizer = memoizer("threads");
    let (runs, seen) = counter();
    let square = memoizer.wrap(function_id!(square), move |x: &u32| {
        runs.fetch_add(1, Ordering::SeqCst);
        x * x
    });
    square.call(&9)?;

    thread::scope(|scope| {
        for _ in 0..4 {
            let square = square.clone();
            scope.spawn(move || assert_eq!(square.call(&9).expect("call failed"), 81));
        }
    });
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    Ok(())
}
