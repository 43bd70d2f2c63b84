use deferred::{Deferred, DeferredBuilder, Reason, Status};
use proptest::prelude::*;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};

#[test]
fn test_executor_runs_synchronously_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();

    let d = Deferred::<i32, String>::new(move |resolve, _| {
        c.fetch_add(1, Ordering::SeqCst);
        resolve.resolve(1);
        Ok(())
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(d.status(), Status::Fulfilled);
    assert_eq!(d.peek(), Some(Ok(1)));
}

#[test]
fn test_new_cell_is_pending() {
    let d = Deferred::<i32, String>::new(|_, _| Ok(()));

    assert!(d.is_pending());
    assert!(!d.is_settled());
    assert_eq!(d.peek(), None);
}

#[test]
fn test_second_settlement_is_ignored() {
    let (d, resolve, reject) = Deferred::<i32, String>::pending();

    assert!(resolve.resolve(1));
    assert!(!resolve.resolve(2));
    assert!(!reject.reject("late".into()));

    assert_eq!(d.status(), Status::Fulfilled);
    assert_eq!(d.peek(), Some(Ok(1)));
}

#[test]
fn test_rejection_then_resolve_is_ignored() {
    let (d, resolve, reject) = Deferred::<i32, String>::pending();

    assert!(reject.reject("first".into()));
    assert!(!resolve.resolve(5));

    assert_eq!(d.status(), Status::Rejected);
    assert_eq!(d.peek(), Some(Err("first".to_string())));
}

#[test]
fn test_executor_error_becomes_rejection() {
    let d = Deferred::<i32, String>::new(|_, _| Err("executor failed".into()));

    assert_eq!(d.peek(), Some(Err("executor failed".to_string())));
}

#[test]
fn test_executor_error_after_resolve_is_ignored() {
    let d = Deferred::<i32, String>::new(|resolve, _| {
        resolve.resolve(3);
        Err("too late".into())
    });

    assert_eq!(d.peek(), Some(Ok(3)));
}

#[test]
fn test_executor_panic_becomes_rejection() {
    let d = DeferredBuilder::<Reason>::new()
        .catch_panics()
        .build::<i32, _>(|_, _| panic!("executor exploded"));

    match d.peek() {
        Some(Err(reason)) => {
            assert!(reason.is_panic());
            assert_eq!(reason.to_string(), "panicked: executor exploded");
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
}

#[test]
fn test_executor_panic_unwinds_by_default() {
    let result = std::panic::catch_unwind(|| {
        Deferred::<i32, String>::new(|_, _| panic!("raw panic"))
    });

    assert!(result.is_err());
}

#[test]
fn test_reason_type_needs_no_panic_conversion() {
    let (d, _, reject) = Deferred::<i32, ErrorKind>::pending();
    let recovered = d.catch(|kind| {
        if kind == ErrorKind::NotFound {
            Ok(deferred::Resolution::Value(0))
        } else {
            Err(kind)
        }
    });

    reject.reject(ErrorKind::NotFound);

    assert_eq!(recovered.peek(), Some(Ok(0)));
    assert_eq!(
        Deferred::<i32, i32>::reject(404).map(|v| v + 1).peek(),
        Some(Err(404))
    );
}

#[test]
fn test_custom_panic_conversion() {
    let d = DeferredBuilder::<ErrorKind>::new()
        .catch_panics_with(|_| ErrorKind::Other)
        .build::<i32, _>(|resolve, _| {
            resolve.resolve(1);
            Ok(())
        });

    let failed = d.map(|_| -> i32 { panic!("handler exploded") });

    assert_eq!(failed.peek(), Some(Err(ErrorKind::Other)));
}

#[test]
fn test_capabilities_survive_the_executor() {
    let mut stash = None;

    let d = Deferred::<String, String>::new(|resolve, reject| {
        stash = Some((resolve, reject));
        Ok(())
    });

    assert!(d.is_pending());

    let (resolve, _reject) = stash.unwrap();
    resolve.resolve("later".to_string());

    assert_eq!(d.peek(), Some(Ok("later".to_string())));
}

#[test]
fn test_capability_points_at_its_cell() {
    let (d, resolve, reject) = Deferred::<i32, String>::pending();

    assert!(resolve.deferred().ptr_eq(&d));
    assert!(reject.deferred().ptr_eq(&d));
    assert!(!Deferred::<i32, String>::resolve(1).ptr_eq(&d));
}

#[test]
fn test_builder_label_is_kept() {
    let d = DeferredBuilder::<String>::new()
        .label("config-load")
        .build::<i32, _>(|_, _| Ok(()));

    assert_eq!(d.label(), Some("config-load"));
    assert_eq!(d.forward().label(), Some("config-load"));
    assert_eq!(Deferred::<i32, String>::resolve(1).label(), None);

    let debug = format!("{d:?}");
    assert!(debug.contains("config-load"));
    assert!(debug.contains("Pending"));
}

#[test]
fn test_concurrent_settlement_has_one_winner() {
    for _ in 0..50 {
        let (d, resolve, reject) = Deferred::<usize, String>::pending();
        let wins = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let resolve = resolve.clone();
                let reject = reject.clone();
                let wins = wins.clone();
                std::thread::spawn(move || {
                    let won = if i % 2 == 0 {
                        resolve.resolve(i)
                    } else {
                        reject.reject(format!("worker {i}"))
                    };
                    if won {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert!(d.is_settled());
    }
}

#[test]
fn test_concurrent_registration_and_settlement() {
    const REGISTRARS: usize = 8;
    const PER_THREAD: usize = 25;

    for _ in 0..50 {
        let (d, resolve, _) = Deferred::<usize, String>::pending();
        let runs = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let start = Arc::new(Barrier::new(REGISTRARS + 1));

        let registrars: Vec<_> = (0..REGISTRARS)
            .map(|_| {
                let d = d.clone();
                let runs = runs.clone();
                let seen = seen.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    (0..PER_THREAD)
                        .map(|_| {
                            let runs = runs.clone();
                            let seen = seen.clone();
                            d.map(move |v| {
                                runs.fetch_add(1, Ordering::SeqCst);
                                seen.lock().unwrap().push(v);
                                v + 1
                            })
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let settler = {
            let start = start.clone();
            std::thread::spawn(move || {
                start.wait();
                resolve.resolve(7)
            })
        };

        assert!(settler.join().unwrap());

        let derived: Vec<_> = registrars
            .into_iter()
            .flat_map(|registrar| registrar.join().unwrap())
            .collect();

        assert_eq!(runs.load(Ordering::SeqCst), REGISTRARS * PER_THREAD);
        assert!(seen.lock().unwrap().iter().all(|&v| v == 7));
        assert!(derived.iter().all(|cell| cell.peek() == Some(Ok(8))));
    }
}

#[derive(Debug, Clone)]
enum Attempt {
    Resolve(i32),
    Reject(String),
}

fn attempt() -> impl Strategy<Value = Attempt> {
    prop_oneof![
        any::<i32>().prop_map(Attempt::Resolve),
        "[a-z]{1,6}".prop_map(Attempt::Reject),
    ]
}

proptest! {
    #[test]
    fn test_only_first_settlement_takes_effect(attempts in prop::collection::vec(attempt(), 1..12)) {
        let (d, resolve, reject) = Deferred::<i32, String>::pending();

        let effects: Vec<bool> = attempts
            .iter()
            .map(|a| match a {
                Attempt::Resolve(v) => resolve.resolve(*v),
                Attempt::Reject(r) => reject.reject(r.clone()),
            })
            .collect();

        prop_assert!(effects[0]);
        prop_assert!(effects[1..].iter().all(|took| !took));

        let expected = match &attempts[0] {
            Attempt::Resolve(v) => Ok(*v),
            Attempt::Reject(r) => Err(r.clone()),
        };
        prop_assert_eq!(d.peek(), Some(expected));
    }
}
