use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use routewarm_runtime::loader::FetchFuture;
use routewarm_runtime::{LoadError, Loadable, ModuleRegistry, TryReady};
use tokio::sync::Notify;

#[derive(Debug)]
struct Page {
    name: &'static str,
}

// A fetch that parks until the test releases it, counting invocations.
fn gated_fetch(
    counter: Arc<AtomicUsize>,
    gate: Arc<Notify>,
) -> impl Fn() -> FetchFuture<Page> + Send + Sync + 'static {
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let gate = gate.clone();
        async move {
            gate.notified().await;
            Ok(Arc::new(Page { name: "home" }))
        }
        .boxed()
    }
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

#[tokio::test]
async fn test_concurrent_loads_share_one_fetch() {
    let registry = ModuleRegistry::new();
    let fetches = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let loadable = Loadable::new("home", registry.clone(), gated_fetch(fetches.clone(), gate.clone()));

    let first = tokio::spawn({
        let loadable = loadable.clone();
        async move { loadable.load().await }
    });
    let second = tokio::spawn({
        let loadable = loadable.clone();
        async move { loadable.load().await }
    });

    gate.notify_one();
    let a = first.await.unwrap().unwrap();
    let b = second.await.unwrap().unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 1, "second consumption must reuse the in-flight fetch");
    assert!(Arc::ptr_eq(&a, &b), "both consumers observe the same resolution");
    assert!(registry.is_loaded("home"));
}

#[tokio::test]
async fn test_suspension_cycle() {
    let registry = ModuleRegistry::new();
    let fetches = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let loadable = Loadable::new("home", registry.clone(), gated_fetch(fetches.clone(), gate.clone()));

    // First consumption starts the fetch and suspends
    let signal = match loadable.try_ready() {
        TryReady::NotReady(signal) => signal,
        _ => panic!("first consumption should suspend"),
    };
    // Suspending again must not start another fetch
    assert!(matches!(loadable.try_ready(), TryReady::NotReady(_)));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    gate.notify_one();
    signal.wait().await;

    // The retry after the signal settles is synchronous
    match loadable.try_ready() {
        TryReady::Ready(page) => assert_eq!(page.name, "home"),
        _ => panic!("consumption after settle should be synchronous"),
    }
    assert!(loadable.is_resolved());
    assert!(registry.is_loaded("home"));
}

#[tokio::test]
async fn test_failure_leaves_registry_unloaded() {
    let registry = ModuleRegistry::new();
    let fetches = Arc::new(AtomicUsize::new(0));
    let loadable: Arc<Loadable<Page>> = Loadable::new("broken", registry.clone(), {
        let fetches = fetches.clone();
        move || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Err(LoadError::new("network down")) }.boxed()
        }
    });

    let err = loadable.load().await.expect_err("load should fail");
    assert_eq!(err, LoadError::new("network down"));
    assert!(!registry.is_loaded("broken"), "failed loads stay retriable in the registry");

    // The instance itself never refetches; consumers keep seeing the error
    assert!(matches!(loadable.try_ready(), TryReady::Failed(_)));
    let again = loadable.load().await.expect_err("still failed");
    assert_eq!(again, err);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_registry_preload_reaches_loader() {
    let registry = ModuleRegistry::new();
    let fetches = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let _loadable = Loadable::new("About", registry.clone(), gated_fetch(fetches.clone(), gate.clone()));

    // The dispatcher-side probe finds the lower-cased id inside the href
    // and hands the fetch to the loader
    registry.check("/chunks/about_9f8e.js");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    gate.notify_one();
    wait_until(|| registry.is_loaded("about")).await;
}

#[tokio::test]
async fn test_reserved_ids_stay_unregistered() {
    let registry = ModuleRegistry::new();

    for id in ["", "/", "./"] {
        let loadable: Arc<Loadable<Page>> = Loadable::new(id, registry.clone(), || {
            async { Ok(Arc::new(Page { name: "shell" })) }.boxed()
        });
        assert!(!registry.contains(id));

        // Direct consumption still works
        let page = loadable.load().await.unwrap();
        assert_eq!(page.name, "shell");
    }
}

#[tokio::test]
async fn test_resolved_fast_path() {
    let registry = ModuleRegistry::new();
    let fetches = Arc::new(AtomicUsize::new(0));
    let loadable = Loadable::new("home", registry.clone(), {
        let fetches = fetches.clone();
        move || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async { Ok(Arc::new(Page { name: "home" })) }.boxed()
        }
    });

    let first = loadable.load().await.unwrap();
    let second = loadable.load().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second), "resolution is memoized");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(loadable.is_resolved());
}
