use bugscan::cache::ProbeTable;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn concurrent_callers_share_one_probe() {
    let table: Arc<ProbeTable<usize>> = Arc::new(ProbeTable::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let table = table.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            table
                .get_or_probe("shared-key", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    // Keep the probe in flight long enough for every caller
                    // to pile onto the same cell.
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    42
                })
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 42);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(table.len(), 1);
}

#[tokio::test]
async fn negative_results_are_terminal() {
    let table: ProbeTable<Option<u16>> = ProbeTable::new();
    let calls = AtomicUsize::new(0);

    let first = table
        .get_or_probe("dead-host", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        })
        .await;
    assert_eq!(first, None);

    let second = table
        .get_or_probe("dead-host", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Some(200)
        })
        .await;

    // The failed result stands; the second probe never ran.
    assert_eq!(second, None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn distinct_keys_probe_independently() {
    tokio_test::block_on(async {
        let table: ProbeTable<&'static str> = ProbeTable::new();

        let a = table.get_or_probe("a", || async { "first" }).await;
        let b = table.get_or_probe("b", || async { "second" }).await;

        assert_eq!(a, "first");
        assert_eq!(b, "second");
        assert_eq!(table.len(), 2);
    });
}
