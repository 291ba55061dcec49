mod helpers;

use helpers::{row, windows};
use premia_store::IncrementalStore;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_upserts_on_one_path_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined.csv");

    let mut tasks = Vec::new();
    for writer in 0..16i64 {
        // separate handles share the per-path lock
        let store = IncrementalStore::open(&path, windows());
        tasks.push(tokio::spawn(async move {
            let inst = format!("C{writer}/USDT");
            let rows: Vec<_> = (0..10).map(|i| row(&inst, i * 5, writer)).collect();
            store.upsert(rows).await
        }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    let ds = IncrementalStore::open(&path, windows()).load().await.unwrap();
    assert_eq!(ds.len(), 160);
    assert_eq!(ds.instruments().count(), 16);
    assert!(ds.rows().windows(2).all(|w| w[0].key() < w[1].key()));
}

#[tokio::test]
async fn readers_never_observe_partial_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined.csv");
    let store = IncrementalStore::open(&path, windows());
    store.upsert(vec![row("BTC/USDT", 0, 0)]).await.unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 1..30 {
                store.upsert(vec![row("BTC/USDT", i * 5, i)]).await.unwrap();
            }
        })
    };
    let mut last = 0;
    while !writer.is_finished() {
        let n = store.load().await.unwrap().len();
        assert!(n >= last);
        last = n;
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
    assert_eq!(store.load().await.unwrap().len(), 30);
}
