#![cfg(feature = "sqlite")]

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::is_sorted_by_id;
use common::worlds;
use common::TestDb;
use common::TestResult;
use tokio::task::JoinSet;
use world_cache::prelude::*;
use world_cache::workload::fortunes_page;
use world_cache::workload::EXTRA_FORTUNE;

#[tokio::test]
async fn fetch_random_and_update_many_follow_the_draws() -> TestResult {
    let db = TestDb::with_worlds(&worlds(&[(1, 100), (2, 200), (3, 300)])).await?;
    db.audit_updates().await?;

    let random = Arc::new(ScriptedRandom::default());
    let repo = db.repository(3)?.with_random(random.clone());

    random.push_keys([2]);
    assert_eq!(repo.fetch_random().await?, World::new(2, 200));

    random.push_keys([3, 1]);
    random.push_values([555, 111]);
    let updated = repo.update_many(2).await?;
    assert_eq!(updated, worlds(&[(1, 111), (3, 555)]));

    // Written in ascending key order, with the new values rather than the ones read back.
    assert_eq!(db.audited().await?, worlds(&[(1, 111), (3, 555)]));

    assert_eq!(repo.fetch_by_id(1).await?, World::new(1, 111));
    assert_eq!(repo.fetch_by_id(2).await?, World::new(2, 200));
    assert_eq!(repo.fetch_by_id(3).await?, World::new(3, 555));

    Ok(())
}

#[tokio::test]
async fn fetch_many_keeps_draw_order() -> TestResult {
    let db = TestDb::with_worlds(&worlds(&[(1, 10), (2, 20), (3, 30)])).await?;
    let random = Arc::new(ScriptedRandom::default());
    let repo = db.repository(3)?.with_random(random.clone());

    random.push_keys([3, 1, 3, 2]);
    let fetched = repo.fetch_many(4).await?;
    assert_eq!(fetched, worlds(&[(3, 30), (1, 10), (3, 30), (2, 20)]));
    assert_eq!(random.remaining_keys(), 0);

    Ok(())
}

#[tokio::test]
async fn missing_row_is_not_found() -> TestResult {
    let db = TestDb::with_worlds(&worlds(&[(1, 10), (2, 20), (3, 30)])).await?;
    let random = Arc::new(ScriptedRandom::default());
    // Claims a key space larger than what was seeded.
    let repo = db.repository(5)?.with_random(random.clone());

    random.push_keys([5]);
    match repo.fetch_random().await {
        Err(Error::NotFound { table, id }) => {
            assert_eq!(table, "world");
            assert_eq!(id, 5);
        }
        other => panic!("Expected NotFound, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn fetch_all_covers_the_dense_range() -> TestResult {
    let db = TestDb::with_random_worlds(250).await?;
    let repo = db.repository(250)?;

    let all = repo.fetch_all().await?;
    assert_eq!(all.len(), 250);
    let keys = all.keys().copied().collect::<HashSet<_>>();
    assert_eq!(keys, (1..=250).collect::<HashSet<_>>());
    for (id, world) in &all {
        assert_eq!(*id, world.id);
        assert!((1..=250).contains(&world.random_number));
    }

    Ok(())
}

#[tokio::test]
async fn colliding_keys_are_all_written() -> TestResult {
    let db = TestDb::with_worlds(&worlds(&[(1, 10), (2, 20), (3, 30)])).await?;
    db.audit_updates().await?;
    let random = Arc::new(ScriptedRandom::default());
    let repo = db.repository(3)?.with_random(random.clone());

    random.push_keys([2, 2, 1]);
    random.push_values([7, 8, 9]);
    let updated = repo.update_many(3).await?;

    // Nothing is deduplicated; equal keys keep their draw order.
    assert_eq!(updated, worlds(&[(1, 9), (2, 7), (2, 8)]));
    assert_eq!(db.audited().await?, worlds(&[(1, 9), (2, 7), (2, 8)]));
    assert_eq!(repo.fetch_by_id(2).await?, World::new(2, 8));

    Ok(())
}

#[tokio::test]
async fn update_many_returns_count_sorted() -> TestResult {
    let db = TestDb::with_random_worlds(100).await?;
    let repo = db.repository(100)?;

    for count in [1, 5, 20, 100] {
        let updated = repo.update_many(count).await?;
        assert_eq!(updated.len(), count);
        assert!(is_sorted_by_id(&updated), "not sorted: {updated:?}");
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_batches_complete_sorted() -> TestResult {
    let db = TestDb::with_random_worlds(100).await?;
    let repo = Arc::new(db.repository(100)?);

    let mut tasks = JoinSet::new();
    for _ in 0..100 {
        let repo = repo.clone();
        tasks.spawn(async move { repo.update_many(20).await });
    }

    let mut completed = 0;
    while let Some(res) = tasks.join_next().await {
        let updated = res??;
        assert_eq!(updated.len(), 20);
        assert!(is_sorted_by_id(&updated), "not sorted: {updated:?}");
        completed += 1;
    }
    assert_eq!(completed, 100);
    assert_eq!(repo.fetch_all().await?.len(), 100);

    Ok(())
}

#[tokio::test]
async fn fortunes_in_backend_order_and_page_sorted() -> TestResult {
    let db = TestDb::with_worlds(&worlds(&[(1, 1)])).await?;
    let repo = db.repository(1)?;

    let fortunes = repo.fetch_fortunes().await?;
    assert_eq!(fortunes.len(), 12);
    let mut ids = fortunes.iter().map(|f| f.id).collect::<Vec<_>>();
    ids.sort_unstable();
    assert_eq!(ids, (1..=12).collect::<Vec<_>>());

    let page = fortunes_page(&repo).await?;
    assert_eq!(page.len(), 13);
    assert!(page.windows(2).all(|w| w[0].message <= w[1].message));
    assert!(page.iter().any(|f| f.id == 0 && f.message == EXTRA_FORTUNE));
    assert!(page[0].message.starts_with("<script>"));
    assert_eq!(page[12].message, "フレームワークのベンチマーク");

    Ok(())
}
